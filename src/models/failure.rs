//! Classified failure as seen by the HTTP boundary.

use serde::Serialize;

/// A failed storage operation reduced to what callers may act on.
///
/// `is_not_found` is the only classification exposed; it lets the boundary
/// choose between a "missing resource" and a generic "request failed" reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureDetail {
    pub message: String,
    pub is_not_found: bool,
}
