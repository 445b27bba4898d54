use crate::{models::names::BucketName, services::storage_gateway::StorageGateway};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub gateway: StorageGateway,
    /// The single bucket this deployment serves files from.
    pub bucket: BucketName,
}
