//! Data types exchanged with the storage gateway.
//!
//! Nothing here is persisted: every value is created per call and dropped
//! once the caller has observed it. The object store is the only system of
//! record.

pub mod failure;
pub mod names;
pub mod object;
