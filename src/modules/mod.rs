//! Modules layer - Infrastructure components for external integrations
//!
//! Contains the clients for the object store (file bytes) and the document
//! database (file metadata).

pub mod documents;
pub mod storage;
