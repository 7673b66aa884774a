//! Batch export surface: request documents in, MP4 artifacts out.

/// Export entry point and response mapping.
pub mod export;
/// Request document and artifact types.
pub mod request;
