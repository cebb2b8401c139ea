//! Typed client for the remote document backend.
//!
//! The backend is consumed through exactly three operations: document
//! ingestion (multipart upload), question answering (JSON query), and a
//! health probe. `DocumentBackend` is the seam the orchestration layer
//! depends on; `HttpBackend` is the production implementation over HTTP.

pub mod backend;
pub mod error;
pub mod http;

pub use backend::{BackendHealth, DocumentBackend, IngestReceipt, QueryOutcome};
pub use error::ClientError;
pub use http::HttpBackend;
