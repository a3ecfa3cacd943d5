//! Google Cloud REST clients
//!
//! Thin `reqwest` wrappers around the two Google APIs the gallery needs:
//! the Cloud Storage JSON API (objects in one bucket) and the Sheets v4
//! `values.get` endpoint. Credentials come from a [`TokenSource`]: either a
//! static bearer token or the GCE/Cloud Run metadata server.

mod error;
mod sheets;
mod storage;
mod token;
mod types;

pub use error::{GcpError, Result};
pub use sheets::SheetsClient;
pub use storage::StorageClient;
pub use token::TokenSource;
pub use types::ObjectMetadata;
