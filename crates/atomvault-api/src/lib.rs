//! # atomvault-api
//!
//! Authenticated client for the AtomSphere platform API:
//! - Paginated component metadata queries (latest/published versions only)
//! - Paginated folder listing
//! - Per-component XML retrieval
//!
//! Transient failures are retried with bounded backoff inside the client;
//! authentication failures short-circuit immediately.

mod catalog;
mod client;
mod error;
mod types;

pub use catalog::CatalogFetcher;
pub use client::{AtomsphereClient, DEFAULT_BASE_URL};
pub use error::ApiError;
pub use types::Page;
