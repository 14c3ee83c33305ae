//! # atomvault-core
//!
//! Core library for the Atomvault CLI providing:
//! - Credential loading and the immutable account context
//! - The export error taxonomy
//! - Retry execution with policy-based backoff
//! - Filesystem name sanitization
//! - Shared record types for components and folders

pub mod config;
pub mod error;
pub mod retry;
pub mod sanitize;
pub mod types;

pub use config::Credentials;
pub use error::{Error, Result};
pub use sanitize::sanitize_name;
pub use types::{ComponentRecord, FolderRecord};
