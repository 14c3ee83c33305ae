//! Error types for atomvault-core

use thiserror::Error;

/// Result type alias using atomvault-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Export pipeline error taxonomy
///
/// Variants fall into two groups. Fatal errors (`MissingCredential`,
/// `Auth`, `CatalogFetch`) stop the run immediately. Item-scoped errors
/// (`ItemFetch`, `Write`) are recorded against the offending component and
/// the run continues.
#[derive(Error, Debug)]
pub enum Error {
    /// A required credential was not supplied via flag or environment
    #[error("Missing credential: {name}. Set the {env_var} environment variable or pass the flag.")]
    MissingCredential { name: String, env_var: String },

    /// The platform rejected our credentials (401) or authorization (403)
    #[error("Authentication failed (HTTP {status}): check account id, username, and API token")]
    Auth { status: u16 },

    /// A catalog or folder listing page could not be fetched
    ///
    /// An incomplete catalog would silently under-export, so this aborts
    /// the whole run.
    #[error("Failed to fetch {scope} listing: {detail}")]
    CatalogFetch { scope: String, detail: String },

    /// A single component's XML could not be retrieved
    #[error("Failed to fetch component {component_id}: {detail}")]
    ItemFetch {
        component_id: String,
        detail: String,
    },

    /// A single component's file could not be written locally
    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Create a missing credential error
    pub fn missing_credential(name: impl Into<String>, env_var: impl Into<String>) -> Self {
        Self::MissingCredential {
            name: name.into(),
            env_var: env_var.into(),
        }
    }

    /// Create an authentication error
    pub fn auth(status: u16) -> Self {
        Self::Auth { status }
    }

    /// Create a catalog fetch error
    pub fn catalog_fetch(scope: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::CatalogFetch {
            scope: scope.into(),
            detail: detail.into(),
        }
    }

    /// Create an item fetch error
    pub fn item_fetch(component_id: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::ItemFetch {
            component_id: component_id.into(),
            detail: detail.into(),
        }
    }

    /// Create a write error
    pub fn write(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    /// Whether this error aborts the whole run
    ///
    /// Item-scoped errors are isolated to one component; everything else
    /// is fatal.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::ItemFetch { .. } | Self::Write { .. })
    }
}
