//! Wire types for AtomSphere API responses
//!
//! The query endpoints return JSON envelopes with a `result` array and an
//! optional `queryToken` when more pages remain. Field names follow the
//! platform's camelCase; conversion into the domain records in
//! `atomvault-core` happens here so the rest of the pipeline never sees
//! wire shapes.

use atomvault_core::{ComponentRecord, FolderRecord};
use serde::Deserialize;

/// One page of records plus the cursor for the next page, if any
#[derive(Debug)]
pub struct Page<T> {
    /// Records in this page
    pub records: Vec<T>,

    /// Token to request the next page; `None` means exhaustion
    pub next_cursor: Option<String>,
}

/// Generic query response envelope
#[derive(Debug, Deserialize)]
pub(crate) struct QueryResponse<T> {
    #[serde(default = "Vec::new")]
    pub result: Vec<T>,

    #[serde(rename = "queryToken")]
    pub query_token: Option<String>,
}

/// Component metadata as returned by `/ComponentMetadata/query`
#[derive(Debug, Deserialize)]
pub(crate) struct ComponentMetadata {
    #[serde(rename = "componentId")]
    pub component_id: Option<String>,

    pub name: Option<String>,

    pub version: Option<VersionValue>,

    #[serde(rename = "type")]
    pub component_type: Option<String>,

    #[serde(rename = "folderId")]
    pub folder_id: Option<String>,
}

/// The platform reports versions as numbers, but tolerate strings too
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum VersionValue {
    Number(u64),
    Text(String),
}

impl std::fmt::Display for VersionValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VersionValue::Number(n) => write!(f, "{}", n),
            VersionValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl ComponentMetadata {
    /// Convert into a domain record
    ///
    /// Records without a component id cannot be exported; they are skipped
    /// with a warning rather than failing the page.
    pub fn into_record(self) -> Option<ComponentRecord> {
        let Some(id) = self.component_id else {
            tracing::warn!(
                name = self.name.as_deref().unwrap_or("<unnamed>"),
                "skipping catalog entry with no component id"
            );
            return None;
        };

        Some(ComponentRecord {
            id,
            name: self.name.unwrap_or_else(|| "Unnamed Component".to_string()),
            version: self
                .version
                .map(|v| v.to_string())
                .unwrap_or_else(|| "0".to_string()),
            component_type: self.component_type.unwrap_or_else(|| "unknown".to_string()),
            folder_id: self.folder_id,
        })
    }
}

/// Folder metadata as returned by `/Folder/query`
#[derive(Debug, Deserialize)]
pub(crate) struct FolderMetadata {
    pub id: String,

    pub name: Option<String>,

    #[serde(rename = "parentId")]
    pub parent_id: Option<String>,
}

impl From<FolderMetadata> for FolderRecord {
    fn from(meta: FolderMetadata) -> Self {
        FolderRecord {
            id: meta.id,
            name: meta.name.unwrap_or_else(|| "Unnamed Folder".to_string()),
            parent_id: meta.parent_id,
        }
    }
}
