//! Shared record types for the export pipeline
//!
//! Both record types are transient snapshots taken at run start and are
//! immutable once fetched; nothing here persists between runs.

/// One exportable asset discovered in the catalog query
#[derive(Debug, Clone)]
pub struct ComponentRecord {
    /// Opaque, globally unique component id
    pub id: String,

    /// Display name; may contain characters unsafe for paths
    pub name: String,

    /// Latest/published version label
    pub version: String,

    /// Component category (process, connector, map, ...), informational
    pub component_type: String,

    /// Owning folder, or `None` for components outside any folder
    pub folder_id: Option<String>,
}

/// One node in the remote folder tree, keyed by flat parent links
#[derive(Debug, Clone)]
pub struct FolderRecord {
    /// Opaque folder id
    pub id: String,

    /// Display name; sanitized before use as a path segment
    pub name: String,

    /// Parent folder id, or `None` for a root folder
    pub parent_id: Option<String>,
}
