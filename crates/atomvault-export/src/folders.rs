//! Folder path resolution
//!
//! The platform reports folders as a flat list of (id, name, parent-id)
//! records. Resolution walks the parent links iteratively to rebuild the
//! root-to-leaf directory path, memoizing every node it touches. Broken
//! data (a parent id that resolves nowhere, or a cycle) truncates the walk
//! at the broken node and is counted as an anomaly, never a run failure.

use std::collections::{HashMap, HashSet};

use atomvault_core::{sanitize_name, FolderRecord};
use camino::Utf8PathBuf;
use tracing::warn;

/// Directory for components that belong to no folder, or whose folder id
/// cannot be resolved at all
pub const UNASSIGNED_DIR: &str = "_unassigned";

/// Resolves folder ids to relative directory paths
///
/// Built once per run from the complete folder set. Resolution is a pure
/// function of that set: the same id always yields the same path.
pub struct FolderResolver {
    index: HashMap<String, FolderRecord>,
    memo: HashMap<String, Utf8PathBuf>,
    anomalies: u64,
}

impl FolderResolver {
    /// Build the resolver from the full flat folder set
    pub fn new(folders: Vec<FolderRecord>) -> Self {
        let index = folders
            .into_iter()
            .map(|record| (record.id.clone(), record))
            .collect();

        Self {
            index,
            memo: HashMap::new(),
            anomalies: 0,
        }
    }

    /// Resolve a folder id to its sanitized relative path
    ///
    /// `None` (component without a folder) resolves to the fixed
    /// [`UNASSIGNED_DIR`], as does a folder id the account listing never
    /// mentioned. After the first resolution of an id, the whole ancestor
    /// chain is memoized.
    pub fn resolve(&mut self, folder_id: Option<&str>) -> Utf8PathBuf {
        let Some(start) = folder_id else {
            return Utf8PathBuf::from(UNASSIGNED_DIR);
        };

        if let Some(path) = self.memo.get(start) {
            return path.clone();
        }

        if !self.index.contains_key(start) {
            warn!(folder_id = %start, "component references a folder missing from the listing");
            self.anomalies += 1;
            let path = Utf8PathBuf::from(UNASSIGNED_DIR);
            self.memo.insert(start.to_string(), path.clone());
            return path;
        }

        // Walk parent links upward, collecting ids leaf-first, until a
        // memoized ancestor, a root, or broken data stops the walk.
        let mut chain: Vec<String> = Vec::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut base = Utf8PathBuf::new();
        let mut current = Some(start.to_string());

        while let Some(id) = current.take() {
            if let Some(path) = self.memo.get(&id) {
                base = path.clone();
                break;
            }

            if !visited.insert(id.clone()) {
                warn!(folder_id = %id, "cycle detected in folder parent chain, truncating");
                self.anomalies += 1;
                break;
            }

            // The start id was checked above; ancestors are checked before
            // being queued, so the record is always present here.
            let Some(record) = self.index.get(&id) else {
                break;
            };
            chain.push(id);

            match &record.parent_id {
                None => {}
                Some(parent) => {
                    // Only listed folders may be queued as ancestors; memo
                    // entries for unknown ids are start-lookup sentinels,
                    // not path bases.
                    if self.index.contains_key(parent) {
                        current = Some(parent.clone());
                    } else {
                        warn!(
                            folder_id = %record.id,
                            parent_id = %parent,
                            "dangling folder parent reference, treating folder as a root"
                        );
                        self.anomalies += 1;
                    }
                }
            }
        }

        // Extend the base path root-to-leaf, memoizing every ancestor so
        // overlapping chains cost O(1) after the first visit.
        let mut path = base;
        for id in chain.iter().rev() {
            path.push(sanitize_name(&self.index[id].name));
            self.memo.insert(id.clone(), path.clone());
        }

        path
    }

    /// Number of integrity anomalies (cycles, dangling references) hit so far
    pub fn anomaly_count(&self) -> u64 {
        self.anomalies
    }
}
