//! Catalog discovery
//!
//! Drives the paginated query endpoints until exhaustion and produces the
//! complete flat sets the export pipeline runs on. Any page failure here is
//! fatal: an incomplete catalog would silently under-export.

use std::collections::HashSet;

use atomvault_core::{ComponentRecord, Error, FolderRecord, Result};
use tracing::{debug, info};

use crate::client::AtomsphereClient;
use crate::error::ApiError;

/// Fetches the full component catalog and folder set for one account
pub struct CatalogFetcher<'a> {
    client: &'a AtomsphereClient,
}

impl<'a> CatalogFetcher<'a> {
    /// Create a fetcher over an existing client
    pub fn new(client: &'a AtomsphereClient) -> Self {
        Self { client }
    }

    /// Fetch every component record, latest/published versions only
    ///
    /// Pages are requested on demand until no continuation token remains.
    /// Records are de-duplicated by component id in case the platform
    /// returns overlapping pages.
    pub async fn fetch_all_components(&self) -> Result<Vec<ComponentRecord>> {
        let mut records: Vec<ComponentRecord> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut cursor: Option<String> = None;

        loop {
            let page = self
                .client
                .fetch_components_page(cursor.as_deref())
                .await
                .map_err(|err| fatal_catalog_error("component", err))?;

            for record in page.records {
                if seen.insert(record.id.clone()) {
                    records.push(record);
                } else {
                    debug!(id = %record.id, "duplicate component id across pages, keeping first");
                }
            }

            debug!(total = records.len(), "retrieved component metadata page");

            match page.next_cursor {
                Some(token) => cursor = Some(token),
                None => break,
            }
        }

        info!(total = records.len(), "component catalog complete");
        Ok(records)
    }

    /// Fetch the full flat folder set for the account
    pub async fn fetch_all_folders(&self) -> Result<Vec<FolderRecord>> {
        let mut records: Vec<FolderRecord> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut cursor: Option<String> = None;

        loop {
            let page = self
                .client
                .fetch_folders_page(cursor.as_deref())
                .await
                .map_err(|err| fatal_catalog_error("folder", err))?;

            for record in page.records {
                if seen.insert(record.id.clone()) {
                    records.push(record);
                }
            }

            match page.next_cursor {
                Some(token) => cursor = Some(token),
                None => break,
            }
        }

        info!(total = records.len(), "folder listing complete");
        Ok(records)
    }
}

/// Map a listing-scoped API failure onto the fatal error taxonomy
fn fatal_catalog_error(scope: &str, err: ApiError) -> Error {
    if err.is_auth() {
        // status() is always present for auth errors
        Error::auth(err.status().unwrap_or(401))
    } else {
        Error::catalog_fetch(scope, err.to_string())
    }
}
