//! Authenticated AtomSphere HTTP client
//!
//! One client instance serves the whole run. It owns the reqwest client
//! (with a per-request timeout so a stalled connection cannot stall the
//! run), the account credentials, and the retry policy applied to every
//! remote call.

use std::time::Duration;

use atomvault_core::retry::{retry_with_policy, RetryPolicy};
use atomvault_core::{ComponentRecord, Credentials, FolderRecord};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::json;
use tracing::debug;

use crate::error::ApiError;
use crate::types::{ComponentMetadata, FolderMetadata, Page, QueryResponse};

/// Production platform API root; the account id is appended as a segment
pub const DEFAULT_BASE_URL: &str = "https://api.boomi.com/api/rest/v1";

/// Default per-request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// XML namespace for paged query continuation requests
const QUERY_MORE_XMLNS: &str = "http://api.platform.boomi.com/api/rest/v1/";

/// Client for the AtomSphere metadata-query and component endpoints
pub struct AtomsphereClient {
    client: reqwest::Client,
    credentials: Credentials,
    base_url: String,
    retry_policy: RetryPolicy,
}

impl AtomsphereClient {
    /// Create a client with the default base URL and timeout
    pub fn new(credentials: Credentials) -> Result<Self, ApiError> {
        Self::with_timeout(credentials, DEFAULT_TIMEOUT)
    }

    /// Create a client with an explicit per-request timeout
    pub fn with_timeout(credentials: Credentials, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("atomvault/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(ApiError::Client)?;

        Ok(Self {
            client,
            credentials,
            base_url: DEFAULT_BASE_URL.to_string(),
            retry_policy: RetryPolicy::default(),
        })
    }

    /// Override the base URL (mock servers, non-production pods)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Override the retry policy
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Fetch one page of the component catalog
    ///
    /// The first page (`cursor: None`) carries the latest/published filter;
    /// later pages replay the continuation token. Transient failures are
    /// retried; the returned error is the final attempt's.
    pub async fn fetch_components_page(
        &self,
        cursor: Option<&str>,
    ) -> Result<Page<ComponentRecord>, ApiError> {
        let page = retry_with_policy(
            "component query",
            &self.retry_policy,
            ApiError::is_retryable,
            || self.query_page::<ComponentMetadata>("ComponentMetadata", cursor),
        )
        .await
        .map_err(|err| err.into_source())?;

        Ok(Page {
            records: page
                .records
                .into_iter()
                .filter_map(ComponentMetadata::into_record)
                .collect(),
            next_cursor: page.next_cursor,
        })
    }

    /// Fetch one page of the account folder listing
    pub async fn fetch_folders_page(
        &self,
        cursor: Option<&str>,
    ) -> Result<Page<FolderRecord>, ApiError> {
        let page = retry_with_policy(
            "folder query",
            &self.retry_policy,
            ApiError::is_retryable,
            || self.query_page::<FolderMetadata>("Folder", cursor),
        )
        .await
        .map_err(|err| err.into_source())?;

        Ok(Page {
            records: page.records.into_iter().map(FolderRecord::from).collect(),
            next_cursor: page.next_cursor,
        })
    }

    /// Fetch a component's full XML definition
    pub async fn fetch_component_xml(&self, component_id: &str) -> Result<Vec<u8>, ApiError> {
        retry_with_policy(
            "component fetch",
            &self.retry_policy,
            ApiError::is_retryable,
            || self.get_component(component_id),
        )
        .await
        .map_err(|err| err.into_source())
    }

    /// URL for an account-scoped endpoint path
    fn account_url(&self, path: &str) -> String {
        format!(
            "{}/{}{}",
            self.base_url,
            self.credentials.account_id(),
            path
        )
    }

    /// Single attempt at one query page for `object` (ComponentMetadata or
    /// Folder)
    async fn query_page<T>(&self, object: &str, cursor: Option<&str>) -> Result<Page<T>, ApiError>
    where
        T: serde::de::DeserializeOwned,
    {
        let endpoint = format!("/{}/query", object);
        let url = self.account_url(&endpoint);

        debug!(%url, has_cursor = cursor.is_some(), "querying page");

        // First page: JSON QueryFilter. Continuation: the platform expects
        // an XML QueryMoreRequest body while still answering in JSON.
        let request = match cursor {
            None => self
                .client
                .post(&url)
                .basic_auth(
                    self.credentials.auth_user(),
                    Some(self.credentials.auth_password()),
                )
                .header(ACCEPT, "application/json")
                .json(&initial_filter(object)),
            Some(token) => self
                .client
                .post(&url)
                .basic_auth(
                    self.credentials.auth_user(),
                    Some(self.credentials.auth_password()),
                )
                .header(ACCEPT, "application/json")
                .header(CONTENT_TYPE, "application/xml")
                .body(query_more_body(token)),
        };

        let response = request
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                endpoint: endpoint.clone(),
                source,
            })?;

        let response = check_status(&endpoint, response).await?;

        let envelope: QueryResponse<T> =
            response
                .json()
                .await
                .map_err(|source| ApiError::Decode {
                    endpoint: endpoint.clone(),
                    source,
                })?;

        Ok(Page {
            records: envelope.result,
            next_cursor: envelope.query_token,
        })
    }

    /// Single attempt at retrieving one component's XML body
    async fn get_component(&self, component_id: &str) -> Result<Vec<u8>, ApiError> {
        let endpoint = format!("/Component/{}", component_id);
        let url = self.account_url(&endpoint);

        let response = self
            .client
            .get(&url)
            .basic_auth(
                self.credentials.auth_user(),
                Some(self.credentials.auth_password()),
            )
            .header(ACCEPT, "application/xml")
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                endpoint: endpoint.clone(),
                source,
            })?;

        let response = check_status(&endpoint, response).await?;

        let bytes = response
            .bytes()
            .await
            .map_err(|source| ApiError::Transport {
                endpoint,
                source,
            })?;

        Ok(bytes.to_vec())
    }
}

/// First-page query filter for the given object type
///
/// Components are restricted to non-deleted, latest/published versions;
/// historical revisions are never requested. Folders only filter deleted.
fn initial_filter(object: &str) -> serde_json::Value {
    if object == "ComponentMetadata" {
        json!({
            "QueryFilter": {
                "expression": {
                    "operator": "and",
                    "nestedExpression": [
                        {
                            "argument": ["false"],
                            "operator": "EQUALS",
                            "property": "deleted"
                        },
                        {
                            "argument": ["true"],
                            "operator": "EQUALS",
                            "property": "currentVersion"
                        }
                    ]
                }
            }
        })
    } else {
        json!({
            "QueryFilter": {
                "expression": {
                    "argument": ["false"],
                    "operator": "EQUALS",
                    "property": "deleted"
                }
            }
        })
    }
}

/// XML continuation body replaying a pagination token
fn query_more_body(token: &str) -> String {
    format!(
        r#"<QueryMoreRequest xmlns="{}"><queryToken>{}</queryToken></QueryMoreRequest>"#,
        QUERY_MORE_XMLNS,
        xml_escape(token)
    )
}

/// Minimal XML text escaping for the pagination token
fn xml_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Turn a non-success response into an `ApiError::Status` with its body
async fn check_status(
    endpoint: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        endpoint: endpoint.to_string(),
        status: status.as_u16(),
        body,
    })
}
