//! Analytics REST Response Types
//!
//! Serde types for the two response shapes the crate reads, plus the
//! endpoint layout they come from.
//!
//! ```text
//! listing:  { "datasets": [ { "id": "...", ... } ], "nextPageUrl": "..." | null }
//! versions: { "versions": [ { "totalRows": 123, ... } ] }
//! ```
//!
//! Unknown fields are ignored. Missing required fields are parse errors.

use crate::error::{QuotaError, Result};
use serde::Deserialize;

/// Opaque dataset identifier, unique within a tenant
pub type DatasetId = String;

/// One page of the dataset listing
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetListPage {
    /// Dataset summaries on this page (may be empty)
    pub datasets: Vec<DatasetSummary>,

    /// Cursor to the next page; absent or null on the last page
    #[serde(default)]
    pub next_page_url: Option<String>,
}

impl DatasetListPage {
    /// Parse a listing page from a response body
    pub fn from_body(body: &str) -> Result<Self> {
        serde_json::from_str(body)
            .map_err(|e| QuotaError::Parse(format!("Invalid dataset listing response: {}", e)))
    }

    /// The cursor to follow, if any
    ///
    /// An empty string is treated the same as null.
    pub fn next_cursor(&self) -> Option<&str> {
        self.next_page_url.as_deref().filter(|url| !url.is_empty())
    }
}

/// Summary of one dataset in a listing page
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatasetSummary {
    /// Dataset identifier
    pub id: DatasetId,

    /// Developer name, when the API reports one
    #[serde(default)]
    pub name: Option<String>,
}

/// Versions response for a single dataset
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VersionList {
    /// All versions of the dataset
    pub versions: Vec<DatasetVersion>,
}

impl VersionList {
    /// Parse a versions response from a response body
    pub fn from_body(body: &str) -> Result<Self> {
        serde_json::from_str(body)
            .map_err(|e| QuotaError::Parse(format!("Invalid dataset versions response: {}", e)))
    }
}

/// One stored version of a dataset
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetVersion {
    /// Version identifier
    #[serde(default)]
    pub id: Option<String>,

    /// Rows held by this version, counted in full
    pub total_rows: u64,
}

/// Endpoint layout of the analytics REST API for one API version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    api_version: String,
}

impl Endpoints {
    /// Endpoints for the given API version, e.g. `"58.0"`
    pub fn new(api_version: impl Into<String>) -> Self {
        Self {
            api_version: api_version.into(),
        }
    }

    /// API version in use
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// First page of the dataset listing
    pub fn datasets(&self) -> String {
        format!("/services/data/v{}/wave/datasets", self.api_version)
    }

    /// Version list of one dataset
    ///
    /// The id is opaque, so it is percent-encoded as a single path segment.
    pub fn versions(&self, dataset_id: &str) -> String {
        format!(
            "{}/{}/versions",
            self.datasets(),
            urlencoding::encode(dataset_id)
        )
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_API_VERSION)
    }
}
