//! License Grant Records and Sources
//!
//! A [`LicenseGrant`] is a read-only record owned by the platform. Grants
//! are loaded once per evaluation into an in-memory snapshot, so every rule
//! pass sees the same data.

use crate::error::{QuotaError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Status value that marks a grant as in force
pub const ACTIVE_STATUS: &str = "Active";

/// One license grant record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseGrant {
    /// License label, e.g. "Einstein Analytics Plus"
    pub label: String,

    /// Grant status, compared exactly against "Active"
    pub status: String,

    /// Seats in use (not read by the allotment rules)
    #[serde(default)]
    pub used_licenses: u64,

    /// Seats purchased
    pub total_licenses: u64,
}

impl LicenseGrant {
    /// Create a grant record
    pub fn new(
        label: impl Into<String>,
        status: impl Into<String>,
        used_licenses: u64,
        total_licenses: u64,
    ) -> Self {
        Self {
            label: label.into(),
            status: status.into(),
            used_licenses,
            total_licenses,
        }
    }

    /// Shorthand for an Active grant with no seats in use
    pub fn active(label: impl Into<String>, total_licenses: u64) -> Self {
        Self::new(label, ACTIVE_STATUS, 0, total_licenses)
    }

    /// Whether the grant is in force
    pub fn is_active(&self) -> bool {
        self.status == ACTIVE_STATUS
    }
}

/// Read-only source of license grant records
#[allow(async_fn_in_trait)]
pub trait LicenseSource: Send + Sync {
    /// Load every grant record, unfiltered
    ///
    /// # Errors
    ///
    /// Returns [`QuotaError::QuotaEvaluation`] if the source is unreachable.
    async fn load_grants(&self) -> Result<Vec<LicenseGrant>>;
}

/// In-memory grant table
#[derive(Debug, Clone, Default)]
pub struct StaticLicenseSource {
    grants: Vec<LicenseGrant>,
}

impl StaticLicenseSource {
    pub fn new(grants: Vec<LicenseGrant>) -> Self {
        Self { grants }
    }
}

#[allow(async_fn_in_trait)]
impl LicenseSource for StaticLicenseSource {
    async fn load_grants(&self) -> Result<Vec<LicenseGrant>> {
        Ok(self.grants.clone())
    }
}

/// Grant table exported as a JSON array of records
///
/// ```json
/// [
///   { "label": "Einstein Analytics Growth", "status": "Active",
///     "usedLicenses": 3, "totalLicenses": 5 }
/// ]
/// ```
#[derive(Debug, Clone)]
pub struct JsonFileLicenseSource {
    path: PathBuf,
}

impl JsonFileLicenseSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the grant file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[allow(async_fn_in_trait)]
impl LicenseSource for JsonFileLicenseSource {
    async fn load_grants(&self) -> Result<Vec<LicenseGrant>> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            QuotaError::QuotaEvaluation(format!(
                "License source {} is unreachable: {}",
                self.path.display(),
                e
            ))
        })?;

        let grants: Vec<LicenseGrant> = serde_json::from_str(&content).map_err(|e| {
            QuotaError::Parse(format!(
                "Invalid license grant records in {}: {}",
                self.path.display(),
                e
            ))
        })?;

        tracing::debug!(
            "Loaded {} license grants from {}",
            grants.len(),
            self.path.display()
        );

        Ok(grants)
    }
}
