//! Quota Reconciliation
//!
//! Combines the row usage reported by the analytics API with the row
//! allotment entitled by license grants.
//!
//! [`QuotaService`] is the entry surface: it owns a transport and a license
//! source and exposes `get_dataset_ids`, `get_total_rows_used`,
//! `get_total_row_allotment` and `get_remaining_capacity`, each callable on
//! its own. Nothing is cached between calls.

use crate::analytics::{
    DatasetEnumerator, DatasetId, DatasetUsage, Endpoints, RowUsageAggregator, Transport,
};
use crate::analytics::usage::sum_rows;
use crate::error::Result;
use crate::license::{AllotmentBreakdown, LicenseQuotaEvaluator, LicenseSource};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Remaining row capacity, clamped at zero
///
/// Over-usage is not an error; compare `used` and `allotted` directly to
/// detect it.
pub fn remaining_capacity(allotted: u64, used: u64) -> u64 {
    allotted.saturating_sub(used)
}

/// Rows used, rows allotted, and rows remaining
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuotaResult {
    pub rows_used: u64,
    pub rows_allotted: u64,
    pub rows_remaining: u64,
}

impl QuotaResult {
    pub fn new(rows_used: u64, rows_allotted: u64) -> Self {
        Self {
            rows_used,
            rows_allotted,
            rows_remaining: remaining_capacity(rows_allotted, rows_used),
        }
    }

    /// Whether usage exceeds the allotment
    pub fn is_over_quota(&self) -> bool {
        self.rows_used > self.rows_allotted
    }

    /// Usage as a percentage of the allotment
    ///
    /// Zero when nothing is allotted and nothing is used; infinite when rows
    /// are used without any allotment.
    pub fn utilization_percent(&self) -> f64 {
        if self.rows_allotted == 0 {
            if self.rows_used == 0 {
                0.0
            } else {
                f64::INFINITY
            }
        } else {
            (self.rows_used as f64 / self.rows_allotted as f64) * 100.0
        }
    }
}

/// Full quota report with both breakdowns
#[derive(Debug, Clone, Serialize)]
pub struct QuotaReport {
    /// When the report was computed
    pub generated_at: DateTime<Utc>,

    /// Headline numbers
    pub quota: QuotaResult,

    /// Row usage per dataset, in listing order
    pub datasets: Vec<DatasetUsage>,

    /// How the allotment was reached
    pub allotment: AllotmentBreakdown,
}

/// Quota entry points over a transport and a license source
pub struct QuotaService<T, L>
where
    T: Transport,
    L: LicenseSource,
{
    transport: T,
    licenses: L,
    endpoints: Endpoints,
    evaluator: LicenseQuotaEvaluator,
}

impl<T, L> QuotaService<T, L>
where
    T: Transport,
    L: LicenseSource,
{
    /// Create a service with default endpoints and premium prefix
    pub fn new(transport: T, licenses: L) -> Self {
        Self {
            transport,
            licenses,
            endpoints: Endpoints::default(),
            evaluator: LicenseQuotaEvaluator::default(),
        }
    }

    /// Use a specific endpoint layout
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Use a specific license evaluator
    pub fn with_evaluator(mut self, evaluator: LicenseQuotaEvaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Get the underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Get the endpoint layout
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Every dataset id in the tenant, in listing order
    pub async fn get_dataset_ids(&self) -> Result<Vec<DatasetId>> {
        DatasetEnumerator::new(&self.transport, &self.endpoints)
            .list_dataset_ids()
            .await
    }

    /// Rows used across every version of every dataset
    pub async fn get_total_rows_used(&self) -> Result<u64> {
        RowUsageAggregator::new(&self.transport, &self.endpoints)
            .total_rows_used()
            .await
    }

    /// Rows entitled by the Active license grants
    pub async fn get_total_row_allotment(&self) -> Result<u64> {
        self.evaluator.total_row_allotment(&self.licenses).await
    }

    /// Rows used, allotted and remaining
    ///
    /// The allotment is evaluated first so an unreachable license source
    /// fails before any dataset traffic is issued.
    pub async fn get_quota(&self) -> Result<QuotaResult> {
        let allotted = self.get_total_row_allotment().await?;
        let used = self.get_total_rows_used().await?;
        Ok(self.reconcile(used, allotted))
    }

    /// Unused row capacity, floored at zero
    pub async fn get_remaining_capacity(&self) -> Result<u64> {
        Ok(self.get_quota().await?.rows_remaining)
    }

    /// Quota result together with the per-dataset and per-grant breakdowns
    pub async fn report(&self) -> Result<QuotaReport> {
        let allotment = self.evaluator.evaluate_source(&self.licenses).await?;
        let datasets = RowUsageAggregator::new(&self.transport, &self.endpoints)
            .usage_by_dataset()
            .await?;
        let used = sum_rows(&datasets)?;

        Ok(QuotaReport {
            generated_at: Utc::now(),
            quota: self.reconcile(used, allotment.total),
            datasets,
            allotment,
        })
    }

    fn reconcile(&self, used: u64, allotted: u64) -> QuotaResult {
        let result = QuotaResult::new(used, allotted);
        if result.is_over_quota() {
            tracing::warn!(
                "Row usage {} exceeds allotment {}; remaining capacity clamped to 0",
                used,
                allotted
            );
        } else {
            tracing::info!(
                "Rows used {}, allotted {}, remaining {}",
                used,
                allotted,
                result.rows_remaining
            );
        }
        result
    }
}
