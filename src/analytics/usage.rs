//! Row-Usage Aggregator
//!
//! Sums `totalRows` across every version of every dataset. Versions are
//! counted in full, never deduplicated or diffed, matching how the platform
//! charges storage.

use crate::analytics::datasets::DatasetEnumerator;
use crate::analytics::protocol::{DatasetId, Endpoints, VersionList};
use crate::analytics::transport::Transport;
use crate::error::{QuotaError, Result};
use serde::{Deserialize, Serialize};

/// Row usage of a single dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetUsage {
    /// Dataset identifier
    pub dataset_id: DatasetId,

    /// Number of stored versions
    pub versions: usize,

    /// Sum of `totalRows` over all versions
    pub rows: u64,
}

/// Aggregates row usage across all datasets of a tenant
pub struct RowUsageAggregator<'a, T>
where
    T: Transport,
{
    transport: &'a T,
    endpoints: &'a Endpoints,
}

impl<'a, T> RowUsageAggregator<'a, T>
where
    T: Transport,
{
    /// Create an aggregator over `transport`
    pub fn new(transport: &'a T, endpoints: &'a Endpoints) -> Self {
        Self {
            transport,
            endpoints,
        }
    }

    /// Row usage of one dataset, fetched in a single request
    ///
    /// # Errors
    ///
    /// Returns a transport error if the fetch fails, or a parse error if any
    /// version lacks `totalRows`.
    pub async fn dataset_usage(&self, dataset_id: &str) -> Result<DatasetUsage> {
        let body = self.transport.get(&self.endpoints.versions(dataset_id)).await?;
        let list = VersionList::from_body(&body)?;

        let rows = list
            .versions
            .iter()
            .try_fold(0u64, |acc, version| acc.checked_add(version.total_rows))
            .ok_or_else(|| {
                QuotaError::Parse(format!("Row count of dataset {} overflows u64", dataset_id))
            })?;

        tracing::debug!(
            "Dataset {} has {} versions, {} rows",
            dataset_id,
            list.versions.len(),
            rows
        );

        Ok(DatasetUsage {
            dataset_id: dataset_id.to_string(),
            versions: list.versions.len(),
            rows,
        })
    }

    /// Per-dataset usage for every dataset, in listing order
    ///
    /// Stops at the first failure; no partial breakdown is returned.
    pub async fn usage_by_dataset(&self) -> Result<Vec<DatasetUsage>> {
        let ids = DatasetEnumerator::new(self.transport, self.endpoints)
            .list_dataset_ids()
            .await?;

        let mut usage = Vec::with_capacity(ids.len());
        for id in &ids {
            usage.push(self.dataset_usage(id).await?);
        }
        Ok(usage)
    }

    /// Total rows used across all datasets
    pub async fn total_rows_used(&self) -> Result<u64> {
        let usage = self.usage_by_dataset().await?;
        let total = sum_rows(&usage)?;

        tracing::info!("Total rows used: {} across {} datasets", total, usage.len());

        Ok(total)
    }
}

/// Sum the rows of a usage breakdown
pub fn sum_rows(usage: &[DatasetUsage]) -> Result<u64> {
    usage
        .iter()
        .try_fold(0u64, |acc, dataset| acc.checked_add(dataset.rows))
        .ok_or_else(|| QuotaError::Parse("Total row usage overflows u64".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::testing::CannedTransport;

    const FIRST: &str = "/services/data/v58.0/wave/datasets";

    fn versions(rows: &[u64]) -> String {
        let versions: Vec<_> = rows
            .iter()
            .map(|r| serde_json::json!({ "id": "0Fc", "totalRows": r }))
            .collect();
        serde_json::json!({ "versions": versions }).to_string()
    }

    fn two_dataset_transport() -> CannedTransport {
        CannedTransport::new()
            .with(
                FIRST,
                r#"{"datasets":[{"id":"ds1"},{"id":"ds2"}],"nextPageUrl":null}"#,
            )
            .with(format!("{}/ds1/versions", FIRST), versions(&[4_000_000, 6_000_000]))
            .with(format!("{}/ds2/versions", FIRST), versions(&[5_000_000]))
    }

    #[tokio::test]
    async fn test_dataset_usage_sums_all_versions() {
        let transport = two_dataset_transport();
        let endpoints = Endpoints::new("58.0");

        let usage = RowUsageAggregator::new(&transport, &endpoints)
            .dataset_usage("ds1")
            .await
            .unwrap();

        assert_eq!(usage.versions, 2);
        assert_eq!(usage.rows, 10_000_000);
    }

    #[tokio::test]
    async fn test_dataset_without_versions_contributes_zero() {
        let transport = CannedTransport::new()
            .with(FIRST, r#"{"datasets":[{"id":"empty"}]}"#)
            .with(format!("{}/empty/versions", FIRST), r#"{"versions":[]}"#);
        let endpoints = Endpoints::new("58.0");

        let total = RowUsageAggregator::new(&transport, &endpoints)
            .total_rows_used()
            .await
            .unwrap();

        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_total_rows_used_across_datasets() {
        let transport = two_dataset_transport();
        let endpoints = Endpoints::new("58.0");
        let aggregator = RowUsageAggregator::new(&transport, &endpoints);

        let breakdown = aggregator.usage_by_dataset().await.unwrap();
        assert_eq!(breakdown.len(), 2);
        assert_eq!(breakdown[0].dataset_id, "ds1");
        assert_eq!(breakdown[1].rows, 5_000_000);

        assert_eq!(aggregator.total_rows_used().await.unwrap(), 15_000_000);
    }

    #[tokio::test]
    async fn test_missing_total_rows_aborts() {
        let transport = CannedTransport::new()
            .with(FIRST, r#"{"datasets":[{"id":"ds1"},{"id":"ds2"}]}"#)
            .with(format!("{}/ds1/versions", FIRST), versions(&[10]))
            .with(format!("{}/ds2/versions", FIRST), r#"{"versions":[{"id":"v"}]}"#);
        let endpoints = Endpoints::new("58.0");

        let err = RowUsageAggregator::new(&transport, &endpoints)
            .total_rows_used()
            .await
            .unwrap_err();

        assert!(err.is_parse());
    }

    #[tokio::test]
    async fn test_failed_versions_fetch_aborts() {
        let transport = two_dataset_transport().failing_at(format!("{}/ds2/versions", FIRST));
        let endpoints = Endpoints::new("58.0");

        let err = RowUsageAggregator::new(&transport, &endpoints)
            .total_rows_used()
            .await
            .unwrap_err();

        assert!(err.is_transport());
    }

    #[test]
    fn test_sum_rows_overflow_is_error() {
        let usage = vec![
            DatasetUsage {
                dataset_id: "a".into(),
                versions: 1,
                rows: u64::MAX,
            },
            DatasetUsage {
                dataset_id: "b".into(),
                versions: 1,
                rows: 1,
            },
        ];
        assert!(sum_rows(&usage).unwrap_err().is_parse());
    }
}
