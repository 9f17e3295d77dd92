//! Dataset Enumerator
//!
//! Walks the cursor-paginated dataset listing to completion and flattens
//! every page into a single list of dataset ids, in page order.
//!
//! There is no page cap: an API that never returns a null cursor keeps the
//! walk going. Any failed page aborts the walk and no partial list is
//! returned.

use crate::analytics::protocol::{DatasetId, DatasetListPage, DatasetSummary, Endpoints};
use crate::analytics::transport::Transport;
use crate::error::Result;

/// Enumerates every dataset visible to the tenant
pub struct DatasetEnumerator<'a, T>
where
    T: Transport,
{
    transport: &'a T,
    endpoints: &'a Endpoints,
}

impl<'a, T> DatasetEnumerator<'a, T>
where
    T: Transport,
{
    /// Create an enumerator over `transport`
    pub fn new(transport: &'a T, endpoints: &'a Endpoints) -> Self {
        Self {
            transport,
            endpoints,
        }
    }

    /// Fetch every dataset summary across all listing pages
    ///
    /// # Errors
    ///
    /// Returns the first transport or parse error encountered.
    pub async fn list_datasets(&self) -> Result<Vec<DatasetSummary>> {
        let mut datasets = Vec::new();
        let mut next = Some(self.endpoints.datasets());
        let mut pages = 0usize;

        while let Some(path) = next.take() {
            let body = self.transport.get(&path).await?;
            let page = DatasetListPage::from_body(&body)?;
            pages += 1;

            tracing::debug!(
                "Listing page {} returned {} datasets",
                pages,
                page.datasets.len()
            );

            next = page.next_cursor().map(str::to_string);
            datasets.extend(page.datasets);
        }

        tracing::info!("Enumerated {} datasets over {} pages", datasets.len(), pages);

        Ok(datasets)
    }

    /// Fetch every dataset id across all listing pages, in API order
    pub async fn list_dataset_ids(&self) -> Result<Vec<DatasetId>> {
        Ok(self
            .list_datasets()
            .await?
            .into_iter()
            .map(|dataset| dataset.id)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::testing::CannedTransport;
    use proptest::prelude::*;

    const FIRST: &str = "/services/data/v58.0/wave/datasets";

    fn page_body(ids: &[String], next: Option<&str>) -> String {
        let datasets: Vec<_> = ids.iter().map(|id| serde_json::json!({ "id": id })).collect();
        serde_json::json!({ "datasets": datasets, "nextPageUrl": next }).to_string()
    }

    #[tokio::test]
    async fn test_single_page() {
        let transport = CannedTransport::new().with(
            FIRST,
            r#"{"datasets":[{"id":"0Fb1"},{"id":"0Fb2"}],"nextPageUrl":null}"#,
        );
        let endpoints = Endpoints::new("58.0");

        let ids = DatasetEnumerator::new(&transport, &endpoints)
            .list_dataset_ids()
            .await
            .unwrap();

        assert_eq!(ids, vec!["0Fb1", "0Fb2"]);
        assert_eq!(transport.requests(), vec![FIRST]);
    }

    #[tokio::test]
    async fn test_follows_cursor_until_null() {
        let transport = CannedTransport::new()
            .with(
                FIRST,
                r#"{"datasets":[{"id":"a"}],"nextPageUrl":"/services/data/v58.0/wave/datasets?page=2"}"#,
            )
            .with(
                "/services/data/v58.0/wave/datasets?page=2",
                r#"{"datasets":[],"nextPageUrl":"/services/data/v58.0/wave/datasets?page=3"}"#,
            )
            .with(
                "/services/data/v58.0/wave/datasets?page=3",
                r#"{"datasets":[{"id":"b"},{"id":"c"}]}"#,
            );
        let endpoints = Endpoints::new("58.0");

        let ids = DatasetEnumerator::new(&transport, &endpoints)
            .list_dataset_ids()
            .await
            .unwrap();

        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(transport.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_empty_listing() {
        let transport =
            CannedTransport::new().with(FIRST, r#"{"datasets":[],"nextPageUrl":null}"#);
        let endpoints = Endpoints::new("58.0");

        let ids = DatasetEnumerator::new(&transport, &endpoints)
            .list_dataset_ids()
            .await
            .unwrap();

        assert!(ids.is_empty());
    }

    #[tokio::test]
    async fn test_failed_page_returns_no_partial_list() {
        let transport = CannedTransport::new()
            .with(FIRST, r#"{"datasets":[{"id":"a"}],"nextPageUrl":"/next"}"#)
            .failing_at("/next");
        let endpoints = Endpoints::new("58.0");

        let err = DatasetEnumerator::new(&transport, &endpoints)
            .list_dataset_ids()
            .await
            .unwrap_err();

        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_malformed_page_is_parse_error() {
        let transport = CannedTransport::new().with(FIRST, r#"{"datasets":"nope"}"#);
        let endpoints = Endpoints::new("58.0");

        let err = DatasetEnumerator::new(&transport, &endpoints)
            .list_dataset_ids()
            .await
            .unwrap_err();

        assert!(err.is_parse());
    }

    proptest! {
        /// Any chain of pages ending in a null cursor yields the concatenation of its ids
        #[test]
        fn prop_pages_concatenate_in_order(
            pages in prop::collection::vec(prop::collection::vec("[a-zA-Z0-9]{1,12}", 0..5), 1..6)
        ) {
            let mut transport = CannedTransport::new();
            for (i, ids) in pages.iter().enumerate() {
                let path = if i == 0 { FIRST.to_string() } else { format!("/page/{}", i) };
                let next = if i + 1 < pages.len() { Some(format!("/page/{}", i + 1)) } else { None };
                transport = transport.with(path, page_body(ids, next.as_deref()));
            }
            let endpoints = Endpoints::new("58.0");

            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let ids = rt
                .block_on(DatasetEnumerator::new(&transport, &endpoints).list_dataset_ids())
                .unwrap();

            let expected: Vec<String> = pages.concat();
            prop_assert_eq!(ids, expected);
            prop_assert_eq!(transport.requests().len(), pages.len());
        }
    }
}
