//! Analytics REST Client
//!
//! Everything that talks to the analytics platform:
//!
//! 1. **Transport Layer** (`transport`, `http_transport`): one authenticated GET
//! 2. **Protocol Layer** (`protocol`): listing and versions response shapes
//! 3. **Enumeration** (`datasets`): cursor-following dataset listing
//! 4. **Aggregation** (`usage`): per-dataset and total row usage
//!
//! All requests are issued one at a time; no call is started before the
//! previous one has completed.

pub mod datasets;
pub mod http_transport;
pub mod protocol;
pub mod transport;
pub mod usage;

#[cfg(test)]
pub(crate) mod testing;

pub use datasets::DatasetEnumerator;
pub use http_transport::HttpTransport;
pub use protocol::{DatasetId, DatasetListPage, DatasetSummary, DatasetVersion, Endpoints, VersionList};
pub use transport::Transport;
pub use usage::{DatasetUsage, RowUsageAggregator};
