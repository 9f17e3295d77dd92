//! Analytics Quota Library
//!
//! Computes storage-quota utilization for an analytics tenant:
//!
//! - walks the paginated dataset listing and sums `totalRows` across every
//!   dataset version ([`analytics`])
//! - maps Active license grants to a row allotment through a first-match
//!   rule table ([`license`])
//! - reports rows used, rows allotted and remaining capacity ([`quota`])
//!
//! All network I/O is sequential: one request in flight at a time, no
//! retries, and the first failure aborts the whole computation.

pub mod analytics;
pub mod config;
pub mod error;
pub mod license;
pub mod quota;

pub use error::{QuotaError, Result};
pub use quota::{remaining_capacity, QuotaReport, QuotaResult, QuotaService};
