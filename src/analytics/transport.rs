//! Analytics Transport Layer
//!
//! This module defines the transport abstraction used to talk to the
//! analytics REST API. The transport knows nothing about datasets or
//! pagination: it issues one authenticated GET and hands back the body.
//!
//! # Architecture
//!
//! Keeping the seam this thin lets the enumerator and aggregator run
//! against [`HttpTransport`](super::HttpTransport) in production and against
//! canned responses in tests.

use crate::error::Result;

/// Transport trait for analytics API communication
///
/// Implementations issue a GET for `path` against their configured base
/// endpoint and return the raw response body. Any network, authentication
/// or status failure must be returned as [`QuotaError::Transport`](crate::QuotaError::Transport).
#[allow(async_fn_in_trait)]
pub trait Transport: Send + Sync {
    /// Fetch the body at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Host-relative path, or a cursor URL echoed back by the API
    async fn get(&self, path: &str) -> Result<String>;
}

