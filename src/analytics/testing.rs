//! Canned transport shared by the analytics unit tests

use crate::analytics::transport::Transport;
use crate::error::{QuotaError, Result};
use std::collections::HashMap;
use std::sync::Mutex;

/// Transport that answers from a fixed path -> body table
#[derive(Default)]
pub struct CannedTransport {
    responses: HashMap<String, String>,
    failing: Option<String>,
    requests: Mutex<Vec<String>>,
}

impl CannedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: impl Into<String>, body: impl Into<String>) -> Self {
        self.responses.insert(path.into(), body.into());
        self
    }

    /// Make requests for `path` fail with a transport error
    pub fn failing_at(mut self, path: impl Into<String>) -> Self {
        self.failing = Some(path.into());
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[allow(async_fn_in_trait)]
impl Transport for CannedTransport {
    async fn get(&self, path: &str) -> Result<String> {
        self.requests.lock().unwrap().push(path.to_string());

        if self.failing.as_deref() == Some(path) {
            return Err(QuotaError::Transport(format!("connection reset on {}", path)));
        }

        self.responses
            .get(path)
            .cloned()
            .ok_or_else(|| QuotaError::Transport(format!("404 Not Found: {}", path)))
    }
}
