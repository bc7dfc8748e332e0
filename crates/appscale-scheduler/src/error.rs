//! Error types for a scheduling cycle.

use thiserror::Error;

use appscale_client::ClientError;

/// Why a cycle was abandoned.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("listing apps failed")]
    ListApps(#[source] ClientError),

    #[error("fetching detail of {app_id} failed")]
    AppDetail {
        app_id: String,
        #[source]
        source: ClientError,
    },

    #[error("fetching statistics from {host} failed")]
    HostStatistics {
        host: String,
        #[source]
        source: ClientError,
    },

    #[error("{failed} of {total} scale commands failed")]
    Scale {
        failed: usize,
        total: usize,
        #[source]
        first: ClientError,
    },
}

impl CycleError {
    /// The message followed by every source, joined with `: `.
    pub fn chain(&self) -> String {
        let mut out = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(e) = source {
            out.push_str(": ");
            out.push_str(&e.to_string());
            source = e.source();
        }
        out
    }
}
