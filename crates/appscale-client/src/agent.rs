//! Mesos agent statistics client.
//!
//! Every agent exposes cumulative counters for the executors it runs at
//! `/monitor/statistics.json`. Marathon task ids double as executor ids.

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use appscale_core::TaskCounters;

use crate::error::ClientResult;
use crate::transport::HttpClient;
use crate::HostMetrics;

/// Port the agent serves statistics on unless configured otherwise.
pub const DEFAULT_AGENT_PORT: u16 = 5051;

const STATISTICS_PATH: &str = "/monitor/statistics.json";

/// One executor entry of the statistics report.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ExecutorStatistics {
    pub executor_id: String,
    pub statistics: Statistics,
}

/// Raw counters. Fields the agent omits read as zero.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq)]
pub struct Statistics {
    #[serde(default)]
    pub cpus_system_time_secs: f64,
    #[serde(default)]
    pub cpus_user_time_secs: f64,
    #[serde(default)]
    pub mem_rss_bytes: u64,
    #[serde(default)]
    pub mem_limit_bytes: u64,
}

impl ExecutorStatistics {
    pub fn counters(&self) -> TaskCounters {
        TaskCounters {
            cpu_seconds: self.statistics.cpus_system_time_secs
                + self.statistics.cpus_user_time_secs,
            mem_rss_bytes: self.statistics.mem_rss_bytes,
            mem_limit_bytes: self.statistics.mem_limit_bytes,
        }
    }
}

/// Fetches statistics from agents on a fixed port.
#[derive(Debug, Clone)]
pub struct AgentClient {
    http: HttpClient,
    port: u16,
}

impl AgentClient {
    pub fn new(port: u16, timeout: Duration) -> Self {
        Self {
            http: HttpClient::new(timeout),
            port,
        }
    }
}

impl HostMetrics for AgentClient {
    async fn statistics(&self, host: &str) -> ClientResult<Vec<ExecutorStatistics>> {
        let authority = format!("{host}:{}", self.port);
        let executors: Vec<ExecutorStatistics> =
            self.http.get_json(&authority, STATISTICS_PATH).await?;
        debug!(%host, executors = executors.len(), "host statistics fetched");
        Ok(executors)
    }
}
