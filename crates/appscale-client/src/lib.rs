//! appscale-client — the autoscaler's view of the outside world.
//!
//! Two collaborators are consumed over plain HTTP/1.1 with JSON bodies:
//!
//! ```text
//! Orchestrator (Marathon)
//!   ├── GET  /v2/apps                 → list_apps()
//!   ├── GET  /v2/apps/{id}            → app_detail()
//!   └── PUT  /v2/apps/{id}?force=true → scale_app()
//!
//! HostMetrics (Mesos agent, one per host)
//!   └── GET  http://{host}:5051/monitor/statistics.json → statistics()
//! ```
//!
//! The traits are the seam the scheduler is generic over; `MarathonClient`
//! and `AgentClient` are the hyper-backed implementations.

use std::future::Future;

pub mod agent;
pub mod error;
pub mod transport;
pub mod marathon;

#[cfg(test)]
pub(crate) mod testing;

pub use agent::{AgentClient, ExecutorStatistics, Statistics, DEFAULT_AGENT_PORT};
pub use error::{ClientError, ClientResult};
pub use transport::HttpClient;
pub use marathon::{App, AppDetail, MarathonClient, Task};

/// Workload listing, detail and scaling.
pub trait Orchestrator: Send + Sync {
    /// All applications with their labels.
    fn list_apps(&self) -> impl Future<Output = ClientResult<Vec<App>>> + Send;

    /// One application with its running tasks.
    fn app_detail(&self, app_id: &str) -> impl Future<Output = ClientResult<AppDetail>> + Send;

    /// Set the instance count of an application.
    fn scale_app(
        &self,
        app_id: &str,
        instances: u32,
    ) -> impl Future<Output = ClientResult<()>> + Send;
}

/// Per-host resource counters.
pub trait HostMetrics: Send + Sync {
    /// Counters for every executor running on `host`.
    fn statistics(
        &self,
        host: &str,
    ) -> impl Future<Output = ClientResult<Vec<ExecutorStatistics>>> + Send;
}
