//! appscale-core — shared model for the appscale autoscaler.
//!
//! Holds the per-cycle domain types (workloads, task metrics, utilization
//! samples), the label-based threshold resolver, and the process-lifetime
//! scaling state store threaded between cycles.
//!
//! # Architecture
//!
//! ```text
//! LabelResolver
//!   └── labels → Thresholds (typed, defaulted)
//!
//! Workload (rebuilt every cycle)
//!   ├── Thresholds
//!   ├── current instance count
//!   └── Vec<TaskMetric> (raw per-task counters)
//!
//! ScalingStateStore (lives for the process)
//!   └── app id → ScalingState { previous sample, spike filter }
//! ```
//!
//! Nothing here is persisted across restarts.

pub mod labels;
pub mod store;
pub mod types;

pub use labels::{LabelResolver, LabelValue, DEFAULT_LABEL_PREFIX};
pub use store::ScalingStateStore;
pub use types::*;
