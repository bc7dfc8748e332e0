//! appscale-metrics — turns raw per-task counters into utilization.
//!
//! # Architecture
//!
//! ```text
//! host statistics (one report per host)
//!   └── CounterIndex::merge() → task id → TaskCounters
//!
//! aggregate(tasks, previous sample, elapsed)
//!   ├── mem% per task = 100 * rss / limit
//!   ├── cpu% per task = 100 * Δcpu_seconds / elapsed   (0 without baseline)
//!   └── workload mean → UtilizationSample
//! ```
//!
//! A workload without tasks has no mean; `aggregate` returns `None` and the
//! caller skips it for the cycle.

pub mod aggregator;

pub use aggregator::{aggregate, CounterIndex};
