//! appscale-scheduler — the periodic autoscaling loop.
//!
//! # Cycle
//!
//! ```text
//! list apps ──► filter enabled ──► app details (concurrent)
//!                                      │
//!              host statistics (one request per distinct host, concurrent)
//!                                      │
//!              aggregate per workload ──► decide per workload
//!                                      │
//!              scale commands (concurrent) ──► commit state ──► sleep
//! ```
//!
//! The scheduler owns the `ScalingStateStore`. A cycle stages its state
//! changes and commits them only if every step succeeded, so a failed cycle
//! leaves the baseline and the spike filters exactly as they were. The first
//! cycle, and the first sighting of any workload, only records a baseline.
//!
//! `Scheduler::run` repeats cycles with a fixed delay until its shutdown
//! signal fires; failures are logged and never stop the loop.

pub mod error;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod testing;

pub use error::CycleError;
pub use scheduler::{CycleCounts, CycleReport, ScaleCommand, Scheduler, SchedulerConfig, WorkloadDecision};
