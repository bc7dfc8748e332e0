//! appscale-autoscale — utilization-driven instance decisions.
//!
//! Takes one workload's `UtilizationSample` and thresholds and decides the
//! next instance count. The function is pure apart from the spike filter
//! state it is handed.
//!
//! # Scaling Algorithm
//!
//! ```text
//! factor        = current == 1 ? 1 : (current - 1) / current
//! effective_min = min(factor * max%, min%)            (per resource)
//!
//! util > max%            → ceil(current * util / max%)
//! util < effective_min   → floor(current * util / effective_min)
//! otherwise              → current
//!
//! raw       = max(cpu_estimate - current, mem_estimate - current)
//! max_scale = ceil(current * scale% / 100)
//! target    = clamp(current + clamp(raw, ±max_scale), min, max)
//! ```
//!
//! The damping factor keeps a one-instance scale-up from being undone by the
//! utilization drop it causes. A direction must then be seen for
//! `spike_filter_count` consecutive cycles before it takes effect.

pub mod filter;
pub mod scaler;

pub use filter::admit;
pub use scaler::{
    decide, max_scale, resource_estimate, scale_down_factor, Decision, Diagnostics,
    ResourceEstimate, ScaleDecision,
};
