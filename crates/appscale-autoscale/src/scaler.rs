//! Decision engine — computes the next instance count for one workload.
//!
//! `decide` never fails. Degenerate thresholds (a zero upper bound, a zero
//! effective lower bound) produce no signal for that resource instead of an
//! infinite or NaN estimate.

use tracing::debug;

use appscale_core::{Direction, SpikeFilterState, Thresholds, UtilizationSample};

use crate::filter::admit;

/// Outcome for a single workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleDecision {
    /// Scale to the specified instance count.
    ScaleTo(u32),
    /// No change needed, or the change was held by the spike filter.
    NoChange,
}

/// Instance estimate for one resource (CPU or memory).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceEstimate {
    /// Observed utilization in percent.
    pub utilization: f64,
    /// Upper threshold, used as is.
    pub max_percent: f64,
    /// Lower threshold after damping.
    pub effective_min_percent: f64,
    /// Fewest instances that bring utilization to or under the max.
    /// `None` when the max is not positive.
    pub instance_min: Option<i64>,
    /// Most instances that keep utilization at or above the effective min.
    /// `None` when the effective min is not positive.
    pub instance_max: Option<i64>,
    /// Instances this resource asks for; `current` unless a bound is breached.
    pub instances: i64,
}

/// Intermediate values behind a decision, for logging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Diagnostics {
    pub scale_down_factor: f64,
    pub cpu: ResourceEstimate,
    pub mem: ResourceEstimate,
    pub raw_scale: i64,
    pub max_scale: i64,
    pub scale: i64,
    pub preliminary_target: u32,
    /// The spike filter held the preliminary target back.
    pub suppressed: bool,
}

/// Result of `decide`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub current: u32,
    pub action: ScaleDecision,
    pub diagnostics: Diagnostics,
}

impl Decision {
    /// Instance count after this cycle.
    pub fn target(&self) -> u32 {
        match self.action {
            ScaleDecision::ScaleTo(n) => n,
            ScaleDecision::NoChange => self.current,
        }
    }

    /// Whether a change was let through this cycle.
    pub fn applied_this_cycle(&self) -> bool {
        matches!(self.action, ScaleDecision::ScaleTo(_))
    }
}

/// Damping coefficient for the lower thresholds.
pub fn scale_down_factor(current: u32) -> f64 {
    if current <= 1 {
        1.0
    } else {
        (current - 1) as f64 / current as f64
    }
}

/// Largest change, in instances, allowed in one cycle.
pub fn max_scale(current: u32, scale_percent: u32) -> i64 {
    (current as f64 * scale_percent as f64 / 100.0).ceil() as i64
}

/// Estimate the instance count one resource asks for.
pub fn resource_estimate(
    current: u32,
    utilization: f64,
    min_percent: f64,
    max_percent: f64,
    factor: f64,
) -> ResourceEstimate {
    let effective_min_percent = (factor * max_percent).min(min_percent);
    let load = current as f64 * utilization;

    let instance_min = (max_percent > 0.0).then(|| (load / max_percent).ceil() as i64);
    let instance_max =
        (effective_min_percent > 0.0).then(|| (load / effective_min_percent).floor() as i64);

    let instances = match (instance_min, instance_max) {
        (Some(n), _) if utilization > max_percent => n,
        (_, Some(n)) if utilization < effective_min_percent => n,
        _ => current as i64,
    };

    ResourceEstimate {
        utilization,
        max_percent,
        effective_min_percent,
        instance_min,
        instance_max,
        instances,
    }
}

/// Decide the instance count for the next cycle.
///
/// `spike` is this workload's filter state and is updated in place.
pub fn decide(
    current: u32,
    sample: &UtilizationSample,
    thresholds: &Thresholds,
    spike: &mut SpikeFilterState,
) -> Decision {
    let factor = scale_down_factor(current);

    let cpu = resource_estimate(
        current,
        sample.cpu_percent,
        thresholds.min_cpu_percent as f64,
        thresholds.max_cpu_percent as f64,
        factor,
    );
    let mem = resource_estimate(
        current,
        sample.mem_percent,
        thresholds.min_mem_percent as f64,
        thresholds.max_mem_percent as f64,
        factor,
    );

    let current_i = current as i64;
    let raw_scale = (cpu.instances - current_i).max(mem.instances - current_i);
    let max_scale = max_scale(current, thresholds.scale_percent);
    let scale = raw_scale.clamp(-max_scale, max_scale);
    let preliminary_target = thresholds.clamp_instances(current_i.saturating_add(scale));

    let direction = Direction::between(current, preliminary_target);
    let admitted = admit(spike, direction, thresholds.spike_filter_count);
    let suppressed = !admitted && direction != Direction::Steady;

    let action = if admitted && preliminary_target != current {
        ScaleDecision::ScaleTo(preliminary_target)
    } else {
        ScaleDecision::NoChange
    };

    let diagnostics = Diagnostics {
        scale_down_factor: factor,
        cpu,
        mem,
        raw_scale,
        max_scale,
        scale,
        preliminary_target,
        suppressed,
    };

    debug!(
        current,
        cpu = sample.cpu_percent,
        mem = sample.mem_percent,
        cpu_effective_min = cpu.effective_min_percent,
        mem_effective_min = mem.effective_min_percent,
        cpu_instances = cpu.instances,
        mem_instances = mem.instances,
        scale,
        max_scale,
        preliminary_target,
        suppressed,
        "scaling decision"
    );

    Decision {
        current,
        action,
        diagnostics,
    }
}
