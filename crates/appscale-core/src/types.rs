//! Domain types for the autoscaler.
//!
//! `Workload` and `TaskMetric` are rebuilt from the orchestrator every
//! cycle. `UtilizationSample` and `ScalingState` are what survives from one
//! cycle to the next.

use std::collections::HashMap;

/// Orchestrator application id (e.g. `/group/api`).
pub type AppId = String;

/// Orchestrator task id. Host metrics report it as the executor id.
pub type TaskId = String;

// ── Configuration ─────────────────────────────────────────────────

/// Per-workload scaling thresholds, resolved from labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub min_cpu_percent: u32,
    pub max_cpu_percent: u32,
    pub min_mem_percent: u32,
    pub max_mem_percent: u32,
    /// Largest change allowed per cycle, as a percentage of the current count.
    pub scale_percent: u32,
    /// Consecutive cycles a direction must be seen before it is applied.
    pub spike_filter_count: u32,
    pub min_instances: u32,
    pub max_instances: u32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_cpu_percent: 10,
            max_cpu_percent: 40,
            min_mem_percent: 50,
            max_mem_percent: 80,
            scale_percent: 10,
            spike_filter_count: 2,
            min_instances: 1,
            max_instances: 30,
        }
    }
}

impl Thresholds {
    /// Clamp an instance count into `[min_instances, max_instances]`.
    pub fn clamp_instances(&self, instances: i64) -> u32 {
        let max = self.max_instances.max(self.min_instances);
        instances.clamp(self.min_instances as i64, max as i64) as u32
    }
}

// ── Per-cycle observations ────────────────────────────────────────

/// Raw cumulative counters reported for one task by its host.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TaskCounters {
    /// System + user CPU time, in seconds, since the task started.
    pub cpu_seconds: f64,
    pub mem_rss_bytes: u64,
    pub mem_limit_bytes: u64,
}

/// One running task of a workload, with whatever its host reported.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskMetric {
    pub app_id: AppId,
    pub task_id: TaskId,
    pub host: String,
    /// `None` when the host did not report this task.
    pub counters: Option<TaskCounters>,
}

/// An autoscaled application as observed in the current cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Workload {
    pub id: AppId,
    pub thresholds: Thresholds,
    /// Current instance count (running tasks).
    pub instances: u32,
    pub tasks: Vec<TaskMetric>,
}

/// Averaged utilization of a workload for one cycle.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UtilizationSample {
    pub cpu_percent: f64,
    pub mem_percent: f64,
    /// Cumulative CPU seconds per task, the baseline for the next cycle's rate.
    pub cpu_seconds: HashMap<TaskId, f64>,
}

// ── State threaded between cycles ─────────────────────────────────

/// Sign of a proposed instance change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    Down,
    #[default]
    Steady,
    Up,
}

impl Direction {
    /// Direction of moving from `current` to `target`.
    pub fn between(current: u32, target: u32) -> Self {
        match target.cmp(&current) {
            std::cmp::Ordering::Less => Direction::Down,
            std::cmp::Ordering::Equal => Direction::Steady,
            std::cmp::Ordering::Greater => Direction::Up,
        }
    }

    pub fn signum(self) -> i8 {
        match self {
            Direction::Down => -1,
            Direction::Steady => 0,
            Direction::Up => 1,
        }
    }
}

/// Debounce state: the last direction seen and how many cycles in a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpikeFilterState {
    pub last_direction: Direction,
    pub consecutive: u32,
}

/// Everything remembered about a workload between cycles.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScalingState {
    /// Sample from the last successful cycle, if any.
    pub previous: Option<UtilizationSample>,
    pub spike: SpikeFilterState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_thresholds_match_documented_defaults() {
        let t = Thresholds::default();
        assert_eq!((t.min_cpu_percent, t.max_cpu_percent), (10, 40));
        assert_eq!((t.min_mem_percent, t.max_mem_percent), (50, 80));
        assert_eq!(t.scale_percent, 10);
        assert_eq!(t.spike_filter_count, 2);
        assert_eq!((t.min_instances, t.max_instances), (1, 30));
    }

    #[test]
    fn clamp_instances_bounds() {
        let t = Thresholds {
            min_instances: 2,
            max_instances: 5,
            ..Thresholds::default()
        };
        assert_eq!(t.clamp_instances(-3), 2);
        assert_eq!(t.clamp_instances(0), 2);
        assert_eq!(t.clamp_instances(4), 4);
        assert_eq!(t.clamp_instances(i64::MAX), 5);
    }

    #[test]
    fn clamp_instances_with_inverted_bounds_uses_min() {
        let t = Thresholds {
            min_instances: 8,
            max_instances: 3,
            ..Thresholds::default()
        };
        assert_eq!(t.clamp_instances(1), 8);
        assert_eq!(t.clamp_instances(20), 8);
    }

    #[test]
    fn direction_between_counts() {
        assert_eq!(Direction::between(3, 4), Direction::Up);
        assert_eq!(Direction::between(3, 3), Direction::Steady);
        assert_eq!(Direction::between(3, 1), Direction::Down);
        assert_eq!(Direction::Down.signum(), -1);
        assert_eq!(Direction::Up.signum(), 1);
    }
}
