//! Monitoring aggregation.
//!
//! Pure functions over one cycle's task counters and the previous cycle's
//! sample. No I/O happens here.

use std::collections::HashMap;

use tracing::{debug, warn};

use appscale_core::{TaskCounters, TaskId, TaskMetric, UtilizationSample};

/// Counters for every task reported by any host in the current cycle.
#[derive(Debug, Clone, Default)]
pub struct CounterIndex {
    counters: HashMap<TaskId, TaskCounters>,
}

impl CounterIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one host's report. A task reported by two hosts keeps the later
    /// report.
    pub fn merge<I>(&mut self, host: &str, entries: I)
    where
        I: IntoIterator<Item = (TaskId, TaskCounters)>,
    {
        let mut merged = 0usize;
        for (task_id, counters) in entries {
            if self.counters.insert(task_id.clone(), counters).is_some() {
                warn!(%host, %task_id, "task reported by more than one host");
            }
            merged += 1;
        }
        debug!(%host, tasks = merged, "host statistics merged");
    }

    pub fn get(&self, task_id: &str) -> Option<TaskCounters> {
        self.counters.get(task_id).copied()
    }

    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }
}

/// Memory utilization of one task in percent. Zero when the task was not
/// reported or has no memory limit.
pub fn task_mem_percent(counters: Option<&TaskCounters>) -> f64 {
    match counters {
        Some(c) if c.mem_limit_bytes > 0 => {
            100.0 * c.mem_rss_bytes as f64 / c.mem_limit_bytes as f64
        }
        _ => 0.0,
    }
}

/// CPU utilization of one task in percent over `elapsed_secs`.
///
/// Zero without both a current and a previous reading (cold start), for a
/// non-positive window, or when the counter went backwards.
pub fn task_cpu_percent(current: Option<f64>, previous: Option<f64>, elapsed_secs: f64) -> f64 {
    match (current, previous) {
        (Some(cur), Some(prev)) if elapsed_secs > 0.0 && elapsed_secs.is_finite() => {
            let rate = 100.0 * (cur - prev) / elapsed_secs;
            if rate.is_finite() { rate.max(0.0) } else { 0.0 }
        }
        _ => 0.0,
    }
}

/// Aggregate a workload's tasks into one utilization sample.
///
/// `previous` is the sample from the last successful cycle; its per-task
/// CPU seconds are the baseline for the rate. Returns `None` when there are
/// no tasks to average.
pub fn aggregate(
    tasks: &[TaskMetric],
    previous: Option<&UtilizationSample>,
    elapsed_secs: f64,
) -> Option<UtilizationSample> {
    if tasks.is_empty() {
        return None;
    }

    let mut cpu_total = 0.0;
    let mut mem_total = 0.0;
    let mut cpu_seconds = HashMap::with_capacity(tasks.len());

    for task in tasks {
        let current = task.counters.map(|c| c.cpu_seconds);
        let prev = previous.and_then(|p| p.cpu_seconds.get(&task.task_id).copied());

        cpu_total += task_cpu_percent(current, prev, elapsed_secs);
        mem_total += task_mem_percent(task.counters.as_ref());

        if let Some(cur) = current {
            cpu_seconds.insert(task.task_id.clone(), cur);
        }
    }

    let n = tasks.len() as f64;
    Some(UtilizationSample {
        cpu_percent: cpu_total / n,
        mem_percent: mem_total / n,
        cpu_seconds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, cpu_seconds: f64, rss: u64, limit: u64) -> TaskMetric {
        TaskMetric {
            app_id: "/api".to_string(),
            task_id: id.to_string(),
            host: "agent-1".to_string(),
            counters: Some(TaskCounters {
                cpu_seconds,
                mem_rss_bytes: rss,
                mem_limit_bytes: limit,
            }),
        }
    }

    fn unreported(id: &str) -> TaskMetric {
        TaskMetric {
            app_id: "/api".to_string(),
            task_id: id.to_string(),
            host: "agent-1".to_string(),
            counters: None,
        }
    }

    #[test]
    fn empty_task_list_has_no_sample() {
        assert_eq!(aggregate(&[], None, 5.0), None);
    }

    #[test]
    fn cold_start_reports_zero_cpu() {
        let tasks = [task("t1", 100.0, 50, 100)];
        let sample = aggregate(&tasks, None, 5.0).unwrap();

        assert_eq!(sample.cpu_percent, 0.0);
        assert_eq!(sample.mem_percent, 50.0);
        assert_eq!(sample.cpu_seconds.get("t1"), Some(&100.0));
    }

    #[test]
    fn cpu_rate_uses_previous_sample() {
        let first = aggregate(&[task("t1", 100.0, 0, 100)], None, 5.0).unwrap();
        // 2 CPU seconds over a 5 s window = 40 %.
        let second = aggregate(&[task("t1", 102.0, 0, 100)], Some(&first), 5.0).unwrap();

        assert!((second.cpu_percent - 40.0).abs() < 1e-9);
    }

    #[test]
    fn workload_values_are_task_means() {
        let previous = UtilizationSample {
            cpu_seconds: HashMap::from([("t1".to_string(), 10.0), ("t2".to_string(), 10.0)]),
            ..Default::default()
        };
        let tasks = [task("t1", 11.0, 20, 100), task("t2", 13.0, 60, 100)];

        let sample = aggregate(&tasks, Some(&previous), 10.0).unwrap();

        // cpu: (10 % + 30 %) / 2, mem: (20 % + 60 %) / 2
        assert!((sample.cpu_percent - 20.0).abs() < 1e-9);
        assert!((sample.mem_percent - 40.0).abs() < 1e-9);
    }

    #[test]
    fn new_task_counts_as_zero_cpu() {
        let previous = UtilizationSample {
            cpu_seconds: HashMap::from([("t1".to_string(), 0.0)]),
            ..Default::default()
        };
        let tasks = [task("t1", 5.0, 0, 100), task("t2", 900.0, 0, 100)];

        let sample = aggregate(&tasks, Some(&previous), 5.0).unwrap();

        // t1: 100 %, t2 has no baseline: 0 %.
        assert!((sample.cpu_percent - 50.0).abs() < 1e-9);
    }

    #[test]
    fn unreported_task_counts_as_zero() {
        let tasks = [task("t1", 0.0, 80, 100), unreported("t2")];
        let sample = aggregate(&tasks, None, 5.0).unwrap();

        assert!((sample.mem_percent - 40.0).abs() < 1e-9);
        assert!(!sample.cpu_seconds.contains_key("t2"));
    }

    #[test]
    fn utilization_above_hundred_is_kept() {
        let previous = UtilizationSample {
            cpu_seconds: HashMap::from([("t1".to_string(), 0.0)]),
            ..Default::default()
        };
        // Four cores busy for five seconds.
        let sample = aggregate(&[task("t1", 20.0, 300, 100)], Some(&previous), 5.0).unwrap();

        assert!((sample.cpu_percent - 400.0).abs() < 1e-9);
        assert!((sample.mem_percent - 300.0).abs() < 1e-9);
    }

    #[test]
    fn guards_against_degenerate_inputs() {
        assert_eq!(task_mem_percent(Some(&TaskCounters::default())), 0.0);
        assert_eq!(task_cpu_percent(Some(10.0), Some(5.0), 0.0), 0.0);
        assert_eq!(task_cpu_percent(Some(10.0), Some(5.0), f64::NAN), 0.0);
        assert_eq!(task_cpu_percent(Some(1.0), Some(5.0), 5.0), 0.0);
        assert_eq!(task_cpu_percent(None, Some(5.0), 5.0), 0.0);
    }

    #[test]
    fn counter_index_merges_hosts() {
        let mut index = CounterIndex::new();
        index.merge(
            "agent-1",
            [("t1".to_string(), TaskCounters { cpu_seconds: 1.0, ..Default::default() })],
        );
        index.merge(
            "agent-2",
            [("t2".to_string(), TaskCounters { cpu_seconds: 2.0, ..Default::default() })],
        );

        assert_eq!(index.len(), 2);
        assert_eq!(index.get("t2").map(|c| c.cpu_seconds), Some(2.0));
        assert!(index.get("t3").is_none());
    }
}
