//! Label-based configuration.
//!
//! Each workload carries its autoscaling options as orchestrator labels
//! named `<prefix>.<option>`. Missing or unparsable values fall back to the
//! documented default.

use std::collections::HashMap;

use tracing::debug;

use crate::types::Thresholds;

/// Label namespace used when none is configured.
pub const DEFAULT_LABEL_PREFIX: &str = "autoscale";

pub const ENABLED: &str = "enabled";
pub const MIN_CPU_PERCENT: &str = "minCpuPercent";
pub const MAX_CPU_PERCENT: &str = "maxCpuPercent";
pub const MIN_MEM_PERCENT: &str = "minMemPercent";
pub const MAX_MEM_PERCENT: &str = "maxMemPercent";
pub const SCALE_PERCENT: &str = "scalePercent";
pub const SPIKE_FILTER_COUNT: &str = "spikeFilterCount";
pub const MIN_INSTANCES: &str = "minInstances";
pub const MAX_INSTANCES: &str = "maxInstances";

/// A value that can be read from a label string.
pub trait LabelValue: Sized {
    fn parse_label(raw: &str) -> Option<Self>;
}

impl LabelValue for bool {
    fn parse_label(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("true") || raw == "1" {
            Some(true)
        } else if raw.eq_ignore_ascii_case("false") || raw == "0" {
            Some(false)
        } else {
            None
        }
    }
}

impl LabelValue for u32 {
    fn parse_label(raw: &str) -> Option<Self> {
        raw.trim().parse().ok()
    }
}

/// Resolves typed options from a workload's label set.
#[derive(Debug, Clone)]
pub struct LabelResolver {
    prefix: String,
}

impl Default for LabelResolver {
    fn default() -> Self {
        Self::new(DEFAULT_LABEL_PREFIX)
    }
}

impl LabelResolver {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Full label key for an option.
    pub fn key(&self, option: &str) -> String {
        format!("{}.{option}", self.prefix)
    }

    /// Resolve one option, falling back to `default`.
    pub fn resolve<T: LabelValue>(
        &self,
        labels: &HashMap<String, String>,
        option: &str,
        default: T,
    ) -> T {
        let key = self.key(option);
        match labels.get(&key) {
            Some(raw) => T::parse_label(raw).unwrap_or_else(|| {
                debug!(label = %key, value = %raw, "unparsable label, using default");
                default
            }),
            None => default,
        }
    }

    /// Whether autoscaling is switched on for this label set.
    pub fn enabled(&self, labels: &HashMap<String, String>) -> bool {
        self.resolve(labels, ENABLED, false)
    }

    /// Resolve the full threshold set.
    ///
    /// `max_instances` is raised to `min_instances` when configured lower.
    pub fn thresholds(&self, labels: &HashMap<String, String>) -> Thresholds {
        let d = Thresholds::default();
        let min_instances = self.resolve(labels, MIN_INSTANCES, d.min_instances);
        let max_instances = self.resolve(labels, MAX_INSTANCES, d.max_instances);

        Thresholds {
            min_cpu_percent: self.resolve(labels, MIN_CPU_PERCENT, d.min_cpu_percent),
            max_cpu_percent: self.resolve(labels, MAX_CPU_PERCENT, d.max_cpu_percent),
            min_mem_percent: self.resolve(labels, MIN_MEM_PERCENT, d.min_mem_percent),
            max_mem_percent: self.resolve(labels, MAX_MEM_PERCENT, d.max_mem_percent),
            scale_percent: self.resolve(labels, SCALE_PERCENT, d.scale_percent),
            spike_filter_count: self.resolve(labels, SPIKE_FILTER_COUNT, d.spike_filter_count),
            min_instances,
            max_instances: max_instances.max(min_instances),
        }
    }
}
