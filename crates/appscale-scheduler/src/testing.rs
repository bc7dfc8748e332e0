//! In-process orchestrator and host metrics for scheduler tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use appscale_client::{
    App, AppDetail, ClientError, ClientResult, ExecutorStatistics, HostMetrics, Orchestrator,
    Statistics, Task,
};

fn unavailable(what: &str) -> ClientError {
    ClientError::Transport {
        uri: format!("mock://{what}"),
        reason: "unavailable".to_string(),
    }
}

#[derive(Default)]
struct OrchestratorState {
    apps: Vec<App>,
    tasks: HashMap<String, Vec<Task>>,
    fail_listing: bool,
    reject_scale: HashSet<String>,
    detail_calls: Vec<String>,
    scaled: Vec<(String, u32)>,
}

/// Marathon stand-in. Clones share state.
#[derive(Clone, Default)]
pub(crate) struct MockOrchestrator {
    inner: Arc<Mutex<OrchestratorState>>,
}

impl MockOrchestrator {
    /// Add an app with `autoscale.*` labels and tasks `(task id, host)`.
    pub(crate) fn add_app(&self, id: &str, labels: &[(&str, &str)], tasks: &[(&str, &str)]) {
        let mut state = self.inner.lock().unwrap();
        state.apps.push(App {
            id: id.to_string(),
            labels: labels
                .iter()
                .map(|(k, v)| (format!("autoscale.{k}"), v.to_string()))
                .collect(),
            instances: tasks.len() as u32,
        });
        state.tasks.insert(
            id.to_string(),
            tasks
                .iter()
                .map(|(task, host)| Task {
                    id: task.to_string(),
                    host: host.to_string(),
                })
                .collect(),
        );
    }

    pub(crate) fn remove_app(&self, id: &str) {
        let mut state = self.inner.lock().unwrap();
        state.apps.retain(|a| a.id != id);
        state.tasks.remove(id);
    }

    pub(crate) fn fail_listing(&self, fail: bool) {
        self.inner.lock().unwrap().fail_listing = fail;
    }

    pub(crate) fn reject_scale(&self, id: &str) {
        self.inner.lock().unwrap().reject_scale.insert(id.to_string());
    }

    pub(crate) fn detail_calls(&self) -> Vec<String> {
        self.inner.lock().unwrap().detail_calls.clone()
    }

    pub(crate) fn scaled(&self) -> Vec<(String, u32)> {
        self.inner.lock().unwrap().scaled.clone()
    }
}

impl Orchestrator for MockOrchestrator {
    async fn list_apps(&self) -> ClientResult<Vec<App>> {
        let state = self.inner.lock().unwrap();
        if state.fail_listing {
            return Err(unavailable("apps"));
        }
        Ok(state.apps.clone())
    }

    async fn app_detail(&self, app_id: &str) -> ClientResult<AppDetail> {
        let mut state = self.inner.lock().unwrap();
        state.detail_calls.push(app_id.to_string());
        let tasks = state
            .tasks
            .get(app_id)
            .cloned()
            .ok_or_else(|| unavailable(app_id))?;
        Ok(AppDetail {
            id: app_id.to_string(),
            tasks,
        })
    }

    async fn scale_app(&self, app_id: &str, instances: u32) -> ClientResult<()> {
        let mut state = self.inner.lock().unwrap();
        if state.reject_scale.contains(app_id) {
            return Err(ClientError::Status {
                uri: format!("mock://{app_id}"),
                status: 409,
                body: "locked by deployment".into(),
            });
        }
        state.scaled.push((app_id.to_string(), instances));
        Ok(())
    }
}

#[derive(Default)]
struct HostState {
    executors: HashMap<String, HashMap<String, Statistics>>,
    failing: HashSet<String>,
    calls: HashMap<String, usize>,
}

/// Agent stand-in. Clones share state.
#[derive(Clone, Default)]
pub(crate) struct MockHosts {
    inner: Arc<Mutex<HostState>>,
}

impl MockHosts {
    /// Report counters for `task` on `host`: CPU seconds and memory percent
    /// of a 100-byte limit.
    pub(crate) fn set(&self, host: &str, task: &str, cpu_seconds: f64, mem_percent: u64) {
        self.inner
            .lock()
            .unwrap()
            .executors
            .entry(host.to_string())
            .or_default()
            .insert(
                task.to_string(),
                Statistics {
                    cpus_system_time_secs: 0.0,
                    cpus_user_time_secs: cpu_seconds,
                    mem_rss_bytes: mem_percent,
                    mem_limit_bytes: 100,
                },
            );
    }

    pub(crate) fn fail(&self, host: &str, fail: bool) {
        let mut state = self.inner.lock().unwrap();
        if fail {
            state.failing.insert(host.to_string());
        } else {
            state.failing.remove(host);
        }
    }

    pub(crate) fn calls(&self, host: &str) -> usize {
        self.inner.lock().unwrap().calls.get(host).copied().unwrap_or(0)
    }
}

impl HostMetrics for MockHosts {
    async fn statistics(&self, host: &str) -> ClientResult<Vec<ExecutorStatistics>> {
        let mut state = self.inner.lock().unwrap();
        *state.calls.entry(host.to_string()).or_default() += 1;
        if state.failing.contains(host) {
            return Err(unavailable(host));
        }
        Ok(state
            .executors
            .get(host)
            .map(|tasks| {
                tasks
                    .iter()
                    .map(|(id, statistics)| ExecutorStatistics {
                        executor_id: id.clone(),
                        statistics: *statistics,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }
}
