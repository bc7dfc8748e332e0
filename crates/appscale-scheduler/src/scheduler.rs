//! Scheduler — drives fetch → aggregate → decide → apply cycles.
//!
//! All per-workload state lives in the scheduler's `ScalingStateStore` and
//! is only written after a cycle has fully succeeded. Cycles never overlap:
//! `run` awaits each one before starting the fixed delay.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::time::Duration;

use futures::future::{join_all, try_join_all};
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use appscale_autoscale::{decide, Decision, ScaleDecision};
use appscale_client::{App, AppDetail, ClientError, ExecutorStatistics, HostMetrics, Orchestrator};
use appscale_core::{AppId, LabelResolver, ScalingState, ScalingStateStore, TaskMetric, Workload};
use appscale_metrics::{aggregate, CounterIndex};

use crate::error::CycleError;

/// Loop settings.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Fixed delay between the end of one cycle and the start of the next.
    pub interval: Duration,
    pub labels: LabelResolver,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            labels: LabelResolver::default(),
        }
    }
}

/// A scale command issued by a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaleCommand {
    pub app_id: AppId,
    pub from: u32,
    pub to: u32,
}

/// Decision taken for one workload in a cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkloadDecision {
    pub app_id: AppId,
    pub decision: Decision,
    /// No baseline existed, so the decision was not acted on.
    pub observation_only: bool,
}

/// Summary of a successful cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleReport {
    /// Enabled workloads listed this cycle.
    pub workloads: usize,
    /// Workloads without tasks, left out of this cycle.
    pub skipped: usize,
    pub decisions: Vec<WorkloadDecision>,
    pub commands: Vec<ScaleCommand>,
}

/// Outcome counters since the scheduler was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleCounts {
    pub succeeded: u64,
    pub failed: u64,
}

/// What a cycle intends to do before anything is applied.
struct Plan {
    staged: HashMap<AppId, ScalingState>,
    report: CycleReport,
}

/// The autoscaling control loop.
pub struct Scheduler<O, M> {
    orchestrator: O,
    metrics: M,
    config: SchedulerConfig,
    store: ScalingStateStore,
    /// When the current baseline counters were read. `None` until the first
    /// cycle succeeds.
    baseline_at: Option<Instant>,
    counts: CycleCounts,
}

impl<O: Orchestrator, M: HostMetrics> Scheduler<O, M> {
    pub fn new(orchestrator: O, metrics: M, config: SchedulerConfig) -> Self {
        Self {
            orchestrator,
            metrics,
            config,
            store: ScalingStateStore::new(),
            baseline_at: None,
            counts: CycleCounts::default(),
        }
    }

    pub fn store(&self) -> &ScalingStateStore {
        &self.store
    }

    pub fn counts(&self) -> CycleCounts {
        self.counts
    }

    /// Run cycles until `shutdown` changes.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_secs = self.config.interval.as_secs_f64(),
            label_prefix = %self.config.labels.prefix(),
            "autoscaler started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            self.tick().await;

            tokio::select! {
                _ = tokio::time::sleep(self.config.interval) => {}
                _ = shutdown.changed() => break,
            }
        }

        info!(
            succeeded = self.counts.succeeded,
            failed = self.counts.failed,
            "autoscaler shutting down"
        );
    }

    /// Run one cycle and record its outcome. Errors end here.
    async fn tick(&mut self) {
        match self.run_cycle().await {
            Ok(report) => {
                self.counts.succeeded += 1;
                info!(
                    workloads = report.workloads,
                    skipped = report.skipped,
                    commands = report.commands.len(),
                    "cycle complete"
                );
            }
            Err(e) => {
                self.counts.failed += 1;
                error!(error = %e.chain(), "cycle failed, baseline kept");
            }
        }
    }

    /// Perform a single fetch → aggregate → decide → apply pass.
    ///
    /// On error nothing in the store changes, although scale commands that
    /// were already issued in this cycle still complete.
    pub async fn run_cycle(&mut self) -> Result<CycleReport, CycleError> {
        debug!("cycle starting");

        let apps: Vec<App> = self
            .orchestrator
            .list_apps()
            .await
            .map_err(CycleError::ListApps)?
            .into_iter()
            .filter(|app| self.config.labels.enabled(&app.labels))
            .collect();

        let details = self.fetch_details(&apps).await?;

        let observed_at = Instant::now();
        let counters = self.fetch_counters(&details).await?;

        let workloads = self.build_workloads(&apps, &details, &counters);
        let elapsed = self
            .baseline_at
            .map(|at| observed_at.duration_since(at).as_secs_f64());

        let plan = self.plan(&workloads, elapsed);
        self.apply(&plan.report.commands).await?;

        let listed: HashSet<AppId> = workloads.iter().map(|w| w.id.clone()).collect();
        self.store.commit(plan.staged, &listed);
        self.baseline_at = Some(observed_at);

        Ok(plan.report)
    }

    async fn fetch_details(&self, apps: &[App]) -> Result<Vec<AppDetail>, CycleError> {
        let mut pending = Vec::with_capacity(apps.len());
        for app in apps {
            pending.push(self.fetch_detail(&app.id));
        }
        try_join_all(pending).await
    }

    async fn fetch_detail(&self, app_id: &str) -> Result<AppDetail, CycleError> {
        self.orchestrator
            .app_detail(app_id)
            .await
            .map_err(|source| CycleError::AppDetail {
                app_id: app_id.to_string(),
                source,
            })
    }

    /// Fetch statistics once per distinct host and index them by task id.
    async fn fetch_counters(&self, details: &[AppDetail]) -> Result<CounterIndex, CycleError> {
        let hosts: BTreeSet<&str> = details
            .iter()
            .flat_map(|d| d.tasks.iter().map(|t| t.host.as_str()))
            .collect();
        debug!(hosts = hosts.len(), "fetching host statistics");

        let mut pending = Vec::with_capacity(hosts.len());
        for host in &hosts {
            pending.push(self.fetch_host(host));
        }
        let reports = try_join_all(pending).await?;

        let mut index = CounterIndex::new();
        for (host, executors) in hosts.iter().zip(reports) {
            index.merge(
                host,
                executors
                    .iter()
                    .map(|e| (e.executor_id.clone(), e.counters())),
            );
        }
        Ok(index)
    }

    async fn fetch_host(&self, host: &str) -> Result<Vec<ExecutorStatistics>, CycleError> {
        self.metrics
            .statistics(host)
            .await
            .map_err(|source| CycleError::HostStatistics {
                host: host.to_string(),
                source,
            })
    }

    fn build_workloads(
        &self,
        apps: &[App],
        details: &[AppDetail],
        counters: &CounterIndex,
    ) -> Vec<Workload> {
        apps.iter()
            .zip(details)
            .map(|(app, detail)| Workload {
                id: app.id.clone(),
                thresholds: self.config.labels.thresholds(&app.labels),
                instances: detail.tasks.len() as u32,
                tasks: detail
                    .tasks
                    .iter()
                    .map(|task| TaskMetric {
                        app_id: app.id.clone(),
                        task_id: task.id.clone(),
                        host: task.host.clone(),
                        counters: counters.get(&task.id),
                    })
                    .collect(),
            })
            .collect()
    }

    /// Aggregate and decide for every workload against staged state.
    fn plan(&self, workloads: &[Workload], elapsed: Option<f64>) -> Plan {
        let window = elapsed.unwrap_or(self.config.interval.as_secs_f64());
        let mut staged = HashMap::with_capacity(workloads.len());
        let mut report = CycleReport {
            workloads: workloads.len(),
            ..CycleReport::default()
        };

        for workload in workloads {
            let mut state = self.store.staged(&workload.id);

            let Some(sample) = aggregate(&workload.tasks, state.previous.as_ref(), window) else {
                debug!(app_id = %workload.id, "no tasks, skipping workload");
                report.skipped += 1;
                state.previous = None;
                staged.insert(workload.id.clone(), state);
                continue;
            };

            let observation_only = elapsed.is_none() || state.previous.is_none();
            let decision = if observation_only {
                // Decide on a scratch filter so the real one is untouched.
                let mut scratch = state.spike;
                decide(workload.instances, &sample, &workload.thresholds, &mut scratch)
            } else {
                decide(workload.instances, &sample, &workload.thresholds, &mut state.spike)
            };

            debug!(
                app_id = %workload.id,
                cpu = sample.cpu_percent,
                mem = sample.mem_percent,
                current = workload.instances,
                target = decision.target(),
                observation_only,
                "workload evaluated"
            );

            if let (ScaleDecision::ScaleTo(to), false) = (decision.action, observation_only) {
                report.commands.push(ScaleCommand {
                    app_id: workload.id.clone(),
                    from: workload.instances,
                    to,
                });
            }
            report.decisions.push(WorkloadDecision {
                app_id: workload.id.clone(),
                decision,
                observation_only,
            });

            state.previous = Some(sample);
            staged.insert(workload.id.clone(), state);
        }

        Plan { staged, report }
    }

    /// Issue all scale commands concurrently and wait for every one of them.
    async fn apply(&self, commands: &[ScaleCommand]) -> Result<(), CycleError> {
        if commands.is_empty() {
            return Ok(());
        }

        let mut pending = Vec::with_capacity(commands.len());
        for command in commands {
            info!(
                app_id = %command.app_id,
                from = command.from,
                to = command.to,
                "scaling app"
            );
            pending.push(self.orchestrator.scale_app(&command.app_id, command.to));
        }
        let results = join_all(pending).await;

        let mut failures: Vec<ClientError> = Vec::new();
        for (command, result) in commands.iter().zip(results) {
            if let Err(e) = result {
                warn!(app_id = %command.app_id, to = command.to, error = %e, "scale command failed");
                failures.push(e);
            }
        }

        let failed = failures.len();
        match failures.into_iter().next() {
            None => Ok(()),
            Some(first) => Err(CycleError::Scale {
                failed,
                total: commands.len(),
                first,
            }),
        }
    }
}
