// Workload - Burst of inserts plus one count and one update, run concurrently

use rand::Rng;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use crate::config::WorkloadConfig;
use crate::error::AppResult;
use crate::infrastructure::database::{ClimateStore, RowId};
use crate::infrastructure::worker_pool::WorkerPool;
use crate::models::{ClimateRecord, RecordGenerator};
use crate::summary::RunSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TaskKind {
    Insert,
    CountHotDays,
    RaiseHumidity,
}

impl TaskKind {
    pub fn label(&self) -> &'static str {
        match self {
            TaskKind::Insert => "INSERT",
            TaskKind::CountHotDays => "SELECT",
            TaskKind::RaiseHumidity => "UPDATE",
        }
    }
}

/// One unit of work; each runs on its own connection
#[derive(Debug, Clone)]
pub enum Task {
    Insert { index: usize, record: ClimateRecord },
    CountHotDays { threshold: f64 },
    RaiseHumidity { locations: Vec<String>, step: f64, cap: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TaskOutcome {
    Inserted { id: RowId },
    HotDays { count: u64 },
    HumidityRaised { rows: u64 },
}

impl fmt::Display for TaskOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskOutcome::Inserted { id } => write!(f, "INSERT OK id={}", id),
            TaskOutcome::HotDays { count } => write!(f, "SELECT OK hot_days={}", count),
            TaskOutcome::HumidityRaised { rows } => write!(f, "UPDATE OK rows={}", rows),
        }
    }
}

/// Result of one finished task
#[derive(Debug)]
pub struct TaskReport {
    pub kind: TaskKind,
    pub elapsed: Duration,
    pub result: AppResult<TaskOutcome>,
}

impl fmt::Display for TaskReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.result {
            Ok(outcome) => write!(f, "{}", outcome),
            Err(e) => write!(f, "{} FAILED: {}", self.kind.label(), e),
        }
    }
}

impl Task {
    pub fn kind(&self) -> TaskKind {
        match self {
            Task::Insert { .. } => TaskKind::Insert,
            Task::CountHotDays { .. } => TaskKind::CountHotDays,
            Task::RaiseHumidity { .. } => TaskKind::RaiseHumidity,
        }
    }

    pub async fn execute(self, store: Arc<dyn ClimateStore>) -> TaskReport {
        let kind = self.kind();
        let started = Instant::now();

        let result = match self {
            Task::Insert { index, record } => {
                let result = store.insert_record(&record).await;
                if let Ok(id) = &result {
                    info!(index, id, location = %record.location, "record inserted");
                }
                result.map(|id| TaskOutcome::Inserted { id })
            }
            Task::CountHotDays { threshold } => store
                .count_hot_days(threshold)
                .await
                .map(|count| TaskOutcome::HotDays { count }),
            Task::RaiseHumidity { locations, step, cap } => store
                .raise_humidity(&locations, step, cap)
                .await
                .map(|rows| TaskOutcome::HumidityRaised { rows }),
        };

        let elapsed = started.elapsed();
        if let Err(e) = &result {
            warn!(task = kind.label(), elapsed_ms = elapsed.as_millis() as u64, "task failed: {}", e);
        }
        TaskReport {
            kind,
            elapsed,
            result,
        }
    }
}

/// The default plan: `inserts` random inserts, then one count and one update
pub fn build_plan<R: Rng + ?Sized>(config: &WorkloadConfig, rng: &mut R) -> Vec<Task> {
    let generator = RecordGenerator::default();
    let mut tasks: Vec<Task> = (0..config.inserts)
        .map(|index| Task::Insert {
            index,
            record: generator.generate(rng),
        })
        .collect();
    tasks.push(Task::CountHotDays {
        threshold: config.hot_temperature_threshold,
    });
    tasks.push(Task::RaiseHumidity {
        locations: config.humid_locations.clone(),
        step: config.humidity_step,
        cap: config.humidity_cap,
    });
    tasks
}

pub struct Workload {
    store: Arc<dyn ClimateStore>,
    pool: WorkerPool,
    startup_delay: Duration,
}

impl Workload {
    pub fn new(store: Arc<dyn ClimateStore>, config: &WorkloadConfig) -> Self {
        Self {
            store,
            pool: WorkerPool::new(config.workers),
            startup_delay: Duration::from_millis(config.startup_delay_ms),
        }
    }

    /// Run `tasks` on the pool, calling `on_report` as each one finishes.
    /// The final row count is only taken when every task succeeded.
    pub async fn run<F>(&self, tasks: Vec<Task>, mut on_report: F) -> AppResult<RunSummary>
    where
        F: FnMut(&TaskReport),
    {
        if !self.startup_delay.is_zero() {
            tokio::time::sleep(self.startup_delay).await;
        }

        let started = Instant::now();
        info!(tasks = tasks.len(), workers = self.pool.width(), "submitting workload");

        let mut summary = RunSummary::new(self.store.backend(), self.pool.width());
        let jobs = tasks.into_iter().map(|task| {
            let store = self.store.clone();
            task.execute(store)
        });
        let mut completions = self.pool.submit_all(jobs);
        summary.submitted = completions.submitted();

        while let Some(joined) = completions.next().await {
            match joined {
                Ok(report) => {
                    on_report(&report);
                    summary.record(&report);
                }
                Err(e) => {
                    error!("{}", e);
                    summary.record_lost();
                }
            }
        }

        if summary.failed == 0 {
            summary.final_count = Some(self.store.count_rows().await?);
        }
        summary.connections = self.store.connection_stats();
        summary.elapsed_ms = started.elapsed().as_millis() as u64;

        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            elapsed_ms = summary.elapsed_ms,
            "workload finished"
        );
        Ok(summary)
    }
}
