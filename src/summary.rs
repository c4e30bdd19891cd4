use serde::Serialize;

use crate::config::Backend;
use crate::infrastructure::database::{ConnectionSnapshot, RowId};
use crate::workload::{TaskOutcome, TaskReport};

/// Totals for one workload run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub backend: Backend,
    pub workers: usize,
    pub submitted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub inserted_ids: Vec<RowId>,
    pub hot_days: Option<u64>,
    pub humidity_rows_updated: Option<u64>,
    /// Rows in the table after the pool drained; absent when a task failed
    pub final_count: Option<u64>,
    pub connections: ConnectionSnapshot,
    /// Sum of per-task latencies
    pub task_time_ms: u64,
    /// Slowest single task
    pub max_task_ms: u64,
    pub elapsed_ms: u64,
}

impl RunSummary {
    pub fn new(backend: Backend, workers: usize) -> Self {
        Self {
            backend,
            workers,
            submitted: 0,
            succeeded: 0,
            failed: 0,
            inserted_ids: Vec::new(),
            hot_days: None,
            humidity_rows_updated: None,
            final_count: None,
            connections: ConnectionSnapshot::default(),
            task_time_ms: 0,
            max_task_ms: 0,
            elapsed_ms: 0,
        }
    }

    pub fn record(&mut self, report: &TaskReport) {
        let task_ms = report.elapsed.as_millis() as u64;
        self.task_time_ms += task_ms;
        self.max_task_ms = self.max_task_ms.max(task_ms);

        match &report.result {
            Ok(outcome) => {
                self.succeeded += 1;
                match *outcome {
                    TaskOutcome::Inserted { id } => self.inserted_ids.push(id),
                    TaskOutcome::HotDays { count } => self.hot_days = Some(count),
                    TaskOutcome::HumidityRaised { rows } => self.humidity_rows_updated = Some(rows),
                }
            }
            Err(_) => self.failed += 1,
        }
    }

    /// A task that never produced a report (it panicked)
    pub fn record_lost(&mut self) {
        self.failed += 1;
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.succeeded == self.submitted
    }

    pub fn render_text(&self) -> String {
        let mut lines = vec![
            "SUMMARY".to_string(),
            format!("  backend: {:?}", self.backend),
            format!("  workers: {}", self.workers),
            format!(
                "  tasks: {} submitted, {} ok, {} failed",
                self.submitted, self.succeeded, self.failed
            ),
            format!("  inserted: {}", self.inserted_ids.len()),
        ];
        if let Some(count) = self.hot_days {
            lines.push(format!("  hot days: {}", count));
        }
        if let Some(rows) = self.humidity_rows_updated {
            lines.push(format!("  humidity rows updated: {}", rows));
        }
        lines.push(match self.final_count {
            Some(count) => format!("  final row count: {}", count),
            None => "  final row count: skipped".to_string(),
        });
        lines.push(format!(
            "  connections: {} opened, {} closed",
            self.connections.opened, self.connections.closed
        ));
        lines.push(format!(
            "  task latency: {} ms total, {} ms max",
            self.task_time_ms, self.max_task_ms
        ));
        lines.push(format!("  elapsed: {} ms", self.elapsed_ms));
        lines.join("\n")
    }

    pub fn render_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
