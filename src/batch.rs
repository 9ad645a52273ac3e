//! Batch driver: one state-machine run per item in an ordered collection.
//!
//! Items are fully independent — no shared mutable state beyond the review
//! queue, whose writes are uniquely keyed. The loop is sequential and
//! supports cooperative cancellation between items; a cancelled batch
//! returns the rows completed so far. A run can never abort the batch: the
//! worst case for one item is a degraded or `ERROR` row.

use crate::config::Config;
use crate::gateway::CompletionGateway;
use crate::models::{LabelRecord, LabelingTask};
use crate::pipeline::PipelineRunner;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

/// Outcome of a batch run.
#[derive(Debug)]
pub struct BatchReport {
    /// One record per completed item, in input order.
    pub rows: Vec<LabelRecord>,
    /// Items submitted (not necessarily completed, if cancelled).
    pub total: usize,
    /// Rows with a real label (neither `ERROR` nor escalated).
    pub labeled: usize,
    /// Rows escalated to the review queue.
    pub escalated: usize,
    /// Synthetic `ERROR` rows.
    pub error_rows: usize,
    pub avg_final_confidence: f64,
    pub elapsed: Duration,
    /// Whether the batch stopped early at a cancellation checkpoint.
    pub cancelled: bool,
}

impl BatchReport {
    /// Assemble the report from the rows completed so far.
    fn from_rows(rows: Vec<LabelRecord>, total: usize, elapsed: Duration, cancelled: bool) -> Self {
        let labeled = rows
            .iter()
            .filter(|row| !row.is_error() && !row.is_escalated())
            .count();
        let escalated = rows.iter().filter(|row| row.is_escalated()).count();
        let error_rows = rows.iter().filter(|row| row.is_error()).count();
        let avg_final_confidence = rows
            .iter()
            .map(|row| row.final_confidence as f64)
            .sum::<f64>()
            / rows.len().max(1) as f64;

        Self {
            total,
            labeled,
            escalated,
            error_rows,
            avg_final_confidence,
            elapsed,
            cancelled,
            rows,
        }
    }
}

pub struct BatchRunner<'a> {
    gateway: &'a dyn CompletionGateway,
    config: &'a Config,
}

impl<'a> BatchRunner<'a> {
    pub fn new(gateway: &'a dyn CompletionGateway, config: &'a Config) -> Self {
        Self { gateway, config }
    }

    /// Run every task in order, reporting fractional progress and a status
    /// string after each item. `cancel` is checked at the top of each
    /// iteration — the cooperative cancellation checkpoint.
    pub async fn run(
        &self,
        tasks: &[LabelingTask],
        cancel: &AtomicBool,
        mut on_progress: impl FnMut(f64, &str),
    ) -> BatchReport {
        let started = Instant::now();
        let runner = PipelineRunner::new(self.gateway, self.config);
        let total = tasks.len();
        let mut rows = Vec::with_capacity(total);
        let mut cancelled = false;

        for (index, task) in tasks.iter().enumerate() {
            if cancel.load(Ordering::SeqCst) {
                debug!(completed = index, total, "batch cancelled at checkpoint");
                cancelled = true;
                break;
            }

            let record = runner.run(task).await;
            rows.push(record);

            let completed = index + 1;
            on_progress(
                completed as f64 / total.max(1) as f64,
                &format!("labeled {}/{} items...", completed, total),
            );
        }

        BatchReport::from_rows(rows, total, started.elapsed(), cancelled)
    }
}
