//! Terminal progress for batch runs, rendered via `indicatif`.

use crate::batch::BatchReport;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// A single progress bar fed by the batch driver's progress callback.
pub struct BatchUi {
    bar: ProgressBar,
}

impl BatchUi {
    pub fn new(total_items: u64) -> Self {
        let bar_style = ProgressStyle::default_bar()
            .template("{prefix:.bold.dim} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .expect("progress bar template is a valid static string")
            .progress_chars("█▓▒░");

        let bar = ProgressBar::new(total_items);
        bar.set_style(bar_style);
        bar.set_prefix("Items");
        Self { bar }
    }

    /// Wire into [`crate::batch::BatchRunner::run`]'s callback.
    pub fn on_progress(&self, fraction: f64, status: &str) {
        let position = (fraction * self.bar.length().unwrap_or(0) as f64).round() as u64;
        self.bar.set_position(position);
        self.bar.set_message(status.to_string());
    }

    /// Finish the bar and print the report summary.
    pub fn finish(&self, report: &BatchReport) {
        if report.cancelled {
            self.bar.abandon_with_message("cancelled");
        } else {
            self.bar.finish_with_message("done");
        }

        println!();
        println!(
            "  {} {} labeled, {} escalated, {} errors (of {})",
            style("✓").green().bold(),
            report.labeled,
            report.escalated,
            report.error_rows,
            report.total,
        );
        println!(
            "  avg final confidence {:.1}%, {:.1}s elapsed",
            report.avg_final_confidence,
            report.elapsed.as_secs_f64(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_maps_fraction_to_position() {
        let ui = BatchUi::new(4);
        ui.on_progress(0.5, "labeled 2/4 items...");
        assert_eq!(ui.bar.position(), 2);
        ui.on_progress(1.0, "labeled 4/4 items...");
        assert_eq!(ui.bar.position(), 4);
    }
}
