//! `labelpipe queue` — inspect and maintain the human-review queue.
//!
//! All queue subcommands are fully offline; they never touch the gateway.

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use console::style;
use labelpipe::config::Config;
use labelpipe::queue::ReviewQueue;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum QueueCommands {
    /// List every escalated item
    List,
    /// Show totals by fallback reason
    Summary,
    /// Delete all entries for one data_id
    Delete { data_id: String },
    /// Remove every entry (requires --force)
    Clear {
        #[arg(long)]
        force: bool,
    },
    /// Export the queue as CSV
    Export {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

pub fn cmd_queue(config: Config, command: QueueCommands) -> Result<()> {
    let queue = ReviewQueue::new(&config.review_queue_dir);

    match command {
        QueueCommands::List => {
            let items = queue.list_all()?;
            if items.is_empty() {
                println!("Review queue is empty.");
                return Ok(());
            }
            for item in &items {
                println!(
                    "{}  {}  {}  attempts={} reviews={}",
                    style(&item.data_id).cyan(),
                    style(&item.fallback_reason).yellow(),
                    item.timestamp.to_rfc3339(),
                    item.labeler_attempts.len(),
                    item.critic_reviews.len(),
                );
                if let Some(last) = item.error_log.last() {
                    println!("    {}", style(last).dim());
                }
            }
            println!("\n{} item(s)", items.len());
        }
        QueueCommands::Summary => {
            let summary = queue.summary()?;
            println!("Total: {}", summary.total);
            for (reason, count) in &summary.by_reason {
                println!("  {:<17} {}", reason.to_string(), count);
            }
        }
        QueueCommands::Delete { data_id } => {
            let removed = queue.delete(&data_id)?;
            println!("Removed {} entry(ies) for {}", removed, data_id);
        }
        QueueCommands::Clear { force } => {
            if !force {
                bail!("Refusing to clear the review queue without --force");
            }
            let removed = queue.clear(true)?;
            println!("Cleared {} entry(ies)", removed);
        }
        QueueCommands::Export { output } => {
            let bytes = queue.export_csv()?;
            match output {
                Some(path) => {
                    std::fs::write(&path, &bytes)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Exported {} byte(s) to {}", bytes.len(), path.display());
                }
                None => print!("{}", String::from_utf8_lossy(&bytes)),
            }
        }
    }
    Ok(())
}
