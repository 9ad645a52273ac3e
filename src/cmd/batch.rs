//! `labelpipe batch` — run every item in a JSONL file through the
//! pipeline, with terminal progress and Ctrl-C cancellation between items.

use anyhow::{Context, Result, bail};
use labelpipe::batch::BatchRunner;
use labelpipe::config::Config;
use labelpipe::gateway::OpenAiGateway;
use labelpipe::models::{LabelingTask, Modality};
use labelpipe::ui::BatchUi;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// One input line. Anything unspecified falls back to the CLI-level
/// defaults; `data_id` defaults to the 1-based line number.
#[derive(Deserialize)]
struct TaskLine {
    #[serde(default)]
    data_id: Option<String>,
    #[serde(default)]
    text_content: String,
    #[serde(default)]
    image_ref: Option<String>,
    #[serde(default)]
    task_type: Option<String>,
    #[serde(default)]
    modality: Option<Modality>,
}

pub async fn cmd_batch(
    config: Config,
    input: PathBuf,
    task_type: String,
    modality: String,
    output: Option<PathBuf>,
) -> Result<()> {
    if config.api_key.is_empty() {
        bail!("OPENAI_API_KEY not set. Export it or add it to a .env file.");
    }
    let default_modality: Modality = modality.parse()?;

    let content = std::fs::read_to_string(&input)
        .with_context(|| format!("Failed to read input file {}", input.display()))?;

    let mut tasks = Vec::new();
    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let parsed: TaskLine = serde_json::from_str(line)
            .with_context(|| format!("Invalid task on line {}", index + 1))?;
        tasks.push(LabelingTask {
            data_id: parsed.data_id.unwrap_or_else(|| (index + 1).to_string()),
            modality: parsed.modality.unwrap_or(default_modality),
            task_type: parsed.task_type.unwrap_or_else(|| task_type.clone()),
            text_content: parsed.text_content,
            image_ref: parsed.image_ref,
        });
    }
    if tasks.is_empty() {
        bail!("No tasks found in {}", input.display());
    }

    // Ctrl-C flips the flag; the driver stops at the next item boundary.
    let cancel = Arc::new(AtomicBool::new(false));
    let cancel_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel_signal.store(true, Ordering::SeqCst);
        }
    });

    let gateway = OpenAiGateway::new(&config).context("Failed to build completion gateway")?;
    let runner = BatchRunner::new(&gateway, &config);
    let ui = BatchUi::new(tasks.len() as u64);

    let report = runner
        .run(&tasks, &cancel, |fraction, status| {
            ui.on_progress(fraction, status)
        })
        .await;
    ui.finish(&report);

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&report.rows)?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write results to {}", path.display()))?;
        println!("  results written to {}", path.display());
    }

    Ok(())
}
