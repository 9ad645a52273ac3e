//! `labelpipe label` — run one item through the pipeline and print the
//! resulting record.

use anyhow::{Context, Result, bail};
use console::style;
use labelpipe::config::Config;
use labelpipe::gateway::OpenAiGateway;
use labelpipe::models::{LabelingTask, Modality};
use labelpipe::pipeline::PipelineRunner;

pub async fn cmd_label(
    config: Config,
    task_type: String,
    text: String,
    data_id: String,
    image_ref: Option<String>,
    modality: String,
) -> Result<()> {
    if config.api_key.is_empty() {
        bail!("OPENAI_API_KEY not set. Export it or add it to a .env file.");
    }
    let modality: Modality = modality.parse()?;

    let task = LabelingTask {
        data_id,
        modality,
        task_type,
        text_content: text,
        image_ref,
    };

    let gateway = OpenAiGateway::new(&config).context("Failed to build completion gateway")?;
    let runner = PipelineRunner::new(&gateway, &config);
    let record = runner.run(&task).await;

    println!();
    println!("  {}  {}", style("Label").bold().dim(), style(&record.label).cyan().bold());
    println!(
        "  {}  labeler {}%, critic {}%, final {}%",
        style("Confidence").bold().dim(),
        record.confidence,
        record.critic_confidence,
        record.final_confidence,
    );
    println!("  {}  {}", style("Retries").bold().dim(), record.retry_count);
    println!("  {}  {}", style("Reasoning").bold().dim(), record.reasoning);

    match record.fallback_reason {
        Some(reason) => println!(
            "  {} sent to human review ({})",
            style("⚠").yellow().bold(),
            reason
        ),
        None => println!("  {} validated", style("✓").green().bold()),
    }

    println!();
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}
