use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cmd;

use cmd::queue::QueueCommands;
use labelpipe::config::Config;

#[derive(Parser)]
#[command(name = "labelpipe")]
#[command(version, about = "Labeler-critic-validator annotation pipeline")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a labelpipe.toml config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Label a single item
    Label {
        #[arg(long, default_value = "sentiment")]
        task_type: String,
        /// The text content to label
        #[arg(long)]
        text: String,
        #[arg(long, default_value = "single_001")]
        data_id: String,
        /// Reference to image content for IMAGE/HYBRID tasks
        #[arg(long)]
        image_ref: Option<String>,
        /// TEXT, IMAGE, or HYBRID
        #[arg(long, default_value = "TEXT")]
        modality: String,
    },
    /// Label every item in a JSONL file (one task object per line)
    Batch {
        input: PathBuf,
        /// Default task type for lines that don't set one
        #[arg(long, default_value = "sentiment")]
        task_type: String,
        /// Default modality for lines that don't set one
        #[arg(long, default_value = "TEXT")]
        modality: String,
        /// Write the result records as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Inspect and maintain the human-review queue
    Queue {
        #[command(subcommand)]
        command: QueueCommands,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(if cli.verbose {
            "labelpipe=debug"
        } else {
            "labelpipe=warn"
        })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Label {
            task_type,
            text,
            data_id,
            image_ref,
            modality,
        } => cmd::cmd_label(config, task_type, text, data_id, image_ref, modality).await,
        Commands::Batch {
            input,
            task_type,
            modality,
            output,
        } => cmd::cmd_batch(config, input, task_type, modality, output).await,
        Commands::Queue { command } => cmd::cmd_queue(config, command),
    }
}
