use anyhow::{bail, Context};
use clap::{ArgGroup, Parser, Subcommand};
use enrollment_predictor::{
    config::Config,
    ml::{train, Frame},
    state::{ArtifactStore, FsArtifactStore},
};
use reqwest::Client;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "enroll-cli")]
#[command(about = "Enrollment Predictor CLI", long_about = None, version)]
struct Cli {
    #[arg(short, long, env = "ENROLL_ENDPOINT", default_value = "http://localhost:8000")]
    endpoint: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train the model locally and write the artifacts
    Train {
        /// CSV dataset (defaults to training.dataset_path)
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Artifact directory (defaults to artifacts.dir)
        #[arg(short, long)]
        artifacts: Option<PathBuf>,
    },

    /// Request a prediction for one employee, or a batch when given a JSON array
    #[command(group(ArgGroup::new("input").required(true).args(["file", "json"])))]
    Predict {
        /// Path to a JSON file holding the request body
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Inline JSON request body
        #[arg(short, long)]
        json: Option<String>,
    },

    /// Show model metrics and expected features
    Info,

    /// Check server health
    Health,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Train { data, artifacts } => run_train(data, artifacts)?,

        Commands::Predict { file, json } => {
            let raw = match (file, json) {
                (Some(path), _) => std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?,
                (None, Some(json)) => json,
                (None, None) => bail!("either --file or --json is required"),
            };
            let body: serde_json::Value =
                serde_json::from_str(&raw).context("request body is not valid JSON")?;
            let path = if body.is_array() { "predict/batch" } else { "predict" };

            let response = Client::new()
                .post(format!("{}/{}", cli.endpoint, path))
                .json(&body)
                .send()
                .await?;
            print_response(response).await?;
        }

        Commands::Info => {
            let response = Client::new()
                .get(format!("{}/model/info", cli.endpoint))
                .send()
                .await?;
            print_response(response).await?;
        }

        Commands::Health => {
            let response = Client::new()
                .get(format!("{}/health", cli.endpoint))
                .send()
                .await?;
            print_response(response).await?;
        }
    }

    Ok(())
}

/// Logs go to stderr so stdout carries only the metrics document
fn run_train(data: Option<PathBuf>, artifacts: Option<PathBuf>) -> anyhow::Result<()> {
    let mut config = Config::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        eprintln!("Using default configuration");
        Config::default()
    });

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("enrollment_predictor={}", config.observability.log_level).into()
            }),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Some(data) = data {
        config.training.dataset_path = data;
    }
    if let Some(dir) = artifacts {
        config.artifacts.dir = dir;
    }

    let dataset = Frame::load_csv(&config.training.dataset_path)?;
    let (model, metrics) = train(&dataset, &config.training)?;

    FsArtifactStore::from_config(&config.artifacts).save(&model, &metrics)?;

    println!("{}", serde_json::to_string(&metrics)?);
    Ok(())
}

async fn print_response(response: reqwest::Response) -> anyhow::Result<()> {
    let status = response.status();
    let body: serde_json::Value = response.json().await?;
    println!("{}", serde_json::to_string_pretty(&body)?);
    if !status.is_success() {
        bail!("server returned {}", status);
    }
    Ok(())
}
