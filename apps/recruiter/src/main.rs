use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use recruiter::cli::Args;
use recruiter::config::Config;
use recruiter::extraction::FileTextExtractor;
use recruiter::llm_client::GenAiClient;
use recruiter::models::{parse_job_descriptions, PipelineState};
use recruiter::Pipeline;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting recruiter v{}", env!("CARGO_PKG_VERSION"));

    let raw_jds = tokio::fs::read_to_string(&args.jds)
        .await
        .with_context(|| format!("Failed to read job descriptions from {}", args.jds.display()))?;
    let jd_list = parse_job_descriptions(&raw_jds)
        .with_context(|| format!("Invalid job descriptions in {}", args.jds.display()))?;
    info!("Loaded {} job descriptions", jd_list.len());

    let llm = GenAiClient::from_config(&config).context("Failed to build LLM client")?;
    info!("LLM client initialized (model: {})", llm.model());

    let pipeline = Pipeline::new(Arc::new(llm), Arc::new(FileTextExtractor));

    let mut state = PipelineState::new(&args.cv, jd_list);
    if let Some(position) = args.position {
        state = state.with_position(position);
    }
    if let Some(email) = args.override_email {
        state = state.with_override_email(email);
    }

    let report = pipeline.run(state).await;
    if !report.succeeded() {
        warn!("Pipeline stopped early: {}", report.failures.join("; "));
    }

    let json = serde_json::to_string_pretty(&report)?;
    match &args.output {
        Some(path) => {
            tokio::fs::write(path, json)
                .await
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            info!("Report written to {}", path.display());
        }
        None => println!("{json}"),
    }

    Ok(())
}
