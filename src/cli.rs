//! Command-line interface

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use chrono::{TimeZone, Utc};

use crate::auth::{secure_token_file, OauthTokenProvider, TokenProvider};
use crate::classifier::ClassifierClient;
use crate::client::ProductionGmailClient;
use crate::config::Config;
use crate::draft::DraftClient;
use crate::pipeline::{PipelineSettings, TriagePipeline};
use crate::scheduler::Scheduler;
use crate::state::Checkpoint;

#[derive(Parser, Debug)]
#[command(name = "squire-triage", version, about = "Background Gmail inbox triage")]
pub struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, default_value = "config.toml", global = true)]
    pub config: PathBuf,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Authorize Gmail access interactively and cache the token
    Auth,
    /// Run one triage pass now
    Run,
    /// Scan the inbox on the configured period until interrupted
    Watch,
    /// Show the stored scan checkpoint
    Status,
    /// Write a starter config file
    InitConfig {
        /// Where to write the config
        #[arg(default_value = "config.toml")]
        path: PathBuf,
    },
}

pub async fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::InitConfig { ref path } => init_config(path).await,
        Commands::Auth => {
            let config = Config::load(&cli.config).await?;
            authorize(&config).await
        }
        Commands::Run => {
            let config = Config::load(&cli.config).await?;
            run_once(&config).await
        }
        Commands::Watch => {
            let config = Config::load(&cli.config).await?;
            watch(&config).await
        }
        Commands::Status => {
            let config = Config::load(&cli.config).await?;
            status(&config).await
        }
    }
}

async fn init_config(path: &Path) -> anyhow::Result<()> {
    if path.exists() {
        anyhow::bail!("Refusing to overwrite existing config at {:?}", path);
    }
    tokio::fs::write(path, Config::template()).await?;
    println!("Wrote starter config to {:?}", path);
    println!("Set triage.user_id and the service endpoints before running.");
    Ok(())
}

async fn authorize(config: &Config) -> anyhow::Result<()> {
    let provider = OauthTokenProvider::new(
        &config.gmail.credentials_path,
        &config.gmail.token_cache_path,
    )
    .await?;

    provider
        .authenticate(true)
        .await
        .context("Interactive authorization failed")?;
    secure_token_file(&config.gmail.token_cache_path).await?;

    println!(
        "Authorization complete, token cached at {:?}",
        config.gmail.token_cache_path
    );
    Ok(())
}

async fn build_pipeline(config: &Config) -> anyhow::Result<TriagePipeline> {
    let provider = Arc::new(
        OauthTokenProvider::new(
            &config.gmail.credentials_path,
            &config.gmail.token_cache_path,
        )
        .await?,
    );
    let client = Arc::new(ProductionGmailClient::new(provider.build_hub()?));

    Ok(TriagePipeline::new(
        client,
        provider,
        ClassifierClient::new(config.services.classifier_endpoint.clone())?,
        DraftClient::new(config.services.draft_endpoint.clone())?,
        Checkpoint::new(&config.triage.checkpoint_path),
        PipelineSettings {
            user_id: config.triage.user_id.clone(),
            label_base: config.triage.label_base.clone(),
            max_messages_per_run: config.triage.max_messages_per_run,
        },
    ))
}

async fn run_once(config: &Config) -> anyhow::Result<()> {
    let mut pipeline = build_pipeline(config).await?;

    // A manual run may prompt for authorization
    let result = pipeline.run(true).await?;

    if result.outcomes.is_empty() {
        println!("No new unread messages.");
    }
    for entry in &result.outcomes {
        println!("{}: {}", entry.message_id, entry.outcome.describe());
    }
    for id in &result.failed_ids {
        println!("{}: skipped after error (see log)", id);
    }
    if result.aborted {
        anyhow::bail!("Run aborted: authorization was rejected, re-run `auth`");
    }
    Ok(())
}

async fn watch(config: &Config) -> anyhow::Result<()> {
    let pipeline = build_pipeline(config).await?;
    let period = Duration::from_secs(config.triage.check_interval_minutes * 60);

    Scheduler::new(pipeline, period).watch().await;
    Ok(())
}

async fn status(config: &Config) -> anyhow::Result<()> {
    let checkpoint = Checkpoint::new(&config.triage.checkpoint_path);
    let data = checkpoint.load().await?;

    match data.last_check_timestamp {
        Some(raw) => {
            let ms: i64 = raw
                .parse()
                .with_context(|| format!("Invalid checkpoint timestamp: {}", raw))?;
            match Utc.timestamp_millis_opt(ms).single() {
                Some(when) => println!("Last scan: {} ({})", when.to_rfc3339(), ms),
                None => println!("Last scan: {} (out of range)", ms),
            }
        }
        None => println!("No scan recorded yet; the next run scans without a time window."),
    }
    Ok(())
}
