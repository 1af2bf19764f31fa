//! Preview command: builds a configuration against an in-memory Harbor.

use anyhow::{Context, Result};
use provisioner_builder::{BuildEvent, EnvironmentFilter, Reconciler, RunReport};
use provisioner_config::load_config;
use provisioner_core::{
    BuildOutcome, EnvSecretStore, MemorySecretStore, ReferenceResolver, SecretStore, SecretValue,
};
use provisioner_harbor::InMemoryHarbor;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

pub struct PreviewOptions {
    pub team: Option<String>,
    pub service: Option<String>,
    pub environment: Option<String>,
    pub secrets: Option<String>,
    pub secret_prefix: String,
    pub json: bool,
}

pub async fn preview(config_path: &str, options: PreviewOptions) -> Result<()> {
    let config = load_config(config_path)
        .with_context(|| format!("Failed to load config file: {}", config_path))?;
    info!(path = %config_path, teams = config.teams.len(), "Loaded configuration");

    let secrets: Arc<dyn SecretStore> = match &options.secrets {
        Some(path) => Arc::new(load_secrets(path)?),
        None => Arc::new(EnvSecretStore::with_prefix(options.secret_prefix.clone())),
    };

    let (tx, mut rx) = mpsc::channel(100);
    let reconciler = Reconciler::new(Arc::new(InMemoryHarbor::new()), ReferenceResolver::new(secrets))
        .with_filter(EnvironmentFilter {
            team: options.team.clone(),
            service: options.service.clone(),
            environment: options.environment.clone(),
        })
        .with_events(tx);

    // The reconciler owns the sender; dropping it when the run ends closes the channel.
    let run = async move { reconciler.run(&config).await };

    let quiet = options.json;
    let printer = async move {
        while let Some(event) = rx.recv().await {
            if quiet {
                continue;
            }
            match event {
                BuildEvent::EnvironmentStarted { environment } => {
                    println!("▶ Environment '{}' started", environment);
                }
                BuildEvent::ResourceBuilt { environment, entry } => {
                    println!(
                        "  [{}] {} '{}' {}",
                        environment, entry.kind, entry.name, entry.outcome
                    );
                }
                BuildEvent::EnvironmentCompleted {
                    environment,
                    cached,
                } => {
                    println!(
                        "✓ Environment '{}' completed ({} resource(s) cached)\n",
                        environment, cached
                    );
                }
            }
        }
    };

    let (report, ()) = tokio::join!(run, printer);
    let report = report.context("Preview failed")?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }

    Ok(())
}

fn load_secrets(path: &str) -> Result<MemorySecretStore> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read secrets file: {}", path))?;
    let secrets: HashMap<String, SecretValue> = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse secrets file: {}", path))?;
    Ok(MemorySecretStore::from(secrets))
}

fn print_summary(report: &RunReport) {
    println!("--- Summary ---");
    for env in &report.environments {
        println!(
            "  {}/{}/{} ({} entries)",
            env.team,
            env.service,
            env.environment,
            env.entries.len()
        );
        for entry in &env.entries {
            let status = match entry.outcome {
                BuildOutcome::Created => "✓ created",
                BuildOutcome::Found => "✓ found",
                BuildOutcome::NotFound => "○ not found",
                BuildOutcome::Skipped => "⊘ skipped",
                BuildOutcome::Noop => "○ nothing to do",
            };
            println!(
                "    {} '{}' - {}{}",
                entry.kind,
                entry.name,
                status,
                entry
                    .id
                    .as_deref()
                    .map(|id| format!(" (id {})", id))
                    .unwrap_or_default()
            );
        }
    }
    println!(
        "\n{} created, {} found, {} skipped",
        report.count(BuildOutcome::Created),
        report.count(BuildOutcome::Found),
        report.count(BuildOutcome::Skipped)
    );
}
