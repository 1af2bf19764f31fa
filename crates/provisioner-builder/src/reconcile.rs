//! Reconciles a whole configuration, one build context per environment.

use futures::future::try_join_all;
use provisioner_config::{Config, EnvironmentRef};
use provisioner_core::{BuildContext, BuildOutcome, ReferenceResolver};
use provisioner_harbor::HarborProvider;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{Instrument, error, info, info_span};

use crate::builder::{BuildEvent, EntryReport, EnvironmentPath, ResourceBuilder};
use crate::error::{ReconcileError, ReconcileResult};

/// Restricts a run to matching coordinates. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentFilter {
    pub team: Option<String>,
    pub service: Option<String>,
    pub environment: Option<String>,
}

impl EnvironmentFilter {
    pub fn matches(&self, env: &EnvironmentRef<'_>) -> bool {
        let accepts = |wanted: &Option<String>, actual: &str| {
            wanted.as_deref().is_none_or(|w| w == actual)
        };
        accepts(&self.team, &env.team.name)
            && accepts(&self.service, &env.service.name)
            && accepts(&self.environment, &env.environment.name)
    }
}

/// Outcome of one environment.
#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentReport {
    pub team: String,
    pub service: String,
    pub environment: String,
    pub location: String,
    pub entries: Vec<EntryReport>,
}

/// Outcome of a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub environments: Vec<EnvironmentReport>,
}

impl RunReport {
    pub fn count(&self, outcome: BuildOutcome) -> usize {
        self.environments
            .iter()
            .flat_map(|e| &e.entries)
            .filter(|e| e.outcome == outcome)
            .count()
    }
}

/// Builds every environment of a configuration.
///
/// Environments share nothing and are built concurrently; resources inside
/// one environment are built one after another.
pub struct Reconciler {
    provider: Arc<dyn HarborProvider>,
    resolver: ReferenceResolver,
    filter: EnvironmentFilter,
    events: Option<mpsc::Sender<BuildEvent>>,
}

impl Reconciler {
    pub fn new(provider: Arc<dyn HarborProvider>, resolver: ReferenceResolver) -> Self {
        Self {
            provider,
            resolver,
            filter: EnvironmentFilter::default(),
            events: None,
        }
    }

    pub fn with_filter(mut self, filter: EnvironmentFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_events(mut self, events: mpsc::Sender<BuildEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub async fn run(&self, config: &Config) -> ReconcileResult<RunReport> {
        let builds = config
            .environments()
            .filter(|env| self.filter.matches(env))
            .map(|env| {
                let span = info_span!(
                    "environment",
                    team = %env.team.name,
                    service = %env.service.name,
                    environment = %env.environment.name,
                );
                self.run_environment(env).instrument(span)
            });

        let environments = try_join_all(builds).await?;
        info!(
            environments = environments.len(),
            provider = self.provider.name(),
            "Reconciliation finished"
        );
        Ok(RunReport { environments })
    }

    async fn run_environment(&self, env: EnvironmentRef<'_>) -> ReconcileResult<EnvironmentReport> {
        let context = BuildContext::new(
            &env.team.name,
            &env.service.name,
            &env.environment.name,
            env.environment.location.as_deref().unwrap_or_default(),
        );
        let location = context.location.clone();
        let path = EnvironmentPath::of(&context);

        self.send(BuildEvent::EnvironmentStarted {
            environment: path.clone(),
        })
        .await;

        let mut builder =
            ResourceBuilder::new(context, self.resolver.clone(), self.provider.clone());
        if let Some(tx) = &self.events {
            builder = builder.with_events(tx.clone());
        }

        let entries = match &env.environment.harbor {
            Some(harbor) => builder.build(harbor).await.map_err(|source| {
                error!(error = %source, "Environment build failed");
                ReconcileError::Environment {
                    team: env.team.name.clone(),
                    service: env.service.name.clone(),
                    environment: env.environment.name.clone(),
                    source,
                }
            })?,
            None => Vec::new(),
        };

        self.send(BuildEvent::EnvironmentCompleted {
            environment: path,
            cached: builder.context().len(),
        })
        .await;

        Ok(EnvironmentReport {
            team: env.team.name.clone(),
            service: env.service.name.clone(),
            environment: env.environment.name.clone(),
            location,
            entries,
        })
    }

    async fn send(&self, event: BuildEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event).await;
        }
    }
}
