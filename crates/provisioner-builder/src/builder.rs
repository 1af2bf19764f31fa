//! Builds the resources of one environment.

use derive_more::Display;
use provisioner_config::{Harbor, ResourceEntry};
use provisioner_core::{BuildContext, BuildOutcome, ReferenceResolver, Result, build};
use provisioner_harbor::{HarborArgs, HarborProvider, HarborResource, ResourceKind};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

/// Result of building one declared resource.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryReport {
    pub kind: ResourceKind,
    pub name: String,
    pub outcome: BuildOutcome,
    /// Provider id of the cached handle, if any.
    pub id: Option<String>,
}

/// Position of an environment in the configuration tree, shown as
/// `team/service/environment`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Display)]
#[display("{team}/{service}/{environment}")]
pub struct EnvironmentPath {
    pub team: String,
    pub service: String,
    pub environment: String,
}

impl EnvironmentPath {
    pub fn of(ctx: &BuildContext) -> Self {
        Self {
            team: ctx.team.clone(),
            service: ctx.service.clone(),
            environment: ctx.environment.clone(),
        }
    }
}

/// Progress emitted while building.
#[derive(Debug, Clone)]
pub enum BuildEvent {
    EnvironmentStarted {
        environment: EnvironmentPath,
    },
    ResourceBuilt {
        environment: EnvironmentPath,
        entry: EntryReport,
    },
    EnvironmentCompleted {
        environment: EnvironmentPath,
        cached: usize,
    },
}

/// Drives the lifecycle of every resource declared for one environment.
///
/// Kinds are built in a fixed order (projects, then registries) and entries
/// in declaration order, so a reference only sees entries built before it.
pub struct ResourceBuilder {
    context: BuildContext,
    resolver: ReferenceResolver,
    provider: Arc<dyn HarborProvider>,
    events: Option<mpsc::Sender<BuildEvent>>,
}

impl ResourceBuilder {
    pub fn new(
        context: BuildContext,
        resolver: ReferenceResolver,
        provider: Arc<dyn HarborProvider>,
    ) -> Self {
        Self {
            context,
            resolver,
            provider,
            events: None,
        }
    }

    /// Send a [`BuildEvent::ResourceBuilt`] for each entry.
    pub fn with_events(mut self, events: mpsc::Sender<BuildEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn context(&self) -> &BuildContext {
        &self.context
    }

    /// Build every Harbor resource group.
    pub async fn build(&mut self, harbor: &Harbor) -> Result<Vec<EntryReport>> {
        let mut reports = Vec::with_capacity(harbor.len());
        self.build_entries(harbor.projects.as_deref(), &mut reports)
            .await?;
        self.build_entries(harbor.registries.as_deref(), &mut reports)
            .await?;
        Ok(reports)
    }

    async fn build_entries<A: HarborArgs + Clone>(
        &mut self,
        entries: Option<&[ResourceEntry<A>]>,
        reports: &mut Vec<EntryReport>,
    ) -> Result<()> {
        let Some(entries) = entries else {
            return Ok(());
        };

        for entry in entries {
            let resource = HarborResource::<A>::new(entry.name.clone(), self.provider.clone());
            let outcome = build(
                &resource,
                &mut self.context,
                &self.resolver,
                entry.id.as_deref(),
                entry.args.clone(),
            )
            .await?;

            let id = if outcome.is_cached() {
                self.context
                    .get_from_cache(&entry.name)
                    .and_then(|h| h.id())
                    .map(str::to_string)
            } else {
                None
            };

            info!(kind = %A::KIND, resource = %entry.name, %outcome, "Resource processed");
            let report = EntryReport {
                kind: A::KIND,
                name: entry.name.clone(),
                outcome,
                id,
            };

            if let Some(tx) = &self.events {
                let _ = tx
                    .send(BuildEvent::ResourceBuilt {
                        environment: EnvironmentPath::of(&self.context),
                        entry: report.clone(),
                    })
                    .await;
            }
            reports.push(report);
        }

        Ok(())
    }
}
