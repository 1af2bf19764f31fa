//! Configuration tree: teams, services, environments and resource groups.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::harbor::Harbor;
use crate::{ConfigError, ConfigResult};

/// Root of a configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub teams: Vec<Team>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Team {
    pub name: String,
    #[serde(default)]
    pub services: Vec<Service>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Service {
    pub name: String,
    #[serde(default)]
    pub environments: Vec<Environment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Environment {
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub harbor: Option<Harbor>,
}

/// One declared resource.
///
/// With `id` set the resource is looked up; with only `args` it is created.
/// Without `args` a resource is never created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceEntry<A> {
    pub name: String,
    #[serde(default)]
    pub id: Option<String>,
    pub args: Option<A>,
}

impl<A> ResourceEntry<A> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            args: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_args(mut self, args: A) -> Self {
        self.args = Some(args);
        self
    }
}

/// An environment together with the coordinates of its parents.
#[derive(Debug, Clone, Copy)]
pub struct EnvironmentRef<'a> {
    pub team: &'a Team,
    pub service: &'a Service,
    pub environment: &'a Environment,
}

impl Config {
    /// Every environment in declaration order.
    pub fn environments(&self) -> impl Iterator<Item = EnvironmentRef<'_>> {
        self.teams.iter().flat_map(|team| {
            team.services.iter().flat_map(move |service| {
                service.environments.iter().map(move |environment| EnvironmentRef {
                    team,
                    service,
                    environment,
                })
            })
        })
    }

    /// Check names are present and unique within each list.
    pub fn validate(&self) -> ConfigResult<()> {
        check_names("team", "config", self.teams.iter().map(|t| t.name.as_str()))?;

        for team in &self.teams {
            check_names(
                "service",
                &team.name,
                team.services.iter().map(|s| s.name.as_str()),
            )?;

            for service in &team.services {
                let scope = format!("{}/{}", team.name, service.name);
                check_names(
                    "environment",
                    &scope,
                    service.environments.iter().map(|e| e.name.as_str()),
                )?;

                for env in &service.environments {
                    let Some(harbor) = &env.harbor else {
                        continue;
                    };
                    let scope = format!("{}/{}", scope, env.name);
                    if let Some(projects) = &harbor.projects {
                        check_names(
                            "harbor project",
                            &scope,
                            projects.iter().map(|p| p.name.as_str()),
                        )?;
                    }
                    if let Some(registries) = &harbor.registries {
                        check_names(
                            "harbor registry",
                            &scope,
                            registries.iter().map(|r| r.name.as_str()),
                        )?;
                    }
                }
            }
        }

        Ok(())
    }
}

fn check_names<'a>(
    kind: &str,
    scope: &str,
    names: impl Iterator<Item = &'a str>,
) -> ConfigResult<()> {
    let mut seen = HashSet::new();
    for name in names {
        if name.trim().is_empty() {
            return Err(ConfigError::MissingField(format!("{} name in {}", kind, scope)));
        }
        if !seen.insert(name) {
            return Err(ConfigError::Duplicate(format!(
                "{} '{}' in {}",
                kind, name, scope
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harbor::ProjectArgs;

    fn config_with_projects(names: &[&str]) -> Config {
        let projects = names
            .iter()
            .map(|n| ResourceEntry::new(*n).with_args(ProjectArgs::default()))
            .collect();
        Config {
            teams: vec![Team {
                name: "platform".into(),
                services: vec![Service {
                    name: "registry".into(),
                    environments: vec![Environment {
                        name: "dev".into(),
                        location: None,
                        harbor: Some(Harbor {
                            projects: Some(projects),
                            registries: None,
                        }),
                    }],
                }],
            }],
        }
    }

    #[test]
    fn test_valid_config() {
        let config = config_with_projects(&["images", "charts"]);
        assert!(config.validate().is_ok());

        let envs: Vec<_> = config.environments().collect();
        assert_eq!(envs.len(), 1);
        assert_eq!(envs[0].team.name, "platform");
        assert_eq!(envs[0].service.name, "registry");
        assert_eq!(envs[0].environment.name, "dev");
    }

    #[test]
    fn test_duplicate_entry_rejected() {
        let config = config_with_projects(&["images", "images"]);
        assert!(matches!(config.validate(), Err(ConfigError::Duplicate(_))));
    }

    #[test]
    fn test_empty_name_rejected() {
        let config = config_with_projects(&[" "]);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingField(_))
        ));
    }

    #[test]
    fn test_duplicate_environment_rejected() {
        let mut config = config_with_projects(&["images"]);
        let env = config.teams[0].services[0].environments[0].clone();
        config.teams[0].services[0].environments.push(env);

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("environment 'dev'"));
    }
}
