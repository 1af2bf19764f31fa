//! Per-environment build context.

use std::collections::HashMap;

use crate::handle::ResourceHandle;

const NAME_SEPARATOR: &str = "-";

/// State shared by every resource built for one (team, service, environment).
///
/// The cache only grows during a run; a later registration under the same
/// name replaces the earlier handle.
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub team: String,
    pub service: String,
    pub environment: String,
    pub location: String,
    resource_cache: HashMap<String, ResourceHandle>,
}

impl BuildContext {
    pub fn new(
        team: impl Into<String>,
        service: impl Into<String>,
        environment: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            team: team.into(),
            service: service.into(),
            environment: environment.into(),
            location: location.into(),
            resource_cache: HashMap::new(),
        }
    }

    pub fn add_to_cache(&mut self, name: impl Into<String>, handle: ResourceHandle) {
        self.resource_cache.insert(name.into(), handle);
    }

    pub fn get_from_cache(&self, name: &str) -> Option<&ResourceHandle> {
        self.resource_cache.get(name)
    }

    /// `team-service-environment-identifier`.
    pub fn default_resource_name(&self, identifier: &str) -> String {
        [
            self.team.as_str(),
            self.service.as_str(),
            self.environment.as_str(),
            identifier,
        ]
        .join(NAME_SEPARATOR)
    }

    /// Default name without separators, for systems that only accept alphanumerics.
    pub fn default_resource_name_clean(&self, identifier: &str) -> String {
        self.default_resource_name(identifier)
            .replace(NAME_SEPARATOR, "")
    }

    /// Logical names registered so far, sorted.
    pub fn cached_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.resource_cache.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.resource_cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resource_cache.is_empty()
    }
}
