//! Harbor resource group.
//!
//! Argument records mirror the Harbor provider's project and registry
//! inputs. Unset fields are left out when handed to the provider so it can
//! apply its own defaults.

use provisioner_core::{Input, ResourceArgs, impl_walk};
use serde::{Deserialize, Serialize};

use crate::tree::ResourceEntry;

/// Harbor resources declared for one environment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Harbor {
    pub projects: Option<Vec<ResourceEntry<ProjectArgs>>>,
    pub registries: Option<Vec<ResourceEntry<RegistryArgs>>>,
}

impl Harbor {
    /// Total number of declared entries.
    pub fn len(&self) -> usize {
        self.projects.as_ref().map_or(0, Vec::len) + self.registries.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Arguments for a Harbor project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectArgs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment_security: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_content_trust: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_content_trust_cosign: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_destroy: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry_id: Option<Input<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_quota: Option<Input<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vulnerability_scanning: Option<bool>,
}

impl_walk!(ProjectArgs {
    deployment_security,
    enable_content_trust,
    enable_content_trust_cosign,
    force_destroy,
    name,
    public,
    registry_id,
    storage_quota,
    vulnerability_scanning,
});

impl ResourceArgs for ProjectArgs {
    fn name_mut(&mut self) -> &mut Option<String> {
        &mut self.name
    }
}

/// Arguments for a Harbor registry endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryArgs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_name: Option<String>,
}

impl_walk!(RegistryArgs {
    access_id,
    access_secret,
    description,
    endpoint_url,
    insecure,
    name,
    provider_name,
});

impl ResourceArgs for RegistryArgs {
    fn name_mut(&mut self) -> &mut Option<String> {
        &mut self.name
    }
}
