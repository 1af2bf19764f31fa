//! Reference resolution for resource arguments.
//!
//! Before a resource is created, every string in its arguments is checked
//! against two expression forms:
//! - `Resource <name>, <output>-><nested>` - an output of a resource already
//!   built in the same context
//! - `Secret <name>` - a value from the secret store
//!
//! Expressions that cannot be resolved are left as they are.

use regex::Regex;
use serde_json::Value;
use std::sync::{Arc, LazyLock};
use tracing::debug;

use crate::context::BuildContext;
use crate::secret::{SecretStore, SecretValue};
use crate::walk::Walk;

/// Delimiter between nested output attribute names.
pub const OUTPUT_CHAIN_DELIMITER: &str = "->";

static RESOURCE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Resource (.+),\s?(.+)$").unwrap());

static SECRET_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^Secret (.+)$").unwrap());

/// A parsed reference expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    Resource { name: String, path: Vec<String> },
    Secret { name: String },
}

impl Reference {
    /// Parse an expression, returning `None` for plain values.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();

        if let Some(caps) = RESOURCE_REGEX.captures(value) {
            let name = caps[1].trim().to_string();
            let path: Vec<String> = caps[2]
                .split(OUTPUT_CHAIN_DELIMITER)
                .map(|s| s.trim().to_string())
                .collect();
            if name.is_empty() || path.iter().any(String::is_empty) {
                return None;
            }
            return Some(Reference::Resource { name, path });
        }

        if let Some(caps) = SECRET_REGEX.captures(value) {
            let name = caps[1].trim().to_string();
            if name.is_empty() {
                return None;
            }
            return Some(Reference::Secret { name });
        }

        None
    }
}

/// Rewrites reference expressions in argument records.
#[derive(Clone)]
pub struct ReferenceResolver {
    secrets: Arc<dyn SecretStore>,
}

impl ReferenceResolver {
    pub fn new(secrets: Arc<dyn SecretStore>) -> Self {
        Self { secrets }
    }

    /// Resolve every expression in `args` in place. Returns how many values
    /// were replaced.
    pub async fn resolve<A: Walk + ?Sized>(&self, ctx: &BuildContext, args: &mut A) -> usize {
        let mut replaced = 0;

        for field in args.strings_mut() {
            if let Some(value) = self.resolve_value(ctx, field).await {
                if *field != value {
                    *field = value;
                    replaced += 1;
                }
            }
        }

        replaced
    }

    /// Resolve a single value. `None` means the value is not an expression
    /// or could not be resolved.
    pub async fn resolve_value(&self, ctx: &BuildContext, value: &str) -> Option<String> {
        match Reference::parse(value)? {
            Reference::Resource { name, path } => {
                let Some(handle) = ctx.get_from_cache(&name) else {
                    debug!(resource = %name, "Referenced resource not built yet");
                    return None;
                };
                let output = handle.output(path.as_slice());
                if output.is_none() {
                    debug!(resource = %name, path = ?path, "Referenced output not present");
                }
                output.map(render_output)
            }
            Reference::Secret { name } => match self.secrets.get(&name).await {
                Ok(SecretValue::String(secret)) => Some(secret),
                Ok(SecretValue::Map(_)) => {
                    debug!(secret = %name, "Map secret cannot replace a single value");
                    None
                }
                Err(e) => {
                    debug!(secret = %name, error = %e, "Secret lookup failed");
                    None
                }
            },
        }
    }
}

impl std::fmt::Debug for ReferenceResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferenceResolver").finish_non_exhaustive()
    }
}

fn render_output(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::ResourceHandle;
    use crate::impl_walk;
    use crate::secret::MemorySecretStore;
    use serde_json::json;
    use std::collections::HashMap;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Endpoint {
        host: Option<String>,
        port: Option<u16>,
    }

    impl_walk!(Endpoint { host, port });

    #[derive(Debug, Clone, Default, PartialEq)]
    struct ServiceArgs {
        name: Option<String>,
        network_id: Option<String>,
        password: Option<String>,
        endpoint: Option<Endpoint>,
        tags: Option<Vec<String>>,
    }

    impl_walk!(ServiceArgs { name, network_id, password, endpoint, tags });

    fn resolver() -> ReferenceResolver {
        ReferenceResolver::new(Arc::new(
            MemorySecretStore::new().with_secret("db-password", "s3cr3t"),
        ))
    }

    fn context() -> BuildContext {
        let mut ctx = BuildContext::new("t", "s", "e", "");
        ctx.add_to_cache(
            "foo",
            ResourceHandle::new("test:network", "t-s-e-foo")
                .with_output("id", "net-1")
                .with_output("port", 8080)
                .with_output("networkInfo", json!({ "endpoint": "x" })),
        );
        ctx
    }

    #[test]
    fn test_parse_expressions() {
        assert_eq!(
            Reference::parse("Resource foo, networkInfo->endpoint"),
            Some(Reference::Resource {
                name: "foo".into(),
                path: vec!["networkInfo".into(), "endpoint".into()],
            })
        );
        assert_eq!(
            Reference::parse("Resource foo,id"),
            Some(Reference::Resource {
                name: "foo".into(),
                path: vec!["id".into()],
            })
        );
        assert_eq!(
            Reference::parse("Secret db-password"),
            Some(Reference::Secret {
                name: "db-password".into()
            })
        );
    }

    #[test]
    fn test_malformed_expressions_are_plain_values() {
        assert_eq!(Reference::parse("Resource foo"), None);
        assert_eq!(Reference::parse("Resource foo, a->"), None);
        assert_eq!(Reference::parse("Secret "), None);
        assert_eq!(Reference::parse("Top Secret plans"), None);
        assert_eq!(Reference::parse("plain"), None);
    }

    #[tokio::test]
    async fn test_resolves_nested_output() {
        let ctx = context();
        let value = resolver()
            .resolve_value(&ctx, "Resource foo, networkInfo->endpoint")
            .await;
        assert_eq!(value.as_deref(), Some("x"));
    }

    #[tokio::test]
    async fn test_unknown_resource_left_untouched() {
        let ctx = BuildContext::new("t", "s", "e", "");
        let mut args = ServiceArgs {
            network_id: Some("Resource foo, endpoint".into()),
            ..Default::default()
        };

        let replaced = resolver().resolve(&ctx, &mut args).await;
        assert_eq!(replaced, 0);
        assert_eq!(args.network_id.as_deref(), Some("Resource foo, endpoint"));
    }

    #[tokio::test]
    async fn test_missing_path_segment_left_untouched() {
        let ctx = context();
        let mut args = ServiceArgs {
            network_id: Some("Resource foo, networkInfo->gateway->ip".into()),
            ..Default::default()
        };

        resolver().resolve(&ctx, &mut args).await;
        assert_eq!(
            args.network_id.as_deref(),
            Some("Resource foo, networkInfo->gateway->ip")
        );
    }

    #[tokio::test]
    async fn test_resolves_secret() {
        let ctx = context();
        let mut args = ServiceArgs {
            password: Some("Secret db-password".into()),
            tags: Some(vec!["Secret missing".into()]),
            ..Default::default()
        };

        resolver().resolve(&ctx, &mut args).await;
        assert_eq!(args.password.as_deref(), Some("s3cr3t"));
        assert_eq!(args.tags, Some(vec!["Secret missing".to_string()]));
    }

    #[tokio::test]
    async fn test_map_secret_left_untouched() {
        let mut store = MemorySecretStore::new();
        store.insert(
            "creds",
            SecretValue::Map(HashMap::from([
                ("user".to_string(), "admin".to_string()),
                ("password".to_string(), "hunter2".to_string()),
            ])),
        );
        let resolver = ReferenceResolver::new(Arc::new(store));
        let ctx = context();

        assert_eq!(resolver.resolve_value(&ctx, "Secret creds").await, None);

        let mut args = ServiceArgs {
            password: Some("Secret creds".into()),
            ..Default::default()
        };
        assert_eq!(resolver.resolve(&ctx, &mut args).await, 0);
        assert_eq!(args.password.as_deref(), Some("Secret creds"));
    }

    #[tokio::test]
    async fn test_resolves_nested_records_and_sequences() {
        let ctx = context();
        let mut args = ServiceArgs {
            name: Some("plain name".into()),
            endpoint: Some(Endpoint {
                host: Some("Resource foo, networkInfo->endpoint".into()),
                port: Some(443),
            }),
            tags: Some(vec!["Resource foo, id".into(), "Resource foo, port".into()]),
            ..Default::default()
        };

        let replaced = resolver().resolve(&ctx, &mut args).await;
        assert_eq!(replaced, 3);
        assert_eq!(args.name.as_deref(), Some("plain name"));
        assert_eq!(args.endpoint.unwrap().host.as_deref(), Some("x"));
        assert_eq!(args.tags, Some(vec!["net-1".to_string(), "8080".to_string()]));
    }

    #[tokio::test]
    async fn test_resolution_is_idempotent() {
        let ctx = context();
        let resolver = resolver();
        let mut args = ServiceArgs {
            network_id: Some("Resource foo, id".into()),
            password: Some("Secret db-password".into()),
            tags: Some(vec!["Resource bar, id".into()]),
            ..Default::default()
        };

        resolver.resolve(&ctx, &mut args).await;
        let once = args.clone();
        let replaced = resolver.resolve(&ctx, &mut args).await;

        assert_eq!(replaced, 0);
        assert_eq!(args, once);
    }
}
