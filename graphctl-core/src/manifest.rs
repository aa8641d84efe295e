//! Declarative manifest: provider settings plus the desired resources.
//!
//! ```yaml
//! provider:
//!   api_url: https://cosmo-cp.wundergraph.com   # or $COSMO_API_URL
//! federated_graphs:
//!   orders:
//!     name: orders
//!     routing_url: http://router.internal/graphql
//!     label_matchers: ["team=payments", "env=prod"]
//! router_tokens:
//!   orders_ci:
//!     name: ci
//!     graph_name: orders
//! monographs:
//!   legacy:
//!     name: legacy-api
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ManifestError, ValidationError};
use crate::types::{
    FederatedGraphState, MonographLookup, ResourceAddress, ResourceKind, ResourceModel,
    RouterTokenState, Sensitive,
};

pub const DEFAULT_API_URL: &str = "https://cosmo-cp.wundergraph.com";
pub const API_URL_ENV: &str = "COSMO_API_URL";
pub const API_KEY_ENV: &str = "COSMO_API_KEY";

/// Connection settings for the control plane.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<Sensitive>,
}

/// Provider settings after applying environment fallbacks and defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProvider {
    pub api_url: String,
    pub api_key: Option<Sensitive>,
}

impl ProviderConfig {
    /// Resolve against the process environment.
    pub fn resolve(&self) -> ResolvedProvider {
        self.resolve_with(|name| std::env::var(name).ok())
    }

    /// Resolve: manifest value, then `env`, then the default URL.
    pub fn resolve_with(&self, env: impl Fn(&str) -> Option<String>) -> ResolvedProvider {
        let non_empty = |v: String| (!v.trim().is_empty()).then_some(v);
        let api_url = self
            .api_url
            .clone()
            .and_then(non_empty)
            .or_else(|| env(API_URL_ENV).and_then(non_empty))
            .unwrap_or_else(|| DEFAULT_API_URL.to_owned());
        let api_key = self
            .api_key
            .clone()
            .filter(|key| !key.expose().is_empty())
            .or_else(|| env(API_KEY_ENV).and_then(non_empty).map(Sensitive::new));
        ResolvedProvider { api_url, api_key }
    }
}

/// Root of `graphctl.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub federated_graphs: BTreeMap<String, FederatedGraphState>,
    #[serde(default)]
    pub router_tokens: BTreeMap<String, RouterTokenState>,
    #[serde(default)]
    pub monographs: BTreeMap<String, MonographLookup>,
}

impl Manifest {
    /// Load and check a manifest file.
    pub fn load_at(path: &Path) -> Result<Self, ManifestError> {
        if !path.exists() {
            return Err(ManifestError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let contents = std::fs::read_to_string(path).map_err(|e| ManifestError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let manifest: Manifest =
            serde_yaml::from_str(&contents).map_err(|e| ManifestError::Parse {
                path: path.to_path_buf(),
                source: e,
            })?;
        manifest.check()?;
        Ok(manifest)
    }

    /// Reject declarations of fields the control plane owns.
    pub fn check(&self) -> Result<(), ValidationError> {
        for (key, graph) in &self.federated_graphs {
            check_key(ResourceKind::FederatedGraph, key)?;
            if graph.id.is_some() {
                return Err(ValidationError::ComputedFieldDeclared {
                    address: ResourceAddress::new(ResourceKind::FederatedGraph, key).to_string(),
                    field: "id",
                });
            }
        }
        for (key, token) in &self.router_tokens {
            check_key(ResourceKind::RouterToken, key)?;
            if token.token.is_some() {
                return Err(ValidationError::ComputedFieldDeclared {
                    address: ResourceAddress::new(ResourceKind::RouterToken, key).to_string(),
                    field: "token",
                });
            }
        }
        Ok(())
    }

    /// Every declared managed resource, keyed by address.
    pub fn desired(&self) -> BTreeMap<ResourceAddress, ResourceModel> {
        let graphs = self.federated_graphs.iter().map(|(key, graph)| {
            (
                ResourceAddress::new(ResourceKind::FederatedGraph, key),
                ResourceModel::from(graph.clone()),
            )
        });
        let tokens = self.router_tokens.iter().map(|(key, token)| {
            (
                ResourceAddress::new(ResourceKind::RouterToken, key),
                ResourceModel::from(token.clone()),
            )
        });
        graphs.chain(tokens).collect()
    }

    /// The declaration at `address`, if any.
    pub fn declared(&self, address: &ResourceAddress) -> Option<ResourceModel> {
        match address.kind {
            ResourceKind::FederatedGraph => self
                .federated_graphs
                .get(&address.key)
                .cloned()
                .map(ResourceModel::from),
            ResourceKind::RouterToken => self
                .router_tokens
                .get(&address.key)
                .cloned()
                .map(ResourceModel::from),
        }
    }
}

fn check_key(kind: ResourceKind, key: &str) -> Result<(), ValidationError> {
    if key.is_empty() || key.contains('.') {
        return Err(ValidationError::InvalidAddress {
            address: format!("{kind}.{key}"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"
federated_graphs:
  orders:
    name: orders
    routing_url: http://svc/routing
    label_matchers: ["team=payments", "env=prod"]
router_tokens:
  ci:
    name: ci
    graph_name: orders
    namespace: staging
monographs:
  legacy:
    name: legacy-api
"#;

    #[test]
    fn parses_all_sections() {
        let manifest: Manifest = serde_yaml::from_str(MANIFEST).expect("parse");
        manifest.check().expect("check");
        let desired = manifest.desired();
        assert_eq!(desired.len(), 2);
        let graph = &manifest.federated_graphs["orders"];
        assert_eq!(graph.namespace.as_str(), "default");
        assert_eq!(graph.label_matchers, vec!["team=payments", "env=prod"]);
        assert_eq!(manifest.router_tokens["ci"].namespace.as_str(), "staging");
        assert_eq!(manifest.monographs["legacy"].namespace.as_str(), "default");
    }

    #[test]
    fn declaring_an_id_is_rejected() {
        let manifest: Manifest = serde_yaml::from_str(
            "federated_graphs:\n  orders:\n    id: abc\n    name: orders\n    routing_url: http://x\n",
        )
        .expect("parse");
        let err = manifest.check().unwrap_err();
        assert!(matches!(err, ValidationError::ComputedFieldDeclared { field: "id", .. }));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result: Result<Manifest, _> = serde_yaml::from_str(
            "federated_graphs:\n  orders:\n    name: orders\n    routing_url: http://x\n    routing: y\n",
        );
        assert!(result.is_err());
    }

    #[test]
    fn provider_resolution_order() {
        let env = |name: &str| match name {
            API_URL_ENV => Some("https://env.example".to_string()),
            API_KEY_ENV => Some("env-key".to_string()),
            _ => None,
        };

        let from_env = ProviderConfig::default().resolve_with(env);
        assert_eq!(from_env.api_url, "https://env.example");
        assert_eq!(from_env.api_key.as_ref().map(Sensitive::expose), Some("env-key"));

        let explicit = ProviderConfig {
            api_url: Some("https://manifest.example".to_string()),
            api_key: Some(Sensitive::new("manifest-key")),
        }
        .resolve_with(env);
        assert_eq!(explicit.api_url, "https://manifest.example");
        assert_eq!(explicit.api_key.as_ref().map(Sensitive::expose), Some("manifest-key"));

        let defaults = ProviderConfig::default().resolve_with(|_| None);
        assert_eq!(defaults.api_url, DEFAULT_API_URL);
        assert!(defaults.api_key.is_none());
    }
}
