//! Domain types for managed graph resources.
//!
//! The `*State` structs double as the declared model (read from the manifest)
//! and the tracked model (persisted between runs). Fields owned by the control
//! plane are `Option`s that stay `None` until a reconciler fills them in.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::label_matcher::{self, LabelMatcher};

/// Namespace used when none is declared.
pub const DEFAULT_NAMESPACE: &str = "default";

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Opaque identifier assigned by the control plane.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(pub String);

impl ResourceId {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ResourceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ResourceId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A graph namespace. Empty input resolves to [`DEFAULT_NAMESPACE`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Namespace(String);

impl Namespace {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        if name.trim().is_empty() {
            Self::default()
        } else {
            Self(name)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Namespace {
    fn default() -> Self {
        Self(DEFAULT_NAMESPACE.to_owned())
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for Namespace {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for Namespace {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<Namespace> for String {
    fn from(ns: Namespace) -> Self {
        ns.0
    }
}

/// A write-only secret. Serialized as-is, never shown by `Debug` or `Display`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sensitive(String);

impl Sensitive {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Sensitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Sensitive(***)")
    }
}

impl fmt::Display for Sensitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(sensitive)")
    }
}

// ---------------------------------------------------------------------------
// Resource kinds and addresses
// ---------------------------------------------------------------------------

/// The kinds of resources graphctl manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    FederatedGraph,
    RouterToken,
}

impl ResourceKind {
    pub fn all() -> &'static [ResourceKind] {
        &[ResourceKind::FederatedGraph, ResourceKind::RouterToken]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::FederatedGraph => "federated_graph",
            ResourceKind::RouterToken => "router_token",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "federated_graph" => Ok(ResourceKind::FederatedGraph),
            "router_token" => Ok(ResourceKind::RouterToken),
            other => Err(ValidationError::UnknownKind {
                kind: other.to_owned(),
            }),
        }
    }
}

/// `<kind>.<key>`: where a resource lives in the manifest and in state.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceAddress {
    pub kind: ResourceKind,
    pub key: String,
}

impl ResourceAddress {
    pub fn new(kind: ResourceKind, key: impl Into<String>) -> Self {
        Self {
            kind,
            key: key.into(),
        }
    }
}

impl fmt::Display for ResourceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.kind, self.key)
    }
}

impl FromStr for ResourceAddress {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidAddress {
            address: s.to_owned(),
        };
        let (kind, key) = s.split_once('.').ok_or_else(invalid)?;
        if key.is_empty() || key.contains('.') {
            return Err(invalid());
        }
        Ok(Self::new(kind.parse()?, key))
    }
}

impl TryFrom<String> for ResourceAddress {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ResourceAddress> for String {
    fn from(address: ResourceAddress) -> Self {
        address.to_string()
    }
}

// ---------------------------------------------------------------------------
// Federated graph
// ---------------------------------------------------------------------------

/// Declared and tracked model of a federated graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FederatedGraphState {
    /// Assigned by the control plane on first create; never changes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ResourceId>,
    pub name: String,
    #[serde(default)]
    pub namespace: Namespace,
    pub routing_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admission_webhook_url: Option<String>,
    /// Write-only: reads never populate it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admission_webhook_secret: Option<Sensitive>,
    #[serde(default)]
    pub label_matchers: Vec<String>,
}

impl FederatedGraphState {
    pub fn new(name: impl Into<String>, routing_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            routing_url: routing_url.into(),
            ..Self::default()
        }
    }

    /// True once the control plane has assigned a non-empty identifier.
    pub fn has_id(&self) -> bool {
        self.id.as_ref().is_some_and(|id| !id.is_empty())
    }

    pub fn id_str(&self) -> &str {
        self.id.as_ref().map(|id| id.0.as_str()).unwrap_or_default()
    }
}

/// A federated graph whose inputs passed local validation.
///
/// Building one is the only way to obtain the label matchers the client
/// sends, so nothing unvalidated reaches the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphDefinition {
    pub name: String,
    pub namespace: Namespace,
    pub routing_url: String,
    pub readme: Option<String>,
    pub admission_webhook_url: Option<String>,
    pub label_matchers: Vec<LabelMatcher>,
}

impl TryFrom<&FederatedGraphState> for GraphDefinition {
    type Error = ValidationError;

    fn try_from(state: &FederatedGraphState) -> Result<Self, Self::Error> {
        if state.name.trim().is_empty() {
            return Err(ValidationError::MissingField { field: "name" });
        }
        if state.routing_url.trim().is_empty() {
            return Err(ValidationError::MissingField {
                field: "routing_url",
            });
        }
        Ok(Self {
            name: state.name.clone(),
            namespace: state.namespace.clone(),
            routing_url: state.routing_url.clone(),
            readme: state.readme.clone(),
            admission_webhook_url: state.admission_webhook_url.clone(),
            label_matchers: label_matcher::validate(&state.label_matchers)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Router token
// ---------------------------------------------------------------------------

/// Declared and tracked model of a router token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouterTokenState {
    pub name: String,
    pub graph_name: String,
    #[serde(default)]
    pub namespace: Namespace,
    /// Only known from the create response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<Sensitive>,
}

impl RouterTokenState {
    pub fn new(name: impl Into<String>, graph_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            graph_name: graph_name.into(),
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Monograph (read-only)
// ---------------------------------------------------------------------------

/// What an operator declares to look a monograph up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MonographLookup {
    pub name: String,
    #[serde(default)]
    pub namespace: Namespace,
}

/// A monograph as reported by the control plane.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonographState {
    pub id: ResourceId,
    pub name: String,
    pub namespace: Namespace,
    pub routing_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admission_webhook_url: Option<String>,
    #[serde(default)]
    pub label_matchers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub websocket_subprotocol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_protocol: Option<String>,
}

// ---------------------------------------------------------------------------
// Tagged model
// ---------------------------------------------------------------------------

/// Any managed resource model, tagged with its kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResourceModel {
    FederatedGraph(FederatedGraphState),
    RouterToken(RouterTokenState),
}

impl ResourceModel {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceModel::FederatedGraph(_) => ResourceKind::FederatedGraph,
            ResourceModel::RouterToken(_) => ResourceKind::RouterToken,
        }
    }

    /// The identifier lifecycle calls are keyed on: the assigned id for
    /// graphs, the token name for router tokens.
    pub fn identifier(&self) -> &str {
        match self {
            ResourceModel::FederatedGraph(graph) => graph.id_str(),
            ResourceModel::RouterToken(token) => &token.name,
        }
    }
}

impl From<FederatedGraphState> for ResourceModel {
    fn from(state: FederatedGraphState) -> Self {
        ResourceModel::FederatedGraph(state)
    }
}

impl From<RouterTokenState> for ResourceModel {
    fn from(state: RouterTokenState) -> Self {
        ResourceModel::RouterToken(state)
    }
}

/// A model was handed to a reconciler of a different kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected a {expected} model, got {found}")]
pub struct KindMismatch {
    pub expected: ResourceKind,
    pub found: ResourceKind,
}

impl TryFrom<ResourceModel> for FederatedGraphState {
    type Error = KindMismatch;

    fn try_from(model: ResourceModel) -> Result<Self, Self::Error> {
        match model {
            ResourceModel::FederatedGraph(state) => Ok(state),
            other => Err(KindMismatch {
                expected: ResourceKind::FederatedGraph,
                found: other.kind(),
            }),
        }
    }
}

impl TryFrom<ResourceModel> for RouterTokenState {
    type Error = KindMismatch;

    fn try_from(model: ResourceModel) -> Result<Self, Self::Error> {
        match model {
            ResourceModel::RouterToken(state) => Ok(state),
            other => Err(KindMismatch {
                expected: ResourceKind::RouterToken,
                found: other.kind(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespace_defaults_when_empty() {
        assert_eq!(Namespace::new("").as_str(), DEFAULT_NAMESPACE);
        assert_eq!(Namespace::new("  ").as_str(), DEFAULT_NAMESPACE);
        assert_eq!(Namespace::new("staging").as_str(), "staging");
    }

    #[test]
    fn namespace_defaults_when_absent_in_yaml() {
        let graph: FederatedGraphState =
            serde_yaml::from_str("name: orders\nrouting_url: http://svc/routing\n")
                .expect("deserialize");
        assert_eq!(graph.namespace.as_str(), "default");
        assert!(graph.label_matchers.is_empty());
        assert!(!graph.has_id());
    }

    #[test]
    fn sensitive_is_redacted_in_debug() {
        let secret = Sensitive::new("hunter2");
        assert!(!format!("{secret:?}").contains("hunter2"));
        assert!(!secret.to_string().contains("hunter2"));
        assert_eq!(secret.expose(), "hunter2");
    }

    #[test]
    fn address_parse_and_display() {
        let address: ResourceAddress = "federated_graph.orders".parse().expect("parse");
        assert_eq!(address.kind, ResourceKind::FederatedGraph);
        assert_eq!(address.key, "orders");
        assert_eq!(address.to_string(), "federated_graph.orders");
    }

    #[test]
    fn address_rejects_bad_shapes() {
        assert!("orders".parse::<ResourceAddress>().is_err());
        assert!("federated_graph.".parse::<ResourceAddress>().is_err());
        assert!("federated_graph.a.b".parse::<ResourceAddress>().is_err());
        assert!(matches!(
            "subgraph.orders".parse::<ResourceAddress>(),
            Err(ValidationError::UnknownKind { .. })
        ));
    }

    #[test]
    fn empty_id_is_not_an_id() {
        let mut graph = FederatedGraphState::new("orders", "http://svc/routing");
        graph.id = Some(ResourceId::from(""));
        assert!(!graph.has_id());
        graph.id = Some(ResourceId::from("fg-1"));
        assert!(graph.has_id());
    }

    #[test]
    fn default_monograph_sits_in_the_default_namespace() {
        let monograph = MonographState::default();
        assert_eq!(monograph.id, ResourceId::default());
        assert_eq!(monograph.namespace.as_str(), DEFAULT_NAMESPACE);
        assert!(monograph.label_matchers.is_empty());
    }

    #[test]
    fn definition_requires_routing_url() {
        let graph = FederatedGraphState::new("orders", "");
        let err = GraphDefinition::try_from(&graph).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingField {
                field: "routing_url"
            }
        );
    }

    #[test]
    fn model_conversion_checks_kind() {
        let model = ResourceModel::from(RouterTokenState::new("ci", "orders"));
        let err = FederatedGraphState::try_from(model).unwrap_err();
        assert_eq!(err.found, ResourceKind::RouterToken);
    }
}
