//! Wire messages of the platform service.
//!
//! Field names follow the proto3 JSON mapping the control plane speaks
//! (`camelCase`, with the service's own spellings of `routingURL` and
//! `admissionWebhookURL`). Every response carries an optional status
//! envelope; a missing envelope is treated as a nil response.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Status codes the control plane reports in a response envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusCode {
    /// proto3 JSON omits zero values, so an envelope without `code` is `OK`.
    #[default]
    Ok,
    Err,
    ErrNotFound,
    ErrAlreadyExists,
    ErrInvalidSubgraphSchema,
    ErrSubgraphCompositionFailed,
    ErrSubgraphCheckFailed,
    ErrInvalidLabels,
    ErrorNotAuthenticated,
    ErrorNotAuthorized,
    ErrLimitReached,
    ErrDeploymentFailed,
    ErrInvalidName,
    ErrBadRequest,
    #[serde(other)]
    Unknown,
}

impl StatusCode {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::Err => "ERR",
            StatusCode::ErrNotFound => "ERR_NOT_FOUND",
            StatusCode::ErrAlreadyExists => "ERR_ALREADY_EXISTS",
            StatusCode::ErrInvalidSubgraphSchema => "ERR_INVALID_SUBGRAPH_SCHEMA",
            StatusCode::ErrSubgraphCompositionFailed => "ERR_SUBGRAPH_COMPOSITION_FAILED",
            StatusCode::ErrSubgraphCheckFailed => "ERR_SUBGRAPH_CHECK_FAILED",
            StatusCode::ErrInvalidLabels => "ERR_INVALID_LABELS",
            StatusCode::ErrorNotAuthenticated => "ERROR_NOT_AUTHENTICATED",
            StatusCode::ErrorNotAuthorized => "ERROR_NOT_AUTHORIZED",
            StatusCode::ErrLimitReached => "ERR_LIMIT_REACHED",
            StatusCode::ErrDeploymentFailed => "ERR_DEPLOYMENT_FAILED",
            StatusCode::ErrInvalidName => "ERR_INVALID_NAME",
            StatusCode::ErrBadRequest => "ERR_BAD_REQUEST",
            StatusCode::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `{code, details}` status envelope carried by every response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    #[serde(default)]
    pub code: StatusCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ResponseEnvelope {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn error(code: StatusCode, details: impl Into<String>) -> Self {
        Self {
            code,
            details: Some(details.into()),
        }
    }
}

/// Access to the status envelope of a response message.
pub trait Envelope {
    fn envelope(&self) -> Option<&ResponseEnvelope>;
}

macro_rules! impl_envelope {
    ($($ty:ty),+ $(,)?) => {
        $(impl Envelope for $ty {
            fn envelope(&self) -> Option<&ResponseEnvelope> {
                self.response.as_ref()
            }
        })+
    };
}

// ---------------------------------------------------------------------------
// Shared payloads
// ---------------------------------------------------------------------------

/// A federated graph as the control plane reports it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FederatedGraph {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default, rename = "routingURL")]
    pub routing_url: String,
    #[serde(default)]
    pub label_matchers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admission_webhook_url: Option<String>,
}

/// A monograph as the control plane reports it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Monograph {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default, rename = "routingURL")]
    pub routing_url: String,
    #[serde(default)]
    pub label_matchers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admission_webhook_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub websocket_subprotocol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_protocol: Option<String>,
}

/// One subgraph composition failure reported after a mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositionError {
    pub message: String,
    #[serde(default)]
    pub federated_graph_name: String,
    #[serde(default)]
    pub namespace: String,
}

impl fmt::Display for CompositionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (graph {}/{})",
            self.message, self.namespace, self.federated_graph_name
        )
    }
}

// ---------------------------------------------------------------------------
// Federated graph calls
// ---------------------------------------------------------------------------

/// Body of CreateFederatedGraph and UpdateFederatedGraph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FederatedGraphRequest {
    pub name: String,
    pub namespace: String,
    pub routing_url: String,
    pub label_matchers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readme: Option<String>,
    #[serde(
        default,
        rename = "admissionWebhookURL",
        skip_serializing_if = "Option::is_none"
    )]
    pub admission_webhook_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admission_webhook_secret: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFederatedGraphResponse {
    #[serde(default)]
    pub response: Option<ResponseEnvelope>,
    #[serde(default)]
    pub composition_errors: Vec<CompositionError>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFederatedGraphResponse {
    #[serde(default)]
    pub response: Option<ResponseEnvelope>,
    #[serde(default)]
    pub composition_errors: Vec<CompositionError>,
}

/// Body of GetFederatedGraphByName, DeleteFederatedGraph and the monograph lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphByNameRequest {
    pub name: String,
    pub namespace: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetFederatedGraphResponse {
    #[serde(default)]
    pub response: Option<ResponseEnvelope>,
    #[serde(default)]
    pub graph: Option<FederatedGraph>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteFederatedGraphResponse {
    #[serde(default)]
    pub response: Option<ResponseEnvelope>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetMonographResponse {
    #[serde(default)]
    pub response: Option<ResponseEnvelope>,
    #[serde(default)]
    pub graph: Option<Monograph>,
}

// ---------------------------------------------------------------------------
// Router token calls
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTokenRequest {
    pub token_name: String,
    pub graph_name: String,
    pub namespace: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTokenResponse {
    #[serde(default)]
    pub response: Option<ResponseEnvelope>,
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteTokenRequest {
    pub token_name: String,
    pub namespace: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteTokenResponse {
    #[serde(default)]
    pub response: Option<ResponseEnvelope>,
}

impl_envelope!(
    CreateFederatedGraphResponse,
    UpdateFederatedGraphResponse,
    GetFederatedGraphResponse,
    DeleteFederatedGraphResponse,
    GetMonographResponse,
    CreateTokenResponse,
    DeleteTokenResponse,
);
