//! Domain-level adapter over [`PlatformService`].
//!
//! Each method makes exactly one RPC and classifies the reply:
//! - transport failure, missing message or missing envelope → generic error
//! - `OK` → success
//! - composition failure on create/update → success with `degraded` set
//! - not-found on a read → [`ApiErrorKind::NotFound`](crate::ApiErrorKind)
//! - anything else → generic error carrying the status and details

use std::fmt;
use std::sync::Arc;

use graphctl_core::{
    label_matcher, GraphDefinition, MonographState, Namespace, ResourceId, Sensitive,
};

use crate::error::{ApiError, Operation};
use crate::messages::{
    CompositionError, CreateTokenRequest, DeleteTokenRequest, Envelope, FederatedGraph,
    FederatedGraphRequest, GraphByNameRequest, Monograph, StatusCode,
};
use crate::service::{PlatformService, RpcResult};

/// A mutation the control plane accepted, possibly in a degraded condition.
#[derive(Debug)]
pub struct Applied<T> {
    pub response: T,
    /// Set when the mutation was applied but composition failed.
    pub degraded: Option<ApiError>,
}

impl<T> Applied<T> {
    fn map<U>(self, f: impl FnOnce(T) -> U) -> Applied<U> {
        Applied {
            response: f(self.response),
            degraded: self.degraded,
        }
    }
}

/// Shared handle to the control plane. Cloning is cheap.
#[derive(Clone)]
pub struct PlatformClient {
    service: Arc<dyn PlatformService>,
}

impl fmt::Debug for PlatformClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformClient").finish_non_exhaustive()
    }
}

impl PlatformClient {
    pub fn new(service: Arc<dyn PlatformService>) -> Self {
        Self { service }
    }

    // -----------------------------------------------------------------------
    // 1. Federated graphs
    // -----------------------------------------------------------------------

    pub async fn create_federated_graph(
        &self,
        graph: &GraphDefinition,
        webhook_secret: Option<&Sensitive>,
    ) -> Result<Applied<Vec<CompositionError>>, ApiError> {
        let op = Operation::CreateGraph;
        tracing::debug!(name = %graph.name, namespace = %graph.namespace, "creating federated graph");
        let reply = self
            .service
            .create_federated_graph(graph_request(graph, webhook_secret))
            .await;
        Ok(classify(op, reply)?.map(|r| r.composition_errors))
    }

    pub async fn get_federated_graph(
        &self,
        name: &str,
        namespace: &Namespace,
    ) -> Result<FederatedGraph, ApiError> {
        let op = Operation::ReadGraph;
        tracing::debug!(name, %namespace, "reading federated graph");
        let reply = self
            .service
            .get_federated_graph_by_name(by_name(name, namespace))
            .await;
        classify(op, reply)?
            .response
            .graph
            .ok_or_else(|| ApiError::missing_payload(op, "graph"))
    }

    pub async fn update_federated_graph(
        &self,
        graph: &GraphDefinition,
        webhook_secret: Option<&Sensitive>,
    ) -> Result<Applied<Vec<CompositionError>>, ApiError> {
        let op = Operation::UpdateGraph;
        tracing::debug!(name = %graph.name, namespace = %graph.namespace, "updating federated graph");
        let reply = self
            .service
            .update_federated_graph(graph_request(graph, webhook_secret))
            .await;
        Ok(classify(op, reply)?.map(|r| r.composition_errors))
    }

    pub async fn delete_federated_graph(
        &self,
        name: &str,
        namespace: &Namespace,
    ) -> Result<(), ApiError> {
        let op = Operation::DeleteGraph;
        tracing::debug!(name, %namespace, "deleting federated graph");
        let reply = self
            .service
            .delete_federated_graph(by_name(name, namespace))
            .await;
        classify(op, reply).map(|_| ())
    }

    // -----------------------------------------------------------------------
    // 2. Monographs
    // -----------------------------------------------------------------------

    pub async fn get_monograph(
        &self,
        name: &str,
        namespace: &Namespace,
    ) -> Result<MonographState, ApiError> {
        let op = Operation::ReadMonograph;
        tracing::debug!(name, %namespace, "reading monograph");
        let reply = self.service.get_monograph_by_name(by_name(name, namespace)).await;
        classify(op, reply)?
            .response
            .graph
            .map(monograph_state)
            .ok_or_else(|| ApiError::missing_payload(op, "monograph"))
    }

    // -----------------------------------------------------------------------
    // 3. Router tokens
    // -----------------------------------------------------------------------

    pub async fn create_token(
        &self,
        token_name: &str,
        graph_name: &str,
        namespace: &Namespace,
    ) -> Result<Sensitive, ApiError> {
        let op = Operation::CreateToken;
        tracing::debug!(token_name, graph_name, %namespace, "creating router token");
        let reply = self
            .service
            .create_federated_graph_token(CreateTokenRequest {
                token_name: token_name.to_owned(),
                graph_name: graph_name.to_owned(),
                namespace: namespace.to_string(),
            })
            .await;
        let token = classify(op, reply)?.response.token;
        if token.is_empty() {
            return Err(ApiError::missing_payload(op, "token"));
        }
        Ok(Sensitive::new(token))
    }

    pub async fn delete_token(&self, token_name: &str, namespace: &Namespace) -> Result<(), ApiError> {
        let op = Operation::DeleteToken;
        tracing::debug!(token_name, %namespace, "deleting router token");
        let reply = self
            .service
            .delete_router_token(DeleteTokenRequest {
                token_name: token_name.to_owned(),
                namespace: namespace.to_string(),
            })
            .await;
        classify(op, reply).map(|_| ())
    }
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn classify<R: Envelope>(op: Operation, reply: RpcResult<R>) -> Result<Applied<R>, ApiError> {
    let message = match reply {
        Err(e) => return Err(ApiError::transport(op, e)),
        Ok(None) => return Err(ApiError::nil_response(op)),
        Ok(Some(message)) => message,
    };
    let (code, details) = match message.envelope() {
        None => return Err(ApiError::nil_response(op)),
        Some(envelope) => (envelope.code, envelope.details.clone()),
    };
    if code == StatusCode::Ok {
        return Ok(Applied {
            response: message,
            degraded: None,
        });
    }
    let err = ApiError::from_status(op, code, details);
    if err.is_composition_failed() {
        Ok(Applied {
            response: message,
            degraded: Some(err),
        })
    } else {
        Err(err)
    }
}

fn graph_request(graph: &GraphDefinition, webhook_secret: Option<&Sensitive>) -> FederatedGraphRequest {
    FederatedGraphRequest {
        name: graph.name.clone(),
        namespace: graph.namespace.to_string(),
        routing_url: graph.routing_url.clone(),
        label_matchers: label_matcher::to_strings(&graph.label_matchers),
        readme: graph.readme.clone(),
        admission_webhook_url: graph.admission_webhook_url.clone(),
        admission_webhook_secret: webhook_secret.map(|s| s.expose().to_owned()),
    }
}

fn by_name(name: &str, namespace: &Namespace) -> GraphByNameRequest {
    GraphByNameRequest {
        name: name.to_owned(),
        namespace: namespace.to_string(),
    }
}

fn monograph_state(wire: Monograph) -> MonographState {
    MonographState {
        id: ResourceId::from(wire.id),
        name: wire.name,
        namespace: Namespace::new(wire.namespace),
        routing_url: wire.routing_url,
        readme: wire.readme,
        admission_webhook_url: wire.admission_webhook_url,
        label_matchers: wire.label_matchers,
        websocket_subprotocol: wire.websocket_subprotocol,
        subscription_protocol: wire.subscription_protocol,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiErrorKind;
    use crate::memory::{Fault, InMemoryPlatform, Rpc};
    use crate::service::TransportError;
    use graphctl_core::FederatedGraphState;

    fn setup() -> (Arc<InMemoryPlatform>, PlatformClient) {
        let platform = Arc::new(InMemoryPlatform::new());
        let client = PlatformClient::new(platform.clone());
        (platform, client)
    }

    fn orders() -> GraphDefinition {
        let mut state = FederatedGraphState::new("orders", "http://svc/routing");
        state.label_matchers = vec!["team=payments".to_string(), "env=prod".to_string()];
        GraphDefinition::try_from(&state).expect("valid definition")
    }

    fn default_ns() -> Namespace {
        Namespace::default()
    }

    #[tokio::test]
    async fn create_then_get_returns_assigned_id() {
        let (platform, client) = setup();
        let applied = client
            .create_federated_graph(&orders(), Some(&Sensitive::new("hook-secret")))
            .await
            .expect("create");
        assert!(applied.degraded.is_none());
        assert!(applied.response.is_empty());

        let graph = client
            .get_federated_graph("orders", &default_ns())
            .await
            .expect("get");
        assert_eq!(graph.id, "fg-0001");
        assert_eq!(graph.label_matchers, vec!["team=payments", "env=prod"]);
        assert_eq!(
            platform.webhook_secret("orders", "default").as_deref(),
            Some("hook-secret")
        );
    }

    #[tokio::test]
    async fn composition_failure_is_degraded_success() {
        let (platform, client) = setup();
        platform.fail_next(
            Rpc::CreateFederatedGraph,
            Fault::Status(StatusCode::ErrSubgraphCompositionFailed, "conflict".to_string()),
        );
        let applied = client
            .create_federated_graph(&orders(), None)
            .await
            .expect("degraded create is still a success");
        let degraded = applied.degraded.expect("degraded");
        assert!(degraded.is_composition_failed());
        assert_eq!(degraded.reason, Operation::CreateGraph);
        assert_eq!(applied.response.len(), 1);
        assert!(platform.graph("orders", "default").is_some());
    }

    #[tokio::test]
    async fn missing_graph_is_not_found() {
        let (_platform, client) = setup();
        let err = client
            .get_federated_graph("orders", &default_ns())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.status, StatusCode::ErrNotFound);
    }

    #[tokio::test]
    async fn not_found_on_delete_is_generic() {
        let (_platform, client) = setup();
        let err = client
            .delete_federated_graph("orders", &default_ns())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::Generic);
        assert_eq!(err.reason, Operation::DeleteGraph);
    }

    #[tokio::test]
    async fn nil_response_and_nil_envelope_are_hard_failures() {
        let (platform, client) = setup();
        platform.fail_next(Rpc::DeleteRouterToken, Fault::NilResponse);
        platform.fail_next(Rpc::DeleteRouterToken, Fault::NilEnvelope);

        for _ in 0..2 {
            let err = client
                .delete_token("ci", &default_ns())
                .await
                .unwrap_err();
            assert_eq!(err.kind, ApiErrorKind::Generic);
            assert_eq!(err.message, "the server response is nil");
        }
        assert_eq!(platform.call_count(), 2);
    }

    #[tokio::test]
    async fn transport_failure_keeps_cause() {
        let (platform, client) = setup();
        platform.fail_next(Rpc::GetFederatedGraphByName, Fault::Transport);
        let err = client
            .get_federated_graph("orders", &default_ns())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::Generic);
        assert!(matches!(err.source, Some(TransportError::Request(_))));
    }

    #[tokio::test]
    async fn update_reports_composition_errors_list() {
        let (platform, client) = setup();
        client
            .create_federated_graph(&orders(), None)
            .await
            .expect("create");
        platform.fail_next(
            Rpc::UpdateFederatedGraph,
            Fault::CompositionErrors(vec!["type Order defined twice".to_string()]),
        );
        let applied = client
            .update_federated_graph(&orders(), None)
            .await
            .expect("update");
        assert!(applied.degraded.is_none());
        assert_eq!(applied.response.len(), 1);
        assert_eq!(applied.response[0].federated_graph_name, "orders");
    }

    #[tokio::test]
    async fn token_lifecycle() {
        let (platform, client) = setup();
        client
            .create_federated_graph(&orders(), None)
            .await
            .expect("create graph");
        let token = client
            .create_token("ci", "orders", &default_ns())
            .await
            .expect("create token");
        assert!(!token.expose().is_empty());
        assert_eq!(
            platform.token("ci", "default"),
            Some(("orders".to_string(), token.expose().to_string()))
        );

        client.delete_token("ci", &default_ns()).await.expect("delete");
        assert!(platform.token("ci", "default").is_none());
    }

    #[tokio::test]
    async fn monograph_lookup_maps_wire_fields() {
        let (platform, client) = setup();
        platform.insert_monograph(Monograph {
            id: "mg-1".to_string(),
            name: "legacy".to_string(),
            namespace: "default".to_string(),
            routing_url: "http://legacy/graphql".to_string(),
            websocket_subprotocol: Some("graphql-ws".to_string()),
            ..Monograph::default()
        });
        let mono = client
            .get_monograph("legacy", &default_ns())
            .await
            .expect("lookup");
        assert_eq!(mono.id.0, "mg-1");
        assert_eq!(mono.routing_url, "http://legacy/graphql");
        assert_eq!(mono.websocket_subprotocol.as_deref(), Some("graphql-ws"));
    }
}
