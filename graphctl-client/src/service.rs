//! The transport seam between the client adapter and the control plane.
//!
//! [`PlatformService`] is the generated-stub boundary: one async method per
//! RPC, taking and returning wire messages. A method returns `Ok(None)` when
//! the transport delivered no response message at all.

use async_trait::async_trait;
use thiserror::Error;

use crate::messages::{
    CreateFederatedGraphResponse, CreateTokenRequest, CreateTokenResponse,
    DeleteFederatedGraphResponse, DeleteTokenRequest, DeleteTokenResponse, FederatedGraphRequest,
    GetFederatedGraphResponse, GetMonographResponse, GraphByNameRequest,
    UpdateFederatedGraphResponse,
};

/// Result of a single RPC.
pub type RpcResult<T> = Result<Option<T>, TransportError>;

/// Failures below the status envelope: the call never produced a message.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("call was cancelled")]
    Cancelled,
}

#[async_trait]
pub trait PlatformService: Send + Sync {
    async fn create_federated_graph(
        &self,
        request: FederatedGraphRequest,
    ) -> RpcResult<CreateFederatedGraphResponse>;

    async fn get_federated_graph_by_name(
        &self,
        request: GraphByNameRequest,
    ) -> RpcResult<GetFederatedGraphResponse>;

    async fn update_federated_graph(
        &self,
        request: FederatedGraphRequest,
    ) -> RpcResult<UpdateFederatedGraphResponse>;

    async fn delete_federated_graph(
        &self,
        request: GraphByNameRequest,
    ) -> RpcResult<DeleteFederatedGraphResponse>;

    async fn get_monograph_by_name(
        &self,
        request: GraphByNameRequest,
    ) -> RpcResult<GetMonographResponse>;

    async fn create_federated_graph_token(
        &self,
        request: CreateTokenRequest,
    ) -> RpcResult<CreateTokenResponse>;

    async fn delete_router_token(
        &self,
        request: DeleteTokenRequest,
    ) -> RpcResult<DeleteTokenResponse>;
}
