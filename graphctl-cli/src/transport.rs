//! Connect-protocol JSON transport for the control plane.
//!
//! Every RPC is `POST {api_url}/wg.cosmo.platform.v1.PlatformService/<Method>`
//! with a JSON body. `ureq` is blocking, so each call runs on tokio's
//! blocking pool. Dropping the returned future does not stop the HTTP
//! request: it still completes, and only its result is discarded.

use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use graphctl_client::messages::{
    CreateFederatedGraphResponse, CreateTokenRequest, CreateTokenResponse,
    DeleteFederatedGraphResponse, DeleteTokenRequest, DeleteTokenResponse, FederatedGraphRequest,
    GetFederatedGraphResponse, GetMonographResponse, GraphByNameRequest,
    UpdateFederatedGraphResponse,
};
use graphctl_client::{PlatformService, RpcResult, TransportError};
use graphctl_core::Sensitive;

const SERVICE_PATH: &str = "wg.cosmo.platform.v1.PlatformService";
const TIMEOUT: Duration = Duration::from_secs(30);

pub struct HttpPlatform {
    agent: ureq::Agent,
    base_url: String,
    api_key: Sensitive,
}

impl HttpPlatform {
    pub fn new(api_url: &str, api_key: Sensitive) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(TIMEOUT).build(),
            base_url: api_url.trim_end_matches('/').to_owned(),
            api_key,
        }
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{SERVICE_PATH}/{method}", self.base_url)
    }

    async fn call<Req, Resp>(&self, method: &'static str, request: Req) -> RpcResult<Resp>
    where
        Req: Serialize + Send + 'static,
        Resp: DeserializeOwned + Send + 'static,
    {
        let agent = self.agent.clone();
        let url = self.url(method);
        let authorization = format!("Bearer {}", self.api_key.expose());
        tracing::debug!(method, "calling control plane");

        tokio::task::spawn_blocking(move || post(&agent, &url, &authorization, &request))
            .await
            .map_err(|e| {
                if e.is_cancelled() {
                    TransportError::Cancelled
                } else {
                    TransportError::Request(e.to_string())
                }
            })?
    }
}

/// One blocking round trip. An empty body is "no response message".
fn post<Req, Resp>(agent: &ureq::Agent, url: &str, authorization: &str, request: &Req) -> RpcResult<Resp>
where
    Req: Serialize,
    Resp: DeserializeOwned,
{
    let response = match agent
        .post(url)
        .set("Authorization", authorization)
        .set("Connect-Protocol-Version", "1")
        .set("Content-Type", "application/json")
        .send_json(request)
    {
        Ok(response) => response,
        Err(ureq::Error::Status(status, response)) => {
            let body = response.into_string().unwrap_or_default();
            return Err(TransportError::Http { status, body });
        }
        Err(e) => return Err(TransportError::Request(e.to_string())),
    };

    let body = response
        .into_string()
        .map_err(|e| TransportError::Decode(e.to_string()))?;
    if body.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(&body)
        .map(Some)
        .map_err(|e| TransportError::Decode(e.to_string()))
}

#[async_trait]
impl PlatformService for HttpPlatform {
    async fn create_federated_graph(
        &self,
        request: FederatedGraphRequest,
    ) -> RpcResult<CreateFederatedGraphResponse> {
        self.call("CreateFederatedGraph", request).await
    }

    async fn get_federated_graph_by_name(
        &self,
        request: GraphByNameRequest,
    ) -> RpcResult<GetFederatedGraphResponse> {
        self.call("GetFederatedGraphByName", request).await
    }

    async fn update_federated_graph(
        &self,
        request: FederatedGraphRequest,
    ) -> RpcResult<UpdateFederatedGraphResponse> {
        self.call("UpdateFederatedGraph", request).await
    }

    async fn delete_federated_graph(
        &self,
        request: GraphByNameRequest,
    ) -> RpcResult<DeleteFederatedGraphResponse> {
        self.call("DeleteFederatedGraph", request).await
    }

    // Monographs are served by the same by-name lookup as federated graphs.
    async fn get_monograph_by_name(
        &self,
        request: GraphByNameRequest,
    ) -> RpcResult<GetMonographResponse> {
        self.call("GetFederatedGraphByName", request).await
    }

    async fn create_federated_graph_token(
        &self,
        request: CreateTokenRequest,
    ) -> RpcResult<CreateTokenResponse> {
        self.call("CreateFederatedGraphToken", request).await
    }

    async fn delete_router_token(
        &self,
        request: DeleteTokenRequest,
    ) -> RpcResult<DeleteTokenResponse> {
        self.call("DeleteRouterToken", request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_urls_drop_trailing_slash() {
        let platform = HttpPlatform::new("https://cp.example.com/", Sensitive::new("k"));
        assert_eq!(
            platform.url("CreateFederatedGraph"),
            "https://cp.example.com/wg.cosmo.platform.v1.PlatformService/CreateFederatedGraph"
        );
    }
}
