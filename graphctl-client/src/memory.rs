//! In-memory control plane for tests.
//!
//! Behaves like the real service for the calls graphctl makes: graphs are
//! keyed by `(namespace, name)`, ids are assigned as `fg-0001`, `fg-0002`…,
//! and tokens must reference an existing graph. Faults can be queued per RPC
//! with [`InMemoryPlatform::fail_next`]; every call is recorded, so tests can
//! assert that an operation made zero remote calls.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::messages::{
    CompositionError, CreateFederatedGraphResponse, CreateTokenRequest, CreateTokenResponse,
    DeleteFederatedGraphResponse, DeleteTokenRequest, DeleteTokenResponse, FederatedGraph,
    FederatedGraphRequest, GetFederatedGraphResponse, GetMonographResponse, GraphByNameRequest,
    Monograph, ResponseEnvelope, StatusCode, UpdateFederatedGraphResponse,
};
use crate::service::{PlatformService, RpcResult, TransportError};

/// The RPCs of [`PlatformService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rpc {
    CreateFederatedGraph,
    GetFederatedGraphByName,
    UpdateFederatedGraph,
    DeleteFederatedGraph,
    GetMonographByName,
    CreateFederatedGraphToken,
    DeleteRouterToken,
}

/// A scripted misbehaviour for the next call of one RPC.
#[derive(Debug, Clone)]
pub enum Fault {
    /// Answer with this status. `ERR_SUBGRAPH_COMPOSITION_FAILED` still
    /// applies the mutation, like the real control plane, and lists the
    /// details as the single composition error.
    Status(StatusCode, String),
    /// Fail below the envelope.
    Transport,
    /// Deliver no response message.
    NilResponse,
    /// Deliver a message without a status envelope.
    NilEnvelope,
    /// Apply the mutation and answer `OK` with these composition errors.
    CompositionErrors(Vec<String>),
}

#[derive(Debug, Clone)]
struct StoredGraph {
    graph: FederatedGraph,
    webhook_secret: Option<String>,
}

#[derive(Debug, Clone)]
struct StoredToken {
    graph_name: String,
    value: String,
}

#[derive(Debug, Default)]
struct Inner {
    graphs: BTreeMap<(String, String), StoredGraph>,
    monographs: BTreeMap<(String, String), Monograph>,
    tokens: BTreeMap<(String, String), StoredToken>,
    faults: HashMap<Rpc, VecDeque<Fault>>,
    calls: Vec<Rpc>,
    next_graph: u32,
    next_token: u32,
}

#[derive(Debug, Default)]
pub struct InMemoryPlatform {
    inner: Mutex<Inner>,
}

/// Envelope and composition errors of a call that goes ahead.
struct Proceed {
    envelope: ResponseEnvelope,
    composition_errors: Vec<String>,
}

/// Response messages that can be built from an envelope alone.
trait Reply: Default {
    fn with_envelope(envelope: Option<ResponseEnvelope>) -> Self;
}

macro_rules! impl_reply {
    ($($ty:ty),+ $(,)?) => {
        $(impl Reply for $ty {
            fn with_envelope(envelope: Option<ResponseEnvelope>) -> Self {
                Self {
                    response: envelope,
                    ..Self::default()
                }
            }
        })+
    };
}

impl_reply!(
    CreateFederatedGraphResponse,
    UpdateFederatedGraphResponse,
    GetFederatedGraphResponse,
    DeleteFederatedGraphResponse,
    GetMonographResponse,
    CreateTokenResponse,
    DeleteTokenResponse,
);

fn status<R: Reply>(code: StatusCode, details: impl Into<String>) -> RpcResult<R> {
    Ok(Some(R::with_envelope(Some(ResponseEnvelope::error(code, details)))))
}

fn key(namespace: &str, name: &str) -> (String, String) {
    (namespace.to_owned(), name.to_owned())
}

fn composition_errors(messages: Vec<String>, name: &str, namespace: &str) -> Vec<CompositionError> {
    messages
        .into_iter()
        .map(|message| CompositionError {
            message,
            federated_graph_name: name.to_owned(),
            namespace: namespace.to_owned(),
        })
        .collect()
}

impl InMemoryPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue `fault` for the next call of `rpc`.
    pub fn fail_next(&self, rpc: Rpc, fault: Fault) {
        self.lock().faults.entry(rpc).or_default().push_back(fault);
    }

    /// Every RPC received so far, in order.
    pub fn calls(&self) -> Vec<Rpc> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    pub fn graph(&self, name: &str, namespace: &str) -> Option<FederatedGraph> {
        self.lock()
            .graphs
            .get(&key(namespace, name))
            .map(|stored| stored.graph.clone())
    }

    pub fn webhook_secret(&self, name: &str, namespace: &str) -> Option<String> {
        self.lock()
            .graphs
            .get(&key(namespace, name))
            .and_then(|stored| stored.webhook_secret.clone())
    }

    /// Delete a graph behind graphctl's back.
    pub fn remove_graph(&self, name: &str, namespace: &str) -> Option<FederatedGraph> {
        self.lock()
            .graphs
            .remove(&key(namespace, name))
            .map(|stored| stored.graph)
    }

    /// Store a graph directly, assigning an id when it has none. Returns the id.
    pub fn seed_graph(&self, mut graph: FederatedGraph) -> String {
        let mut inner = self.lock();
        if graph.id.is_empty() {
            graph.id = inner.assign_graph_id();
        }
        let id = graph.id.clone();
        inner.graphs.insert(
            key(&graph.namespace, &graph.name),
            StoredGraph {
                graph,
                webhook_secret: None,
            },
        );
        id
    }

    pub fn insert_monograph(&self, monograph: Monograph) {
        self.lock()
            .monographs
            .insert(key(&monograph.namespace, &monograph.name), monograph);
    }

    /// `(graph name, token value)` of a stored token.
    pub fn token(&self, token_name: &str, namespace: &str) -> Option<(String, String)> {
        self.lock()
            .tokens
            .get(&key(namespace, token_name))
            .map(|t| (t.graph_name.clone(), t.value.clone()))
    }

    /// Record the call and resolve any queued fault. `Err` carries the
    /// reply to return without touching state.
    fn begin<R: Reply>(&self, rpc: Rpc) -> Result<Proceed, RpcResult<R>> {
        let fault = {
            let mut inner = self.lock();
            inner.calls.push(rpc);
            inner.faults.get_mut(&rpc).and_then(VecDeque::pop_front)
        };
        match fault {
            None => Ok(Proceed {
                envelope: ResponseEnvelope::ok(),
                composition_errors: Vec::new(),
            }),
            Some(Fault::Transport) => Err(Err(TransportError::Request(format!(
                "connection reset during {rpc:?}"
            )))),
            Some(Fault::NilResponse) => Err(Ok(None)),
            Some(Fault::NilEnvelope) => Err(Ok(Some(R::with_envelope(None)))),
            Some(Fault::Status(StatusCode::ErrSubgraphCompositionFailed, details)) => Ok(Proceed {
                envelope: ResponseEnvelope::error(
                    StatusCode::ErrSubgraphCompositionFailed,
                    details.clone(),
                ),
                composition_errors: vec![details],
            }),
            Some(Fault::Status(code, details)) => Err(status(code, details)),
            Some(Fault::CompositionErrors(messages)) => Ok(Proceed {
                envelope: ResponseEnvelope::ok(),
                composition_errors: messages,
            }),
        }
    }
}

impl Inner {
    fn assign_graph_id(&mut self) -> String {
        self.next_graph += 1;
        format!("fg-{:04}", self.next_graph)
    }
}

#[async_trait]
impl PlatformService for InMemoryPlatform {
    async fn create_federated_graph(
        &self,
        request: FederatedGraphRequest,
    ) -> RpcResult<CreateFederatedGraphResponse> {
        let proceed = match self.begin(Rpc::CreateFederatedGraph) {
            Ok(p) => p,
            Err(early) => return early,
        };
        let mut inner = self.lock();
        let k = key(&request.namespace, &request.name);
        if inner.graphs.contains_key(&k) {
            return status(
                StatusCode::ErrAlreadyExists,
                format!("federated graph '{}' already exists", request.name),
            );
        }
        let id = inner.assign_graph_id();
        let errors = composition_errors(proceed.composition_errors, &request.name, &request.namespace);
        inner.graphs.insert(
            k,
            StoredGraph {
                graph: FederatedGraph {
                    id,
                    name: request.name,
                    namespace: request.namespace,
                    routing_url: request.routing_url,
                    label_matchers: request.label_matchers,
                    readme: request.readme,
                    admission_webhook_url: request.admission_webhook_url,
                },
                webhook_secret: request.admission_webhook_secret,
            },
        );
        Ok(Some(CreateFederatedGraphResponse {
            response: Some(proceed.envelope),
            composition_errors: errors,
        }))
    }

    async fn get_federated_graph_by_name(
        &self,
        request: GraphByNameRequest,
    ) -> RpcResult<GetFederatedGraphResponse> {
        let proceed = match self.begin(Rpc::GetFederatedGraphByName) {
            Ok(p) => p,
            Err(early) => return early,
        };
        match self.graph(&request.name, &request.namespace) {
            Some(graph) => Ok(Some(GetFederatedGraphResponse {
                response: Some(proceed.envelope),
                graph: Some(graph),
            })),
            None => status(
                StatusCode::ErrNotFound,
                format!("federated graph '{}' not found", request.name),
            ),
        }
    }

    async fn update_federated_graph(
        &self,
        request: FederatedGraphRequest,
    ) -> RpcResult<UpdateFederatedGraphResponse> {
        let proceed = match self.begin(Rpc::UpdateFederatedGraph) {
            Ok(p) => p,
            Err(early) => return early,
        };
        let mut inner = self.lock();
        let Some(stored) = inner.graphs.get_mut(&key(&request.namespace, &request.name)) else {
            return status(
                StatusCode::ErrNotFound,
                format!("federated graph '{}' not found", request.name),
            );
        };
        stored.graph.routing_url = request.routing_url;
        stored.graph.label_matchers = request.label_matchers;
        stored.graph.readme = request.readme;
        stored.graph.admission_webhook_url = request.admission_webhook_url;
        if request.admission_webhook_secret.is_some() {
            stored.webhook_secret = request.admission_webhook_secret;
        }
        Ok(Some(UpdateFederatedGraphResponse {
            response: Some(proceed.envelope),
            composition_errors: composition_errors(
                proceed.composition_errors,
                &request.name,
                &request.namespace,
            ),
        }))
    }

    async fn delete_federated_graph(
        &self,
        request: GraphByNameRequest,
    ) -> RpcResult<DeleteFederatedGraphResponse> {
        let proceed = match self.begin(Rpc::DeleteFederatedGraph) {
            Ok(p) => p,
            Err(early) => return early,
        };
        if self.remove_graph(&request.name, &request.namespace).is_none() {
            return status(
                StatusCode::ErrNotFound,
                format!("federated graph '{}' not found", request.name),
            );
        }
        Ok(Some(DeleteFederatedGraphResponse {
            response: Some(proceed.envelope),
        }))
    }

    async fn get_monograph_by_name(
        &self,
        request: GraphByNameRequest,
    ) -> RpcResult<GetMonographResponse> {
        let proceed = match self.begin(Rpc::GetMonographByName) {
            Ok(p) => p,
            Err(early) => return early,
        };
        let found = self
            .lock()
            .monographs
            .get(&key(&request.namespace, &request.name))
            .cloned();
        match found {
            Some(graph) => Ok(Some(GetMonographResponse {
                response: Some(proceed.envelope),
                graph: Some(graph),
            })),
            None => status(
                StatusCode::ErrNotFound,
                format!("monograph '{}' not found", request.name),
            ),
        }
    }

    async fn create_federated_graph_token(
        &self,
        request: CreateTokenRequest,
    ) -> RpcResult<CreateTokenResponse> {
        let proceed = match self.begin(Rpc::CreateFederatedGraphToken) {
            Ok(p) => p,
            Err(early) => return early,
        };
        let mut inner = self.lock();
        if !inner
            .graphs
            .contains_key(&key(&request.namespace, &request.graph_name))
        {
            return status(
                StatusCode::ErrNotFound,
                format!("federated graph '{}' not found", request.graph_name),
            );
        }
        let k = key(&request.namespace, &request.token_name);
        if inner.tokens.contains_key(&k) {
            return status(
                StatusCode::ErrAlreadyExists,
                format!("router token '{}' already exists", request.token_name),
            );
        }
        inner.next_token += 1;
        let value = format!("rt-{}-{:04}", request.token_name, inner.next_token);
        inner.tokens.insert(
            k,
            StoredToken {
                graph_name: request.graph_name,
                value: value.clone(),
            },
        );
        Ok(Some(CreateTokenResponse {
            response: Some(proceed.envelope),
            token: value,
        }))
    }

    async fn delete_router_token(
        &self,
        request: DeleteTokenRequest,
    ) -> RpcResult<DeleteTokenResponse> {
        let proceed = match self.begin(Rpc::DeleteRouterToken) {
            Ok(p) => p,
            Err(early) => return early,
        };
        let removed = self
            .lock()
            .tokens
            .remove(&key(&request.namespace, &request.token_name));
        if removed.is_none() {
            return status(
                StatusCode::ErrNotFound,
                format!("router token '{}' not found", request.token_name),
            );
        }
        Ok(Some(DeleteTokenResponse {
            response: Some(proceed.envelope),
        }))
    }
}
