//! Lifecycle tests for the federated graph reconciler against the in-memory
//! control plane.

use std::sync::Arc;

use graphctl_client::memory::{Fault, InMemoryPlatform, Rpc};
use graphctl_client::{PlatformClient, StatusCode};
use graphctl_core::{FederatedGraphState, Namespace, ResourceId, Sensitive};
use graphctl_reconcile::{ErrorClass, FederatedGraphResource, ReconcileOutcome, Resource};

fn setup() -> (Arc<InMemoryPlatform>, FederatedGraphResource) {
    let platform = Arc::new(InMemoryPlatform::new());
    let resource = FederatedGraphResource::configure(PlatformClient::new(platform.clone()));
    (platform, resource)
}

fn orders() -> FederatedGraphState {
    FederatedGraphState::new("orders", "http://svc/routing")
}

async fn created(
    resource: &FederatedGraphResource,
    planned: FederatedGraphState,
) -> FederatedGraphState {
    resource
        .create(planned)
        .await
        .into_model()
        .expect("create should succeed")
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_then_read_returns_created_identity() {
    let (_platform, resource) = setup();
    let state = created(&resource, orders()).await;
    assert!(state.has_id());

    let read = resource
        .read(state.clone())
        .await
        .into_model()
        .flatten()
        .expect("read should find the graph");
    assert_eq!(read.id, state.id);
    assert_eq!(read.name, "orders");
    assert_eq!(read.namespace, state.namespace);
    assert_eq!(read.routing_url, "http://svc/routing");
}

#[tokio::test]
async fn composition_failure_on_create_still_manages_the_graph() {
    let (platform, resource) = setup();
    platform.fail_next(
        Rpc::CreateFederatedGraph,
        Fault::Status(
            StatusCode::ErrSubgraphCompositionFailed,
            "field Order.id has conflicting types".to_string(),
        ),
    );

    let outcome = resource.create(orders()).await;
    let (state, warnings) = match outcome {
        ReconcileOutcome::SuccessWithWarnings(state, warnings) => (state, warnings),
        other => panic!("expected a warning outcome, got {other:?}"),
    };
    assert!(state.has_id());
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].class, ErrorClass::CompositionFailed);
    assert_eq!(
        platform.calls(),
        vec![Rpc::CreateFederatedGraph, Rpc::GetFederatedGraphByName]
    );
}

#[tokio::test]
async fn hard_failure_on_create_persists_nothing() {
    let (platform, resource) = setup();
    platform.fail_next(
        Rpc::CreateFederatedGraph,
        Fault::Status(StatusCode::ErrorNotAuthorized, "no access".to_string()),
    );

    let outcome = resource.create(orders()).await;
    let err = outcome.error().expect("error");
    assert_eq!(err.class, ErrorClass::Api);
    assert!(outcome.model().is_none());
    assert_eq!(platform.calls(), vec![Rpc::CreateFederatedGraph]);
}

#[tokio::test]
async fn malformed_label_matcher_is_rejected_before_any_call() {
    let (platform, resource) = setup();
    let mut planned = orders();
    planned.label_matchers = vec!["team=payments".to_string(), "env".to_string()];

    let outcome = resource.create(planned).await;
    let err = outcome.error().expect("error");
    assert_eq!(err.class, ErrorClass::Validation);
    assert!(err.to_string().contains("'env'"), "got: {err}");
    assert_eq!(platform.call_count(), 0);
}

#[tokio::test]
async fn empty_namespace_defaults_through_create_and_read() {
    let (platform, resource) = setup();
    let mut planned = orders();
    planned.namespace = Namespace::new("");

    let state = created(&resource, planned).await;
    assert_eq!(state.namespace.as_str(), "default");
    assert!(platform.graph("orders", "default").is_some());

    let read = resource.read(state).await.into_model().flatten().expect("read");
    assert_eq!(read.namespace.as_str(), "default");
}

#[tokio::test]
async fn webhook_secret_is_sent_but_never_read_back() {
    let (platform, resource) = setup();
    let mut planned = orders();
    planned.admission_webhook_secret = Some(Sensitive::new("hook-secret"));
    planned.readme = Some("Orders graph".to_string());

    let state = created(&resource, planned).await;
    assert_eq!(
        platform.webhook_secret("orders", "default").as_deref(),
        Some("hook-secret")
    );

    let read = resource.read(state).await.into_model().flatten().expect("read");
    assert_eq!(
        read.admission_webhook_secret.as_ref().map(Sensitive::expose),
        Some("hook-secret")
    );
    assert_eq!(read.readme.as_deref(), Some("Orders graph"));
}

// ---------------------------------------------------------------------------
// Read
// ---------------------------------------------------------------------------

#[tokio::test]
async fn not_found_read_drops_the_graph_with_one_warning() {
    let (platform, resource) = setup();
    let state = created(&resource, orders()).await;
    platform.remove_graph("orders", "default");

    let outcome = resource.read(state).await;
    assert!(!outcome.is_failure());
    assert_eq!(outcome.warnings().len(), 1);
    assert_eq!(outcome.warnings()[0].class, ErrorClass::NotFound);
    assert!(outcome.warnings()[0]
        .to_string()
        .contains("Graph 'orders' not found will be recreated"));
    assert_eq!(outcome.into_model(), Some(None));
}

#[tokio::test]
async fn read_overwrites_remote_owned_fields() {
    let (platform, resource) = setup();
    let state = created(&resource, orders()).await;

    let mut remote = platform.graph("orders", "default").expect("graph");
    remote.routing_url = "http://moved/routing".to_string();
    remote.label_matchers = vec!["team=core".to_string()];
    platform.seed_graph(remote);

    let read = resource.read(state).await.into_model().flatten().expect("read");
    assert_eq!(read.routing_url, "http://moved/routing");
    assert_eq!(read.label_matchers, vec!["team=core"]);
}

#[tokio::test]
async fn read_failure_other_than_not_found_is_fatal() {
    let (platform, resource) = setup();
    let state = created(&resource, orders()).await;
    platform.fail_next(Rpc::GetFederatedGraphByName, Fault::Transport);

    let outcome = resource.read(state).await;
    assert_eq!(outcome.error().map(|d| d.class), Some(ErrorClass::Api));
}

// ---------------------------------------------------------------------------
// Missing identifier
// ---------------------------------------------------------------------------

#[tokio::test]
async fn lifecycle_calls_without_id_fail_without_remote_calls() {
    let (platform, resource) = setup();
    let mut no_id = orders();
    no_id.id = Some(ResourceId::from(""));

    let read = resource.read(no_id.clone()).await;
    let update = resource.update(orders(), &no_id).await;
    let delete = resource.delete(&no_id).await;

    assert_eq!(read.error().map(|d| d.class), Some(ErrorClass::CallerContract));
    assert_eq!(update.error().map(|d| d.class), Some(ErrorClass::CallerContract));
    assert!(update.error().is_some_and(|d| d.summary.contains("resource ID is missing")));
    assert_eq!(delete.error().map(|d| d.class), Some(ErrorClass::CallerContract));
    assert_eq!(platform.call_count(), 0);
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

#[tokio::test]
async fn updated_label_matchers_read_back_in_order() {
    let (_platform, resource) = setup();
    let prior = created(&resource, orders()).await;
    let mut planned = prior.clone();
    planned.label_matchers = vec!["team=payments".to_string(), "env=prod".to_string()];

    let updated = resource
        .update(planned, &prior)
        .await
        .into_model()
        .expect("update");
    assert_eq!(updated.id, prior.id);

    let read = resource.read(updated).await.into_model().flatten().expect("read");
    assert_eq!(read.label_matchers, vec!["team=payments", "env=prod"]);
}

#[tokio::test]
async fn composition_failed_update_with_error_list_takes_the_plan() {
    let (platform, resource) = setup();
    let prior = created(&resource, orders()).await;
    platform.fail_next(
        Rpc::UpdateFederatedGraph,
        Fault::Status(StatusCode::ErrSubgraphCompositionFailed, "conflict".to_string()),
    );
    let mut planned = prior.clone();
    planned.routing_url = "http://svc/v2".to_string();

    let outcome = resource.update(planned, &prior).await;
    assert_eq!(outcome.warnings().len(), 2);
    assert!(outcome
        .warnings()
        .iter()
        .all(|w| w.class == ErrorClass::CompositionFailed));
    assert_eq!(
        outcome.model().map(|s| s.routing_url.as_str()),
        Some("http://svc/v2")
    );
    assert_eq!(outcome.model().map(|s| &s.id), Some(&prior.id));
}

#[tokio::test]
async fn composition_errors_list_records_the_applied_update() {
    let (platform, resource) = setup();
    let prior = created(&resource, orders()).await;
    platform.fail_next(
        Rpc::UpdateFederatedGraph,
        Fault::CompositionErrors(vec!["type Order defined twice".to_string()]),
    );
    let mut planned = prior.clone();
    planned.routing_url = "http://svc/v2".to_string();

    let outcome = resource.update(planned, &prior).await;
    assert_eq!(outcome.warnings().len(), 1);
    assert!(outcome.warnings()[0]
        .to_string()
        .contains("type Order defined twice"));
    assert_eq!(
        platform.graph("orders", "default").map(|g| g.routing_url),
        Some("http://svc/v2".to_string())
    );
    assert_eq!(
        outcome.model().map(|s| s.routing_url.as_str()),
        Some("http://svc/v2")
    );
}

#[tokio::test]
async fn hard_failure_on_update_is_fatal() {
    let (platform, resource) = setup();
    let prior = created(&resource, orders()).await;
    platform.fail_next(Rpc::UpdateFederatedGraph, Fault::NilEnvelope);

    let outcome = resource.update(prior.clone(), &prior).await;
    let err = outcome.error().expect("error");
    assert!(err.to_string().contains("the server response is nil"));
}

#[tokio::test]
async fn update_carries_name_and_namespace_from_prior() {
    let (platform, resource) = setup();
    let prior = created(&resource, orders()).await;
    let mut planned = prior.clone();
    planned.name = "renamed".to_string();
    planned.readme = Some("new readme".to_string());

    let updated = resource.update(planned, &prior).await.into_model().expect("update");
    assert_eq!(updated.name, "orders");
    assert_eq!(
        platform.graph("orders", "default").and_then(|g| g.readme),
        Some("new readme".to_string())
    );
}

// ---------------------------------------------------------------------------
// Delete / import
// ---------------------------------------------------------------------------

#[tokio::test]
async fn delete_removes_the_graph() {
    let (platform, resource) = setup();
    let state = created(&resource, orders()).await;
    let outcome = resource.delete(&state).await;
    assert_eq!(outcome, ReconcileOutcome::Success(()));
    assert!(platform.graph("orders", "default").is_none());
}

#[tokio::test]
async fn delete_failure_is_fatal() {
    let (platform, resource) = setup();
    let state = created(&resource, orders()).await;
    platform.fail_next(
        Rpc::DeleteFederatedGraph,
        Fault::Status(StatusCode::Err, "backend unavailable".to_string()),
    );
    let outcome = resource.delete(&state).await;
    assert!(outcome.is_failure());
    assert!(platform.graph("orders", "default").is_some());
}

#[tokio::test]
async fn import_passes_the_id_through() {
    let (platform, resource) = setup();
    let imported = resource.import("fg-0042").into_model().expect("import");
    assert_eq!(imported.id_str(), "fg-0042");
    assert!(imported.name.is_empty());
    assert_eq!(platform.call_count(), 0);

    assert!(resource.import("").is_failure());
}
