//! State file error-message, atomic-write-safety, and manifest loading tests.

use assert_fs::prelude::*;
use graphctl_core::{
    state, FederatedGraphState, Manifest, ManifestError, ResourceAddress, ResourceId,
    ResourceKind, StateError, StateFile,
};
use predicates::prelude::predicate;
use rstest::rstest;
use std::fs;

fn orders_address() -> ResourceAddress {
    ResourceAddress::new(ResourceKind::FederatedGraph, "orders")
}

fn tracked_orders() -> FederatedGraphState {
    let mut graph = FederatedGraphState::new("orders", "http://svc/routing");
    graph.id = Some(ResourceId::from("fg-0001"));
    graph.label_matchers = vec!["team=payments".to_string(), "env=prod".to_string()];
    graph
}

// ---------------------------------------------------------------------------
// 1. Load error messages
// ---------------------------------------------------------------------------

#[test]
fn load_corrupt_yaml_returns_parse_error_with_path() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let file = home.child("state.yaml");
    file.write_str(": : corrupt : yaml : !!!\n  - broken: [unclosed")
        .expect("write");

    let err = state::load_at(file.path()).unwrap_err();
    assert!(matches!(err, StateError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains("state.yaml"), "got: {err}");
}

#[test]
fn load_unknown_address_kind_is_a_parse_error() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let file = home.child("state.yaml");
    file.write_str(
        "version: 1\nupdated_at: 2026-01-01T00:00:00Z\nresources:\n  subgraph.orders:\n    kind: federated_graph\n    name: orders\n    routing_url: http://x\n",
    )
    .expect("write");

    let err = state::load_at(file.path()).unwrap_err();
    assert!(matches!(err, StateError::Parse { .. }), "got: {err}");
}

// ---------------------------------------------------------------------------
// 2. Atomic write safety
// ---------------------------------------------------------------------------

#[test]
fn save_creates_parent_directories() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let path = state::default_state_path_at(home.path());
    state::save_at(&path, &StateFile::default()).expect("save");
    home.child(".graphctl/state.yaml")
        .assert(predicate::path::exists());
}

#[test]
fn mid_write_crash_leaves_original_intact() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let path = home.path().join("state.yaml");
    let mut tracked = StateFile::default();
    tracked.insert(orders_address(), tracked_orders().into());
    state::save_at(&path, &tracked).expect("save");
    let original_bytes = fs::read(&path).expect("read original");

    // Simulate crash: .tmp written but process died before rename
    let tmp = path.with_extension("yaml.tmp");
    fs::write(&tmp, b"CRASH - INCOMPLETE WRITE").expect("write crash tmp");

    assert_eq!(original_bytes, fs::read(&path).expect("read after crash"));
    let reloaded = state::load_at(&path).expect("load");
    assert_eq!(reloaded.get(&orders_address()), Some(&tracked_orders().into()));
}

#[test]
fn label_matcher_order_survives_save_and_load() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let path = home.path().join("state.yaml");
    let mut tracked = StateFile::default();
    tracked.insert(orders_address(), tracked_orders().into());
    state::save_at(&path, &tracked).expect("save");

    let loaded = state::load_at(&path).expect("load");
    let Some(graphctl_core::ResourceModel::FederatedGraph(graph)) = loaded.get(&orders_address())
    else {
        panic!("expected a tracked federated graph");
    };
    assert_eq!(graph.label_matchers, vec!["team=payments", "env=prod"]);
}

// ---------------------------------------------------------------------------
// 3. Manifest loading
// ---------------------------------------------------------------------------

#[test]
fn missing_manifest_is_not_found() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let err = Manifest::load_at(&home.path().join("graphctl.yaml")).unwrap_err();
    assert!(matches!(err, ManifestError::NotFound { .. }), "got: {err}");
}

#[rstest]
#[case("federated_graphs:\n  orders:\n    name: orders\n")]
#[case("federated_graphs:\n  - name: orders\n")]
#[case("router_tokens:\n  ci:\n    name: ci\n    graph_name: orders\n    token: leaked\n")]
fn invalid_manifests_are_rejected(#[case] yaml: &str) {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let file = home.child("graphctl.yaml");
    file.write_str(yaml).expect("write");
    assert!(Manifest::load_at(file.path()).is_err());
}

#[test]
fn valid_manifest_loads() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let file = home.child("graphctl.yaml");
    file.write_str(
        "provider:\n  api_url: https://cp.example\nfederated_graphs:\n  orders:\n    name: orders\n    namespace: \"\"\n    routing_url: http://svc/routing\n",
    )
    .expect("write");
    let manifest = Manifest::load_at(file.path()).expect("load");
    assert_eq!(manifest.federated_graphs["orders"].namespace.as_str(), "default");
    assert_eq!(manifest.provider.api_url.as_deref(), Some("https://cp.example"));
}
