//! End-to-end checks of the `graphctl` binary for everything that runs
//! without a control plane.

use std::process::Command;

use assert_cmd::prelude::*;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;
use predicates::str::contains;

use graphctl_core::{state, FederatedGraphState, ResourceAddress, ResourceId, ResourceKind, StateFile};

const MANIFEST: &str = r#"
federated_graphs:
  orders:
    name: orders
    routing_url: http://svc/routing
    label_matchers: ["team=payments"]
    admission_webhook_secret: hunter2
router_tokens:
  ci:
    name: ci
    graph_name: orders
"#;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new(manifest: &str) -> Self {
        let dir = TempDir::new().expect("tempdir");
        dir.child("graphctl.yaml").write_str(manifest).expect("write manifest");
        Self { dir }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("graphctl"));
        cmd.current_dir(self.dir.path())
            .env("HOME", self.dir.path())
            .env("NO_COLOR", "1")
            .env_remove("COSMO_API_KEY")
            .env_remove("COSMO_API_URL")
            .env_remove("RUST_LOG")
            .args(["--state", "state.yaml"]);
        cmd
    }

    fn track_orders(&self, routing_url: &str) {
        let mut graph = FederatedGraphState::new("orders", routing_url);
        graph.id = Some(ResourceId::from("fg-0001"));
        graph.label_matchers = vec!["team=payments".to_string()];
        graph.admission_webhook_secret = Some(graphctl_core::Sensitive::new("hunter2"));
        let mut tracked = StateFile::default();
        tracked.insert(
            ResourceAddress::new(ResourceKind::FederatedGraph, "orders"),
            graph.into(),
        );
        state::save_at(&self.dir.path().join("state.yaml"), &tracked).expect("save state");
    }
}

// ---------------------------------------------------------------------------
// plan
// ---------------------------------------------------------------------------

#[test]
fn plan_lists_creates_without_contacting_the_control_plane() {
    let ws = Workspace::new(MANIFEST);
    ws.cmd()
        .arg("plan")
        .assert()
        .success()
        .stdout(contains("+ create federated_graph.orders"))
        .stdout(contains("+ create router_token.ci"))
        .stdout(contains("Plan: 2 to create, 0 to update, 0 to replace, 0 to delete."))
        .stdout(contains("(sensitive)"))
        .stdout(contains("hunter2").not());
}

#[test]
fn plan_reports_in_place_updates_with_field_names() {
    let ws = Workspace::new(MANIFEST);
    ws.track_orders("http://old/routing");
    ws.cmd()
        .args(["plan", "--brief"])
        .assert()
        .success()
        .stdout(contains("~ update federated_graph.orders (routing_url)"))
        .stdout(contains("-routing_url").not());
}

#[test]
fn plan_with_nothing_to_do() {
    let ws = Workspace::new("{}\n");
    ws.cmd()
        .arg("plan")
        .assert()
        .success()
        .stdout(contains("No changes."));
}

#[test]
fn manifest_declaring_computed_fields_is_rejected() {
    let ws = Workspace::new(
        "federated_graphs:\n  orders:\n    id: fg-1\n    name: orders\n    routing_url: http://svc\n",
    );
    ws.cmd()
        .arg("plan")
        .assert()
        .failure()
        .stderr(contains("failed to load manifest"));
}

#[test]
fn missing_manifest_is_an_error() {
    let ws = Workspace::new(MANIFEST);
    ws.cmd()
        .args(["--manifest", "absent.yaml", "plan"])
        .assert()
        .failure()
        .stderr(contains("absent.yaml"));
}

// ---------------------------------------------------------------------------
// apply / destroy / import
// ---------------------------------------------------------------------------

#[test]
fn apply_without_api_key_names_the_variable() {
    let ws = Workspace::new(MANIFEST);
    ws.cmd()
        .arg("apply")
        .assert()
        .failure()
        .stderr(contains("COSMO_API_KEY"));
    ws.dir.child("state.yaml").assert(predicate::path::missing());
}

#[test]
fn apply_with_no_changes_needs_no_credentials() {
    let ws = Workspace::new("{}\n");
    ws.cmd()
        .arg("apply")
        .assert()
        .success()
        .stdout(contains("No changes."));
}

#[test]
fn destroy_dry_run_lists_tracked_resources() {
    let ws = Workspace::new(MANIFEST);
    ws.track_orders("http://svc/routing");
    ws.cmd()
        .args(["destroy", "--dry-run"])
        .assert()
        .success()
        .stdout(contains("- delete federated_graph.orders"))
        .stdout(contains("1 to delete"));
}

#[test]
fn destroy_with_empty_state() {
    let ws = Workspace::new(MANIFEST);
    ws.cmd()
        .arg("destroy")
        .assert()
        .success()
        .stdout(contains("Nothing to destroy."));
}

#[test]
fn import_rejects_malformed_addresses() {
    let ws = Workspace::new(MANIFEST);
    ws.cmd()
        .args(["import", "subgraph.orders", "fg-1"])
        .assert()
        .failure()
        .stderr(contains("subgraph"));
}

// ---------------------------------------------------------------------------
// status / schema
// ---------------------------------------------------------------------------

#[test]
fn status_on_empty_state() {
    let ws = Workspace::new(MANIFEST);
    ws.cmd()
        .arg("status")
        .assert()
        .success()
        .stdout(contains("0 tracked"))
        .stdout(contains("No resources tracked."));
}

#[test]
fn status_json_includes_pending_actions() {
    let ws = Workspace::new(MANIFEST);
    ws.track_orders("http://old/routing");
    let output = ws.cmd().args(["status", "--json"]).output().expect("run");
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    let resources = report["resources"].as_array().expect("resources");
    assert_eq!(resources.len(), 1);
    assert_eq!(resources[0]["address"], "federated_graph.orders");
    assert_eq!(resources[0]["id"], "fg-0001");
    assert_eq!(resources[0]["plan"], "update");
}

#[test]
fn schema_marks_replacement_and_sensitive_attributes() {
    let ws = Workspace::new(MANIFEST);
    ws.cmd()
        .args(["schema", "federated_graph"])
        .assert()
        .success()
        .stdout(contains("forces replacement"))
        .stdout(contains("admission_webhook_secret"))
        .stdout(contains("sensitive"));
}

#[test]
fn schema_json_lists_every_kind() {
    let ws = Workspace::new(MANIFEST);
    let output = ws.cmd().args(["schema", "--json"]).output().expect("run");
    assert!(output.status.success());
    let schemas: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    let names: Vec<&str> = schemas
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|s| s["type_name"].as_str())
        .collect();
    assert_eq!(names, vec!["federated_graph", "router_token", "monograph"]);
}

#[test]
fn schema_rejects_unknown_kinds() {
    let ws = Workspace::new(MANIFEST);
    ws.cmd()
        .args(["schema", "subgraph"])
        .assert()
        .failure()
        .stderr(contains("unknown kind 'subgraph'"));
}
