//! `graphctl status` — what is tracked, and what the next apply would do.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use graphctl_core::{ResourceAddress, ResourceModel, StateFile};
use graphctl_reconcile::plan;

use super::GlobalArgs;

/// Arguments for `graphctl status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let (path, tracked) = global.load_state()?;
        // The manifest is optional here: without one, pending actions are unknown.
        let pending = if global.manifest.exists() {
            let manifest = global.load_manifest()?;
            Some(pending_actions(&plan(&manifest, &tracked)))
        } else {
            None
        };

        let report = StatusReport {
            state_path: path.display().to_string(),
            updated_at: (!tracked.is_empty()).then_some(tracked.updated_at),
            resources: rows(&tracked, pending.as_ref()),
        };
        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize status JSON")?
            );
            return Ok(());
        }
        print_table(report);
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct StatusReport {
    state_path: String,
    updated_at: Option<DateTime<Utc>>,
    resources: Vec<ResourceRow>,
}

#[derive(Debug, Serialize, Tabled)]
struct ResourceRow {
    #[tabled(rename = "address")]
    address: String,
    #[tabled(rename = "name")]
    name: String,
    #[tabled(rename = "namespace")]
    namespace: String,
    #[tabled(rename = "id")]
    id: String,
    #[tabled(rename = "plan")]
    plan: String,
}

fn pending_actions(plan: &graphctl_reconcile::Plan) -> BTreeMap<ResourceAddress, &'static str> {
    plan.changes
        .iter()
        .map(|change| (change.address.clone(), change.action.label()))
        .collect()
}

fn rows(
    tracked: &StateFile,
    pending: Option<&BTreeMap<ResourceAddress, &'static str>>,
) -> Vec<ResourceRow> {
    tracked
        .resources
        .iter()
        .map(|(address, model)| {
            let (name, namespace) = match model {
                ResourceModel::FederatedGraph(graph) => (graph.name.clone(), graph.namespace.to_string()),
                ResourceModel::RouterToken(token) => {
                    (format!("{} → {}", token.name, token.graph_name), token.namespace.to_string())
                }
            };
            let id = match model {
                ResourceModel::FederatedGraph(graph) => graph.id_str().to_owned(),
                ResourceModel::RouterToken(_) => "-".to_owned(),
            };
            let plan = pending
                .and_then(|p| p.get(address).copied())
                .unwrap_or("-")
                .to_owned();
            ResourceRow {
                address: address.to_string(),
                name,
                namespace,
                id,
                plan,
            }
        })
        .collect()
}

fn print_table(report: StatusReport) {
    let updated = report
        .updated_at
        .map(format_age)
        .unwrap_or_else(|| "never".to_owned());
    println!(
        "graphctl v{} | {} tracked | updated {} | {}",
        env!("CARGO_PKG_VERSION"),
        report.resources.len(),
        updated,
        report.state_path.bright_black(),
    );

    if report.resources.is_empty() {
        println!("No resources tracked.");
        return;
    }

    let mut table = Table::new(report.resources);
    table.with(Style::rounded());
    println!("{table}");
}

fn format_age(at: DateTime<Utc>) -> String {
    let elapsed = Utc::now().signed_duration_since(at);
    if elapsed.num_days() > 0 {
        format!("{}d ago", elapsed.num_days())
    } else if elapsed.num_hours() > 0 {
        format!("{}h ago", elapsed.num_hours())
    } else if elapsed.num_minutes() > 0 {
        format!("{}m ago", elapsed.num_minutes())
    } else {
        "just now".to_owned()
    }
}
