//! `graphctl lookup` — read monographs from the control plane.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use graphctl_core::{MonographLookup, MonographState, Namespace};
use graphctl_reconcile::ReconcileOutcome;

use super::{connect, run_cancellable, GlobalArgs};

/// Arguments for `graphctl lookup`.
#[derive(Args, Debug)]
pub struct LookupArgs {
    /// Monograph name. Without it, every monograph declared in the manifest is read.
    pub name: Option<String>,

    /// Namespace of the monograph.
    #[arg(long, default_value = "")]
    pub namespace: String,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "field")]
    field: &'static str,
    #[tabled(rename = "value")]
    value: String,
}

impl LookupArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let manifest = global.load_manifest()?;
        let lookups: Vec<MonographLookup> = match self.name {
            Some(name) => vec![MonographLookup {
                name,
                namespace: Namespace::new(self.namespace),
            }],
            None => manifest.monographs.values().cloned().collect(),
        };
        if lookups.is_empty() {
            bail!("no monograph named and none declared in the manifest");
        }

        let engine = connect(&manifest)?;
        let outcomes = run_cancellable(async {
            let mut outcomes = Vec::with_capacity(lookups.len());
            for lookup in lookups {
                outcomes.push(engine.lookup_monograph(lookup).await);
            }
            Ok::<_, anyhow::Error>(outcomes)
        })?;

        let mut found = Vec::new();
        let mut failed = 0;
        for outcome in outcomes {
            for diagnostic in outcome.diagnostics() {
                eprintln!("{}", diagnostic.to_string().red());
            }
            match outcome {
                ReconcileOutcome::Success(m) | ReconcileOutcome::SuccessWithWarnings(m, _) => {
                    found.push(m)
                }
                ReconcileOutcome::Failure(_) => failed += 1,
            }
        }

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&found).context("failed to serialize monographs")?
            );
        } else {
            for monograph in &found {
                print_monograph(monograph);
            }
        }
        if failed > 0 {
            bail!("{failed} lookup(s) failed");
        }
        Ok(())
    }
}

fn print_monograph(monograph: &MonographState) {
    let optional = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_owned());
    let rows = vec![
        FieldRow { field: "id", value: monograph.id.to_string() },
        FieldRow { field: "namespace", value: monograph.namespace.to_string() },
        FieldRow { field: "routing_url", value: monograph.routing_url.clone() },
        FieldRow { field: "readme", value: optional(&monograph.readme) },
        FieldRow {
            field: "admission_webhook_url",
            value: optional(&monograph.admission_webhook_url),
        },
        FieldRow { field: "label_matchers", value: monograph.label_matchers.join(", ") },
        FieldRow {
            field: "websocket_subprotocol",
            value: optional(&monograph.websocket_subprotocol),
        },
        FieldRow {
            field: "subscription_protocol",
            value: optional(&monograph.subscription_protocol),
        },
    ];
    println!("{}", monograph.name.bold());
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}
