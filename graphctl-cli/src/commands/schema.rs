//! `graphctl schema` — attribute schemas of the supported kinds.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use graphctl_core::ResourceKind;
use graphctl_reconcile::{monograph, plan::schema_for, AttributeMode, ResourceSchema};

/// Arguments for `graphctl schema`.
#[derive(Args, Debug)]
pub struct SchemaArgs {
    /// `federated_graph`, `router_token` or `monograph`. All when omitted.
    pub kind: Option<String>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct AttributeRow {
    #[tabled(rename = "attribute")]
    name: &'static str,
    #[tabled(rename = "mode")]
    mode: &'static str,
    #[tabled(rename = "flags")]
    flags: String,
    #[tabled(rename = "description")]
    description: &'static str,
}

impl SchemaArgs {
    pub fn run(self) -> Result<()> {
        let schemas = match self.kind.as_deref() {
            None => {
                let mut all: Vec<ResourceSchema> =
                    ResourceKind::all().iter().map(|k| schema_for(*k)).collect();
                all.push(monograph::schema());
                all
            }
            Some("monograph") => vec![monograph::schema()],
            Some(kind) => match kind.parse::<ResourceKind>() {
                Ok(kind) => vec![schema_for(kind)],
                Err(_) => bail!(
                    "unknown kind '{kind}': expected federated_graph, router_token or monograph"
                ),
            },
        };

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&schemas).context("failed to serialize schemas")?
            );
            return Ok(());
        }
        for schema in schemas {
            print_schema(schema);
        }
        Ok(())
    }
}

fn print_schema(schema: ResourceSchema) {
    println!("{} {}", schema.type_name.bold(), schema.description.bright_black());
    let rows: Vec<AttributeRow> = schema
        .attributes
        .into_iter()
        .map(|attribute| {
            let mut flags = Vec::new();
            if attribute.requires_replace {
                flags.push("forces replacement");
            }
            if attribute.sensitive {
                flags.push("sensitive");
            }
            AttributeRow {
                name: attribute.name,
                mode: match attribute.mode {
                    AttributeMode::Required => "required",
                    AttributeMode::Optional => "optional",
                    AttributeMode::Computed => "computed",
                },
                flags: flags.join(", "),
                description: attribute.description,
            }
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}
