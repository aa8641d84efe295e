//! graphctl — declarative management of federated graphs and router tokens.
//!
//! # Usage
//!
//! ```text
//! graphctl plan
//! graphctl apply
//! graphctl refresh
//! graphctl import <kind>.<key> <id>
//! graphctl destroy
//! graphctl status [--json]
//! graphctl lookup <monograph> [--namespace <ns>] [--json]
//! graphctl schema [federated_graph|router_token|monograph] [--json]
//!
//! global: [--manifest graphctl.yaml] [--state <path>] [-v]
//! ```

mod commands;
mod transport;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use commands::{
    apply::ApplyArgs, destroy::DestroyArgs, import::ImportArgs, lookup::LookupArgs,
    plan::PlanArgs, refresh::RefreshArgs, schema::SchemaArgs, status::StatusArgs, GlobalArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "graphctl",
    version,
    about = "Reconcile federated graphs and router tokens against a control plane",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show what apply would change, without contacting the control plane.
    Plan(PlanArgs),

    /// Create, update, replace and delete resources to match the manifest.
    Apply(ApplyArgs),

    /// Re-read every tracked resource and record drift.
    Refresh(RefreshArgs),

    /// Start tracking an existing resource under a manifest address.
    Import(ImportArgs),

    /// Delete every tracked resource.
    Destroy(DestroyArgs),

    /// List tracked resources.
    Status(StatusArgs),

    /// Look up a monograph by name.
    Lookup(LookupArgs),

    /// Print the attribute schema of a resource kind.
    Schema(SchemaArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    match cli.command {
        Commands::Plan(args) => args.run(&cli.global),
        Commands::Apply(args) => args.run(&cli.global),
        Commands::Refresh(args) => args.run(&cli.global),
        Commands::Import(args) => args.run(&cli.global),
        Commands::Destroy(args) => args.run(&cli.global),
        Commands::Status(args) => args.run(&cli.global),
        Commands::Lookup(args) => args.run(&cli.global),
        Commands::Schema(args) => args.run(),
    }
}

/// `RUST_LOG` wins; otherwise `warn`, or `debug` with `-v`.
fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
