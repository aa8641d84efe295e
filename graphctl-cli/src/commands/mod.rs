//! Subcommands and the plumbing they share: workspace paths, the async
//! runtime, the control-plane connection and report rendering.

pub mod apply;
pub mod destroy;
pub mod import;
pub mod lookup;
pub mod plan;
pub mod refresh;
pub mod schema;
pub mod status;

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use graphctl_client::PlatformClient;
use graphctl_core::{manifest::API_KEY_ENV, state, Manifest, StateError, StateFile};
use graphctl_reconcile::{Engine, RunReport};

use crate::transport::HttpPlatform;

/// Flags accepted by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Manifest declaring the desired resources.
    #[arg(long, global = true, default_value = "graphctl.yaml")]
    pub manifest: PathBuf,

    /// State file [default: ~/.graphctl/state.yaml].
    #[arg(long, global = true)]
    pub state: Option<PathBuf>,

    /// Log debug output to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl GlobalArgs {
    pub fn load_manifest(&self) -> Result<Manifest> {
        Manifest::load_at(&self.manifest)
            .with_context(|| format!("failed to load manifest {}", self.manifest.display()))
    }

    pub fn state_path(&self) -> Result<PathBuf> {
        match &self.state {
            Some(path) => Ok(path.clone()),
            None => state::default_state_path()
                .context("could not determine the state file location; pass --state"),
        }
    }

    /// The state path and its tracked contents. A missing file is empty state.
    pub fn load_state(&self) -> Result<(PathBuf, StateFile)> {
        let path = self.state_path()?;
        let tracked = state::load_at(&path)
            .with_context(|| format!("failed to load state {}", path.display()))?;
        Ok((path, tracked))
    }
}

/// Build an engine talking to the configured control plane.
pub fn connect(manifest: &Manifest) -> Result<Engine> {
    let provider = manifest.provider.resolve();
    let Some(api_key) = provider.api_key else {
        bail!("no API key configured: set provider.api_key in the manifest or {API_KEY_ENV}");
    };
    tracing::debug!(api_url = %provider.api_url, "connecting to control plane");
    let platform = HttpPlatform::new(&provider.api_url, api_key);
    Ok(Engine::configure(PlatformClient::new(Arc::new(platform))))
}

/// `state::save_at` bound to `path`, for the engine's persist callback.
pub fn persist_to(path: &Path) -> impl FnMut(&StateFile) -> Result<(), StateError> + '_ {
    move |tracked| state::save_at(path, tracked)
}

/// Run `future` to completion, abandoning it on Ctrl-C.
///
/// State is saved after every resource, so an interrupted run keeps what
/// already completed.
pub fn run_cancellable<F, T>(future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    runtime.block_on(async {
        tokio::select! {
            result = future => result,
            _ = tokio::signal::ctrl_c() => {
                bail!("interrupted; state reflects every resource completed before the signal")
            }
        }
    })
}

// ---------------------------------------------------------------------------
// Report rendering
// ---------------------------------------------------------------------------

/// Print one line per resource, its diagnostics, and a totals line.
///
/// Returns an error when any resource failed, so the exit code is non-zero.
pub fn finish_report(report: &RunReport, verb: &str) -> Result<()> {
    for entry in &report.entries {
        let marker = if entry.failed {
            "✗".red().bold()
        } else if entry.diagnostics.is_empty() {
            "✓".green().bold()
        } else {
            "!".yellow().bold()
        };
        println!("{marker} {:<8} {}", entry.action, entry.address);
        for diagnostic in &entry.diagnostics {
            let line = format!("    {diagnostic}");
            if diagnostic.is_error() {
                eprintln!("{}", line.red());
            } else {
                eprintln!("{}", line.yellow());
            }
        }
    }

    let failed = report.error_count();
    println!(
        "{verb}: {} resources, {} warnings, {} failed.",
        report.entries.len(),
        report.warning_count(),
        failed,
    );
    if failed > 0 {
        bail!("{failed} resource(s) failed");
    }
    Ok(())
}
