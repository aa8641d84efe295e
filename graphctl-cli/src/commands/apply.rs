//! `graphctl apply` — converge the control plane on the manifest.

use anyhow::Result;
use clap::Args;

use graphctl_reconcile::plan;

use super::{connect, finish_report, persist_to, run_cancellable, GlobalArgs};

/// Arguments for `graphctl apply`.
#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Re-read tracked resources before planning.
    #[arg(long)]
    pub refresh: bool,
}

impl ApplyArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let manifest = global.load_manifest()?;
        let (path, mut tracked) = global.load_state()?;

        if !self.refresh && !plan(&manifest, &tracked).has_changes() {
            println!("No changes. Tracked state matches the manifest.");
            return Ok(());
        }

        let engine = connect(&manifest)?;
        let report = run_cancellable(async {
            let mut report = if self.refresh {
                engine.refresh(&mut tracked, persist_to(&path)).await?
            } else {
                Default::default()
            };
            let plan = plan(&manifest, &tracked);
            let applied = engine.apply(&plan, &mut tracked, persist_to(&path)).await?;
            report.entries.extend(applied.entries);
            Ok::<_, anyhow::Error>(report)
        })?;
        finish_report(&report, "Apply")
    }
}
