//! `graphctl destroy` — delete every tracked resource.

use anyhow::Result;
use clap::Args;

use graphctl_reconcile::plan_destroy;

use super::{connect, finish_report, persist_to, plan::print_plan, run_cancellable, GlobalArgs};

/// Arguments for `graphctl destroy`.
#[derive(Args, Debug)]
pub struct DestroyArgs {
    /// Print what would be deleted and stop.
    #[arg(long)]
    pub dry_run: bool,
}

impl DestroyArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let (path, mut tracked) = global.load_state()?;
        if tracked.is_empty() {
            println!("Nothing to destroy.");
            return Ok(());
        }
        let plan = plan_destroy(&tracked);
        if self.dry_run {
            return print_plan(&plan, false);
        }

        let manifest = global.load_manifest()?;
        let engine = connect(&manifest)?;
        let report = run_cancellable(async {
            let report = engine.apply(&plan, &mut tracked, persist_to(&path)).await?;
            Ok::<_, anyhow::Error>(report)
        })?;
        finish_report(&report, "Destroy")
    }
}
