//! `graphctl refresh` — re-read tracked resources and record drift.

use anyhow::Result;
use clap::Args;

use super::{connect, finish_report, persist_to, run_cancellable, GlobalArgs};

/// Arguments for `graphctl refresh`.
#[derive(Args, Debug)]
pub struct RefreshArgs {}

impl RefreshArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let manifest = global.load_manifest()?;
        let (path, mut tracked) = global.load_state()?;
        if tracked.is_empty() {
            println!("Nothing tracked.");
            return Ok(());
        }

        let engine = connect(&manifest)?;
        let report = run_cancellable(async {
            let report = engine.refresh(&mut tracked, persist_to(&path)).await?;
            Ok::<_, anyhow::Error>(report)
        })?;
        finish_report(&report, "Refresh")
    }
}
