//! `graphctl import <address> <id>` — adopt an existing resource.

use anyhow::Result;
use clap::Args;

use graphctl_core::ResourceAddress;

use super::{connect, finish_report, persist_to, run_cancellable, GlobalArgs};

/// Arguments for `graphctl import`.
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Manifest address, e.g. `federated_graph.orders`.
    pub address: ResourceAddress,

    /// Identifier the control plane assigned to the resource.
    pub id: String,
}

impl ImportArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let manifest = global.load_manifest()?;
        let (path, mut tracked) = global.load_state()?;
        let engine = connect(&manifest)?;

        let report = run_cancellable(async {
            let report = engine
                .import(&self.address, &self.id, &manifest, &mut tracked, persist_to(&path))
                .await?;
            Ok::<_, anyhow::Error>(report)
        })?;
        finish_report(&report, "Import")
    }
}
