//! `graphctl plan` — offline comparison of the manifest with tracked state.

use anyhow::{Context, Result};
use clap::Args;
use colored::{ColoredString, Colorize};

use graphctl_reconcile::{plan, ChangeAction, Plan};

use super::GlobalArgs;

/// Arguments for `graphctl plan`.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Only list the changes, without diffs.
    #[arg(long)]
    pub brief: bool,
}

impl PlanArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let manifest = global.load_manifest()?;
        let (_, tracked) = global.load_state()?;
        let plan = plan(&manifest, &tracked);
        print_plan(&plan, !self.brief)
    }
}

/// Print pending changes and a summary line. Shared with `destroy`.
pub fn print_plan(plan: &Plan, with_diffs: bool) -> Result<()> {
    if !plan.has_changes() {
        println!("No changes. Tracked state matches the manifest.");
        return Ok(());
    }

    for change in plan.pending() {
        let fields = match &change.action {
            ChangeAction::Update { fields } | ChangeAction::Replace { fields } => {
                format!(" ({})", fields.join(", "))
            }
            _ => String::new(),
        };
        println!(
            "{} {}{}",
            action_marker(&change.action),
            change.address.to_string().bold(),
            fields
        );
        if with_diffs {
            let diff = change
                .render_diff()
                .with_context(|| format!("failed to render diff for {}", change.address))?;
            print!("{diff}");
            if !diff.ends_with('\n') {
                println!();
            }
        }
    }

    let summary = plan.summary();
    println!(
        "Plan: {} to create, {} to update, {} to replace, {} to delete.",
        summary.create, summary.update, summary.replace, summary.delete
    );
    Ok(())
}

fn action_marker(action: &ChangeAction) -> ColoredString {
    match action {
        ChangeAction::Create => "+ create".green().bold(),
        ChangeAction::Update { .. } => "~ update".yellow().bold(),
        ChangeAction::Replace { .. } => "± replace".magenta().bold(),
        ChangeAction::Delete => "- delete".red().bold(),
        ChangeAction::NoOp => "  no-op".normal(),
    }
}
