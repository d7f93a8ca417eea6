use crate::cli::CliContext;
use crate::core::error::SyncStep;
use crate::core::sync::SyncSession;
use anyhow::{Context, Result};
use clap::Args;

#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Skip the remote even when the config says online
    #[arg(long)]
    pub offline: bool,
}

pub fn run(ctx: &CliContext, args: SyncArgs) -> Result<()> {
    let mut cfg = ctx.store_config(false)?;
    cfg.offline |= args.offline;
    let coordinator = ctx.sync_coordinator(&cfg);

    let _lock = ctx.lock()?;
    let outcome = coordinator
        .synchronize()
        .with_context(|| format!("sync {}", cfg.store_root.display()))?;
    println!("{}", describe(&outcome.session));
    println!("{} entries in store", outcome.index.len());
    Ok(())
}

fn describe(session: &SyncSession) -> String {
    if session.offline {
        return "Offline: remote skipped".to_string();
    }
    if session.steps.is_empty() {
        return "Nothing to do".to_string();
    }
    let steps: Vec<String> = session.steps.iter().map(SyncStep::to_string).collect();
    let state = match session.clean {
        Some(true) => "clean",
        Some(false) => "local changes",
        None => "unknown",
    };
    format!("Work tree {}: {}", state, steps.join(" -> "))
}
