use crate::commands::modules::{ModuleExecutor, ModuleId};
use crate::domain::models::InstallContext;
use crate::services::prompt::{confirm, Prompter};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunMode {
    /// Every module in order.
    Full,
    /// Ask before each module; anything but yes skips it.
    Prompted,
    Only(ModuleId),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub executed: Vec<ModuleId>,
    pub skipped: Vec<ModuleId>,
}

/// Runs the selected modules. The first failure is logged and returned, so
/// nothing after it executes.
pub fn run_modules(
    mode: RunMode,
    ctx: &InstallContext,
    executor: &mut dyn ModuleExecutor,
    prompter: &dyn Prompter,
) -> anyhow::Result<RunSummary> {
    let modules: Vec<ModuleId> = match mode {
        RunMode::Full | RunMode::Prompted => ModuleId::ALL.to_vec(),
        RunMode::Only(m) => vec![m],
    };

    let mut summary = RunSummary::default();
    for module in modules {
        if mode == RunMode::Prompted && !confirm(prompter, &format!("Run {}?", module))? {
            tracing::info!(module = %module, "skipped by operator");
            summary.skipped.push(module);
            continue;
        }

        tracing::info!(module = %module, "starting");
        if let Err(e) = executor.execute(module, ctx) {
            tracing::error!(module = %module, error = %format!("{:#}", e), "module failed, aborting");
            return Err(e.context(format!("module {} failed", module)));
        }
        tracing::info!(module = %module, "finished");
        summary.executed.push(module);
    }
    Ok(summary)
}
