use crate::domain::errors::InstallError;
use crate::domain::models::{InstallContext, InstallerConfig};
use crate::services::prompt::{ask_or_default, ask_required, Prompter};
use std::path::PathBuf;

fn default_parent_dir() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Collects version and parent directory (config presets skip the prompt)
/// and builds the one install context for this run.
pub fn collect_install_context(
    config: &InstallerConfig,
    prompter: &dyn Prompter,
) -> anyhow::Result<InstallContext> {
    let version = match &config.version {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => ask_required(prompter, "DataRobot version to install (e.g. 10.2.0)")?,
    };
    let parent_dir = match &config.parent_dir {
        Some(p) => p.clone(),
        None => {
            let default = default_parent_dir();
            PathBuf::from(ask_or_default(
                prompter,
                "Parent directory for the installation",
                &default.to_string_lossy(),
            )?)
        }
    };
    Ok(InstallContext::new(&version, parent_dir))
}

pub fn prepare_install_dir(ctx: &InstallContext) -> anyhow::Result<()> {
    std::fs::create_dir_all(&ctx.install_dir).map_err(|e| InstallError::DirectoryCreation {
        path: ctx.install_dir.clone(),
        reason: e.to_string(),
    })?;
    tracing::info!(
        version = %ctx.version,
        install_dir = %ctx.install_dir.display(),
        "install directory ready"
    );
    Ok(())
}
