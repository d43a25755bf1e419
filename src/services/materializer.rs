use crate::domain::constants::{PCS_VALUES_FILE, SMALL_PCS_FILE, TEMPLATES_SUBDIR, VALUES_FILE};
use crate::domain::errors::InstallError;
use crate::domain::models::{BinaryKind, DeploymentMode, HaMode, InstallContext, RegistryKind};
use crate::services::expander::{bundle_subdir, extraction_root};
use crate::services::prompt::{choose_or_first, choose_strict};
use crate::services::toolbox::Toolbox;
use std::path::{Path, PathBuf};

const PCS_PATTERN: &str = "pcs";

/// Configured template directory (relative paths resolve against the install
/// dir), otherwise `templates` inside the extracted tools bundle.
pub fn templates_dir(ctx: &InstallContext, tools: &Toolbox) -> PathBuf {
    match &tools.config.templates.dir {
        Some(dir) if dir.is_absolute() => dir.clone(),
        Some(dir) => ctx.install_dir.join(dir),
        None => {
            let root = extraction_root(ctx, tools.config.extract_layout, BinaryKind::Tools);
            bundle_subdir(&root, TEMPLATES_SUBDIR).unwrap_or_else(|| root.join(TEMPLATES_SUBDIR))
        }
    }
}

/// Files in `dir` whose name contains `pattern`, ignoring case.
pub fn matching_templates(dir: &Path, pattern: &str) -> anyhow::Result<Vec<PathBuf>> {
    let pattern = pattern.to_ascii_lowercase();
    let mut found = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let matches = path
            .file_name()
            .map(|n| n.to_string_lossy().to_ascii_lowercase().contains(&pattern))
            .unwrap_or(false);
        if path.is_file() && matches {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}

pub fn collect_mode(ctx: &InstallContext, tools: &Toolbox) -> anyhow::Result<DeploymentMode> {
    let ha_mode = match choose_or_first(tools.prompter, "Deployment topology:", &["ha", "non-ha"])? {
        0 => HaMode::Ha,
        _ => HaMode::NonHa,
    };
    let environment = match ctx.environment() {
        Some(env) => env,
        None => {
            let names: Vec<&str> = RegistryKind::ALL.iter().map(|k| k.environment_name()).collect();
            RegistryKind::ALL[choose_or_first(tools.prompter, "Target environment:", &names)?]
        }
    };
    Ok(DeploymentMode {
        ha_mode,
        environment,
    })
}

fn select_template(dir: &Path, pattern: &str, tools: &Toolbox) -> anyhow::Result<PathBuf> {
    let candidates = matching_templates(dir, pattern)?;
    if candidates.is_empty() {
        return Err(InstallError::NoTemplateMatch {
            dir: dir.to_path_buf(),
            pattern: pattern.to_string(),
        }
        .into());
    }
    let names: Vec<String> = candidates
        .iter()
        .map(|p| p.file_name().unwrap_or_default().to_string_lossy().to_string())
        .collect();
    let options: Vec<&str> = names.iter().map(String::as_str).collect();
    let index = choose_strict(
        tools.prompter,
        &format!("Templates matching '{}':", pattern),
        &options,
    )?;
    Ok(candidates[index].clone())
}

fn copy_to(source: &Path, dest: PathBuf) -> anyhow::Result<PathBuf> {
    std::fs::copy(source, &dest)
        .map_err(|e| anyhow::anyhow!("copy {} -> {}: {}", source.display(), dest.display(), e))?;
    tracing::info!(from = %source.display(), to = %dest.display(), "template copied");
    Ok(dest)
}

/// Writes `values.yaml`, `pcs-values.yaml` and, for non-HA, `small_pcs.yaml`
/// into the install dir. Earlier copies stay when a later step fails.
pub fn materialize(
    ctx: &InstallContext,
    tools: &Toolbox,
    mode: DeploymentMode,
) -> anyhow::Result<Vec<PathBuf>> {
    let dir = templates_dir(ctx, tools);
    if !dir.is_dir() {
        return Err(InstallError::MissingTemplate(dir).into());
    }
    let mut written = Vec::new();

    let values = select_template(&dir, mode.environment.environment_name(), tools)?;
    written.push(copy_to(&values, ctx.install_dir.join(VALUES_FILE))?);

    let pcs = select_template(&dir, PCS_PATTERN, tools)?;
    written.push(copy_to(&pcs, ctx.install_dir.join(PCS_VALUES_FILE))?);

    if mode.ha_mode == HaMode::NonHa {
        let small = dir.join(&tools.config.templates.small_pcs);
        if !small.is_file() {
            return Err(InstallError::MissingTemplate(small).into());
        }
        written.push(copy_to(&small, ctx.install_dir.join(SMALL_PCS_FILE))?);
    }
    Ok(written)
}

pub fn configure_values(ctx: &InstallContext, tools: &Toolbox) -> anyhow::Result<Vec<PathBuf>> {
    let mode = collect_mode(ctx, tools)?;
    tracing::info!(ha = ?mode.ha_mode, environment = %mode.environment, "materializing values");
    materialize(ctx, tools, mode)
}
