use crate::domain::models::InstallerConfig;
use std::path::{Path, PathBuf};

pub fn app_config_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")?;
    Ok(PathBuf::from(home).join(".config/dr-install"))
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(app_config_dir()?.join("config.toml"))
}

/// Loads the installer config. A missing default file means all defaults;
/// an explicitly named file must exist.
pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<InstallerConfig> {
    let path = match explicit {
        Some(p) => {
            if !p.exists() {
                anyhow::bail!("config file not found: {}", p.display());
            }
            p.to_path_buf()
        }
        None => {
            let p = default_config_path()?;
            if !p.exists() {
                return Ok(InstallerConfig::default());
            }
            p
        }
    };
    let raw = std::fs::read_to_string(&path)?;
    let cfg: InstallerConfig = toml::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("invalid config {}: {}", path.display(), e))?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(cfg)
}
