use crate::domain::models::InstallContext;
use crate::services::toolbox::Toolbox;
use crate::services::{
    expander, fetcher, host_tools, loader, materializer, publisher, selector,
};
use std::fmt;

/// The installer steps, in the order a full run executes them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModuleId {
    CheckRequiredTools,
    InstallUtilities,
    SelectContainerEngine,
    DownloadBinaries,
    ExtractBinaries,
    DecompressImages,
    LoadImages,
    PushImages,
    ConfigureValues,
}

impl ModuleId {
    pub const ALL: [ModuleId; 9] = [
        ModuleId::CheckRequiredTools,
        ModuleId::InstallUtilities,
        ModuleId::SelectContainerEngine,
        ModuleId::DownloadBinaries,
        ModuleId::ExtractBinaries,
        ModuleId::DecompressImages,
        ModuleId::LoadImages,
        ModuleId::PushImages,
        ModuleId::ConfigureValues,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ModuleId::CheckRequiredTools => "check_required_tools",
            ModuleId::InstallUtilities => "install_utilities",
            ModuleId::SelectContainerEngine => "select_container_engine",
            ModuleId::DownloadBinaries => "download_binaries",
            ModuleId::ExtractBinaries => "extract_binaries",
            ModuleId::DecompressImages => "decompress_images",
            ModuleId::LoadImages => "load_images",
            ModuleId::PushImages => "push_images",
            ModuleId::ConfigureValues => "configure_values",
        }
    }

    /// Exact, case-sensitive lookup.
    pub fn from_name(name: &str) -> Option<ModuleId> {
        ModuleId::ALL.into_iter().find(|m| m.name() == name)
    }

    pub fn description(&self) -> &'static str {
        match self {
            ModuleId::CheckRequiredTools => "verify required host executables",
            ModuleId::InstallUtilities => "install missing helper utilities",
            ModuleId::SelectContainerEngine => "choose docker, podman or sudo docker",
            ModuleId::DownloadBinaries => "download the main, pcs and tools bundles",
            ModuleId::ExtractBinaries => "unpack each bundle archive",
            ModuleId::DecompressImages => "decompress zstd image layers",
            ModuleId::LoadImages => "load image archives into the engine",
            ModuleId::PushImages => "retag and push images to a registry",
            ModuleId::ConfigureValues => "materialize values.yaml files from templates",
        }
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One line per module, in run order.
pub fn module_listing() -> String {
    let mut out = String::from("Available modules:\n");
    for m in ModuleId::ALL {
        out.push_str(&format!("  {:<24} {}\n", m.name(), m.description()));
    }
    out
}

pub trait ModuleExecutor {
    fn execute(&mut self, module: ModuleId, ctx: &InstallContext) -> anyhow::Result<()>;
}

/// Dispatches each module to its service.
pub struct Installer<'a> {
    pub tools: Toolbox<'a>,
}

impl ModuleExecutor for Installer<'_> {
    fn execute(&mut self, module: ModuleId, ctx: &InstallContext) -> anyhow::Result<()> {
        let tools = &self.tools;
        match module {
            ModuleId::CheckRequiredTools => {
                host_tools::check_required_tools(tools)?;
            }
            ModuleId::InstallUtilities => {
                let items = host_tools::install_utilities(ctx, tools)?;
                let failed: Vec<&str> = items
                    .iter()
                    .filter(|i| i.status == "failed")
                    .map(|i| i.name.as_str())
                    .collect();
                if !failed.is_empty() {
                    tracing::warn!(utilities = %failed.join(", "), "some utilities could not be installed");
                }
            }
            ModuleId::SelectContainerEngine => {
                selector::select_container_engine(ctx, tools)?;
            }
            ModuleId::DownloadBinaries => {
                fetcher::download_binaries(ctx, tools)?;
            }
            ModuleId::ExtractBinaries => {
                expander::extract_binaries(ctx, tools)?;
            }
            ModuleId::DecompressImages => {
                let summary = expander::decompress_images(ctx, tools)?;
                tracing::info!(
                    decompressed = summary.decompressed.len(),
                    not_overwritten = summary.not_overwritten.len(),
                    "decompression finished"
                );
            }
            ModuleId::LoadImages => {
                loader::load_images(ctx, tools)?;
            }
            ModuleId::PushImages => {
                publisher::publish(ctx, tools)?;
            }
            ModuleId::ConfigureValues => {
                materializer::configure_values(ctx, tools)?;
            }
        }
        Ok(())
    }
}
