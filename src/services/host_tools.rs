use crate::domain::errors::InstallError;
use crate::domain::models::{CheckItem, InstallContext};
use crate::services::exec::CommandSpec;
use crate::services::toolbox::Toolbox;
use std::path::{Path, PathBuf};

const INSTALL_PREFIX: &str = "/usr/local/bin";
const STAGING_DIR: &str = ".staging";

/// How a missing utility gets onto the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Recipe {
    /// Single executable downloaded straight into the install prefix.
    Binary { url: &'static str },
    /// Gzipped tarball; `member` is the executable inside it.
    Tarball {
        url: &'static str,
        member: &'static str,
    },
    /// apt-get first, yum when apt-get is unavailable or fails.
    Package {
        apt: &'static str,
        yum: &'static str,
        service: Option<&'static str>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Utility {
    pub name: &'static str,
    pub recipe: Recipe,
}

pub const UTILITIES: &[Utility] = &[
    Utility {
        name: "jq",
        recipe: Recipe::Binary {
            url: "https://github.com/jqlang/jq/releases/download/jq-1.7.1/jq-linux-amd64",
        },
    },
    Utility {
        name: "yq",
        recipe: Recipe::Binary {
            url: "https://github.com/mikefarah/yq/releases/download/v4.44.3/yq_linux_amd64",
        },
    },
    Utility {
        name: "kubectl",
        recipe: Recipe::Binary {
            url: "https://dl.k8s.io/release/v1.30.4/bin/linux/amd64/kubectl",
        },
    },
    Utility {
        name: "helm",
        recipe: Recipe::Tarball {
            url: "https://get.helm.sh/helm-v3.15.4-linux-amd64.tar.gz",
            member: "linux-amd64/helm",
        },
    },
    Utility {
        name: "zstd",
        recipe: Recipe::Package {
            apt: "zstd",
            yum: "zstd",
            service: None,
        },
    },
    Utility {
        name: "pigz",
        recipe: Recipe::Package {
            apt: "pigz",
            yum: "pigz",
            service: None,
        },
    },
    Utility {
        name: "unzip",
        recipe: Recipe::Package {
            apt: "unzip",
            yum: "unzip",
            service: None,
        },
    },
    Utility {
        name: "docker",
        recipe: Recipe::Package {
            apt: "docker.io",
            yum: "docker",
            service: Some("docker"),
        },
    },
];

/// Verifies the required executables. In strict mode the first missing one
/// aborts the run; in lenient mode each is logged and the check passes.
pub fn check_required_tools(tools: &Toolbox) -> anyhow::Result<Vec<CheckItem>> {
    let mut items = Vec::new();
    for name in &tools.config.required_tools {
        match tools.runner.locate(name) {
            Some(path) => {
                tracing::info!(tool = %name, path = %path.display(), "found");
                items.push(CheckItem {
                    name: name.clone(),
                    status: "ok".to_string(),
                });
            }
            None if tools.config.strict_required_tools => {
                return Err(InstallError::MissingRequiredTool(name.clone()).into());
            }
            None => {
                tracing::error!(tool = %name, "required tool not found; continuing (lenient mode)");
                items.push(CheckItem {
                    name: name.clone(),
                    status: "missing".to_string(),
                });
            }
        }
    }
    Ok(items)
}

/// Installs whatever utilities are missing. Installation failures are logged
/// and never abort; the step that needs the tool fails later instead.
pub fn install_utilities(ctx: &InstallContext, tools: &Toolbox) -> anyhow::Result<Vec<CheckItem>> {
    let staging = ctx.install_dir.join(STAGING_DIR);
    let mut items = Vec::new();
    for utility in UTILITIES {
        let status = if tools.runner.locate(utility.name).is_some() {
            tracing::info!(tool = utility.name, "already installed");
            "present"
        } else {
            tracing::info!(tool = utility.name, "not found, installing");
            match install_one(utility, &staging, tools) {
                Ok(()) => {
                    tracing::info!(tool = utility.name, "installed");
                    "installed"
                }
                Err(e) => {
                    tracing::error!(tool = utility.name, error = %e, "installation failed");
                    "failed"
                }
            }
        };
        items.push(CheckItem {
            name: utility.name.to_string(),
            status: status.to_string(),
        });
    }
    if staging.exists() {
        if let Err(e) = std::fs::remove_dir_all(&staging) {
            tracing::warn!(path = %staging.display(), error = %e, "could not remove staging dir");
        }
    }
    Ok(items)
}

fn install_one(utility: &Utility, staging: &Path, tools: &Toolbox) -> anyhow::Result<()> {
    match utility.recipe {
        Recipe::Binary { url } => {
            std::fs::create_dir_all(staging)?;
            let file = staging.join(utility.name);
            tools.downloader.download(url, &file)?;
            install_executable(&file, utility.name, tools)
        }
        Recipe::Tarball { url, member } => {
            std::fs::create_dir_all(staging)?;
            let archive = staging.join(format!("{}.tar.gz", utility.name));
            tools.downloader.download(url, &archive)?;
            let unpacked = staging.join(format!("{}-unpacked", utility.name));
            tools.archiver.unpack(&archive, &unpacked)?;
            install_executable(&unpacked.join(member), utility.name, tools)
        }
        Recipe::Package { apt, yum, service } => {
            install_package(apt, yum, tools)?;
            if let Some(service) = service {
                tools
                    .runner
                    .run_checked(&CommandSpec::new("sudo").args(["systemctl", "start", service]))?;
            }
            Ok(())
        }
    }
}

fn install_executable(file: &Path, name: &str, tools: &Toolbox) -> anyhow::Result<()> {
    let dest: PathBuf = Path::new(INSTALL_PREFIX).join(name);
    tools.runner.run_checked(
        &CommandSpec::new("sudo")
            .args(["install", "-m", "0755"])
            .arg(file.display().to_string())
            .arg(dest.display().to_string()),
    )?;
    Ok(())
}

fn install_package(apt: &str, yum: &str, tools: &Toolbox) -> anyhow::Result<()> {
    if tools.runner.locate("apt-get").is_some() {
        let out = tools
            .runner
            .run(&CommandSpec::new("sudo").args(["apt-get", "install", "-y", apt]))?;
        if out.success {
            return Ok(());
        }
        tracing::warn!(package = apt, reason = %out.reason(), "apt-get failed, trying yum");
    }
    tools
        .runner
        .run_checked(&CommandSpec::new("sudo").args(["yum", "install", "-y", yum]))?;
    Ok(())
}
