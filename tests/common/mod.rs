#![allow(dead_code)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const VERSION: &str = "10.2.0";

pub struct TestEnv {
    _tmp: TempDir,
    pub home: PathBuf,
    pub parent: PathBuf,
    pub config: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let home = tmp.path().join("home");
        let parent = tmp.path().join("installs");
        fs::create_dir_all(&home).expect("create isolated home");
        fs::create_dir_all(&parent).expect("create parent dir");
        let config = tmp.path().join("config.toml");

        Self {
            _tmp: tmp,
            home,
            parent,
            config,
        }
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("dr-install");
        cmd.env("HOME", &self.home).env_remove("DR_INSTALL_LOG");
        cmd
    }

    /// Command with `--config` pointing at the env's config file.
    pub fn configured(&self) -> Command {
        let mut cmd = self.cmd();
        cmd.arg("--config").arg(&self.config);
        cmd
    }

    /// Writes a config with version and parent dir preset, plus `extra`.
    pub fn write_config(&self, extra: &str) {
        let body = format!(
            "version = \"{}\"\nparent_dir = \"{}\"\n{}",
            VERSION,
            self.parent.display(),
            extra
        );
        fs::write(&self.config, body).expect("write config");
    }

    pub fn install_dir(&self) -> PathBuf {
        self.parent.join(format!("DataRobot-{}", VERSION))
    }

    pub fn binary_dir(&self, name: &str) -> PathBuf {
        self.install_dir().join(name)
    }

    pub fn log_file(&self) -> PathBuf {
        self.home.join(".config/dr-install/install.log")
    }
}

/// Tar archive holding `entries` as regular files.
pub fn write_tar(path: &Path, entries: &[(&str, &[u8])]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create archive dir");
    }
    let mut builder = tar::Builder::new(fs::File::create(path).expect("create archive"));
    for (name, data) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, name, *data)
            .expect("append entry");
    }
    builder.finish().expect("finish archive");
}

pub fn write_templates(dir: &Path, with_small: bool) {
    fs::create_dir_all(dir).expect("create templates dir");
    for name in [
        "aws_values.yaml",
        "azure_values.yaml",
        "generic_values.yaml",
        "pcs_values.yaml",
    ] {
        fs::write(dir.join(name), format!("# {}\n", name)).expect("write template");
    }
    if with_small {
        fs::write(dir.join("small_pcs_values.yaml"), "# small\n").expect("write small template");
    }
}
