use clap::Parser;
use std::path::Path;

mod cli;
mod commands;
mod domain;
mod services;

use cli::Cli;
use commands::{module_listing, run_modules, Installer, ModuleId, RunMode};
use services::archive::NativeArchiver;
use services::exec::SystemRunner;
use services::fetcher::HttpDownloader;
use services::prompt::TerminalPrompter;
use services::toolbox::Toolbox;
use services::{config, logging, setup};

/// `None` means the module listing was requested, explicitly or by an
/// unknown name.
fn resolve_mode(cli: &Cli) -> Option<RunMode> {
    match cli.only.as_deref() {
        Some(name) => match ModuleId::from_name(name) {
            Some(module) => Some(RunMode::Only(module)),
            None => {
                if !name.is_empty() {
                    eprintln!("unknown module: {}", name);
                }
                None
            }
        },
        None if cli.prompt => Some(RunMode::Prompted),
        None => Some(RunMode::Full),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let Some(mode) = resolve_mode(&cli) else {
        print!("{}", module_listing());
        return Ok(());
    };

    let log_path = logging::init()?;
    if let Err(e) = run(&cli, mode, &log_path) {
        tracing::error!(error = %format!("{:#}", e), "installation failed");
        return Err(e);
    }
    Ok(())
}

fn run(cli: &Cli, mode: RunMode, log_path: &Path) -> anyhow::Result<()> {
    let config = config::load_config(cli.config.as_deref())?;
    tracing::info!(log = %log_path.display(), mode = ?mode, "dr-install starting");

    let prompter = TerminalPrompter;
    let ctx = setup::collect_install_context(&config, &prompter)?;
    setup::prepare_install_dir(&ctx)?;

    let downloader = HttpDownloader::new()?;
    let tools = Toolbox {
        runner: &SystemRunner,
        downloader: &downloader,
        archiver: &NativeArchiver,
        prompter: &prompter,
        config: &config,
    };
    let mut installer = Installer { tools };
    let summary = run_modules(mode, &ctx, &mut installer, &prompter)?;

    tracing::info!(
        executed = summary.executed.len(),
        skipped = summary.skipped.len(),
        install_dir = %ctx.install_dir.display(),
        "installation steps complete"
    );
    Ok(())
}
