use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "dr-install",
    version,
    about = "Interactive DataRobot bundle installer",
    after_help = "Without flags every module runs in order. Use --only with no name to list modules."
)]
pub struct Cli {
    #[arg(long, help = "Ask before running each module", conflicts_with = "only")]
    pub prompt: bool,
    #[arg(
        long,
        value_name = "MODULE",
        num_args = 0..=1,
        default_missing_value = "",
        help = "Run a single module by name"
    )]
    pub only: Option<String>,
    #[arg(long, value_name = "PATH", help = "Config file (default: ~/.config/dr-install/config.toml)")]
    pub config: Option<PathBuf>,
}
