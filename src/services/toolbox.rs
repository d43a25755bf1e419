use crate::domain::models::InstallerConfig;
use crate::services::archive::Archiver;
use crate::services::exec::CommandRunner;
use crate::services::fetcher::Downloader;
use crate::services::prompt::Prompter;

/// Capabilities every module receives. Production wiring lives in `main`;
/// tests substitute fakes from `services::testing`.
pub struct Toolbox<'a> {
    pub runner: &'a dyn CommandRunner,
    pub downloader: &'a dyn Downloader,
    pub archiver: &'a dyn Archiver,
    pub prompter: &'a dyn Prompter,
    pub config: &'a InstallerConfig,
}
