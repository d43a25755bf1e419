use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum InstallError {
    #[error("required tool not found on PATH: {0}")]
    MissingRequiredTool(String),
    #[error("failed to create directory {path}: {reason}")]
    DirectoryCreation { path: PathBuf, reason: String },
    #[error("no source URL provided for {0}")]
    MissingUrl(String),
    #[error("download of {url} failed: {reason}")]
    Download { url: String, reason: String },
    #[error("decompression of {path} failed: {reason}")]
    Decompression { path: PathBuf, reason: String },
    #[error("loading image archive {path} failed: {reason}")]
    ImageLoad { path: PathBuf, reason: String },
    #[error("authentication against {registry} failed: {reason}")]
    Authentication { registry: String, reason: String },
    #[error("invalid registry token: {0}")]
    InvalidToken(String),
    #[error("provisioning repository {repository} failed: {reason}")]
    Provisioning { repository: String, reason: String },
    #[error("pushing {image} failed: {reason}")]
    Push { image: String, reason: String },
    #[error("no template in {dir} matches '{pattern}'")]
    NoTemplateMatch { dir: PathBuf, pattern: String },
    #[error("selection '{0}' is out of range")]
    SelectionOutOfRange(String),
    #[error("required template file missing: {0}")]
    MissingTemplate(PathBuf),
    #[error("cannot change permissions on engine socket {path}: {reason}")]
    SocketPermission { path: String, reason: String },
}
