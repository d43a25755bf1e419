use crate::domain::constants::*;
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use std::fmt;
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinaryKind {
    Main,
    Pcs,
    Tools,
}

impl BinaryKind {
    pub const ALL: [BinaryKind; 3] = [BinaryKind::Main, BinaryKind::Pcs, BinaryKind::Tools];
    pub const IMAGE_BEARING: [BinaryKind; 2] = [BinaryKind::Main, BinaryKind::Pcs];

    pub fn name(&self) -> &'static str {
        match self {
            BinaryKind::Main => "main",
            BinaryKind::Pcs => "pcs",
            BinaryKind::Tools => "tools",
        }
    }
}

impl fmt::Display for BinaryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BinarySpec {
    pub kind: BinaryKind,
    pub source_url: String,
    pub archive_path: PathBuf,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContainerEngine {
    #[default]
    Docker,
    Podman,
    SudoDocker,
}

impl ContainerEngine {
    pub const ALL: [ContainerEngine; 3] = [
        ContainerEngine::Docker,
        ContainerEngine::Podman,
        ContainerEngine::SudoDocker,
    ];

    /// Program and leading arguments every engine call starts with.
    pub fn invocation(&self) -> &'static [&'static str] {
        match self {
            ContainerEngine::Docker => &["docker"],
            ContainerEngine::Podman => &["podman"],
            ContainerEngine::SudoDocker => &["sudo", "docker"],
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ContainerEngine::Docker => "docker",
            ContainerEngine::Podman => "podman (rootless)",
            ContainerEngine::SudoDocker => "sudo docker",
        }
    }

    /// Plain docker talks to the daemon socket directly and needs it opened up.
    pub fn needs_socket_access(&self) -> bool {
        matches!(self, ContainerEngine::Docker)
    }
}

impl fmt::Display for ContainerEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.invocation().join(" "))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IsolationPolicy {
    /// Log a failed tag/push and continue with the next image.
    PerImage,
    /// The first failed tag/push aborts the run.
    AbortBatch,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RegistryKind {
    Generic,
    AwsEcr,
    AzureAcr,
    GcpGar,
}

impl RegistryKind {
    pub const ALL: [RegistryKind; 4] = [
        RegistryKind::Generic,
        RegistryKind::AwsEcr,
        RegistryKind::AzureAcr,
        RegistryKind::GcpGar,
    ];

    /// Name matched against template file names by the values materializer.
    pub fn environment_name(&self) -> &'static str {
        match self {
            RegistryKind::Generic => "generic",
            RegistryKind::AwsEcr => "aws",
            RegistryKind::AzureAcr => "azure",
            RegistryKind::GcpGar => "gcp",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RegistryKind::Generic => "generic registry (harbor, nexus, artifactory, ...)",
            RegistryKind::AwsEcr => "AWS ECR",
            RegistryKind::AzureAcr => "Azure ACR",
            RegistryKind::GcpGar => "GCP Artifact Registry",
        }
    }

    pub fn default_isolation(&self) -> IsolationPolicy {
        match self {
            RegistryKind::AwsEcr => IsolationPolicy::AbortBatch,
            RegistryKind::Generic | RegistryKind::AzureAcr | RegistryKind::GcpGar => {
                IsolationPolicy::PerImage
            }
        }
    }
}

impl fmt::Display for RegistryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.environment_name())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ImageRef {
    pub repository: String,
    pub tag: String,
}

impl ImageRef {
    pub fn new(repository: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            tag: tag.into(),
        }
    }

    /// Parses `repository[:tag]`, where a colon before the last `/` belongs
    /// to a registry port. Dangling `<none>` entries yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        let (repository, tag) = match raw.rsplit_once(':') {
            Some((repo, tag)) if !tag.contains('/') => (repo, tag),
            _ => (raw, "latest"),
        };
        if repository.is_empty() || repository == "<none>" || tag == "<none>" {
            return None;
        }
        Some(Self::new(repository, tag))
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.repository, self.tag)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistryTarget {
    pub kind: RegistryKind,
    pub base_url: String,
    pub repository_prefix: String,
    pub exclusions: Vec<String>,
}

impl RegistryTarget {
    pub fn new(kind: RegistryKind, base_url: &str, repository_prefix: &str) -> Self {
        let base_url = normalize_registry_url(base_url);
        let mut exclusions = vec![REGISTRY_MARKER.to_string()];
        let host = registry_host(&base_url);
        if !host.is_empty() {
            exclusions.push(host.to_string());
        }
        Self {
            kind,
            base_url,
            repository_prefix: repository_prefix.trim().trim_matches('/').to_string(),
            exclusions,
        }
    }

    pub fn with_exclusions(mut self, extra: &[String]) -> Self {
        for e in extra {
            let e = e.trim();
            if !e.is_empty() && !self.exclusions.iter().any(|x| x == e) {
                self.exclusions.push(e.to_string());
            }
        }
        self
    }

    pub fn host(&self) -> &str {
        registry_host(&self.base_url)
    }

    /// True for images that already live in a registry and must not be re-pushed.
    pub fn excludes(&self, image: &ImageRef) -> bool {
        self.exclusions
            .iter()
            .any(|e| image.repository.contains(e.as_str()))
    }

    /// Remote name for a local image. Generic registries replace the first
    /// path segment with the registry URL (`datarobot/app` and `app` both
    /// become `{base}/app`). Other backends use `{base}/{prefix}/{repository}`
    /// with an empty prefix left out.
    pub fn destination(&self, image: &ImageRef) -> ImageRef {
        if self.kind == RegistryKind::Generic {
            let name = image
                .repository
                .split_once('/')
                .map(|(_, rest)| rest)
                .unwrap_or(&image.repository);
            return ImageRef::new(format!("{}/{}", self.base_url, name), image.tag.clone());
        }
        let mut parts = vec![self.base_url.as_str()];
        if !self.repository_prefix.is_empty() {
            parts.push(self.repository_prefix.as_str());
        }
        parts.push(image.repository.as_str());
        ImageRef::new(parts.join("/"), image.tag.clone())
    }

    /// Repository name inside the registry (no host), as ECR wants it.
    pub fn remote_repository(&self, repository: &str) -> String {
        if self.repository_prefix.is_empty() {
            repository.to_string()
        } else {
            format!("{}/{}", self.repository_prefix, repository)
        }
    }
}

pub fn normalize_registry_url(raw: &str) -> String {
    let s = raw.trim();
    let s = s
        .strip_prefix("https://")
        .or_else(|| s.strip_prefix("http://"))
        .unwrap_or(s);
    s.trim_end_matches('/').to_string()
}

fn registry_host(base_url: &str) -> &str {
    base_url.split('/').next().unwrap_or_default()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HaMode {
    Ha,
    NonHa,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeploymentMode {
    pub ha_mode: HaMode,
    pub environment: RegistryKind,
}

/// Install-wide state owned by the runner. Version and directories are fixed
/// at startup; engine and environment are each recorded once by their module.
#[derive(Debug)]
pub struct InstallContext {
    pub version: String,
    pub parent_dir: PathBuf,
    pub install_dir: PathBuf,
    engine: OnceCell<ContainerEngine>,
    environment: OnceCell<RegistryKind>,
}

impl InstallContext {
    pub fn new(version: &str, parent_dir: impl Into<PathBuf>) -> Self {
        let version = version.trim().to_string();
        let parent_dir = parent_dir.into();
        let install_dir = parent_dir.join(format!("{}{}", INSTALL_DIR_PREFIX, version));
        Self {
            version,
            parent_dir,
            install_dir,
            engine: OnceCell::new(),
            environment: OnceCell::new(),
        }
    }

    pub fn binary_dir(&self, kind: BinaryKind) -> PathBuf {
        self.install_dir.join(kind.name())
    }

    /// Returns false when an engine was already recorded.
    pub fn set_engine(&self, engine: ContainerEngine) -> bool {
        self.engine.set(engine).is_ok()
    }

    pub fn engine(&self) -> Option<ContainerEngine> {
        self.engine.get().copied()
    }

    pub fn record_environment(&self, kind: RegistryKind) -> bool {
        self.environment.set(kind).is_ok()
    }

    pub fn environment(&self) -> Option<RegistryKind> {
        self.environment.get().copied()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinarySource {
    /// URLs come from the `[binaries]` table.
    #[default]
    Table,
    /// URLs are asked for interactively.
    Prompt,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractLayout {
    /// Unpack into `<binary>/extracted`.
    #[default]
    Subdirectory,
    /// Unpack next to the archive in `<binary>`.
    InPlace,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct InstallerConfig {
    pub version: Option<String>,
    pub parent_dir: Option<PathBuf>,
    pub strict_required_tools: bool,
    pub required_tools: Vec<String>,
    pub binary_source: BinarySource,
    pub binaries: BinaryUrls,
    pub extract_layout: ExtractLayout,
    pub docker_socket: String,
    pub gcp_key_env: String,
    pub publish: PublishConfig,
    pub templates: TemplatesConfig,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            version: None,
            parent_dir: None,
            strict_required_tools: true,
            required_tools: DEFAULT_REQUIRED_TOOLS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            binary_source: BinarySource::default(),
            binaries: BinaryUrls::default(),
            extract_layout: ExtractLayout::default(),
            docker_socket: DEFAULT_DOCKER_SOCKET.to_string(),
            gcp_key_env: DEFAULT_GCP_KEY_ENV.to_string(),
            publish: PublishConfig::default(),
            templates: TemplatesConfig::default(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct BinaryUrls {
    pub main: String,
    pub pcs: String,
    pub tools: String,
}

impl Default for BinaryUrls {
    fn default() -> Self {
        Self {
            main: DEFAULT_MAIN_URL.to_string(),
            pcs: DEFAULT_PCS_URL.to_string(),
            tools: DEFAULT_TOOLS_URL.to_string(),
        }
    }
}

impl BinaryUrls {
    pub fn url_for(&self, kind: BinaryKind, version: &str) -> String {
        let template = match kind {
            BinaryKind::Main => &self.main,
            BinaryKind::Pcs => &self.pcs,
            BinaryKind::Tools => &self.tools,
        };
        template.replace("{version}", version)
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct PublishConfig {
    pub isolation: Option<IsolationPolicy>,
    pub exclude: Vec<String>,
    pub gcp_push_images: bool,
    pub ecr_auxiliary_repositories: Vec<String>,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            isolation: None,
            exclude: Vec::new(),
            gcp_push_images: false,
            ecr_auxiliary_repositories: DEFAULT_ECR_AUXILIARY_REPOSITORIES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl PublishConfig {
    pub fn isolation_for(&self, kind: RegistryKind) -> IsolationPolicy {
        self.isolation.unwrap_or_else(|| kind.default_isolation())
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct TemplatesConfig {
    /// Relative to the install directory unless absolute. Defaults to the
    /// `templates` folder of the extracted tools bundle.
    pub dir: Option<PathBuf>,
    pub small_pcs: String,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            dir: None,
            small_pcs: DEFAULT_SMALL_PCS_TEMPLATE.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckItem {
    pub name: String,
    pub status: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PushReport {
    pub pushed: Vec<ImageRef>,
    pub skipped: Vec<ImageRef>,
    pub failed: Vec<ImageRef>,
}
