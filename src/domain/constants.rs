pub const INSTALL_DIR_PREFIX: &str = "DataRobot-";

pub const DEFAULT_DOCKER_SOCKET: &str = "/var/run/docker.sock";
pub const DEFAULT_GCP_KEY_ENV: &str = "GCP_SA_KEY_B64";

pub const DEFAULT_MAIN_URL: &str =
    "https://s3.amazonaws.com/datarobot-enterprise-releases/{version}/datarobot-release-{version}.tar";
pub const DEFAULT_PCS_URL: &str =
    "https://s3.amazonaws.com/datarobot-enterprise-releases/{version}/datarobot-pcs-{version}.tar";
pub const DEFAULT_TOOLS_URL: &str =
    "https://s3.amazonaws.com/datarobot-enterprise-releases/{version}/datarobot-tools-{version}.tar";

pub const DEFAULT_REQUIRED_TOOLS: &[&str] = &["tar", "sudo"];

/// Engine login identity used with an ACR exchange token.
pub const ACR_TOKEN_USERNAME: &str = "00000000-0000-0000-0000-000000000000";
/// Engine login identity used with a GCP service-account key.
pub const GAR_KEY_USERNAME: &str = "_json_key";

/// Substring every backend treats as "already a remote image".
pub const REGISTRY_MARKER: &str = "registry";

pub const DEFAULT_ECR_AUXILIARY_REPOSITORIES: &[&str] = &[
    "base-image",
    "managed-image",
    "ephemeral-image",
    "custom-apps/managed-image",
    "custom-apps/ephemeral-image",
];

pub const TEMPLATES_SUBDIR: &str = "templates";
pub const IMAGES_SUBDIR: &str = "images";
pub const EXTRACTED_SUBDIR: &str = "extracted";
pub const DEFAULT_SMALL_PCS_TEMPLATE: &str = "small_pcs_values.yaml";

pub const VALUES_FILE: &str = "values.yaml";
pub const PCS_VALUES_FILE: &str = "pcs-values.yaml";
pub const SMALL_PCS_FILE: &str = "small_pcs.yaml";

pub const ZSTD_EXTENSION: &str = "zst";
pub const TAR_EXTENSION: &str = "tar";
/// Long-distance-match window accepted when decompressing image layers.
pub const ZSTD_WINDOW_LOG_MAX: u32 = 31;
