//! Backend-specific input collection, authentication and repository
//! provisioning. Credentials stay in the typed inputs below and reach child
//! processes only through stdin.

use crate::domain::constants::{ACR_TOKEN_USERNAME, GAR_KEY_USERNAME};
use crate::domain::errors::InstallError;
use crate::domain::models::{normalize_registry_url, ImageRef, RegistryTarget};
use crate::services::engine::Engine;
use crate::services::exec::{CommandOutput, CommandSpec};
use crate::services::prompt::{ask_or_default, ask_required, ask_secret_required};
use crate::services::toolbox::Toolbox;
use base64::Engine as _;
use serde::Deserialize;
use std::fmt;

const ECR_USERNAME: &str = "AWS";

#[derive(Clone, PartialEq, Eq)]
pub struct GenericInputs {
    pub url: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for GenericInputs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenericInputs")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EcrInputs {
    pub region: String,
    pub endpoint: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AcrInputs {
    pub registry_name: String,
}

#[derive(Clone, PartialEq, Eq)]
pub struct GarInputs {
    pub region: String,
    pub project: String,
    pub repository: String,
    /// Decoded service-account JSON.
    pub key: String,
}

impl fmt::Debug for GarInputs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GarInputs")
            .field("region", &self.region)
            .field("project", &self.project)
            .field("repository", &self.repository)
            .field("key", &"<redacted>")
            .finish()
    }
}

impl GarInputs {
    pub fn server(&self) -> String {
        format!("{}-docker.pkg.dev", self.region)
    }

    pub fn base_url(&self) -> String {
        format!("{}/{}/{}", self.server(), self.project, self.repository)
    }
}

/// Token payload printed by `az acr login --expose-token`.
#[derive(Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AcrToken {
    pub access_token: String,
    pub login_server: String,
}

impl fmt::Debug for AcrToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AcrToken")
            .field("access_token", &"<redacted>")
            .field("login_server", &self.login_server)
            .finish()
    }
}

pub fn collect_generic(tools: &Toolbox) -> anyhow::Result<GenericInputs> {
    Ok(GenericInputs {
        url: ask_required(tools.prompter, "Registry URL")?,
        username: ask_required(tools.prompter, "Registry username")?,
        password: ask_secret_required(tools.prompter, "Registry password")?,
    })
}

pub fn collect_ecr(tools: &Toolbox) -> anyhow::Result<EcrInputs> {
    Ok(EcrInputs {
        region: ask_required(tools.prompter, "AWS region")?,
        endpoint: ask_required(tools.prompter, "ECR registry URL")?,
    })
}

pub fn collect_acr(tools: &Toolbox) -> anyhow::Result<AcrInputs> {
    Ok(AcrInputs {
        registry_name: ask_required(tools.prompter, "Azure container registry name")?,
    })
}

/// The key comes from the environment only; it is never prompted for.
pub fn collect_gar(tools: &Toolbox) -> anyhow::Result<GarInputs> {
    let key = read_gcp_key(&tools.config.gcp_key_env)?;
    Ok(GarInputs {
        region: ask_required(tools.prompter, "GCP region")?,
        project: ask_required(tools.prompter, "GCP project id")?,
        repository: ask_required(tools.prompter, "Artifact Registry repository")?,
        key,
    })
}

/// Asked after authentication succeeds.
pub fn collect_prefix(tools: &Toolbox) -> anyhow::Result<String> {
    ask_or_default(tools.prompter, "Repository prefix (empty for none)", "")
}

fn read_gcp_key(var: &str) -> anyhow::Result<String> {
    let auth_err = |reason: String| InstallError::Authentication {
        registry: "gcp".to_string(),
        reason,
    };
    let encoded = std::env::var(var)
        .map_err(|_| auth_err(format!("environment variable {} is not set", var)))?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| auth_err(format!("{} is not valid base64: {}", var, e)))?;
    String::from_utf8(bytes).map_err(|_| auth_err(format!("{} does not decode to text", var)).into())
}

fn ensure_login(out: CommandOutput, registry: &str) -> anyhow::Result<()> {
    if !out.success {
        return Err(InstallError::Authentication {
            registry: registry.to_string(),
            reason: out.reason(),
        }
        .into());
    }
    tracing::info!(registry = %registry, "logged in");
    Ok(())
}

pub fn login_generic(engine: &Engine, inputs: &GenericInputs) -> anyhow::Result<String> {
    let server = normalize_registry_url(&inputs.url);
    ensure_login(engine.login(&server, &inputs.username, &inputs.password)?, &server)?;
    Ok(server)
}

/// Exchanges AWS credentials for a short-lived registry password.
pub fn login_ecr(engine: &Engine, tools: &Toolbox, inputs: &EcrInputs) -> anyhow::Result<String> {
    let server = normalize_registry_url(&inputs.endpoint);
    let token = tools.runner.run(
        &CommandSpec::new("aws").args(["ecr", "get-login-password", "--region", inputs.region.as_str()]),
    )?;
    if !token.success {
        return Err(InstallError::Authentication {
            registry: server,
            reason: token.reason(),
        }
        .into());
    }
    ensure_login(engine.login(&server, ECR_USERNAME, token.stdout.trim())?, &server)?;
    Ok(server)
}

pub fn parse_acr_token(raw: &str) -> anyhow::Result<AcrToken> {
    let token: AcrToken = serde_json::from_str(raw)
        .map_err(|e| InstallError::InvalidToken(format!("unparseable payload: {}", e)))?;
    if token.access_token.trim().is_empty() {
        return Err(InstallError::InvalidToken("accessToken is empty".to_string()).into());
    }
    if token.login_server.trim().is_empty() {
        return Err(InstallError::InvalidToken("loginServer is empty".to_string()).into());
    }
    Ok(token)
}

/// Interactive `az login`, then a token exchange for the named registry.
/// Returns the login server.
pub fn login_acr(engine: &Engine, tools: &Toolbox, inputs: &AcrInputs) -> anyhow::Result<String> {
    let registry = inputs.registry_name.clone();
    let az = tools
        .runner
        .run(&CommandSpec::new("az").arg("login").interactive())?;
    if !az.success {
        return Err(InstallError::Authentication {
            registry,
            reason: format!("az login: {}", az.reason()),
        }
        .into());
    }
    let exposed = tools.runner.run(&CommandSpec::new("az").args([
        "acr",
        "login",
        "--name",
        registry.as_str(),
        "--expose-token",
        "--output",
        "json",
    ]))?;
    if !exposed.success {
        return Err(InstallError::Authentication {
            registry,
            reason: exposed.reason(),
        }
        .into());
    }
    let token = parse_acr_token(&exposed.stdout)?;
    let server = normalize_registry_url(&token.login_server);
    ensure_login(
        engine.login(&server, ACR_TOKEN_USERNAME, &token.access_token)?,
        &server,
    )?;
    Ok(server)
}

pub fn login_gar(engine: &Engine, inputs: &GarInputs) -> anyhow::Result<String> {
    let server = inputs.server();
    ensure_login(
        engine.login(&format!("https://{}", server), GAR_KEY_USERNAME, &inputs.key)?,
        &server,
    )?;
    Ok(inputs.base_url())
}

/// Remote repositories ECR must hold before pushing: one per local image
/// outside the exclusion predicate, then the auxiliary ones.
pub fn ecr_repositories(target: &RegistryTarget, images: &[ImageRef], auxiliary: &[String]) -> Vec<String> {
    let mut repos: Vec<String> = Vec::new();
    let locals = images
        .iter()
        .filter(|i| !target.excludes(i))
        .map(|i| i.repository.as_str());
    for repo in locals.chain(auxiliary.iter().map(String::as_str)) {
        let remote = target.remote_repository(repo);
        if !repos.contains(&remote) {
            repos.push(remote);
        }
    }
    repos
}

/// Describe each repository and create the missing ones. Any failed create
/// aborts.
pub fn provision_ecr(tools: &Toolbox, region: &str, repositories: &[String]) -> anyhow::Result<usize> {
    let mut created = 0;
    for repo in repositories {
        let described = tools.runner.run(&CommandSpec::new("aws").args([
            "ecr",
            "describe-repositories",
            "--region",
            region,
            "--repository-names",
            repo.as_str(),
        ]))?;
        if described.success {
            tracing::debug!(repository = %repo, "repository exists");
            continue;
        }
        let out = tools.runner.run(&CommandSpec::new("aws").args([
            "ecr",
            "create-repository",
            "--region",
            region,
            "--repository-name",
            repo.as_str(),
        ]))?;
        if !out.success {
            return Err(InstallError::Provisioning {
                repository: repo.clone(),
                reason: out.reason(),
            }
            .into());
        }
        tracing::info!(repository = %repo, "repository created");
        created += 1;
    }
    Ok(created)
}
