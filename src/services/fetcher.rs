use crate::domain::constants::TAR_EXTENSION;
use crate::domain::errors::InstallError;
use crate::domain::models::{BinaryKind, BinarySource, BinarySpec, InstallContext};
use crate::services::toolbox::Toolbox;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub trait Downloader {
    /// Streams `url` into `dest`, returning the number of bytes written.
    fn download(&self, url: &str, dest: &Path) -> anyhow::Result<u64>;
}

pub struct HttpDownloader {
    client: reqwest::blocking::Client,
}

impl HttpDownloader {
    /// Release bundles are several gigabytes; requests never time out.
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(None::<Duration>)
            .build()?;
        Ok(Self { client })
    }
}

impl Downloader for HttpDownloader {
    fn download(&self, url: &str, dest: &Path) -> anyhow::Result<u64> {
        let mut resp = self.client.get(url).send()?.error_for_status()?;
        let mut out = BufWriter::new(std::fs::File::create(dest)?);
        let written = resp.copy_to(&mut out)?;
        out.flush()?;
        Ok(written)
    }
}

/// Last path segment of `url` without query or fragment.
pub fn url_basename(url: &str, kind: BinaryKind) -> String {
    let trimmed = url.split(['?', '#']).next().unwrap_or_default();
    match trimmed.trim_end_matches('/').rsplit('/').next() {
        Some(name) if !name.is_empty() && !name.contains(':') => name.to_string(),
        _ => format!("{}.{}", kind.name(), TAR_EXTENSION),
    }
}

pub fn with_tar_suffix(path: &Path) -> PathBuf {
    if path.extension().and_then(|e| e.to_str()) == Some(TAR_EXTENSION) {
        return path.to_path_buf();
    }
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(TAR_EXTENSION);
    path.with_file_name(name)
}

/// Idempotence marker: the archive exists with or without its `.tar` suffix.
pub fn existing_archive(path: &Path) -> Option<PathBuf> {
    [path.to_path_buf(), with_tar_suffix(path)]
        .into_iter()
        .find(|p| p.is_file())
}

fn source_url(kind: BinaryKind, ctx: &InstallContext, tools: &Toolbox) -> anyhow::Result<String> {
    let url = match tools.config.binary_source {
        BinarySource::Table => tools.config.binaries.url_for(kind, &ctx.version),
        BinarySource::Prompt => {
            tools
                .prompter
                .ask(&format!("Download URL for the {} bundle:", kind))?
        }
    };
    let url = url.trim().to_string();
    if url.is_empty() {
        return Err(InstallError::MissingUrl(kind.to_string()).into());
    }
    Ok(url)
}

pub fn resolve_binaries(ctx: &InstallContext, tools: &Toolbox) -> anyhow::Result<Vec<BinarySpec>> {
    BinaryKind::ALL
        .iter()
        .map(|&kind| {
            let source_url = source_url(kind, ctx, tools)?;
            let archive_path = ctx.binary_dir(kind).join(url_basename(&source_url, kind));
            Ok(BinarySpec {
                kind,
                source_url,
                archive_path,
            })
        })
        .collect()
}

/// Downloads the three bundles, skipping any already on disk. Any failure
/// aborts; a partial download is left where it is.
pub fn download_binaries(ctx: &InstallContext, tools: &Toolbox) -> anyhow::Result<Vec<PathBuf>> {
    let specs = resolve_binaries(ctx, tools)?;
    let mut archives = Vec::new();
    for spec in specs {
        let dir = ctx.binary_dir(spec.kind);
        std::fs::create_dir_all(&dir).map_err(|e| InstallError::DirectoryCreation {
            path: dir.clone(),
            reason: e.to_string(),
        })?;

        if let Some(existing) = existing_archive(&spec.archive_path) {
            tracing::info!(
                binary = %spec.kind,
                path = %existing.display(),
                "already downloaded, skipping"
            );
            archives.push(existing);
            continue;
        }

        tracing::info!(binary = %spec.kind, url = %spec.source_url, "downloading");
        let bytes = tools
            .downloader
            .download(&spec.source_url, &spec.archive_path)
            .map_err(|e| InstallError::Download {
                url: spec.source_url.clone(),
                reason: e.to_string(),
            })?;

        let final_path = with_tar_suffix(&spec.archive_path);
        if final_path != spec.archive_path {
            std::fs::rename(&spec.archive_path, &final_path)?;
        }
        tracing::info!(binary = %spec.kind, bytes, path = %final_path.display(), "downloaded");
        archives.push(final_path);
    }
    Ok(archives)
}
