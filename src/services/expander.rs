use crate::domain::constants::{EXTRACTED_SUBDIR, IMAGES_SUBDIR, TAR_EXTENSION, ZSTD_EXTENSION};
use crate::domain::errors::InstallError;
use crate::domain::models::{BinaryKind, ExtractLayout, InstallContext};
use crate::services::toolbox::Toolbox;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExtractOutcome {
    Extracted(PathBuf),
    AlreadyPresent(PathBuf),
    MissingArchive,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecompressSummary {
    pub decompressed: Vec<PathBuf>,
    /// Files whose output already existed; left untouched.
    pub not_overwritten: Vec<PathBuf>,
}

/// Directory the bundle for `kind` is unpacked into.
pub fn extraction_root(ctx: &InstallContext, layout: ExtractLayout, kind: BinaryKind) -> PathBuf {
    match layout {
        ExtractLayout::Subdirectory => ctx.binary_dir(kind).join(EXTRACTED_SUBDIR),
        ExtractLayout::InPlace => ctx.binary_dir(kind),
    }
}

/// Presence of this path means the outer pass already ran for `kind`.
fn extraction_marker(ctx: &InstallContext, layout: ExtractLayout, kind: BinaryKind) -> PathBuf {
    match layout {
        ExtractLayout::Subdirectory => extraction_root(ctx, layout, kind),
        ExtractLayout::InPlace => ctx.binary_dir(kind).join(IMAGES_SUBDIR),
    }
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(ext)
}

/// The bundle archive directly inside `dir`. With several candidates the
/// lexicographically first one wins.
pub fn find_archive(dir: &Path) -> anyhow::Result<Option<PathBuf>> {
    if !dir.is_dir() {
        return Ok(None);
    }
    let mut tars = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && has_extension(&path, TAR_EXTENSION) {
            tars.push(path);
        }
    }
    tars.sort();
    if tars.len() > 1 {
        tracing::warn!(
            dir = %dir.display(),
            count = tars.len(),
            chosen = %tars[0].display(),
            "several archives found, using the first"
        );
    }
    Ok(tars.into_iter().next())
}

/// `name` under the extraction root, or one level down when the bundle
/// wraps everything in a top-level folder.
pub fn bundle_subdir(root: &Path, name: &str) -> Option<PathBuf> {
    let direct = root.join(name);
    if direct.is_dir() {
        return Some(direct);
    }
    let mut children: Vec<PathBuf> = std::fs::read_dir(root)
        .ok()?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_dir())
        .collect();
    children.sort();
    children
        .into_iter()
        .map(|c| c.join(name))
        .find(|c| c.is_dir())
}

pub fn images_dir(root: &Path) -> Option<PathBuf> {
    bundle_subdir(root, IMAGES_SUBDIR)
}

/// Every file below `dir` with extension `ext`, sorted.
pub fn files_with_extension(dir: &Path, ext: &str) -> anyhow::Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    collect_files(dir, ext, &mut out)?;
    out.sort();
    Ok(out)
}

fn collect_files(dir: &Path, ext: &str, out: &mut Vec<PathBuf>) -> anyhow::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            collect_files(&path, ext, out)?;
        } else if has_extension(&path, ext) {
            out.push(path);
        }
    }
    Ok(())
}

/// Outer pass: unpack each bundle archive once. A missing archive skips that
/// binary; an unreadable archive aborts.
pub fn extract_binaries(
    ctx: &InstallContext,
    tools: &Toolbox,
) -> anyhow::Result<Vec<(BinaryKind, ExtractOutcome)>> {
    let layout = tools.config.extract_layout;
    let mut outcomes = Vec::new();
    for kind in BinaryKind::ALL {
        let marker = extraction_marker(ctx, layout, kind);
        let root = extraction_root(ctx, layout, kind);
        if marker.exists() {
            tracing::info!(binary = %kind, path = %marker.display(), "already extracted, skipping");
            outcomes.push((kind, ExtractOutcome::AlreadyPresent(root)));
            continue;
        }

        let Some(archive) = find_archive(&ctx.binary_dir(kind))? else {
            tracing::error!(binary = %kind, dir = %ctx.binary_dir(kind).display(), "no .tar archive found, skipping");
            outcomes.push((kind, ExtractOutcome::MissingArchive));
            continue;
        };

        tracing::info!(binary = %kind, archive = %archive.display(), dest = %root.display(), "extracting");
        tools.archiver.unpack(&archive, &root)?;
        outcomes.push((kind, ExtractOutcome::Extracted(root)));
    }
    Ok(outcomes)
}

/// Inner pass: decompress every `.zst` layer under the images directories.
/// Not idempotent. An existing output is a per-file failure that is logged;
/// a corrupt stream aborts.
pub fn decompress_images(ctx: &InstallContext, tools: &Toolbox) -> anyhow::Result<DecompressSummary> {
    let layout = tools.config.extract_layout;
    let mut summary = DecompressSummary::default();
    for kind in BinaryKind::IMAGE_BEARING {
        let root = extraction_root(ctx, layout, kind);
        let Some(images) = images_dir(&root) else {
            tracing::error!(binary = %kind, root = %root.display(), "images directory not found, skipping");
            continue;
        };

        let layers = files_with_extension(&images, ZSTD_EXTENSION)?;
        tracing::info!(binary = %kind, count = layers.len(), "decompressing image layers");
        for layer in layers {
            let output = layer.with_extension("");
            if output.exists() {
                tracing::warn!(file = %layer.display(), "output already exists; not overwritten");
                summary.not_overwritten.push(layer);
                continue;
            }
            tools
                .archiver
                .decompress_zstd(&layer, &output)
                .map_err(|e| InstallError::Decompression {
                    path: layer.clone(),
                    reason: e.to_string(),
                })?;
            tracing::debug!(file = %output.display(), "decompressed");
            summary.decompressed.push(output);
        }
    }
    Ok(summary)
}
