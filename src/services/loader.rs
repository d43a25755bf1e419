use crate::domain::constants::TAR_EXTENSION;
use crate::domain::errors::InstallError;
use crate::domain::models::{BinaryKind, InstallContext};
use crate::services::engine::resolve_engine;
use crate::services::expander::{extraction_root, files_with_extension, images_dir};
use crate::services::toolbox::Toolbox;
use std::path::PathBuf;

/// Loads every image archive of the image-bearing bundles into the engine.
/// A missing images directory skips that bundle; one failed load aborts.
pub fn load_images(ctx: &InstallContext, tools: &Toolbox) -> anyhow::Result<Vec<PathBuf>> {
    let engine = resolve_engine(ctx, tools.runner);
    let mut loaded = Vec::new();
    for kind in BinaryKind::IMAGE_BEARING {
        let root = extraction_root(ctx, tools.config.extract_layout, kind);
        let Some(images) = images_dir(&root) else {
            tracing::error!(binary = %kind, root = %root.display(), "images directory not found, skipping");
            continue;
        };
        for archive in files_with_extension(&images, TAR_EXTENSION)? {
            tracing::info!(engine = %engine.kind, archive = %archive.display(), "loading image");
            let out = engine.load(&archive)?;
            if !out.success {
                return Err(InstallError::ImageLoad {
                    path: archive,
                    reason: out.reason(),
                }
                .into());
            }
            loaded.push(archive);
        }
    }
    tracing::info!(count = loaded.len(), "images loaded");
    Ok(loaded)
}
