//! Archive content validation
//!
//! A release tagged for a loader family must actually contain that family's
//! manifest entry. This catches a jar accidentally published for a loader it
//! was never built for. Only entry names are inspected; nothing is extracted.

use crate::core::error::PublishError;
use std::collections::HashSet;
use std::fs::File;
use std::path::Path;
use zip::ZipArchive;

/// Manifest entries accepted per loader family
const FORGE_MANIFESTS: &[&str] = &["META-INF/mods.toml", "mcmod.info"];
const FABRIC_MANIFESTS: &[&str] = &["fabric.mod.json"];
// Fabric mods run on quilt, so either manifest satisfies a quilt declaration
const QUILT_MANIFESTS: &[&str] = &["quilt.mod.json", "fabric.mod.json"];

/// Check that the archive contains a manifest for every declared loader
/// family. No-op when no loaders are declared.
pub fn check_loader_manifests(archive: &Path, loaders: &[String]) -> Result<(), PublishError> {
    if loaders.is_empty() {
        return Ok(());
    }

    let entries = read_entry_names(archive)?;
    let declared: Vec<String> = loaders.iter().map(|l| l.to_lowercase()).collect();
    let has_any = |candidates: &[&str]| candidates.iter().any(|c| entries.contains(*c));

    if (declared.iter().any(|l| l == "forge") || declared.iter().any(|l| l == "neoforge"))
        && !has_any(FORGE_MANIFESTS)
    {
        return Err(PublishError::ArchiveValidation {
            message: "File marked as forge/neoforge, but no META-INF/mods.toml or mcmod.info \
                      file was found"
                .to_string(),
        });
    }

    if declared.iter().any(|l| l == "fabric") && !has_any(FABRIC_MANIFESTS) {
        return Err(PublishError::ArchiveValidation {
            message: "File marked as fabric, but no fabric.mod.json file was found".to_string(),
        });
    }

    if declared.iter().any(|l| l == "quilt") && !has_any(QUILT_MANIFESTS) {
        return Err(PublishError::ArchiveValidation {
            message: "File marked as quilt, but no quilt.mod.json or fabric.mod.json file was \
                      found"
                .to_string(),
        });
    }

    Ok(())
}

fn read_entry_names(archive: &Path) -> Result<HashSet<String>, PublishError> {
    let file = File::open(archive).map_err(|e| PublishError::ArchiveValidation {
        message: format!("Cannot open archive {}: {e}", archive.display()),
    })?;

    let zip = ZipArchive::new(file).map_err(|e| PublishError::ArchiveValidation {
        message: format!("{} is not a readable zip archive: {e}", archive.display()),
    })?;

    Ok(zip.file_names().map(str::to_string).collect())
}
