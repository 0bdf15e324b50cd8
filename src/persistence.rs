//! Persistence (C9).
//!
//! Save writes each adapted sub-tokenizer JSON plus one manifest
//! (`config.yaml`) recording names, filenames, and the two id budgets.
//! Load is the inverse, including rewriting every descriptor's paths to
//! live under the load directory (the directory context is supplied at
//! load time, never baked into the manifest - see §4.9).

use std::fs;
use std::path::{Path, PathBuf};

use crate::descriptor::{ManifestConfig, SubTokenizerDescriptor};
use crate::error::{ModularTokenizerError, ModularTokenizerResult};

pub const MANIFEST_FILE_NAME: &str = "config.yaml";

pub fn write_manifest(dir: &Path, manifest: &ManifestConfig) -> ModularTokenizerResult<()> {
    let path = dir.join(MANIFEST_FILE_NAME);
    let yaml = serde_yaml::to_string(manifest).map_err(|e| ModularTokenizerError::Manifest {
        path: path.clone(),
        source: e,
    })?;
    fs::write(&path, yaml).map_err(|e| ModularTokenizerError::Io { path, source: e })
}

pub fn read_manifest(dir: &Path) -> ModularTokenizerResult<ManifestConfig> {
    let path = dir.join(MANIFEST_FILE_NAME);
    let contents = fs::read_to_string(&path).map_err(|e| ModularTokenizerError::Io {
        path: path.clone(),
        source: e,
    })?;
    serde_yaml::from_str(&contents).map_err(|e| ModularTokenizerError::Manifest { path, source: e })
}

fn basename(path: &Path) -> PathBuf {
    PathBuf::from(path.file_name().unwrap_or_default())
}

/// Rewrites a descriptor's paths to bare filenames, as they should appear
/// in a saved manifest (the directory context is supplied at load time).
pub fn bare_filenames(descriptor: &SubTokenizerDescriptor) -> SubTokenizerDescriptor {
    let mut out = descriptor.clone();
    out.modular_json_path = basename(&out.modular_json_path);
    out.json_path = out.json_path.as_deref().map(basename);
    out
}

/// Rewrites every descriptor's paths in `manifest` so they resolve under
/// `dir`, keeping only the basename of whatever was previously recorded.
pub fn rewrite_paths_under(manifest: &mut ManifestConfig, dir: &Path) {
    for descriptor in &mut manifest.tokenizers_info {
        descriptor.modular_json_path = dir.join(basename(&descriptor.modular_json_path));
        descriptor.json_path = descriptor
            .json_path
            .as_deref()
            .map(|p| dir.join(basename(p)));
    }
}

pub fn ensure_dir(dir: &Path) -> ModularTokenizerResult<()> {
    fs::create_dir_all(dir).map_err(|e| ModularTokenizerError::Io {
        path: dir.to_path_buf(),
        source: e,
    })
}
