//! Runtime manifests: where candidate runtimes come from.
//!
//! A manifest is a small JSON file naming a runtime library and, optionally,
//! per-function symbol overrides:
//!
//! ```json
//! {
//!     "file_format_version": "1.0.0",
//!     "runtime": {
//!         "name": "Demo",
//!         "library_path": "./libdemo_runtime.so",
//!         "functions": { "xrNegotiateLoaderRuntimeInterface": "demoNegotiate" }
//!     }
//! }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use xrl_abi::CURRENT_API_VERSION;

use crate::config::LoaderConfig;

pub const ACTIVE_RUNTIME_FILE: &str = "active_runtime.json";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest {}: {error}", path.display())]
    Io { path: PathBuf, error: std::io::Error },

    #[error("failed to parse manifest {}: {error}", path.display())]
    Parse { path: PathBuf, error: serde_json::Error },

    #[error("manifest {} has unsupported file_format_version {version}", path.display())]
    UnsupportedFormat { path: PathBuf, version: String },

    #[error("manifest {} has an empty library_path", path.display())]
    MissingLibraryPath { path: PathBuf },
}

/// One candidate runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeManifest {
    /// The manifest file this came from (for diagnostics).
    pub manifest_path: PathBuf,
    /// Library to open, already resolved against the manifest directory.
    pub library_path: PathBuf,
    pub name: Option<String>,
    /// Standard entry point name → exported symbol name.
    pub functions: HashMap<String, String>,
}

#[derive(Deserialize)]
struct ManifestFile {
    file_format_version: String,
    runtime: RuntimeSection,
}

#[derive(Deserialize)]
struct RuntimeSection {
    library_path: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    functions: HashMap<String, String>,
}

impl RuntimeManifest {
    /// A manifest with no overrides, pointing straight at a library.
    pub fn for_library(library_path: impl Into<PathBuf>) -> Self {
        let library_path = library_path.into();
        Self {
            manifest_path: library_path.clone(),
            library_path,
            name: None,
            functions: HashMap::new(),
        }
    }

    pub fn from_json(manifest_path: &Path, text: &str) -> Result<Self, ManifestError> {
        let file: ManifestFile = serde_json::from_str(text).map_err(|error| ManifestError::Parse {
            path: manifest_path.to_path_buf(),
            error,
        })?;

        if !file.file_format_version.starts_with("1.") {
            return Err(ManifestError::UnsupportedFormat {
                path: manifest_path.to_path_buf(),
                version: file.file_format_version,
            });
        }
        if file.runtime.library_path.trim().is_empty() {
            return Err(ManifestError::MissingLibraryPath {
                path: manifest_path.to_path_buf(),
            });
        }

        Ok(Self {
            manifest_path: manifest_path.to_path_buf(),
            library_path: resolve_library_path(manifest_path, &file.runtime.library_path),
            name: file.runtime.name,
            functions: file.runtime.functions,
        })
    }

    pub fn load(manifest_path: &Path) -> Result<Self, ManifestError> {
        let text = std::fs::read_to_string(manifest_path).map_err(|error| ManifestError::Io {
            path: manifest_path.to_path_buf(),
            error,
        })?;
        Self::from_json(manifest_path, &text)
    }

    /// The symbol to resolve for `function`, honouring overrides.
    pub fn function_name<'a>(&'a self, function: &'a str) -> &'a str {
        self.functions.get(function).map(String::as_str).unwrap_or(function)
    }
}

/// Relative paths with a directory component are relative to the manifest;
/// bare file names go to the platform's library search unchanged.
fn resolve_library_path(manifest_path: &Path, library_path: &str) -> PathBuf {
    let lib = Path::new(library_path);
    if lib.is_absolute() || lib.components().count() <= 1 {
        return lib.to_path_buf();
    }
    match manifest_path.parent() {
        Some(dir) => dir.join(lib),
        None => lib.to_path_buf(),
    }
}

// =============================================================================
// Sources
// =============================================================================

/// Supplies candidate runtimes in preference order.
pub trait ManifestSource: Send + Sync {
    fn find_runtime_manifests(&self) -> Result<Vec<RuntimeManifest>, ManifestError>;
}

/// Searches the filesystem the way the configuration describes.
#[derive(Debug, Clone)]
pub struct FilesystemManifests {
    config: LoaderConfig,
}

impl FilesystemManifests {
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    /// Every manifest path the search considers, existing or not, in order.
    pub fn candidate_paths(&self) -> Vec<PathBuf> {
        if let Some(path) = &self.config.runtime_json_override {
            return vec![path.clone()];
        }
        let major = CURRENT_API_VERSION.major().to_string();
        self.config
            .search_dirs()
            .into_iter()
            .map(|dir| dir.join("openxr").join(&major).join(ACTIVE_RUNTIME_FILE))
            .collect()
    }

    /// Parse every existing candidate, keeping failures for reporting.
    pub fn discover(&self) -> Vec<Result<RuntimeManifest, ManifestError>> {
        self.candidate_paths()
            .into_iter()
            .filter(|p| self.config.runtime_json_override.is_some() || p.is_file())
            .map(|p| RuntimeManifest::load(&p))
            .collect()
    }
}

impl ManifestSource for FilesystemManifests {
    fn find_runtime_manifests(&self) -> Result<Vec<RuntimeManifest>, ManifestError> {
        if let Some(path) = &self.config.runtime_json_override {
            tracing::info!(manifest = %path.display(), "using {} override", crate::config::RUNTIME_JSON_ENV);
            return RuntimeManifest::load(path).map(|m| vec![m]);
        }

        let mut manifests = Vec::new();
        for found in self.discover() {
            match found {
                Ok(manifest) => manifests.push(manifest),
                Err(e) => tracing::error!(error = %e, "skipping runtime manifest"),
            }
        }
        Ok(manifests)
    }
}
