//! Loader configuration, read from the environment.

use std::path::PathBuf;

/// Forces a single runtime manifest, bypassing the search.
pub const RUNTIME_JSON_ENV: &str = "XR_RUNTIME_JSON";
/// `tracing` filter for the `xrl-info` binary.
pub const LOG_ENV: &str = "XRL_LOG";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Use exactly this manifest file.
    pub runtime_json_override: Option<PathBuf>,
    /// `$XDG_CONFIG_HOME`, defaulting to `$HOME/.config`.
    pub config_home: Option<PathBuf>,
    /// `$XDG_CONFIG_DIRS`, defaulting to `/etc/xdg`.
    pub config_dirs: Vec<PathBuf>,
    /// System configuration directory searched last.
    pub sysconf_dir: Option<PathBuf>,
    /// Whether `xrInitializeLoaderKHR` must precede loading a runtime.
    pub require_loader_init: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            runtime_json_override: None,
            config_home: None,
            config_dirs: Vec::new(),
            sysconf_dir: Some(PathBuf::from("/etc")),
            require_loader_init: cfg!(target_os = "android"),
        }
    }
}

impl LoaderConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let config_home = var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| var("HOME").map(|home| PathBuf::from(home).join(".config")));

        let config_dirs = var("XDG_CONFIG_DIRS")
            .unwrap_or_else(|| "/etc/xdg".to_string())
            .split(':')
            .filter(|d| !d.is_empty())
            .map(PathBuf::from)
            .collect();

        Self {
            runtime_json_override: var(RUNTIME_JSON_ENV).map(PathBuf::from),
            config_home,
            config_dirs,
            ..Self::default()
        }
    }

    /// Directories searched for `openxr/<major>/active_runtime.json`, in order.
    pub fn search_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = Vec::new();
        dirs.extend(self.config_home.clone());
        dirs.extend(self.config_dirs.iter().cloned());
        dirs.extend(self.sysconf_dir.clone());
        dirs
    }
}
