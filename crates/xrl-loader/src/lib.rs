//! xrl loader core.
//!
//! Finds a runtime through its manifest, negotiates with it, and keeps the
//! per-instance dispatch state for the bound runtime.
//!
//! ```rust,ignore
//! let loader = xrl_loader::Loader::new(xrl_loader::LoaderConfig::from_env());
//! let session = loader.load_runtime("xrCreateInstance")?;
//! let instance = session.create_instance(&create_info)?;
//! let table = loader.dispatch_table(instance).expect("live instance");
//! ```

pub mod config;
pub mod error;
pub mod manifest;
pub mod runtime;

pub use xrl_abi as abi;

pub use config::LoaderConfig;
pub use error::{LoaderError, Result};
pub use manifest::{FilesystemManifests, ManifestError, ManifestSource, RuntimeManifest};
pub use runtime::{DispatchTable, ExtensionProperty, Loader, RuntimeSession};
