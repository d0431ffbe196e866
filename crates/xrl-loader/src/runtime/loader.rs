//! The loader context: owns at most one [`RuntimeSession`].
//!
//! Load and unload are serialized by the context's own mutex. Everything a
//! bound session does afterwards (instance create/destroy, table lookups) only
//! takes the session's per-container locks.
//!
//! That mutex is not reentrant and stays held while `load_runtime` calls into
//! the candidate (`xrInitializeLoaderKHR`, negotiation, extension enumeration).
//! A runtime that calls back into the same `Loader` from any of those
//! deadlocks.

use std::sync::Arc;

use parking_lot::Mutex;
use xrl_abi::pfn::{PfnInitializeLoaderKHR, PfnNegotiateLoaderRuntimeInterface};
use xrl_abi::{Instance, LoaderInitInfoBaseHeader};

use super::dispatch::DispatchTable;
use super::extensions::enumerate_runtime_extensions;
use super::init::{LoaderInitData, INITIALIZE_FUNCTION_NAME};
use super::library::{LibraryLoader, NativeLibrary};
use super::negotiation::{negotiate, NEGOTIATE_FUNCTION_NAME};
use super::proc_addr::{cast_function, ProcAddr};
use super::session::RuntimeSession;
use crate::config::LoaderConfig;
use crate::error::{LoaderError, Result};
use crate::manifest::{ManifestSource, RuntimeManifest};

/// Per-scan bookkeeping shared by every candidate.
#[derive(Debug, Default)]
struct ScanState {
    /// Some candidate's library opened, whatever happened next.
    opened_any: bool,
    last_error: Option<LoaderError>,
}

impl ScanState {
    fn open_failed(&mut self) {
        // A later open failure must not mask an earlier negotiation error.
        if !self.opened_any {
            self.last_error = Some(LoaderError::InstanceLost);
        }
    }

    fn rejected(&mut self, err: LoaderError) {
        self.last_error = Some(err);
    }

    fn into_error(self) -> LoaderError {
        match self.last_error {
            Some(err) if self.opened_any => err,
            _ => LoaderError::InstanceLost,
        }
    }
}

pub struct Loader {
    config: LoaderConfig,
    manifests: Box<dyn ManifestSource>,
    libraries: Box<dyn LibraryLoader>,
    init_data: Mutex<Option<LoaderInitData>>,
    session: Mutex<Option<Arc<RuntimeSession>>>,
}

impl Loader {
    /// A loader searching the filesystem and opening libraries with the
    /// platform loader.
    #[cfg(unix)]
    pub fn new(config: LoaderConfig) -> Self {
        let manifests = Box::new(crate::manifest::FilesystemManifests::new(config.clone()));
        Self::with_parts(config, manifests, super::library::platform_loader())
    }

    pub fn with_parts(
        config: LoaderConfig,
        manifests: Box<dyn ManifestSource>,
        libraries: Box<dyn LibraryLoader>,
    ) -> Self {
        Self {
            config,
            manifests,
            libraries,
            init_data: Mutex::new(None),
            session: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// `xrInitializeLoaderKHR`: validate and retain the platform payload.
    ///
    /// # Safety
    ///
    /// `info` must head a complete record of the type its `ty` names.
    pub unsafe fn initialize(&self, info: &LoaderInitInfoBaseHeader) -> Result<()> {
        let data = LoaderInitData::from_header(info).inspect_err(|e| {
            tracing::error!(command = INITIALIZE_FUNCTION_NAME, error = %e, "rejecting loader init payload");
        })?;
        *self.init_data.lock() = Some(data);
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.init_data.lock().is_some()
    }

    // =========================================================================
    // Load / unload
    // =========================================================================

    /// Bind a runtime if none is bound yet.
    ///
    /// Scans the manifest source in order and keeps the first candidate that
    /// negotiates. A second call after success returns the bound session
    /// without scanning again.
    pub fn load_runtime(&self, command: &str) -> Result<Arc<RuntimeSession>> {
        let mut slot = self.session.lock();
        if let Some(session) = slot.as_ref() {
            return Ok(Arc::clone(session));
        }

        let init = *self.init_data.lock();
        if self.config.require_loader_init && init.is_none() {
            tracing::error!(command, "xrInitializeLoaderKHR was not called before loading a runtime");
            return Err(LoaderError::InitializationFailed);
        }

        let manifests = self.manifests.find_runtime_manifests().map_err(|e| {
            tracing::error!(command, error = %e, "failed to find runtime manifests");
            LoaderError::from(e)
        })?;
        if manifests.is_empty() {
            tracing::error!(command, "no runtime manifests found");
            return Err(LoaderError::InstanceLost);
        }

        let mut scan = ScanState::default();
        for manifest in &manifests {
            if let Some(session) = self.try_load_single(command, manifest, init.as_ref(), &mut scan) {
                let session = Arc::new(session);
                *slot = Some(Arc::clone(&session));
                return Ok(session);
            }
        }

        let err = scan.into_error();
        tracing::error!(command, error = %err, candidates = manifests.len(), "failed to load a runtime");
        Err(err)
    }

    fn try_load_single(
        &self,
        command: &str,
        manifest: &RuntimeManifest,
        init: Option<&LoaderInitData>,
        scan: &mut ScanState,
    ) -> Option<RuntimeSession> {
        let manifest_path = manifest.manifest_path.display();

        let library = match self.libraries.open(&manifest.library_path) {
            Ok(library) => library,
            Err(e) => {
                tracing::error!(
                    command,
                    manifest = %manifest_path,
                    library = %manifest.library_path.display(),
                    error = %e,
                    "failed to open runtime library"
                );
                scan.open_failed();
                return None;
            }
        };
        scan.opened_any = true;

        match Self::bind(manifest, library, init) {
            Ok(session) => {
                tracing::info!(
                    command,
                    manifest = %manifest_path,
                    interface_version = session.interface_version(),
                    api_version = %session.api_version(),
                    "loaded runtime"
                );
                scan.last_error = None;
                Some(session)
            }
            Err(err) => {
                tracing::error!(command, manifest = %manifest_path, error = %err, "rejecting runtime");
                scan.rejected(err);
                None
            }
        }
    }

    /// Initialize, negotiate and enumerate one opened library. On error the
    /// library is dropped here, which closes it. Only init forwarding and
    /// negotiation can reject the candidate.
    fn bind(
        manifest: &RuntimeManifest,
        library: Box<dyn NativeLibrary>,
        init: Option<&LoaderInitData>,
    ) -> Result<RuntimeSession> {
        if let Some(init) = init {
            let name = manifest.function_name(INITIALIZE_FUNCTION_NAME);
            if let Some(function) = library.symbol(name) {
                let initialize: PfnInitializeLoaderKHR = unsafe { cast_function(function) };
                LoaderError::check(unsafe { initialize(init.header()) })?;
            }
        }

        let name = manifest.function_name(NEGOTIATE_FUNCTION_NAME);
        let entry = library
            .symbol(name)
            .map(|function| unsafe { cast_function::<PfnNegotiateLoaderRuntimeInterface>(function) });
        let negotiated = unsafe { negotiate(entry, name) }?;
        tracing::debug!(
            manifest = %manifest.manifest_path.display(),
            interface_version = negotiated.interface_version,
            api_version = %negotiated.api_version,
            "runtime negotiated"
        );

        // Negotiation decides the candidate; an enumeration failure only leaves
        // the supported set empty.
        let extensions = enumerate_runtime_extensions(&ProcAddr::new(negotiated.get_instance_proc_addr))
            .unwrap_or_else(|res| {
                tracing::error!(
                    manifest = %manifest.manifest_path.display(),
                    result = %res,
                    "failed to enumerate runtime extensions"
                );
                Vec::new()
            });

        Ok(RuntimeSession::new(
            negotiated,
            manifest.manifest_path.clone(),
            manifest.name.clone(),
            &extensions,
            library,
        ))
    }

    /// Release the bound runtime, if any.
    ///
    /// The dispatch cache is cleared and the library closed once the last
    /// outstanding `Arc<RuntimeSession>` is dropped; normally that is here.
    pub fn unload_runtime(&self, command: &str) {
        let mut slot = self.session.lock();
        if let Some(session) = slot.take() {
            tracing::info!(
                command,
                manifest = %session.manifest_path().display(),
                outstanding = Arc::strong_count(&session) - 1,
                "releasing runtime"
            );
        }
    }

    // =========================================================================
    // Access
    // =========================================================================

    pub fn session(&self) -> Option<Arc<RuntimeSession>> {
        self.session.lock().clone()
    }

    /// The bound session, or `InstanceLost` when nothing is bound.
    pub fn require_session(&self) -> Result<Arc<RuntimeSession>> {
        self.session().ok_or(LoaderError::InstanceLost)
    }

    pub fn is_loaded(&self) -> bool {
        self.session.lock().is_some()
    }

    pub fn dispatch_table(&self, instance: Instance) -> Option<Arc<DispatchTable>> {
        self.session()?.dispatch_table(instance)
    }

    pub fn supports_extension(&self, name: &str) -> bool {
        self.session().is_some_and(|s| s.supports_extension(name))
    }
}

impl std::fmt::Debug for Loader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loader")
            .field("config", &self.config)
            .field("session", &*self.session.lock())
            .finish_non_exhaustive()
    }
}
