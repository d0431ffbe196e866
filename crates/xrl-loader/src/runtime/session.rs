//! The bound runtime.
//!
//! A [`RuntimeSession`] exists only after a runtime negotiated successfully.
//! It owns the library, the negotiated getter, and the per-instance state.
//! Teardown order is fixed: the dispatch cache is cleared first, then the
//! library is closed (the `library` field is declared last so it drops last).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use xrl_abi::pfn::{PfnCreateInstance, PfnDestroyInstance, PfnVoidFunction};
use xrl_abi::{DebugUtilsMessenger, Instance, InstanceCreateInfo, Version};

use super::dispatch::{DispatchCache, DispatchTable};
use super::extensions::{enumerate_runtime_extensions, reconcile, ExtensionProperty, SupportedExtensions};
use super::library::NativeLibrary;
use super::messengers::MessengerRegistry;
use super::negotiation::NegotiatedRuntime;
use super::proc_addr::ProcAddr;
use crate::error::{LoaderError, Result};

pub const CREATE_INSTANCE_FUNCTION_NAME: &str = "xrCreateInstance";
pub const DESTROY_INSTANCE_FUNCTION_NAME: &str = "xrDestroyInstance";

pub struct RuntimeSession {
    proc_addr: ProcAddr,
    interface_version: u32,
    api_version: Version,
    manifest_path: PathBuf,
    runtime_name: Option<String>,
    supported_extensions: SupportedExtensions,
    dispatch: DispatchCache,
    messengers: MessengerRegistry,
    // Must stay last: closes the library after everything above is gone.
    library: Box<dyn NativeLibrary>,
}

impl RuntimeSession {
    pub(crate) fn new(
        negotiated: NegotiatedRuntime,
        manifest_path: PathBuf,
        runtime_name: Option<String>,
        extensions: &[ExtensionProperty],
        library: Box<dyn NativeLibrary>,
    ) -> Self {
        Self {
            proc_addr: ProcAddr::new(negotiated.get_instance_proc_addr),
            interface_version: negotiated.interface_version,
            api_version: negotiated.api_version,
            manifest_path,
            runtime_name,
            supported_extensions: SupportedExtensions::from_properties(extensions),
            dispatch: DispatchCache::new(),
            messengers: MessengerRegistry::new(),
            library,
        }
    }

    pub fn interface_version(&self) -> u32 {
        self.interface_version
    }

    pub fn api_version(&self) -> Version {
        self.api_version
    }

    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    pub fn runtime_name(&self) -> Option<&str> {
        self.runtime_name.as_deref()
    }

    /// The negotiated entry-point getter.
    pub fn proc_addr(&self) -> &ProcAddr {
        &self.proc_addr
    }

    /// Resolve `name` through the runtime, scoped to `instance`.
    pub fn get_instance_proc_addr(&self, instance: Instance, name: &str) -> Result<PfnVoidFunction> {
        self.proc_addr.resolve(instance, name).map_err(LoaderError::Runtime)
    }

    /// Look up an export of the runtime library itself, bypassing the getter.
    pub fn library_symbol(&self, name: &str) -> Option<PfnVoidFunction> {
        self.library.symbol(name)
    }

    // =========================================================================
    // Extensions
    // =========================================================================

    /// Query the runtime's extensions and merge them into `candidates`.
    pub fn instance_extension_properties(&self, candidates: &mut Vec<ExtensionProperty>) -> Result<()> {
        let reported = enumerate_runtime_extensions(&self.proc_addr).map_err(LoaderError::Runtime)?;
        reconcile(candidates, &reported);
        Ok(())
    }

    /// Exact-match test against the set captured at load time.
    pub fn supports_extension(&self, name: &str) -> bool {
        self.supported_extensions.contains(name)
    }

    pub fn supported_extensions(&self) -> &SupportedExtensions {
        &self.supported_extensions
    }

    // =========================================================================
    // Instances
    // =========================================================================

    /// Create an instance and cache its dispatch table.
    ///
    /// If the table cannot be built, the freshly created runtime instance is
    /// destroyed again and the population error is returned.
    pub fn create_instance(&self, info: &InstanceCreateInfo) -> Result<Instance> {
        let create: PfnCreateInstance =
            unsafe { self.proc_addr.resolve_as(Instance::NULL, CREATE_INSTANCE_FUNCTION_NAME) }
                .map_err(LoaderError::Runtime)?;

        let mut instance = Instance::NULL;
        let res = unsafe { create(info, &mut instance) };
        if res.is_failure() {
            return Err(LoaderError::Runtime(res));
        }

        match DispatchTable::populate(instance, &self.proc_addr) {
            Ok(table) => {
                self.dispatch.insert(instance, table);
                tracing::debug!(instance = instance.raw(), "created instance");
                Ok(instance)
            }
            Err(err) => {
                tracing::error!(instance = instance.raw(), error = %err, "dispatch table population failed, destroying instance");
                self.destroy_runtime_instance(instance, None);
                Err(err.into())
            }
        }
    }

    /// Drop the instance's cached state, then destroy it in the runtime.
    ///
    /// A null handle is ignored. Otherwise the runtime's destroy entry point
    /// is called whether or not the instance was known. Messengers owned by
    /// the instance are forgotten so a recycled handle cannot inherit them.
    pub fn destroy_instance(&self, instance: Instance) {
        if instance.is_null() {
            return;
        }
        let table = self.dispatch.remove(instance);
        let forgotten = self.messengers.forget_instance(instance);
        if forgotten > 0 {
            tracing::debug!(instance = instance.raw(), messengers = forgotten, "forgot messengers of destroyed instance");
        }
        self.destroy_runtime_instance(instance, table.map(|t| t.destroy_instance));
    }

    fn destroy_runtime_instance(&self, instance: Instance, destroy: Option<PfnDestroyInstance>) {
        let destroy = match destroy {
            Some(destroy) => destroy,
            None => match unsafe {
                self.proc_addr
                    .resolve_as::<PfnDestroyInstance>(instance, DESTROY_INSTANCE_FUNCTION_NAME)
            } {
                Ok(destroy) => destroy,
                Err(res) => {
                    tracing::error!(instance = instance.raw(), result = %res, "runtime has no xrDestroyInstance");
                    return;
                }
            },
        };
        let res = unsafe { destroy(instance) };
        if res.is_failure() {
            tracing::error!(instance = instance.raw(), result = %res, "runtime failed to destroy instance");
        }
    }

    /// `None` for unknown or destroyed instances.
    pub fn dispatch_table(&self, instance: Instance) -> Option<Arc<DispatchTable>> {
        self.dispatch.get(instance)
    }

    pub fn live_instances(&self) -> usize {
        self.dispatch.len()
    }

    // =========================================================================
    // Debug messengers
    // =========================================================================

    pub fn track_debug_messenger(&self, instance: Instance, messenger: DebugUtilsMessenger) {
        self.messengers.track(instance, messenger);
    }

    pub fn forget_debug_messenger(&self, messenger: DebugUtilsMessenger) {
        self.messengers.forget(messenger);
    }

    /// The owning instance's table, or `None` for untracked messengers.
    pub fn debug_utils_messenger_dispatch_table(
        &self,
        messenger: DebugUtilsMessenger,
    ) -> Option<Arc<DispatchTable>> {
        // The registry lock is released before the cache lock is taken.
        let owner = self.messengers.owner(messenger);
        if owner.is_null() {
            return None;
        }
        self.dispatch.get(owner)
    }
}

impl Drop for RuntimeSession {
    fn drop(&mut self) {
        let dropped = self.dispatch.clear();
        tracing::info!(
            manifest = %self.manifest_path.display(),
            dropped_instances = dropped,
            "unloading runtime"
        );
    }
}

impl std::fmt::Debug for RuntimeSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeSession")
            .field("manifest_path", &self.manifest_path)
            .field("interface_version", &self.interface_version)
            .field("api_version", &self.api_version)
            .field("supported_extensions", &self.supported_extensions.len())
            .field("live_instances", &self.dispatch.len())
            .finish_non_exhaustive()
    }
}

