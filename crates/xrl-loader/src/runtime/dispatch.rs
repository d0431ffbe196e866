//! Per-instance dispatch tables and their cache.
//!
//! A [`DispatchTable`] is a fixed-shape record of entry points resolved once,
//! at instance creation, through the runtime's instance-scoped getter. The
//! [`DispatchCache`] owns one table per live instance behind its own mutex.
//! Lookups hand out an `Arc` so a caller may keep dispatching through a
//! table for the duration of a call even if the instance is destroyed
//! concurrently; the cache entry itself is gone the moment `remove` returns.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use xrl_abi::pfn::*;
use xrl_abi::{Instance, XrResult};

use super::proc_addr::{cast_function, ProcAddr};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PopulateError {
    #[error("required entry point {name} could not be resolved: {result}")]
    Unresolved { name: &'static str, result: XrResult },
}

macro_rules! dispatch_table {
    (
        required { $($req:ident: $req_ty:ty = $req_name:literal,)* }
        optional { $($opt:ident: $opt_ty:ty = $opt_name:literal,)* }
    ) => {
        /// Entry points for one instance.
        ///
        /// Core entry points are always present; extension entry points are
        /// `None` when the runtime does not provide them.
        #[derive(Clone, Copy)]
        pub struct DispatchTable {
            $(pub $req: $req_ty,)*
            $(pub $opt: Option<$opt_ty>,)*
        }

        impl DispatchTable {
            /// Every name the table resolves, required entries first.
            pub const ENTRY_POINTS: &'static [&'static str] = &[$($req_name,)* $($opt_name,)*];

            /// Resolve every entry against `proc_addr`, scoped to `instance`.
            pub fn populate(instance: Instance, proc_addr: &ProcAddr) -> Result<Self, PopulateError> {
                Ok(Self {
                    $($req: {
                        let function = proc_addr
                            .resolve(instance, $req_name)
                            .map_err(|result| PopulateError::Unresolved { name: $req_name, result })?;
                        unsafe { cast_function::<$req_ty>(function) }
                    },)*
                    $($opt: proc_addr
                        .resolve(instance, $opt_name)
                        .ok()
                        .map(|function| unsafe { cast_function::<$opt_ty>(function) }),)*
                })
            }
        }

        impl std::fmt::Debug for DispatchTable {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct("DispatchTable")
                    $(.field(stringify!($req), &(self.$req as *const ())))*
                    $(.field(stringify!($opt), &self.$opt.is_some()))*
                    .finish()
            }
        }
    };
}

dispatch_table! {
    required {
        destroy_instance: PfnDestroyInstance = "xrDestroyInstance",
        get_instance_properties: PfnGetInstanceProperties = "xrGetInstanceProperties",
        poll_event: PfnPollEvent = "xrPollEvent",
        result_to_string: PfnResultToString = "xrResultToString",
        structure_type_to_string: PfnStructureTypeToString = "xrStructureTypeToString",
        string_to_path: PfnStringToPath = "xrStringToPath",
        path_to_string: PfnPathToString = "xrPathToString",
    }
    optional {
        create_debug_utils_messenger_ext: PfnCreateDebugUtilsMessengerEXT = "xrCreateDebugUtilsMessengerEXT",
        destroy_debug_utils_messenger_ext: PfnDestroyDebugUtilsMessengerEXT = "xrDestroyDebugUtilsMessengerEXT",
        submit_debug_utils_message_ext: PfnSubmitDebugUtilsMessageEXT = "xrSubmitDebugUtilsMessageEXT",
    }
}

// =============================================================================
// Cache
// =============================================================================

/// Instance → dispatch table, guarded by its own mutex.
#[derive(Default)]
pub struct DispatchCache {
    tables: Mutex<HashMap<Instance, Arc<DispatchTable>>>,
}

impl DispatchCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the table for `instance`.
    pub fn insert(&self, instance: Instance, table: DispatchTable) {
        self.tables.lock().insert(instance, Arc::new(table));
    }

    /// `None` for unknown or already-destroyed instances.
    pub fn get(&self, instance: Instance) -> Option<Arc<DispatchTable>> {
        self.tables.lock().get(&instance).cloned()
    }

    /// Remove and return the entry for `instance`.
    pub fn remove(&self, instance: Instance) -> Option<Arc<DispatchTable>> {
        self.tables.lock().remove(&instance)
    }

    pub fn contains(&self, instance: Instance) -> bool {
        self.tables.lock().contains_key(&instance)
    }

    pub fn len(&self) -> usize {
        self.tables.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every entry. Returns how many were dropped.
    pub fn clear(&self) -> usize {
        let drained: Vec<_> = self.tables.lock().drain().collect();
        drained.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::{c_char, c_void, CStr};
    use xrl_abi::{DebugUtilsMessenger, InstanceProperties, Path, StructureType};

    unsafe extern "system" fn destroy_instance(_: Instance) -> XrResult {
        XrResult::SUCCESS
    }
    unsafe extern "system" fn get_instance_properties(_: Instance, _: *mut InstanceProperties) -> XrResult {
        XrResult::SUCCESS
    }
    unsafe extern "system" fn poll_event(_: Instance, _: *mut c_void) -> XrResult {
        XrResult::SUCCESS
    }
    unsafe extern "system" fn result_to_string(_: Instance, _: XrResult, _: *mut c_char) -> XrResult {
        XrResult::SUCCESS
    }
    unsafe extern "system" fn structure_type_to_string(_: Instance, _: StructureType, _: *mut c_char) -> XrResult {
        XrResult::SUCCESS
    }
    unsafe extern "system" fn string_to_path(_: Instance, _: *const c_char, _: *mut Path) -> XrResult {
        XrResult::SUCCESS
    }
    unsafe extern "system" fn path_to_string(_: Instance, _: Path, _: u32, _: *mut u32, _: *mut c_char) -> XrResult {
        XrResult::SUCCESS
    }
    unsafe extern "system" fn destroy_messenger(_: DebugUtilsMessenger) -> XrResult {
        XrResult::SUCCESS
    }

    /// Core functions only, plus the messenger destroy extension; `xrPollEvent`
    /// is withheld for instance 13.
    unsafe extern "system" fn gipa(
        instance: Instance,
        name: *const c_char,
        function: *mut Option<PfnVoidFunction>,
    ) -> XrResult {
        let name = CStr::from_ptr(name).to_str().unwrap_or("");
        let f: Option<PfnVoidFunction> = match name {
            "xrDestroyInstance" => Some(std::mem::transmute(destroy_instance as PfnDestroyInstance)),
            "xrGetInstanceProperties" => {
                Some(std::mem::transmute(get_instance_properties as PfnGetInstanceProperties))
            }
            "xrPollEvent" if instance != Instance(13) => Some(std::mem::transmute(poll_event as PfnPollEvent)),
            "xrResultToString" => Some(std::mem::transmute(result_to_string as PfnResultToString)),
            "xrStructureTypeToString" => {
                Some(std::mem::transmute(structure_type_to_string as PfnStructureTypeToString))
            }
            "xrStringToPath" => Some(std::mem::transmute(string_to_path as PfnStringToPath)),
            "xrPathToString" => Some(std::mem::transmute(path_to_string as PfnPathToString)),
            "xrDestroyDebugUtilsMessengerEXT" => {
                Some(std::mem::transmute(destroy_messenger as PfnDestroyDebugUtilsMessengerEXT))
            }
            _ => None,
        };
        *function = f;
        if f.is_some() {
            XrResult::SUCCESS
        } else {
            XrResult::ERROR_FUNCTION_UNSUPPORTED
        }
    }

    #[test]
    fn populate_resolves_core_and_present_extensions() {
        let table = DispatchTable::populate(Instance(1), &ProcAddr::new(gipa)).expect("populated");
        assert!(table.destroy_debug_utils_messenger_ext.is_some());
        assert!(table.create_debug_utils_messenger_ext.is_none());
        assert!(table.submit_debug_utils_message_ext.is_none());
        assert_eq!(unsafe { (table.destroy_instance)(Instance(1)) }, XrResult::SUCCESS);
    }

    #[test]
    fn populate_fails_on_missing_required_entry() {
        let err = DispatchTable::populate(Instance(13), &ProcAddr::new(gipa)).unwrap_err();
        assert_eq!(
            err,
            PopulateError::Unresolved {
                name: "xrPollEvent",
                result: XrResult::ERROR_FUNCTION_UNSUPPORTED,
            }
        );
    }

    #[test]
    fn cache_tracks_live_instances() {
        let table = DispatchTable::populate(Instance(1), &ProcAddr::new(gipa)).expect("populated");
        let cache = DispatchCache::new();
        assert!(cache.get(Instance(1)).is_none());

        cache.insert(Instance(1), table);
        cache.insert(Instance(2), table);
        assert!(cache.get(Instance(1)).is_some());
        assert_eq!(cache.len(), 2);

        assert!(cache.remove(Instance(1)).is_some());
        assert!(cache.remove(Instance(1)).is_none());
        assert!(cache.get(Instance(1)).is_none());
        assert!(cache.contains(Instance(2)));

        assert_eq!(cache.clear(), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn handed_out_table_outlives_removal() {
        let table = DispatchTable::populate(Instance(5), &ProcAddr::new(gipa)).expect("populated");
        let cache = DispatchCache::new();
        cache.insert(Instance(5), table);
        let held = cache.get(Instance(5)).expect("present");
        cache.remove(Instance(5));
        assert!(cache.get(Instance(5)).is_none());
        assert_eq!(unsafe { (held.destroy_instance)(Instance(5)) }, XrResult::SUCCESS);
    }

    #[test]
    fn entry_point_names_are_listed() {
        assert_eq!(DispatchTable::ENTRY_POINTS.len(), 10);
        assert_eq!(DispatchTable::ENTRY_POINTS[0], "xrDestroyInstance");
    }
}
