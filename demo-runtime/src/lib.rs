//! Demo runtime
//!
//! Implements just enough of the API for `xrl-info smoke`:
//! 1. Negotiates through `define_runtime!`
//! 2. Reports two instance extensions
//! 3. Creates/destroys instances and interns paths per process
//!
//! Point the loader at it with:
//! ```sh
//! cargo build -p demo-runtime
//! cargo run -p xrl-loader --bin xrl-info -- --runtime-json demo-runtime/demo_runtime.json smoke
//! ```

use std::collections::HashSet;
use std::ffi::{c_char, c_void, CStr};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use xrl_runtime::abi::pfn::*;
use xrl_runtime::abi::{
    chars_to_str, copy_str_to_chars, DebugUtilsMessenger, ExtensionProperties, Instance,
    InstanceCreateInfo, InstanceProperties, Path, StructureType, Version, XrResult,
};
use xrl_runtime::enumerate::{fill_extension_properties, fill_two_call};

pub const RUNTIME_NAME: &str = "xrl demo runtime";
pub const RUNTIME_VERSION: Version = Version::new(0, 1, 0);
pub const EXTENSIONS: &[(&str, u32)] = &[("XR_EXT_debug_utils", 5), ("XR_KHR_loader_init", 2)];

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);
static INSTANCES: Mutex<Option<HashSet<Instance>>> = Mutex::new(None);
static MESSENGERS: Mutex<Option<HashSet<DebugUtilsMessenger>>> = Mutex::new(None);
static PATHS: Mutex<Vec<String>> = Mutex::new(Vec::new());

fn next_handle() -> u64 {
    NEXT_HANDLE.fetch_add(1, Ordering::Relaxed)
}

fn is_live(instance: Instance) -> bool {
    INSTANCES.lock().as_ref().is_some_and(|set| set.contains(&instance))
}

xrl_runtime::define_runtime! {
    api_version: Version::new(1, 1, 0),
    get_instance_proc_addr: get_instance_proc_addr,
}

// =============================================================================
// Entry-point getter
// =============================================================================

/// # Safety
///
/// `name` must be nul-terminated and `function` writable.
pub unsafe extern "system" fn get_instance_proc_addr(
    instance: Instance,
    name: *const c_char,
    function: *mut Option<PfnVoidFunction>,
) -> XrResult {
    if name.is_null() || function.is_null() {
        return XrResult::ERROR_VALIDATION_FAILURE;
    }
    *function = None;
    let Ok(name) = CStr::from_ptr(name).to_str() else {
        return XrResult::ERROR_FUNCTION_UNSUPPORTED;
    };

    macro_rules! entry {
        ($f:ident as $ty:ty) => {
            std::mem::transmute::<$ty, PfnVoidFunction>($f as $ty)
        };
    }

    // Global functions only; everything else needs a live instance.
    let global = match name {
        "xrGetInstanceProcAddr" => Some(entry!(get_instance_proc_addr as PfnGetInstanceProcAddr)),
        "xrEnumerateInstanceExtensionProperties" => {
            Some(entry!(enumerate_instance_extension_properties as PfnEnumerateInstanceExtensionProperties))
        }
        "xrCreateInstance" => Some(entry!(create_instance as PfnCreateInstance)),
        _ => None,
    };
    if let Some(f) = global {
        *function = Some(f);
        return XrResult::SUCCESS;
    }
    if instance.is_null() || !is_live(instance) {
        return XrResult::ERROR_HANDLE_INVALID;
    }

    let f = match name {
        "xrDestroyInstance" => entry!(destroy_instance as PfnDestroyInstance),
        "xrGetInstanceProperties" => entry!(get_instance_properties as PfnGetInstanceProperties),
        "xrPollEvent" => entry!(poll_event as PfnPollEvent),
        "xrResultToString" => entry!(result_to_string as PfnResultToString),
        "xrStructureTypeToString" => entry!(structure_type_to_string as PfnStructureTypeToString),
        "xrStringToPath" => entry!(string_to_path as PfnStringToPath),
        "xrPathToString" => entry!(path_to_string as PfnPathToString),
        "xrCreateDebugUtilsMessengerEXT" => entry!(create_debug_utils_messenger as PfnCreateDebugUtilsMessengerEXT),
        "xrDestroyDebugUtilsMessengerEXT" => {
            entry!(destroy_debug_utils_messenger as PfnDestroyDebugUtilsMessengerEXT)
        }
        _ => return XrResult::ERROR_FUNCTION_UNSUPPORTED,
    };
    *function = Some(f);
    XrResult::SUCCESS
}

// =============================================================================
// Global functions
// =============================================================================

unsafe extern "system" fn enumerate_instance_extension_properties(
    layer_name: *const c_char,
    capacity: u32,
    count: *mut u32,
    out: *mut ExtensionProperties,
) -> XrResult {
    if !layer_name.is_null() {
        return XrResult::ERROR_VALIDATION_FAILURE;
    }
    fill_extension_properties(EXTENSIONS, capacity, count, out)
}

unsafe extern "system" fn create_instance(info: *const InstanceCreateInfo, instance: *mut Instance) -> XrResult {
    if info.is_null() || instance.is_null() || (*info).ty != StructureType::INSTANCE_CREATE_INFO {
        return XrResult::ERROR_VALIDATION_FAILURE;
    }
    for ext in (*info).enabled_extensions() {
        let Ok(ext) = ext.to_str() else {
            return XrResult::ERROR_EXTENSION_NOT_PRESENT;
        };
        if !EXTENSIONS.iter().any(|(name, _)| *name == ext) {
            return XrResult::ERROR_EXTENSION_NOT_PRESENT;
        }
    }
    let handle = Instance(next_handle());
    INSTANCES.lock().get_or_insert_with(HashSet::new).insert(handle);
    *instance = handle;
    XrResult::SUCCESS
}

// =============================================================================
// Instance functions
// =============================================================================

unsafe extern "system" fn destroy_instance(instance: Instance) -> XrResult {
    let removed = INSTANCES.lock().as_mut().is_some_and(|set| set.remove(&instance));
    if removed {
        XrResult::SUCCESS
    } else {
        XrResult::ERROR_HANDLE_INVALID
    }
}

unsafe extern "system" fn get_instance_properties(instance: Instance, props: *mut InstanceProperties) -> XrResult {
    if props.is_null() {
        return XrResult::ERROR_VALIDATION_FAILURE;
    }
    if !is_live(instance) {
        return XrResult::ERROR_HANDLE_INVALID;
    }
    (*props).runtime_version = RUNTIME_VERSION;
    copy_str_to_chars(&mut (*props).runtime_name, RUNTIME_NAME);
    XrResult::SUCCESS
}

unsafe extern "system" fn poll_event(_instance: Instance, _event: *mut c_void) -> XrResult {
    XrResult::EVENT_UNAVAILABLE
}

unsafe extern "system" fn result_to_string(_instance: Instance, value: XrResult, buffer: *mut c_char) -> XrResult {
    if buffer.is_null() {
        return XrResult::ERROR_VALIDATION_FAILURE;
    }
    let text = value.to_string();
    let out = std::slice::from_raw_parts_mut(buffer, xrl_runtime::abi::MAX_RESULT_STRING_SIZE);
    copy_str_to_chars(out, &text);
    XrResult::SUCCESS
}

unsafe extern "system" fn structure_type_to_string(
    _instance: Instance,
    value: StructureType,
    buffer: *mut c_char,
) -> XrResult {
    if buffer.is_null() {
        return XrResult::ERROR_VALIDATION_FAILURE;
    }
    let text = format!("XR_UNKNOWN_STRUCTURE_TYPE_{}", value.0);
    let out = std::slice::from_raw_parts_mut(buffer, xrl_runtime::abi::MAX_STRUCTURE_NAME_SIZE);
    copy_str_to_chars(out, &text);
    XrResult::SUCCESS
}

unsafe extern "system" fn string_to_path(_instance: Instance, text: *const c_char, path: *mut Path) -> XrResult {
    if text.is_null() || path.is_null() {
        return XrResult::ERROR_VALIDATION_FAILURE;
    }
    let Ok(text) = CStr::from_ptr(text).to_str() else {
        return XrResult::ERROR_VALIDATION_FAILURE;
    };
    let mut paths = PATHS.lock();
    let index = match paths.iter().position(|p| p == text) {
        Some(index) => index,
        None => {
            paths.push(text.to_string());
            paths.len() - 1
        }
    };
    *path = Path(index as u64 + 1);
    XrResult::SUCCESS
}

unsafe extern "system" fn path_to_string(
    _instance: Instance,
    path: Path,
    capacity: u32,
    count: *mut u32,
    buffer: *mut c_char,
) -> XrResult {
    let text = {
        let paths = PATHS.lock();
        match (path.0 as usize).checked_sub(1).and_then(|i| paths.get(i)) {
            Some(text) => text.clone(),
            None => return XrResult::ERROR_HANDLE_INVALID,
        }
    };
    // Two-call over the characters plus the terminator.
    let mut chars: Vec<c_char> = vec![0; text.len() + 1];
    copy_str_to_chars(&mut chars, &text);
    fill_two_call(&chars, capacity, count, buffer, |slot, c| *slot = *c)
}

unsafe extern "system" fn create_debug_utils_messenger(
    instance: Instance,
    _create_info: *const c_void,
    messenger: *mut DebugUtilsMessenger,
) -> XrResult {
    if messenger.is_null() {
        return XrResult::ERROR_VALIDATION_FAILURE;
    }
    if !is_live(instance) {
        return XrResult::ERROR_HANDLE_INVALID;
    }
    let handle = DebugUtilsMessenger(next_handle());
    MESSENGERS.lock().get_or_insert_with(HashSet::new).insert(handle);
    *messenger = handle;
    XrResult::SUCCESS
}

unsafe extern "system" fn destroy_debug_utils_messenger(messenger: DebugUtilsMessenger) -> XrResult {
    let removed = MESSENGERS.lock().as_mut().is_some_and(|set| set.remove(&messenger));
    if removed {
        XrResult::SUCCESS
    } else {
        XrResult::ERROR_HANDLE_INVALID
    }
}

/// Name of the runtime as reported by `xrGetInstanceProperties`.
pub fn reported_name(props: &InstanceProperties) -> &str {
    chars_to_str(&props.runtime_name)
}
