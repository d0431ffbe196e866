//! In-process fake runtimes and collaborators for driving a `Loader`.
//!
//! Runtime entry points are plain `extern "system"` functions in this test
//! binary; a fake `LibraryLoader` hands them out by library path. Per-test
//! observations live in thread-locals, since every test runs on its own thread.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::ffi::{c_char, c_void, CStr};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use xrl_loader::abi::pfn::*;
use xrl_loader::abi::{
    copy_str_to_chars, DebugUtilsMessenger, ExtensionProperties, Instance, InstanceCreateInfo,
    InstanceProperties, LoaderInitInfoBaseHeader, NegotiateLoaderInfo, NegotiateRuntimeRequest,
    Path as XrPath, StructureType, Version, XrResult,
};
use xrl_loader::runtime::{LibraryLoader, NativeLibrary};
use xrl_loader::{Loader, LoaderConfig, ManifestError, ManifestSource, RuntimeManifest};

pub const NEGOTIATE: &str = "xrNegotiateLoaderRuntimeInterface";
pub const INITIALIZE: &str = "xrInitializeLoaderKHR";

pub const RUNTIME_EXTENSIONS: &[(&str, u32)] = &[("XR_EXT_debug_utils", 4), ("XR_KHR_fake", 2)];

// =============================================================================
// Observations
// =============================================================================

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(0x1000);

thread_local! {
    static DESTROYED: RefCell<Vec<Instance>> = const { RefCell::new(Vec::new()) };
    static FAIL_POPULATE: Cell<bool> = const { Cell::new(false) };
    static INIT_CALLS: Cell<u32> = const { Cell::new(0) };
}

/// Instances this thread asked the runtime to destroy, in call order.
pub fn destroyed() -> Vec<Instance> {
    DESTROYED.with(|d| d.borrow().clone())
}

/// Withhold `xrPollEvent` from instance-scoped lookups on this thread.
pub fn fail_populate(fail: bool) {
    FAIL_POPULATE.with(|f| f.set(fail));
}

pub fn init_calls() -> u32 {
    INIT_CALLS.with(Cell::get)
}

// =============================================================================
// Fake runtime entry points
// =============================================================================

unsafe extern "system" fn enumerate_extensions(
    _layer: *const c_char,
    capacity: u32,
    count: *mut u32,
    out: *mut ExtensionProperties,
) -> XrResult {
    xrl_runtime::enumerate::fill_extension_properties(RUNTIME_EXTENSIONS, capacity, count, out)
}

unsafe extern "system" fn create_instance(_info: *const InstanceCreateInfo, instance: *mut Instance) -> XrResult {
    *instance = Instance(NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed));
    XrResult::SUCCESS
}

unsafe extern "system" fn failing_create_instance(_: *const InstanceCreateInfo, _: *mut Instance) -> XrResult {
    XrResult::ERROR_API_VERSION_UNSUPPORTED
}

unsafe extern "system" fn destroy_instance(instance: Instance) -> XrResult {
    DESTROYED.with(|d| d.borrow_mut().push(instance));
    XrResult::SUCCESS
}

unsafe extern "system" fn get_instance_properties(_: Instance, props: *mut InstanceProperties) -> XrResult {
    (*props).runtime_version = Version::new(0, 3, 0);
    copy_str_to_chars(&mut (*props).runtime_name, "Fake Runtime");
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

unsafe extern "system" fn string_to_path(_: Instance, _: *const c_char, path: *mut XrPath) -> XrResult {
    *path = XrPath(1);
    XrResult::SUCCESS
}

unsafe extern "system" fn path_to_string(_: Instance, _: XrPath, _: u32, count: *mut u32, _: *mut c_char) -> XrResult {
    *count = 0;
    XrResult::SUCCESS
}

unsafe extern "system" fn destroy_messenger(_: DebugUtilsMessenger) -> XrResult {
    XrResult::SUCCESS
}

fn void<F: Copy>(f: F) -> PfnVoidFunction {
    assert_eq!(std::mem::size_of::<F>(), std::mem::size_of::<PfnVoidFunction>());
    unsafe { std::mem::transmute_copy(&f) }
}

fn lookup(instance: Instance, name: &str) -> Option<PfnVoidFunction> {
    let f = match name {
        "xrEnumerateInstanceExtensionProperties" => void(enumerate_extensions as PfnEnumerateInstanceExtensionProperties),
        "xrCreateInstance" => void(create_instance as PfnCreateInstance),
        "xrDestroyInstance" => void(destroy_instance as PfnDestroyInstance),
        "xrGetInstanceProperties" => void(get_instance_properties as PfnGetInstanceProperties),
        "xrPollEvent" if !(FAIL_POPULATE.with(Cell::get) && !instance.is_null()) => {
            void(poll_event as PfnPollEvent)
        }
        "xrResultToString" => void(result_to_string as PfnResultToString),
        "xrStructureTypeToString" => void(structure_type_to_string as PfnStructureTypeToString),
        "xrStringToPath" => void(string_to_path as PfnStringToPath),
        "xrPathToString" => void(path_to_string as PfnPathToString),
        "xrDestroyDebugUtilsMessengerEXT" => void(destroy_messenger as PfnDestroyDebugUtilsMessengerEXT),
        _ => return None,
    };
    Some(f)
}

unsafe fn answer(function: *mut Option<PfnVoidFunction>, found: Option<PfnVoidFunction>) -> XrResult {
    *function = found;
    if found.is_some() {
        XrResult::SUCCESS
    } else {
        XrResult::ERROR_FUNCTION_UNSUPPORTED
    }
}

unsafe extern "system" fn gipa(instance: Instance, name: *const c_char, function: *mut Option<PfnVoidFunction>) -> XrResult {
    let name = CStr::from_ptr(name).to_str().unwrap_or("");
    answer(function, lookup(instance, name))
}

/// Cannot enumerate extensions.
unsafe extern "system" fn gipa_no_enumerate(
    instance: Instance,
    name: *const c_char,
    function: *mut Option<PfnVoidFunction>,
) -> XrResult {
    let name = CStr::from_ptr(name).to_str().unwrap_or("");
    if name == "xrEnumerateInstanceExtensionProperties" {
        return answer(function, None);
    }
    answer(function, lookup(instance, name))
}

/// Refuses every instance.
unsafe extern "system" fn gipa_failing_create(
    instance: Instance,
    name: *const c_char,
    function: *mut Option<PfnVoidFunction>,
) -> XrResult {
    let name = CStr::from_ptr(name).to_str().unwrap_or("");
    if name == "xrCreateInstance" {
        return answer(function, Some(void(failing_create_instance as PfnCreateInstance)));
    }
    answer(function, lookup(instance, name))
}

unsafe extern "system" fn negotiate_ok(info: *const NegotiateLoaderInfo, req: *mut NegotiateRuntimeRequest) -> XrResult {
    xrl_runtime::negotiate::respond_raw(info, req, Version::new(1, 0, 34), gipa)
}

unsafe extern "system" fn negotiate_no_enumerate(
    info: *const NegotiateLoaderInfo,
    req: *mut NegotiateRuntimeRequest,
) -> XrResult {
    xrl_runtime::negotiate::respond_raw(info, req, Version::new(1, 0, 34), gipa_no_enumerate)
}

unsafe extern "system" fn negotiate_failing_create(
    info: *const NegotiateLoaderInfo,
    req: *mut NegotiateRuntimeRequest,
) -> XrResult {
    xrl_runtime::negotiate::respond_raw(info, req, Version::new(1, 0, 34), gipa_failing_create)
}

unsafe extern "system" fn negotiate_major_two(_: *const NegotiateLoaderInfo, req: *mut NegotiateRuntimeRequest) -> XrResult {
    (*req).runtime_interface_version = 1;
    (*req).runtime_api_version = Version::new(2, 0, 0);
    (*req).get_instance_proc_addr = Some(gipa);
    XrResult::SUCCESS
}

unsafe extern "system" fn negotiate_zero_interface(
    _: *const NegotiateLoaderInfo,
    req: *mut NegotiateRuntimeRequest,
) -> XrResult {
    (*req).runtime_interface_version = 0;
    (*req).runtime_api_version = Version::new(1, 0, 0);
    (*req).get_instance_proc_addr = Some(gipa);
    XrResult::SUCCESS
}

unsafe extern "system" fn negotiate_null_getter(
    _: *const NegotiateLoaderInfo,
    req: *mut NegotiateRuntimeRequest,
) -> XrResult {
    (*req).runtime_interface_version = 1;
    (*req).runtime_api_version = Version::new(1, 0, 0);
    (*req).get_instance_proc_addr = None;
    XrResult::SUCCESS
}

unsafe extern "system" fn negotiate_rejecting(_: *const NegotiateLoaderInfo, _: *mut NegotiateRuntimeRequest) -> XrResult {
    XrResult::ERROR_INITIALIZATION_FAILED
}

unsafe extern "system" fn initialize_ok(_: *const LoaderInitInfoBaseHeader) -> XrResult {
    INIT_CALLS.with(|c| c.set(c.get() + 1));
    XrResult::SUCCESS
}

unsafe extern "system" fn initialize_failing(_: *const LoaderInitInfoBaseHeader) -> XrResult {
    INIT_CALLS.with(|c| c.set(c.get() + 1));
    XrResult::ERROR_RUNTIME_FAILURE
}

// =============================================================================
// Symbol tables
// =============================================================================

pub type Symbols = HashMap<String, PfnVoidFunction>;

fn negotiating(f: PfnNegotiateLoaderRuntimeInterface) -> Symbols {
    Symbols::from([(NEGOTIATE.to_string(), void(f))])
}

pub fn ok_runtime() -> Symbols {
    negotiating(negotiate_ok)
}

pub fn major_two_runtime() -> Symbols {
    negotiating(negotiate_major_two)
}

pub fn zero_interface_runtime() -> Symbols {
    negotiating(negotiate_zero_interface)
}

pub fn null_getter_runtime() -> Symbols {
    negotiating(negotiate_null_getter)
}

pub fn rejecting_runtime() -> Symbols {
    negotiating(negotiate_rejecting)
}

pub fn no_enumerate_runtime() -> Symbols {
    negotiating(negotiate_no_enumerate)
}

pub fn failing_create_runtime() -> Symbols {
    negotiating(negotiate_failing_create)
}

/// Exports nothing at all.
pub fn empty_library() -> Symbols {
    Symbols::new()
}

/// Exports the negotiation function under `symbol` only.
pub fn renamed_runtime(symbol: &str) -> Symbols {
    Symbols::from([(symbol.to_string(), void(negotiate_ok as PfnNegotiateLoaderRuntimeInterface))])
}

pub fn initializing_runtime(succeed: bool) -> Symbols {
    let init: PfnInitializeLoaderKHR = if succeed { initialize_ok } else { initialize_failing };
    let mut symbols = ok_runtime();
    symbols.insert(INITIALIZE.to_string(), void(init));
    symbols
}

// =============================================================================
// Collaborators
// =============================================================================

/// What the fakes observed.
#[derive(Clone, Default)]
pub struct Probes {
    pub scans: Arc<AtomicUsize>,
    pub opened: Arc<Mutex<Vec<PathBuf>>>,
    pub closed: Arc<AtomicUsize>,
}

impl Probes {
    pub fn scans(&self) -> usize {
        self.scans.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    /// Every path `open` was asked for, including failures.
    pub fn opened(&self) -> Vec<PathBuf> {
        self.opened.lock().clone()
    }
}

pub struct FakeLibrary {
    symbols: Symbols,
    closed: Arc<AtomicUsize>,
}

impl NativeLibrary for FakeLibrary {
    fn symbol(&self, name: &str) -> Option<PfnVoidFunction> {
        self.symbols.get(name).copied()
    }
}

impl Drop for FakeLibrary {
    fn drop(&mut self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct FakeLoader {
    libraries: HashMap<PathBuf, Symbols>,
    probes: Probes,
}

impl LibraryLoader for FakeLoader {
    fn open(&self, path: &Path) -> Result<Box<dyn NativeLibrary>, String> {
        self.probes.opened.lock().push(path.to_path_buf());
        let symbols = self
            .libraries
            .get(path)
            .ok_or_else(|| format!("{}: cannot open shared object file", path.display()))?;
        Ok(Box::new(FakeLibrary {
            symbols: symbols.clone(),
            closed: Arc::clone(&self.probes.closed),
        }))
    }
}

pub struct FakeManifests {
    manifests: Result<Vec<RuntimeManifest>, ()>,
    scans: Arc<AtomicUsize>,
}

impl ManifestSource for FakeManifests {
    fn find_runtime_manifests(&self) -> Result<Vec<RuntimeManifest>, ManifestError> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        self.manifests.clone().map_err(|()| ManifestError::Io {
            path: PathBuf::from("/fake/active_runtime.json"),
            error: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        })
    }
}

/// Builds a `Loader` over fake libraries.
#[derive(Default)]
pub struct Fixture {
    libraries: HashMap<PathBuf, Symbols>,
    manifests: Vec<RuntimeManifest>,
    manifest_failure: bool,
    config: LoaderConfig,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            config: LoaderConfig {
                require_loader_init: false,
                ..LoaderConfig::default()
            },
            ..Self::default()
        }
    }

    /// Register a library that `open` can find.
    pub fn library(mut self, path: &str, symbols: Symbols) -> Self {
        self.libraries.insert(PathBuf::from(path), symbols);
        self
    }

    /// Append a candidate manifest pointing at `path`.
    pub fn candidate(mut self, path: &str) -> Self {
        self.manifests.push(RuntimeManifest::for_library(path));
        self
    }

    pub fn manifest(mut self, manifest: RuntimeManifest) -> Self {
        self.manifests.push(manifest);
        self
    }

    /// Make the manifest search itself fail.
    pub fn manifest_failure(mut self) -> Self {
        self.manifest_failure = true;
        self
    }

    pub fn require_loader_init(mut self) -> Self {
        self.config.require_loader_init = true;
        self
    }

    pub fn build(self) -> (Loader, Probes) {
        let probes = Probes::default();
        let manifests = FakeManifests {
            manifests: if self.manifest_failure { Err(()) } else { Ok(self.manifests) },
            scans: Arc::clone(&probes.scans),
        };
        let libraries = FakeLoader {
            libraries: self.libraries,
            probes: probes.clone(),
        };
        let loader = Loader::with_parts(self.config, Box::new(manifests), Box::new(libraries));
        (loader, probes)
    }
}

/// A loader with exactly one good runtime.
pub fn single_runtime() -> (Loader, Probes) {
    Fixture::new().library("libok.so", ok_runtime()).candidate("libok.so").build()
}

pub fn create_info() -> InstanceCreateInfo {
    InstanceCreateInfo::new("xrl-tests", xrl_loader::abi::CURRENT_API_VERSION)
}
