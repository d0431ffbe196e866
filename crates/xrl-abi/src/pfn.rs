//! Function pointer types for the entry points the loader resolves.
//!
//! Every resolved symbol first arrives as a [`PfnVoidFunction`] and is cast to
//! one of the typed aliases below by whoever knows its name.

use std::ffi::{c_char, c_void};

use crate::init::LoaderInitInfoBaseHeader;
use crate::negotiate::{NegotiateLoaderInfo, NegotiateRuntimeRequest};
use crate::types::{
    DebugUtilsMessenger, ExtensionProperties, Instance, InstanceCreateInfo, InstanceProperties,
    Path, StructureType, XrResult,
};

/// Untyped entry point, as returned by the entry-point getter.
pub type PfnVoidFunction = unsafe extern "system" fn();

/// The entry-point getter: `(instance, name, out) -> result`.
///
/// Must accept `Instance::NULL` for global functions.
pub type PfnGetInstanceProcAddr =
    unsafe extern "system" fn(Instance, *const c_char, *mut Option<PfnVoidFunction>) -> XrResult;

pub type PfnNegotiateLoaderRuntimeInterface = unsafe extern "system" fn(
    *const NegotiateLoaderInfo,
    *mut NegotiateRuntimeRequest,
) -> XrResult;

pub type PfnInitializeLoaderKHR =
    unsafe extern "system" fn(*const LoaderInitInfoBaseHeader) -> XrResult;

pub type PfnEnumerateInstanceExtensionProperties = unsafe extern "system" fn(
    *const c_char,
    u32,
    *mut u32,
    *mut ExtensionProperties,
) -> XrResult;

pub type PfnCreateInstance =
    unsafe extern "system" fn(*const InstanceCreateInfo, *mut Instance) -> XrResult;

pub type PfnDestroyInstance = unsafe extern "system" fn(Instance) -> XrResult;

pub type PfnGetInstanceProperties =
    unsafe extern "system" fn(Instance, *mut InstanceProperties) -> XrResult;

/// `event` points at an event data buffer the caller owns.
pub type PfnPollEvent = unsafe extern "system" fn(Instance, *mut c_void) -> XrResult;

pub type PfnResultToString = unsafe extern "system" fn(Instance, XrResult, *mut c_char) -> XrResult;

pub type PfnStructureTypeToString =
    unsafe extern "system" fn(Instance, StructureType, *mut c_char) -> XrResult;

pub type PfnStringToPath = unsafe extern "system" fn(Instance, *const c_char, *mut Path) -> XrResult;

pub type PfnPathToString =
    unsafe extern "system" fn(Instance, Path, u32, *mut u32, *mut c_char) -> XrResult;

/// `create_info` points at a messenger create-info record the loader does not inspect.
pub type PfnCreateDebugUtilsMessengerEXT =
    unsafe extern "system" fn(Instance, *const c_void, *mut DebugUtilsMessenger) -> XrResult;

pub type PfnDestroyDebugUtilsMessengerEXT =
    unsafe extern "system" fn(DebugUtilsMessenger) -> XrResult;

pub type PfnSubmitDebugUtilsMessageEXT =
    unsafe extern "system" fn(Instance, u64, u64, *const c_void) -> XrResult;
