//! Runtime half of the negotiation handshake.

use xrl_abi::pfn::PfnGetInstanceProcAddr;
use xrl_abi::{
    LoaderInterfaceStructs, NegotiateLoaderInfo, NegotiateRuntimeRequest, Version, XrResult,
    CURRENT_LOADER_RUNTIME_VERSION, LOADER_INFO_STRUCT_VERSION, RUNTIME_INFO_STRUCT_VERSION,
};

/// Validate the loader's request and, if compatible, fill `request`.
///
/// Rejects with `ERROR_INITIALIZATION_FAILED` when either record has the wrong
/// type, version or size, when the loader's interface range excludes
/// [`CURRENT_LOADER_RUNTIME_VERSION`], or when `api_version` (major.minor) is
/// outside the loader's API range. `request` is left untouched on rejection.
pub fn respond(
    loader_info: &NegotiateLoaderInfo,
    request: &mut NegotiateRuntimeRequest,
    api_version: Version,
    get_instance_proc_addr: PfnGetInstanceProcAddr,
) -> XrResult {
    if loader_info.struct_type != LoaderInterfaceStructs::LOADER_INFO
        || loader_info.struct_version != LOADER_INFO_STRUCT_VERSION
        || loader_info.struct_size != std::mem::size_of::<NegotiateLoaderInfo>()
    {
        return XrResult::ERROR_INITIALIZATION_FAILED;
    }
    if request.struct_type != LoaderInterfaceStructs::RUNTIME_REQUEST
        || request.struct_version != RUNTIME_INFO_STRUCT_VERSION
        || request.struct_size != std::mem::size_of::<NegotiateRuntimeRequest>()
    {
        return XrResult::ERROR_INITIALIZATION_FAILED;
    }

    if CURRENT_LOADER_RUNTIME_VERSION < loader_info.min_interface_version
        || CURRENT_LOADER_RUNTIME_VERSION > loader_info.max_interface_version
    {
        return XrResult::ERROR_INITIALIZATION_FAILED;
    }

    // Patch level never affects compatibility.
    let ours = (api_version.major(), api_version.minor());
    let min = (loader_info.min_api_version.major(), loader_info.min_api_version.minor());
    let max = (loader_info.max_api_version.major(), loader_info.max_api_version.minor());
    if ours < min || ours > max {
        return XrResult::ERROR_INITIALIZATION_FAILED;
    }

    request.runtime_interface_version = CURRENT_LOADER_RUNTIME_VERSION;
    request.runtime_api_version = api_version;
    request.get_instance_proc_addr = Some(get_instance_proc_addr);
    XrResult::SUCCESS
}

/// Pointer-taking form of [`respond`] for `extern "system"` exports.
///
/// # Safety
///
/// Non-null pointers must reference valid, properly aligned records.
pub unsafe fn respond_raw(
    loader_info: *const NegotiateLoaderInfo,
    request: *mut NegotiateRuntimeRequest,
    api_version: Version,
    get_instance_proc_addr: PfnGetInstanceProcAddr,
) -> XrResult {
    if loader_info.is_null() || request.is_null() {
        return XrResult::ERROR_INITIALIZATION_FAILED;
    }
    respond(&*loader_info, &mut *request, api_version, get_instance_proc_addr)
}
