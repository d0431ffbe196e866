//! Loader half of the negotiation handshake.
//!
//! Pure logic: build the request, interpret the runtime's answer. The caller
//! owns the library and performs the actual call.

use thiserror::Error;
use xrl_abi::pfn::{PfnGetInstanceProcAddr, PfnNegotiateLoaderRuntimeInterface};
use xrl_abi::{
    NegotiateLoaderInfo, NegotiateRuntimeRequest, Version, XrResult, CURRENT_API_VERSION,
    CURRENT_LOADER_RUNTIME_VERSION,
};

pub const NEGOTIATE_FUNCTION_NAME: &str = "xrNegotiateLoaderRuntimeInterface";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NegotiationError {
    #[error("runtime does not export {0}")]
    EntryPointMissing(String),

    #[error("negotiation failed with error {0}")]
    Rejected(XrResult),

    #[error("negotiation succeeded but returned NULL getInstanceProcAddr")]
    NullProcAddr,

    #[error("negotiation succeeded but returned invalid interface version {0}")]
    InvalidInterfaceVersion(u32),

    #[error("API version {0} returned is not compatible with this loader")]
    IncompatibleApiVersion(Version),
}

/// The outcome of an accepted negotiation.
#[derive(Debug, Clone, Copy)]
pub struct NegotiatedRuntime {
    pub interface_version: u32,
    pub api_version: Version,
    pub get_instance_proc_addr: PfnGetInstanceProcAddr,
}

/// Run the handshake against a resolved (or missing) negotiation entry point.
///
/// # Safety
///
/// `negotiate`, if present, must be a function with the negotiation ABI
/// from a library that stays loaded for the duration of the call.
pub unsafe fn negotiate(
    negotiate: Option<PfnNegotiateLoaderRuntimeInterface>,
    entry_point_name: &str,
) -> Result<NegotiatedRuntime, NegotiationError> {
    let Some(negotiate) = negotiate else {
        return Err(NegotiationError::EntryPointMissing(entry_point_name.to_string()));
    };
    let loader_info = NegotiateLoaderInfo::for_loader();
    let mut response = NegotiateRuntimeRequest::empty();
    let res = negotiate(&loader_info, &mut response);
    validate(res, &response)
}

/// Accept or reject a runtime's response.
pub fn validate(
    res: XrResult,
    response: &NegotiateRuntimeRequest,
) -> Result<NegotiatedRuntime, NegotiationError> {
    if res.is_failure() {
        return Err(NegotiationError::Rejected(res));
    }

    let Some(get_instance_proc_addr) = response.get_instance_proc_addr else {
        return Err(NegotiationError::NullProcAddr);
    };

    let interface_version = response.runtime_interface_version;
    if interface_version == 0 || interface_version > CURRENT_LOADER_RUNTIME_VERSION {
        return Err(NegotiationError::InvalidInterfaceVersion(interface_version));
    }

    let api_version = response.runtime_api_version;
    let zero = api_version.major() == 0 && api_version.minor() == 0;
    if api_version.major() != CURRENT_API_VERSION.major() || zero {
        return Err(NegotiationError::IncompatibleApiVersion(api_version));
    }

    Ok(NegotiatedRuntime {
        interface_version,
        api_version,
        get_instance_proc_addr,
    })
}
