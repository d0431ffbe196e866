//! Retained loader-init payload.

use xrl_abi::{LoaderInitInfoAndroid, LoaderInitInfoBaseHeader, StructureType};

use crate::error::LoaderError;

pub const INITIALIZE_FUNCTION_NAME: &str = "xrInitializeLoaderKHR";

/// The loader's validated copy of the application's init payload.
#[derive(Debug, Clone, Copy)]
pub struct LoaderInitData {
    data: LoaderInitInfoAndroid,
}

// The VM and context pointers are process-global handles owned by the
// application; the loader only forwards them.
unsafe impl Send for LoaderInitData {}
unsafe impl Sync for LoaderInitData {}

impl LoaderInitData {
    /// Validate and copy a payload.
    ///
    /// # Safety
    ///
    /// `info` must be the header of a complete record of the type its `ty`
    /// field names.
    pub unsafe fn from_header(info: &LoaderInitInfoBaseHeader) -> Result<Self, LoaderError> {
        if info.ty != StructureType::LOADER_INIT_INFO_ANDROID_KHR {
            return Err(LoaderError::ValidationFailure("unsupported loader init structure type"));
        }
        let info = &*(info as *const LoaderInitInfoBaseHeader as *const LoaderInitInfoAndroid);
        Self::new(*info)
    }

    pub fn new(info: LoaderInitInfoAndroid) -> Result<Self, LoaderError> {
        if info.ty != StructureType::LOADER_INIT_INFO_ANDROID_KHR {
            return Err(LoaderError::ValidationFailure("unsupported loader init structure type"));
        }
        if info.application_vm.is_null() {
            return Err(LoaderError::ValidationFailure("applicationVM is null"));
        }
        if info.application_context.is_null() {
            return Err(LoaderError::ValidationFailure("applicationContext is null"));
        }
        let mut data = info;
        data.next = std::ptr::null();
        Ok(Self { data })
    }

    pub fn data(&self) -> &LoaderInitInfoAndroid {
        &self.data
    }

    /// The payload as passed to a runtime's `xrInitializeLoaderKHR`.
    pub fn header(&self) -> &LoaderInitInfoBaseHeader {
        self.data.as_header()
    }
}
