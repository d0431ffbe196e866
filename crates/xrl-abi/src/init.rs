//! Loader-init payload (`xrInitializeLoaderKHR`).
//!
//! Some platforms need process context the loader cannot discover on its
//! own. The application passes it once, before any runtime is loaded, and the
//! loader forwards its retained copy to the runtime before negotiating.

use std::ffi::c_void;

use crate::types::StructureType;

/// Common header of every loader-init payload.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct LoaderInitInfoBaseHeader {
    pub ty: StructureType,
    pub next: *const c_void,
}

/// Android payload: the JavaVM and the application's Context object.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct LoaderInitInfoAndroid {
    pub ty: StructureType,
    pub next: *const c_void,
    pub application_vm: *mut c_void,
    pub application_context: *mut c_void,
}

impl LoaderInitInfoAndroid {
    pub const fn new(application_vm: *mut c_void, application_context: *mut c_void) -> Self {
        Self {
            ty: StructureType::LOADER_INIT_INFO_ANDROID_KHR,
            next: std::ptr::null(),
            application_vm,
            application_context,
        }
    }

    /// View as the common header, for passing through `xrInitializeLoaderKHR`.
    pub fn as_header(&self) -> &LoaderInitInfoBaseHeader {
        // Both are repr(C) and share the leading `ty`/`next` fields.
        unsafe { &*(self as *const Self as *const LoaderInitInfoBaseHeader) }
    }
}
