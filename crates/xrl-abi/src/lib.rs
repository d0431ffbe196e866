//! FFI-safe types shared between the loader and runtimes.
//!
//! Everything in this crate is `#[repr(C)]` or `#[repr(transparent)]` and
//! carries no behavior beyond constructors and accessors. The loader
//! (`xrl-loader`) and the runtime SDK (`xrl-runtime`) both build on it, so
//! the two sides of the negotiation handshake always agree on layout.
//!
//! # What lives where
//!
//! | Module | Contains |
//! |--------|----------|
//! | [`types`] | `XrResult`, `Version`, handles, structure types, extension/instance records |
//! | [`negotiate`] | Negotiation request/response records and protocol constants |
//! | [`init`] | Loader-init payload records (`xrInitializeLoaderKHR`) |
//! | [`pfn`] | Function pointer types for every resolved entry point |

pub mod init;
pub mod negotiate;
pub mod pfn;
pub mod types;

pub use init::{LoaderInitInfoAndroid, LoaderInitInfoBaseHeader};
pub use negotiate::{
    LoaderInterfaceStructs, NegotiateLoaderInfo, NegotiateRuntimeRequest,
    CURRENT_LOADER_RUNTIME_VERSION, LOADER_INFO_STRUCT_VERSION, RUNTIME_INFO_STRUCT_VERSION,
};
pub use types::{
    copy_str_to_chars, chars_to_str, DebugUtilsMessenger, ExtensionProperties, Instance,
    InstanceCreateInfo, InstanceProperties, Path, StructureType, Version, XrResult,
    CURRENT_API_VERSION, MAX_EXTENSION_NAME_SIZE, MAX_RESULT_STRING_SIZE,
    MAX_RUNTIME_NAME_SIZE, MAX_STRUCTURE_NAME_SIZE,
};
