//! Negotiation records exchanged once per load attempt.
//!
//! The loader fills a [`NegotiateLoaderInfo`] with the interface and API
//! version ranges it supports and hands it, together with an empty
//! [`NegotiateRuntimeRequest`], to the runtime's
//! `xrNegotiateLoaderRuntimeInterface`. The runtime writes the versions it
//! settled on and its entry-point getter into the request.

use crate::pfn::PfnGetInstanceProcAddr;
use crate::types::Version;

/// Highest loader/runtime interface version this crate understands.
pub const CURRENT_LOADER_RUNTIME_VERSION: u32 = 1;
pub const LOADER_INFO_STRUCT_VERSION: u32 = 1;
pub const RUNTIME_INFO_STRUCT_VERSION: u32 = 1;

/// Identifies which negotiation record a block of memory holds.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoaderInterfaceStructs(pub i32);

impl LoaderInterfaceStructs {
    pub const UNINITIALIZED: Self = Self(0);
    pub const LOADER_INFO: Self = Self(1);
    pub const API_LAYER_REQUEST: Self = Self(2);
    pub const RUNTIME_REQUEST: Self = Self(3);
}

/// What the loader supports. Read-only for the runtime.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct NegotiateLoaderInfo {
    pub struct_type: LoaderInterfaceStructs,
    pub struct_version: u32,
    pub struct_size: usize,
    pub min_interface_version: u32,
    pub max_interface_version: u32,
    pub min_api_version: Version,
    pub max_api_version: Version,
}

impl NegotiateLoaderInfo {
    /// The request this loader sends: interface `[1, CURRENT]`, API `[1.0.0, 1.1023.4095]`.
    pub const fn for_loader() -> Self {
        Self {
            struct_type: LoaderInterfaceStructs::LOADER_INFO,
            struct_version: LOADER_INFO_STRUCT_VERSION,
            struct_size: std::mem::size_of::<Self>(),
            min_interface_version: 1,
            max_interface_version: CURRENT_LOADER_RUNTIME_VERSION,
            min_api_version: Version::new(1, 0, 0),
            max_api_version: Version::new(1, 0x3ff, 0xfff),
        }
    }
}

/// What the runtime settled on. Written by the runtime.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct NegotiateRuntimeRequest {
    pub struct_type: LoaderInterfaceStructs,
    pub struct_version: u32,
    pub struct_size: usize,
    pub runtime_interface_version: u32,
    pub runtime_api_version: Version,
    pub get_instance_proc_addr: Option<PfnGetInstanceProcAddr>,
}

impl NegotiateRuntimeRequest {
    /// Header filled in, outputs zeroed.
    pub const fn empty() -> Self {
        Self {
            struct_type: LoaderInterfaceStructs::RUNTIME_REQUEST,
            struct_version: RUNTIME_INFO_STRUCT_VERSION,
            struct_size: std::mem::size_of::<Self>(),
            runtime_interface_version: 0,
            runtime_api_version: Version(0),
            get_instance_proc_addr: None,
        }
    }
}

impl Default for NegotiateRuntimeRequest {
    fn default() -> Self {
        Self::empty()
    }
}
