//! Core FFI records: result codes, versions, handles and the structures the
//! loader exchanges with a runtime outside of negotiation.

use std::ffi::{c_char, c_void, CStr};
use std::fmt;

pub const MAX_EXTENSION_NAME_SIZE: usize = 128;
pub const MAX_RUNTIME_NAME_SIZE: usize = 128;
pub const MAX_APPLICATION_NAME_SIZE: usize = 128;
pub const MAX_ENGINE_NAME_SIZE: usize = 128;
pub const MAX_RESULT_STRING_SIZE: usize = 64;
pub const MAX_STRUCTURE_NAME_SIZE: usize = 64;

// =============================================================================
// XrResult
// =============================================================================

/// Result code returned by every entry point. Non-negative values are success.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct XrResult(pub i32);

impl XrResult {
    pub const SUCCESS: Self = Self(0);
    pub const EVENT_UNAVAILABLE: Self = Self(4);
    pub const ERROR_VALIDATION_FAILURE: Self = Self(-1);
    pub const ERROR_RUNTIME_FAILURE: Self = Self(-2);
    pub const ERROR_OUT_OF_MEMORY: Self = Self(-3);
    pub const ERROR_API_VERSION_UNSUPPORTED: Self = Self(-4);
    pub const ERROR_INITIALIZATION_FAILED: Self = Self(-6);
    pub const ERROR_FUNCTION_UNSUPPORTED: Self = Self(-7);
    pub const ERROR_EXTENSION_NOT_PRESENT: Self = Self(-9);
    pub const ERROR_SIZE_INSUFFICIENT: Self = Self(-11);
    pub const ERROR_HANDLE_INVALID: Self = Self(-12);
    pub const ERROR_INSTANCE_LOST: Self = Self(-13);
    pub const ERROR_FILE_ACCESS_ERROR: Self = Self(-21);
    pub const ERROR_FILE_CONTENTS_INVALID: Self = Self(-22);

    #[inline]
    pub const fn is_success(self) -> bool {
        self.0 >= 0
    }

    #[inline]
    pub const fn is_failure(self) -> bool {
        self.0 < 0
    }

    /// Symbolic name of the code, if it is one this crate knows about.
    pub const fn name(self) -> Option<&'static str> {
        Some(match self.0 {
            0 => "XR_SUCCESS",
            4 => "XR_EVENT_UNAVAILABLE",
            -1 => "XR_ERROR_VALIDATION_FAILURE",
            -2 => "XR_ERROR_RUNTIME_FAILURE",
            -3 => "XR_ERROR_OUT_OF_MEMORY",
            -4 => "XR_ERROR_API_VERSION_UNSUPPORTED",
            -6 => "XR_ERROR_INITIALIZATION_FAILED",
            -7 => "XR_ERROR_FUNCTION_UNSUPPORTED",
            -9 => "XR_ERROR_EXTENSION_NOT_PRESENT",
            -11 => "XR_ERROR_SIZE_INSUFFICIENT",
            -12 => "XR_ERROR_HANDLE_INVALID",
            -13 => "XR_ERROR_INSTANCE_LOST",
            -21 => "XR_ERROR_FILE_ACCESS_ERROR",
            -22 => "XR_ERROR_FILE_CONTENTS_INVALID",
            _ => return None,
        })
    }
}

impl fmt::Display for XrResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "XrResult({})", self.0),
        }
    }
}

// =============================================================================
// Version
// =============================================================================

/// Packed `major.minor.patch` version: 16 bits major, 16 bits minor, 32 bits patch.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Version(pub u64);

impl Version {
    pub const fn new(major: u16, minor: u16, patch: u32) -> Self {
        Self(((major as u64) << 48) | ((minor as u64) << 32) | patch as u64)
    }

    pub const fn major(self) -> u16 {
        (self.0 >> 48) as u16
    }

    pub const fn minor(self) -> u16 {
        ((self.0 >> 32) & 0xffff) as u16
    }

    pub const fn patch(self) -> u32 {
        (self.0 & 0xffff_ffff) as u32
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major(), self.minor(), self.patch())
    }
}

/// API version this loader was built against.
pub const CURRENT_API_VERSION: Version = Version::new(1, 1, 38);

// =============================================================================
// Handles
// =============================================================================

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[repr(transparent)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name(pub u64);

        impl $name {
            pub const NULL: Self = Self(0);

            #[inline]
            pub const fn is_null(self) -> bool {
                self.0 == 0
            }

            #[inline]
            pub const fn raw(self) -> u64 {
                self.0
            }
        }
    };
}

define_handle!(
    /// Opaque instance handle minted by the runtime.
    Instance
);
define_handle!(
    /// Opaque debug-utils messenger handle minted by the runtime.
    DebugUtilsMessenger
);

/// Interned path atom.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Path(pub u64);

// =============================================================================
// Structure types
// =============================================================================

#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StructureType(pub i32);

impl StructureType {
    pub const UNKNOWN: Self = Self(0);
    pub const API_LAYER_PROPERTIES: Self = Self(1);
    pub const EXTENSION_PROPERTIES: Self = Self(2);
    pub const INSTANCE_CREATE_INFO: Self = Self(3);
    pub const EVENT_DATA_BUFFER: Self = Self(16);
    pub const INSTANCE_PROPERTIES: Self = Self(32);
    pub const DEBUG_UTILS_MESSENGER_CALLBACK_DATA_EXT: Self = Self(1000019001);
    pub const DEBUG_UTILS_MESSENGER_CREATE_INFO_EXT: Self = Self(1000019002);
    pub const LOADER_INIT_INFO_ANDROID_KHR: Self = Self(1000089000);
}

// =============================================================================
// Fixed-size string helpers
// =============================================================================

/// View a nul-terminated fixed-size char array as UTF-8. Invalid UTF-8 reads as "".
pub fn chars_to_str(chars: &[c_char]) -> &str {
    // c_char is i8 or u8 depending on target; both are one byte.
    let bytes = unsafe { std::slice::from_raw_parts(chars.as_ptr() as *const u8, chars.len()) };
    let len = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    std::str::from_utf8(&bytes[..len]).unwrap_or("")
}

/// Copy `src` into a fixed-size char array, truncating and always nul-terminating.
pub fn copy_str_to_chars(dst: &mut [c_char], src: &str) {
    if dst.is_empty() {
        return;
    }
    let n = src.len().min(dst.len() - 1);
    for (d, &b) in dst.iter_mut().zip(src.as_bytes()[..n].iter()) {
        *d = b as c_char;
    }
    dst[n] = 0;
}

// =============================================================================
// Extension properties
// =============================================================================

#[repr(C)]
#[derive(Clone, Copy)]
pub struct ExtensionProperties {
    pub ty: StructureType,
    pub next: *mut c_void,
    pub extension_name: [c_char; MAX_EXTENSION_NAME_SIZE],
    pub extension_version: u32,
}

impl ExtensionProperties {
    /// An output slot for the two-call enumeration idiom.
    pub const fn empty() -> Self {
        Self {
            ty: StructureType::EXTENSION_PROPERTIES,
            next: std::ptr::null_mut(),
            extension_name: [0; MAX_EXTENSION_NAME_SIZE],
            extension_version: 0,
        }
    }

    pub fn new(name: &str, version: u32) -> Self {
        let mut props = Self::empty();
        copy_str_to_chars(&mut props.extension_name, name);
        props.extension_version = version;
        props
    }

    pub fn name(&self) -> &str {
        chars_to_str(&self.extension_name)
    }
}

impl Default for ExtensionProperties {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for ExtensionProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionProperties")
            .field("name", &self.name())
            .field("version", &self.extension_version)
            .finish()
    }
}

// =============================================================================
// Instance creation
// =============================================================================

#[repr(C)]
#[derive(Clone, Copy)]
pub struct ApplicationInfo {
    pub application_name: [c_char; MAX_APPLICATION_NAME_SIZE],
    pub application_version: u32,
    pub engine_name: [c_char; MAX_ENGINE_NAME_SIZE],
    pub engine_version: u32,
    pub api_version: Version,
}

#[repr(C)]
pub struct InstanceCreateInfo {
    pub ty: StructureType,
    pub next: *const c_void,
    pub create_flags: u64,
    pub application_info: ApplicationInfo,
    pub enabled_api_layer_count: u32,
    pub enabled_api_layer_names: *const *const c_char,
    pub enabled_extension_count: u32,
    pub enabled_extension_names: *const *const c_char,
}

impl InstanceCreateInfo {
    /// Create info with no layers and no extensions enabled.
    pub fn new(application_name: &str, api_version: Version) -> Self {
        let mut application_info = ApplicationInfo {
            application_name: [0; MAX_APPLICATION_NAME_SIZE],
            application_version: 0,
            engine_name: [0; MAX_ENGINE_NAME_SIZE],
            engine_version: 0,
            api_version,
        };
        copy_str_to_chars(&mut application_info.application_name, application_name);
        Self {
            ty: StructureType::INSTANCE_CREATE_INFO,
            next: std::ptr::null(),
            create_flags: 0,
            application_info,
            enabled_api_layer_count: 0,
            enabled_api_layer_names: std::ptr::null(),
            enabled_extension_count: 0,
            enabled_extension_names: std::ptr::null(),
        }
    }

    pub fn application_name(&self) -> &str {
        chars_to_str(&self.application_info.application_name)
    }

    /// Borrow the enabled extension names.
    ///
    /// # Safety
    ///
    /// `enabled_extension_names` must point to `enabled_extension_count` valid,
    /// nul-terminated strings that outlive the returned slice.
    pub unsafe fn enabled_extensions(&self) -> Vec<&CStr> {
        if self.enabled_extension_names.is_null() {
            return Vec::new();
        }
        let names = std::slice::from_raw_parts(
            self.enabled_extension_names,
            self.enabled_extension_count as usize,
        );
        names
            .iter()
            .filter(|p| !p.is_null())
            .map(|&p| CStr::from_ptr(p))
            .collect()
    }
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct InstanceProperties {
    pub ty: StructureType,
    pub next: *mut c_void,
    pub runtime_version: Version,
    pub runtime_name: [c_char; MAX_RUNTIME_NAME_SIZE],
}

impl InstanceProperties {
    pub const fn empty() -> Self {
        Self {
            ty: StructureType::INSTANCE_PROPERTIES,
            next: std::ptr::null_mut(),
            runtime_version: Version(0),
            runtime_name: [0; MAX_RUNTIME_NAME_SIZE],
        }
    }

    pub fn runtime_name(&self) -> &str {
        chars_to_str(&self.runtime_name)
    }
}

impl Default for InstanceProperties {
    fn default() -> Self {
        Self::empty()
    }
}
