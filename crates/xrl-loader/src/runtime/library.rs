//! Platform dynamic-library seam.
//!
//! The core never touches `dlopen` directly: it asks a [`LibraryLoader`] for a
//! [`NativeLibrary`], resolves symbols through it, and closes it by dropping
//! it. Dropping is the only way to close, so a library is released exactly
//! once no matter which path (rejection, unload, teardown) lets go of it.

use std::ffi::CString;
use std::path::Path;

use xrl_abi::pfn::PfnVoidFunction;

/// An opened runtime library. Dropping it closes the library.
pub trait NativeLibrary: Send + Sync {
    /// Look up an exported symbol by name.
    fn symbol(&self, name: &str) -> Option<PfnVoidFunction>;
}

/// Opens runtime libraries.
pub trait LibraryLoader: Send + Sync {
    /// Open `path`. The error is the platform's diagnostic text.
    fn open(&self, path: &Path) -> Result<Box<dyn NativeLibrary>, String>;
}

// =============================================================================
// dlopen
// =============================================================================

/// Loader over `dlopen(RTLD_NOW | RTLD_LOCAL)`.
#[cfg(unix)]
#[derive(Debug, Default, Clone, Copy)]
pub struct Dlopen;

#[cfg(unix)]
impl LibraryLoader for Dlopen {
    fn open(&self, path: &Path) -> Result<Box<dyn NativeLibrary>, String> {
        use std::os::unix::ffi::OsStrExt;

        let path_c = CString::new(path.as_os_str().as_bytes())
            .map_err(|_| format!("library path {:?} contains a NUL byte", path))?;

        let handle = unsafe { libc::dlopen(path_c.as_ptr(), libc::RTLD_NOW | libc::RTLD_LOCAL) };
        if handle.is_null() {
            return Err(format!("dlopen failed: {}", last_dl_error()));
        }

        Ok(Box::new(DlopenLibrary { handle }))
    }
}

/// A `dlopen` handle; `dlclose` on drop.
#[cfg(unix)]
pub struct DlopenLibrary {
    handle: *mut libc::c_void,
}

// dlopen handles are process-global, safe to share across threads.
#[cfg(unix)]
unsafe impl Send for DlopenLibrary {}
#[cfg(unix)]
unsafe impl Sync for DlopenLibrary {}

#[cfg(unix)]
impl NativeLibrary for DlopenLibrary {
    fn symbol(&self, name: &str) -> Option<PfnVoidFunction> {
        let name = CString::new(name).ok()?;
        let sym = unsafe { libc::dlsym(self.handle, name.as_ptr()) };
        if sym.is_null() {
            None
        } else {
            Some(unsafe { std::mem::transmute::<*mut libc::c_void, PfnVoidFunction>(sym) })
        }
    }
}

#[cfg(unix)]
impl Drop for DlopenLibrary {
    fn drop(&mut self) {
        let result = unsafe { libc::dlclose(self.handle) };
        if result != 0 {
            tracing::error!(error = %last_dl_error(), "dlclose failed");
        }
    }
}

#[cfg(unix)]
fn last_dl_error() -> String {
    let err = unsafe { libc::dlerror() };
    if err.is_null() {
        return "unknown error".to_string();
    }
    unsafe { std::ffi::CStr::from_ptr(err) }.to_string_lossy().into_owned()
}

/// The default loader for this platform.
#[cfg(unix)]
pub fn platform_loader() -> Box<dyn LibraryLoader> {
    Box::new(Dlopen)
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
    use super::*;

    #[test]
    fn missing_library_reports_dlerror() {
        let err = Dlopen
            .open(Path::new("/nonexistent/libxrl_missing_runtime.so"))
            .err()
            .expect("open must fail");
        assert!(err.starts_with("dlopen failed:"), "{err}");
    }

    #[test]
    fn nul_in_path_is_rejected() {
        let err = Dlopen.open(Path::new("bad\0path.so")).err().expect("open must fail");
        assert!(err.contains("NUL"), "{err}");
    }
}
