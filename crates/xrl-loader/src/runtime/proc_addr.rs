//! Entry-point resolution through the runtime's getter.

use std::ffi::CString;

use xrl_abi::pfn::{PfnGetInstanceProcAddr, PfnVoidFunction};
use xrl_abi::{Instance, XrResult};

/// The runtime's `xrGetInstanceProcAddr`, fixed for the lifetime of a session.
#[derive(Clone, Copy)]
pub struct ProcAddr {
    get_instance_proc_addr: PfnGetInstanceProcAddr,
}

impl ProcAddr {
    pub fn new(get_instance_proc_addr: PfnGetInstanceProcAddr) -> Self {
        Self {
            get_instance_proc_addr,
        }
    }

    pub fn raw(&self) -> PfnGetInstanceProcAddr {
        self.get_instance_proc_addr
    }

    /// Resolve `name`, scoped to `instance` (`Instance::NULL` for globals).
    ///
    /// A getter that reports success but hands back null is treated as
    /// `ERROR_FUNCTION_UNSUPPORTED`.
    pub fn resolve(&self, instance: Instance, name: &str) -> Result<PfnVoidFunction, XrResult> {
        let name = CString::new(name).map_err(|_| XrResult::ERROR_VALIDATION_FAILURE)?;
        let mut function: Option<PfnVoidFunction> = None;
        let res = unsafe { (self.get_instance_proc_addr)(instance, name.as_ptr(), &mut function) };
        if res.is_failure() {
            return Err(res);
        }
        function.ok_or(XrResult::ERROR_FUNCTION_UNSUPPORTED)
    }

    /// Resolve `name` and reinterpret it as the entry point type `F`.
    ///
    /// # Safety
    ///
    /// `F` must be the function pointer type the runtime implements for `name`.
    pub unsafe fn resolve_as<F: Copy>(&self, instance: Instance, name: &str) -> Result<F, XrResult> {
        let function = self.resolve(instance, name)?;
        Ok(cast_function::<F>(function))
    }
}

impl std::fmt::Debug for ProcAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ProcAddr")
            .field(&(self.get_instance_proc_addr as *const ()))
            .finish()
    }
}

/// Reinterpret an untyped entry point.
///
/// # Safety
///
/// `F` must be a function pointer type matching the function's real signature.
pub unsafe fn cast_function<F: Copy>(function: PfnVoidFunction) -> F {
    debug_assert_eq!(std::mem::size_of::<F>(), std::mem::size_of::<PfnVoidFunction>());
    std::mem::transmute_copy::<PfnVoidFunction, F>(&function)
}
