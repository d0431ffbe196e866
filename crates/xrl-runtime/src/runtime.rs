//! Runtime definition macro.
//!
//! Generates the `#[no_mangle] extern "system"` negotiation export so runtime
//! authors only write their entry-point getter.

/// Define an xrl runtime.
///
/// Exports `xrNegotiateLoaderRuntimeInterface`, answering with `api_version`
/// and the given entry-point getter. An optional `export:` overrides the
/// exported symbol name for manifests that use a `functions` override.
///
/// # Example
///
/// ```rust,ignore
/// xrl_runtime::define_runtime! {
///     api_version: xrl_runtime::abi::Version::new(1, 1, 0),
///     get_instance_proc_addr: my_get_instance_proc_addr,
/// }
/// ```
#[macro_export]
macro_rules! define_runtime {
    (
        api_version: $api:expr,
        get_instance_proc_addr: $gipa:path $(,)?
    ) => {
        $crate::define_runtime! {
            export: xrNegotiateLoaderRuntimeInterface,
            api_version: $api,
            get_instance_proc_addr: $gipa,
        }
    };

    (
        export: $export:ident,
        api_version: $api:expr,
        get_instance_proc_addr: $gipa:path $(,)?
    ) => {
        #[no_mangle]
        #[allow(non_snake_case)]
        pub unsafe extern "system" fn $export(
            loader_info: *const $crate::abi::NegotiateLoaderInfo,
            request: *mut $crate::abi::NegotiateRuntimeRequest,
        ) -> $crate::abi::XrResult {
            // Signature check: the getter must match the ABI exactly.
            let gipa: $crate::abi::pfn::PfnGetInstanceProcAddr = $gipa;
            $crate::negotiate::respond_raw(loader_info, request, $api, gipa)
        }
    };
}
