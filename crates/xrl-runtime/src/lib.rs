//! Runtime SDK
//!
//! This crate is the entry point for runtime authors. It is compiled as an
//! **rlib** into each runtime's cdylib and provides the runtime's half of the
//! loader handshake:
//!
//! - [`negotiate::respond`]: validate the loader's request and fill the response
//! - [`enumerate::fill_two_call`]: the count-then-fill enumeration convention
//! - [`define_runtime!`]: exports `xrNegotiateLoaderRuntimeInterface`
//!
//! # Usage
//!
//! ```rust,ignore
//! unsafe extern "system" fn get_instance_proc_addr(
//!     instance: xrl_abi::Instance,
//!     name: *const std::ffi::c_char,
//!     function: *mut Option<xrl_abi::pfn::PfnVoidFunction>,
//! ) -> xrl_abi::XrResult {
//!     /* ... */
//! }
//!
//! xrl_runtime::define_runtime! {
//!     api_version: xrl_abi::CURRENT_API_VERSION,
//!     get_instance_proc_addr: get_instance_proc_addr,
//! }
//! ```

pub mod enumerate;
pub mod negotiate;
mod runtime;

pub use xrl_abi as abi;

pub use enumerate::fill_two_call;
pub use negotiate::respond;
