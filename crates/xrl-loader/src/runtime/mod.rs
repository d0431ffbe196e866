//! Runtime binding: negotiation, the bound session, and its per-instance state.
//!
//! Lock discipline: the dispatch cache and the messenger registry each own a
//! mutex and no operation holds both. Messenger lookups release the registry
//! lock before taking the cache lock.

pub mod dispatch;
pub mod extensions;
pub mod init;
pub mod library;
pub mod loader;
pub mod messengers;
pub mod negotiation;
pub mod proc_addr;
pub mod session;

pub use dispatch::{DispatchCache, DispatchTable, PopulateError};
pub use extensions::{reconcile, ExtensionProperty, SupportedExtensions};
pub use init::LoaderInitData;
pub use library::{LibraryLoader, NativeLibrary};
pub use loader::Loader;
pub use messengers::MessengerRegistry;
pub use negotiation::{NegotiatedRuntime, NegotiationError};
pub use proc_addr::ProcAddr;
pub use session::RuntimeSession;
