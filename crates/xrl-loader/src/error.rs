//! Loader error taxonomy.

use thiserror::Error;
use xrl_abi::XrResult;

use crate::manifest::ManifestError;
use crate::runtime::dispatch::PopulateError;
use crate::runtime::negotiation::NegotiationError;

/// Every failure the loader core reports, each mapping onto one [`XrResult`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoaderError {
    /// No runtime is bound, or none of the candidates could be opened.
    #[error("no usable runtime")]
    InstanceLost,

    /// A runtime answered negotiation in a way that violates the protocol.
    #[error("runtime negotiation response is invalid: {0}")]
    FileContentsInvalid(String),

    /// The manifest search itself failed.
    #[error("could not read runtime manifests: {0}")]
    FileAccessError(String),

    /// A required loader-init handshake has not happened.
    #[error("loader initialization required before loading a runtime")]
    InitializationFailed,

    /// A caller-supplied payload is malformed.
    #[error("validation failure: {0}")]
    ValidationFailure(&'static str),

    /// Generic runtime-side failure, e.g. a missing mandatory entry point.
    #[error("runtime failure: {0}")]
    RuntimeFailure(String),

    /// A code returned verbatim by the runtime.
    #[error("runtime returned {0}")]
    Runtime(XrResult),
}

impl LoaderError {
    pub fn result(&self) -> XrResult {
        match self {
            Self::InstanceLost => XrResult::ERROR_INSTANCE_LOST,
            Self::FileContentsInvalid(_) => XrResult::ERROR_FILE_CONTENTS_INVALID,
            Self::FileAccessError(_) => XrResult::ERROR_FILE_ACCESS_ERROR,
            Self::InitializationFailed => XrResult::ERROR_INITIALIZATION_FAILED,
            Self::ValidationFailure(_) => XrResult::ERROR_VALIDATION_FAILURE,
            Self::RuntimeFailure(_) => XrResult::ERROR_RUNTIME_FAILURE,
            Self::Runtime(res) => *res,
        }
    }

    /// `Ok` for success codes, otherwise the code as [`LoaderError::Runtime`].
    pub fn check(res: XrResult) -> Result<()> {
        if res.is_failure() {
            Err(Self::Runtime(res))
        } else {
            Ok(())
        }
    }
}

impl From<NegotiationError> for LoaderError {
    fn from(err: NegotiationError) -> Self {
        match err {
            NegotiationError::Rejected(res) => Self::Runtime(res),
            NegotiationError::EntryPointMissing(_) => Self::RuntimeFailure(err.to_string()),
            NegotiationError::NullProcAddr
            | NegotiationError::InvalidInterfaceVersion(_)
            | NegotiationError::IncompatibleApiVersion(_) => {
                Self::FileContentsInvalid(err.to_string())
            }
        }
    }
}

impl From<ManifestError> for LoaderError {
    fn from(err: ManifestError) -> Self {
        Self::FileAccessError(err.to_string())
    }
}

impl From<PopulateError> for LoaderError {
    fn from(err: PopulateError) -> Self {
        match err {
            PopulateError::Unresolved { result, .. } if result.is_failure() => Self::Runtime(result),
            _ => Self::Runtime(XrResult::ERROR_FUNCTION_UNSUPPORTED),
        }
    }
}

pub type Result<T, E = LoaderError> = std::result::Result<T, E>;
