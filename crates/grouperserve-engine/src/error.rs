//! Error types for the grouping service

use grouperserve_kernel::KernelError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for grouping operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors a grouping request can fail with
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A required request parameter is absent
    #[error("{0}")]
    MissingParameter(String),

    /// A request parameter is present but cannot be decoded
    #[error("{0}")]
    InvalidParameter(String),

    /// The requested version is not in the systems list
    #[error("The provided version {0} does not exist.")]
    UnknownSystem(String),

    /// The patient case could not be parsed
    #[error("{0}")]
    MalformedCase(String),

    /// Engines for a registered version could not be built
    #[error("Could not load grouper for system {version}: {source}")]
    EngineUnavailable {
        version: String,
        #[source]
        source: KernelError,
    },

    /// The class code produced by the grouper is missing from the catalogue
    #[error("No cost-weight entry for {class_code} in the catalogue of system {version}")]
    CostWeightLookup { version: String, class_code: String },

    /// Supplement grouping was requested for a system without supplement engine
    #[error("There is no supplement grouper for system {0}")]
    SupplementUnavailable(String),

    /// Unexpected failure inside the service
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Client errors are reported as 400, everything else as 500.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MissingParameter(_)
                | Self::InvalidParameter(_)
                | Self::UnknownSystem(_)
                | Self::MalformedCase(_)
                | Self::SupplementUnavailable(_)
        )
    }
}

/// Errors raised while loading the systems list at startup
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Failed to read systems list {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed systems list {}: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid systems list {}: {message}", .path.display())]
    Invalid { path: PathBuf, message: String },

    #[error("Could not load catalogue of system {version}: {source}")]
    Catalogue {
        version: String,
        #[source]
        source: KernelError,
    },
}
