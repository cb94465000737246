//! Helper error types.

use thiserror::Error;

/// Boxed error raised by a discovery or execution collaborator.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur during helper operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A required argument was empty, blank or absent.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A command kind or type tag outside the supported set reached a
    /// formatting or dispatch branch.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// Type conversion error.
    #[error("type error: {0}")]
    Type(#[from] mssql_helper_types::TypeError),

    /// Error raised by a discovery or execution collaborator.
    ///
    /// The helper never produces this variant itself; it only carries what
    /// the collaborator returned.
    #[error("upstream error: {0}")]
    Upstream(#[source] BoxError),

    /// Server returned an error.
    #[error("server error {number}: {message}")]
    Server {
        /// Error number.
        number: i32,
        /// Error class/severity (0-25).
        class: u8,
        /// Error state.
        state: u8,
        /// Error message.
        message: String,
        /// Stored procedure name (if applicable).
        procedure: Option<String>,
        /// Line number in the SQL batch or procedure.
        line: u32,
    },

    /// Command execution timeout occurred.
    #[error("command timed out")]
    Timeout,
}

impl Error {
    /// Create an [`Error::InvalidArgument`].
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create an [`Error::Unsupported`].
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported(message.into())
    }

    /// Box a collaborator's own error type into an [`Error::Upstream`].
    pub fn upstream<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Upstream(Box::new(error))
    }

    /// Check if this error is an argument validation failure.
    #[must_use]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    /// Check if this error is an unsupported-operation failure.
    #[must_use]
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported(_))
    }

    /// Check if this error came from a collaborator.
    #[must_use]
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Upstream(_) | Self::Server { .. } | Self::Timeout)
    }

    /// Check if this error is transient and may succeed on retry.
    ///
    /// The helper itself never retries; this is for callers deciding
    /// whether to.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout => true,
            // Deadlock victim, lock timeout, resource throttling.
            Self::Server { number, .. } => matches!(number, 1205 | 1222 | 40501 | 40613),
            _ => false,
        }
    }

    /// Recover the collaborator's original error, if it is of type `E`.
    #[must_use]
    pub fn downcast_upstream<E>(&self) -> Option<&E>
    where
        E: std::error::Error + 'static,
    {
        match self {
            Self::Upstream(inner) => inner.downcast_ref::<E>(),
            _ => None,
        }
    }
}

/// Result type for helper operations.
pub type Result<T> = std::result::Result<T, Error>;
