//! Error types for budgeteer.
//!
//! Internally we use `anyhow` (aliased as `Res<T>`) and attach context as errors bubble up. At the
//! public boundary every error carries an `ErrorType` so that callers can decide what to do about
//! it: render an empty table, or stop and tell the user how to fix their setup.

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};

/// The result type used inside the crate.
pub(crate) type Res<T> = std::result::Result<T, anyhow::Error>;

/// The result type returned from public functions.
pub type Result<T> = std::result::Result<T, Error>;

/// The kind of failure. Each kind has a fallback policy and a suggested remedy for the user.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// The data source could not be reached (network, missing directory, rate limits).
    SourceUnreachable,
    /// The credentials were rejected, malformed, or do not permit the operation.
    Authentication,
    /// The data source was reached but the named table does not exist.
    TableNotFound,
    /// The table exists but its contents could not be understood.
    MalformedData,
    /// The configuration directory or file is missing or invalid.
    Config,
    /// The request itself was invalid, e.g. deleting a goal that does not exist.
    Request,
    /// The MCP service failed.
    Service,
    /// Anything else.
    Internal,
}

serde_plain::derive_display_from_serialize!(ErrorType);
serde_plain::derive_fromstr_from_deserialize!(ErrorType);

/// What a read should do when it fails with a given `ErrorType`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fallback {
    /// Substitute an empty table with the expected headers and keep going.
    EmptyTable,
    /// Stop the current operation and report the error.
    Abort,
}

impl ErrorType {
    /// The fallback policy for reads that fail with this error type. Writes never fall back.
    pub fn fallback(&self) -> Fallback {
        match self {
            ErrorType::SourceUnreachable | ErrorType::TableNotFound => Fallback::EmptyTable,
            _ => Fallback::Abort,
        }
    }

    /// A suggestion for the user about how to fix the problem.
    pub fn remedy(&self) -> &'static str {
        match self {
            ErrorType::SourceUnreachable => {
                "Check your network connection and that the spreadsheet URL or data files exist."
            }
            ErrorType::Authentication => {
                "Check the service account credentials and that the sheet is shared with the \
                service account's client_email (or with 'Anyone with the link' for public sheets)."
            }
            ErrorType::TableNotFound => {
                "Check that the tabs (or files) are named 'Transactions' and 'Goals'."
            }
            ErrorType::MalformedData => {
                "Check the header row and that no row has more cells than the header row."
            }
            ErrorType::Config => "Check config.json in your budget home, or run 'budget init'.",
            ErrorType::Request => "Check the arguments you passed.",
            ErrorType::Service => "Restart the MCP server.",
            ErrorType::Internal => "This is probably a bug.",
        }
    }
}

/// The public error type. It wraps an `anyhow::Error` with an `ErrorType`.
pub struct Error {
    error_type: ErrorType,
    inner: anyhow::Error,
}

impl Error {
    pub(crate) fn new(error_type: ErrorType, inner: impl Into<anyhow::Error>) -> Self {
        Self {
            error_type,
            inner: inner.into(),
        }
    }

    pub(crate) fn msg(error_type: ErrorType, message: impl Display + Send + Sync + 'static) -> Self {
        Self::new(error_type, anyhow::anyhow!("{message}"))
    }

    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }

    pub fn fallback(&self) -> Fallback {
        self.error_type.fallback()
    }

    pub fn remedy(&self) -> &'static str {
        self.error_type.remedy()
    }

    /// Adds context to the error while keeping its `ErrorType`.
    pub(crate) fn context<C>(self, context: C) -> Self
    where
        C: Display + Send + Sync + 'static,
    {
        Self {
            error_type: self.error_type,
            inner: self.inner.context(context),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if f.alternate() {
            write!(f, "{:#}", self.inner)
        } else {
            Display::fmt(&self.inner, f)
        }
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} error: {:?}", self.error_type, self.inner)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner.source()
    }
}

impl From<anyhow::Error> for Error {
    /// Recovers the `ErrorType` if the `anyhow::Error` wraps one of our errors, otherwise the
    /// error is `Internal`.
    fn from(e: anyhow::Error) -> Self {
        match e.downcast::<Error>() {
            Ok(typed) => typed,
            Err(e) => Error::new(ErrorType::Internal, e),
        }
    }
}

/// Converts any result that can become an `anyhow::Error` into a public `Result` with an
/// `ErrorType`.
pub(crate) trait IntoResult<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T, E> IntoResult<T> for std::result::Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| Error::new(error_type, e))
    }
}
