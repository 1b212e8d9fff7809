//! Error types for check evaluation and data providers.

use std::fmt;
use std::time::Duration;

use crate::model::AssertionKind;

/// A provider call, rendered into fetch error messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    Trending { region: String, locale: String },
    Title { title_id: String },
}

impl ProviderCall {
    pub fn trending(region: &str, locale: &str) -> Self {
        Self::Trending {
            region: region.to_string(),
            locale: locale.to_string(),
        }
    }

    pub fn title(title_id: &str) -> Self {
        Self::Title {
            title_id: title_id.to_string(),
        }
    }
}

impl fmt::Display for ProviderCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderCall::Trending { region, locale } => {
                write!(f, "fetch_trending({}, {})", region, locale)
            }
            ProviderCall::Title { title_id } => write!(f, "fetch_title({})", title_id),
        }
    }
}

/// Data provider errors. Every variant is a fetch failure.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The call did not complete in time.
    #[error("{call} timed out after {after:?}")]
    Timeout { call: ProviderCall, after: Duration },

    /// Non-success HTTP status.
    #[error("{call} returned HTTP {status}: {body}")]
    Status {
        call: ProviderCall,
        status: u16,
        body: String,
    },

    /// Connection or transport failure.
    #[error("{call} failed: {message}")]
    Network { call: ProviderCall, message: String },

    /// Success status but the body is not what the port promises.
    #[error("{call} returned an invalid response: {message}")]
    InvalidResponse { call: ProviderCall, message: String },
}

impl ProviderError {
    pub fn call(&self) -> &ProviderCall {
        match self {
            Self::Timeout { call, .. }
            | Self::Status { call, .. }
            | Self::Network { call, .. }
            | Self::InvalidResponse { call, .. } => call,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Error classes surfaced in `ERROR` results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad check definition. Deterministic; never retried.
    Configuration,
    /// Network failure, timeout, or non-success provider response.
    Fetch,
    /// Malformed data where a well-formed value was expected.
    Parse,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Configuration => "configuration error",
            ErrorKind::Fetch => "fetch error",
            ErrorKind::Parse => "parse error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Faults raised while evaluating one check.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("unknown assertion type \"{kind}\"")]
    UnknownAssertion { kind: String },

    #[error("assertion block has no type")]
    MissingAssertionType,

    #[error("{assertion} requires {field}")]
    MissingField {
        assertion: AssertionKind,
        field: String,
    },

    #[error("{assertion}: invalid {field}: {reason}")]
    InvalidField {
        assertion: AssertionKind,
        field: String,
        reason: String,
    },

    #[error("invalid check definition: {reason}")]
    InvalidDefinition { reason: String },

    #[error(transparent)]
    Fetch(#[from] ProviderError),

    #[error("malformed timestamp in {field}: {value:?} ({reason})")]
    Timestamp {
        field: String,
        value: String,
        reason: String,
    },
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownAssertion { .. }
            | Self::MissingAssertionType
            | Self::MissingField { .. }
            | Self::InvalidField { .. }
            | Self::InvalidDefinition { .. } => ErrorKind::Configuration,
            Self::Fetch(_) => ErrorKind::Fetch,
            Self::Timestamp { .. } => ErrorKind::Parse,
        }
    }

    /// Message stored in an `ERROR` result: class prefix plus detail.
    pub fn result_message(&self) -> String {
        format!("{}: {}", self.kind(), self)
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
