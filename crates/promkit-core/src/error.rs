//! Shared error type across promkit crates.

use thiserror::Error;

/// Stable error classes (used in logs and HTTP error bodies).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Invalid names, duplicate registrations, malformed buckets/quantiles.
    Configuration,
    /// Caller misuse of a metric operation (rejected, state unchanged).
    Usage,
    /// Snapshot could not be collected or encoded.
    Serialization,
    /// Listener bind/serve failure.
    Network,
    /// Broken internal invariant.
    Internal,
}

impl ErrorClass {
    /// String representation used in responses and structured logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorClass::Configuration => "CONFIGURATION",
            ErrorClass::Usage => "USAGE",
            ErrorClass::Serialization => "SERIALIZATION",
            ErrorClass::Network => "NETWORK",
            ErrorClass::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, MetricsError>;

/// Unified error type used by core and exposer.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("invalid metric name: {0:?}")]
    InvalidName(String),
    #[error("invalid label name: {0:?}")]
    InvalidLabelName(String),
    #[error("duplicate label name: {0:?}")]
    DuplicateLabel(String),
    #[error("label name {label:?} is reserved for {kind} series")]
    ReservedLabel { label: String, kind: &'static str },
    #[error("family {name:?} already registered as {existing}, cannot register as {requested}")]
    DuplicateName {
        name: String,
        existing: &'static str,
        requested: &'static str,
    },
    #[error("family {0:?} already registered with different options")]
    ConflictingFamily(String),
    #[error("invalid buckets: {0}")]
    InvalidBuckets(String),
    #[error("invalid quantile: {0}")]
    InvalidQuantile(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("counter increment must be non-negative, got {0}")]
    NegativeDelta(f64),
    #[error("expected {expected} bucket increments, got {got}")]
    BucketCountMismatch { expected: usize, got: usize },

    #[error("serialization: {0}")]
    Serialization(String),
    #[error("collection failed: {0}")]
    Collection(String),

    #[error("network: {0}")]
    Network(String),

    #[error("internal: {0}")]
    Internal(String),
}

impl MetricsError {
    /// Map an error to its stable class.
    pub fn class(&self) -> ErrorClass {
        match self {
            MetricsError::InvalidName(_)
            | MetricsError::InvalidLabelName(_)
            | MetricsError::DuplicateLabel(_)
            | MetricsError::ReservedLabel { .. }
            | MetricsError::DuplicateName { .. }
            | MetricsError::ConflictingFamily(_)
            | MetricsError::InvalidBuckets(_)
            | MetricsError::InvalidQuantile(_)
            | MetricsError::InvalidConfig(_) => ErrorClass::Configuration,
            MetricsError::NegativeDelta(_) | MetricsError::BucketCountMismatch { .. } => {
                ErrorClass::Usage
            }
            MetricsError::Serialization(_) | MetricsError::Collection(_) => {
                ErrorClass::Serialization
            }
            MetricsError::Network(_) => ErrorClass::Network,
            MetricsError::Internal(_) => ErrorClass::Internal,
        }
    }
}
