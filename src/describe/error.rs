//! Errors raised by the description engine itself.
//!
//! Upstream failures (page fetches, lookups, sink callbacks) are forwarded
//! unchanged as `anyhow::Error`; only conditions the engine detects on its own
//! are represented here. Callers recover the variant with
//! `err.downcast_ref::<DescribeError>()`.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DescribeError {
    /// The describe call observed its cancellation token.
    #[error("describe cancelled")]
    Cancelled,

    /// An adapter produced a record with no id, arn or name.
    #[error("{kind} record has no id, arn or name")]
    MissingIdentity { kind: String },

    /// A push consumer went away while records were still being produced.
    #[error("resource sink closed")]
    SinkClosed,

    /// No resource kind is registered under this key.
    #[error("unknown resource kind: {0}")]
    UnknownKind(String),
}

impl DescribeError {
    /// True when `err` is (or wraps) a cancellation.
    pub fn is_cancelled(err: &anyhow::Error) -> bool {
        matches!(err.downcast_ref::<DescribeError>(), Some(DescribeError::Cancelled))
    }
}
