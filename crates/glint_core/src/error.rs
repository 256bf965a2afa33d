//! Error types for glint_core

use thiserror::Error;

use crate::property::{PropertyId, PropertyKind};

/// Errors surfaced by the property system, the node graph and the queues.
///
/// Every variant is recoverable. The synchronous ones are returned from the
/// controller-side call that detected them; `ResourceUnavailable` and
/// `UnknownProperty` only ever travel back through a notification.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GlintError {
    /// A value of the wrong kind was offered to a typed property
    #[error("property `{property}` holds {expected:?} values, got {found:?}")]
    TypeMismatch {
        property: &'static str,
        expected: PropertyKind,
        found: PropertyKind,
    },

    /// The operation was already started and cannot be started again
    #[error("already started: {0}")]
    AlreadyStarted(&'static str),

    /// A running animation already writes this property
    #[error("property `{0}` is already being animated")]
    PropertyAnimated(&'static str),

    /// Node or property belongs to a different rendering context
    #[error("invalid target: {0}")]
    InvalidTarget(String),

    /// A GPU resource could not be created or its source vanished
    #[error("resource unavailable: {0}")]
    ResourceUnavailable(String),

    /// A property id that is not part of the node's schema
    #[error("unknown property id {0:?}")]
    UnknownProperty(PropertyId),

    /// Configuration could not be parsed
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result type for glint operations
pub type Result<T> = std::result::Result<T, GlintError>;
