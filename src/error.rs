//! Error types for the test harness bridge.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use testharness_bridge::{HarnessClient, Result};
//!
//! async fn example(client: &HarnessClient) -> Result<()> {
//!     let ack = client.cede().await?;
//!     println!("driver answered: {ack}");
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`] |
//! | Channel | [`Error::ProtocolViolation`], [`Error::ChannelClosed`], [`Error::Dispatch`], [`Error::Driver`] |
//! | Protocol | [`Error::UnknownCommand`], [`Error::InvalidStatus`], [`Error::InvalidUrl`] |
//! | Execution | [`Error::Timeout`], [`Error::ResponseDropped`] |
//! | External | [`Error::Json`] |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio::sync::oneshot::error::RecvError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Violation
// ============================================================================

/// A breach of the send/resolve handshake.
///
/// Any violation aborts the channel it occurred on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Violation {
    /// `resolve` arrived while no request (or bootstrap sentinel) was pending.
    EmptyQueue,
    /// `resolve` supplied a new slot before the previous one was consumed.
    DoubleSupply,
    /// A queued payload reached its turn but no slot was installed.
    MissingSlot,
}

impl Violation {
    /// Short machine-friendly name, used as a log field.
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::EmptyQueue => "empty_queue",
            Self::DoubleSupply => "double_supply",
            Self::MissingSlot => "missing_slot",
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::EmptyQueue => "resolve called with no pending request",
            Self::DoubleSupply => "dispatch slot supplied before the previous one was consumed",
            Self::MissingSlot => "dispatch attempted without an available slot",
        };
        f.write_str(text)
    }
}

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when client or driver options are invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Channel Errors
    // ========================================================================
    /// The driver and client disagreed about the handshake.
    ///
    /// The channel is aborted; every pending response receives this error.
    #[error("Protocol violation: {violation}")]
    ProtocolViolation {
        /// Which rule was broken.
        violation: Violation,
    },

    /// Channel was torn down before the response arrived.
    #[error("Channel closed")]
    ChannelClosed,

    /// Invoking the dispatch slot failed.
    ///
    /// Returned when the driver side of a slot has gone away.
    #[error("Dispatch failed: {message}")]
    Dispatch {
        /// Description of the dispatch failure.
        message: String,
    },

    /// The driver loop task stopped abnormally.
    #[error("Driver loop failed: {message}")]
    Driver {
        /// Description of the failure.
        message: String,
    },

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Unknown client command id.
    #[error("Unknown command id: {id}")]
    UnknownCommand {
        /// The unrecognized command id.
        id: u64,
    },

    /// Status code outside the known range.
    #[error("Invalid {kind} status code: {code}")]
    InvalidStatus {
        /// Which status family was being decoded.
        kind: &'static str,
        /// The offending code.
        code: u8,
    },

    /// Page URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ========================================================================
    // Execution Errors
    // ========================================================================
    /// Operation timeout.
    ///
    /// Returned when operation exceeds timeout duration.
    #[error("Timeout after {timeout_ms}ms: {operation}")]
    Timeout {
        /// Description of the operation that timed out.
        operation: String,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// The responder was dropped without an answer.
    #[error("Response dropped")]
    ResponseDropped(#[from] RecvError),

    // ========================================================================
    // External Errors
    // ========================================================================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a protocol violation error.
    #[inline]
    pub fn violation(violation: Violation) -> Self {
        Self::ProtocolViolation { violation }
    }

    /// Creates a dispatch error.
    #[inline]
    pub fn dispatch(message: impl Into<String>) -> Self {
        Self::Dispatch {
            message: message.into(),
        }
    }

    /// Creates a driver loop error.
    #[inline]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Creates an unknown command error.
    #[inline]
    pub fn unknown_command(id: u64) -> Self {
        Self::UnknownCommand { id }
    }

    /// Creates an invalid status error.
    #[inline]
    pub fn invalid_status(kind: &'static str, code: u8) -> Self {
        Self::InvalidStatus { kind, code }
    }

    /// Creates a timeout error.
    #[inline]
    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns the violation if this is a protocol violation.
    #[inline]
    #[must_use]
    pub fn as_violation(&self) -> Option<Violation> {
        match self {
            Self::ProtocolViolation { violation } => Some(*violation),
            _ => None,
        }
    }

    /// Returns `true` if this is a protocol violation.
    #[inline]
    #[must_use]
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, Self::ProtocolViolation { .. })
    }

    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns `true` if the channel this error came from is unusable.
    #[inline]
    #[must_use]
    pub fn is_channel_error(&self) -> bool {
        matches!(
            self,
            Self::ProtocolViolation { .. }
                | Self::ChannelClosed
                | Self::Dispatch { .. }
                | Self::Driver { .. }
                | Self::ResponseDropped(_)
        )
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// A timed out response may still be answered later; everything else
    /// leaves the channel aborted or the input invalid.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================
