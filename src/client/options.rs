//! Harness client configuration.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use testharness_bridge::ClientOptions;
//!
//! let options = ClientOptions::new()
//!     .with_label("dom/nodes")
//!     .with_response_timeout(Duration::from_secs(60));
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Label used in logs when none is configured.
pub const DEFAULT_LABEL: &str = "testharness";

// ============================================================================
// ClientOptions
// ============================================================================

/// Harness client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Name attached to the client's log records.
    pub label: String,

    /// Upper bound on waiting for a single response.
    ///
    /// `None` waits forever; a stalled driver then blocks the caller.
    pub response_timeout: Option<Duration>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl ClientOptions {
    /// Creates options with the default label and no timeout.
    #[must_use]
    pub fn new() -> Self {
        Self {
            label: DEFAULT_LABEL.to_string(),
            response_timeout: None,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl ClientOptions {
    /// Sets the log label.
    #[inline]
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Bounds how long [`wait`](super::HarnessClient::wait) blocks.
    #[inline]
    #[must_use]
    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = Some(timeout);
        self
    }

    /// Removes the response timeout.
    #[inline]
    #[must_use]
    pub fn without_response_timeout(mut self) -> Self {
        self.response_timeout = None;
        self
    }
}

// ============================================================================
// Validation
// ============================================================================

impl ClientOptions {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an empty label or a zero timeout.
    pub fn validate(&self) -> Result<()> {
        if self.label.trim().is_empty() {
            return Err(Error::config("Client label must not be empty"));
        }

        if self.response_timeout.is_some_and(|t| t.is_zero()) {
            return Err(Error::config("Response timeout must be greater than zero"));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
