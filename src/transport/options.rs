//! Driver loop configuration.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::error::{Error, Result};

// ============================================================================
// DriverOptions
// ============================================================================

/// Driver loop configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverOptions {
    /// Longest the driver waits for the page to use a round's slot.
    ///
    /// `None` lets a round stay open indefinitely.
    pub round_timeout: Option<Duration>,
}

impl DriverOptions {
    /// Creates options with no round timeout.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            round_timeout: None,
        }
    }

    /// Sets the round timeout.
    #[inline]
    #[must_use]
    pub const fn with_round_timeout(mut self, timeout: Duration) -> Self {
        self.round_timeout = Some(timeout);
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for a zero round timeout.
    pub fn validate(&self) -> Result<()> {
        if self.round_timeout.is_some_and(|t| t.is_zero()) {
            return Err(Error::config("Round timeout must be greater than zero"));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
