//! Type-safe identifiers.
//!
//! Newtype wrappers keep channel ids and request ordinals from being mixed
//! up with plain integers or strings.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ChannelId`] | One sequencer instance (random uuid) |
//! | [`RequestSeq`] | Position of a request in send order |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// ChannelId
// ============================================================================

/// Identifier of a single client/driver channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(Uuid);

impl ChannelId {
    /// Generates a new random channel ID.
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying uuid.
    #[inline]
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// RequestSeq
// ============================================================================

/// Ordinal of a request within its channel.
///
/// `0` is reserved for the bootstrap sentinel; real requests start at `1`
/// and are numbered in `send` call order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestSeq(u64);

impl RequestSeq {
    /// The bootstrap sentinel ordinal.
    pub const BOOTSTRAP: Self = Self(0);

    /// Creates a sequence number from a raw ordinal.
    #[inline]
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the ordinal that follows this one.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw ordinal.
    #[inline]
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Returns `true` for the bootstrap sentinel.
    #[inline]
    #[must_use]
    pub const fn is_bootstrap(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for RequestSeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================
