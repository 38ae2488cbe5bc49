//! Strict-ordering request sequencer.
//!
//! The driver gives control to the page in long-lived rounds. Each round
//! brings exactly one single-use [`DispatchSlot`] plus the result of the
//! previous round. The [`Sequencer`] lets any number of callers `send`
//! while guaranteeing that:
//!
//! - payloads reach the driver in `send` call order,
//! - no slot ever carries two payloads,
//! - every caller gets the result belonging to its own payload.
//!
//! # Handshake
//!
//! ```text
//!  caller            Sequencer                       driver
//!    │                   │   resolve(slot₀, _)          │   bootstrap: pops sentinel
//!    │── send(A) ───────►│◄─────────────────────────────│
//!    │                   │── slot₀(A) ─────────────────►│
//!    │── send(B) ───────►│   (B waits for A's answer)   │
//!    │                   │   resolve(slot₁, a)          │
//!    │◄── A = a ─────────│◄─────────────────────────────│
//!    │                   │── slot₁(B) ─────────────────►│
//!    │                   │   resolve(slot₂, b)          │
//!    │◄── B = b ─────────│◄─────────────────────────────│
//! ```
//!
//! The pending queue starts with one sentinel entry that the driver's first
//! `resolve` consumes. From then on the number of `resolve` calls is the
//! number of `send` calls plus one.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `core` | [`Sequencer`] and its counters |
//! | `pending` | Pending queue and completion chain (internal) |
//! | `response` | Deferred [`Response`] future |
//! | `slot` | Single-use [`DispatchSlot`] |

// ============================================================================
// Submodules
// ============================================================================

/// Sequencer implementation.
pub mod core;

/// Pending queue and completion chain.
mod pending;

/// Deferred response type.
pub mod response;

/// Single-use dispatch capability.
pub mod slot;

// ============================================================================
// Re-exports
// ============================================================================

pub use self::core::{Sequencer, SequencerStats, WeakSequencer};
pub use response::Response;
pub use slot::DispatchSlot;
