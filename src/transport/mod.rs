//! Driver end of the bridge.
//!
//! The real controller talks to the page through a long-poll style
//! "execute async script" call: each call hands the page a callback (the
//! dispatch slot) and blocks until the page invokes it. This module runs
//! that side of the handshake in-process on tokio, for embedding and tests.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐        DispatchSlot(payload)       ┌─────────────────┐
//! │  HarnessClient  │───────────────────────────────────►│   DriverLoop    │
//! │   (Sequencer)   │                                    │ CommandHandler  │
//! │                 │◄───────────────────────────────────│                 │
//! └─────────────────┘   resolve(next slot, result)       └─────────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `driver` | Round loop, handler trait, handle |
//! | `options` | Round timeout configuration |

// ============================================================================
// Submodules
// ============================================================================

/// Driver round loop.
pub mod driver;

/// Driver loop configuration.
pub mod options;

// ============================================================================
// Re-exports
// ============================================================================

pub use driver::{CommandHandler, DriverHandle, DriverLoop, DriverSummary, FnHandler, handler_fn};
pub use options::DriverOptions;
