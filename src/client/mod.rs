//! Page-side client.
//!
//! [`HarnessClient`] is what test page code talks to: it serializes
//! [`ClientCommand`](crate::protocol::ClientCommand)s, pushes them through
//! a [`Sequencer`](crate::sequencer::Sequencer) and exposes the driver-side
//! `resolve` entry point the controller calls back into.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`HarnessClient`] | Sends commands, cedes, reports results |
//! | [`ClientOptions`] | Label and response timeout |

// ============================================================================
// Submodules
// ============================================================================

/// Harness client implementation.
pub mod harness;

/// Client configuration.
pub mod options;

// ============================================================================
// Re-exports
// ============================================================================

pub use harness::HarnessClient;
pub use options::{ClientOptions, DEFAULT_LABEL};
