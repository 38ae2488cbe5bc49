//! Test Harness Bridge - strict-ordering page/driver messaging.
//!
//! This library connects a test page's harness script (the client) with
//! the WebDriver controller that runs it (the driver). The driver can only
//! reach the page through one-shot callbacks handed out one round at a
//! time; this crate turns that into an ordinary request/response API.
//!
//! # Architecture
//!
//! - **Client (page)**: calls `send` from anywhere, awaits a [`Response`]
//! - **Driver (controller)**: calls `resolve(next_slot, previous_result)`
//!   once per round
//!
//! Key guarantees:
//!
//! - Payloads are dispatched in `send` call order
//! - A [`DispatchSlot`] carries exactly one payload
//! - Each caller receives the result of its own payload
//! - Handshake misuse aborts the channel instead of hanging or dropping
//!
//! # Quick Start
//!
//! ```no_run
//! use testharness_bridge::{
//!     DriverLoop, DriverOptions, HarnessClient, HarnessResult, Result, TestResult, handler_fn,
//! };
//! use serde_json::{Value, json};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = HarnessClient::new();
//!
//!     // Controller side: acknowledge every command.
//!     let handler = handler_fn(|_payload: String| async { json!({ "ok": true }) });
//!     let driver = DriverLoop::spawn(client.sequencer().clone(), handler, DriverOptions::new())?;
//!
//!     // Page side: report results through the harness completion hook.
//!     let hook = client.completion_hook("https://web-platform.test/dom/a.html");
//!     let response = hook(vec![TestResult::pass("works")], HarnessResult::ok())?;
//!     let ack: Value = client.wait(response).await?;
//!     println!("driver acknowledged: {ack}");
//!
//!     driver.shutdown().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Page-side [`HarnessClient`] |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | Commands and test report types |
//! | [`sequencer`] | Ordering core: [`Sequencer`], [`DispatchSlot`], [`Response`] |
//! | [`transport`] | In-process driver loop |

// ============================================================================
// Modules
// ============================================================================

/// Page-side harness client.
///
/// - [`HarnessClient`] - sends commands and reports results
/// - [`ClientOptions`] - label and response timeout
pub mod client;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers for channels and requests.
pub mod identifiers;

/// Page-to-driver message types.
pub mod protocol;

/// Ordering core.
///
/// [`Sequencer`] queues requests and hands them to the driver one slot at
/// a time.
pub mod sequencer;

/// Driver end of the handshake.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Client types
pub use client::{ClientOptions, HarnessClient};

// Error types
pub use error::{Error, Result, Violation};

// Identifier types
pub use identifiers::{ChannelId, RequestSeq};

// Protocol types
pub use protocol::{
    ClientCommand, HarnessResult, HarnessStatus, Payload, TestReport, TestResult, TestStatus,
};

// Sequencer types
pub use sequencer::{DispatchSlot, Response, Sequencer, SequencerStats, WeakSequencer};

// Transport types
pub use transport::{
    CommandHandler, DriverHandle, DriverLoop, DriverOptions, DriverSummary, handler_fn,
};
