//! Page-to-driver message types.
//!
//! The sequencer treats payloads as opaque; this module defines the
//! concrete messages a test page sends through it.
//!
//! # Protocol Overview
//!
//! | Message | Direction | Purpose |
//! |---------|-----------|---------|
//! | [`ClientCommand::ReportResults`] | Page → Driver | Deliver the finished [`TestReport`] |
//! | [`ClientCommand::Cede`] | Page → Driver | Hand control back without data |
//! | result value | Driver → Page | Outcome of the previous command |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `command` | Command definitions and the [`Payload`] trait |
//! | `report` | Test report types |

// ============================================================================
// Submodules
// ============================================================================

/// Client command definitions.
pub mod command;

/// Test report types.
pub mod report;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::{CEDE_ID, CEDE_JSON, ClientCommand, Payload, REPORT_RESULTS_ID};
pub use report::{HarnessResult, HarnessStatus, TestReport, TestResult, TestStatus};
