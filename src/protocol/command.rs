//! Client commands sent from the page to the driver.
//!
//! Commands are JSON objects discriminated by a numeric `id`:
//!
//! | Id | Command | Body |
//! |----|---------|------|
//! | `1` | [`ClientCommand::ReportResults`] | `results`: [`TestReport`] |
//! | `3` | [`ClientCommand::Cede`] | none |

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::{Error, Result};

use super::report::TestReport;

// ============================================================================
// Constants
// ============================================================================

/// Command id for reporting test results.
pub const REPORT_RESULTS_ID: u64 = 1;

/// Command id for the reserved no-op cede command.
pub const CEDE_ID: u64 = 3;

/// Wire text of the cede command.
pub const CEDE_JSON: &str = r#"{"id":3}"#;

// ============================================================================
// Payload
// ============================================================================

/// A value that can travel through a sequencer.
///
/// The sequencer never looks inside payloads; it only needs a way to build
/// the reserved flow-control payload used by `cede`.
pub trait Payload: Send + 'static {
    /// Returns the reserved no-op payload.
    fn cede() -> Self;

    /// Returns `true` if this payload is the reserved no-op.
    fn is_cede(&self) -> bool;
}

impl Payload for String {
    fn cede() -> Self {
        CEDE_JSON.to_string()
    }

    fn is_cede(&self) -> bool {
        serde_json::from_str::<Value>(self).is_ok_and(|value| value.is_cede())
    }
}

impl Payload for Value {
    fn cede() -> Self {
        json!({ "id": CEDE_ID })
    }

    fn is_cede(&self) -> bool {
        self.get("id").and_then(Value::as_u64) == Some(CEDE_ID)
    }
}

impl Payload for ClientCommand {
    fn cede() -> Self {
        Self::Cede
    }

    fn is_cede(&self) -> bool {
        matches!(self, Self::Cede)
    }
}

// ============================================================================
// ClientCommand
// ============================================================================

/// A command issued by page script for the driver to execute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "WireCommand", try_from = "WireCommand")]
pub enum ClientCommand {
    /// Report the results of the test document.
    ReportResults(TestReport),
    /// Return control to the driver without reporting anything.
    Cede,
}

impl ClientCommand {
    /// Returns the numeric command id.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> u64 {
        match self {
            Self::ReportResults(_) => REPORT_RESULTS_ID,
            Self::Cede => CEDE_ID,
        }
    }

    /// Serializes the command to its JSON wire text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses a command from its JSON wire text.
    ///
    /// # Errors
    ///
    /// - [`Error::Json`] if the text is not a valid command object
    /// - [`Error::UnknownCommand`] if the id is not recognized
    pub fn from_json(text: &str) -> Result<Self> {
        let wire: WireCommand = serde_json::from_str(text)?;
        Self::try_from(wire)
    }
}

// ============================================================================
// WireCommand
// ============================================================================

/// Flat wire representation shared by all commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireCommand {
    id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    results: Option<TestReport>,
}

impl From<ClientCommand> for WireCommand {
    fn from(command: ClientCommand) -> Self {
        let id = command.id();
        let results = match command {
            ClientCommand::ReportResults(report) => Some(report),
            ClientCommand::Cede => None,
        };
        Self { id, results }
    }
}

impl TryFrom<WireCommand> for ClientCommand {
    type Error = Error;

    fn try_from(wire: WireCommand) -> Result<Self> {
        match (wire.id, wire.results) {
            (REPORT_RESULTS_ID, Some(report)) => Ok(Self::ReportResults(report)),
            (REPORT_RESULTS_ID, None) => Err(Error::Json(serde::de::Error::missing_field(
                "results",
            ))),
            (CEDE_ID, _) => Ok(Self::Cede),
            (other, _) => Err(Error::unknown_command(other)),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
