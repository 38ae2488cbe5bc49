//! Test result report types.
//!
//! The page's completion hook sends one report per test document.
//!
//! # Format
//!
//! ```json
//! {
//!   "test": "https://web-platform.test/dom/nodes/Node-contains.html",
//!   "tests": [
//!     { "name": "contains(null)", "status": 0, "message": null, "stack": null }
//!   ],
//!   "status": 0,
//!   "message": null,
//!   "stack": null
//! }
//! ```

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// TestStatus
// ============================================================================

/// Outcome of a single subtest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum TestStatus {
    /// Passed.
    Pass,
    /// Failed an assertion.
    Fail,
    /// Did not finish in time.
    Timeout,
    /// Never started.
    NotRun,
    /// A precondition did not hold.
    PreconditionFailed,
}

impl From<TestStatus> for u8 {
    fn from(status: TestStatus) -> Self {
        match status {
            TestStatus::Pass => 0,
            TestStatus::Fail => 1,
            TestStatus::Timeout => 2,
            TestStatus::NotRun => 3,
            TestStatus::PreconditionFailed => 4,
        }
    }
}

impl TryFrom<u8> for TestStatus {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self> {
        match code {
            0 => Ok(Self::Pass),
            1 => Ok(Self::Fail),
            2 => Ok(Self::Timeout),
            3 => Ok(Self::NotRun),
            4 => Ok(Self::PreconditionFailed),
            other => Err(Error::invalid_status("test", other)),
        }
    }
}

// ============================================================================
// HarnessStatus
// ============================================================================

/// Overall status of the harness run for one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum HarnessStatus {
    /// Harness completed normally.
    Ok,
    /// Uncaught error outside a test.
    Error,
    /// Harness-level timeout.
    Timeout,
    /// A document-level precondition did not hold.
    PreconditionFailed,
}

impl From<HarnessStatus> for u8 {
    fn from(status: HarnessStatus) -> Self {
        match status {
            HarnessStatus::Ok => 0,
            HarnessStatus::Error => 1,
            HarnessStatus::Timeout => 2,
            HarnessStatus::PreconditionFailed => 3,
        }
    }
}

impl TryFrom<u8> for HarnessStatus {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self> {
        match code {
            0 => Ok(Self::Ok),
            1 => Ok(Self::Error),
            2 => Ok(Self::Timeout),
            3 => Ok(Self::PreconditionFailed),
            other => Err(Error::invalid_status("harness", other)),
        }
    }
}

// ============================================================================
// TestResult
// ============================================================================

/// Result of one subtest as seen by the harness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    /// Subtest name.
    pub name: String,
    /// Subtest outcome.
    pub status: TestStatus,
    /// Failure message, if any.
    pub message: Option<String>,
    /// Stack captured at the failure, if any.
    pub stack: Option<String>,
}

impl TestResult {
    /// Creates a passing result.
    #[must_use]
    pub fn pass(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: TestStatus::Pass,
            message: None,
            stack: None,
        }
    }

    /// Creates a failing result with a message.
    #[must_use]
    pub fn fail(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: TestStatus::Fail,
            message: Some(message.into()),
            stack: None,
        }
    }

    /// Attaches a stack trace.
    #[inline]
    #[must_use]
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }
}

// ============================================================================
// HarnessResult
// ============================================================================

/// Harness-level status passed to the completion hook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarnessResult {
    /// Overall status.
    pub status: HarnessStatus,
    /// Harness error message, if any.
    pub message: Option<String>,
    /// Harness error stack, if any.
    pub stack: Option<String>,
}

impl HarnessResult {
    /// A harness run that completed normally.
    #[must_use]
    pub const fn ok() -> Self {
        Self {
            status: HarnessStatus::Ok,
            message: None,
            stack: None,
        }
    }

    /// A harness run that hit an error outside any test.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: HarnessStatus::Error,
            message: Some(message.into()),
            stack: None,
        }
    }
}

impl Default for HarnessResult {
    fn default() -> Self {
        Self::ok()
    }
}

// ============================================================================
// TestReport
// ============================================================================

/// Complete results of one test document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestReport {
    /// Location of the test document.
    pub test: Url,
    /// Per-subtest results in harness order.
    pub tests: Vec<TestResult>,
    /// Overall harness status.
    pub status: HarnessStatus,
    /// Harness error message, if any.
    pub message: Option<String>,
    /// Harness error stack, if any.
    pub stack: Option<String>,
}

impl TestReport {
    /// Builds a report for the page at `page_url`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if `page_url` is not an absolute URL.
    pub fn new(page_url: &str, tests: Vec<TestResult>, harness: HarnessResult) -> Result<Self> {
        let test = Url::parse(page_url)?;

        Ok(Self {
            test,
            tests,
            status: harness.status,
            message: harness.message,
            stack: harness.stack,
        })
    }

    /// Number of subtests that passed.
    #[must_use]
    pub fn passed(&self) -> usize {
        self.tests
            .iter()
            .filter(|t| t.status == TestStatus::Pass)
            .count()
    }

    /// Returns `true` if the harness finished cleanly and every subtest passed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.status == HarnessStatus::Ok && self.passed() == self.tests.len()
    }
}

// ============================================================================
// Tests
// ============================================================================
