//! Page-side harness client.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use futures_util::future::try_join_all;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::Result;
use crate::protocol::{ClientCommand, HarnessResult, TestReport, TestResult};
use crate::sequencer::{DispatchSlot, Response, Sequencer};

use super::options::ClientOptions;

// ============================================================================
// HarnessClient
// ============================================================================

/// The test page's end of the bridge.
///
/// Payloads are JSON text, results are JSON values. Cloning yields another
/// handle to the same channel.
///
/// # Example
///
/// ```ignore
/// let client = HarnessClient::new();
/// let hook = client.completion_hook("https://web-platform.test/dom/a.html");
///
/// // Later, when the harness finishes:
/// let ack = client.wait(hook(tests, HarnessResult::ok())?).await?;
/// ```
#[derive(Debug, Clone)]
pub struct HarnessClient {
    sequencer: Sequencer<String, Value>,
    options: Arc<ClientOptions>,
}

impl Default for HarnessClient {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// HarnessClient - Constructors
// ============================================================================

impl HarnessClient {
    /// Creates a client with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::from_parts(Sequencer::new(), ClientOptions::default())
    }

    /// Creates a client with custom options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if the options are invalid.
    pub fn with_options(options: ClientOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self::from_parts(Sequencer::new(), options))
    }

    fn from_parts(sequencer: Sequencer<String, Value>, options: ClientOptions) -> Self {
        debug!(label = %options.label, channel = %sequencer.id(), "Harness client created");
        Self {
            sequencer,
            options: Arc::new(options),
        }
    }

    /// Returns the client options.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Returns the underlying sequencer.
    #[inline]
    #[must_use]
    pub fn sequencer(&self) -> &Sequencer<String, Value> {
        &self.sequencer
    }
}

// ============================================================================
// HarnessClient - Page Side
// ============================================================================

impl HarnessClient {
    /// Sends pre-serialized JSON text.
    pub fn send_raw(&self, json: impl Into<String>) -> Response<Value> {
        self.sequencer.send(json.into())
    }

    /// Serializes and sends a command.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if serialization fails;
    /// nothing is queued in that case.
    pub fn send_command(&self, command: &ClientCommand) -> Result<Response<Value>> {
        let json = command.to_json()?;
        debug!(label = %self.options.label, id = command.id(), "Sending command");
        Ok(self.sequencer.send(json))
    }

    /// Sends several commands and waits for all of their results.
    ///
    /// Every command is serialized before any is queued. Results come back
    /// in command order.
    ///
    /// # Errors
    ///
    /// Returns the first serialization or response error.
    pub async fn send_commands(&self, commands: &[ClientCommand]) -> Result<Vec<Value>> {
        let payloads = commands
            .iter()
            .map(ClientCommand::to_json)
            .collect::<Result<Vec<_>>>()?;

        let responses = self.sequencer.send_all(payloads);
        try_join_all(responses.into_iter().map(|response| self.wait(response))).await
    }

    /// Returns control to the driver so it can deliver notifications.
    pub fn cede(&self) -> Response<Value> {
        debug!(label = %self.options.label, "Ceding to driver");
        self.sequencer.cede()
    }

    /// Sends the finished test report.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if the report cannot be
    /// serialized.
    pub fn report_results(&self, report: TestReport) -> Result<Response<Value>> {
        info!(
            label = %self.options.label,
            test = %report.test,
            subtests = report.tests.len(),
            passed = report.passed(),
            "Reporting test results"
        );
        self.send_command(&ClientCommand::ReportResults(report))
    }

    /// Builds the callback the harness invokes when all tests are done.
    ///
    /// The callback turns the harness's results into a [`TestReport`] for
    /// `page_url` and sends it.
    pub fn completion_hook(
        &self,
        page_url: impl Into<String>,
    ) -> impl Fn(Vec<TestResult>, HarnessResult) -> Result<Response<Value>> + Send + Sync + 'static
    {
        let client = self.clone();
        let page_url = page_url.into();

        move |tests, harness| {
            let report = TestReport::new(&page_url, tests, harness)?;
            client.report_results(report)
        }
    }

    /// Awaits a response, honoring the configured timeout.
    ///
    /// # Errors
    ///
    /// - [`Error::Timeout`](crate::Error::Timeout) if the timeout elapsed
    /// - any error the channel was aborted with
    pub async fn wait(&self, response: Response<Value>) -> Result<Value> {
        match self.options.response_timeout {
            Some(limit) => response.with_timeout(limit).await,
            None => response.await,
        }
    }
}

// ============================================================================
// HarnessClient - Driver Side
// ============================================================================

impl HarnessClient {
    /// Completes a driver round. See [`Sequencer::resolve`].
    ///
    /// # Errors
    ///
    /// Same as [`Sequencer::resolve`].
    pub fn resolve(&self, next_slot: DispatchSlot<String>, previous_result: Value) -> Result<()> {
        self.sequencer.resolve(next_slot, previous_result)
    }

    /// Performs the driver's first handshake. See [`Sequencer::bootstrap`].
    ///
    /// # Errors
    ///
    /// Same as [`Sequencer::resolve`].
    pub fn bootstrap(&self, first_slot: DispatchSlot<String>) -> Result<()> {
        self.sequencer.bootstrap(first_slot)
    }

    /// Tears the channel down, rejecting everything still pending.
    pub fn close(&self) {
        debug!(label = %self.options.label, "Closing harness client");
        self.sequencer.close();
    }
}

// ============================================================================
// Tests
// ============================================================================
