//! In-process driver loop.
//!
//! Plays the controller's side of the handshake on a tokio task: every
//! round hands the sequencer a fresh slot, waits for the page to use it,
//! runs the payload through a [`CommandHandler`] and answers with the
//! handler's result in the next round.
//!
//! # Round Lifecycle
//!
//! 1. `spawn` - bootstrap the sequencer with the first slot
//! 2. Wait for the slot's payload (optionally bounded by `round_timeout`)
//! 3. `CommandHandler::handle` - compute the result
//! 4. `CommandHandler::on_cede` - if the payload was a cede
//! 5. `resolve` - new slot plus result, back to step 2
//!
//! The loop ends when the sequencer is closed or aborted. Between rounds it
//! holds only a [`WeakSequencer`], so dropping every other handle tears the
//! channel down and stops the loop.

// ============================================================================
// Imports
// ============================================================================

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::ChannelId;
use crate::protocol::Payload;
use crate::sequencer::{DispatchSlot, Sequencer, WeakSequencer};

use super::options::DriverOptions;

// ============================================================================
// CommandHandler
// ============================================================================

/// Driver-side logic executed for each dispatched payload.
#[async_trait]
pub trait CommandHandler<P, R>: Send + Sync + 'static
where
    P: Send + 'static,
{
    /// Executes one payload and produces the result for its caller.
    async fn handle(&self, payload: P) -> R;

    /// Runs after a cede, before the next round opens.
    ///
    /// This is where queued out-of-band notifications are delivered.
    async fn on_cede(&self) {}
}

// ============================================================================
// FnHandler
// ============================================================================

/// [`CommandHandler`] backed by an async closure.
#[derive(Debug, Clone)]
pub struct FnHandler<F>(F);

/// Wraps an async closure as a [`CommandHandler`].
///
/// # Example
///
/// ```ignore
/// let handler = handler_fn(|payload: String| async move { format!("{payload}-ack") });
/// ```
#[must_use]
pub fn handler_fn<F>(handler: F) -> FnHandler<F> {
    FnHandler(handler)
}

#[async_trait]
impl<P, R, F, Fut> CommandHandler<P, R> for FnHandler<F>
where
    P: Send + 'static,
    R: Send + 'static,
    F: Fn(P) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
{
    async fn handle(&self, payload: P) -> R {
        (self.0)(payload).await
    }
}

// ============================================================================
// DriverSummary
// ============================================================================

/// What a finished driver loop did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverSummary {
    /// Payloads received and answered.
    pub rounds: u64,
    /// How many of those were cedes.
    pub cedes: u64,
}

// ============================================================================
// RoundOutcome
// ============================================================================

/// How waiting on one round ended.
enum RoundOutcome<P> {
    Payload(P),
    Closed,
    TimedOut(Duration),
}

// ============================================================================
// DriverLoop
// ============================================================================

/// Spawns driver loops.
#[derive(Debug, Clone, Copy)]
pub struct DriverLoop;

impl DriverLoop {
    /// Bootstraps `sequencer` and starts answering its rounds.
    ///
    /// The bootstrap happens before this returns, so requests already queued
    /// start flowing immediately. Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if `options` are invalid
    /// - the sequencer's error if the bootstrap `resolve` fails
    pub fn spawn<P, R, H>(
        sequencer: Sequencer<P, R>,
        handler: H,
        options: DriverOptions,
    ) -> Result<DriverHandle<P, R>>
    where
        P: Payload,
        R: Default + Send + 'static,
        H: CommandHandler<P, R>,
    {
        options.validate()?;

        let (slot, round) = DispatchSlot::channel();
        sequencer.bootstrap(slot)?;

        debug!(channel = %sequencer.id(), ?options, "Driver loop started");

        let task = tokio::spawn(Self::run(sequencer.downgrade(), handler, options, round));

        Ok(DriverHandle { sequencer, task })
    }

    /// Round loop.
    async fn run<P, R, H>(
        sequencer: WeakSequencer<P, R>,
        handler: H,
        options: DriverOptions,
        mut round: oneshot::Receiver<P>,
    ) -> Result<DriverSummary>
    where
        P: Payload,
        R: Send + 'static,
        H: CommandHandler<P, R>,
    {
        let channel = sequencer.id();
        let mut summary = DriverSummary::default();

        loop {
            let payload = match Self::next_payload(&mut round, options.round_timeout).await {
                RoundOutcome::Payload(payload) => payload,
                RoundOutcome::Closed => {
                    debug!(%channel, "Channel closed, no further rounds");
                    break;
                }
                RoundOutcome::TimedOut(limit) => {
                    let timeout_ms = limit.as_millis() as u64;
                    warn!(%channel, timeout_ms, "Round timed out waiting for the page");
                    if let Some(sequencer) = sequencer.upgrade() {
                        sequencer.close();
                    }
                    return Err(Error::timeout("driver round", timeout_ms));
                }
            };

            let ceded = payload.is_cede();
            trace!(%channel, round = summary.rounds + 1, ceded, "Round received payload");

            let result = handler.handle(payload).await;
            summary.rounds += 1;

            if ceded {
                summary.cedes += 1;
                handler.on_cede().await;
            }

            let (slot, next_round) = DispatchSlot::channel();
            round = next_round;

            if !Self::answer(&sequencer, channel, slot, result)? {
                break;
            }
        }

        debug!(
            %channel,
            rounds = summary.rounds,
            cedes = summary.cedes,
            "Driver loop finished"
        );

        Ok(summary)
    }

    /// Waits for the page to use the current round's slot.
    async fn next_payload<P>(
        round: &mut oneshot::Receiver<P>,
        limit: Option<Duration>,
    ) -> RoundOutcome<P> {
        let received = match limit {
            Some(limit) => match timeout(limit, &mut *round).await {
                Ok(received) => received,
                Err(_) => return RoundOutcome::TimedOut(limit),
            },
            None => (&mut *round).await,
        };

        match received {
            Ok(payload) => RoundOutcome::Payload(payload),
            Err(_) => RoundOutcome::Closed,
        }
    }

    /// Resolves the round; `Ok(false)` means the channel was closed or
    /// dropped meanwhile.
    ///
    /// The strong handle lives only for this call.
    fn answer<P, R>(
        sequencer: &WeakSequencer<P, R>,
        channel: ChannelId,
        slot: DispatchSlot<P>,
        result: R,
    ) -> Result<bool>
    where
        P: Send + 'static,
        R: Send + 'static,
    {
        let Some(sequencer) = sequencer.upgrade() else {
            debug!(%channel, "Every channel handle dropped, no further rounds");
            return Ok(false);
        };

        match sequencer.resolve(slot, result) {
            Ok(()) => Ok(true),
            Err(Error::ChannelClosed) => {
                debug!(%channel, "Channel closed while handling a round");
                Ok(false)
            }
            Err(e) => {
                warn!(%channel, error = %e, "Resolve rejected by sequencer");
                Err(e)
            }
        }
    }
}

// ============================================================================
// DriverHandle
// ============================================================================

/// Handle to a running driver loop.
#[derive(Debug)]
pub struct DriverHandle<P, R> {
    sequencer: Sequencer<P, R>,
    task: JoinHandle<Result<DriverSummary>>,
}

impl<P, R> DriverHandle<P, R> {
    /// Returns `true` once the loop has stopped.
    #[inline]
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the loop to end on its own.
    ///
    /// # Errors
    ///
    /// - [`Error::Timeout`] if a round timed out
    /// - [`Error::Driver`] if the task panicked or was cancelled
    pub async fn join(self) -> Result<DriverSummary> {
        self.task
            .await
            .map_err(|e| Error::driver(e.to_string()))?
    }

    /// Closes the channel and waits for the loop to end.
    ///
    /// Pending responses are rejected with [`Error::ChannelClosed`].
    ///
    /// # Errors
    ///
    /// Same as [`DriverHandle::join`].
    pub async fn shutdown(self) -> Result<DriverSummary> {
        self.sequencer.close();
        self.join().await
    }
}

// ============================================================================
// Tests
// ============================================================================
