//! Single-use dispatch capability.
//!
//! The driver hands the page one [`DispatchSlot`] per round. Dispatching
//! consumes the slot, so a slot can never carry a second payload.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use tokio::sync::oneshot;

use crate::error::{Error, Result};

// ============================================================================
// Types
// ============================================================================

/// Boxed one-shot dispatch function.
type DispatchFn<P> = Box<dyn FnOnce(P) -> Result<()> + Send>;

// ============================================================================
// DispatchSlot
// ============================================================================

/// A single-use capability to send one payload to the driver.
///
/// # Example
///
/// ```ignore
/// let (slot, round) = DispatchSlot::channel();
/// sequencer.resolve(slot, previous_result)?;
/// let payload = round.await?;
/// ```
pub struct DispatchSlot<P> {
    dispatch: DispatchFn<P>,
}

impl<P: Send + 'static> DispatchSlot<P> {
    /// Wraps a callback as a dispatch slot.
    ///
    /// The callback runs at most once, outside the sequencer's lock, so it
    /// may call back into the sequencer.
    #[must_use]
    pub fn new<F>(dispatch: F) -> Self
    where
        F: FnOnce(P) -> Result<()> + Send + 'static,
    {
        Self {
            dispatch: Box::new(dispatch),
        }
    }

    /// Creates a slot whose payload is delivered to the returned receiver.
    #[must_use]
    pub fn channel() -> (Self, oneshot::Receiver<P>) {
        let (tx, rx) = oneshot::channel();
        (Self::from_sender(tx), rx)
    }

    /// Creates a slot that forwards its payload into `tx`.
    ///
    /// Dispatch fails with [`Error::Dispatch`] if the receiver is gone.
    #[must_use]
    pub fn from_sender(tx: oneshot::Sender<P>) -> Self {
        Self::new(move |payload| {
            tx.send(payload)
                .map_err(|_| Error::dispatch("driver stopped waiting for this round"))
        })
    }
}

impl<P> DispatchSlot<P> {
    /// Sends `payload` through the slot, consuming it.
    ///
    /// # Errors
    ///
    /// Returns whatever the driver-side callback reports, typically
    /// [`Error::Dispatch`].
    pub fn dispatch(self, payload: P) -> Result<()> {
        (self.dispatch)(payload)
    }
}

impl<P> fmt::Debug for DispatchSlot<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchSlot").finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
