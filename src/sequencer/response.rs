//! Deferred response handed back by `send`.

// ============================================================================
// Imports
// ============================================================================

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;
use tokio::time::timeout;

use crate::error::{Error, Result};
use crate::identifiers::RequestSeq;

// ============================================================================
// Response
// ============================================================================

/// The driver's answer to one `send`, delivered later.
///
/// Awaiting yields the `previous_result` of the `resolve` call that
/// answered this request, or the error that aborted the channel.
#[derive(Debug)]
#[must_use = "a response does nothing unless awaited or polled"]
pub struct Response<R> {
    seq: RequestSeq,
    rx: oneshot::Receiver<Result<R>>,
}

impl<R> Response<R> {
    pub(crate) fn new(seq: RequestSeq, rx: oneshot::Receiver<Result<R>>) -> Self {
        Self { seq, rx }
    }

    /// Position of the request in send order.
    #[inline]
    #[must_use]
    pub fn seq(&self) -> RequestSeq {
        self.seq
    }

    /// Takes the result if it has already arrived.
    ///
    /// Returns `None` while the request is still pending. Once a result has
    /// been taken, later calls report [`Error::ChannelClosed`].
    pub fn try_take(&mut self) -> Option<Result<R>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Err(Error::ChannelClosed)),
        }
    }

    /// Waits for the result, giving up after `limit`.
    ///
    /// # Errors
    ///
    /// - [`Error::Timeout`] if no result arrived within `limit`
    /// - any error the channel was aborted with
    pub async fn with_timeout(self, limit: Duration) -> Result<R> {
        let seq = self.seq;

        match timeout(limit, self).await {
            Ok(result) => result,
            Err(_) => Err(Error::timeout(
                format!("response {seq}"),
                limit.as_millis() as u64,
            )),
        }
    }
}

impl<R> Future for Response<R> {
    type Output = Result<R>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|received| match received {
            Ok(result) => result,
            Err(e) => Err(Error::from(e)),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
