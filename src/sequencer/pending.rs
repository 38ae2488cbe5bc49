//! Pending queue and completion chain.
//!
//! Each [`Link`] stands for one outstanding response. Its `next` field is
//! the continuation registered by the following `send`: the payload that
//! may be dispatched once this link is fulfilled. The back of the queue is
//! the chain tail new requests attach to; an empty queue means the tail has
//! already been fulfilled.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;
use std::mem;

use tokio::sync::oneshot;
use tracing::trace;

use crate::error::{Error, Result};
use crate::identifiers::RequestSeq;

// ============================================================================
// Types
// ============================================================================

/// Sending half of a caller's response.
pub(crate) type Responder<R> = oneshot::Sender<Result<R>>;

/// A payload gated on the previous link's fulfillment.
#[derive(Debug)]
pub(crate) struct Queued<P> {
    pub(crate) seq: RequestSeq,
    pub(crate) payload: P,
}

/// Who is waiting on a link.
enum Waiter<R> {
    /// Bootstrap entry: "the first slot has arrived".
    Sentinel,
    /// A real request.
    Request {
        seq: RequestSeq,
        responder: Responder<R>,
    },
}

// ============================================================================
// Link
// ============================================================================

/// One entry of the pending queue.
pub(crate) struct Link<P, R> {
    waiter: Waiter<R>,
    next: Option<Queued<P>>,
}

impl<P, R> Link<P, R> {
    /// Detaches the continuation registered on this link.
    pub(crate) fn take_next(&mut self) -> Option<Queued<P>> {
        self.next.take()
    }

    /// Fulfills the waiter with the driver's result.
    ///
    /// The sentinel discards the value.
    pub(crate) fn fulfill(self, result: R) {
        match self.waiter {
            Waiter::Sentinel => trace!("Bootstrap sentinel fulfilled"),
            Waiter::Request { seq, responder } => {
                if responder.send(Ok(result)).is_err() {
                    trace!(%seq, "Caller dropped its response");
                }
            }
        }
    }

    /// Rejects the waiter, dropping any gated payload.
    ///
    /// Returns `true` if a gated payload was dropped.
    pub(crate) fn reject(self, err: Error) -> bool {
        if let Waiter::Request { responder, .. } = self.waiter {
            let _ = responder.send(Err(err));
        }
        self.next.is_some()
    }
}

// ============================================================================
// PendingQueue
// ============================================================================

/// FIFO of outstanding links, oldest first.
pub(crate) struct PendingQueue<P, R> {
    links: VecDeque<Link<P, R>>,
}

impl<P, R> PendingQueue<P, R> {
    /// Creates a queue holding only the bootstrap sentinel.
    pub(crate) fn with_sentinel() -> Self {
        let mut links = VecDeque::new();
        links.push_back(Link {
            waiter: Waiter::Sentinel,
            next: None,
        });
        Self { links }
    }

    /// Number of links, sentinel included.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.links.len()
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Registers `queued` as the continuation of the current tail.
    ///
    /// Returns the payload back when there is no tail, meaning every prior
    /// request has completed and it may be dispatched immediately.
    pub(crate) fn attach(&mut self, queued: Queued<P>) -> Option<Queued<P>> {
        match self.links.back_mut() {
            Some(tail) => {
                debug_assert!(tail.next.is_none(), "chain tail already has a continuation");
                tail.next = Some(queued);
                None
            }
            None => Some(queued),
        }
    }

    /// Appends a new tail for request `seq`.
    pub(crate) fn push(&mut self, seq: RequestSeq, responder: Responder<R>) {
        self.links.push_back(Link {
            waiter: Waiter::Request { seq, responder },
            next: None,
        });
    }

    /// Removes the oldest link.
    pub(crate) fn pop_front(&mut self) -> Option<Link<P, R>> {
        self.links.pop_front()
    }

    /// Removes every link, leaving the queue empty.
    pub(crate) fn take_all(&mut self) -> VecDeque<Link<P, R>> {
        mem::take(&mut self.links)
    }
}

// ============================================================================
// Tests
// ============================================================================
