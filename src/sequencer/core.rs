//! Sequencer implementation.
//!
//! See the [module docs](super) for the handshake.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, error, trace, warn};

use crate::error::{Error, Result, Violation};
use crate::identifiers::{ChannelId, RequestSeq};
use crate::protocol::Payload;

use super::pending::{PendingQueue, Queued};
use super::response::Response;
use super::slot::DispatchSlot;

// ============================================================================
// SequencerStats
// ============================================================================

/// Counters describing a sequencer's traffic so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SequencerStats {
    /// Accepted `send` calls.
    pub sent: u64,
    /// Payloads handed to a dispatch slot.
    pub dispatched: u64,
    /// Accepted `resolve` calls, bootstrap included.
    pub resolved: u64,
    /// Current pending queue length, sentinel included.
    pub pending: usize,
}

// ============================================================================
// Fault
// ============================================================================

/// Why a channel stopped accepting traffic.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Fault {
    Violation(Violation),
    Dispatch(String),
    Closed,
}

impl Fault {
    fn to_error(&self) -> Error {
        match self {
            Self::Violation(violation) => Error::violation(*violation),
            Self::Dispatch(message) => Error::dispatch(message.clone()),
            Self::Closed => Error::ChannelClosed,
        }
    }
}

// ============================================================================
// State
// ============================================================================

/// Mutable channel state, only touched under the lock.
struct State<P, R> {
    queue: PendingQueue<P, R>,
    slot: Option<DispatchSlot<P>>,
    last_seq: RequestSeq,
    stats: SequencerStats,
    fault: Option<Fault>,
    /// Set while some call is running turns outside the lock.
    dispatching: bool,
    /// Turn released while `dispatching`, picked up by the running dispatcher.
    deferred: Option<Turn<P>>,
}

/// A request whose turn has come, paired with the slot it will use.
type Turn<P> = (Option<DispatchSlot<P>>, Queued<P>);

impl<P, R> State<P, R> {
    fn new() -> Self {
        Self {
            queue: PendingQueue::with_sentinel(),
            slot: None,
            last_seq: RequestSeq::BOOTSTRAP,
            stats: SequencerStats::default(),
            fault: None,
            dispatching: false,
            deferred: None,
        }
    }

    /// Claims the dispatcher role for `turn`.
    ///
    /// Returns the turn when the caller must run it; otherwise parks it for
    /// the dispatcher already running further up the stack.
    fn schedule(&mut self, turn: Turn<P>) -> Option<Turn<P>> {
        if self.dispatching {
            debug_assert!(self.deferred.is_none(), "two turns released at once");
            self.deferred = Some(turn);
            None
        } else {
            self.dispatching = true;
            Some(turn)
        }
    }

    /// Marks the channel faulted and rejects everything still pending.
    ///
    /// The first fault wins; later calls only return it.
    fn abort(&mut self, channel: ChannelId, fault: Fault) -> Error {
        if let Some(existing) = &self.fault {
            return existing.to_error();
        }

        let links = self.queue.take_all();
        let rejected = links.len();
        let mut dropped = usize::from(self.deferred.take().is_some());
        for link in links {
            if link.reject(fault.to_error()) {
                dropped += 1;
            }
        }

        // Dropping the slot tells a waiting driver round that nothing is coming.
        self.slot = None;

        debug!(%channel, ?fault, rejected, dropped, "Channel aborted");

        let err = fault.to_error();
        self.fault = Some(fault);
        err
    }
}

// ============================================================================
// Sequencer
// ============================================================================

/// Strict-ordering bridge between callers and a one-shot driver callback.
///
/// Cloning yields another handle to the same channel.
///
/// # Thread Safety
///
/// `Sequencer` is `Send + Sync` when its payload and result types are
/// `Send`. State changes happen under a short lock that is never held while
/// a slot runs or a caller is woken, so a driver may `resolve` from inside a
/// slot callback.
pub struct Sequencer<P, R> {
    inner: Arc<Inner<P, R>>,
}

struct Inner<P, R> {
    id: ChannelId,
    state: Mutex<State<P, R>>,
}

impl<P, R> Clone for Sequencer<P, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P, R> fmt::Debug for Sequencer<P, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Sequencer")
            .field("id", &self.inner.id)
            .field("pending", &state.queue.len())
            .field("has_slot", &state.slot.is_some())
            .field("fault", &state.fault)
            .finish()
    }
}

// ============================================================================
// WeakSequencer
// ============================================================================

/// Non-owning handle to a [`Sequencer`].
///
/// Does not keep the channel alive: once every [`Sequencer`] handle is
/// dropped the channel tears down and [`WeakSequencer::upgrade`] returns
/// `None`.
pub struct WeakSequencer<P, R> {
    id: ChannelId,
    inner: Weak<Inner<P, R>>,
}

impl<P, R> WeakSequencer<P, R> {
    /// Returns the channel ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// Returns a strong handle if the channel still exists.
    #[must_use]
    pub fn upgrade(&self) -> Option<Sequencer<P, R>> {
        self.inner.upgrade().map(|inner| Sequencer { inner })
    }
}

impl<P, R> Clone for WeakSequencer<P, R> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<P, R> fmt::Debug for WeakSequencer<P, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakSequencer")
            .field("id", &self.id)
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl<P: Send + 'static, R: Send + 'static> Default for Sequencer<P, R> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Sequencer - Constructor & Accessors
// ============================================================================

impl<P, R> Sequencer<P, R> {
    /// Returns the channel ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> ChannelId {
        self.inner.id
    }

    /// Creates a handle that does not keep the channel alive.
    #[must_use]
    pub fn downgrade(&self) -> WeakSequencer<P, R> {
        WeakSequencer {
            id: self.inner.id,
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Returns a snapshot of the traffic counters.
    #[must_use]
    pub fn stats(&self) -> SequencerStats {
        let state = self.inner.state.lock();
        SequencerStats {
            pending: state.queue.len(),
            ..state.stats
        }
    }

    /// Number of pending queue entries, bootstrap sentinel included.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner.state.lock().queue.len()
    }

    /// Returns `true` once the driver's first `resolve` has arrived.
    #[inline]
    #[must_use]
    pub fn is_bootstrapped(&self) -> bool {
        self.inner.state.lock().stats.resolved > 0
    }

    /// Returns `true` if an unused dispatch slot is installed.
    #[inline]
    #[must_use]
    pub fn has_slot(&self) -> bool {
        self.inner.state.lock().slot.is_some()
    }

    /// Returns `true` if the channel was closed or aborted.
    #[inline]
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.inner.state.lock().fault.is_some()
    }

    /// Returns the violation that aborted the channel, if any.
    #[must_use]
    pub fn violation(&self) -> Option<Violation> {
        match self.inner.state.lock().fault {
            Some(Fault::Violation(violation)) => Some(violation),
            _ => None,
        }
    }

    /// Tears the channel down.
    ///
    /// Every pending response is rejected with [`Error::ChannelClosed`] and
    /// the installed slot, if any, is dropped. Closing an already aborted
    /// channel keeps the original fault.
    pub fn close(&self) {
        let mut state = self.inner.state.lock();
        if state.fault.is_none() {
            state.abort(self.inner.id, Fault::Closed);
        }
    }
}

impl<P: Send + 'static, R: Send + 'static> Sequencer<P, R> {
    /// Creates a sequencer waiting for its bootstrap `resolve`.
    #[must_use]
    pub fn new() -> Self {
        let id = ChannelId::generate();
        debug!(channel = %id, "Sequencer created");

        Self {
            inner: Arc::new(Inner {
                id,
                state: Mutex::new(State::new()),
            }),
        }
    }
}

// ============================================================================
// Sequencer - Client Side
// ============================================================================

impl<P: Send + 'static, R: Send + 'static> Sequencer<P, R> {
    /// Queues `payload` for dispatch and returns its deferred response.
    ///
    /// May be called any number of times from anywhere. Payloads reach the
    /// driver in call order, one per slot, each only after the previous
    /// request has been answered.
    ///
    /// On a closed or aborted channel the returned response is already
    /// rejected with the channel's error.
    pub fn send(&self, payload: P) -> Response<R> {
        let (responder, rx) = oneshot::channel();
        let channel = self.inner.id;

        let mut state = self.inner.state.lock();
        let seq = state.last_seq.next();
        state.last_seq = seq;

        if let Some(fault) = &state.fault {
            debug!(%channel, %seq, ?fault, "Send rejected, channel aborted");
            let _ = responder.send(Err(fault.to_error()));
            return Response::new(seq, rx);
        }

        state.stats.sent += 1;

        let ready = state.queue.attach(Queued { seq, payload });
        state.queue.push(seq, responder);
        let turn = match ready {
            Some(queued) => {
                let turn = (state.slot.take(), queued);
                state.schedule(turn)
            }
            None => {
                trace!(%channel, %seq, "Request queued behind previous");
                None
            }
        };
        drop(state);

        if let Some(turn) = turn {
            // Failures abort the channel, which rejects this response.
            let _ = self.run_turns(turn);
        }

        Response::new(seq, rx)
    }

    /// Sends every payload in iteration order.
    pub fn send_all(&self, payloads: impl IntoIterator<Item = P>) -> Vec<Response<R>> {
        payloads.into_iter().map(|payload| self.send(payload)).collect()
    }

    /// Runs `turn`, then every turn released re-entrantly while it ran.
    ///
    /// A slot that resolves from inside itself parks the next turn instead
    /// of dispatching it, so draining a backlog stays at constant stack
    /// depth.
    fn run_turns(&self, mut turn: Turn<P>) -> Result<()> {
        loop {
            let outcome = self.dispatch(turn);

            let mut state = self.inner.state.lock();
            match (outcome, state.deferred.take()) {
                (Ok(()), Some(next)) => turn = next,
                (outcome, _) => {
                    state.dispatching = false;
                    return outcome;
                }
            }
        }
    }

    /// Invokes the slot for a request whose turn has come.
    fn dispatch(&self, (slot, queued): Turn<P>) -> Result<()> {
        let channel = self.inner.id;
        let seq = queued.seq;

        let Some(slot) = slot else {
            error!(%channel, %seq, "No dispatch slot for request");
            return Err(self
                .inner
                .state
                .lock()
                .abort(channel, Fault::Violation(Violation::MissingSlot)));
        };

        match slot.dispatch(queued.payload) {
            Ok(()) => {
                self.inner.state.lock().stats.dispatched += 1;
                trace!(%channel, %seq, "Request dispatched");
                Ok(())
            }
            Err(e) => {
                error!(%channel, %seq, error = %e, "Dispatch failed");
                Err(self
                    .inner
                    .state
                    .lock()
                    .abort(channel, Fault::Dispatch(e.to_string())))
            }
        }
    }
}

impl<P: Payload, R: Send + 'static> Sequencer<P, R> {
    /// Hands control back to the driver without meaningful data.
    ///
    /// Sends the reserved no-op payload through the normal queue.
    pub fn cede(&self) -> Response<R> {
        self.send(P::cede())
    }
}

// ============================================================================
// Sequencer - Driver Side
// ============================================================================

impl<P: Send + 'static, R: Send + 'static> Sequencer<P, R> {
    /// Completes one driver round.
    ///
    /// Installs `next_slot`, answers the oldest pending request with
    /// `previous_result`, and releases the next queued payload (if any)
    /// through the new slot. The first call answers the bootstrap sentinel
    /// and its result is discarded.
    ///
    /// # Errors
    ///
    /// - [`Error::ProtocolViolation`] with [`Violation::EmptyQueue`] if no
    ///   request is pending
    /// - [`Error::ProtocolViolation`] with [`Violation::DoubleSupply`] if the
    ///   previous slot was never consumed
    /// - [`Error::Dispatch`] or [`Violation::MissingSlot`] if the payload this
    ///   call released could not be delivered
    /// - the channel's fault if it is already closed or aborted
    ///
    /// Any of these aborts the channel. When called from inside a slot, the
    /// released payload is delivered after the slot returns and a delivery
    /// failure is reported to the outermost `send` or `resolve` instead.
    pub fn resolve(&self, next_slot: DispatchSlot<P>, previous_result: R) -> Result<()> {
        let channel = self.inner.id;
        let mut state = self.inner.state.lock();

        if let Some(fault) = &state.fault {
            debug!(%channel, ?fault, "Resolve on aborted channel");
            return Err(fault.to_error());
        }

        if state.queue.is_empty() {
            warn!(%channel, violation = Violation::EmptyQueue.as_str(), "Resolve with nothing pending");
            return Err(state.abort(channel, Fault::Violation(Violation::EmptyQueue)));
        }

        if state.slot.is_some() || state.deferred.is_some() {
            warn!(%channel, violation = Violation::DoubleSupply.as_str(), "Previous slot never consumed");
            return Err(state.abort(channel, Fault::Violation(Violation::DoubleSupply)));
        }

        let Some(mut link) = state.queue.pop_front() else {
            return Err(state.abort(channel, Fault::Violation(Violation::EmptyQueue)));
        };

        state.stats.resolved += 1;
        state.slot = Some(next_slot);
        let turn = match link.take_next() {
            Some(queued) => {
                let turn = (state.slot.take(), queued);
                state.schedule(turn)
            }
            None => None,
        };
        let remaining = state.queue.len();
        drop(state);

        trace!(%channel, remaining, "Round resolved");

        link.fulfill(previous_result);
        match turn {
            Some(turn) => self.run_turns(turn),
            None => Ok(()),
        }
    }
}

impl<P: Send + 'static, R: Default + Send + 'static> Sequencer<P, R> {
    /// Performs the driver's first handshake.
    ///
    /// Equivalent to `resolve(first_slot, R::default())`.
    ///
    /// # Errors
    ///
    /// Same as [`Sequencer::resolve`].
    pub fn bootstrap(&self, first_slot: DispatchSlot<P>) -> Result<()> {
        debug!(channel = %self.inner.id, "Bootstrap handshake");
        self.resolve(first_slot, R::default())
    }
}

// ============================================================================
// Teardown
// ============================================================================

impl<P, R> Drop for Inner<P, R> {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        if state.fault.is_none() {
            state.abort(self.id, Fault::Closed);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    type Log = Arc<Mutex<Vec<String>>>;

    fn recording_slot(log: &Log) -> DispatchSlot<String> {
        let log = Arc::clone(log);
        DispatchSlot::new(move |payload| {
            log.lock().push(payload);
            Ok(())
        })
    }

    fn dispatched(log: &Log) -> Vec<String> {
        log.lock().clone()
    }

    #[test]
    fn test_bootstrap_then_send() {
        let log = Log::default();
        let seq: Sequencer<String, String> = Sequencer::new();

        seq.bootstrap(recording_slot(&log)).unwrap();
        assert!(seq.is_bootstrapped());
        assert!(seq.has_slot());

        let mut x = seq.send("X".into());
        assert_eq!(dispatched(&log), ["X"]);
        assert!(!seq.has_slot());
        assert!(x.try_take().is_none());

        seq.resolve(recording_slot(&log), "X-ack".into()).unwrap();
        assert_eq!(x.try_take().unwrap().unwrap(), "X-ack");
        assert!(seq.has_slot());
    }

    #[test]
    fn test_back_to_back_sends_before_bootstrap() {
        let log = Log::default();
        let seq: Sequencer<String, String> = Sequencer::new();

        let mut a = seq.send("A".into());
        let mut b = seq.send("B".into());
        assert!(dispatched(&log).is_empty());
        assert_eq!(seq.pending_count(), 3);

        seq.bootstrap(recording_slot(&log)).unwrap();
        assert_eq!(dispatched(&log), ["A"]);
        assert!(a.try_take().is_none());

        seq.resolve(recording_slot(&log), "a".into()).unwrap();
        assert_eq!(dispatched(&log), ["A", "B"]);
        assert_eq!(a.try_take().unwrap().unwrap(), "a");
        assert!(b.try_take().is_none());

        seq.resolve(recording_slot(&log), "b".into()).unwrap();
        assert_eq!(b.try_take().unwrap().unwrap(), "b");
        assert_eq!(seq.pending_count(), 0);
    }

    #[test]
    fn test_sequence_numbers_follow_call_order() {
        let seq: Sequencer<String, String> = Sequencer::new();
        let responses = seq.send_all(["one".to_string(), "two".to_string()]);

        let numbers: Vec<u64> = responses.iter().map(|r| r.seq().as_u64()).collect();
        assert_eq!(numbers, [1, 2]);
    }

    #[test]
    fn test_resolve_with_empty_queue_is_violation() {
        let log = Log::default();
        let seq: Sequencer<String, String> = Sequencer::new();
        seq.bootstrap(recording_slot(&log)).unwrap();

        let mut x = seq.send("X".into());
        seq.resolve(recording_slot(&log), "X-ack".into()).unwrap();
        assert_eq!(x.try_take().unwrap().unwrap(), "X-ack");

        let err = seq
            .resolve(recording_slot(&log), "stray".into())
            .unwrap_err();
        assert_eq!(err.as_violation(), Some(Violation::EmptyQueue));
        assert_eq!(seq.violation(), Some(Violation::EmptyQueue));
        assert!(!seq.has_slot());
    }

    #[test]
    fn test_send_after_violation_is_rejected() {
        let log = Log::default();
        let seq: Sequencer<String, String> = Sequencer::new();
        seq.bootstrap(recording_slot(&log)).unwrap();
        let _ = seq.resolve(recording_slot(&log), String::new());

        let mut late = seq.send("late".into());
        let err = late.try_take().unwrap().unwrap_err();
        assert!(err.is_protocol_violation());
        assert!(dispatched(&log).is_empty());
        assert_eq!(seq.stats().sent, 0);
    }

    #[test]
    fn test_double_supply_aborts_pending() {
        let log = Log::default();
        let seq: Sequencer<String, String> = Sequencer::new();
        let mut a = seq.send("A".into());

        // Force the state a misbehaving driver would produce.
        seq.inner.state.lock().slot = Some(recording_slot(&log));

        let err = seq
            .resolve(recording_slot(&log), String::new())
            .unwrap_err();
        assert_eq!(err.as_violation(), Some(Violation::DoubleSupply));

        let rejected = a.try_take().unwrap().unwrap_err();
        assert_eq!(rejected.as_violation(), Some(Violation::DoubleSupply));
        assert!(dispatched(&log).is_empty());
    }

    #[test]
    fn test_missing_slot_aborts_instead_of_dropping() {
        let log = Log::default();
        let seq: Sequencer<String, String> = Sequencer::new();
        seq.bootstrap(recording_slot(&log)).unwrap();
        seq.inner.state.lock().slot = None;

        let mut x = seq.send("X".into());
        let err = x.try_take().unwrap().unwrap_err();
        assert_eq!(err.as_violation(), Some(Violation::MissingSlot));
        assert!(seq.is_aborted());
    }

    #[test]
    fn test_failed_dispatch_aborts_channel() {
        let seq: Sequencer<String, String> = Sequencer::new();
        let (slot, round) = DispatchSlot::channel();
        drop(round);
        seq.bootstrap(slot).unwrap();

        let mut x = seq.send("X".into());
        assert!(matches!(
            x.try_take().unwrap(),
            Err(Error::Dispatch { .. })
        ));

        let err = seq.resolve(DispatchSlot::new(|_| Ok(())), String::new());
        assert!(matches!(err, Err(Error::Dispatch { .. })));
    }

    #[test]
    fn test_close_rejects_pending_and_drops_slot() {
        let seq: Sequencer<String, String> = Sequencer::new();
        let (slot, _round) = DispatchSlot::channel();
        seq.bootstrap(slot).unwrap();

        let (second, mut second_round) = DispatchSlot::channel();
        let mut x = seq.send("X".into());
        seq.close();

        assert!(matches!(x.try_take().unwrap(), Err(Error::ChannelClosed)));
        assert!(seq.resolve(second, String::new()).is_err());
        assert!(second_round.try_recv().is_err());
        assert!(seq.is_aborted());
        assert_eq!(seq.violation(), None);
    }

    #[test]
    fn test_close_keeps_first_fault() {
        let seq: Sequencer<String, String> = Sequencer::new();
        seq.bootstrap(DispatchSlot::new(|_| Ok(()))).unwrap();
        let _ = seq.resolve(DispatchSlot::new(|_| Ok(())), String::new());
        seq.close();

        assert_eq!(seq.violation(), Some(Violation::EmptyQueue));
    }

    #[test]
    fn test_dropping_last_handle_rejects_pending() {
        let seq: Sequencer<String, String> = Sequencer::new();
        let mut x = seq.send("X".into());
        drop(seq);

        assert!(matches!(x.try_take().unwrap(), Err(Error::ChannelClosed)));
    }

    #[test]
    fn test_cede_is_an_ordinary_request() {
        let log = Log::default();
        let seq: Sequencer<String, String> = Sequencer::new();

        let mut first = seq.send("first".into());
        let mut ceded = seq.cede();
        seq.bootstrap(recording_slot(&log)).unwrap();
        assert_eq!(dispatched(&log), ["first"]);

        seq.resolve(recording_slot(&log), "ok".into()).unwrap();
        assert_eq!(dispatched(&log), ["first".to_string(), String::cede()]);
        assert!(dispatched(&log)[1].is_cede());

        seq.resolve(recording_slot(&log), "ceded".into()).unwrap();
        assert_eq!(first.try_take().unwrap().unwrap(), "ok");
        assert_eq!(ceded.try_take().unwrap().unwrap(), "ceded");
    }

    #[test]
    fn test_resolve_from_inside_slot() {
        let seq: Sequencer<String, String> = Sequencer::new();
        let driver = seq.clone();
        let answered = Log::default();
        let answered_in_slot = Arc::clone(&answered);

        seq.bootstrap(DispatchSlot::new(move |payload: String| {
            answered_in_slot.lock().push(payload.clone());
            driver.resolve(DispatchSlot::new(|_| Ok(())), format!("{payload}-ack"))
        }))
        .unwrap();

        let mut x = seq.send("X".into());
        assert_eq!(x.try_take().unwrap().unwrap(), "X-ack");
        assert_eq!(dispatched(&answered), ["X"]);
    }

    /// Driver that answers every payload from inside its own slot.
    fn inline_slot(seq: &Sequencer<u64, u64>) -> DispatchSlot<u64> {
        let seq = seq.clone();
        DispatchSlot::new(move |payload| {
            let next = inline_slot(&seq);
            seq.resolve(next, payload + 1)
        })
    }

    #[test]
    fn test_inline_driver_drains_deep_backlog() {
        const BACKLOG: u64 = 100_000;

        let seq: Sequencer<u64, u64> = Sequencer::new();
        let responses = seq.send_all(0..BACKLOG);

        seq.bootstrap(inline_slot(&seq)).unwrap();

        for (i, mut response) in responses.into_iter().enumerate() {
            assert_eq!(response.try_take().unwrap().unwrap(), i as u64 + 1);
        }
        let stats = seq.stats();
        assert_eq!(stats.dispatched, BACKLOG);
        assert_eq!(stats.resolved, BACKLOG + 1);
        assert!(seq.has_slot());

        // Sends after the backlog still go straight through.
        let mut late = seq.send(41);
        assert_eq!(late.try_take().unwrap().unwrap(), 42);

        seq.close();
    }

    #[test]
    fn test_slot_resolving_twice_is_double_supply() {
        let seq: Sequencer<String, String> = Sequencer::new();
        let driver = seq.clone();

        let mut a = seq.send("A".into());
        let mut b = seq.send("B".into());
        let mut c = seq.send("C".into());

        seq.bootstrap(DispatchSlot::new(move |payload: String| {
            driver.resolve(DispatchSlot::new(|_| Ok(())), format!("{payload}-1"))?;
            driver.resolve(DispatchSlot::new(|_| Ok(())), format!("{payload}-2"))
        }))
        .unwrap_err();

        assert_eq!(a.try_take().unwrap().unwrap(), "A-1");
        for response in [&mut b, &mut c] {
            let err = response.try_take().unwrap().unwrap_err();
            assert_eq!(err.as_violation(), Some(Violation::DoubleSupply));
        }
        assert_eq!(seq.violation(), Some(Violation::DoubleSupply));
    }

    #[test]
    fn test_rejected_sends_get_distinct_seqs() {
        let seq: Sequencer<String, String> = Sequencer::new();
        let accepted = seq.send("A".into());
        seq.close();

        let first = seq.send("late-1".into());
        let second = seq.send("late-2".into());
        assert_eq!(accepted.seq().as_u64(), 1);
        assert_eq!(first.seq().as_u64(), 2);
        assert_eq!(second.seq().as_u64(), 3);
    }

    #[test]
    fn test_resolve_reports_failed_dispatch() {
        let log = Log::default();
        let seq: Sequencer<String, String> = Sequencer::new();
        seq.bootstrap(recording_slot(&log)).unwrap();

        let mut a = seq.send("A".into());
        let mut b = seq.send("B".into());

        let (dead_slot, round) = DispatchSlot::channel();
        drop(round);
        let err = seq.resolve(dead_slot, "a".into()).unwrap_err();
        assert!(matches!(err, Error::Dispatch { .. }));

        assert_eq!(a.try_take().unwrap().unwrap(), "a");
        assert!(matches!(b.try_take().unwrap(), Err(Error::Dispatch { .. })));
        assert!(seq.is_aborted());
    }

    #[test]
    fn test_weak_handle_does_not_keep_channel_alive() {
        let seq: Sequencer<String, String> = Sequencer::new();
        let weak = seq.downgrade();
        assert_eq!(weak.id(), seq.id());

        let (slot, mut round) = DispatchSlot::channel();
        seq.bootstrap(slot).unwrap();
        assert!(weak.upgrade().is_some());

        drop(seq);
        assert!(weak.upgrade().is_none());
        assert!(round.try_recv().is_err());
    }

    #[test]
    fn test_stats_track_handshake_invariant() {
        let log = Log::default();
        let seq: Sequencer<String, String> = Sequencer::new();
        let responses = seq.send_all((0..4).map(|i| i.to_string()));
        seq.bootstrap(recording_slot(&log)).unwrap();

        for i in 0..4 {
            seq.resolve(recording_slot(&log), format!("ack{i}")).unwrap();
        }

        let stats = seq.stats();
        assert_eq!(stats.sent, 4);
        assert_eq!(stats.dispatched, 4);
        assert_eq!(stats.resolved, stats.sent + 1);
        assert_eq!(stats.pending, 0);

        for (i, mut response) in responses.into_iter().enumerate() {
            assert_eq!(response.try_take().unwrap().unwrap(), format!("ack{i}"));
        }
    }
}
