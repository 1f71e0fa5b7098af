//! The two-party rendezvous state machine.
//!
//! A [`Handoff`] mediates exactly one potential value transfer between one
//! sender and one receiver. Each side announces itself once; when both have
//! arrived the handoff becomes *ready* and fires a one-shot hook. The value
//! crosses iff the handoff is then committed with [`Handoff::proceed`];
//! [`Handoff::cancel`] aborts it and sends both parties back to their retry
//! loops.
//!
//! The ready phase is what makes a multi-way select possible: select needs to
//! observe *which* of its candidates could complete without committing any of
//! them, then commit exactly one. A handoff used outside select skips that
//! ceremony — its default hook schedules `proceed` as soon as it is ready.

use std::mem;
use std::sync::{Arc, Condvar, Mutex};

use randevu::{exec, Notifier};

/// Terminal result of a handoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The rendezvous committed; the value crossed to the receiver.
    Completed,
    /// The handoff ended without transferring its value.
    Cancelled,
}

enum Phase<T> {
    Empty,
    ReaderPresent,
    ValuePresent(T),
    Ready(T),
    /// Committed. Holds the value until the receiving party collects it.
    Completed(Option<T>),
    /// Aborted. Holds the undelivered value until the sending party reclaims
    /// it for retry.
    Cancelled(Option<T>),
}

impl<T> Phase<T> {
    fn is_done(&self) -> bool {
        matches!(self, Phase::Completed(_) | Phase::Cancelled(_))
    }

    fn name(&self) -> &'static str {
        match self {
            Phase::Empty => "Empty",
            Phase::ReaderPresent => "ReaderPresent",
            Phase::ValuePresent(_) => "ValuePresent",
            Phase::Ready(_) => "Ready",
            Phase::Completed(_) => "Completed",
            Phase::Cancelled(_) => "Cancelled",
        }
    }
}

enum ReadyHook {
    /// Commit as soon as both parties have arrived. Installed at
    /// construction so a handoff used outside select behaves like a plain
    /// rendezvous.
    AutoCommit,
    /// Readiness is somebody's wakeup; they decide whether to commit.
    Notify(Arc<dyn Notifier>),
}

struct Inner<T> {
    phase: Phase<T>,
    hook: Option<ReadyHook>,
}

/// A one-shot rendezvous between one sender and one receiver.
///
/// Each of [`as_sender`](Handoff::as_sender) and
/// [`as_receiver`](Handoff::as_receiver) may be called at most once per
/// handoff, from different threads; a thread playing both sides of the same
/// handoff deadlocks against itself. Playing the same side twice is a
/// programming error and panics.
pub struct Handoff<T> {
    inner: Mutex<Inner<T>>,
    done: Condvar,
}

impl<T: Send + 'static> Handoff<T> {
    /// Creates a handoff that auto-commits when both parties arrive.
    pub fn new() -> Arc<Self> {
        Self::with_hook(ReadyHook::AutoCommit)
    }

    /// Creates a handoff whose readiness only notifies `ready`; committing
    /// is left to the notified party.
    pub(crate) fn armed(ready: Arc<dyn Notifier>) -> Arc<Self> {
        Self::with_hook(ReadyHook::Notify(ready))
    }

    fn with_hook(hook: ReadyHook) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(Inner {
                phase: Phase::Empty,
                hook: Some(hook),
            }),
            done: Condvar::new(),
        })
    }

    /// Plays the sending side: deposits `value` and parks until the handoff
    /// is committed or cancelled.
    ///
    /// Returns `Ok(())` when the value crossed to the receiver, and
    /// `Err(value)` when the handoff was cancelled and the value must be
    /// offered elsewhere.
    pub fn as_sender(self: &Arc<Self>, value: T) -> Result<(), T> {
        self.deposit_value(value)?;
        let mut inner = self.inner.lock().unwrap();
        while !inner.phase.is_done() {
            inner = self.done.wait(inner).unwrap();
        }
        match &mut inner.phase {
            Phase::Completed(_) => Ok(()),
            Phase::Cancelled(stash) => {
                // Our deposit is the only value this handoff ever held.
                Err(stash.take().expect("cancelled handoff lost the sender's value"))
            }
            _ => unreachable!(),
        }
    }

    /// Plays the receiving side: announces presence and parks until the
    /// handoff is committed or cancelled.
    ///
    /// Returns `Some(value)` when the rendezvous committed, `None` when it
    /// was cancelled.
    pub fn as_receiver(self: &Arc<Self>) -> Option<T> {
        if !self.deposit_reader() {
            return None;
        }
        let mut inner = self.inner.lock().unwrap();
        while !inner.phase.is_done() {
            inner = self.done.wait(inner).unwrap();
        }
        match &mut inner.phase {
            Phase::Completed(value) => {
                Some(value.take().expect("completed handoff lost its value"))
            }
            Phase::Cancelled(_) => None,
            _ => unreachable!(),
        }
    }

    /// Attempts to commit the rendezvous.
    ///
    /// A ready handoff completes and releases both parked parties; any other
    /// live phase is cancelled instead. Idempotent once done: later calls
    /// return the stored outcome without side effects.
    pub fn proceed(&self) -> Outcome {
        let outcome = {
            let mut inner = self.inner.lock().unwrap();
            match mem::replace(&mut inner.phase, Phase::Empty) {
                Phase::Ready(value) => {
                    inner.phase = Phase::Completed(Some(value));
                    Outcome::Completed
                }
                Phase::ValuePresent(value) => {
                    inner.phase = Phase::Cancelled(Some(value));
                    Outcome::Cancelled
                }
                Phase::Empty | Phase::ReaderPresent => {
                    inner.phase = Phase::Cancelled(None);
                    Outcome::Cancelled
                }
                done @ Phase::Completed(_) => {
                    inner.phase = done;
                    return Outcome::Completed;
                }
                done @ Phase::Cancelled(_) => {
                    inner.phase = done;
                    return Outcome::Cancelled;
                }
            }
        };
        self.done.notify_all();
        outcome
    }

    /// Cancels the handoff unless it already committed.
    ///
    /// Releases both parked parties. Idempotent; returns the stored outcome,
    /// which is [`Outcome::Completed`] when a concurrent committer won the
    /// race — callers use that to detect a commit they did not perform.
    pub fn cancel(&self) -> Outcome {
        {
            let mut inner = self.inner.lock().unwrap();
            match mem::replace(&mut inner.phase, Phase::Empty) {
                Phase::Ready(value) | Phase::ValuePresent(value) => {
                    inner.phase = Phase::Cancelled(Some(value));
                }
                Phase::Empty | Phase::ReaderPresent => {
                    inner.phase = Phase::Cancelled(None);
                }
                done @ Phase::Completed(_) => {
                    inner.phase = done;
                    return Outcome::Completed;
                }
                done @ Phase::Cancelled(_) => {
                    inner.phase = done;
                    return Outcome::Cancelled;
                }
            }
        }
        self.done.notify_all();
        Outcome::Cancelled
    }

    /// True once both parties have arrived, including after completion or
    /// cancellation.
    pub fn is_ready(&self) -> bool {
        let inner = self.inner.lock().unwrap();
        matches!(inner.phase, Phase::Ready(_)) || inner.phase.is_done()
    }

    /// Installs (or replaces) the notifier fired when the handoff becomes
    /// ready.
    ///
    /// If the handoff is already ready or done, the notifier is scheduled
    /// promptly on a worker instead; it is never invoked under the phase
    /// mutex. A displaced notifier is poked so its owner re-scans its
    /// candidates rather than sleeping on a registration that can no longer
    /// fire.
    pub fn on_ready(&self, notifier: Arc<dyn Notifier>) {
        let mut inner = self.inner.lock().unwrap();
        if matches!(inner.phase, Phase::Ready(_)) || inner.phase.is_done() {
            drop(inner);
            exec::schedule(move || notifier.notify());
            return;
        }
        let displaced = inner.hook.replace(ReadyHook::Notify(notifier));
        drop(inner);
        if let Some(ReadyHook::Notify(old)) = displaced {
            old.notify();
        }
    }

    /// Deposits the sender's value without parking.
    ///
    /// `Err(value)` means the handoff is already done and cannot accept it.
    pub(crate) fn deposit_value(self: &Arc<Self>, value: T) -> Result<(), T> {
        let hook = {
            let mut inner = self.inner.lock().unwrap();
            match mem::replace(&mut inner.phase, Phase::Empty) {
                Phase::Empty => {
                    inner.phase = Phase::ValuePresent(value);
                    None
                }
                Phase::ReaderPresent => {
                    inner.phase = Phase::Ready(value);
                    inner.hook.take()
                }
                done @ (Phase::Completed(_) | Phase::Cancelled(_)) => {
                    inner.phase = done;
                    return Err(value);
                }
                occupied => panic!("handoff already has a sender (phase {})", occupied.name()),
            }
        };
        if let Some(hook) = hook {
            self.fire(hook);
        }
        Ok(())
    }

    /// Announces the receiver's presence without parking.
    ///
    /// Returns false when the handoff is already done.
    pub(crate) fn deposit_reader(self: &Arc<Self>) -> bool {
        let hook = {
            let mut inner = self.inner.lock().unwrap();
            match mem::replace(&mut inner.phase, Phase::Empty) {
                Phase::Empty => {
                    inner.phase = Phase::ReaderPresent;
                    None
                }
                Phase::ValuePresent(value) => {
                    inner.phase = Phase::Ready(value);
                    inner.hook.take()
                }
                done @ (Phase::Completed(_) | Phase::Cancelled(_)) => {
                    inner.phase = done;
                    return false;
                }
                occupied => panic!("handoff already has a receiver (phase {})", occupied.name()),
            }
        };
        if let Some(hook) = hook {
            self.fire(hook);
        }
        true
    }

    /// True iff committing now would (or already did) transfer the value.
    pub(crate) fn is_committable(&self) -> bool {
        let inner = self.inner.lock().unwrap();
        matches!(inner.phase, Phase::Ready(_) | Phase::Completed(_))
    }

    /// True iff the handoff already committed.
    pub(crate) fn is_complete(&self) -> bool {
        let inner = self.inner.lock().unwrap();
        matches!(inner.phase, Phase::Completed(_))
    }

    /// True iff the handoff reached a terminal phase.
    pub(crate) fn is_done(&self) -> bool {
        self.inner.lock().unwrap().phase.is_done()
    }

    /// Takes the committed value. Receiving side only; yields at most once.
    pub(crate) fn collect(&self) -> Option<T> {
        let mut inner = self.inner.lock().unwrap();
        match &mut inner.phase {
            Phase::Completed(value) => value.take(),
            _ => None,
        }
    }

    /// Takes an undelivered value back out of a cancelled handoff so the
    /// sender can offer it elsewhere.
    pub(crate) fn reclaim(&self) -> Option<T> {
        let mut inner = self.inner.lock().unwrap();
        match &mut inner.phase {
            Phase::Cancelled(value) => value.take(),
            _ => None,
        }
    }

    /// Runs a ready hook outside the phase mutex.
    fn fire(self: &Arc<Self>, hook: ReadyHook) {
        match hook {
            ReadyHook::AutoCommit => {
                let handoff = Arc::clone(self);
                exec::schedule(move || {
                    handoff.proceed();
                });
            }
            ReadyHook::Notify(notifier) => notifier.notify(),
        }
    }
}
