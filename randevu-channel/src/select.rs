//! Multi-way nondeterministic choice over candidate communications.
//!
//! [`select`] arms one handoff per case, all wired to a single [`Signal`],
//! parks until any of them reports readiness, then commits exactly one and
//! cancels the rest. The two-phase arm/commit split exists because a handoff
//! that became ready can still be cancelled by a concurrent select arming
//! the same channel; losing that race is benign and simply re-runs the scan
//! or, when every candidate died, the whole arming pass.

use std::sync::Arc;

use crossbeam_utils::Backoff;
use rand::Rng;

use randevu::{Notifier, Signal};

use crate::channel::{ArmedRecv, ArmedSend, Channel, Receiver, Sender};
use crate::handoff::Outcome;

/// One candidate communication in a [`select`] call.
///
/// Built with [`recv_from`] or [`send_to`]; consumed by [`select`].
pub struct SelectCase {
    case: Box<dyn Case>,
}

/// Builds a case that receives from `channel`. The callback runs with the
/// received value iff this case is the one chosen.
pub fn recv_from<T, F>(channel: &Channel<T>, callback: F) -> SelectCase
where
    T: Send + 'static,
    F: FnOnce(T) + 'static,
{
    SelectCase {
        case: Box::new(RecvCase {
            channel: channel.clone(),
            callback: Some(Box::new(callback)),
            armed: None,
        }),
    }
}

/// Builds a case that sends `value` to `channel`. The callback runs after
/// delivery iff this case is the one chosen; otherwise the value is dropped
/// with the case.
pub fn send_to<T, F>(channel: &Channel<T>, value: T, callback: F) -> SelectCase
where
    T: Send + 'static,
    F: FnOnce() + 'static,
{
    SelectCase {
        case: Box::new(SendCase {
            channel: channel.clone(),
            value: Some(value),
            callback: Some(Box::new(callback)),
            armed: None,
        }),
    }
}

impl<T: Send + 'static> Receiver<T> {
    /// Builds a receive case for [`select`] from this receiving half.
    pub fn recv_case<F>(&self, callback: F) -> SelectCase
    where
        F: FnOnce(T) + 'static,
    {
        recv_from(self.channel(), callback)
    }
}

impl<T: Send + 'static> Sender<T> {
    /// Builds a send case for [`select`] from this sending half.
    pub fn send_case<F>(&self, value: T, callback: F) -> SelectCase
    where
        F: FnOnce() + 'static,
    {
        send_to(self.channel(), value, callback)
    }
}

/// Waits on multiple candidate communications, completing exactly one.
///
/// Exactly one case's callback is invoked, on the calling thread; every
/// other case is cancelled and leaves no observable effect on its channel.
/// When several cases are ready at resolution time the winner is chosen
/// uniformly at random, so no ready case can be starved deterministically.
///
/// # Panics
///
/// Panics when `cases` is empty.
pub fn select(mut cases: Vec<SelectCase>) {
    assert!(!cases.is_empty(), "select over an empty case set");
    let mut rng = rand::rng();
    let backoff = Backoff::new();
    loop {
        let signal = Arc::new(Signal::new());
        for case in cases.iter_mut() {
            case.case.arm(signal.clone());
        }
        signal.wait();
        if let Some(winner) = resolve(&mut cases, &mut rng) {
            for (index, case) in cases.iter_mut().enumerate() {
                if index != winner {
                    case.case.cancel();
                }
            }
            cases[winner].case.finish();
            return;
        }
        // Every candidate died between the signal and the scan (a concurrent
        // select cancelled them, or the wakeup was a displacement poke).
        // Tear the armed set down and re-arm against current queue state. A
        // cancel that reports Completed lost to a concurrent committer; that
        // case is the winner after all.
        //
        // TODO: two selects arming overlapping channels can each commit a
        // handoff belonging to the other before either scan runs; the second
        // commit is then finished by neither and its value is dropped with
        // the handoff. Fixing this needs an ordering protocol between arming
        // and commit, not another retry.
        let mut committed = None;
        for (index, case) in cases.iter_mut().enumerate() {
            if case.case.cancel() == Outcome::Completed && committed.is_none() {
                committed = Some(index);
            }
        }
        if let Some(winner) = committed {
            cases[winner].case.finish();
            return;
        }
        backoff.snooze();
    }
}

/// Scans the armed cases and tries to commit one. `None` means nothing was
/// committable and the caller should re-arm.
fn resolve(cases: &mut [SelectCase], rng: &mut impl Rng) -> Option<usize> {
    loop {
        // A case someone else already committed is not a candidate, it is a
        // fact; honoring it is the only way to keep that rendezvous paired.
        if let Some(index) = (0..cases.len()).find(|&i| cases[i].case.is_complete()) {
            return Some(index);
        }
        let ready: Vec<usize> = (0..cases.len())
            .filter(|&i| cases[i].case.is_committable())
            .collect();
        if ready.is_empty() {
            return None;
        }
        let choice = ready[rng.random_range(0..ready.len())];
        if cases[choice].case.commit() == Outcome::Completed {
            return Some(choice);
        }
        // Lost the commit race to a concurrent select; scan again.
    }
}

trait Case {
    fn arm(&mut self, ready: Arc<dyn Notifier>);
    fn is_committable(&self) -> bool;
    fn is_complete(&self) -> bool;
    fn commit(&mut self) -> Outcome;
    fn cancel(&mut self) -> Outcome;
    fn finish(&mut self);
}

struct RecvCase<T: Send + 'static> {
    channel: Channel<T>,
    callback: Option<Box<dyn FnOnce(T)>>,
    armed: Option<ArmedRecv<T>>,
}

impl<T: Send + 'static> Case for RecvCase<T> {
    fn arm(&mut self, ready: Arc<dyn Notifier>) {
        self.armed = Some(self.channel.try_arm_recv(ready));
    }

    fn is_committable(&self) -> bool {
        self.armed.as_ref().is_some_and(ArmedRecv::is_committable)
    }

    fn is_complete(&self) -> bool {
        self.armed.as_ref().is_some_and(ArmedRecv::is_complete)
    }

    fn commit(&mut self) -> Outcome {
        self.armed
            .as_ref()
            .expect("committing an unarmed case")
            .commit()
    }

    fn cancel(&mut self) -> Outcome {
        match &self.armed {
            Some(armed) => armed.cancel(),
            None => Outcome::Cancelled,
        }
    }

    fn finish(&mut self) {
        let armed = self.armed.take().expect("finishing an unarmed case");
        let value = armed.collect().expect("chosen receive lost its value");
        let callback = self.callback.take().expect("select case finished twice");
        callback(value);
    }
}

struct SendCase<T: Send + 'static> {
    channel: Channel<T>,
    value: Option<T>,
    callback: Option<Box<dyn FnOnce()>>,
    armed: Option<ArmedSend<T>>,
}

impl<T: Send + 'static> Case for SendCase<T> {
    fn arm(&mut self, ready: Arc<dyn Notifier>) {
        let value = self
            .value
            .take()
            .expect("armed a send case without its value");
        self.armed = Some(self.channel.try_arm_send(value, ready));
    }

    fn is_committable(&self) -> bool {
        self.armed.as_ref().is_some_and(ArmedSend::is_committable)
    }

    fn is_complete(&self) -> bool {
        self.armed.as_ref().is_some_and(ArmedSend::is_complete)
    }

    fn commit(&mut self) -> Outcome {
        self.armed
            .as_ref()
            .expect("committing an unarmed case")
            .commit()
    }

    fn cancel(&mut self) -> Outcome {
        let outcome = match &self.armed {
            Some(armed) => armed.cancel(),
            None => return Outcome::Cancelled,
        };
        if outcome == Outcome::Cancelled {
            // Take the value back so a later re-arm can deposit it again.
            if let Some(value) = self.armed.as_ref().and_then(ArmedSend::reclaim) {
                self.value = Some(value);
            }
        }
        outcome
    }

    fn finish(&mut self) {
        let callback = self.callback.take().expect("select case finished twice");
        callback();
    }
}
