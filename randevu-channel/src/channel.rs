//! Unbuffered multi-producer multi-consumer rendezvous channels.
//!
//! A [`Channel`] holds no storage, only two FIFO queues of parked waiters.
//! An arriving sender either adopts the handoff of the receiver at the front
//! of the queue or parks a fresh handoff of its own; receivers are symmetric.
//! Because pairing happens at arrival time, at most one of the two queues
//! holds live entries at any instant.
//!
//! The channel mutex covers only queue manipulation. It is always released
//! before the handoff itself is played, so no lock is ever held across a
//! rendezvous wait and at most one of {channel mutex, handoff mutex} is held
//! at a time.

use std::collections::LinkedList;
use std::sync::{Arc, Mutex};

use randevu::{exec, Notifier};

use crate::handoff::{Handoff, Outcome};

struct Waiters<T: Send + 'static> {
    senders: LinkedList<Arc<Handoff<T>>>,
    receivers: LinkedList<Arc<Handoff<T>>>,
}

struct Shared<T: Send + 'static> {
    waiters: Mutex<Waiters<T>>,
}

impl<T: Send + 'static> Drop for Shared<T> {
    fn drop(&mut self) {
        // A live queued handoff here means some thread is parked on a
        // channel that no longer exists and can never be matched.
        if let Ok(waiters) = self.waiters.get_mut() {
            for handoff in waiters.senders.iter().chain(waiters.receivers.iter()) {
                debug_assert!(
                    handoff.is_done(),
                    "channel dropped while a rendezvous was still pending"
                );
            }
        }
    }
}

/// An unbuffered rendezvous channel.
///
/// Cloning yields another handle to the same channel; any number of senders
/// and receivers may operate on it concurrently. There is no close
/// operation: a receive on a channel that will never see another sender
/// parks forever.
pub struct Channel<T: Send + 'static> {
    shared: Arc<Shared<T>>,
}

impl<T: Send + 'static> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T: Send + 'static> Default for Channel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> Channel<T> {
    /// Creates a new channel.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                waiters: Mutex::new(Waiters {
                    senders: LinkedList::new(),
                    receivers: LinkedList::new(),
                }),
            }),
        }
    }

    /// Sends a value, blocking until a receiver has taken it.
    pub fn send(&self, mut value: T) {
        loop {
            let handoff = {
                let mut waiters = self.shared.waiters.lock().unwrap();
                match waiters.receivers.pop_front() {
                    Some(handoff) => handoff,
                    None => {
                        let handoff = Handoff::new();
                        waiters.senders.push_back(handoff.clone());
                        handoff
                    }
                }
            };
            match handoff.as_sender(value) {
                Ok(()) => return,
                // Cancelled under us; take the value back and re-match.
                Err(v) => value = v,
            }
        }
    }

    /// Receives a value, blocking until a sender hands one over.
    pub fn recv(&self) -> T {
        loop {
            let handoff = {
                let mut waiters = self.shared.waiters.lock().unwrap();
                match waiters.senders.pop_front() {
                    Some(handoff) => handoff,
                    None => {
                        let handoff = Handoff::new();
                        waiters.receivers.push_back(handoff.clone());
                        handoff
                    }
                }
            };
            if let Some(value) = handoff.as_receiver() {
                return value;
            }
        }
    }

    /// Spawns a detached task that receives one value and hands it to
    /// `callback`.
    ///
    /// The callback runs on the helper task's thread; it may re-dispatch to
    /// any executor it chooses.
    pub fn recv_then<F>(&self, callback: F)
    where
        F: FnOnce(T) + Send + 'static,
    {
        let channel = self.clone();
        exec::spawn(move || callback(channel.recv()));
    }

    /// Arms a send for select: obtains a handoff, installs `ready`, and
    /// deposits the value, all without parking.
    ///
    /// The notifier is installed before the deposit can complete the pair,
    /// so a resident auto-commit hook can never fire on an armed case.
    pub(crate) fn try_arm_send(&self, mut value: T, ready: Arc<dyn Notifier>) -> ArmedSend<T> {
        loop {
            let (handoff, fresh) = {
                let mut waiters = self.shared.waiters.lock().unwrap();
                match waiters.receivers.pop_front() {
                    Some(handoff) => (handoff, false),
                    None => {
                        let handoff = Handoff::armed(ready.clone());
                        waiters.senders.push_back(handoff.clone());
                        (handoff, true)
                    }
                }
            };
            if !fresh {
                handoff.on_ready(ready.clone());
            }
            match handoff.deposit_value(value) {
                Ok(()) => return ArmedSend(handoff),
                // The dequeued handoff was already dead; keep matching.
                Err(v) => value = v,
            }
        }
    }

    /// Arms a receive for select; see [`Channel::try_arm_send`].
    pub(crate) fn try_arm_recv(&self, ready: Arc<dyn Notifier>) -> ArmedRecv<T> {
        loop {
            let (handoff, fresh) = {
                let mut waiters = self.shared.waiters.lock().unwrap();
                match waiters.senders.pop_front() {
                    Some(handoff) => (handoff, false),
                    None => {
                        let handoff = Handoff::armed(ready.clone());
                        waiters.receivers.push_back(handoff.clone());
                        (handoff, true)
                    }
                }
            };
            if !fresh {
                handoff.on_ready(ready.clone());
            }
            if handoff.deposit_reader() {
                return ArmedRecv(handoff);
            }
        }
    }
}

/// An armed send case: the value is deposited, the caller decides whether to
/// commit.
pub(crate) struct ArmedSend<T: Send + 'static>(Arc<Handoff<T>>);

impl<T: Send + 'static> ArmedSend<T> {
    pub(crate) fn is_committable(&self) -> bool {
        self.0.is_committable()
    }

    pub(crate) fn is_complete(&self) -> bool {
        self.0.is_complete()
    }

    pub(crate) fn commit(&self) -> Outcome {
        self.0.proceed()
    }

    pub(crate) fn cancel(&self) -> Outcome {
        self.0.cancel()
    }

    pub(crate) fn reclaim(&self) -> Option<T> {
        self.0.reclaim()
    }
}

/// An armed receive case: presence is announced, the caller decides whether
/// to commit and then collects the value.
pub(crate) struct ArmedRecv<T: Send + 'static>(Arc<Handoff<T>>);

impl<T: Send + 'static> ArmedRecv<T> {
    pub(crate) fn is_committable(&self) -> bool {
        self.0.is_committable()
    }

    pub(crate) fn is_complete(&self) -> bool {
        self.0.is_complete()
    }

    pub(crate) fn commit(&self) -> Outcome {
        self.0.proceed()
    }

    pub(crate) fn cancel(&self) -> Outcome {
        self.0.cancel()
    }

    pub(crate) fn collect(&self) -> Option<T> {
        self.0.collect()
    }
}

/// Creates an unbuffered rendezvous channel, returning its two view halves.
pub fn channel<T: Send + 'static>() -> (Sender<T>, Receiver<T>) {
    let inner = Channel::new();
    (
        Sender {
            inner: inner.clone(),
        },
        Receiver { inner },
    )
}

/// The sending half of a channel.
pub struct Sender<T: Send + 'static> {
    inner: Channel<T>,
}

impl<T: Send + 'static> Clone for Sender<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Send + 'static> Sender<T> {
    /// Sends a value, blocking until a receiver has taken it.
    pub fn send(&self, value: T) {
        self.inner.send(value)
    }

    pub(crate) fn channel(&self) -> &Channel<T> {
        &self.inner
    }
}

/// The receiving half of a channel.
pub struct Receiver<T: Send + 'static> {
    inner: Channel<T>,
}

impl<T: Send + 'static> Clone for Receiver<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Send + 'static> Receiver<T> {
    /// Receives a value, blocking until a sender hands one over.
    pub fn recv(&self) -> T {
        self.inner.recv()
    }

    /// Spawns a detached task that receives one value and hands it to
    /// `callback`; see [`Channel::recv_then`].
    pub fn recv_then<F>(&self, callback: F)
    where
        F: FnOnce(T) + Send + 'static,
    {
        self.inner.recv_then(callback)
    }

    pub(crate) fn channel(&self) -> &Channel<T> {
        &self.inner
    }
}

/// Capability of endpoints that can send.
pub trait Sendable<T> {
    /// Sends a value, blocking until a receiver has taken it.
    fn send(&self, value: T);
}

/// Capability of endpoints that can receive.
pub trait Receivable<T> {
    /// Receives a value, blocking until a sender hands one over.
    fn recv(&self) -> T;
}

impl<T: Send + 'static> Sendable<T> for Channel<T> {
    fn send(&self, value: T) {
        Channel::send(self, value)
    }
}

impl<T: Send + 'static> Receivable<T> for Channel<T> {
    fn recv(&self) -> T {
        Channel::recv(self)
    }
}

impl<T: Send + 'static> Sendable<T> for Sender<T> {
    fn send(&self, value: T) {
        Sender::send(self, value)
    }
}

impl<T: Send + 'static> Receivable<T> for Receiver<T> {
    fn recv(&self) -> T {
        Receiver::recv(self)
    }
}
