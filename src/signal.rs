use std::sync::{Condvar, Mutex};

/// A wakeup sink that can be notified from any thread.
///
/// Rendezvous internals hold their wakeup targets as `Arc<dyn Notifier>`, so
/// a waiter can hand the same sink to several candidate communications and
/// block once. Implementations must tolerate repeated and spurious calls.
pub trait Notifier: Send + Sync {
    /// Delivers the wakeup.
    fn notify(&self);
}

/// A sticky one-shot wakeup gate.
///
/// `wait` blocks until some thread has called `notify`. Notification is
/// sticky: once delivered, every current and future `wait` returns
/// immediately, which makes the notify/wait race benign regardless of
/// ordering. The gate is not tied to any particular thread; any number of
/// threads may block on it and a single `notify` releases them all.
pub struct Signal {
    notified: Mutex<bool>,
    wakeup: Condvar,
}

impl Default for Signal {
    fn default() -> Self {
        Self::new()
    }
}

impl Signal {
    /// Creates a new, un-notified signal.
    pub fn new() -> Self {
        Self {
            notified: Mutex::new(false),
            wakeup: Condvar::new(),
        }
    }

    /// Blocks until the signal has been notified.
    pub fn wait(&self) {
        let mut notified = self.notified.lock().unwrap();
        while !*notified {
            notified = self.wakeup.wait(notified).unwrap();
        }
    }

    /// Notifies the signal, releasing every blocked waiter.
    pub fn notify(&self) {
        let mut notified = self.notified.lock().unwrap();
        *notified = true;
        self.wakeup.notify_all();
    }

    /// Returns true if the signal has been notified.
    pub fn is_notified(&self) -> bool {
        *self.notified.lock().unwrap()
    }
}

impl Notifier for Signal {
    fn notify(&self) {
        Signal::notify(self)
    }
}
