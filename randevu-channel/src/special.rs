//! Special channels for timing and control flow.
//!
//! These compose the core rendezvous primitives with detached helper tasks;
//! they carry no invariants of their own.

use std::thread;
use std::time::{Duration, Instant};

use randevu::exec;

use crate::channel::{channel, Receiver};

/// Creates a channel that offers the completion instant once, after
/// `duration` — the timer case for a select with a timeout.
///
/// The instant is handed over by rendezvous. If it is never received, the
/// helper task parks indefinitely.
pub fn after(duration: Duration) -> Receiver<Instant> {
    let (sender, receiver) = channel();
    exec::spawn(move || {
        thread::sleep(duration);
        sender.send(Instant::now());
    });
    receiver
}

/// Creates a channel that offers an instant every `duration`.
///
/// Rendezvous pacing: a tick that has not been received yet delays the next
/// sleep instead of being dropped or buffered.
pub fn tick(duration: Duration) -> Receiver<Instant> {
    let (sender, receiver) = channel();
    exec::spawn(move || loop {
        thread::sleep(duration);
        sender.send(Instant::now());
    });
    receiver
}

/// Creates a channel on which no send will ever occur.
pub fn never<T: Send + 'static>() -> Receiver<T> {
    let (sender, receiver) = channel();
    drop(sender);
    receiver
}
