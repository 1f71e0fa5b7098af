//! CSP-style synchronous rendezvous channels with a multi-way select.
//!
//! This crate provides unbuffered channels in which producers and consumers
//! meet by rendezvous: a send completes only when paired with a receive on
//! the same channel, and vice versa. There is no buffer anywhere — values
//! move directly from the sending thread to the receiving thread.
//!
//! # Key Features
//!
//! - **Multi-producer Multi-consumer (MPMC)**: any number of threads may
//!   send and receive on one channel; waiters pair up FIFO.
//! - **True rendezvous**: `send` blocks until its value has been taken, so
//!   completion of a send is also an acknowledgement.
//! - **Select**: [`select`] waits on any mix of send and receive cases
//!   across channels, completes exactly one, and cancels the rest without
//!   observable effect; ties among ready cases break uniformly at random.
//! - **Special channels**: [`after`], [`tick`], and [`never`] for timeouts
//!   and control flow inside a select.
//! - **Open handoff primitive**: the one-shot [`Handoff`] the channels are
//!   built from is public, for callers that want a bare two-party
//!   rendezvous.
//!
//! # Example
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use randevu_channel::{recv_from, select, Channel};
//!
//! let a: Channel<i32> = Channel::new();
//! let b: Channel<i32> = Channel::new();
//!
//! let producer = a.clone();
//! randevu::spawn(move || producer.send(10));
//!
//! let seen = Arc::new(Mutex::new(None));
//! let from_a = seen.clone();
//! let from_b = seen.clone();
//! select(vec![
//!     recv_from(&a, move |v| *from_a.lock().unwrap() = Some(("a", v))),
//!     recv_from(&b, move |v| *from_b.lock().unwrap() = Some(("b", v))),
//! ]);
//! assert_eq!(*seen.lock().unwrap(), Some(("a", 10)));
//! ```
//!
//! # Blocking model
//!
//! Every `send` and `recv` parks the calling thread until its rendezvous
//! resolves. Run communicating tasks on threads that are allowed to block —
//! [`randevu::spawn`] gives each task its own — and never on a bounded pool
//! whose workers the rendezvous would pin.

#![warn(missing_docs)]

/// Channel and view-wrapper types.
pub mod channel;
/// The two-party rendezvous state machine.
pub mod handoff;
/// The multi-way choice coordinator.
pub mod select;
/// Timing and control-flow channels.
pub mod special;

pub use channel::{channel, Channel, Receivable, Receiver, Sendable, Sender};
pub use handoff::{Handoff, Outcome};
pub use select::{recv_from, select, send_to, SelectCase};
pub use special::{after, never, tick};
