//! Randevu substrate: thread-parking signals and task spawning for
//! rendezvous channels.
//!
//! This crate carries the two runtime seams the `randevu-channel` crate is
//! built on, and nothing else:
//!
//! - **Signals**: a sticky one-shot wakeup gate ([`Signal`]) behind the
//!   [`Notifier`] trait, used to coalesce readiness notifications from many
//!   candidate rendezvous into a single wait.
//! - **Execution**: [`spawn`] for detached tasks on dedicated native threads,
//!   and [`schedule`] for short non-blocking closures on a small shared
//!   worker pool.
//!
//! The split matters operationally: a task parked in a rendezvous blocks its
//! own thread, never a pool worker, so the pool cannot be exhausted by
//! blocked communications. Pool workers only ever run bounded, non-blocking
//! closures.

#![warn(missing_docs)]

/// Task spawning and the shared worker pool.
pub mod exec;
/// Signal mechanism for thread synchronization.
pub mod signal;

pub use exec::{schedule, spawn};
pub use signal::{Notifier, Signal};
