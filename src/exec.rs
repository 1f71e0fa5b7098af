//! Task spawning and the shared worker pool.
//!
//! Two execution seams with deliberately different backing:
//!
//! - [`spawn`] runs a detached task on its own native thread. Tasks are free
//!   to block in rendezvous operations for any amount of time.
//! - [`schedule`] runs a short closure on a lazily created, fixed-size pool.
//!   Closures handed here must not block; the pool is sized to the machine
//!   and a parked closure would pin a worker for the process lifetime.
//!
//! The channel layer only schedules auto-commits and readiness pokes, both of
//! which are bounded and lock-free of any long wait.

use once_cell::sync::Lazy;
use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};
use std::thread;

type Job = Box<dyn FnOnce() + Send + 'static>;

struct Pool {
    queue: Mutex<VecDeque<Job>>,
    available: Condvar,
}

static POOL: Lazy<Pool> = Lazy::new(|| {
    let workers = thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(2);
    for id in 0..workers {
        thread::Builder::new()
            .name(format!("randevu-worker-{id}"))
            .spawn(run_worker)
            .expect("failed to start randevu worker thread");
    }
    Pool {
        queue: Mutex::new(VecDeque::new()),
        available: Condvar::new(),
    }
});

fn run_worker() {
    loop {
        let job = {
            let mut queue = POOL.queue.lock().unwrap();
            loop {
                if let Some(job) = queue.pop_front() {
                    break job;
                }
                queue = POOL.available.wait(queue).unwrap();
            }
        };
        job();
    }
}

/// Enqueues a short, non-blocking closure on the shared worker pool.
///
/// Ordering with respect to the caller and to other scheduled closures is
/// unspecified.
pub fn schedule<F>(job: F)
where
    F: FnOnce() + Send + 'static,
{
    let mut queue = POOL.queue.lock().unwrap();
    queue.push_back(Box::new(job));
    POOL.available.notify_one();
}

/// Runs a detached task on a fresh native thread.
///
/// The task may block indefinitely without affecting the worker pool. Thread
/// creation failure is an unrecoverable deployment error and panics.
pub fn spawn<F>(task: F)
where
    F: FnOnce() + Send + 'static,
{
    thread::Builder::new()
        .name("randevu-task".into())
        .spawn(task)
        .expect("failed to spawn randevu task thread");
}
