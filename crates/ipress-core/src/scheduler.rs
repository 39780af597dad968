//! Deferred work: idle callbacks and microtasks with fallbacks.
//!
//! Hosts expose primitive queues through [`HostTasks`]; this module owns the
//! preference order:
//!
//! | Entry point | Preferred | Fallback |
//! |-------------|-----------|----------|
//! | [`schedule_idle`] | native idle callback | 16 ms timer with a synthesized deadline |
//! | [`schedule_microtask`] | native microtask queue | resolved-promise continuation, then inline |
//!
//! Nothing scheduled here is required for correctness of the controller.

use std::cell::Cell;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;

use crate::host::{HostClock, HostTasks, IdleDeadline, IdleTask, Task};

#[cfg(feature = "tracing")]
use crate::logging::{trace, warn};
#[cfg(not(feature = "tracing"))]
use crate::{trace, warn};

/// Delay of the timer that stands in for a missing idle facility.
pub const IDLE_FALLBACK_DELAY_MS: u32 = 16;

/// Handle to scheduled idle work. Remembers which mechanism accepted it so
/// [`cancel_idle`] uses the matching one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleHandle {
    Native(u32),
    Timer(u32),
}

/// Which path [`schedule_microtask`] took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deferral {
    /// Queued on the native microtask queue.
    Microtask,
    /// Chained onto an already-resolved promise.
    Continuation,
    /// Nothing would take it; it already ran.
    Immediate,
}

/// Schedule `task` for idle time, with `timeout_ms` as the latest start.
///
/// Returns `None` only when neither the idle facility nor a timer accepted
/// the task.
pub fn schedule_idle<H>(
    host: &H,
    timeout_ms: u32,
    task: impl FnOnce(IdleDeadline) + 'static,
) -> Option<IdleHandle>
where
    H: HostTasks + HostClock + Clone + 'static,
{
    let slot: Rc<Cell<Option<IdleTask>>> = Rc::new(Cell::new(Some(Box::new(task))));

    if host.has_idle_callback() {
        let native_slot = Rc::clone(&slot);
        let native: IdleTask = Box::new(move |deadline| {
            if let Some(task) = native_slot.take() {
                task(deadline);
            }
        });
        match host.request_idle_callback(timeout_ms, native) {
            Ok(handle) => return Some(IdleHandle::Native(handle)),
            Err(err) => trace!(error = %err, "idle callback rejected; using timer"),
        }
    }

    let started = host.now_ms();
    let clock = host.clone();
    let timer: Task = Box::new(move || {
        if let Some(task) = slot.take() {
            let elapsed = clock.now_ms() - started;
            task(IdleDeadline {
                did_timeout: elapsed >= f64::from(timeout_ms),
                time_remaining_ms: 0.0,
            });
        }
    });
    match host.set_timeout(IDLE_FALLBACK_DELAY_MS, timer) {
        Ok(handle) => Some(IdleHandle::Timer(handle)),
        Err(err) => {
            warn!(error = %err, "idle work dropped: no timer available");
            None
        }
    }
}

/// Cancel idle work through the mechanism that accepted it.
pub fn cancel_idle<H: HostTasks>(host: &H, handle: IdleHandle) {
    match handle {
        IdleHandle::Native(id) => host.cancel_idle_callback(id),
        IdleHandle::Timer(id) => host.clear_timeout(id),
    }
}

/// Run `task` on the next microtask tick.
///
/// Panics inside `task` are swallowed. The task runs at most once even if a
/// host accepts it on more than one path.
pub fn schedule_microtask<H: HostTasks>(host: &H, task: impl FnOnce() + 'static) -> Deferral {
    let slot: Rc<Cell<Option<Task>>> = Rc::new(Cell::new(Some(Box::new(task))));
    let runner = move || {
        if let Some(task) = slot.take()
            && catch_unwind(AssertUnwindSafe(task)).is_err()
        {
            warn!("deferred task panicked; discarded");
        }
    };

    if host.has_microtask_queue() {
        match host.queue_microtask(Box::new(runner.clone())) {
            Ok(()) => return Deferral::Microtask,
            Err(err) => trace!(error = %err, "microtask queue rejected task"),
        }
    }
    match host.resolve_then(Box::new(runner.clone())) {
        Ok(()) => Deferral::Continuation,
        Err(err) => {
            trace!(error = %err, "no deferral available; running inline");
            runner();
            Deferral::Immediate
        }
    }
}
