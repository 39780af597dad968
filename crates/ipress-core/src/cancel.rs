//! Single-shot cancellation scope.
//!
//! Every listener attached for one interaction registers its detach hook on
//! the interaction's [`CancelScope`]. Cancelling the scope runs all hooks, so
//! one call detaches everything.
//!
//! # Invariants
//!
//! 1. `cancel()` runs each hook exactly once; later calls are no-ops.
//! 2. Hooks run in registration order.
//! 3. A hook registered after cancellation runs immediately.
//! 4. Hooks may touch the scope while it is cancelling.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

type Hook = Box<dyn FnOnce()>;

#[derive(Default)]
struct ScopeInner {
    cancelled: Cell<bool>,
    hooks: RefCell<Vec<Hook>>,
}

/// Cloneable handle to one cancellation signal.
///
/// Clones share state: cancelling any clone cancels them all.
#[derive(Clone, Default)]
pub struct CancelScope {
    inner: Rc<ScopeInner>,
}

impl core::fmt::Debug for CancelScope {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CancelScope")
            .field("cancelled", &self.is_cancelled())
            .field("pending_hooks", &self.pending_hooks())
            .finish()
    }
}

impl CancelScope {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.get()
    }

    /// Hooks registered and not yet run.
    #[must_use]
    pub fn pending_hooks(&self) -> usize {
        self.inner.hooks.borrow().len()
    }

    /// Register a detach hook, or run it now if already cancelled.
    pub fn on_cancel(&self, hook: impl FnOnce() + 'static) {
        if self.is_cancelled() {
            hook();
            return;
        }
        self.inner.hooks.borrow_mut().push(Box::new(hook));
    }

    /// Signal the scope. Returns `true` only for the call that cancelled it.
    pub fn cancel(&self) -> bool {
        if self.inner.cancelled.replace(true) {
            return false;
        }
        // Run outside the borrow so hooks may touch the scope again.
        let hooks = std::mem::take(&mut *self.inner.hooks.borrow_mut());
        for hook in hooks {
            hook();
        }
        true
    }
}
