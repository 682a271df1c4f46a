//! One-shot readiness gate for the preview surface.
//!
//! Two producers race to supply the handle: the synchronous check performed
//! while attaching, and the asynchronous availability callback. Whichever
//! lands first wins; the other is ignored.

use std::fmt;
use std::pin::pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Wake, Waker};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::{Error, Result};

enum GateState<H> {
    Pending,
    Ready(H),
}

impl<H> GateState<H> {
    fn is_pending(&self) -> bool {
        matches!(self, GateState::Pending)
    }
}

struct Shared<H> {
    state: Mutex<GateState<H>>,
    ready: Condvar,
}

impl<H> Shared<H> {
    // The state only ever moves Pending -> Ready under the lock, so a poisoned
    // guard still holds a consistent value.
    fn lock(&self) -> MutexGuard<'_, GateState<H>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Blocks any number of callers until the surface handle is known.
pub struct SurfaceReadinessGate<H> {
    shared: Arc<Shared<H>>,
}

impl<H> Clone for SurfaceReadinessGate<H> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<H> Default for SurfaceReadinessGate<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> fmt::Debug for SurfaceReadinessGate<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ready = !self.shared.lock().is_pending();
        f.debug_struct("SurfaceReadinessGate")
            .field("ready", &ready)
            .finish()
    }
}

impl<H> SurfaceReadinessGate<H> {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(GateState::Pending),
                ready: Condvar::new(),
            }),
        }
    }

    pub fn is_ready(&self) -> bool {
        !self.shared.lock().is_pending()
    }

    /// Records `handle` and wakes every waiter. Only the first call has an
    /// effect; later calls return `false` and leave the original handle.
    pub fn signal_ready(&self, handle: H) -> bool {
        let mut state = self.shared.lock();
        if !state.is_pending() {
            debug!("surface already signalled; ignoring duplicate");
            return false;
        }
        *state = GateState::Ready(handle);
        drop(state);
        self.shared.ready.notify_all();
        info!("preview surface ready");
        true
    }
}

impl<H: Clone> SurfaceReadinessGate<H> {
    pub fn try_get(&self) -> Option<H> {
        match &*self.shared.lock() {
            GateState::Ready(handle) => Some(handle.clone()),
            GateState::Pending => None,
        }
    }

    /// Blocks until the surface is known. Never times out.
    pub fn acquire(&self) -> H {
        let guard = self
            .shared
            .ready
            .wait_while(self.shared.lock(), |state| state.is_pending())
            .unwrap_or_else(PoisonError::into_inner);
        match &*guard {
            GateState::Ready(handle) => handle.clone(),
            GateState::Pending => unreachable!("wait_while returned while pending"),
        }
    }

    /// Blocks for at most `timeout`.
    pub fn acquire_timeout(&self, timeout: Duration) -> Result<H> {
        let (guard, _) = self
            .shared
            .ready
            .wait_timeout_while(self.shared.lock(), timeout, |state| state.is_pending())
            .unwrap_or_else(PoisonError::into_inner);
        match &*guard {
            GateState::Ready(handle) => Ok(handle.clone()),
            GateState::Pending => Err(Error::NotReady),
        }
    }
}

impl<H: Clone + Send + 'static> SurfaceReadinessGate<H> {
    /// Blocks until the surface is known or `cancel` fires.
    ///
    /// Cancellation while pending yields [`Error::NotReady`]. A gate that is
    /// already ready returns its handle even if the token is cancelled.
    pub fn acquire_cancellable(&self, cancel: &CancellationToken) -> Result<H> {
        let signal = Arc::new(CancelSignal {
            shared: Arc::clone(&self.shared),
            fired: AtomicBool::new(false),
        });
        let waker = Waker::from(Arc::clone(&signal));
        let mut cx = Context::from_waker(&waker);
        let mut cancelled = pin!(cancel.cancelled());

        loop {
            // Polling outside the gate lock registers the waker without
            // nesting the token's lock inside ours.
            if cancelled.as_mut().poll(&mut cx).is_ready() {
                return match self.try_get() {
                    Some(handle) => Ok(handle),
                    None => {
                        debug!("surface wait cancelled before readiness");
                        Err(Error::NotReady)
                    }
                };
            }

            let guard = self
                .shared
                .ready
                .wait_while(self.shared.lock(), |state| {
                    state.is_pending() && !signal.fired.swap(false, Ordering::AcqRel)
                })
                .unwrap_or_else(PoisonError::into_inner);
            if let GateState::Ready(handle) = &*guard {
                return Ok(handle.clone());
            }
        }
    }
}

/// Bridges token cancellation onto the gate's condition variable.
struct CancelSignal<H> {
    shared: Arc<Shared<H>>,
    fired: AtomicBool,
}

impl<H: Send + 'static> Wake for CancelSignal<H> {
    fn wake(self: Arc<Self>) {
        self.wake_by_ref();
    }

    fn wake_by_ref(self: &Arc<Self>) {
        self.fired.store(true, Ordering::Release);
        // Taking the lock orders this notify after any in-progress predicate check.
        let _guard = self.shared.lock();
        self.shared.ready.notify_all();
    }
}
