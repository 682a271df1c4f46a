//! Dedicated render thread that drains scheduled tasks in FIFO order.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Mutex, PoisonError, RwLock};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, info, warn};

use crate::capabilities::{RenderExecutionContext, RenderTask};
use crate::config::RenderQueueConfig;
use crate::error::{Error, Result};

/// Message sent to the render thread.
enum RenderMsg {
    Run(RenderTask),
    /// Stop after draining everything queued before this message.
    Quit,
}

/// Single-threaded render context backed by a channel.
///
/// `closed` is read-locked across the check and the send in `schedule`, so
/// every accepted task is queued ahead of the quit message.
pub struct RenderQueue {
    tx: Sender<RenderMsg>,
    closed: RwLock<bool>,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl RenderQueue {
    pub fn spawn(cfg: &RenderQueueConfig) -> Result<Self> {
        let (tx, rx) = match cfg.capacity {
            Some(capacity) => crossbeam_channel::bounded(capacity),
            None => crossbeam_channel::unbounded(),
        };
        let join = thread::Builder::new()
            .name(cfg.thread_name.clone())
            .spawn(move || run(rx))?;
        info!(thread = %cfg.thread_name, capacity = ?cfg.capacity, "render queue started");
        Ok(Self {
            tx,
            closed: RwLock::new(false),
            join: Mutex::new(Some(join)),
        })
    }

    /// Runs every task scheduled so far, then stops the thread. Idempotent.
    /// Must not be called from a render task.
    pub fn shutdown(&self) {
        {
            let mut closed = self.closed.write().unwrap_or_else(PoisonError::into_inner);
            if *closed {
                return;
            }
            *closed = true;
        }
        let _ = self.tx.send(RenderMsg::Quit);
        let join = self.join.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(join) = join {
            if join.join().is_err() {
                warn!("render thread panicked during shutdown");
            }
        }
        info!("render queue stopped");
    }
}

impl RenderExecutionContext for RenderQueue {
    /// Blocks while a bounded queue is full rather than dropping work, since a
    /// dropped task could leave a stale transform on screen.
    fn schedule(&self, task: RenderTask) -> Result<()> {
        let closed = self.closed.read().unwrap_or_else(PoisonError::into_inner);
        if *closed {
            return Err(Error::RenderContextClosed);
        }
        self.tx
            .send(RenderMsg::Run(task))
            .map_err(|_| Error::RenderContextClosed)
    }
}

impl Drop for RenderQueue {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run(rx: Receiver<RenderMsg>) {
    while let Ok(msg) = rx.recv() {
        match msg {
            RenderMsg::Quit => break,
            RenderMsg::Run(task) => {
                if catch_unwind(AssertUnwindSafe(task)).is_err() {
                    warn!("render task panicked; continuing with next task");
                }
            }
        }
    }
    debug!("render thread exiting");
}
