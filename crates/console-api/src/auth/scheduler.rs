//! Proactive refresh timer.

use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

use super::expiry::expiry_instant;

/// When the next refresh should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPlan {
    Immediate,
    At(DateTime<Utc>),
}

/// Plan a refresh `buffer` ahead of `expires_at`.
///
/// Unparsable expiries count as the epoch and therefore refresh immediately,
/// as does a buffer reaching before the representable range.
pub fn plan_refresh(expires_at: &str, buffer: Duration, now: DateTime<Utc>) -> RefreshPlan {
    let fire_at = chrono::Duration::from_std(buffer)
        .ok()
        .and_then(|buffer| expiry_instant(expires_at).checked_sub_signed(buffer));

    match fire_at {
        Some(at) if at > now => RefreshPlan::At(at),
        _ => RefreshPlan::Immediate,
    }
}

struct Armed {
    id: u64,
    at: DateTime<Utc>,
    handle: JoinHandle<()>,
}

/// Single-slot cancellable timer.
///
/// Arming replaces (and aborts) whatever was armed before. A firing task is
/// expected to [`release`](RefreshTimer::release) its slot so that work it
/// starts can re-arm the timer without aborting itself.
#[derive(Default)]
pub struct RefreshTimer {
    slot: Mutex<Option<Armed>>,
    next_id: AtomicU64,
}

impl std::fmt::Debug for RefreshTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshTimer")
            .field("scheduled_at", &self.scheduled_at())
            .finish()
    }
}

impl RefreshTimer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Armed>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Arm the timer. `make` receives the timer id and builds the task body.
    pub fn arm<F, Fut>(&self, plan: RefreshPlan, make: F) -> u64
    where
        F: FnOnce(u64) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let now = Utc::now();

        let (at, delay) = match plan {
            RefreshPlan::Immediate => (now, None),
            RefreshPlan::At(at) => (at, Some((at - now).to_std().unwrap_or_default())),
        };

        let task = make(id);

        // The slot is filled before the task can observe it, so an immediate
        // task releasing itself always finds its own entry.
        let mut slot = self.lock();
        let handle = tokio::spawn(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            task.await;
        });
        let previous = slot.replace(Armed { id, at, handle });
        drop(slot);

        if let Some(previous) = previous {
            previous.handle.abort();
        }

        tracing::debug!(timer_id = id, scheduled_at = %at, "Refresh timer armed");
        id
    }

    /// Forget the armed task without aborting it, if it is still `id`.
    pub fn release(&self, id: u64) -> bool {
        let mut slot = self.lock();
        if slot.as_ref().is_some_and(|armed| armed.id == id) {
            slot.take();
            true
        } else {
            false
        }
    }

    /// Abort the armed task, if any.
    pub fn cancel(&self) {
        if let Some(armed) = self.lock().take() {
            armed.handle.abort();
            tracing::debug!(timer_id = armed.id, "Refresh timer cancelled");
        }
    }

    pub fn scheduled_at(&self) -> Option<DateTime<Utc>> {
        self.lock().as_ref().map(|armed| armed.at)
    }

    pub fn is_armed(&self) -> bool {
        self.lock().is_some()
    }
}

impl Drop for RefreshTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
