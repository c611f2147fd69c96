//! Debounced last-writer-wins scheduling for editor autosave.
//!
//! [`DebouncedLatest`] coalesces rapid successive updates to a value into a
//! single delayed flush, while guaranteeing that only the most recently
//! scheduled value survives. An optional comparator suppresses flushes whose
//! value equals the last-committed baseline (type-then-undo produces no
//! save). Explicit `flush`/`cancel`/`reset` give callers deterministic
//! control around navigation and unmount.
//!
//! Timer-initiated flushes run on a spawned task; their failures are
//! reported through a subscribable [`FlushEvent`] channel rather than being
//! lost, while a manual [`flush`](DebouncedLatest::flush) returns its error
//! directly.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::debug;

use annota_core::defaults::FLUSH_EVENT_CAPACITY;
use annota_core::Result;

type FlushFn<T> = dyn Fn(T) -> BoxFuture<'static, Result<()>> + Send + Sync;
type EqFn<T> = dyn Fn(&T, &T) -> bool + Send + Sync;

/// Outcome of a flush cycle, observable via
/// [`subscribe`](DebouncedLatest::subscribe).
#[derive(Debug, Clone)]
pub enum FlushEvent {
    /// A flush completed and the baseline advanced.
    Flushed,
    /// A timer-initiated flush failed. Manual `flush()` calls report their
    /// error through the return value instead.
    Failed(String),
}

struct State<T> {
    pending: Option<T>,
    last_flushed: Option<T>,
    timer: Option<JoinHandle<()>>,
    /// Bumped by every schedule/cancel/reset so a stale timer firing late
    /// can detect it has been superseded.
    epoch: u64,
}

struct Inner<T> {
    delay: Duration,
    on_flush: Box<FlushFn<T>>,
    is_equal: Option<Box<EqFn<T>>>,
    state: Mutex<State<T>>,
    events: broadcast::Sender<FlushEvent>,
}

impl<T: Clone + Send + 'static> Inner<T> {
    fn should_skip(&self, last_flushed: &Option<T>, next: &T) -> bool {
        match (&self.is_equal, last_flushed) {
            (Some(eq), Some(base)) => eq(base, next),
            _ => false,
        }
    }

    /// Flush the pending value, if any.
    ///
    /// `timer_epoch` is set on the timer path: a stale timer (superseded by
    /// a later schedule/cancel) backs out without touching state. Pending
    /// and timer state are cleared synchronously *before* the callback is
    /// awaited, so a `schedule()` arriving during an in-flight flush starts
    /// a fresh, independent cycle.
    async fn flush_now(inner: &Arc<Inner<T>>, timer_epoch: Option<u64>) -> Result<()> {
        let next = {
            let mut state = inner.state.lock().expect("debounce state poisoned");
            match timer_epoch {
                Some(epoch) => {
                    if state.epoch != epoch {
                        return Ok(());
                    }
                    state.timer = None;
                }
                None => {
                    // Clear the timer eagerly so the timer and a manual
                    // flush cannot both fire for the same pending value.
                    if let Some(handle) = state.timer.take() {
                        handle.abort();
                    }
                }
            }

            let Some(next) = state.pending.take() else {
                return Ok(());
            };
            if inner.should_skip(&state.last_flushed, &next) {
                // Keep baseline as-is.
                return Ok(());
            }
            next
        };

        (inner.on_flush)(next.clone()).await?;

        {
            let mut state = inner.state.lock().expect("debounce state poisoned");
            state.last_flushed = Some(next);
        }
        let _ = inner.events.send(FlushEvent::Flushed);
        Ok(())
    }
}

/// Debounces writes of the latest value and provides an explicit flush API.
///
/// State machine per instance: `Idle` → `schedule(next)` → `Scheduled`
/// (timer armed). A further `schedule` re-arms the timer with the new value
/// — last-writer-wins, intermediate values are discarded. The timer firing,
/// or an explicit `flush()`, invokes the flush callback and returns to
/// `Idle`; `cancel()` discards pending work without side effects.
///
/// Cloning shares the underlying instance. Callers must `cancel()` when the
/// owning component goes away; an armed timer otherwise still fires.
pub struct DebouncedLatest<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for DebouncedLatest<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone + Send + 'static> DebouncedLatest<T> {
    /// Create a scheduler without equality suppression.
    pub fn new<F>(delay: Duration, on_flush: F) -> Self
    where
        F: Fn(T) -> BoxFuture<'static, Result<()>> + Send + Sync + 'static,
    {
        Self::build(delay, Box::new(on_flush), None)
    }

    /// Create a scheduler that suppresses values equal to the last-flushed
    /// baseline (checked against `last_flushed`, not the most recently
    /// scheduled value — only a return-to-baseline is suppressed).
    pub fn with_comparator<F, E>(delay: Duration, on_flush: F, is_equal: E) -> Self
    where
        F: Fn(T) -> BoxFuture<'static, Result<()>> + Send + Sync + 'static,
        E: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        Self::build(delay, Box::new(on_flush), Some(Box::new(is_equal)))
    }

    fn build(delay: Duration, on_flush: Box<FlushFn<T>>, is_equal: Option<Box<EqFn<T>>>) -> Self {
        let (events, _) = broadcast::channel(FLUSH_EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                delay,
                on_flush,
                is_equal,
                state: Mutex::new(State {
                    pending: None,
                    last_flushed: None,
                    timer: None,
                    epoch: 0,
                }),
                events,
            }),
        }
    }

    /// Subscribe to flush outcomes (notably timer-path failures).
    pub fn subscribe(&self) -> broadcast::Receiver<FlushEvent> {
        self.inner.events.subscribe()
    }

    /// Record `next` as the pending value and (re-)arm the flush timer.
    ///
    /// If `next` equals the last-flushed baseline, pending work is discarded
    /// and no timer is armed.
    pub fn schedule(&self, next: T) {
        let mut state = self.inner.state.lock().expect("debounce state poisoned");
        state.epoch = state.epoch.wrapping_add(1);
        if let Some(handle) = state.timer.take() {
            handle.abort();
        }

        if self.inner.should_skip(&state.last_flushed, &next) {
            state.pending = None;
            debug!(
                subsystem = "bridge",
                component = "debounce",
                op = "schedule",
                "Value equals baseline, pending work discarded"
            );
            return;
        }

        state.pending = Some(next);
        let epoch = state.epoch;
        let inner = self.inner.clone();
        state.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(inner.delay).await;
            if let Err(e) = Inner::flush_now(&inner, Some(epoch)).await {
                let _ = inner.events.send(FlushEvent::Failed(e.to_string()));
            }
        }));
    }

    /// Flush the pending value immediately.
    ///
    /// Clears the timer first, then runs the flush callback if a pending
    /// value exists; a flush with nothing pending is a no-op. Resolves after
    /// the callback completes.
    pub async fn flush(&self) -> Result<()> {
        Inner::flush_now(&self.inner, None).await
    }

    /// Discard pending work without flushing.
    pub fn cancel(&self) {
        let mut state = self.inner.state.lock().expect("debounce state poisoned");
        state.epoch = state.epoch.wrapping_add(1);
        if let Some(handle) = state.timer.take() {
            handle.abort();
        }
        state.pending = None;
    }

    /// Cancel pending work and set a new equality baseline without flushing
    /// (e.g. after loading a different note).
    pub fn reset(&self, base: T) {
        let mut state = self.inner.state.lock().expect("debounce state poisoned");
        state.epoch = state.epoch.wrapping_add(1);
        if let Some(handle) = state.timer.take() {
            handle.abort();
        }
        state.pending = None;
        state.last_flushed = Some(base);
    }

    /// The currently pending value, if any.
    pub fn pending(&self) -> Option<T> {
        self.inner
            .state
            .lock()
            .expect("debounce state poisoned")
            .pending
            .clone()
    }
}
