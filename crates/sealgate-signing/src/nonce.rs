//! In-process nonce store.
//!
//! `InMemoryNonceStore` keeps consumed nonces in a mutex-guarded map, so
//! check-and-insert happens under one lock acquisition and two concurrent
//! reservations of the same nonce cannot both succeed.
//!
//! State is per process.  Behind a load balancer with several instances a
//! replay sent to a different instance would go unnoticed; such deployments
//! must inject a `NonceStore` backed by a shared store instead.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tokio::{sync::Notify, task::JoinHandle, time::MissedTickBehavior};
use tracing::{debug, info, warn};

use sealgate_contracts::error::{SealgateError, SealgateResult};
use sealgate_core::{
    traits::{Clock, NonceStore},
    SystemClock,
};

/// Upper bound on live records before reservations are refused.
pub const DEFAULT_NONCE_CAPACITY: usize = 100_000;

/// How often the background sweeper runs by default.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

// ── Internal mutable state ────────────────────────────────────────────────────

struct NonceState {
    /// nonce -> expiry, epoch milliseconds
    records: HashMap<String, i64>,
    closed: bool,
}

struct Sweeper {
    stop: Arc<Notify>,
    task: JoinHandle<()>,
}

// ── Public store ──────────────────────────────────────────────────────────────

/// Mutex-guarded nonce map with a tokio sweeper.
pub struct InMemoryNonceStore {
    state: Mutex<NonceState>,
    clock: Arc<dyn Clock>,
    capacity: usize,
    sweeper: Mutex<Option<Sweeper>>,
}

impl InMemoryNonceStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock), DEFAULT_NONCE_CAPACITY)
    }

    pub fn with_clock(clock: Arc<dyn Clock>, capacity: usize) -> Self {
        Self {
            state: Mutex::new(NonceState {
                records: HashMap::new(),
                closed: false,
            }),
            clock,
            capacity,
            sweeper: Mutex::new(None),
        }
    }

    /// Spawn the periodic sweep on the current tokio runtime.
    ///
    /// The task holds only a weak reference, so dropping the last `Arc` also
    /// ends it.  Calling this twice replaces the previous sweeper.
    pub fn start_sweeper(self: &Arc<Self>, interval: Duration) -> SealgateResult<()> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            SealgateError::Configuration {
                reason: format!("nonce sweeper needs a tokio runtime: {}", e),
            }
        })?;

        let stop = Arc::new(Notify::new());
        let weak: Weak<Self> = Arc::downgrade(self);
        let task = runtime.spawn(sweep_loop(weak, interval, Arc::clone(&stop)));

        let mut slot = self.sweeper.lock().map_err(|e| SealgateError::NonceStoreUnavailable {
            reason: format!("sweeper lock poisoned: {}", e),
        })?;
        if let Some(previous) = slot.replace(Sweeper { stop, task }) {
            previous.stop.notify_one();
        }

        info!(interval_ms = interval.as_millis() as u64, "nonce sweeper started");
        Ok(())
    }

    /// Number of records currently held, expired or not.
    pub fn len(&self) -> usize {
        self.state.lock().map(|s| s.records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a background sweeper is attached and still running.
    pub fn sweeper_running(&self) -> bool {
        self.sweeper
            .lock()
            .map(|s| s.as_ref().is_some_and(|sw| !sw.task.is_finished()))
            .unwrap_or(false)
    }
}

impl Default for InMemoryNonceStore {
    fn default() -> Self {
        Self::new()
    }
}

async fn sweep_loop(store: Weak<InMemoryNonceStore>, interval: Duration, stop: Arc<Notify>) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick completes immediately; skip it so the first sweep
    // happens one interval after start.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let Some(store) = store.upgrade() else { break };
                store.sweep();
            }
            _ = stop.notified() => break,
        }
    }
    debug!("nonce sweeper stopped");
}

// ── NonceStore impl ───────────────────────────────────────────────────────────

impl NonceStore for InMemoryNonceStore {
    /// Reserve `nonce` until `now + ttl`.
    ///
    /// A poisoned lock, a closed store, or a store still at capacity after
    /// purging expired records all refuse the reservation with an error.
    fn reserve(&self, nonce: &str, ttl: Duration) -> SealgateResult<bool> {
        let mut state = self.state.lock().map_err(|e| SealgateError::NonceStoreUnavailable {
            reason: format!("nonce state lock poisoned: {}", e),
        })?;

        if state.closed {
            return Err(SealgateError::NonceStoreUnavailable {
                reason: "nonce store has been shut down".to_string(),
            });
        }

        let now = self.clock.now_ms();
        if let Some(&expires_at) = state.records.get(nonce) {
            if expires_at > now {
                return Ok(false);
            }
        }

        if state.records.len() >= self.capacity {
            state.records.retain(|_, expires_at| *expires_at > now);
            if state.records.len() >= self.capacity {
                warn!(capacity = self.capacity, "nonce store saturated, refusing reservation");
                return Err(SealgateError::NonceStoreUnavailable {
                    reason: format!("nonce store at capacity ({})", self.capacity),
                });
            }
        }

        // At least one millisecond, so a record never expires on insert.
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX).max(1);
        state
            .records
            .insert(nonce.to_string(), now.saturating_add(ttl_ms));
        Ok(true)
    }

    fn sweep(&self) -> usize {
        let Ok(mut state) = self.state.lock() else {
            return 0;
        };
        let now = self.clock.now_ms();
        let before = state.records.len();
        state.records.retain(|_, expires_at| *expires_at > now);
        let removed = before - state.records.len();
        if removed > 0 {
            debug!(removed, remaining = state.records.len(), "expired nonces swept");
        }
        removed
    }

    fn shutdown(&self) {
        if let Ok(mut slot) = self.sweeper.lock() {
            if let Some(sweeper) = slot.take() {
                sweeper.stop.notify_one();
            }
        }
        if let Ok(mut state) = self.state.lock() {
            state.closed = true;
            state.records.clear();
        }
        info!("nonce store shut down");
    }
}
