//! Per-tenant write serialization
//!
//! Each tenant id maps to its own fair (FIFO) async mutex. Operations for the
//! same tenant run one at a time in the order they started waiting;
//! operations for different tenants never touch the same mutex.
//!
//! ## Lifecycle
//!
//! ```text
//! acquire(t): slots[t].users += 1 (entry created on demand), wait on mutex
//! run op
//! drop permit: unlock, slots[t].users -= 1, remove entry at zero
//! ```
//!
//! Release happens in `Drop`, so success, error, panic-unwind and
//! cancellation of the waiting future all release the tenant. Each entry
//! counts the permits registered on it; the count changes only under the
//! DashMap shard lock and the entry is removed when it reaches zero, so a
//! concurrent `acquire` either joins the old entry or creates a fresh one.
//!
//! ## Bounded wait
//!
//! Without a timeout a hung operation blocks the tenant indefinitely. With
//! `with_timeout(Some(d))` a caller that cannot acquire within `d` fails with
//! `LockTimeout` and its operation never runs.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, warn};

use dialogdb_core::{Error, Result};

/// One tenant's mutex plus the number of permits (held or waiting) using it
#[derive(Debug, Default)]
struct Slot {
    mutex: Arc<Mutex<()>>,
    users: usize,
}

/// Registry of per-tenant mutexes
#[derive(Debug, Default)]
pub struct TenantLocks {
    slots: DashMap<String, Slot>,
    timeout: Option<Duration>,
}

impl TenantLocks {
    /// Create a registry with unbounded waits
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with an optional bounded wait
    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        Self {
            slots: DashMap::new(),
            timeout,
        }
    }

    /// Configured wait bound
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Run `op` while holding `tenant`'s lock
    ///
    /// The lock is released whether `op` succeeds or fails; its error is
    /// returned unchanged.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let table = locks
    ///     .with_lock("tenant_1", || async {
    ///         if store.exists(&key)? {
    ///             return Err(Error::AlreadyExists { kind: "table", id });
    ///         }
    ///         store.put_record(&key, &meta)
    ///     })
    ///     .await?;
    /// ```
    pub async fn with_lock<F, Fut, T>(&self, tenant: &str, op: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let permit = self.acquire(tenant).await?;
        let result = op().await;
        drop(permit);
        result
    }

    /// Wait for `tenant`'s lock and hold it until the permit is dropped
    pub async fn acquire(&self, tenant: &str) -> Result<TenantPermit<'_>> {
        let mutex = {
            let mut slot = self.slots.entry(tenant.to_string()).or_default();
            slot.users += 1;
            Arc::clone(&slot.mutex)
        };
        // From here on the permit's Drop undoes the registration, including
        // when this future is cancelled while waiting.
        let mut permit = TenantPermit {
            locks: self,
            tenant: tenant.to_string(),
            guard: None,
        };

        if let Ok(guard) = Arc::clone(&mutex).try_lock_owned() {
            permit.guard = Some(guard);
            return Ok(permit);
        }

        debug!(target: "dialogdb::lock", tenant, "Waiting for tenant lock");
        let started = Instant::now();
        let guard = match self.timeout {
            None => mutex.lock_owned().await,
            Some(limit) => match tokio::time::timeout(limit, mutex.lock_owned()).await {
                Ok(guard) => guard,
                Err(_) => {
                    let waited_ms = started.elapsed().as_millis() as u64;
                    warn!(target: "dialogdb::lock", tenant, waited_ms, "Tenant lock wait timed out");
                    return Err(Error::LockTimeout {
                        tenant: tenant.to_string(),
                        waited_ms,
                    });
                }
            },
        };
        permit.guard = Some(guard);
        Ok(permit)
    }

    /// Number of tenants with a live lock entry (held or awaited)
    pub fn active_tenants(&self) -> usize {
        self.slots.len()
    }

    fn release(&self, tenant: &str) {
        if let Entry::Occupied(mut slot) = self.slots.entry(tenant.to_string()) {
            slot.get_mut().users -= 1;
            if slot.get().users == 0 {
                slot.remove();
            }
        }
    }
}

/// Proof of holding a tenant's lock; releases on drop
pub struct TenantPermit<'a> {
    locks: &'a TenantLocks,
    tenant: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl TenantPermit<'_> {
    /// Tenant this permit belongs to
    pub fn tenant(&self) -> &str {
        &self.tenant
    }
}

impl std::fmt::Debug for TenantPermit<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantPermit")
            .field("tenant", &self.tenant)
            .field("held", &self.guard.is_some())
            .finish()
    }
}

impl Drop for TenantPermit<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.locks.release(&self.tenant);
    }
}
