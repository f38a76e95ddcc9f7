//! Admission control for concurrent analyses.
//!
//! A single [`AdmissionController`] is shared process-wide. It tracks the
//! job ids currently holding a slot together with the instant they were
//! admitted. Slots older than the staleness window are reclaimed on the next
//! admission attempt, so a job that never releases cannot block the system
//! forever.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use formlab_core::{defaults, JobId};

/// Configuration for the admission controller.
#[derive(Debug, Clone)]
pub struct AdmissionConfig {
    /// Maximum number of analyses holding a slot at once.
    pub max_concurrent: usize,
    /// Age after which an unreleased slot is reclaimed.
    pub stale_after: Duration,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            max_concurrent: defaults::MAX_CONCURRENT_ANALYSES,
            stale_after: Duration::from_secs(defaults::ADMISSION_STALE_AFTER_SECS),
        }
    }
}

impl AdmissionConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `ANALYSIS_MAX_CONCURRENT` | `3` | Concurrent analysis ceiling |
    /// | `ANALYSIS_STALE_AFTER_SECS` | `1800` | Slot staleness window |
    pub fn from_env() -> Self {
        let max_concurrent = std::env::var("ANALYSIS_MAX_CONCURRENT")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults::MAX_CONCURRENT_ANALYSES)
            .max(1);

        let stale_after_secs = std::env::var("ANALYSIS_STALE_AFTER_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::ADMISSION_STALE_AFTER_SECS);

        Self {
            max_concurrent,
            stale_after: Duration::from_secs(stale_after_secs),
        }
    }

    /// Set the concurrency ceiling.
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max;
        self
    }

    /// Set the staleness window.
    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }
}

/// An admission attempt that found every slot taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rejection {
    pub active: usize,
    pub capacity: usize,
}

/// Bounded set of in-flight analyses.
#[derive(Debug)]
pub struct AdmissionController {
    config: AdmissionConfig,
    active: Mutex<HashMap<JobId, Instant>>,
}

impl Default for AdmissionController {
    fn default() -> Self {
        Self::new(AdmissionConfig::default())
    }
}

impl AdmissionController {
    pub fn new(config: AdmissionConfig) -> Self {
        Self {
            config,
            active: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &AdmissionConfig {
        &self.config
    }

    // The map is never left half-updated, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, HashMap<JobId, Instant>> {
        self.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn reclaim_stale(&self, active: &mut HashMap<JobId, Instant>, now: Instant) {
        let stale_after = self.config.stale_after;
        active.retain(|job_id, admitted_at| {
            let age = now.saturating_duration_since(*admitted_at);
            if age >= stale_after {
                warn!(
                    job_id = %job_id,
                    age_secs = age.as_secs(),
                    "Reclaiming stale admission slot"
                );
                false
            } else {
                true
            }
        });
    }

    fn admit_locked(&self, job_id: &JobId) -> Result<bool, Rejection> {
        let now = Instant::now();
        let mut active = self.lock();
        self.reclaim_stale(&mut active, now);

        if let Some(admitted_at) = active.get_mut(job_id) {
            *admitted_at = now;
            debug!(job_id = %job_id, "Refreshed admission slot");
            return Ok(false);
        }

        if active.len() >= self.config.max_concurrent {
            return Err(Rejection {
                active: active.len(),
                capacity: self.config.max_concurrent,
            });
        }

        active.insert(job_id.clone(), now);
        debug!(
            job_id = %job_id,
            active_slots = active.len(),
            capacity = self.config.max_concurrent,
            "Admitted analysis"
        );
        Ok(true)
    }

    /// Try to take a slot for `job_id`.
    ///
    /// Re-admitting an id that already holds a slot refreshes its timestamp
    /// and succeeds without consuming a second slot.
    pub fn try_admit(&self, job_id: &JobId) -> bool {
        self.admit_locked(job_id).is_ok()
    }

    /// Take a slot that is released when the returned guard drops.
    ///
    /// An id that already holds a slot is refreshed, but the returned guard
    /// does not own it: only the guard from the original admission releases.
    pub fn acquire(self: &Arc<Self>, job_id: &JobId) -> Result<AdmissionSlot, Rejection> {
        let owned = self.admit_locked(job_id)?;
        Ok(AdmissionSlot {
            controller: Arc::clone(self),
            job_id: job_id.clone(),
            owned,
        })
    }

    /// Free the slot held by `job_id`. Idempotent.
    pub fn release(&self, job_id: &JobId) {
        let mut active = self.lock();
        if active.remove(job_id).is_some() {
            debug!(job_id = %job_id, active_slots = active.len(), "Released admission slot");
        }
    }

    /// Number of live (non-stale) slots.
    pub fn active_count(&self) -> usize {
        let now = Instant::now();
        let mut active = self.lock();
        self.reclaim_stale(&mut active, now);
        active.len()
    }

    pub fn capacity(&self) -> usize {
        self.config.max_concurrent
    }

    pub fn is_admitted(&self, job_id: &JobId) -> bool {
        self.lock().contains_key(job_id)
    }
}

/// RAII guard for an admission slot.
#[derive(Debug)]
pub struct AdmissionSlot {
    controller: Arc<AdmissionController>,
    job_id: JobId,
    owned: bool,
}

impl AdmissionSlot {
    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }
}

impl Drop for AdmissionSlot {
    fn drop(&mut self) {
        if self.owned {
            self.controller.release(&self.job_id);
        }
    }
}
