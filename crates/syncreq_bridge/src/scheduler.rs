use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use syncreq_contract::{DeferredJob, JobId};
use tracing::debug;

use crate::worker::BridgeError;

/// First platform API level with constraint-based deferred jobs.
pub const MIN_DEFERRED_JOB_API_LEVEL: u32 = 21;

/// Platform scheduler for constraint-gated jobs that outlive the process.
///
/// Scheduling a `job_id` that is already pending replaces the pending job.
pub trait JobScheduler: Send + Sync {
    fn supports_deferred_jobs(&self) -> bool;

    fn schedule(&self, job: DeferredJob) -> Result<(), BridgeError>;
}

/// Process-wide registry of pending jobs keyed by id.
#[derive(Debug)]
pub struct InMemoryJobScheduler {
    api_level: u32,
    jobs: Mutex<BTreeMap<JobId, DeferredJob>>,
}

impl InMemoryJobScheduler {
    pub fn new(api_level: u32) -> Self {
        Self::with_jobs(api_level, Vec::new())
    }

    /// Starts with jobs restored from persistent storage.
    pub fn with_jobs(api_level: u32, jobs: impl IntoIterator<Item = DeferredJob>) -> Self {
        Self {
            api_level,
            jobs: Mutex::new(jobs.into_iter().map(|job| (job.job_id, job)).collect()),
        }
    }

    pub fn pending(&self) -> Vec<DeferredJob> {
        self.read_jobs().values().cloned().collect()
    }

    pub fn get(&self, job_id: JobId) -> Option<DeferredJob> {
        self.read_jobs().get(&job_id).cloned()
    }

    /// Reads see the last committed map even after a writer panicked.
    fn read_jobs(&self) -> MutexGuard<'_, BTreeMap<JobId, DeferredJob>> {
        self.jobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn cancel(&self, job_id: JobId) -> Result<bool, BridgeError> {
        let mut jobs = self
            .jobs
            .lock()
            .map_err(|_| BridgeError::SchedulerUnavailable)?;
        Ok(jobs.remove(&job_id).is_some())
    }
}

impl JobScheduler for InMemoryJobScheduler {
    fn supports_deferred_jobs(&self) -> bool {
        self.api_level >= MIN_DEFERRED_JOB_API_LEVEL
    }

    fn schedule(&self, job: DeferredJob) -> Result<(), BridgeError> {
        if !self.supports_deferred_jobs() {
            return Err(BridgeError::SchedulerUnavailable);
        }

        let mut jobs = self
            .jobs
            .lock()
            .map_err(|_| BridgeError::SchedulerUnavailable)?;
        if let Some(previous) = jobs.insert(job.job_id, job) {
            debug!(
                job_id = previous.job_id,
                service = previous.service.as_str(),
                "replaced pending deferred job"
            );
        }
        Ok(())
    }
}
