use std::sync::Arc;

use syncreq_bridge::JobScheduler;
use syncreq_contract::{DeferredJob, JobId, RetryService};
use tracing::debug;

use crate::error::RequestError;

/// Registers retries that run later, on an unmetered network, and survive
/// device restarts.
#[derive(Clone)]
pub struct DeferredScheduler {
    platform: Arc<dyn JobScheduler>,
}

impl DeferredScheduler {
    pub fn new(platform: Arc<dyn JobScheduler>) -> Self {
        Self { platform }
    }

    /// Returns `false` when the platform has no deferred jobs.
    pub fn schedule_upload(
        &self,
        job_id: JobId,
        account_name: &str,
        remote_path: &str,
    ) -> Result<bool, RequestError> {
        let scheduled =
            self.schedule_transfer(RetryService::RetryUpload, job_id, remote_path, account_name)?;
        if scheduled {
            debug!(
                job_id,
                remote_path,
                account = account_name,
                "scheduled upload retry for {remote_path} in {account_name}"
            );
        }
        Ok(scheduled)
    }

    /// Note the argument order differs from [`Self::schedule_upload`].
    pub fn schedule_download(
        &self,
        job_id: JobId,
        remote_path: &str,
        account_name: &str,
    ) -> Result<bool, RequestError> {
        let scheduled = self.schedule_transfer(
            RetryService::RetryDownload,
            job_id,
            remote_path,
            account_name,
        )?;
        if scheduled {
            debug!(
                job_id,
                remote_path,
                account = account_name,
                "scheduled download retry for {remote_path} in {account_name}"
            );
        }
        Ok(scheduled)
    }

    fn schedule_transfer(
        &self,
        service: RetryService,
        job_id: JobId,
        remote_path: &str,
        account_name: &str,
    ) -> Result<bool, RequestError> {
        if !self.platform.supports_deferred_jobs() {
            return Ok(false);
        }

        self.platform
            .schedule(DeferredJob::retry(service, job_id, remote_path, account_name))?;
        Ok(true)
    }
}
