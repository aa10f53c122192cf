use syncreq_bridge::BridgeReceipt;
use syncreq_contract::{AccountRef, JobId, PersistedUpload, UploadResult};
use tracing::{debug, warn};

use crate::error::RequestError;
use crate::query::FailedUploadFilter;
use crate::requester::TransferRequester;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryOutcome {
    /// Handed to the worker right away.
    Dispatched(BridgeReceipt),
    /// Left to the platform scheduler under `job_id`.
    Deferred { job_id: JobId },
}

impl TransferRequester {
    /// Retries one stored upload in the account it was made for.
    pub fn retry(&self, upload: &PersistedUpload) -> Result<BridgeReceipt, RequestError> {
        if upload.account_name.trim().is_empty() {
            return Err(RequestError::InvalidArgument(format!(
                "upload {} has no account name",
                upload.upload_id
            )));
        }
        if upload.remote_path.trim().is_empty() {
            return Err(RequestError::InvalidArgument(format!(
                "upload {} has no remote path",
                upload.upload_id
            )));
        }

        let account = self
            .accounts
            .resolve(&upload.account_name)
            .ok_or_else(|| RequestError::UnknownAccount(upload.account_name.clone()))?;
        self.dispatcher.upload_retry(&account, upload)
    }

    /// Retries every stored failed upload matching both filters; `None`
    /// matches anything. Returns how many retries were handed to the worker.
    ///
    /// Records whose account no longer resolves are skipped with a warning,
    /// so the count can be lower than the number of matching records.
    pub fn retry_failed(
        &self,
        account: Option<&AccountRef>,
        result: Option<UploadResult>,
    ) -> Result<usize, RequestError> {
        let filter = FailedUploadFilter::new(account.map(|account| account.name.as_str()), result);
        let mut current: Option<(String, Option<AccountRef>)> = None;
        let mut retried = 0;
        let mut skipped = 0;

        for upload in self.failed_uploads.failed_uploads() {
            if !filter.matches(&upload) {
                continue;
            }

            let cached = matches!(&current, Some((name, _)) if *name == upload.account_name);
            if !cached {
                let resolved = self.accounts.resolve(&upload.account_name);
                current = Some((upload.account_name.clone(), resolved));
            }

            let Some((_, Some(account))) = current.as_ref() else {
                warn!(
                    upload_id = upload.upload_id,
                    account = %upload.account_name,
                    "skipping failed upload of unknown account"
                );
                skipped += 1;
                continue;
            };

            if self.retry_one(account, Some(&upload))?.is_some() {
                retried += 1;
            }
        }

        debug!(retried, skipped, "failed uploads handed back to the worker");
        Ok(retried)
    }

    /// `None` is accepted and ignored so bulk passes survive stale rows.
    pub fn retry_one(
        &self,
        account: &AccountRef,
        upload: Option<&PersistedUpload>,
    ) -> Result<Option<BridgeReceipt>, RequestError> {
        upload
            .map(|upload| self.dispatcher.upload_retry(account, upload))
            .transpose()
    }

    /// Defers the retry to the scheduler when the device is offline or idle,
    /// otherwise retries right away. Platforms without deferred jobs always
    /// retry right away.
    pub fn retry_or_schedule(
        &self,
        job_id: JobId,
        upload: &PersistedUpload,
    ) -> Result<RetryOutcome, RequestError> {
        if self.should_schedule_retry()
            && self
                .scheduler
                .schedule_upload(job_id, &upload.account_name, &upload.remote_path)?
        {
            return Ok(RetryOutcome::Deferred { job_id });
        }

        self.retry(upload).map(RetryOutcome::Dispatched)
    }
}
