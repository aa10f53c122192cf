use std::sync::Arc;

use syncreq_bridge::{BridgeReceipt, JobScheduler, TransferWorker};
use syncreq_contract::{AccountRef, CreatedBy, JobId, LocalBehaviour, RemoteFile};

use crate::collaborators::{AccountResolver, ConditionSensors, FailedUploadQuery};
use crate::conditions;
use crate::dispatcher::Dispatcher;
use crate::error::RequestError;
use crate::scheduler::DeferredScheduler;

/// Single entry point for upload, update and retry requests, and for
/// transfers deferred to the platform scheduler.
#[derive(Clone)]
pub struct TransferRequester {
    pub(crate) dispatcher: Dispatcher,
    pub(crate) scheduler: DeferredScheduler,
    pub(crate) accounts: Arc<dyn AccountResolver>,
    pub(crate) failed_uploads: Arc<dyn FailedUploadQuery>,
    pub(crate) sensors: Arc<dyn ConditionSensors>,
}

impl TransferRequester {
    pub fn new(
        worker: Arc<dyn TransferWorker>,
        platform: Arc<dyn JobScheduler>,
        accounts: Arc<dyn AccountResolver>,
        failed_uploads: Arc<dyn FailedUploadQuery>,
        sensors: Arc<dyn ConditionSensors>,
    ) -> Self {
        Self {
            dispatcher: Dispatcher::new(worker),
            scheduler: DeferredScheduler::new(platform),
            accounts,
            failed_uploads,
            sensors,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn upload_new_batch(
        &self,
        account: &AccountRef,
        local_paths: Vec<String>,
        remote_paths: Vec<String>,
        mime_types: Vec<String>,
        behaviour: LocalBehaviour,
        create_remote_folder: bool,
        created_by: CreatedBy,
    ) -> Result<BridgeReceipt, RequestError> {
        self.dispatcher.upload_new_batch(
            account,
            local_paths,
            remote_paths,
            mime_types,
            behaviour,
            create_remote_folder,
            created_by,
        )
    }

    /// `create_remote_folder` asks the worker to create missing parent
    /// folders of `remote_path`.
    #[allow(clippy::too_many_arguments)]
    pub fn upload_new_single(
        &self,
        account: &AccountRef,
        local_path: &str,
        remote_path: &str,
        behaviour: LocalBehaviour,
        mime_type: &str,
        create_remote_folder: bool,
        created_by: CreatedBy,
    ) -> Result<BridgeReceipt, RequestError> {
        self.dispatcher.upload_new_single(
            account,
            local_path,
            remote_path,
            behaviour,
            mime_type,
            create_remote_folder,
            created_by,
        )
    }

    pub fn upload_update_batch(
        &self,
        account: &AccountRef,
        existing_files: Vec<RemoteFile>,
        behaviour: LocalBehaviour,
        force_overwrite: bool,
    ) -> Result<BridgeReceipt, RequestError> {
        self.dispatcher
            .upload_update_batch(account, existing_files, behaviour, force_overwrite)
    }

    pub fn upload_update_single(
        &self,
        account: &AccountRef,
        existing_file: RemoteFile,
        behaviour: LocalBehaviour,
        force_overwrite: bool,
    ) -> Result<BridgeReceipt, RequestError> {
        self.dispatcher
            .upload_update_single(account, existing_file, behaviour, force_overwrite)
    }

    pub fn should_schedule_retry(&self) -> bool {
        conditions::should_schedule_retry(self.sensors.as_ref())
    }

    pub fn schedule_upload(
        &self,
        job_id: JobId,
        account_name: &str,
        remote_path: &str,
    ) -> Result<bool, RequestError> {
        self.scheduler.schedule_upload(job_id, account_name, remote_path)
    }

    pub fn schedule_download(
        &self,
        job_id: JobId,
        remote_path: &str,
        account_name: &str,
    ) -> Result<bool, RequestError> {
        self.scheduler.schedule_download(job_id, remote_path, account_name)
    }
}
