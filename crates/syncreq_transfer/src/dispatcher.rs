use std::sync::Arc;

use syncreq_bridge::{BridgeReceipt, TransferWorker};
use syncreq_contract::{
    AccountRef, CreatedBy, LocalBehaviour, PersistedUpload, RemoteFile, RetryRequest,
    UpdateRequest, UploadMessage, UploadRequest, UploaderCommand,
};
use tracing::debug;

use crate::error::RequestError;

/// Packs requests into worker commands and hands them over without waiting
/// for the transfer.
#[derive(Clone)]
pub struct Dispatcher {
    worker: Arc<dyn TransferWorker>,
}

impl Dispatcher {
    pub fn new(worker: Arc<dyn TransferWorker>) -> Self {
        Self { worker }
    }

    /// Uploads several new files as one batch. Paths and mime types are
    /// paired by position and must all have the same non-zero length.
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
        if local_paths.is_empty() {
            return Err(RequestError::InvalidArgument(
                "at least one local path is required".to_string(),
            ));
        }
        if remote_paths.len() != local_paths.len() || mime_types.len() != local_paths.len() {
            return Err(RequestError::InvalidArgument(format!(
                "{} local paths, {} remote paths and {} mime types cannot be paired",
                local_paths.len(),
                remote_paths.len(),
                mime_types.len()
            )));
        }

        self.submit(UploadMessage::New(UploadRequest {
            account: account.clone(),
            local_paths,
            remote_paths,
            mime_types,
            local_behaviour: behaviour,
            create_remote_folder,
            created_by,
        }))
    }

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
        self.upload_new_batch(
            account,
            vec![local_path.to_string()],
            vec![remote_path.to_string()],
            vec![mime_type.to_string()],
            behaviour,
            create_remote_folder,
            created_by,
        )
    }

    /// Uploads new content over files that already exist remotely.
    pub fn upload_update_batch(
        &self,
        account: &AccountRef,
        existing_files: Vec<RemoteFile>,
        behaviour: LocalBehaviour,
        force_overwrite: bool,
    ) -> Result<BridgeReceipt, RequestError> {
        if existing_files.is_empty() {
            return Err(RequestError::InvalidArgument(
                "at least one existing file is required".to_string(),
            ));
        }

        self.submit(UploadMessage::Update(UpdateRequest {
            account: account.clone(),
            existing_files,
            local_behaviour: behaviour,
            force_overwrite,
        }))
    }

    pub fn upload_update_single(
        &self,
        account: &AccountRef,
        existing_file: RemoteFile,
        behaviour: LocalBehaviour,
        force_overwrite: bool,
    ) -> Result<BridgeReceipt, RequestError> {
        self.upload_update_batch(account, vec![existing_file], behaviour, force_overwrite)
    }

    pub fn upload_retry(
        &self,
        account: &AccountRef,
        upload: &PersistedUpload,
    ) -> Result<BridgeReceipt, RequestError> {
        self.submit(UploadMessage::Retry(RetryRequest {
            account: account.clone(),
            upload: upload.clone(),
        }))
    }

    fn submit(&self, message: UploadMessage) -> Result<BridgeReceipt, RequestError> {
        let kind = message.kind();
        let account = message.account().name.clone();
        let receipt = self.worker.submit(UploaderCommand::from(message))?;
        debug!(
            kind,
            account = %account,
            message_id = %receipt.message_id,
            "upload command dispatched"
        );
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{account, RecordingWorker};
    use std::sync::atomic::Ordering;
    use syncreq_bridge::BridgeError;
    use syncreq_contract::UploadResult;

    fn dispatcher() -> (Dispatcher, Arc<RecordingWorker>) {
        let worker = Arc::new(RecordingWorker::default());
        (Dispatcher::new(worker.clone()), worker)
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    #[test]
    fn batch_is_submitted_as_one_command_in_order() {
        let (dispatcher, worker) = dispatcher();
        dispatcher
            .upload_new_batch(
                &account("me@host"),
                strings(&["/sd/1.jpg", "/sd/2.jpg"]),
                strings(&["/Photos/1.jpg", "/Photos/2.jpg"]),
                strings(&["image/jpeg", "image/png"]),
                LocalBehaviour::Move,
                false,
                CreatedBy::INSTANT_PICTURE,
            )
            .expect("dispatch");

        let commands = worker.commands();
        assert_eq!(commands.len(), 1);
        let command = &commands[0];
        assert_eq!(
            command.local_file.as_deref(),
            Some(&strings(&["/sd/1.jpg", "/sd/2.jpg"])[..])
        );
        assert_eq!(
            command.remote_file.as_deref(),
            Some(&strings(&["/Photos/1.jpg", "/Photos/2.jpg"])[..])
        );
        assert_eq!(
            command.mime_type.as_deref(),
            Some(&strings(&["image/jpeg", "image/png"])[..])
        );
        assert_eq!(command.local_behaviour, Some(LocalBehaviour::Move));
        assert_eq!(command.create_remote_folder, Some(false));
        assert_eq!(command.created_by, Some(CreatedBy::INSTANT_PICTURE));
        assert_eq!(command.file, None);
        assert_eq!(command.retry, None);
    }

    #[test]
    fn unpaired_sequences_are_invalid_and_not_submitted() {
        let (dispatcher, worker) = dispatcher();
        let err = dispatcher
            .upload_new_batch(
                &account("me@host"),
                strings(&["/sd/1.jpg", "/sd/2.jpg"]),
                strings(&["/Photos/1.jpg"]),
                strings(&["image/jpeg", "image/jpeg"]),
                LocalBehaviour::Copy,
                true,
                CreatedBy::USER,
            )
            .unwrap_err();

        assert!(matches!(err, RequestError::InvalidArgument(_)));
        assert!(worker.commands().is_empty());
    }

    #[test]
    fn empty_batches_are_invalid() {
        let (dispatcher, worker) = dispatcher();
        let new_err = dispatcher
            .upload_new_batch(
                &account("me@host"),
                Vec::new(),
                Vec::new(),
                Vec::new(),
                LocalBehaviour::Copy,
                true,
                CreatedBy::USER,
            )
            .unwrap_err();
        let update_err = dispatcher
            .upload_update_batch(&account("me@host"), Vec::new(), LocalBehaviour::Copy, true)
            .unwrap_err();

        assert!(matches!(new_err, RequestError::InvalidArgument(_)));
        assert!(matches!(update_err, RequestError::InvalidArgument(_)));
        assert!(worker.commands().is_empty());
    }

    #[test]
    fn single_wrappers_match_their_batch_forms() {
        let (dispatcher, worker) = dispatcher();
        let me = account("me@host");
        let file = RemoteFile::new("/Docs/f.txt", "text/plain");

        dispatcher
            .upload_new_single(
                &me,
                "/sd/a",
                "/a",
                LocalBehaviour::Forget,
                "text/plain",
                true,
                CreatedBy(3),
            )
            .expect("single new");
        dispatcher
            .upload_new_batch(
                &me,
                strings(&["/sd/a"]),
                strings(&["/a"]),
                strings(&["text/plain"]),
                LocalBehaviour::Forget,
                true,
                CreatedBy(3),
            )
            .expect("batch new");
        dispatcher
            .upload_update_single(&me, file.clone(), LocalBehaviour::Remove, true)
            .expect("single update");
        dispatcher
            .upload_update_batch(&me, vec![file], LocalBehaviour::Remove, true)
            .expect("batch update");

        let commands = worker.commands();
        assert_eq!(commands[0], commands[1]);
        assert_eq!(commands[2], commands[3]);
    }

    #[test]
    fn retry_command_carries_flag_and_record() {
        let (dispatcher, worker) = dispatcher();
        let upload = PersistedUpload::failed(9, "me@host", "/x", UploadResult::ServiceInterrupted);

        dispatcher
            .upload_retry(&account("me@host"), &upload)
            .expect("retry");

        let commands = worker.commands();
        assert_eq!(commands.len(), 1);
        assert!(commands[0].is_retry());
        assert_eq!(commands[0].retry_upload.as_ref(), Some(&upload));
        assert_eq!(commands[0].local_file, None);
    }

    #[test]
    fn worker_rejection_surfaces_to_the_caller() {
        let (dispatcher, worker) = dispatcher();
        worker.reject.store(true, Ordering::Relaxed);

        let err = dispatcher
            .upload_update_single(
                &account("me@host"),
                RemoteFile::new("/a", "text/plain"),
                LocalBehaviour::Copy,
                false,
            )
            .unwrap_err();
        assert!(matches!(err, RequestError::Bridge(BridgeError::Rejected(_))));
    }
}
