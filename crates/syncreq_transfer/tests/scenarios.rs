use std::sync::{Arc, Mutex};

use syncreq_contract::{
    AccountRef, CreatedBy, LocalBehaviour, PersistedUpload, RemoteFile, RequiredNetwork,
    RetryService, UploadMessage, UploadResult, UploaderCommand,
};
use syncreq_transfer::{
    AccountDirectory, AccountResolver, ChannelTransferWorker, DeviceConditions, DispatchedCommand,
    InMemoryJobScheduler, TransferRequester,
};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing_test::traced_test;

struct LoggingResolver {
    directory: AccountDirectory,
    lookups: Mutex<Vec<String>>,
}

impl AccountResolver for LoggingResolver {
    fn resolve(&self, account_name: &str) -> Option<AccountRef> {
        self.lookups.lock().unwrap().push(account_name.to_string());
        self.directory.resolve(account_name)
    }
}

struct Fixture {
    requester: TransferRequester,
    receiver: UnboundedReceiver<DispatchedCommand>,
    platform: Arc<InMemoryJobScheduler>,
    resolver: Arc<LoggingResolver>,
}

impl Fixture {
    fn new(api_level: u32, store: Vec<PersistedUpload>) -> Self {
        let (worker, receiver) = ChannelTransferWorker::new();
        let platform = Arc::new(InMemoryJobScheduler::new(api_level));
        let resolver = Arc::new(LoggingResolver {
            directory: AccountDirectory::new([account("A"), account("B"), account("me@host")]),
            lookups: Mutex::new(Vec::new()),
        });
        let requester = TransferRequester::new(
            Arc::new(worker),
            platform.clone(),
            resolver.clone(),
            Arc::new(store),
            Arc::new(DeviceConditions::default()),
        );
        Self {
            requester,
            receiver,
            platform,
            resolver,
        }
    }

    fn drain(&mut self) -> Vec<UploaderCommand> {
        let mut commands = Vec::new();
        while let Ok(dispatched) = self.receiver.try_recv() {
            commands.push(dispatched.command);
        }
        commands
    }

    fn lookups(&self) -> Vec<String> {
        self.resolver.lookups.lock().unwrap().clone()
    }
}

fn account(name: &str) -> AccountRef {
    AccountRef::new(name, "https://cloud.example.org")
}

#[test]
fn single_new_upload() {
    let mut fixture = Fixture::new(28, Vec::new());

    fixture
        .requester
        .upload_new_single(
            &account("A"),
            "/sd/a.jpg",
            "/Photos/a.jpg",
            LocalBehaviour::Copy,
            "image/jpeg",
            true,
            CreatedBy(7),
        )
        .expect("upload");

    let commands = fixture.drain();
    assert_eq!(commands.len(), 1);
    let command = &commands[0];
    assert_eq!(command.account, Some(account("A")));
    assert_eq!(command.local_file, Some(vec!["/sd/a.jpg".to_string()]));
    assert_eq!(command.remote_file, Some(vec!["/Photos/a.jpg".to_string()]));
    assert_eq!(command.mime_type, Some(vec!["image/jpeg".to_string()]));
    assert_eq!(command.local_behaviour, Some(LocalBehaviour::Copy));
    assert_eq!(command.create_remote_folder, Some(true));
    assert_eq!(command.created_by, Some(CreatedBy(7)));
    assert!(matches!(
        command.clone().into_message(),
        Ok(UploadMessage::New(_))
    ));
}

#[test]
fn batch_update() {
    let mut fixture = Fixture::new(28, Vec::new());
    let f1 = RemoteFile::new("/Docs/f1.odt", "application/vnd.oasis.opendocument.text");
    let f2 = RemoteFile::new("/Docs/f2.odt", "application/vnd.oasis.opendocument.text");

    fixture
        .requester
        .upload_update_batch(
            &account("A"),
            vec![f1.clone(), f2.clone()],
            LocalBehaviour::Move,
            false,
        )
        .expect("update");

    let commands = fixture.drain();
    assert_eq!(commands.len(), 1);
    let command = &commands[0];
    assert_eq!(command.account, Some(account("A")));
    assert_eq!(command.file, Some(vec![f1, f2]));
    assert_eq!(command.local_behaviour, Some(LocalBehaviour::Move));
    assert_eq!(command.force_overwrite, Some(false));
    assert_eq!(command.local_file, None);
    assert_eq!(command.remote_file, None);
    assert_eq!(command.mime_type, None);
    assert_eq!(command.create_remote_folder, None);
    assert_eq!(command.created_by, None);
}

#[test]
fn retry_a_specific_failed_upload() {
    let mut fixture = Fixture::new(28, Vec::new());
    let upload = PersistedUpload::failed(
        31,
        "me@host",
        "/Docs/report.pdf",
        UploadResult::NetworkConnection,
    );

    fixture.requester.retry(&upload).expect("retry");

    assert_eq!(fixture.lookups(), vec!["me@host"]);
    let commands = fixture.drain();
    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0].retry, Some(true));
    assert_eq!(commands[0].retry_upload, Some(upload));
    assert_eq!(commands[0].account, Some(account("me@host")));
}

#[test]
fn bulk_retry_with_account_filter() {
    let store = vec![
        PersistedUpload::failed(1, "A", "/a1", UploadResult::NetworkConnection),
        PersistedUpload::failed(2, "A", "/a2", UploadResult::FileError),
        PersistedUpload::failed(3, "B", "/b1", UploadResult::NetworkConnection),
        PersistedUpload::failed(4, "A", "/a3", UploadResult::NetworkConnection),
    ];
    let mut fixture = Fixture::new(28, store);

    let retried = fixture
        .requester
        .retry_failed(Some(&account("A")), None)
        .expect("bulk retry");

    assert_eq!(retried, 3);
    let ids: Vec<i64> = fixture
        .drain()
        .into_iter()
        .filter_map(|command| command.retry_upload)
        .map(|upload| upload.upload_id)
        .collect();
    assert_eq!(ids, vec![1, 2, 4]);
    assert_eq!(fixture.lookups(), vec!["A"]);
}

#[test]
fn bulk_retry_re_resolves_when_another_account_interrupts() {
    let store = vec![
        PersistedUpload::failed(1, "A", "/a1", UploadResult::NetworkConnection),
        PersistedUpload::failed(2, "A", "/a2", UploadResult::NetworkConnection),
        PersistedUpload::failed(3, "B", "/b1", UploadResult::NetworkConnection),
        PersistedUpload::failed(4, "A", "/a3", UploadResult::NetworkConnection),
    ];
    let mut fixture = Fixture::new(28, store);

    let retried = fixture.requester.retry_failed(None, None).expect("bulk retry");

    assert_eq!(retried, 4);
    assert_eq!(fixture.drain().len(), 4);
    assert_eq!(fixture.lookups(), vec!["A", "B", "A"]);
}

#[test]
#[traced_test]
fn schedule_upload_on_supported_platform() {
    let mut fixture = Fixture::new(28, Vec::new());

    let scheduled = fixture
        .requester
        .schedule_upload(42, "me@host", "/Docs/x.pdf")
        .expect("schedule");

    assert!(scheduled);
    let job = fixture.platform.get(42).expect("pending job");
    assert_eq!(job.job_id, 42);
    assert_eq!(job.service, RetryService::RetryUpload);
    assert_eq!(job.extras.remote_path, "/Docs/x.pdf");
    assert_eq!(job.extras.account_name, "me@host");
    assert_eq!(job.constraints.required_network, RequiredNetwork::Unmetered);
    assert!(job.constraints.persisted);
    assert!(fixture.drain().is_empty());
    assert!(logs_contain("scheduled upload retry for /Docs/x.pdf in me@host"));
}

#[test]
fn schedule_download_on_unsupported_platform() {
    let fixture = Fixture::new(19, Vec::new());

    let scheduled = fixture
        .requester
        .schedule_download(42, "/Docs/x.pdf", "me@host")
        .expect("schedule");

    assert!(!scheduled);
    assert!(fixture.platform.pending().is_empty());
}
