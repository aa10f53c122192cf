//! Recording fakes for the collaborator traits.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use chrono::Utc;
use syncreq_bridge::{BridgeError, BridgeReceipt, JobScheduler, TransferWorker};
use syncreq_contract::{AccountRef, DeferredJob, UploaderCommand};

use crate::collaborators::{AccountDirectory, AccountResolver};

#[derive(Debug, Default)]
pub struct RecordingWorker {
    pub commands: Mutex<Vec<UploaderCommand>>,
    pub reject: AtomicBool,
}

impl RecordingWorker {
    pub fn commands(&self) -> Vec<UploaderCommand> {
        self.commands.lock().expect("worker lock").clone()
    }
}

impl TransferWorker for RecordingWorker {
    fn submit(&self, command: UploaderCommand) -> Result<BridgeReceipt, BridgeError> {
        if self.reject.load(Ordering::Relaxed) {
            return Err(BridgeError::Rejected("worker refused".to_string()));
        }
        let mut commands = self.commands.lock().expect("worker lock");
        commands.push(command);
        Ok(BridgeReceipt {
            message_id: format!("msg-{}", commands.len()),
            accepted_at: Utc::now(),
        })
    }
}

#[derive(Debug)]
pub struct RecordingScheduler {
    pub supported: bool,
    pub jobs: Mutex<Vec<DeferredJob>>,
}

impl RecordingScheduler {
    pub fn new(supported: bool) -> Self {
        Self {
            supported,
            jobs: Mutex::new(Vec::new()),
        }
    }

    pub fn jobs(&self) -> Vec<DeferredJob> {
        self.jobs.lock().expect("scheduler lock").clone()
    }
}

impl JobScheduler for RecordingScheduler {
    fn supports_deferred_jobs(&self) -> bool {
        self.supported
    }

    fn schedule(&self, job: DeferredJob) -> Result<(), BridgeError> {
        self.jobs.lock().expect("scheduler lock").push(job);
        Ok(())
    }
}

/// Resolver that remembers every lookup.
#[derive(Debug, Default)]
pub struct CountingResolver {
    pub directory: AccountDirectory,
    pub lookups: Mutex<Vec<String>>,
}

impl CountingResolver {
    pub fn new(accounts: impl IntoIterator<Item = AccountRef>) -> Self {
        Self {
            directory: AccountDirectory::new(accounts),
            lookups: Mutex::new(Vec::new()),
        }
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().expect("resolver lock").clone()
    }
}

impl AccountResolver for CountingResolver {
    fn resolve(&self, account_name: &str) -> Option<AccountRef> {
        self.lookups
            .lock()
            .expect("resolver lock")
            .push(account_name.to_string());
        self.directory.resolve(account_name)
    }
}

pub fn account(name: &str) -> AccountRef {
    AccountRef::new(name, "https://cloud.example.org")
}
