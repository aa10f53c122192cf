use std::collections::HashMap;

use syncreq_contract::{AccountRef, PersistedUpload};

/// Looks up a configured account by its name.
pub trait AccountResolver: Send + Sync {
    fn resolve(&self, account_name: &str) -> Option<AccountRef>;
}

pub trait ConditionSensors: Send + Sync {
    fn is_network_active(&self) -> bool;

    /// True while the device is in a power-saving state that throttles
    /// background work.
    fn is_device_idle(&self) -> bool;
}

/// Source of stored uploads whose last attempt failed, in store order.
pub trait FailedUploadQuery: Send + Sync {
    fn failed_uploads(&self) -> Vec<PersistedUpload>;
}

/// A snapshot taken from the uploads store.
impl FailedUploadQuery for Vec<PersistedUpload> {
    fn failed_uploads(&self) -> Vec<PersistedUpload> {
        self.iter()
            .filter(|upload| upload.has_failed())
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct AccountDirectory {
    accounts: HashMap<String, AccountRef>,
}

impl AccountDirectory {
    pub fn new(accounts: impl IntoIterator<Item = AccountRef>) -> Self {
        Self {
            accounts: accounts
                .into_iter()
                .map(|account| (account.name.clone(), account))
                .collect(),
        }
    }
}

impl AccountResolver for AccountDirectory {
    fn resolve(&self, account_name: &str) -> Option<AccountRef> {
        self.accounts.get(account_name).cloned()
    }
}
