use serde::{Deserialize, Serialize};

pub type JobId = i32;

/// Service a deferred job is delivered to once its constraints hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryService {
    RetryUpload,
    RetryDownload,
}

impl RetryService {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RetryUpload => "retry_upload",
            Self::RetryDownload => "retry_download",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "retry_upload" => Some(Self::RetryUpload),
            "retry_download" => Some(Self::RetryDownload),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredNetwork {
    Any,
    Unmetered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobConstraints {
    pub required_network: RequiredNetwork,
    /// Survives device restarts.
    pub persisted: bool,
}

impl JobConstraints {
    /// Free Wi-Fi only, kept across reboots.
    pub const fn unmetered_persisted() -> Self {
        Self {
            required_network: RequiredNetwork::Unmetered,
            persisted: true,
        }
    }
}

/// The two string extras a retry service needs to resume one transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobExtras {
    pub remote_path: String,
    pub account_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeferredJob {
    pub job_id: JobId,
    pub service: RetryService,
    pub constraints: JobConstraints,
    pub extras: JobExtras,
}

impl DeferredJob {
    pub fn retry(
        service: RetryService,
        job_id: JobId,
        remote_path: impl Into<String>,
        account_name: impl Into<String>,
    ) -> Self {
        Self {
            job_id,
            service,
            constraints: JobConstraints::unmetered_persisted(),
            extras: JobExtras {
                remote_path: remote_path.into(),
                account_name: account_name.into(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extras_serialize_as_two_entry_map() {
        let job = DeferredJob::retry(RetryService::RetryDownload, 7, "/Docs/x.pdf", "me@host");
        let value = serde_json::to_value(&job).expect("serialize");

        assert_eq!(
            value["extras"],
            json!({ "remote_path": "/Docs/x.pdf", "account_name": "me@host" })
        );
        assert_eq!(value["service"], json!("retry_download"));
        assert_eq!(
            value["constraints"],
            json!({ "required_network": "unmetered", "persisted": true })
        );
    }

    #[test]
    fn service_names_parse_back() {
        for service in [RetryService::RetryUpload, RetryService::RetryDownload] {
            assert_eq!(RetryService::parse(service.as_str()), Some(service));
        }
        assert_eq!(RetryService::parse("retry_sync"), None);
    }
}
