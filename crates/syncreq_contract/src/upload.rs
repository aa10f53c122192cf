use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type AccountName = String;
pub type UploadId = i64;

/// Handle to one configured remote account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountRef {
    pub name: AccountName,
    pub base_url: String,
}

impl AccountRef {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
        }
    }
}

/// What the worker does with the local copy once the upload succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum LocalBehaviour {
    Copy = 0,
    Move = 1,
    Forget = 2,
    Remove = 3,
}

#[derive(Debug, Error)]
#[error("unknown local behaviour {0}")]
pub struct UnknownLocalBehaviour(pub u8);

impl From<LocalBehaviour> for u8 {
    fn from(behaviour: LocalBehaviour) -> Self {
        behaviour as u8
    }
}

impl TryFrom<u8> for LocalBehaviour {
    type Error = UnknownLocalBehaviour;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Copy),
            1 => Ok(Self::Move),
            2 => Ok(Self::Forget),
            3 => Ok(Self::Remove),
            other => Err(UnknownLocalBehaviour(other)),
        }
    }
}

/// Origin tag of an upload request. Values outside the named constants are
/// carried through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CreatedBy(pub i32);

impl CreatedBy {
    pub const USER: Self = Self(0);
    pub const INSTANT_PICTURE: Self = Self(1);
    pub const INSTANT_VIDEO: Self = Self(2);
}

/// A remote file already known to exist on the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFile {
    pub remote_path: String,
    pub storage_path: Option<String>,
    pub mime_type: String,
    pub length: u64,
    pub etag: Option<String>,
}

impl RemoteFile {
    pub fn new(remote_path: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            remote_path: remote_path.into(),
            storage_path: None,
            mime_type: mime_type.into(),
            length: 0,
            etag: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadResult {
    Uploaded,
    NetworkConnection,
    CredentialError,
    FolderError,
    ConflictError,
    FileError,
    PrivilegesError,
    Cancelled,
    FileNotFound,
    DelayedForWifi,
    ServiceInterrupted,
    ServiceUnavailable,
    QuotaExceeded,
    Unknown,
}

impl UploadResult {
    pub const ALL: [UploadResult; 14] = [
        Self::Uploaded,
        Self::NetworkConnection,
        Self::CredentialError,
        Self::FolderError,
        Self::ConflictError,
        Self::FileError,
        Self::PrivilegesError,
        Self::Cancelled,
        Self::FileNotFound,
        Self::DelayedForWifi,
        Self::ServiceInterrupted,
        Self::ServiceUnavailable,
        Self::QuotaExceeded,
        Self::Unknown,
    ];

    pub fn is_failure(self) -> bool {
        self != Self::Uploaded
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uploaded => "uploaded",
            Self::NetworkConnection => "network_connection",
            Self::CredentialError => "credential_error",
            Self::FolderError => "folder_error",
            Self::ConflictError => "conflict_error",
            Self::FileError => "file_error",
            Self::PrivilegesError => "privileges_error",
            Self::Cancelled => "cancelled",
            Self::FileNotFound => "file_not_found",
            Self::DelayedForWifi => "delayed_for_wifi",
            Self::ServiceInterrupted => "service_interrupted",
            Self::ServiceUnavailable => "service_unavailable",
            Self::QuotaExceeded => "quota_exceeded",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for UploadResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown {kind} `{value}`")]
pub struct ParseVariantError {
    kind: &'static str,
    value: String,
}

impl FromStr for UploadResult {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|result| result.as_str() == s)
            .ok_or_else(|| ParseVariantError {
                kind: "upload result",
                value: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    InProgress,
    Succeeded,
    Failed,
}

impl UploadStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

impl FromStr for UploadStatus {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(Self::InProgress),
            "succeeded" => Ok(Self::Succeeded),
            "failed" => Ok(Self::Failed),
            other => Err(ParseVariantError {
                kind: "upload status",
                value: other.to_string(),
            }),
        }
    }
}

/// Durable record of a previous upload attempt. Owned by the uploads store;
/// request code only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedUpload {
    pub upload_id: UploadId,
    pub account_name: AccountName,
    pub local_path: String,
    pub remote_path: String,
    pub mime_type: String,
    pub file_size: u64,
    pub status: UploadStatus,
    pub local_behaviour: LocalBehaviour,
    pub force_overwrite: bool,
    pub create_remote_folder: bool,
    pub created_by: CreatedBy,
    pub last_result: Option<UploadResult>,
    pub uploaded_at: Option<DateTime<Utc>>,
}

impl PersistedUpload {
    /// A record of an upload that ended with `result`.
    pub fn failed(
        upload_id: UploadId,
        account_name: impl Into<String>,
        remote_path: impl Into<String>,
        result: UploadResult,
    ) -> Self {
        Self {
            upload_id,
            account_name: account_name.into(),
            local_path: String::new(),
            remote_path: remote_path.into(),
            mime_type: "application/octet-stream".to_string(),
            file_size: 0,
            status: UploadStatus::Failed,
            local_behaviour: LocalBehaviour::Copy,
            force_overwrite: false,
            create_remote_folder: true,
            created_by: CreatedBy::USER,
            last_result: Some(result),
            uploaded_at: None,
        }
    }

    pub fn has_failed(&self) -> bool {
        self.status == UploadStatus::Failed
            && self.last_result.is_some_and(UploadResult::is_failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_behaviour_travels_as_integer() {
        let json = serde_json::to_string(&LocalBehaviour::Move).expect("serialize");
        assert_eq!(json, "1");

        let err = serde_json::from_str::<LocalBehaviour>("9").unwrap_err();
        assert!(err.to_string().contains("unknown local behaviour 9"));
    }

    #[test]
    fn upload_result_text_matches_serde_names() {
        for result in UploadResult::ALL {
            let json = serde_json::to_string(&result).expect("serialize");
            assert_eq!(json, format!("\"{}\"", result.as_str()));
            assert_eq!(result.as_str().parse::<UploadResult>().expect("parse"), result);
        }
        assert!("exploded".parse::<UploadResult>().is_err());
    }

    #[test]
    fn only_uploaded_is_not_a_failure() {
        let failures: Vec<_> = UploadResult::ALL
            .into_iter()
            .filter(|result| !result.is_failure())
            .collect();
        assert_eq!(failures, vec![UploadResult::Uploaded]);
    }

    #[test]
    fn failed_record_requires_failed_status_and_result() {
        let mut upload = PersistedUpload::failed(1, "me@host", "/a", UploadResult::FileError);
        assert!(upload.has_failed());

        upload.status = UploadStatus::InProgress;
        assert!(!upload.has_failed());

        upload.status = UploadStatus::Failed;
        upload.last_result = Some(UploadResult::Uploaded);
        assert!(!upload.has_failed());
    }

    #[test]
    fn created_by_keeps_unnamed_tags() {
        let json = serde_json::to_string(&CreatedBy(7)).expect("serialize");
        assert_eq!(json, "7");
        assert_eq!(CreatedBy::INSTANT_VIDEO, CreatedBy(2));
    }
}
