use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::upload::{AccountRef, CreatedBy, LocalBehaviour, PersistedUpload, RemoteFile};

/// First-time upload of one or more local files. The three path/type
/// sequences are positionally paired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub account: AccountRef,
    pub local_paths: Vec<String>,
    pub remote_paths: Vec<String>,
    pub mime_types: Vec<String>,
    pub local_behaviour: LocalBehaviour,
    pub create_remote_folder: bool,
    pub created_by: CreatedBy,
}

/// Upload of new content over files that already exist remotely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRequest {
    pub account: AccountRef,
    pub existing_files: Vec<RemoteFile>,
    pub local_behaviour: LocalBehaviour,
    pub force_overwrite: bool,
}

/// Resumption of a stored upload whose last attempt failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryRequest {
    pub account: AccountRef,
    pub upload: PersistedUpload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadMessage {
    New(UploadRequest),
    Update(UpdateRequest),
    Retry(RetryRequest),
}

impl UploadMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::New(_) => "new",
            Self::Update(_) => "update",
            Self::Retry(_) => "retry",
        }
    }

    pub fn account(&self) -> &AccountRef {
        match self {
            Self::New(request) => &request.account,
            Self::Update(request) => &request.account,
            Self::Retry(request) => &request.account,
        }
    }
}

/// Flat keyed command accepted by the upload worker. Only the keys of one
/// request shape are present; everything else is omitted on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct UploaderCommand {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<AccountRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_file: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_file: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<Vec<RemoteFile>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_behaviour: Option<LocalBehaviour>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_remote_folder: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<CreatedBy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force_overwrite: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_upload: Option<PersistedUpload>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("command is missing {0}")]
    MissingField(&'static str),
    #[error("command mixes fields of more than one request shape")]
    Ambiguous,
    #[error("LOCAL_FILE, REMOTE_FILE and MIME_TYPE must be non-empty and of equal length")]
    LengthMismatch,
}

impl From<UploadMessage> for UploaderCommand {
    fn from(message: UploadMessage) -> Self {
        match message {
            UploadMessage::New(request) => Self {
                account: Some(request.account),
                local_file: Some(request.local_paths),
                remote_file: Some(request.remote_paths),
                mime_type: Some(request.mime_types),
                local_behaviour: Some(request.local_behaviour),
                create_remote_folder: Some(request.create_remote_folder),
                created_by: Some(request.created_by),
                ..Self::default()
            },
            UploadMessage::Update(request) => Self {
                account: Some(request.account),
                file: Some(request.existing_files),
                local_behaviour: Some(request.local_behaviour),
                force_overwrite: Some(request.force_overwrite),
                ..Self::default()
            },
            UploadMessage::Retry(request) => Self {
                account: Some(request.account),
                retry: Some(true),
                retry_upload: Some(request.upload),
                ..Self::default()
            },
        }
    }
}

impl UploaderCommand {
    pub fn is_retry(&self) -> bool {
        self.retry == Some(true)
    }

    /// Recovers the typed request a worker should act on.
    pub fn into_message(self) -> Result<UploadMessage, EnvelopeError> {
        let account = self.account.ok_or(EnvelopeError::MissingField("ACCOUNT"))?;

        if self.retry == Some(true) {
            if self.local_file.is_some() || self.file.is_some() {
                return Err(EnvelopeError::Ambiguous);
            }
            let upload = self
                .retry_upload
                .ok_or(EnvelopeError::MissingField("RETRY_UPLOAD"))?;
            return Ok(UploadMessage::Retry(RetryRequest { account, upload }));
        }

        let local_behaviour = self
            .local_behaviour
            .ok_or(EnvelopeError::MissingField("LOCAL_BEHAVIOUR"))?;

        match (self.local_file, self.file) {
            (Some(local_paths), None) => {
                let remote_paths = self
                    .remote_file
                    .ok_or(EnvelopeError::MissingField("REMOTE_FILE"))?;
                let mime_types = self
                    .mime_type
                    .ok_or(EnvelopeError::MissingField("MIME_TYPE"))?;
                if local_paths.is_empty()
                    || local_paths.len() != remote_paths.len()
                    || local_paths.len() != mime_types.len()
                {
                    return Err(EnvelopeError::LengthMismatch);
                }
                Ok(UploadMessage::New(UploadRequest {
                    account,
                    local_paths,
                    remote_paths,
                    mime_types,
                    local_behaviour,
                    create_remote_folder: self
                        .create_remote_folder
                        .ok_or(EnvelopeError::MissingField("CREATE_REMOTE_FOLDER"))?,
                    created_by: self
                        .created_by
                        .ok_or(EnvelopeError::MissingField("CREATED_BY"))?,
                }))
            }
            (None, Some(existing_files)) => {
                if self.remote_file.is_some() || self.mime_type.is_some() {
                    return Err(EnvelopeError::Ambiguous);
                }
                Ok(UploadMessage::Update(UpdateRequest {
                    account,
                    existing_files,
                    local_behaviour,
                    force_overwrite: self
                        .force_overwrite
                        .ok_or(EnvelopeError::MissingField("FORCE_OVERWRITE"))?,
                }))
            }
            (Some(_), Some(_)) => Err(EnvelopeError::Ambiguous),
            (None, None) => Err(EnvelopeError::MissingField("LOCAL_FILE")),
        }
    }
}
