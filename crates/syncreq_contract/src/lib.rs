pub mod codec;
pub mod envelope;
pub mod job;
pub mod upload;

pub use codec::{decode_canonical, decode_command, encode_canonical, encode_command, CodecError};
pub use envelope::{
    EnvelopeError, RetryRequest, UpdateRequest, UploadMessage, UploadRequest, UploaderCommand,
};
pub use job::{DeferredJob, JobConstraints, JobExtras, JobId, RequiredNetwork, RetryService};
pub use upload::{
    AccountName, AccountRef, CreatedBy, LocalBehaviour, ParseVariantError, PersistedUpload,
    RemoteFile, UnknownLocalBehaviour, UploadId, UploadResult, UploadStatus,
};
