//! Request facade in front of the upload worker and the platform's deferred
//! job scheduler.
//!
//! Every operation runs synchronously on the caller's thread: commands are
//! enqueued with the worker, jobs are registered with the scheduler, and
//! nothing here waits for a transfer to happen.

pub mod collaborators;
pub mod conditions;
pub mod dispatcher;
pub mod error;
pub mod query;
pub mod requester;
pub mod retry;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod testing;

pub use collaborators::{AccountDirectory, AccountResolver, ConditionSensors, FailedUploadQuery};
pub use conditions::{should_schedule_retry, DeviceConditions};
pub use dispatcher::Dispatcher;
pub use error::RequestError;
pub use query::{failed_uploads_matching, FailedUploadFilter};
pub use requester::TransferRequester;
pub use retry::RetryOutcome;
pub use scheduler::DeferredScheduler;

pub use syncreq_bridge::{
    BridgeError, BridgeReceipt, ChannelTransferWorker, DispatchedCommand, InMemoryJobScheduler,
    JobScheduler, TransferWorker,
};
