pub mod scheduler;
pub mod worker;

pub use scheduler::{InMemoryJobScheduler, JobScheduler, MIN_DEFERRED_JOB_API_LEVEL};
pub use worker::{
    BridgeError, BridgeReceipt, ChannelTransferWorker, DispatchedCommand, TransferWorker,
};
