use chrono::{DateTime, Utc};
use syncreq_contract::UploaderCommand;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeReceipt {
    pub message_id: String,
    pub accepted_at: DateTime<Utc>,
}

/// A command as handed to the worker, stamped at acceptance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchedCommand {
    pub receipt: BridgeReceipt,
    pub command: UploaderCommand,
}

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("transfer worker is not running")]
    WorkerUnavailable,
    #[error("deferred job scheduler unavailable")]
    SchedulerUnavailable,
    #[error("submission rejected: {0}")]
    Rejected(String),
}

/// Always-running upload worker. `submit` enqueues and returns; it never
/// waits for the transfer.
pub trait TransferWorker: Send + Sync {
    fn submit(&self, command: UploaderCommand) -> Result<BridgeReceipt, BridgeError>;
}

/// Worker surface backed by an unbounded channel drained by the worker task.
#[derive(Debug, Clone)]
pub struct ChannelTransferWorker {
    sender: mpsc::UnboundedSender<DispatchedCommand>,
}

impl ChannelTransferWorker {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<DispatchedCommand>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl TransferWorker for ChannelTransferWorker {
    fn submit(&self, command: UploaderCommand) -> Result<BridgeReceipt, BridgeError> {
        if command.account.is_none() {
            return Err(BridgeError::Rejected("ACCOUNT cannot be empty".to_string()));
        }

        let receipt = BridgeReceipt {
            message_id: Uuid::now_v7().to_string(),
            accepted_at: Utc::now(),
        };
        debug!(
            message_id = %receipt.message_id,
            retry = command.is_retry(),
            "command accepted for transfer worker"
        );

        self.sender
            .send(DispatchedCommand {
                receipt: receipt.clone(),
                command,
            })
            .map_err(|_| BridgeError::WorkerUnavailable)?;
        Ok(receipt)
    }
}
