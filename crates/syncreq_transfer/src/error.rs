use syncreq_bridge::BridgeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("no account named `{0}`")]
    UnknownAccount(String),
    #[error(transparent)]
    Bridge(#[from] BridgeError),
}
