use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StunError {
    #[error("invalid message")]
    InvalidMessage,
    #[error("unknown request id")]
    UnknownRequestId,
    #[error("request failed")]
    RequestFailed,
    #[error("no ip address in response")]
    NoAddress,
    #[error("no response from stun server in time")]
    Timeout,
    #[error("stun socket error: {0}")]
    Io(#[from] io::Error),
}
