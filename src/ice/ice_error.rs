use std::io;

use thiserror::Error;

use crate::stun::StunError;

#[derive(Debug, Error)]
pub enum IceError {
    #[error("invalid stun server address: {0:?}")]
    BadStunServer(String),
    #[error("failed to resolve {0}")]
    Resolve(String),
    #[error("port forwarding unavailable: {0}")]
    PortForwarding(String),
    #[error("stun query failed: {0}")]
    Stun(#[from] StunError),
    #[error("ice socket error: {0}")]
    Io(#[from] io::Error),
}
