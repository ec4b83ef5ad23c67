use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TcpError {
    #[error("packet size is too big: {0} bytes")]
    PacketTooLarge(usize),
    #[error("tcp socket error: {0}")]
    Io(#[from] io::Error),
}
