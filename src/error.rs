use std::io;

use thiserror::Error;

use crate::{config::ConfigError, ice::IceError, stun::StunError, tcp::TcpError, url::UrlError};

/// Error returned by anything that crosses a module boundary.
#[derive(Debug, Error)]
pub enum NetError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Stun(#[from] StunError),
    #[error(transparent)]
    Ice(#[from] IceError),
    #[error(transparent)]
    Tcp(#[from] TcpError),
    #[error(transparent)]
    Url(#[from] UrlError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
