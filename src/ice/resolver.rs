use std::net::{IpAddr, ToSocketAddrs};

use super::ice_error::IceError;

const HOSTNAME_FILE: &str = "/etc/hostname";
const FALLBACK_HOST: &str = "localhost";

/// Name resolution used while gathering candidates.
pub trait Resolver: Send + Sync {
    /// The name this machine is known by.
    fn host_name(&self) -> String;

    /// Every address `host` resolves to, in resolver order, without duplicates.
    fn resolve_all(&self, host: &str, port: u16) -> Result<Vec<IpAddr>, IceError>;
}

/// Resolver backed by the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemResolver;

impl Resolver for SystemResolver {
    fn host_name(&self) -> String {
        std::env::var("HOSTNAME")
            .ok()
            .or_else(|| std::fs::read_to_string(HOSTNAME_FILE).ok())
            .map(|h| h.trim().to_owned())
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| FALLBACK_HOST.to_owned())
    }

    fn resolve_all(&self, host: &str, port: u16) -> Result<Vec<IpAddr>, IceError> {
        let addrs = (host, port)
            .to_socket_addrs()
            .map_err(|_| IceError::Resolve(host.to_owned()))?;
        let mut out: Vec<IpAddr> = Vec::new();
        for addr in addrs {
            if !out.contains(&addr.ip()) {
                out.push(addr.ip());
            }
        }
        if out.is_empty() {
            return Err(IceError::Resolve(host.to_owned()));
        }
        Ok(out)
    }
}
