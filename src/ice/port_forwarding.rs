use std::{
    fmt,
    net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket},
    time::Duration,
};

use igd_next::{PortMappingProtocol, SearchOptions, search_gateway};

use super::ice_error::IceError;

const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(1);
/// One day; the router drops the mapping afterwards.
const LEASE_SECONDS: u32 = 86_400;
const MAPPING_DESCRIPTION: &str = "rustyshare";

/// Asks the local router to map a WAN port to us (UPnP, NAT-PMP, ...).
/// Best effort: any failure simply means no forwarded candidate.
pub trait PortForwarder: Send + Sync {
    /// Maps `remote_port` on the router to `local_port` on this host and
    /// returns the router's external address.
    fn forward_port(&self, local_port: u16, remote_port: u16, tcp: bool)
    -> Result<IpAddr, IceError>;
}

/// Used when no router integration is available.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPortForwarding;

impl PortForwarder for NoPortForwarding {
    fn forward_port(&self, _: u16, _: u16, _: bool) -> Result<IpAddr, IceError> {
        Err(IceError::PortForwarding("no gateway support".to_owned()))
    }
}

/// Maps ports through a UPnP Internet Gateway Device found by SSDP search.
#[derive(Debug, Clone, Copy)]
pub struct UpnpForwarder {
    search_timeout: Duration,
}

impl UpnpForwarder {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_SEARCH_TIMEOUT)
    }

    pub fn with_timeout(search_timeout: Duration) -> Self {
        Self { search_timeout }
    }
}

impl Default for UpnpForwarder {
    fn default() -> Self {
        Self::new()
    }
}

impl PortForwarder for UpnpForwarder {
    fn forward_port(
        &self,
        local_port: u16,
        remote_port: u16,
        tcp: bool,
    ) -> Result<IpAddr, IceError> {
        let options = SearchOptions {
            timeout: Some(self.search_timeout),
            ..Default::default()
        };
        let gateway = search_gateway(options)
            .map_err(|e| forwarding_error("could not discover upnp device", e))?;
        let wan = gateway
            .get_external_ip()
            .map_err(|e| forwarding_error("could not get external ip address", e))?;

        let lan = SocketAddr::new(lan_address(gateway.addr)?, local_port);
        let protocol = if tcp {
            PortMappingProtocol::TCP
        } else {
            PortMappingProtocol::UDP
        };
        gateway
            .add_port(protocol, remote_port, lan, LEASE_SECONDS, MAPPING_DESCRIPTION)
            .map_err(|e| forwarding_error("failed to map ports", e))?;
        Ok(wan)
    }
}

/// Our address on the interface that routes to `gateway`.
fn lan_address(gateway: SocketAddr) -> Result<IpAddr, IceError> {
    let any: SocketAddr = if gateway.is_ipv4() {
        (Ipv4Addr::UNSPECIFIED, 0).into()
    } else {
        (Ipv6Addr::UNSPECIFIED, 0).into()
    };
    // connect() on UDP only picks a route, nothing is sent
    let socket = UdpSocket::bind(any)?;
    socket.connect(gateway)?;
    Ok(socket.local_addr()?.ip())
}

fn forwarding_error(what: &str, e: impl fmt::Display) -> IceError {
    IceError::PortForwarding(format!("{what}: {e}"))
}
