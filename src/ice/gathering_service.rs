use std::net::{SocketAddr, UdpSocket};
use std::sync::Arc;
use std::time::Duration;

use crate::ice::ice_error::IceError;
use crate::ice::port_forwarding::PortForwarder;
use crate::ice::resolver::Resolver;
use crate::ice::type_ice::candidate::Candidate;
use crate::ice::type_ice::candidate_type::CandidateType;
use crate::log::log_sink::LogSink;
use crate::stun::query_external_address;
use crate::{sink_debug, sink_info, sink_warn};

const STUN_TIMEOUT: Duration = Duration::from_secs(3);

/// Collects the candidates for `socket`, in this order:
/// every local address, the forwarded WAN address (if the router mapped a port),
/// the STUN external ip at the local port (again only if forwarding worked),
/// and finally the STUN mapping itself.
///
/// Local resolution and STUN failures are errors; forwarding failures are not.
pub fn gather_candidates(
    socket: &UdpSocket,
    resolver: &dyn Resolver,
    forwarder: &dyn PortForwarder,
    stun_server: &str,
    logger: &Arc<dyn LogSink>,
) -> Result<Vec<Candidate>, IceError> {
    let mut candidates = Vec::new();
    let local = socket.local_addr()?;
    let local_port = local.port();

    let host = resolver.host_name();
    for ip in resolver.resolve_all(&host, local_port)? {
        candidates.push(Candidate::new(CandidateType::Local, ip, local_port));
    }
    sink_debug!(logger, "[ICE] {} local candidate(s) for {}", candidates.len(), host);

    let forwarded = match forwarder.forward_port(local_port, local_port, false) {
        Ok(wan) => {
            candidates.push(Candidate::new(CandidateType::Forwarded, wan, local_port));
            true
        }
        Err(e) => {
            sink_warn!(logger, "[ICE] port forwarding skipped: {}", e);
            false
        }
    };

    let server = resolve_stun_server(resolver, stun_server, local)?;
    let external = query_external_address(socket, server, STUN_TIMEOUT)?;
    if forwarded {
        candidates.push(Candidate::new(CandidateType::Forwarded, external.ip(), local_port));
    }
    candidates.push(Candidate::new(CandidateType::Punched, external.ip(), external.port()));

    for c in &candidates {
        sink_info!(logger, "[ICE] candidate {}", c);
    }
    Ok(candidates)
}

/// `host:port`, resolved to an address of the same family as `local`.
fn resolve_stun_server(
    resolver: &dyn Resolver,
    stun_server: &str,
    local: SocketAddr,
) -> Result<SocketAddr, IceError> {
    let bad = || IceError::BadStunServer(stun_server.to_owned());
    let (host, port) = stun_server.rsplit_once(':').ok_or_else(bad)?;
    let port: u16 = port.parse().map_err(|_| bad())?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    resolver
        .resolve_all(host, port)?
        .into_iter()
        .find(|ip| ip.is_ipv4() == local.is_ipv4())
        .map(|ip| SocketAddr::new(ip, port))
        .ok_or_else(|| IceError::Resolve(host.to_owned()))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::ice::port_forwarding::NoPortForwarding;
    use crate::log::NoopLogSink;
    use std::net::{IpAddr, Ipv4Addr};

    struct FixedResolver(Vec<IpAddr>);

    impl Resolver for FixedResolver {
        fn host_name(&self) -> String {
            "box".to_owned()
        }

        fn resolve_all(&self, host: &str, _port: u16) -> Result<Vec<IpAddr>, IceError> {
            match host {
                "box" => Ok(self.0.clone()),
                "127.0.0.1" => Ok(vec![IpAddr::V4(Ipv4Addr::LOCALHOST)]),
                other => Err(IceError::Resolve(other.to_owned())),
            }
        }
    }

    fn logger() -> Arc<dyn LogSink> {
        Arc::new(NoopLogSink)
    }

    #[test]
    fn test_bad_stun_server_string() {
        let resolver = FixedResolver(vec![IpAddr::V4(Ipv4Addr::LOCALHOST)]);
        let local: SocketAddr = "127.0.0.1:5000".parse().unwrap();
        for s in ["nohost", "host:notaport", "host:70000"] {
            let err = resolve_stun_server(&resolver, s, local).unwrap_err();
            assert!(matches!(err, IceError::BadStunServer(_)), "{s}");
        }
    }

    #[test]
    fn test_local_resolution_failure_is_an_error() {
        struct Broken;
        impl Resolver for Broken {
            fn host_name(&self) -> String {
                "x".to_owned()
            }
            fn resolve_all(&self, host: &str, _: u16) -> Result<Vec<IpAddr>, IceError> {
                Err(IceError::Resolve(host.to_owned()))
            }
        }
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        let err = gather_candidates(&socket, &Broken, &NoPortForwarding, "127.0.0.1:1", &logger())
            .unwrap_err();
        assert!(matches!(err, IceError::Resolve(_)));
    }

    #[test]
    fn test_no_forwarding_never_fails_on_its_own() {
        let err = NoPortForwarding.forward_port(1, 1, false).unwrap_err();
        assert!(matches!(err, IceError::PortForwarding(_)));
    }
}
