use std::fmt;
use std::net::{IpAddr, SocketAddr};

use super::candidate_type::CandidateType;

/// An address a peer can try to reach us on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Candidate {
    pub kind: CandidateType,
    pub ip: IpAddr,
    pub port: u16,
}

impl Candidate {
    #[must_use]
    pub fn new(kind: CandidateType, ip: IpAddr, port: u16) -> Self {
        Self { kind, ip, port }
    }

    #[must_use]
    pub fn local(address: SocketAddr) -> Self {
        Self::new(CandidateType::Local, address.ip(), address.port())
    }

    #[must_use]
    pub fn address(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.address())
    }
}

#[cfg(test)]
mod test {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn test_candidate_display_format_ok() {
        let c = Candidate::local("10.0.0.2:5000".parse().unwrap());
        assert_eq!(c.to_string(), "local 10.0.0.2:5000");
    }

    #[test]
    fn test_candidate_display_ipv6_ok() {
        let c = Candidate::new(CandidateType::Punched, "2001:db8::1".parse().unwrap(), 9);
        assert_eq!(c.to_string(), "punched [2001:db8::1]:9");
    }

    #[test]
    fn test_address_round_trips_fields() {
        let addr: SocketAddr = "192.168.0.1:4000".parse().unwrap();
        let c = Candidate::new(CandidateType::Forwarded, addr.ip(), addr.port());
        assert_eq!(c.address(), addr);
        assert_eq!(c.kind, CandidateType::Forwarded);
    }
}
