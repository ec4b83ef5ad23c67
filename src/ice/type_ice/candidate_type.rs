use std::fmt;

/// How a candidate address was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandidateType {
    /// One of the host's own addresses.
    Local,
    /// A WAN address mapped by the router (UPnP / NAT-PMP).
    Forwarded,
    /// The public mapping learned through STUN.
    Punched,
    /// Relayed through a third party. Never gathered here.
    Proxy,
}

impl CandidateType {
    pub fn as_str(self) -> &'static str {
        match self {
            CandidateType::Local => "local",
            CandidateType::Forwarded => "forwarded",
            CandidateType::Punched => "punched",
            CandidateType::Proxy => "proxy",
        }
    }
}

impl fmt::Display for CandidateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
