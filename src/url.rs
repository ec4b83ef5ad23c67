use std::fmt;
use std::net::{IpAddr, SocketAddr, ToSocketAddrs};
use std::str::FromStr;

use thiserror::Error;

pub type Port = u16;

const DEFAULT_TCP_PORT: Port = 8080;
const DEFAULT_RTP_PORT: Port = 1336;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UrlError {
    #[error("missing protocol in url: {0:?}")]
    MissingProtocol(String),
    #[error("unknown protocol: {0:?}")]
    UnknownProtocol(String),
    #[error("unsupported protocol: {0}")]
    Unsupported(&'static str),
    #[error("failed to parse port: {0:?}")]
    BadPort(String),
    #[error("empty host in url")]
    EmptyHost,
    #[error("failed to resolve {host}:{port}")]
    Resolve { host: String, port: Port },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Tcp,
    Rtp,
}

impl Protocol {
    fn scheme(self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Rtp => "rtp",
        }
    }

    fn default_port(self) -> Port {
        match self {
            Protocol::Tcp => DEFAULT_TCP_PORT,
            Protocol::Rtp => DEFAULT_RTP_PORT,
        }
    }
}

/// `tcp://host[:port]` or `rtp://host[:port]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Url {
    protocol: Protocol,
    host: String,
    port: Port,
}

impl Url {
    pub fn new(protocol: Protocol, host: impl Into<String>, port: Port) -> Self {
        Self {
            protocol,
            host: host.into(),
            port,
        }
    }

    pub fn parse(s: &str) -> Result<Self, UrlError> {
        let (scheme, rest) = s
            .split_once("://")
            .ok_or_else(|| UrlError::MissingProtocol(s.to_owned()))?;

        let protocol = match scheme {
            "tcp" => Protocol::Tcp,
            "rtp" => Protocol::Rtp,
            "rtsp" => return Err(UrlError::Unsupported("rtsp")),
            other => return Err(UrlError::UnknownProtocol(other.to_owned())),
        };

        let rest = rest.trim_end_matches('/');
        let (host, port) = split_host_port(rest)?;
        let port = match port {
            Some(port) => port
                .parse::<Port>()
                .map_err(|_| UrlError::BadPort(port.to_owned()))?,
            None => protocol.default_port(),
        };

        if host.is_empty() {
            return Err(UrlError::EmptyHost);
        }

        Ok(Self::new(protocol, host, port))
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> Port {
        self.port
    }

    /// Resolves the host, preferring the first IPv4 answer.
    pub fn resolve(&self) -> Result<SocketAddr, UrlError> {
        let resolve_err = || UrlError::Resolve {
            host: self.host.clone(),
            port: self.port,
        };

        if let Ok(ip) = self.host.parse::<IpAddr>() {
            return Ok(SocketAddr::new(ip, self.port));
        }

        let addrs: Vec<SocketAddr> = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|_| resolve_err())?
            .collect();

        addrs
            .iter()
            .find(|a| a.is_ipv4())
            .or_else(|| addrs.first())
            .copied()
            .ok_or_else(resolve_err)
    }
}

/// Splits `host[:port]`, where an IPv6 host is either bracketed or bare
/// (a bare one carries no port).
fn split_host_port(s: &str) -> Result<(&str, Option<&str>), UrlError> {
    if let Some(inner) = s.strip_prefix('[') {
        let (host, tail) = inner
            .split_once(']')
            .ok_or_else(|| UrlError::BadPort(s.to_owned()))?;
        return match tail {
            "" => Ok((host, None)),
            _ => match tail.strip_prefix(':') {
                Some(port) => Ok((host, Some(port))),
                None => Err(UrlError::BadPort(tail.to_owned())),
            },
        };
    }
    match s.rsplit_once(':') {
        Some((host, _)) if host.contains(':') => Ok((s, None)),
        Some((host, port)) => Ok((host, Some(port))),
        None => Ok((s, None)),
    }
}

impl FromStr for Url {
    type Err = UrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Url::parse(s)
    }
}

impl fmt::Display for Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "{}://[{}]:{}", self.protocol.scheme(), self.host, self.port)
        } else {
            write!(f, "{}://{}:{}", self.protocol.scheme(), self.host, self.port)
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn parse_with_explicit_port_ok() {
        let url = Url::parse("tcp://192.168.1.7:5000").unwrap();
        assert_eq!(url.protocol(), Protocol::Tcp);
        assert_eq!(url.host(), "192.168.1.7");
        assert_eq!(url.port(), 5000);
        assert_eq!(url.to_string(), "tcp://192.168.1.7:5000");
    }

    #[test]
    fn parse_uses_protocol_default_port() {
        assert_eq!(Url::parse("tcp://10.0.0.1").unwrap().port(), 8080);
        assert_eq!(Url::parse("rtp://10.0.0.1").unwrap().port(), 1336);
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert_eq!(Url::parse("tcp://"), Err(UrlError::EmptyHost));
        assert_eq!(Url::parse("tcp://:5000"), Err(UrlError::EmptyHost));
        assert!(matches!(
            Url::parse("10.0.0.1:5000"),
            Err(UrlError::MissingProtocol(_))
        ));
        assert!(matches!(
            Url::parse("udp://10.0.0.1:5000"),
            Err(UrlError::UnknownProtocol(_))
        ));
        assert_eq!(
            Url::parse("rtsp://10.0.0.1:554"),
            Err(UrlError::Unsupported("rtsp"))
        );
        assert!(matches!(
            Url::parse("tcp://10.0.0.1:http"),
            Err(UrlError::BadPort(_))
        ));
    }

    #[test]
    fn short_host_names_are_accepted() {
        let url = Url::parse("tcp://box").unwrap();
        assert_eq!(url.host(), "box");
        assert_eq!(url.port(), 8080);
        assert_eq!(Url::parse("rtp://a:9").unwrap().port(), 9);
    }

    #[test]
    fn ipv6_hosts_lose_their_brackets() {
        let url = Url::parse("tcp://[::1]:5000").unwrap();
        assert_eq!(url.host(), "::1");
        assert_eq!(url.port(), 5000);
        assert_eq!(url.resolve().unwrap(), "[::1]:5000".parse().unwrap());
        assert_eq!(url.to_string(), "tcp://[::1]:5000");

        assert_eq!(Url::parse("rtp://[fe80::2]").unwrap().port(), 1336);
        assert_eq!(Url::parse("rtp://fe80::2").unwrap().host(), "fe80::2");
        assert!(matches!(Url::parse("tcp://[::1"), Err(UrlError::BadPort(_))));
        assert!(matches!(Url::parse("tcp://[::1]5000"), Err(UrlError::BadPort(_))));
    }

    #[test]
    fn resolve_ip_literal_without_dns() {
        let url = Url::parse("rtp://127.0.0.1:4000").unwrap();
        assert_eq!(url.resolve().unwrap(), "127.0.0.1:4000".parse().unwrap());
    }
}
