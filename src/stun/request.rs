use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};

use rand::RngCore;

use crate::byte_view::{u16_be, u32_be};

use super::{
    attribute::{
        ATTR_MAPPED_ADDRESS, ATTR_XOR_MAPPED_ADDRESS, Attribute, Attributes, FAMILY_IPV4,
        FAMILY_IPV6,
    },
    message::{
        CLASS_REQUEST, CLASS_SUCCESS, MAGIC_COOKIE, METHOD_BINDING, Message, Transaction,
        is_message,
    },
    stun_error::StunError,
};

/// One outstanding binding request. The transaction id is fixed when the
/// request is created and survives retransmissions until [`reset`](Self::reset).
#[derive(Debug, Clone)]
pub struct Request {
    transaction: Transaction,
}

impl Default for Request {
    fn default() -> Self {
        Self::new()
    }
}

impl Request {
    pub fn new() -> Self {
        let mut transaction = [0u8; 12];
        rand::thread_rng().fill_bytes(&mut transaction);
        Self { transaction }
    }

    pub fn with_transaction(transaction: Transaction) -> Self {
        Self { transaction }
    }

    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }

    /// Picks a fresh transaction id.
    pub fn reset(&mut self) {
        rand::thread_rng().fill_bytes(&mut self.transaction);
    }

    /// Writes the binding request into `buf` and returns its size.
    pub fn encode(&self, buf: &mut [u8]) -> usize {
        let mut m = Message::new(&mut buf[..Message::<()>::MIN_SIZE]);
        m.set_message_type(0);
        m.set_method(METHOD_BINDING);
        m.set_class(CLASS_REQUEST);
        m.set_length(0);
        m.set_cookie(MAGIC_COOKIE);
        m.set_transaction(&self.transaction);
        Message::<()>::MIN_SIZE
    }

    /// Sends the binding request to `server` from `socket`.
    pub fn send(&self, socket: &UdpSocket, server: SocketAddr) -> Result<(), StunError> {
        let mut buf = [0u8; Message::<()>::MIN_SIZE];
        let n = self.encode(&mut buf);
        socket.send_to(&buf[..n], server)?;
        Ok(())
    }

    /// Extracts the reflexive address from a binding success response.
    /// XOR-MAPPED-ADDRESS wins over MAPPED-ADDRESS when both are present.
    pub fn process_response(&self, bytes: &[u8]) -> Result<SocketAddr, StunError> {
        if !is_message(bytes) {
            return Err(StunError::InvalidMessage);
        }
        let m = Message::new(bytes);
        if m.transaction() != self.transaction {
            return Err(StunError::UnknownRequestId);
        }
        if m.class() != CLASS_SUCCESS {
            return Err(StunError::RequestFailed);
        }

        let mut mapped = None;
        for attr in Attributes::new(m.payload()) {
            match attr.kind {
                ATTR_XOR_MAPPED_ADDRESS => {
                    if let Some(addr) = xor_mapped_address(attr, &self.transaction) {
                        return Ok(addr);
                    }
                }
                ATTR_MAPPED_ADDRESS if mapped.is_none() => mapped = mapped_address(attr),
                _ => {}
            }
        }
        mapped.ok_or(StunError::NoAddress)
    }
}

//  0                   1                   2                   3
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |0 0 0 0 0 0 0 0|    Family     |           Port                |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                 Address (32 bits or 128 bits)                 |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+

fn mapped_address(attr: Attribute<'_>) -> Option<SocketAddr> {
    let data = attr.data;
    if data.len() < 8 {
        return None;
    }
    let port = u16_be(data, 2);
    match data[1] {
        FAMILY_IPV4 => Some(SocketAddr::new(Ipv4Addr::from(u32_be(data, 4)).into(), port)),
        FAMILY_IPV6 if data.len() >= 20 => {
            let mut octets = [0u8; 16];
            octets.copy_from_slice(&data[4..20]);
            Some(SocketAddr::new(Ipv6Addr::from(octets).into(), port))
        }
        _ => None,
    }
}

fn xor_mapped_address(attr: Attribute<'_>, transaction: &Transaction) -> Option<SocketAddr> {
    let raw = mapped_address(attr)?;
    let port = raw.port() ^ (MAGIC_COOKIE >> 16) as u16;
    let ip = match raw.ip() {
        IpAddr::V4(ip) => IpAddr::V4(Ipv4Addr::from(u32::from(ip) ^ MAGIC_COOKIE)),
        IpAddr::V6(ip) => {
            let mut key = [0u8; 16];
            key[..4].copy_from_slice(&MAGIC_COOKIE.to_be_bytes());
            key[4..].copy_from_slice(transaction);
            let mut octets = ip.octets();
            octets.iter_mut().zip(key).for_each(|(o, k)| *o ^= k);
            IpAddr::V6(Ipv6Addr::from(octets))
        }
    };
    Some(SocketAddr::new(ip, port))
}
