use std::{
    io::ErrorKind,
    net::{SocketAddr, UdpSocket},
    time::{Duration, Instant},
};

use super::{request::Request, stun_error::StunError};

/// Initial retransmission timeout (RFC 5389 §7.2.1).
const RETRANSMIT_INTERVAL: Duration = Duration::from_millis(500);
const RECV_BUFFER_SIZE: usize = 1500;

/// Asks `server` for the reflexive address of `socket`.
///
/// Datagrams from other hosts are skipped. The request is retransmitted
/// every 500 ms until `timeout` elapses. The socket's read timeout is restored
/// before returning.
pub fn query_external_address(
    socket: &UdpSocket,
    server: SocketAddr,
    timeout: Duration,
) -> Result<SocketAddr, StunError> {
    let previous = socket.read_timeout()?;
    let result = exchange(socket, server, timeout);
    socket.set_read_timeout(previous)?;
    result
}

fn exchange(
    socket: &UdpSocket,
    server: SocketAddr,
    timeout: Duration,
) -> Result<SocketAddr, StunError> {
    let request = Request::new();
    let deadline = Instant::now() + timeout;
    let mut next_send = Instant::now();
    let mut buf = [0u8; RECV_BUFFER_SIZE];

    loop {
        let now = Instant::now();
        if now >= deadline {
            return Err(StunError::Timeout);
        }
        if now >= next_send {
            request.send(socket, server)?;
            next_send = now + RETRANSMIT_INTERVAL;
        }

        let wait = next_send.min(deadline).saturating_duration_since(now);
        socket.set_read_timeout(Some(wait.max(Duration::from_millis(1))))?;

        let (n, from) = match socket.recv_from(&mut buf) {
            Ok(r) => r,
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => continue,
            // ICMP port unreachable from an earlier send; keep waiting
            Err(e) if e.kind() == ErrorKind::ConnectionReset => continue,
            Err(e) => return Err(e.into()),
        };
        if from != server {
            continue;
        }
        match request.process_response(&buf[..n]) {
            Err(StunError::UnknownRequestId | StunError::InvalidMessage) => continue,
            other => return other,
        }
    }
}
