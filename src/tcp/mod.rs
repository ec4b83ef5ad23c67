//! Reliable transport over TCP: `u32 length (little-endian) || payload`
//! frames, a reconnecting point-to-point sender/receiver pair and the
//! one-to-many P2P broadcaster.

pub mod framing;
pub mod p2p_sender;
pub mod packet_parser;
pub mod tcp_error;
pub mod tcp_receiver;
pub mod tcp_sender;

pub use framing::{FrameWriter, WriteState};
pub use p2p_sender::{P2PSender, P2PStats};
pub use packet_parser::{MAX_PACKET_SIZE, PacketParser};
pub use tcp_error::TcpError;
pub use tcp_receiver::PacketReceiver;
pub use tcp_sender::PacketSender;
