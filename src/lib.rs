//! rustyshare streams encoded screen video from a broadcaster to viewers.
//!
//! This crate is the network side of the pipeline: wire codecs (RTP, RTCP,
//! STUN), ICE-lite candidate gathering, the bounded channel that links
//! pipeline stages, and three transports:
//! - `tcp`: length-prefixed frames to one receiver, reconnecting on failure.
//! - `tcp::P2PSender`: one broadcaster, many TCP viewers, per-viewer backpressure.
//! - `rtp`: H264 over RTP/UDP with FU-A fragmentation.
//!
//! Capture, encoding, decoding and display live outside and exchange
//! [`unit::Unit`]s with the transports through [`channel`] endpoints.

/// Big/little-endian field access over byte slices.
pub mod byte_view;
/// Cooperative stop flag shared between a stage and its owner.
pub mod cancellation;
/// Bounded single-producer/single-consumer channel between stages.
pub mod channel;
/// INI-style configuration and the typed stream settings.
pub mod config;
/// Crate-wide error type.
pub mod error;
/// ICE-lite candidate gathering.
pub mod ice;
/// Logging utilities.
pub mod log;
/// RTCP packet views.
pub mod rtcp;
/// RTP packets, FU-A fragmentation and the UDP transport.
pub mod rtp;
/// Thread runner that reports stage failures on a side channel.
pub mod stage;
/// STUN binding requests.
pub mod stun;
/// TCP and P2P transports.
pub mod tcp;
/// Transport traits and factory.
pub mod transport;
/// Encoded access units.
pub mod unit;
/// `tcp://` / `rtp://` stream addresses.
pub mod url;
