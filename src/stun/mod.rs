//! STUN binding requests (RFC 5389), just enough to learn the public mapping
//! of a UDP socket.

pub mod attribute;
pub mod client;
pub mod message;
pub mod request;
pub mod stun_error;

pub use attribute::{Attribute, Attributes, AttributesMut};
pub use client::query_external_address;
pub use message::{MAGIC_COOKIE, Message, is_message};
pub use request::Request;
pub use stun_error::StunError;
