//! RTCP views (RFC 3550 §6). Parsing and in-place writing only; nothing here
//! generates reports on its own.
//!
//! ```ignore
//! for header in rtcp::packets(datagram) {
//!     match header.kind() {
//!         Some(PacketType::SenderReport) => { let sr = SenderReport::new(header.packet()); }
//!         _ => {}
//!     }
//! }
//! ```

pub mod app;
pub mod bye;
pub mod common_header;
pub mod packet_type;
pub mod receiver_report;
pub mod report_block;
pub mod sdes;
pub mod sender_report;

pub use app::App;
pub use bye::Bye;
pub use common_header::{Header, packets};
pub use packet_type::PacketType;
pub use receiver_report::ReceiverReport;
pub use report_block::Block;
pub use sdes::{ItemType, SourceDescription, SourceItems};
pub use sender_report::SenderReport;

pub const RTCP_VERSION: u8 = 2;
