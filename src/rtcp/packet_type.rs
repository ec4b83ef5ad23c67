// RTCP packet types (RFC 3550 §12.1)
pub const PT_SR: u8 = 200;
pub const PT_RR: u8 = 201;
pub const PT_SDES: u8 = 202;
pub const PT_BYE: u8 = 203;
pub const PT_APP: u8 = 204;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketType {
    SenderReport,
    ReceiverReport,
    SourceDescription,
    Bye,
    App,
}

impl PacketType {
    pub fn from_u8(pt: u8) -> Option<Self> {
        match pt {
            PT_SR => Some(Self::SenderReport),
            PT_RR => Some(Self::ReceiverReport),
            PT_SDES => Some(Self::SourceDescription),
            PT_BYE => Some(Self::Bye),
            PT_APP => Some(Self::App),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Self::SenderReport => PT_SR,
            Self::ReceiverReport => PT_RR,
            Self::SourceDescription => PT_SDES,
            Self::Bye => PT_BYE,
            Self::App => PT_APP,
        }
    }
}
