//! Frame headers
//!
//! Every frame starts with a one-byte common header:
//!
//! ```text
//! ┌──────────┬─────────┬──────────────┐
//! │ extended │ forward │  type (6b)   │   MSB first
//! └──────────┴─────────┴──────────────┘
//! ```
//!
//! When the extended bit is set, a second header byte follows the source
//! address:
//!
//! ```text
//! ┌──────────────┬─────────┬───────────┬───────────────┬─────────────┐
//! │ ack type (2b)│ unicast │ signature │ reserved (3b) │ geo forward │
//! └──────────────┴─────────┴───────────┴───────────────┴─────────────┘
//! ```

use crate::bitstream::{BitReader, BitWriter};
use serde::{Deserialize, Serialize};

/// Message type carried in the low six bits of the common header.
///
/// Landmark (5) and remote-config (6) frames are recognized but carry no
/// decoded payload; codes outside the assigned range are preserved verbatim
/// so unknown frames can still be relayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageType {
    /// Acknowledgment (header-only frame)
    Ack,
    /// Airborne position report
    Tracking,
    /// Device/pilot name
    Name,
    /// Short text message
    Message,
    /// Ground service report (weather station, gateway)
    Service,
    /// Landmarks (reserved, not decoded)
    Landmarks,
    /// Remote configuration (reserved, not decoded)
    RemoteConfig,
    /// On-ground position report
    GroundTracking,
    /// Unassigned type code, carried as-is
    Unknown(u8),
}

impl MessageType {
    /// Map a 6-bit type code to its variant.
    pub fn from_byte(code: u8) -> Self {
        match code & 0x3F {
            0 => MessageType::Ack,
            1 => MessageType::Tracking,
            2 => MessageType::Name,
            3 => MessageType::Message,
            4 => MessageType::Service,
            5 => MessageType::Landmarks,
            6 => MessageType::RemoteConfig,
            7 => MessageType::GroundTracking,
            other => MessageType::Unknown(other),
        }
    }

    /// The 6-bit wire code.
    pub fn as_byte(&self) -> u8 {
        match self {
            MessageType::Ack => 0,
            MessageType::Tracking => 1,
            MessageType::Name => 2,
            MessageType::Message => 3,
            MessageType::Service => 4,
            MessageType::Landmarks => 5,
            MessageType::RemoteConfig => 6,
            MessageType::GroundTracking => 7,
            MessageType::Unknown(code) => code & 0x3F,
        }
    }

    /// Position reports get scheduler priority over other traffic.
    pub fn is_tracking(&self) -> bool {
        matches!(self, MessageType::Tracking | MessageType::GroundTracking)
    }
}

impl Default for MessageType {
    fn default() -> Self {
        MessageType::Ack
    }
}

/// One-byte common header: extended flag, forward flag, message type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    extended: bool,
    forward: bool,
    msg_type: MessageType,
}

impl Header {
    pub fn new(extended: bool, forward: bool, msg_type: MessageType) -> Self {
        Self {
            extended,
            forward,
            msg_type,
        }
    }

    pub fn msg_type(&self) -> MessageType {
        self.msg_type
    }

    pub fn set_msg_type(&mut self, value: MessageType) {
        self.msg_type = value;
    }

    pub fn forward(&self) -> bool {
        self.forward
    }

    pub fn set_forward(&mut self, value: bool) {
        self.forward = value;
    }

    pub fn extended(&self) -> bool {
        self.extended
    }

    pub fn set_extended(&mut self, value: bool) {
        self.extended = value;
    }

    pub fn serialize(&self, writer: &mut BitWriter) {
        writer.write_bit(self.extended);
        writer.write_bit(self.forward);
        writer.write_bits(u32::from(self.msg_type.as_byte()), 6);
    }

    pub fn deserialize(reader: &mut BitReader<'_>) -> Option<Self> {
        let extended = reader.read_bit()?;
        let forward = reader.read_bit()?;
        let msg_type = MessageType::from_byte(reader.read_bits(6)? as u8);
        Some(Self {
            extended,
            forward,
            msg_type,
        })
    }
}

/// Acknowledgment mode requested by a frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AckType {
    /// No acknowledgment requested
    #[default]
    None,
    /// Direct neighbor acknowledges
    SingleHop,
    /// Acknowledgment may be relayed once
    TwoHop,
    /// Reserved value; accepted on receive, never acted on
    Reserved,
}

impl AckType {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => AckType::None,
            1 => AckType::SingleHop,
            2 => AckType::TwoHop,
            _ => AckType::Reserved,
        }
    }

    pub fn bits(&self) -> u8 {
        match self {
            AckType::None => 0,
            AckType::SingleHop => 1,
            AckType::TwoHop => 2,
            AckType::Reserved => 3,
        }
    }

    /// True when the sender expects any acknowledgment at all.
    pub fn is_requested(&self) -> bool {
        matches!(self, AckType::SingleHop | AckType::TwoHop)
    }
}

/// Optional second header byte, present when `Header::extended` is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendedHeader {
    ack_type: AckType,
    unicast: bool,
    signature: bool,
    reserved: u8,
    geo_forward: bool,
}

impl ExtendedHeader {
    pub fn new(ack_type: AckType, unicast: bool, signature: bool, geo_forward: bool) -> Self {
        Self {
            ack_type,
            unicast,
            signature,
            reserved: 0,
            geo_forward,
        }
    }

    pub fn ack_type(&self) -> AckType {
        self.ack_type
    }

    pub fn set_ack_type(&mut self, value: AckType) {
        self.ack_type = value;
    }

    pub fn unicast(&self) -> bool {
        self.unicast
    }

    pub fn set_unicast(&mut self, value: bool) {
        self.unicast = value;
    }

    pub fn signature(&self) -> bool {
        self.signature
    }

    pub fn set_signature(&mut self, value: bool) {
        self.signature = value;
    }

    pub fn geo_forward(&self) -> bool {
        self.geo_forward
    }

    pub fn set_geo_forward(&mut self, value: bool) {
        self.geo_forward = value;
    }

    pub fn serialize(&self, writer: &mut BitWriter) {
        writer.write_bits(u32::from(self.ack_type.bits()), 2);
        writer.write_bit(self.unicast);
        writer.write_bit(self.signature);
        writer.write_bits(u32::from(self.reserved), 3);
        writer.write_bit(self.geo_forward);
    }

    pub fn deserialize(reader: &mut BitReader<'_>) -> Option<Self> {
        let ack_type = AckType::from_bits(reader.read_bits(2)? as u8);
        let unicast = reader.read_bit()?;
        let signature = reader.read_bit()?;
        let reserved = reader.read_bits(3)? as u8;
        let geo_forward = reader.read_bit()?;
        Some(Self {
            ack_type,
            unicast,
            signature,
            reserved,
            geo_forward,
        })
    }
}
