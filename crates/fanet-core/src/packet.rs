//! Outbound packet builder and frame serialization
//!
//! [`Packet`] is the application-facing representation of a frame: header,
//! addresses, optional extended header and signature, and an optional
//! decoded payload. Builder methods keep the header flags consistent —
//! requesting an acknowledgment or setting a destination implies the
//! extended header, setting a payload stamps the message type.
//!
//! `build()` produces the wire bytes handed to the MAC;
//! [`Packet::parse`](crate::parser::parse) is the inverse.

use crate::address::Address;
use crate::bitstream::BitWriter;
use crate::header::{AckType, ExtendedHeader, Header, MessageType};
use crate::parser;
use crate::payload::Payload;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Hard upper bound on a radio frame, matching the LoRa FIFO.
pub const MAX_FRAME_LEN: usize = 255;

/// Frame decoding error.
///
/// Only raised when the buffer cannot hold the header layout its own flag
/// bits declare; payload truncation decodes leniently instead.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// Buffer ends inside the declared header layout.
    #[error("frame truncated: header needs {needed} bytes, got {got}")]
    Truncated { needed: usize, got: usize },
}

/// A FANET packet under construction or freshly parsed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Packet {
    header: Header,
    source: Address,
    destination: Option<Address>,
    extended_header: Option<ExtendedHeader>,
    signature: Option<u32>,
    payload: Option<Payload>,
}

impl Packet {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_parts(
        header: Header,
        source: Address,
        destination: Option<Address>,
        extended_header: Option<ExtendedHeader>,
        signature: Option<u32>,
        payload: Option<Payload>,
    ) -> Self {
        Self {
            header,
            source,
            destination,
            extended_header,
            signature,
            payload,
        }
    }

    /// Decode a received frame. See [`crate::parser::parse`].
    pub fn parse(bytes: &[u8]) -> Result<Self, ParseError> {
        parser::parse(bytes)
    }

    pub fn header(&self) -> Header {
        self.header
    }

    pub fn source(&self) -> Address {
        self.source
    }

    pub fn destination(&self) -> Option<Address> {
        self.destination
    }

    pub fn extended_header(&self) -> Option<ExtendedHeader> {
        self.extended_header
    }

    pub fn signature(&self) -> Option<u32> {
        self.signature
    }

    pub fn payload(&self) -> Option<&Payload> {
        self.payload.as_ref()
    }

    pub fn forward(&self) -> bool {
        self.header.forward()
    }

    /// The acknowledgment mode requested by this packet.
    pub fn ack_type(&self) -> AckType {
        self.extended_header
            .map(|eh| eh.ack_type())
            .unwrap_or(AckType::None)
    }

    /// Set the source address.
    pub fn with_source(mut self, source: Address) -> Self {
        self.source = source;
        self
    }

    /// Set the destination, making the packet unicast (implies the extended
    /// header).
    pub fn with_destination(mut self, destination: impl Into<Address>) -> Self {
        self.destination = Some(destination.into());
        self.ensure_extended().set_unicast(true);
        self
    }

    /// Request an acknowledgment. `AckType::None` leaves the packet
    /// untouched.
    pub fn with_ack(mut self, ack_type: AckType) -> Self {
        if ack_type == AckType::None {
            return self;
        }
        self.ensure_extended().set_ack_type(ack_type);
        self
    }

    /// Request a single-hop acknowledgment.
    pub fn single_hop(self) -> Self {
        self.with_ack(AckType::SingleHop)
    }

    /// Request a two-hop acknowledgment.
    pub fn two_hop(self) -> Self {
        self.with_ack(AckType::TwoHop)
    }

    /// Attach an opaque 32-bit signature (implies the extended header).
    pub fn with_signature(mut self, signature: u32) -> Self {
        self.signature = Some(signature);
        self.ensure_extended().set_signature(true);
        self
    }

    /// Set the geographic-forwarding hint bit (implies the extended
    /// header).
    pub fn geo_forward(mut self) -> Self {
        self.ensure_extended().set_geo_forward(true);
        self
    }

    /// Set or clear the relay-eligible bit.
    pub fn with_forward(mut self, forward: bool) -> Self {
        self.header.set_forward(forward);
        self
    }

    /// Attach a payload; the header message type follows the variant.
    pub fn with_payload(mut self, payload: impl Into<Payload>) -> Self {
        let payload = payload.into();
        self.header.set_msg_type(payload.msg_type());
        self.payload = Some(payload);
        self
    }

    fn ensure_extended(&mut self) -> &mut ExtendedHeader {
        self.header.set_extended(true);
        self.extended_header
            .get_or_insert_with(ExtendedHeader::default)
    }

    fn serialize_header(&self, writer: &mut BitWriter) {
        self.header.serialize(writer);
        self.source.serialize(writer);

        if let Some(extended_header) = &self.extended_header {
            extended_header.serialize(writer);

            if let Some(destination) = &self.destination {
                destination.serialize(writer);
            }
            if let Some(signature) = self.signature {
                writer.write_u32_le(signature);
            }
        }
    }

    /// Serialize to wire bytes. ACK-typed or payload-less packets yield an
    /// empty buffer; use [`build_ack`](Self::build_ack) for those.
    pub fn build(&self) -> Vec<u8> {
        let Some(payload) = &self.payload else {
            return Vec::new();
        };
        if self.header.msg_type() == MessageType::Ack {
            return Vec::new();
        }

        let mut writer = BitWriter::with_capacity(MAX_FRAME_LEN);
        self.serialize_header(&mut writer);
        payload.serialize(&mut writer);
        writer.into_bytes()
    }

    /// Serialize as a header-only acknowledgment frame, ignoring any
    /// payload.
    pub fn build_ack(&self) -> Vec<u8> {
        let mut ack_header = self.header;
        ack_header.set_msg_type(MessageType::Ack);

        let mut writer = BitWriter::with_capacity(16);
        ack_header.serialize(&mut writer);
        self.source.serialize(&mut writer);
        if let Some(extended_header) = &self.extended_header {
            extended_header.serialize(&mut writer);
            if let Some(destination) = &self.destination {
                destination.serialize(&mut writer);
            }
            if let Some(signature) = self.signature {
                writer.write_u32_le(signature);
            }
        }
        writer.into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{
        GroundTrackingPayload, GroundType, MessagePayload, NamePayload, TrackingPayload,
    };

    #[test]
    fn test_build_ack_minimal() {
        let packet = Packet::new().with_source(Address::from_u32(0x123456));
        assert_eq!(packet.build_ack(), vec![0x00, 0x12, 0x56, 0x34]);
    }

    #[test]
    fn test_build_ack_with_destination() {
        let packet = Packet::new()
            .with_source(Address::from_u32(0x123456))
            .with_destination(0x987654u32);
        assert_eq!(
            packet.build_ack(),
            vec![0x80, 0x12, 0x56, 0x34, 0x20, 0x98, 0x54, 0x76]
        );
    }

    #[test]
    fn test_build_ack_geo_forward() {
        let packet = Packet::new()
            .with_source(Address::from_u32(0x123456))
            .with_destination(0x987654u32)
            .geo_forward();
        assert_eq!(
            packet.build_ack(),
            vec![0x80, 0x12, 0x56, 0x34, 0x21, 0x98, 0x54, 0x76]
        );
    }

    #[test]
    fn test_build_ack_forward_bit() {
        let packet = Packet::new()
            .with_source(Address::from_u32(0x123456))
            .with_destination(0x987654u32)
            .with_forward(true);
        assert_eq!(
            packet.build_ack(),
            vec![0xC0, 0x12, 0x56, 0x34, 0x20, 0x98, 0x54, 0x76]
        );
    }

    #[test]
    fn test_build_ack_with_signature() {
        let packet = Packet::new()
            .with_source(Address::from_u32(0x123456))
            .with_destination(0x987654u32)
            .with_signature(0x98765432)
            .two_hop();
        assert_eq!(
            packet.build_ack(),
            vec![0x80, 0x12, 0x56, 0x34, 0xB0, 0x98, 0x54, 0x76, 0x32, 0x54, 0x76, 0x98]
        );
    }

    #[test]
    fn test_build_tracking() {
        let mut payload = TrackingPayload::default();
        payload
            .set_longitude(0.0)
            .set_latitude(13.4)
            .set_speed(45.6)
            .set_turn_rate(6.2);
        let packet = Packet::new()
            .with_source(Address::from_u32(0x123456))
            .with_payload(payload);
        assert_eq!(
            packet.build(),
            vec![
                0x01, 0x12, 0x56, 0x34, 0xC0, 0x0E, 0x13, 0x00, 0x00, 0x00, 0x00, 0x00, 0x5B,
                0x00, 0x00, 0x19
            ]
        );
    }

    #[test]
    fn test_build_name() {
        let packet = Packet::new()
            .with_source(Address::from_u32(0x123456))
            .with_payload(NamePayload::from_text("Hello World"));
        assert_eq!(
            packet.build(),
            vec![
                0x02, 0x12, 0x56, 0x34, 0x48, 0x65, 0x6C, 0x6C, 0x6F, 0x20, 0x57, 0x6F, 0x72,
                0x6C, 0x64
            ]
        );
    }

    #[test]
    fn test_build_message() {
        let mut payload = MessagePayload::new();
        payload.set_subheader(0x56).set_message(b"Hello World");
        let packet = Packet::new()
            .with_source(Address::from_u32(0x123456))
            .with_payload(payload);
        assert_eq!(
            packet.build(),
            vec![
                0x03, 0x12, 0x56, 0x34, 0x56, 0x48, 0x65, 0x6C, 0x6C, 0x6F, 0x20, 0x57, 0x6F,
                0x72, 0x6C, 0x64
            ]
        );
    }

    #[test]
    fn test_build_ground_tracking() {
        let mut payload = GroundTrackingPayload::default();
        payload
            .set_latitude(52.4123)
            .set_longitude(-24.6123)
            .set_ground_type(GroundType::NeedARide);
        let packet = Packet::new()
            .with_source(Address::from_u32(0x129876))
            .with_payload(payload);
        assert_eq!(
            packet.build(),
            vec![0x07, 0x12, 0x76, 0x98, 0x95, 0x8A, 0x4A, 0x81, 0x7F, 0xEE, 0x80]
        );
    }

    #[test]
    fn test_build_without_payload_is_empty() {
        let packet = Packet::new().with_source(Address::from_u32(0x123456));
        assert!(packet.build().is_empty());
    }

    #[test]
    fn test_ack_request_sets_forwardable_header() {
        let packet = Packet::new().single_hop();
        assert!(packet.header().extended());
        assert_eq!(packet.ack_type(), AckType::SingleHop);

        let packet = Packet::new().two_hop();
        assert_eq!(packet.ack_type(), AckType::TwoHop);

        let packet = Packet::new().with_ack(AckType::None);
        assert!(!packet.header().extended());
        assert_eq!(packet.ack_type(), AckType::None);
    }

    #[test]
    fn test_destination_implies_unicast() {
        let packet = Packet::new().with_destination(Address::from_u32(0x555555));
        assert!(packet.header().extended());
        assert!(packet.extended_header().unwrap().unicast());
        assert_eq!(packet.destination(), Some(Address::from_u32(0x555555)));
    }
}
