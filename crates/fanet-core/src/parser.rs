//! Wire frame parser
//!
//! Decodes a received byte buffer into a [`Packet`]: common header, source,
//! optional extended header, destination and signature, then the payload
//! for the five decodable message types. ACK frames and the reserved types
//! (landmarks, remote-config) as well as unassigned codes carry no payload;
//! their header fields remain available for relaying.

use crate::address::Address;
use crate::bitstream::BitReader;
use crate::header::{ExtendedHeader, Header, MessageType};
use crate::packet::{Packet, ParseError};
use crate::payload::{
    GroundTrackingPayload, MessagePayload, NamePayload, Payload, ServicePayload, TrackingPayload,
};

/// Smallest possible frame: common header plus source address.
pub const MIN_FRAME_LEN: usize = 4;

/// Decode a received frame.
///
/// Fails only when the buffer ends inside the header layout its own flag
/// bits declare; a truncated payload decodes leniently and an unknown type
/// code yields a packet without payload.
pub fn parse(bytes: &[u8]) -> Result<Packet, ParseError> {
    let truncated = |needed: usize| ParseError::Truncated {
        needed,
        got: bytes.len(),
    };

    let mut reader = BitReader::new(bytes);

    let header = Header::deserialize(&mut reader).ok_or(truncated(MIN_FRAME_LEN))?;
    let source = Address::deserialize(&mut reader).ok_or(truncated(MIN_FRAME_LEN))?;

    let mut extended_header = None;
    let mut destination = None;
    let mut signature = None;

    if header.extended() {
        let mut needed = MIN_FRAME_LEN + 1;
        let eh = ExtendedHeader::deserialize(&mut reader).ok_or(truncated(needed))?;

        if eh.unicast() {
            needed += 3;
            destination = Some(Address::deserialize(&mut reader).ok_or(truncated(needed))?);
        }
        if eh.signature() {
            needed += 4;
            signature = Some(reader.read_u32_le().ok_or(truncated(needed))?);
        }
        extended_header = Some(eh);
    }

    let payload = match header.msg_type() {
        MessageType::Tracking => Some(Payload::Tracking(TrackingPayload::deserialize(&mut reader))),
        MessageType::Name => Some(Payload::Name(NamePayload::deserialize(&mut reader))),
        MessageType::Message => Some(Payload::Message(MessagePayload::deserialize(&mut reader))),
        MessageType::Service => Some(Payload::Service(ServicePayload::deserialize(&mut reader))),
        MessageType::GroundTracking => Some(Payload::GroundTracking(
            GroundTrackingPayload::deserialize(&mut reader),
        )),
        // ACK, reserved and unassigned types carry no payload.
        _ => None,
    };

    Ok(Packet::from_parts(
        header,
        source,
        destination,
        extended_header,
        signature,
        payload,
    ))
}
