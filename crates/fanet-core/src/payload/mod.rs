//! Payload variants
//!
//! One decodable payload exists per message type; the [`Payload`] sum type
//! carries whichever variant a frame holds and dispatches serialization by
//! match. Landmark and remote-config frames (types 5 and 6) have no payload
//! representation and pass through undecoded.

pub mod ground_tracking;
pub mod message;
pub mod name;
pub mod service;
pub mod tracking;

pub use ground_tracking::{GroundTrackingPayload, GroundType};
pub use message::{MessagePayload, MAX_MESSAGE_LEN};
pub use name::{NamePayload, MAX_NAME_LEN};
pub use service::ServicePayload;
pub use tracking::{AircraftType, TrackingPayload};

use crate::bitstream::BitWriter;
use crate::header::MessageType;
use serde::{Deserialize, Serialize};

/// Fixed-point scale for latitudes: degrees × 93206 in 24 bits.
pub const LATITUDE_SCALE: f32 = 93206.0;
/// Fixed-point scale for longitudes: degrees × 46603 in 24 bits.
pub const LONGITUDE_SCALE: f32 = 46603.0;

/// The decoded payload of a frame, tagged by message type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Payload {
    Tracking(TrackingPayload),
    Name(NamePayload),
    Message(MessagePayload),
    Service(ServicePayload),
    GroundTracking(GroundTrackingPayload),
}

impl Payload {
    /// The message type this payload serializes as.
    pub fn msg_type(&self) -> MessageType {
        match self {
            Payload::Tracking(_) => MessageType::Tracking,
            Payload::Name(_) => MessageType::Name,
            Payload::Message(_) => MessageType::Message,
            Payload::Service(_) => MessageType::Service,
            Payload::GroundTracking(_) => MessageType::GroundTracking,
        }
    }

    pub fn serialize(&self, writer: &mut BitWriter) {
        match self {
            Payload::Tracking(p) => p.serialize(writer),
            Payload::Name(p) => p.serialize(writer),
            Payload::Message(p) => p.serialize(writer),
            Payload::Service(p) => p.serialize(writer),
            Payload::GroundTracking(p) => p.serialize(writer),
        }
    }
}

impl From<TrackingPayload> for Payload {
    fn from(p: TrackingPayload) -> Self {
        Payload::Tracking(p)
    }
}

impl From<NamePayload> for Payload {
    fn from(p: NamePayload) -> Self {
        Payload::Name(p)
    }
}

impl From<MessagePayload> for Payload {
    fn from(p: MessagePayload) -> Self {
        Payload::Message(p)
    }
}

impl From<ServicePayload> for Payload {
    fn from(p: ServicePayload) -> Self {
        Payload::Service(p)
    }
}

impl From<GroundTrackingPayload> for Payload {
    fn from(p: GroundTrackingPayload) -> Self {
        Payload::GroundTracking(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_message_types() {
        assert_eq!(
            Payload::from(TrackingPayload::default()).msg_type(),
            MessageType::Tracking
        );
        assert_eq!(
            Payload::from(NamePayload::default()).msg_type(),
            MessageType::Name
        );
        assert_eq!(
            Payload::from(MessagePayload::default()).msg_type(),
            MessageType::Message
        );
        assert_eq!(
            Payload::from(ServicePayload::default()).msg_type(),
            MessageType::Service
        );
        assert_eq!(
            Payload::from(GroundTrackingPayload::default()).msg_type(),
            MessageType::GroundTracking
        );
    }

    #[test]
    fn test_dispatched_serialize_matches_direct() {
        let mut tracking = TrackingPayload::default();
        tracking.set_altitude(1000).set_climb_rate(2.0);

        let mut direct = BitWriter::new();
        tracking.serialize(&mut direct);

        let mut dispatched = BitWriter::new();
        Payload::from(tracking).serialize(&mut dispatched);

        assert_eq!(direct.into_bytes(), dispatched.into_bytes());
    }
}
