//! Ground tracking payload (message type 7)
//!
//! Seven bytes: 24-bit latitude, 24-bit longitude, then one status byte
//! `type(4) | reserved(3) | tracking(1)`.

use crate::bitstream::{BitReader, BitWriter};
use crate::header::MessageType;
use serde::{Deserialize, Serialize};

use super::tracking::sign_extend_24;
use super::{LATITUDE_SCALE, LONGITUDE_SCALE};

/// Ground activity or distress state carried in the status nibble.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroundType {
    #[default]
    Other,
    Walking,
    Vehicle,
    Bike,
    Boot,
    NeedARide,
    NeedTechnicalSupport,
    NeedMedicalHelp,
    DistressCall,
    DistressCallAuto,
    /// Unassigned code, carried as-is
    Unknown(u8),
}

impl GroundType {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x0F {
            0 => GroundType::Other,
            1 => GroundType::Walking,
            2 => GroundType::Vehicle,
            3 => GroundType::Bike,
            4 => GroundType::Boot,
            8 => GroundType::NeedARide,
            12 => GroundType::NeedTechnicalSupport,
            13 => GroundType::NeedMedicalHelp,
            14 => GroundType::DistressCall,
            15 => GroundType::DistressCallAuto,
            other => GroundType::Unknown(other),
        }
    }

    pub fn bits(&self) -> u8 {
        match self {
            GroundType::Other => 0,
            GroundType::Walking => 1,
            GroundType::Vehicle => 2,
            GroundType::Bike => 3,
            GroundType::Boot => 4,
            GroundType::NeedARide => 8,
            GroundType::NeedTechnicalSupport => 12,
            GroundType::NeedMedicalHelp => 13,
            GroundType::DistressCall => 14,
            GroundType::DistressCallAuto => 15,
            GroundType::Unknown(code) => code & 0x0F,
        }
    }
}

/// Position report for a node on the ground.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundTrackingPayload {
    latitude_raw: i32,
    longitude_raw: i32,
    ground_type: GroundType,
    reserved: u8,
    tracking: bool,
}

impl GroundTrackingPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn msg_type(&self) -> MessageType {
        MessageType::GroundTracking
    }

    /// Latitude in degrees.
    pub fn latitude(&self) -> f32 {
        self.latitude_raw as f32 / LATITUDE_SCALE
    }

    /// Set the latitude in degrees, clamped to ±90°.
    pub fn set_latitude(&mut self, degrees: f32) -> &mut Self {
        let clamped = degrees.clamp(-90.0, 90.0);
        self.latitude_raw = (clamped * LATITUDE_SCALE).round() as i32;
        self
    }

    /// Longitude in degrees.
    pub fn longitude(&self) -> f32 {
        self.longitude_raw as f32 / LONGITUDE_SCALE
    }

    /// Set the longitude in degrees, clamped to ±180°.
    pub fn set_longitude(&mut self, degrees: f32) -> &mut Self {
        let clamped = degrees.clamp(-180.0, 180.0);
        self.longitude_raw = (clamped * LONGITUDE_SCALE).round() as i32;
        self
    }

    pub fn ground_type(&self) -> GroundType {
        self.ground_type
    }

    pub fn set_ground_type(&mut self, value: GroundType) -> &mut Self {
        self.ground_type = value;
        self
    }

    /// Whether this node consents to live tracking.
    pub fn tracking(&self) -> bool {
        self.tracking
    }

    pub fn set_tracking(&mut self, value: bool) -> &mut Self {
        self.tracking = value;
        self
    }

    pub fn serialize(&self, writer: &mut BitWriter) {
        writer.write_u24_le(self.latitude_raw as u32);
        writer.write_u24_le(self.longitude_raw as u32);
        writer.write_bits(u32::from(self.ground_type.bits()), 4);
        writer.write_bits(u32::from(self.reserved), 3);
        writer.write_bit(self.tracking);
    }

    pub fn deserialize(reader: &mut BitReader<'_>) -> Self {
        let mut payload = Self::default();
        payload.latitude_raw = sign_extend_24(reader.read_u24_le().unwrap_or(0));
        payload.longitude_raw = sign_extend_24(reader.read_u24_le().unwrap_or(0));
        payload.ground_type = GroundType::from_bits(reader.read_bits(4).unwrap_or(0) as u8);
        payload.reserved = reader.read_bits(3).unwrap_or(0) as u8;
        payload.tracking = reader.read_bit().unwrap_or(false);
        payload
    }
}
