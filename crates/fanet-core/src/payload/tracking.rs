//! Airborne tracking payload (message type 1)
//!
//! Fixed 11 bytes plus an optional trailing turn-rate byte:
//!
//! ```text
//! ┌────────────┬────────────┬─────────────────────────────┬───────┬───────┬────┬ ─ ─ ─┐
//! │ lat (24b)  │ lon (24b)  │ alt low 8 │ t│type│s│alt hi3│ speed │ climb │ gt │ turn │
//! └────────────┴────────────┴─────────────────────────────┴───────┴───────┴────┴ ─ ─ ─┘
//! ```
//!
//! Coordinates are 24-bit little-endian fixed point (×93206 for latitude,
//! ×46603 for longitude). Altitude, speed, climb and turn rate each carry a
//! one-bit scale flag that trades resolution for range when the value does
//! not fit the base unit.

use crate::bitstream::{BitReader, BitWriter};
use crate::header::MessageType;
use serde::{Deserialize, Serialize};

use super::{LATITUDE_SCALE, LONGITUDE_SCALE};

/// Aircraft category carried in three bits of the tracking payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AircraftType {
    #[default]
    Other,
    Paraglider,
    Hangglider,
    Balloon,
    Glider,
    PoweredAircraft,
    Helicopter,
    Uav,
}

impl AircraftType {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            0 => AircraftType::Other,
            1 => AircraftType::Paraglider,
            2 => AircraftType::Hangglider,
            3 => AircraftType::Balloon,
            4 => AircraftType::Glider,
            5 => AircraftType::PoweredAircraft,
            6 => AircraftType::Helicopter,
            _ => AircraftType::Uav,
        }
    }

    pub fn bits(&self) -> u8 {
        match self {
            AircraftType::Other => 0,
            AircraftType::Paraglider => 1,
            AircraftType::Hangglider => 2,
            AircraftType::Balloon => 3,
            AircraftType::Glider => 4,
            AircraftType::PoweredAircraft => 5,
            AircraftType::Helicopter => 6,
            AircraftType::Uav => 7,
        }
    }
}

/// Position, altitude and motion state of an airborne node.
///
/// Setters clamp to the encodable range and store the wire representation,
/// so a value read back reflects the quantization the receiver will see.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingPayload {
    latitude_raw: i32,
    longitude_raw: i32,
    altitude_raw: u16,
    altitude_scale: bool,
    tracking: bool,
    aircraft_type: AircraftType,
    speed_scale: bool,
    speed_raw: u8,
    climb_scale: bool,
    climb_raw: i8,
    ground_track_raw: u8,
    turn_scale: bool,
    turn_raw: i8,
    has_turn_rate: bool,
}

impl TrackingPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn msg_type(&self) -> MessageType {
        MessageType::Tracking
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

    /// Altitude in meters.
    pub fn altitude(&self) -> i16 {
        if self.altitude_scale {
            (self.altitude_raw << 2) as i16
        } else {
            self.altitude_raw as i16
        }
    }

    /// Set the altitude in meters, clamped to 0..=8188. Values above 2047 m
    /// are stored in 4 m steps.
    pub fn set_altitude(&mut self, meters: i16) -> &mut Self {
        let alt = i32::from(meters).clamp(0, 8188);
        if alt > 2047 {
            self.altitude_raw = ((alt + 2) >> 2) as u16;
            self.altitude_scale = true;
        } else {
            self.altitude_raw = alt as u16;
            self.altitude_scale = false;
        }
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

    pub fn aircraft_type(&self) -> AircraftType {
        self.aircraft_type
    }

    pub fn set_aircraft_type(&mut self, value: AircraftType) -> &mut Self {
        self.aircraft_type = value;
        self
    }

    /// Ground speed in km/h.
    pub fn speed(&self) -> f32 {
        if self.speed_scale {
            f32::from(self.speed_raw) * 2.5
        } else {
            f32::from(self.speed_raw) / 2.0
        }
    }

    /// Set the ground speed in km/h, clamped to 0..=317.5.
    pub fn set_speed(&mut self, kmh: f32) -> &mut Self {
        let half_units = ((kmh * 2.0).round() as i32).clamp(0, 127 * 5);
        if half_units > 127 {
            self.speed_raw = ((half_units + 2) / 5) as u8;
            self.speed_scale = true;
        } else {
            self.speed_raw = half_units as u8;
            self.speed_scale = false;
        }
        self
    }

    /// Climb rate in m/s.
    pub fn climb_rate(&self) -> f32 {
        if self.climb_scale {
            f32::from(self.climb_raw) * 0.5
        } else {
            f32::from(self.climb_raw) / 10.0
        }
    }

    /// Set the climb rate in m/s, clamped to ±31.5.
    pub fn set_climb_rate(&mut self, ms: f32) -> &mut Self {
        let tenths = ((ms * 10.0).round() as i32).clamp(-315, 315);
        if tenths.abs() > 63 {
            let rounding = if tenths >= 0 { 2 } else { -2 };
            self.climb_raw = ((tenths + rounding) / 5) as i8;
            self.climb_scale = true;
        } else {
            self.climb_raw = tenths as i8;
            self.climb_scale = false;
        }
        self
    }

    /// Ground track in degrees, 0..360.
    pub fn ground_track(&self) -> f32 {
        f32::from(self.ground_track_raw) * 360.0 / 256.0
    }

    /// Set the ground track in degrees; values outside 0..360 wrap once.
    pub fn set_ground_track(&mut self, degrees: f32) -> &mut Self {
        let mut gt = degrees;
        if gt < 0.0 {
            gt += 360.0;
        } else if gt >= 360.0 {
            gt -= 360.0;
        }
        self.ground_track_raw = ((gt * 256.0 / 360.0).round() as i32).clamp(0, 255) as u8;
        self
    }

    /// Whether the optional turn-rate byte is present.
    pub fn has_turn_rate(&self) -> bool {
        self.has_turn_rate
    }

    /// Turn rate in degrees per second.
    pub fn turn_rate(&self) -> f32 {
        if self.turn_scale {
            f32::from(self.turn_raw)
        } else {
            f32::from(self.turn_raw) / 4.0
        }
    }

    /// Set the turn rate in °/s, clamped to ±254 quarter-degrees. Marks the
    /// optional byte present.
    pub fn set_turn_rate(&mut self, dps: f32) -> &mut Self {
        self.has_turn_rate = true;
        let quarters = ((dps * 4.0).round() as i32).clamp(-254, 254);
        if quarters.abs() >= 63 {
            let rounding = if quarters >= 0 { 2 } else { -2 };
            self.turn_raw = ((quarters + rounding) / 4) as i8;
            self.turn_scale = true;
        } else {
            self.turn_raw = quarters as i8;
            self.turn_scale = false;
        }
        self
    }

    pub fn serialize(&self, writer: &mut BitWriter) {
        writer.write_u24_le(self.latitude_raw as u32);
        writer.write_u24_le(self.longitude_raw as u32);
        writer.write_u8(self.altitude_raw as u8);

        writer.write_bit(self.tracking);
        writer.write_bits(u32::from(self.aircraft_type.bits()), 3);
        writer.write_bit(self.altitude_scale);
        writer.write_bits(u32::from(self.altitude_raw >> 8), 3);

        writer.write_bit(self.speed_scale);
        writer.write_bits(u32::from(self.speed_raw), 7);

        writer.write_bit(self.climb_scale);
        writer.write_bits(self.climb_raw as u32, 7);

        writer.write_u8(self.ground_track_raw);

        if self.has_turn_rate {
            writer.write_bit(self.turn_scale);
            writer.write_bits(self.turn_raw as u32, 7);
        }
    }

    pub fn deserialize(reader: &mut BitReader<'_>) -> Self {
        let mut payload = Self::default();
        payload.latitude_raw = sign_extend_24(reader.read_u24_le().unwrap_or(0));
        payload.longitude_raw = sign_extend_24(reader.read_u24_le().unwrap_or(0));
        payload.altitude_raw = u16::from(reader.read_u8().unwrap_or(0));

        payload.tracking = reader.read_bit().unwrap_or(false);
        payload.aircraft_type = AircraftType::from_bits(reader.read_bits(3).unwrap_or(0) as u8);
        payload.altitude_scale = reader.read_bit().unwrap_or(false);
        payload.altitude_raw |= (reader.read_bits(3).unwrap_or(0) as u16) << 8;

        payload.speed_scale = reader.read_bit().unwrap_or(false);
        payload.speed_raw = reader.read_bits(7).unwrap_or(0) as u8;

        payload.climb_scale = reader.read_bit().unwrap_or(false);
        payload.climb_raw = reader.read_signed_bits(7).unwrap_or(0) as i8;

        payload.ground_track_raw = reader.read_u8().unwrap_or(0);

        // Turn rate byte is optional; a lone scale bit past the mandatory
        // fields marks it present.
        if let Some(turn_scale) = reader.read_bit() {
            payload.has_turn_rate = true;
            payload.turn_scale = turn_scale;
            payload.turn_raw = reader.read_signed_bits(7).unwrap_or(0) as i8;
        }

        payload
    }
}

/// Sign-extend the top bit of a 24-bit field.
pub(crate) fn sign_extend_24(raw: u32) -> i32 {
    ((raw << 8) as i32) >> 8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitstream::{BitReader, BitWriter};

    fn encode(payload: &TrackingPayload) -> Vec<u8> {
        let mut w = BitWriter::new();
        payload.serialize(&mut w);
        w.into_bytes()
    }

    fn decode(bytes: &[u8]) -> TrackingPayload {
        let mut r = BitReader::new(bytes);
        TrackingPayload::deserialize(&mut r)
    }

    #[test]
    fn test_default_encodes_empty_fields() {
        let payload = TrackingPayload::default();
        assert_eq!(encode(&payload), vec![0x00; 11]);
        assert_eq!(payload.latitude(), 0.0);
        assert_eq!(payload.speed(), 0.0);
        assert!(!payload.has_turn_rate());
    }

    #[test]
    fn test_latitude_clamp_and_quantization() {
        let mut payload = TrackingPayload::default();
        payload.set_latitude(56.95812);
        assert!((payload.latitude() - 56.95812).abs() < 0.00001);
        payload.set_latitude(-91.0);
        assert!((payload.latitude() + 90.0).abs() < 0.00001);
        payload.set_latitude(91.0);
        assert!((payload.latitude() - 90.0).abs() < 0.00001);
    }

    #[test]
    fn test_longitude_clamp_and_quantization() {
        let mut payload = TrackingPayload::default();
        payload.set_longitude(160.54197);
        assert!((payload.longitude() - 160.54197).abs() < 0.00002);
        payload.set_longitude(-181.0);
        assert!((payload.longitude() + 180.0).abs() < 0.00002);
        payload.set_longitude(181.0);
        assert!((payload.longitude() - 180.0).abs() < 0.00002);
    }

    #[test]
    fn test_lat_lon_wire_bytes() {
        let mut payload = TrackingPayload::default();
        payload.set_latitude(52.4123).set_longitude(-24.6123);
        // 52.4123 * 93206 = 0x4A8A95, -24.6123 * 46603 = 0xFFEE7F81
        assert_eq!(
            encode(&payload),
            vec![0x95, 0x8A, 0x4A, 0x81, 0x7F, 0xEE, 0x00, 0x00, 0x00, 0x00, 0x00]
        );

        let decoded = decode(&encode(&payload));
        assert!((decoded.latitude() - 52.4123).abs() < 0.0001);
        assert!((decoded.longitude() + 24.6123).abs() < 0.0001);
    }

    #[test]
    fn test_altitude_scaling_steps() {
        let mut payload = TrackingPayload::default();
        payload.set_altitude(2047);
        assert_eq!(payload.altitude(), 2047);
        payload.set_altitude(5677);
        assert_eq!(payload.altitude(), 5676);
        payload.set_altitude(5678);
        assert_eq!(payload.altitude(), 5680);
        payload.set_altitude(-100);
        assert_eq!(payload.altitude(), 0);
        payload.set_altitude(10000);
        assert_eq!(payload.altitude(), 8188);
    }

    #[test]
    fn test_altitude_wire_split() {
        let mut payload = TrackingPayload::default();
        payload.set_altitude(5000); // (5000 + 2) / 4 = 0x4E2, scaled
        assert_eq!(
            encode(&payload),
            vec![0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xE2, 0x0C, 0x00, 0x00, 0x00]
        );
        assert_eq!(decode(&encode(&payload)).altitude(), 5000);
    }

    #[test]
    fn test_aircraft_type_wire_position() {
        let mut payload = TrackingPayload::default();
        payload.set_aircraft_type(AircraftType::Glider);
        assert_eq!(
            encode(&payload),
            vec![0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x40, 0x00, 0x00, 0x00]
        );
        assert_eq!(decode(&encode(&payload)).aircraft_type(), AircraftType::Glider);
    }

    #[test]
    fn test_tracking_bit_wire_position() {
        let mut payload = TrackingPayload::default();
        payload.set_tracking(true);
        assert_eq!(
            encode(&payload),
            vec![0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x80, 0x00, 0x00, 0x00]
        );
        assert!(decode(&encode(&payload)).tracking());
    }

    #[test]
    fn test_speed_scaling() {
        let mut payload = TrackingPayload::default();
        payload.set_speed(60.2);
        assert!((payload.speed() - 60.0).abs() < 0.5);
        payload.set_speed(128.8);
        assert!((payload.speed() - 128.8).abs() < 2.5);
        payload.set_speed(320.0);
        assert!((payload.speed() - 317.5).abs() < 2.5);
        payload.set_speed(-1.0);
        assert_eq!(payload.speed(), 0.0);
    }

    #[test]
    fn test_speed_wire_byte() {
        let mut payload = TrackingPayload::default();
        payload.set_speed(234.0); // 468 half-units -> (468 + 2) / 5 = 0x5E, scaled
        assert_eq!(
            encode(&payload),
            vec![0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xDE, 0x00, 0x00]
        );
        assert!((decode(&encode(&payload)).speed() - 234.0).abs() < 2.0);
    }

    #[test]
    fn test_climb_rate_scaling() {
        let mut payload = TrackingPayload::default();
        for value in [6.2f32, -6.2, 16.8, -16.8, 31.5, -31.5] {
            payload.set_climb_rate(value);
            assert!((payload.climb_rate() - value).abs() < 0.5, "{value}");
        }
        payload.set_climb_rate(100.0);
        assert!((payload.climb_rate() - 31.5).abs() < 0.5);
        payload.set_climb_rate(-100.0);
        assert!((payload.climb_rate() + 31.5).abs() < 0.5);
    }

    #[test]
    fn test_climb_wire_byte() {
        let mut payload = TrackingPayload::default();
        payload.set_climb_rate(5.5); // 55 tenths, unscaled
        assert_eq!(
            encode(&payload),
            vec![0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x37, 0x00]
        );
        assert!((decode(&encode(&payload)).climb_rate() - 5.5).abs() < 0.1);

        payload.set_climb_rate(-5.5); // -55 tenths -> low 7 bits 0x49
        assert_eq!(
            encode(&payload),
            vec![0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x49, 0x00]
        );
        assert!((decode(&encode(&payload)).climb_rate() + 5.5).abs() < 0.1);
    }

    #[test]
    fn test_ground_track_wire_byte() {
        let mut payload = TrackingPayload::default();
        payload.set_ground_track(100.0); // 100 * 256 / 360 = 0x47
        assert_eq!(
            encode(&payload),
            vec![0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x47]
        );
        assert!((decode(&encode(&payload)).ground_track() - 100.0).abs() < 1.4);

        payload.set_ground_track(-90.0);
        assert!((payload.ground_track() - 270.0).abs() < 1.4);
    }

    #[test]
    fn test_turn_rate_scaling() {
        let mut payload = TrackingPayload::default();
        for value in [6.2f32, -6.2, 33.5, -33.5] {
            payload.set_turn_rate(value);
            assert!((payload.turn_rate() - value).abs() <= 0.5, "{value}");
        }
        payload.set_turn_rate(100.0);
        assert!((payload.turn_rate() - 64.0).abs() < 0.5);
        payload.set_turn_rate(-100.0);
        assert!((payload.turn_rate() + 64.0).abs() < 0.5);
    }

    #[test]
    fn test_turn_rate_wire_byte() {
        let mut payload = TrackingPayload::default();
        payload.set_turn_rate(14.4); // 58 quarter-degrees, unscaled
        assert_eq!(
            encode(&payload),
            vec![0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x3A]
        );
        assert!((decode(&encode(&payload)).turn_rate() - 14.4).abs() < 0.2);

        payload.set_turn_rate(-14.4); // -58 -> low 7 bits 0x46
        assert_eq!(
            encode(&payload),
            vec![0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x46]
        );
        assert!((decode(&encode(&payload)).turn_rate() + 14.4).abs() < 0.2);
    }

    #[test]
    fn test_turn_rate_absent_without_trailing_byte() {
        let decoded = decode(&[0x00; 11]);
        assert!(!decoded.has_turn_rate());
        assert_eq!(decoded.turn_rate(), 0.0);
    }

    #[test]
    fn test_truncated_payload_decodes_leniently() {
        let decoded = decode(&[0x95, 0x8A, 0x4A]);
        assert!((decoded.latitude() - 52.4123).abs() < 0.0001);
        assert_eq!(decoded.longitude(), 0.0);
        assert_eq!(decoded.altitude(), 0);
    }
}
