//! Service payload (message type 4)
//!
//! Weather-station / gateway report. One feature byte announces which
//! fields follow; the station position is always present:
//!
//! ```text
//! ┌──────────┬ ─ ─ ─ ─ ┬───────────┬───────────┬ ─ ─ ─┬ ─ ─ ─ ┬ ─ ─ ─ ─┬ ─ ─ ─┬ ─ ─ ─ ─┐
//! │ features │ ext byte│ lat (24b) │ lon (24b) │ temp │ wind  │ humidity│ baro │ battery│
//! └──────────┴ ─ ─ ─ ─ ┴───────────┴───────────┴ ─ ─ ─┴ ─ ─ ─ ┴ ─ ─ ─ ─┴ ─ ─ ─┴ ─ ─ ─ ─┘
//! ```
//!
//! Feature bits, MSB first: gateway, temperature, wind, humidity,
//! barometric, reserved, battery, extended. The wind block is heading plus
//! speed and gust, each with the usual 1-bit ×5 scale flag.

use crate::bitstream::{BitReader, BitWriter};
use crate::header::MessageType;
use serde::{Deserialize, Serialize};

use super::tracking::sign_extend_24;
use super::{LATITUDE_SCALE, LONGITUDE_SCALE};

const FEATURE_GATEWAY: u8 = 0x80;
const FEATURE_TEMPERATURE: u8 = 0x40;
const FEATURE_WIND: u8 = 0x20;
const FEATURE_HUMIDITY: u8 = 0x10;
const FEATURE_BAROMETRIC: u8 = 0x08;
const FEATURE_BATTERY: u8 = 0x02;
const FEATURE_EXTENDED: u8 = 0x01;

/// Ground service report with conditionally present measurements.
///
/// Setters clamp to the encodable range, store the wire representation, and
/// raise the matching feature bit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicePayload {
    features: u8,
    extended: u8,
    latitude_raw: i32,
    longitude_raw: i32,
    temperature_raw: i8,
    wind_heading_raw: u8,
    wind_speed_scale: bool,
    wind_speed_raw: u8,
    wind_gust_scale: bool,
    wind_gust_raw: u8,
    humidity_raw: u8,
    barometric_raw: u16,
    battery_raw: u8,
}

impl ServicePayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn msg_type(&self) -> MessageType {
        MessageType::Service
    }

    pub fn has_gateway(&self) -> bool {
        self.features & FEATURE_GATEWAY != 0
    }

    pub fn has_temperature(&self) -> bool {
        self.features & FEATURE_TEMPERATURE != 0
    }

    pub fn has_wind(&self) -> bool {
        self.features & FEATURE_WIND != 0
    }

    pub fn has_humidity(&self) -> bool {
        self.features & FEATURE_HUMIDITY != 0
    }

    pub fn has_barometric(&self) -> bool {
        self.features & FEATURE_BAROMETRIC != 0
    }

    pub fn has_battery(&self) -> bool {
        self.features & FEATURE_BATTERY != 0
    }

    pub fn has_extended(&self) -> bool {
        self.features & FEATURE_EXTENDED != 0
    }

    /// Announce (or retract) internet gateway capability.
    pub fn set_gateway(&mut self, enabled: bool) -> &mut Self {
        if enabled {
            self.features |= FEATURE_GATEWAY;
        } else {
            self.features &= !FEATURE_GATEWAY;
        }
        self
    }

    /// Opaque second feature byte, present when the extended bit is set.
    pub fn extended_byte(&self) -> u8 {
        self.extended
    }

    /// Set the opaque second feature byte and raise the extended bit.
    pub fn set_extended_byte(&mut self, value: u8) -> &mut Self {
        self.features |= FEATURE_EXTENDED;
        self.extended = value;
        self
    }

    /// Station latitude in degrees.
    pub fn latitude(&self) -> f32 {
        self.latitude_raw as f32 / LATITUDE_SCALE
    }

    /// Set the station latitude in degrees, clamped to ±90°.
    pub fn set_latitude(&mut self, degrees: f32) -> &mut Self {
        let clamped = degrees.clamp(-90.0, 90.0);
        self.latitude_raw = (clamped * LATITUDE_SCALE).round() as i32;
        self
    }

    /// Station longitude in degrees.
    pub fn longitude(&self) -> f32 {
        self.longitude_raw as f32 / LONGITUDE_SCALE
    }

    /// Set the station longitude in degrees, clamped to ±180°.
    pub fn set_longitude(&mut self, degrees: f32) -> &mut Self {
        let clamped = degrees.clamp(-180.0, 180.0);
        self.longitude_raw = (clamped * LONGITUDE_SCALE).round() as i32;
        self
    }

    /// Air temperature in °C.
    pub fn temperature(&self) -> f32 {
        f32::from(self.temperature_raw) / 2.0
    }

    /// Set the air temperature in °C (0.5 °C steps, clamped to ±64).
    pub fn set_temperature(&mut self, celsius: f32) -> &mut Self {
        self.features |= FEATURE_TEMPERATURE;
        self.temperature_raw = ((celsius * 2.0).round() as i32).clamp(-128, 127) as i8;
        self
    }

    /// Wind heading in degrees, 0..360.
    pub fn wind_heading(&self) -> f32 {
        f32::from(self.wind_heading_raw) * 360.0 / 256.0
    }

    /// Set the wind heading in degrees; values outside 0..360 wrap once.
    pub fn set_wind_heading(&mut self, degrees: f32) -> &mut Self {
        self.features |= FEATURE_WIND;
        let mut heading = degrees;
        if heading < 0.0 {
            heading += 360.0;
        } else if heading >= 360.0 {
            heading -= 360.0;
        }
        self.wind_heading_raw = ((heading * 256.0 / 360.0).round() as i32).clamp(0, 255) as u8;
        self
    }

    /// Wind speed in km/h.
    pub fn wind_speed(&self) -> f32 {
        if self.wind_speed_scale {
            f32::from(self.wind_speed_raw)
        } else {
            f32::from(self.wind_speed_raw) / 5.0
        }
    }

    /// Set the wind speed in km/h, clamped to 0..=127.
    pub fn set_wind_speed(&mut self, kmh: f32) -> &mut Self {
        self.features |= FEATURE_WIND;
        let fifths = ((kmh * 5.0).round() as i32).clamp(0, 127 * 5);
        if fifths > 127 {
            self.wind_speed_raw = (fifths / 5) as u8;
            self.wind_speed_scale = true;
        } else {
            self.wind_speed_raw = fifths as u8;
            self.wind_speed_scale = false;
        }
        self
    }

    /// Wind gust speed in km/h.
    pub fn wind_gust(&self) -> f32 {
        if self.wind_gust_scale {
            f32::from(self.wind_gust_raw)
        } else {
            f32::from(self.wind_gust_raw) / 5.0
        }
    }

    /// Set the wind gust speed in km/h, clamped to 0..=127.
    pub fn set_wind_gust(&mut self, kmh: f32) -> &mut Self {
        self.features |= FEATURE_WIND;
        let fifths = ((kmh * 5.0).round() as i32).clamp(0, 127 * 5);
        if fifths > 127 {
            self.wind_gust_raw = (fifths / 5) as u8;
            self.wind_gust_scale = true;
        } else {
            self.wind_gust_raw = fifths as u8;
            self.wind_gust_scale = false;
        }
        self
    }

    /// Relative humidity in percent.
    pub fn humidity(&self) -> f32 {
        f32::from(self.humidity_raw) * 0.4
    }

    /// Set the relative humidity in percent (0.4 % steps).
    pub fn set_humidity(&mut self, percent: f32) -> &mut Self {
        self.features |= FEATURE_HUMIDITY;
        self.humidity_raw = ((percent * 2.5).round() as i32).clamp(0, 250) as u8;
        self
    }

    /// Barometric pressure in hPa, normalized to sea level.
    pub fn barometric(&self) -> f32 {
        f32::from(self.barometric_raw) / 10.0 + 430.0
    }

    /// Set the barometric pressure in hPa (0.1 hPa steps above the 430 hPa
    /// offset).
    pub fn set_barometric(&mut self, hpa: f32) -> &mut Self {
        self.features |= FEATURE_BAROMETRIC;
        self.barometric_raw = (((hpa - 430.0) * 10.0).round() as i32).clamp(0, 0xFFFF) as u16;
        self
    }

    /// Battery state of charge in percent.
    pub fn battery(&self) -> f32 {
        f32::from(self.battery_raw) * 100.0 / 15.0
    }

    /// Set the battery state of charge in percent (15 steps of ≈6.66 %).
    pub fn set_battery(&mut self, percent: f32) -> &mut Self {
        self.features |= FEATURE_BATTERY;
        self.battery_raw = ((percent * 15.0 / 100.0).round() as i32).clamp(0, 15) as u8;
        self
    }

    pub fn serialize(&self, writer: &mut BitWriter) {
        writer.write_u8(self.features);
        if self.has_extended() {
            writer.write_u8(self.extended);
        }

        writer.write_u24_le(self.latitude_raw as u32);
        writer.write_u24_le(self.longitude_raw as u32);

        if self.has_temperature() {
            writer.write_u8(self.temperature_raw as u8);
        }

        if self.has_wind() {
            writer.write_u8(self.wind_heading_raw);
            writer.write_bit(self.wind_speed_scale);
            writer.write_bits(u32::from(self.wind_speed_raw), 7);
            writer.write_bit(self.wind_gust_scale);
            writer.write_bits(u32::from(self.wind_gust_raw), 7);
        }

        if self.has_humidity() {
            writer.write_u8(self.humidity_raw);
        }

        if self.has_barometric() {
            writer.write_u16(self.barometric_raw);
        }

        if self.has_battery() {
            writer.write_u8(self.battery_raw & 0x0F);
        }
    }

    pub fn deserialize(reader: &mut BitReader<'_>) -> Self {
        let mut payload = Self::default();
        payload.features = reader.read_u8().unwrap_or(0);
        if payload.has_extended() {
            payload.extended = reader.read_u8().unwrap_or(0);
        }

        payload.latitude_raw = sign_extend_24(reader.read_u24_le().unwrap_or(0));
        payload.longitude_raw = sign_extend_24(reader.read_u24_le().unwrap_or(0));

        if payload.has_temperature() {
            payload.temperature_raw = reader.read_u8().unwrap_or(0) as i8;
        }

        if payload.has_wind() {
            payload.wind_heading_raw = reader.read_u8().unwrap_or(0);
            payload.wind_speed_scale = reader.read_bit().unwrap_or(false);
            payload.wind_speed_raw = reader.read_bits(7).unwrap_or(0) as u8;
            payload.wind_gust_scale = reader.read_bit().unwrap_or(false);
            payload.wind_gust_raw = reader.read_bits(7).unwrap_or(0) as u8;
        }

        if payload.has_humidity() {
            payload.humidity_raw = reader.read_u8().unwrap_or(0);
        }

        if payload.has_barometric() {
            payload.barometric_raw = reader.read_u16().unwrap_or(0);
        }

        if payload.has_battery() {
            payload.battery_raw = reader.read_u8().unwrap_or(0) & 0x0F;
        }

        payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitstream::{BitReader, BitWriter};

    fn encode(payload: &ServicePayload) -> Vec<u8> {
        let mut w = BitWriter::new();
        payload.serialize(&mut w);
        w.into_bytes()
    }

    fn decode(bytes: &[u8]) -> ServicePayload {
        let mut r = BitReader::new(bytes);
        ServicePayload::deserialize(&mut r)
    }

    #[test]
    fn test_default_is_header_and_position_only() {
        let payload = ServicePayload::default();
        assert_eq!(encode(&payload), vec![0x00; 7]);
        assert!(!payload.has_wind());
        assert!(!payload.has_temperature());
        assert!(!payload.has_battery());
        assert_eq!(payload.barometric(), 430.0);
    }

    #[test]
    fn test_feature_bits() {
        let mut payload = ServicePayload::default();
        payload.set_gateway(true);
        assert!(payload.has_gateway());
        assert_eq!(encode(&payload)[0], 0x80);
        payload.set_gateway(false);
        payload.set_temperature(1.0);
        payload.set_humidity(1.0);
        assert_eq!(encode(&payload)[0], 0x50);
        payload.set_battery(50.0);
        assert_eq!(encode(&payload)[0], 0x52);
    }

    #[test]
    fn test_full_station_report_wire_bytes() {
        let mut payload = ServicePayload::default();
        payload
            .set_latitude(57.05812)
            .set_longitude(10.05419)
            .set_wind_gust(3.5)
            .set_wind_speed(12.6)
            .set_wind_heading(123.0)
            .set_temperature(12.5)
            .set_humidity(75.0);
        assert_eq!(
            encode(&payload),
            vec![0x70, 0x0F, 0x26, 0x51, 0x4B, 0x26, 0x07, 0x19, 0x57, 0x3F, 0x12, 0xBC]
        );
    }

    #[test]
    fn test_full_station_report_round_trip() {
        let mut payload = ServicePayload::default();
        payload
            .set_latitude(57.05812)
            .set_longitude(10.05419)
            .set_wind_gust(3.5)
            .set_wind_speed(12.6)
            .set_wind_heading(123.0)
            .set_temperature(12.5)
            .set_humidity(75.0)
            .set_barometric(1013.0)
            .set_battery(80.0);
        let decoded = decode(&encode(&payload));
        assert!((decoded.latitude() - 57.05812).abs() < 0.00001);
        assert!((decoded.longitude() - 10.05419).abs() < 0.00001);
        assert!((decoded.wind_gust() - 3.5).abs() < 1.0);
        assert!((decoded.wind_speed() - 12.6).abs() < 1.0);
        assert!((decoded.wind_heading() - 123.0).abs() < 1.4);
        assert!((decoded.temperature() - 12.5).abs() < 0.5);
        assert!((decoded.humidity() - 75.0).abs() < 0.4);
        assert!((decoded.barometric() - 1013.0).abs() < 0.1);
        assert!((decoded.battery() - 80.0).abs() < 3.4);
    }

    #[test]
    fn test_temperature_clamp() {
        let mut payload = ServicePayload::default();
        payload.set_temperature(-128.0);
        assert!((payload.temperature() + 64.0).abs() < 0.5);
        payload.set_temperature(128.0);
        assert!((payload.temperature() - 63.5).abs() < 0.5);
        payload.set_temperature(-22.5);
        assert!((payload.temperature() + 22.5).abs() < 0.5);
    }

    #[test]
    fn test_wind_speed_scaling() {
        let mut payload = ServicePayload::default();
        payload.set_wind_speed(12.6);
        assert!((payload.wind_speed() - 12.6).abs() < 0.2);
        payload.set_wind_speed(50.5);
        assert!((payload.wind_speed() - 50.5).abs() < 1.0);
        payload.set_wind_speed(-10.0);
        assert_eq!(payload.wind_speed(), 0.0);
        payload.set_wind_speed(255.0);
        assert!((payload.wind_speed() - 127.0).abs() < 1.0);
    }

    #[test]
    fn test_wind_heading_wraps() {
        let mut payload = ServicePayload::default();
        payload.set_wind_heading(-123.0);
        assert!((payload.wind_heading() - 237.0).abs() < 1.4);
        payload.set_wind_heading(400.0);
        assert!((payload.wind_heading() - 40.0).abs() < 1.4);
    }

    #[test]
    fn test_barometric_scaling() {
        let mut payload = ServicePayload::default();
        payload.set_barometric(0.0);
        assert!((payload.barometric() - 430.0).abs() < 0.1);
        payload.set_barometric(1013.2);
        assert!((payload.barometric() - 1013.2).abs() < 0.1);
        // Offset plus full 16-bit range tops out well above any real QNH.
        payload.set_barometric(8000.0);
        assert!((payload.barometric() - 6983.5).abs() < 0.1);
    }

    #[test]
    fn test_battery_nibble() {
        let mut payload = ServicePayload::default();
        payload.set_battery(0.0);
        assert_eq!(payload.battery(), 0.0);
        payload.set_battery(100.0);
        assert!((payload.battery() - 100.0).abs() < 0.01);
        payload.set_battery(50.0);
        assert!((payload.battery() - 53.3).abs() < 3.4);
        payload.set_battery(150.0);
        assert!((payload.battery() - 100.0).abs() < 0.01);

        let decoded = decode(&encode(&payload));
        assert!(decoded.has_battery());
        assert!((decoded.battery() - 100.0).abs() < 0.01);
    }

    #[test]
    fn test_extended_byte_passthrough() {
        let mut payload = ServicePayload::default();
        payload.set_extended_byte(0xA5);
        let bytes = encode(&payload);
        assert_eq!(bytes[0], 0x01);
        assert_eq!(bytes[1], 0xA5);
        let decoded = decode(&bytes);
        assert!(decoded.has_extended());
        assert_eq!(decoded.extended_byte(), 0xA5);
    }

    #[test]
    fn test_truncated_wind_block_decodes_leniently() {
        // Features announce wind but the frame ends after the heading byte.
        let bytes = [0x20, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x57];
        let decoded = decode(&bytes);
        assert!(decoded.has_wind());
        assert!((decoded.wind_heading() - 122.3).abs() < 1.4);
        assert_eq!(decoded.wind_speed(), 0.0);
    }
}
