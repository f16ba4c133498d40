//! Regulatory zone lookup
//!
//! Maps a position to the radio parameters (center frequency, maximum TX
//! power, bandwidth) legal at that location. Lookup is a first-match scan
//! over integer bounding boxes; the table must end with the `UNK` sentinel,
//! which is returned when nothing matches. Custom tables can be supplied
//! for deployments with their own regulatory data.

use serde::Serialize;

/// Radio parameters and bounding box of one regulatory region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ZoneRegion {
    /// Region label, e.g. `"EU868"`.
    pub name: &'static str,
    /// Channel center frequency in kHz.
    pub channel_khz: u32,
    /// Maximum TX power in dBm.
    pub max_dbm: i16,
    /// Channel bandwidth in kHz.
    pub bandwidth_khz: u16,
    /// Northern latitude bound, degrees.
    pub lat1: i16,
    /// Southern latitude bound, degrees.
    pub lat2: i16,
    /// Eastern longitude bound, degrees.
    pub lon1: i16,
    /// Western longitude bound, degrees.
    pub lon2: i16,
}

impl ZoneRegion {
    const fn new(
        name: &'static str,
        channel_khz: u32,
        max_dbm: i16,
        bandwidth_khz: u16,
        lat1: i16,
        lat2: i16,
        lon1: i16,
        lon2: i16,
    ) -> Self {
        Self {
            name,
            channel_khz,
            max_dbm,
            bandwidth_khz,
            lat1,
            lat2,
            lon1,
            lon2,
        }
    }

    fn contains(&self, lat: i16, lon: i16) -> bool {
        lat >= self.lat2 && lat <= self.lat1 && lon >= self.lon2 && lon <= self.lon1
    }
}

/// Sentinel returned when no region matches. Must terminate every table.
pub const UNKNOWN_ZONE: ZoneRegion = ZoneRegion::new("UNK", 0, -127, 0, 0, 0, 0, 0);

/// Built-in regulatory table. EU868 doubles as a catch-all for any valid
/// coordinates not claimed by an earlier entry.
pub const DEFAULT_ZONES: &[ZoneRegion] = &[
    ZoneRegion::new("US920", 920_800, 15, 500, 90, -90, -30, -169),
    ZoneRegion::new("AU920", 920_800, 15, 500, -10, -48, 179, 110),
    ZoneRegion::new("IN866", 868_200, 14, 250, 40, 5, 89, 69),
    ZoneRegion::new("KR923", 923_200, 15, 125, 39, 34, 130, 124),
    ZoneRegion::new("AS920", 923_200, 15, 125, 47, 21, 146, 89),
    ZoneRegion::new("IL918", 918_500, 15, 125, 34, 29, 36, 34),
    ZoneRegion::new("EU868", 868_200, 14, 250, 90, -90, 180, -180),
    UNKNOWN_ZONE,
];

/// Zone table with first-match lookup.
#[derive(Debug, Clone)]
pub struct Zone<'a> {
    zones: &'a [ZoneRegion],
}

impl Default for Zone<'static> {
    fn default() -> Self {
        Self {
            zones: DEFAULT_ZONES,
        }
    }
}

impl<'a> Zone<'a> {
    /// Use a custom table. The caller must keep [`UNKNOWN_ZONE`] (or an
    /// equivalent catch-all) as the last entry.
    pub fn new(zones: &'a [ZoneRegion]) -> Self {
        Self { zones }
    }

    /// The region containing `(latitude, longitude)`, or the table's last
    /// entry when none matches.
    pub fn find_zone(&self, latitude: f32, longitude: f32) -> &ZoneRegion {
        let lat = latitude as i16;
        let lon = longitude as i16;
        self.zones
            .iter()
            .find(|zone| zone.contains(lat, lon))
            .unwrap_or_else(|| self.zones.last().expect("zone table must not be empty"))
    }
}
