//! FANET device addressing
//!
//! A FANET address is 24 bits: one manufacturer byte followed by a 16-bit
//! device id. On the wire the manufacturer byte comes first and the device
//! id is little-endian. `0x000000` is the broadcast address and `0xFFFFFF`
//! is reserved as unassigned/ignore.

use crate::bitstream::{BitReader, BitWriter};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 24-bit FANET address (manufacturer + unique device id).
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    manufacturer: u8,
    unique: u16,
}

impl Address {
    /// Broadcast address (all zero).
    pub const BROADCAST: Address = Address {
        manufacturer: 0x00,
        unique: 0x0000,
    };

    /// Unassigned/ignore address (all ones).
    pub const UNASSIGNED: Address = Address {
        manufacturer: 0xFF,
        unique: 0xFFFF,
    };

    pub const fn new(manufacturer: u8, unique: u16) -> Self {
        Self {
            manufacturer,
            unique,
        }
    }

    /// Build from a combined 24-bit value, `0xMMUUUU`.
    pub const fn from_u32(value: u32) -> Self {
        Self {
            manufacturer: (value >> 16) as u8,
            unique: value as u16,
        }
    }

    /// Combined 24-bit value, `0xMMUUUU`.
    pub const fn as_u32(&self) -> u32 {
        (self.manufacturer as u32) << 16 | self.unique as u32
    }

    pub const fn manufacturer(&self) -> u8 {
        self.manufacturer
    }

    pub const fn unique(&self) -> u16 {
        self.unique
    }

    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }

    pub fn is_unassigned(&self) -> bool {
        *self == Self::UNASSIGNED
    }

    /// True for the two values that may not be used as a node address.
    pub fn is_reserved(&self) -> bool {
        self.is_broadcast() || self.is_unassigned()
    }

    /// Manufacturer byte, then unique id little-endian.
    pub fn serialize(&self, writer: &mut BitWriter) {
        writer.write_u8(self.manufacturer);
        writer.write_u8(self.unique as u8);
        writer.write_u8((self.unique >> 8) as u8);
    }

    pub fn deserialize(reader: &mut BitReader<'_>) -> Option<Self> {
        let manufacturer = reader.read_u8()?;
        let lo = reader.read_u8()?;
        let hi = reader.read_u8()?;
        Some(Self {
            manufacturer,
            unique: u16::from(lo) | u16::from(hi) << 8,
        })
    }
}

impl From<u32> for Address {
    fn from(value: u32) -> Self {
        Self::from_u32(value)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({:06X})", self.as_u32())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X}:{:04X}", self.manufacturer, self.unique)
    }
}
