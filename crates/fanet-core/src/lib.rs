//! # FANET Link-Layer Protocol Engine
//!
//! This crate implements the core of FANET (Flying Ad-hoc Network), the
//! broadcast-oriented LoRa link-layer protocol used for free-flight
//! aviation tracking: a bit-exact wire codec for the five payload types
//! and the MAC engine that schedules transmissions over a half-duplex
//! radio.
//!
//! ## Overview
//!
//! - **Wire codec**: bit-packed frames with a one-byte header, 24-bit
//!   addresses, optional extended header and signature, and payloads for
//!   tracking, ground tracking, names, messages and weather services
//! - **MAC engine**: transmit queue with frame priorities, one- and
//!   two-hop acknowledgments with retransmission, opportunistic relaying
//!   with RSSI-based duplicate suppression, airtime budgeting, and
//!   exponential carrier-sense backoff
//! - **Fixed resources**: one preallocated frame pool, a bounded neighbor
//!   table, no allocation on the hot path, wrap-safe 32-bit tick handling
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Application                           │
//! │        Packet builder ── payloads ── zone lookup            │
//! └───────────────┬─────────────────────────────▲───────────────┘
//!                 │ send_packet                 │ parse / ack_received
//! ┌───────────────▼─────────────────────────────┴───────────────┐
//! │                     Protocol (MAC)                          │
//! │   BlockPool ── NeighborTable ── AirtimeEstimator ── RNG     │
//! └───────────────┬─────────────────────────────▲───────────────┘
//!                 │ Connector::send_frame       │ handle_rx(rssi, bytes)
//! ┌───────────────▼─────────────────────────────┴───────────────┐
//! │                   LoRa PHY (host-supplied)                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use fanet_core::prelude::*;
//!
//! struct Radio; // the host's PHY driver and clock
//! # impl Connector for Radio {
//! #     fn current_tick_ms(&self) -> u32 { 0 }
//! #     fn send_frame(&mut self, _cr: u8, _data: &[u8]) -> bool { true }
//! #     fn ack_received(&mut self, _id: u16) {}
//! # }
//!
//! let mut engine = Protocol::new(Radio);
//! engine.set_own_address(Address::from_u32(0x110042));
//!
//! // Broadcast our position.
//! let mut position = TrackingPayload::default();
//! position
//!     .set_latitude(46.9481)
//!     .set_longitude(7.4474)
//!     .set_altitude(2230)
//!     .set_aircraft_type(AircraftType::Paraglider);
//! engine.send_packet(Packet::new().with_payload(position), 0, true);
//!
//! loop {
//!     // feed received frames: engine.handle_rx(rssi, &bytes);
//!     let next_poll = engine.poll_tx();
//!     // sleep until `next_poll` or the next reception
//!     # break;
//! }
//! ```

pub mod address;
pub mod airtime;
pub mod bitstream;
pub mod connector;
pub mod frame;
pub mod header;
pub mod neighbor;
pub mod packet;
pub mod parser;
pub mod payload;
pub mod pool;
pub mod protocol;
pub mod rng;
pub mod zone;

pub use address::Address;
pub use airtime::{lora_airtime_ms, AirtimeEstimator};
pub use connector::Connector;
pub use frame::{FrameView, TxFrame};
pub use header::{AckType, ExtendedHeader, Header, MessageType};
pub use packet::{Packet, ParseError};
pub use payload::{
    AircraftType, GroundTrackingPayload, GroundType, MessagePayload, NamePayload, Payload,
    ServicePayload, TrackingPayload,
};
pub use pool::BlockPool;
pub use protocol::{Protocol, ProtocolStats};
pub use zone::{Zone, ZoneRegion, DEFAULT_ZONES};

/// Convenient single import for typical hosts.
pub mod prelude {
    pub use crate::address::Address;
    pub use crate::connector::Connector;
    pub use crate::header::{AckType, MessageType};
    pub use crate::packet::Packet;
    pub use crate::payload::{
        AircraftType, GroundTrackingPayload, GroundType, MessagePayload, NamePayload, Payload,
        ServicePayload, TrackingPayload,
    };
    pub use crate::protocol::{Protocol, ProtocolStats};
    pub use crate::zone::Zone;
}
