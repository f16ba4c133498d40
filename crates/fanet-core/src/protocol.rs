//! MAC engine
//!
//! The scheduler that turns parsed frames and application packets into
//! radio transmissions:
//!
//! ```text
//!             ┌──────────────┐  enqueue   ┌───────────────┐
//!  app ──────►│ send_packet  ├───────────►│               │
//!             └──────────────┘            │    BlockPool  │
//!             ┌──────────────┐  classify  │  (TX frames)  │
//!  PHY rx ───►│  handle_rx   ├───────────►│               │
//!             └──────┬───────┘  ack/relay └───────┬───────┘
//!                    │ neighbor update            │ pick_next
//!                    ▼                            ▼
//!             ┌──────────────┐  CSMA gate  ┌──────────────┐
//!             │ NeighborTable│             │   poll_tx    ├──► Connector::send_frame
//!             └──────────────┘             └──────────────┘
//! ```
//!
//! Single-threaded and allocation-free on the hot path: the caller invokes
//! `handle_rx` on receive completion and `poll_tx` periodically or at the
//! deadline the previous call returned. All deadline comparisons are
//! wrap-safe against the 32-bit tick.

use crate::address::Address;
use crate::airtime::{lora_airtime_ms, AirtimeEstimator};
use crate::connector::Connector;
use crate::frame::{self, FrameView, TxFrame};
use crate::header::{AckType, MessageType};
use crate::neighbor::NeighborTable;
use crate::packet::Packet;
use crate::parser::MIN_FRAME_LEN;
use crate::pool::BlockPool;
use crate::rng::XorShift32;
use serde::Serialize;
use tracing::{debug, trace};

/// Fixed preamble/header cost charged to the CSMA gap after a send (ms).
pub const MAC_TX_MINPREAMBLEHEADERTIME_MS: u32 = 15;
/// Per-byte cost charged to the CSMA gap after a send (ms).
pub const MAC_TX_TIMEPERBYTE_MS: u32 = 2;
/// How long the last retry waits for its acknowledgment (ms).
pub const MAC_TX_ACKTIMEOUT_MS: u32 = 1_000;
/// Spacing step between retransmissions (ms).
pub const MAC_TX_RETRANSMISSION_TIME_MS: u32 = 1_000;
/// Transmission budget for ack-requested self packets.
pub const MAC_TX_RETRANSMISSION_RETRYS: u8 = 3;
/// Carrier-sense backoff exponent bounds.
pub const MAC_TX_BACKOFF_EXP_MIN: u8 = 7;
pub const MAC_TX_BACKOFF_EXP_MAX: u8 = 12;
/// Frames heard louder than this are not worth relaying (dBm).
pub const MAC_FORWARD_MAX_RSSI_DBM: i16 = -90;
/// A duplicate this much louder than our stored copy supersedes it (dB).
pub const MAC_FORWARD_MIN_DB_BOOST: i16 = 20;
/// Random relay delay window (ms).
pub const MAC_FORWARD_DELAY_MIN_MS: u32 = 100;
pub const MAC_FORWARD_DELAY_MAX_MS: u32 = 300;
/// Below this many neighbors, self tracking frames request a relay hop.
pub const MAC_MAXNEIGHBORS_4_TRACKING_2HOP: usize = 5;
/// Below this many neighbors, transmit with coding rate 4/8 instead of 4/5.
pub const MAC_CODING48_THRESHOLD: usize = 8;
/// Poll-again delay when there is nothing to do (ms).
pub const MAC_DEFAULT_TX_BACKOFF_MS: u32 = 1_000;
/// Channel occupancy above which relaying is not admitted (‰).
pub const MAC_FORWARD_AIRTIME_LIMIT: u32 = 500;
/// Channel occupancy above which only self tracking frames go out (‰).
pub const MAC_TX_AIRTIME_LIMIT: u32 = 900;

/// Aggregate engine counters, snapshot via [`Protocol::stats`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProtocolStats {
    /// Frames handed to `handle_rx`.
    pub rx: u32,
    /// Frames that passed the echo filter and were classified.
    pub processed: u32,
    /// Frames the PHY accepted for transmission.
    pub tx_success: u32,
    /// Frames the PHY rejected (channel busy).
    pub tx_failed: u32,
    /// Acknowledgments queued in response to received frames.
    pub tx_ack: u32,
    /// Relay copies queued for forwarding.
    pub forwarded: u32,
    /// Relay candidates dropped: heard too loud.
    pub fwd_rssi_drop: u32,
    /// Relay candidates dropped: channel occupancy too high.
    pub fwd_airtime_drop: u32,
    /// Relay candidates dropped: unicast destination not a known neighbor.
    pub fwd_neighbor_drop: u32,
    /// Relay candidates dropped: frame pool exhausted.
    pub fwd_pool_drop: u32,
    /// Frames dropped because we sent them ourselves (echo).
    pub rx_from_us_drop: u32,
    /// Current neighbor table size.
    pub neighbor_table_size: usize,
}

/// `true` when `tick` is at or after `deadline`, under 32-bit wrap.
fn time_reached(tick: u32, deadline: u32) -> bool {
    tick.wrapping_sub(deadline) as i32 >= 0
}

/// The FANET MAC engine. One instance per radio.
///
/// The engine owns its [`Connector`] and drives it from three entry
/// points: [`send_packet`](Self::send_packet) queues application traffic,
/// [`handle_rx`](Self::handle_rx) classifies received frames, and
/// [`poll_tx`](Self::poll_tx) runs the transmit scheduler.
pub struct Protocol<C: Connector> {
    connector: C,
    own_address: Address,
    do_forward: bool,
    csma_next_tx: u32,
    carrier_backoff_exp: u8,
    random: XorShift32,
    tx_pool: BlockPool,
    neighbor_table: NeighborTable,
    airtime: AirtimeEstimator,
    stats: ProtocolStats,
}

impl<C: Connector> Protocol<C> {
    pub fn new(connector: C) -> Self {
        let mut protocol = Self {
            connector,
            own_address: Address::from_u32(0x000001),
            do_forward: true,
            csma_next_tx: 0,
            carrier_backoff_exp: MAC_TX_BACKOFF_EXP_MIN,
            random: XorShift32::new(0),
            tx_pool: BlockPool::new(),
            neighbor_table: NeighborTable::default(),
            airtime: AirtimeEstimator::default(),
            stats: ProtocolStats::default(),
        };
        protocol.init();
        protocol
    }

    /// Restart the engine: reseed the PRNG from the tick, forget all
    /// neighbors and drop every queued frame.
    pub fn init(&mut self) {
        self.random = XorShift32::new(self.connector.current_tick_ms());
        self.neighbor_table.clear();
        self.tx_pool.clear();
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub fn connector_mut(&mut self) -> &mut C {
        &mut self.connector
    }

    pub fn own_address(&self) -> Address {
        self.own_address
    }

    /// Set the node address. The broadcast and unassigned values are
    /// silently ignored.
    pub fn set_own_address(&mut self, address: Address) {
        if address.is_reserved() {
            return;
        }
        self.own_address = address;
    }

    /// Whether this node relays frames for others.
    pub fn forwarding(&self) -> bool {
        self.do_forward
    }

    pub fn set_forwarding(&mut self, enabled: bool) {
        self.do_forward = enabled;
    }

    pub fn pool(&self) -> &BlockPool {
        &self.tx_pool
    }

    pub fn neighbor_table(&self) -> &NeighborTable {
        &self.neighbor_table
    }

    /// Counter snapshot including the current neighbor table size.
    pub fn stats(&self) -> ProtocolStats {
        let mut stats = self.stats.clone();
        stats.neighbor_table_size = self.neighbor_table.len();
        stats
    }

    /// Queue an application packet for transmission.
    ///
    /// With `strict` (the normal mode) the source is overwritten with the
    /// node address and, when any acknowledgment is requested, the forward
    /// bit is set and the retry budget armed. `id` is returned through
    /// [`Connector::ack_received`] when the matching acknowledgment
    /// arrives; pass 0 to opt out of the callback.
    pub fn send_packet(&mut self, packet: Packet, id: u16, strict: bool) {
        let mut packet = packet;
        let mut num_tx = 0;
        if strict {
            packet = packet.with_source(self.own_address);
            if packet.ack_type().is_requested() {
                packet = packet.with_forward(true);
                num_tx = MAC_TX_RETRANSMISSION_RETRYS;
            }
        }

        let bytes = packet.build();
        if bytes.is_empty() {
            return;
        }

        let frame = TxFrame::new()
            .with_self_originated(true)
            .with_id(id)
            .with_next_tx(self.connector.current_tick_ms())
            .with_num_tx(num_tx);
        if !self.tx_pool.add(frame, &bytes) {
            debug!(id, len = bytes.len(), "tx pool full, dropping packet");
        }
    }

    /// Classify a received frame and apply its side effects: neighbor
    /// update, duplicate suppression, acknowledgment generation or
    /// consumption, and relay admission. Returns the frame's message type.
    pub fn handle_rx(&mut self, rssi_dbm: i16, bytes: &[u8]) -> MessageType {
        self.stats.rx += 1;
        let now = self.connector.current_tick_ms();

        let msg_type = bytes
            .first()
            .map(|byte| MessageType::from_byte(byte & 0x3F))
            .unwrap_or_default();
        if bytes.len() < MIN_FRAME_LEN {
            return msg_type;
        }

        let view = FrameView::new(bytes);
        let source = view.source();
        let destination = view.destination();
        let ack_type = view.ack_type();
        let forward = view.forward();

        self.neighbor_table.remove_outdated(now);

        if source == self.own_address {
            self.stats.rx_from_us_drop += 1;
            return msg_type;
        }

        self.neighbor_table.add_or_update(source, now);
        self.stats.processed += 1;

        if let Some(index) = self.find_in_pool(bytes) {
            // Already queued for relaying: a much louder copy means someone
            // closer will rebroadcast; otherwise just re-jitter our slot.
            let stored_rssi = self.tx_pool.frame(index).rssi();
            if rssi_dbm > stored_rssi + MAC_FORWARD_MIN_DB_BOOST {
                debug!(%source, rssi_dbm, stored_rssi, "duplicate louder, dropping relay copy");
                self.tx_pool.remove(index);
            } else {
                let delay = self
                    .random
                    .range(MAC_FORWARD_DELAY_MIN_MS, MAC_FORWARD_DELAY_MAX_MS);
                self.tx_pool.frame_mut(index).next_tx = now.wrapping_add(delay);
            }
            return msg_type;
        }

        if destination.is_broadcast() || destination == self.own_address {
            if msg_type == MessageType::Ack {
                let id = self.remove_acked_frames(source);
                if id != 0 {
                    self.connector.ack_received(id);
                }
            } else if ack_type.is_requested() {
                // Two-hop acks only travel on when the frame itself arrived
                // via a relay (forward bit already cleared).
                let ack = Packet::new()
                    .with_source(self.own_address)
                    .with_destination(source)
                    .with_forward(ack_type == AckType::TwoHop && !forward);
                let ack_bytes = ack.build_ack();
                let frame = TxFrame::new().with_next_tx(now);
                if self.tx_pool.add(frame, &ack_bytes) {
                    self.stats.tx_ack += 1;
                    trace!(%source, "acknowledgment queued");
                }
            }
        }

        if self.do_forward && forward {
            self.admit_relay(rssi_dbm, bytes, destination, ack_type, now);
        }

        msg_type
    }

    /// Run the transmit scheduler. Returns the tick at which the caller
    /// should poll again (sooner polls are harmless no-ops).
    pub fn poll_tx(&mut self) -> u32 {
        let now = self.connector.current_tick_ms();

        if !time_reached(now, self.csma_next_tx) {
            return self.csma_next_tx;
        }

        let Some(index) = self.pick_next(now) else {
            return now.wrapping_add(MAC_DEFAULT_TX_BACKOFF_MS);
        };

        // Own position reports bypass airtime and retry bookkeeping: sent
        // once, immediately, with the forward bit tracking network density.
        if self.tx_pool.frame(index).self_originated() && self.tx_pool.view(index).is_tracking() {
            let request_hop = self.neighbor_table.len() < MAC_MAXNEIGHBORS_4_TRACKING_2HOP;
            frame::set_forward(self.tx_pool.bytes_mut(index), request_hop);

            let (sent, length) = self.send_frame(index);
            if sent {
                self.stats.tx_success += 1;
            } else {
                self.stats.tx_failed += 1;
            }
            self.tx_pool.remove(index);
            self.carrier_backoff_exp = MAC_TX_BACKOFF_EXP_MIN;
            self.csma_next_tx = now
                .wrapping_add(MAC_TX_MINPREAMBLEHEADERTIME_MS)
                .wrapping_add(length as u32 * MAC_TX_TIMEPERBYTE_MS);
            return self.csma_next_tx;
        }

        if self.airtime.get(now) >= MAC_TX_AIRTIME_LIMIT {
            return now.wrapping_add(MAC_DEFAULT_TX_BACKOFF_MS);
        }

        // Ack never arrived and the budget is spent.
        if self.tx_pool.view(index).ack_type().is_requested() && self.tx_pool.frame(index).num_tx() == 0
        {
            debug!("retry budget exhausted, dropping frame");
            self.tx_pool.remove(index);
            return self.poll_tx();
        }

        // Unicast to a node we cannot hear: ask the neighborhood to relay.
        {
            let view = self.tx_pool.view(index);
            let destination = view.destination();
            if !view.forward()
                && !destination.is_broadcast()
                && self.neighbor_table.last_seen(destination) == 0
            {
                frame::set_forward(self.tx_pool.bytes_mut(index), true);
            }
        }

        let (sent, length) = self.send_frame(index);
        let now = self.connector.current_tick_ms();

        if sent {
            self.stats.tx_success += 1;

            let view = self.tx_pool.view(index);
            if !view.ack_type().is_requested() || view.source() != self.own_address {
                self.tx_pool.remove(index);
            } else {
                let frame = self.tx_pool.frame_mut(index);
                frame.num_tx = frame.num_tx.saturating_sub(1);
                if frame.num_tx > 0 {
                    frame.next_tx = now.wrapping_add(
                        MAC_TX_RETRANSMISSION_TIME_MS
                            * u32::from(MAC_TX_RETRANSMISSION_RETRYS - frame.num_tx),
                    );
                } else {
                    frame.next_tx = now.wrapping_add(MAC_TX_ACKTIMEOUT_MS);
                }
            }

            self.carrier_backoff_exp = MAC_TX_BACKOFF_EXP_MIN;
            self.csma_next_tx = now
                .wrapping_add(MAC_TX_MINPREAMBLEHEADERTIME_MS)
                .wrapping_add(length as u32 * MAC_TX_TIMEPERBYTE_MS);
            self.csma_next_tx
        } else {
            self.stats.tx_failed += 1;
            if self.carrier_backoff_exp < MAC_TX_BACKOFF_EXP_MAX {
                self.carrier_backoff_exp += 1;
            }
            let backoff = self.random.range(
                1 << (MAC_TX_BACKOFF_EXP_MIN - 1),
                1 << self.carrier_backoff_exp,
            );
            trace!(exp = self.carrier_backoff_exp, backoff, "channel busy");
            self.csma_next_tx = now.wrapping_add(backoff);
            self.csma_next_tx
        }
    }

    /// Relay admission for a frame carrying the forward bit.
    fn admit_relay(
        &mut self,
        rssi_dbm: i16,
        bytes: &[u8],
        destination: Address,
        ack_type: AckType,
        now: u32,
    ) {
        if rssi_dbm > MAC_FORWARD_MAX_RSSI_DBM {
            self.stats.fwd_rssi_drop += 1;
            return;
        }
        if !destination.is_broadcast() && self.neighbor_table.last_seen(destination) == 0 {
            self.stats.fwd_neighbor_drop += 1;
            return;
        }
        if self.airtime.get(now) >= MAC_FORWARD_AIRTIME_LIMIT {
            self.stats.fwd_airtime_drop += 1;
            return;
        }

        let delay = self
            .random
            .range(MAC_FORWARD_DELAY_MIN_MS, MAC_FORWARD_DELAY_MAX_MS);
        let frame = TxFrame::new()
            .with_rssi(rssi_dbm)
            .with_num_tx(if ack_type.is_requested() { 1 } else { 0 })
            .with_next_tx(now.wrapping_add(delay));

        if self.tx_pool.add(frame, bytes) {
            // We are the relay now; the copy must not be forwarded again.
            let index = self.tx_pool.len() - 1;
            frame::set_forward(self.tx_pool.bytes_mut(index), false);
            self.stats.forwarded += 1;
            debug!(rssi_dbm, "relay copy queued");
        } else {
            self.stats.fwd_pool_drop += 1;
        }
    }

    /// Index of a queued frame that is the same logical frame as `bytes`.
    fn find_in_pool(&self, bytes: &[u8]) -> Option<usize> {
        let other = FrameView::new(bytes);
        (0..self.tx_pool.len()).find(|&index| self.tx_pool.view(index).matches(&other))
    }

    /// Drop every pending frame awaiting an acknowledgment from `source`
    /// and report the application id of the last one dropped (0 if none).
    fn remove_acked_frames(&mut self, source: Address) -> u16 {
        let mut id = 0;
        let mut index = 0;
        while index < self.tx_pool.len() {
            let view = self.tx_pool.view(index);
            if view.destination() == source && view.ack_type().is_requested() {
                id = self.tx_pool.frame(index).id();
                self.tx_pool.remove(index);
            } else {
                index += 1;
            }
        }
        id
    }

    /// Select the next due frame: self packets first, then position
    /// reports, then acknowledgments, then everything else; ties go to the
    /// earliest `next_tx`.
    fn pick_next(&self, now: u32) -> Option<usize> {
        let mut best: Option<usize> = None;
        let mut best_priority = u8::MAX;
        let mut best_time = u32::MAX;

        for index in 0..self.tx_pool.len() {
            let frame = self.tx_pool.frame(index);
            if !time_reached(now, frame.next_tx()) {
                continue;
            }

            let view = self.tx_pool.view(index);
            let priority = if frame.self_originated() {
                1
            } else if view.is_tracking() {
                2
            } else if view.msg_type() == MessageType::Ack {
                3
            } else {
                4
            };

            if priority < best_priority || (priority == best_priority && frame.next_tx() < best_time)
            {
                best = Some(index);
                best_priority = priority;
                best_time = frame.next_tx();
            }
        }

        best
    }

    /// Push one frame to the PHY, charging its airtime. Coding rate 4/8 in
    /// sparse networks, 4/5 once enough neighbors are heard.
    fn send_frame(&mut self, index: usize) -> (bool, usize) {
        let coding_rate: u8 = if self.neighbor_table.len() < MAC_CODING48_THRESHOLD {
            8
        } else {
            5
        };
        let length = self.tx_pool.frame(index).len;
        let now = self.connector.current_tick_ms();
        self.airtime
            .set(now, lora_airtime_ms(length, 7, 250, u32::from(coding_rate) - 4));
        let sent = self.connector.send_frame(coding_rate, self.tx_pool.bytes(index));
        (sent, length)
    }
}
