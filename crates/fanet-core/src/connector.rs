//! Engine port to the radio and the application
//!
//! The engine never touches hardware or wall-clock time directly. The host
//! supplies one [`Connector`] per radio; the engine calls it for the
//! current tick, to hand frames to the PHY, and to report acknowledged
//! packets back to the application.

/// Host-side interface the protocol engine drives.
pub trait Connector {
    /// Monotonic millisecond tick. Any epoch works; 32-bit wrap-around is
    /// expected and handled by the engine.
    fn current_tick_ms(&self) -> u32;

    /// Hand wire bytes to the PHY with the coding rate to use (5 = 4/5,
    /// 8 = 4/8). Return `true` when accepted for transmission, `false`
    /// when the channel is busy; the engine backs off and retries.
    fn send_frame(&mut self, coding_rate: u8, data: &[u8]) -> bool;

    /// A previously sent packet with application id `id` was acknowledged.
    fn ack_received(&mut self, id: u16);
}
