//! Short message payload (message type 3)
//!
//! One subheader byte followed by raw message bytes filling the rest of the
//! frame.

use crate::bitstream::{BitReader, BitWriter};
use crate::header::MessageType;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Upper bound on message length in bytes (after the subheader).
pub const MAX_MESSAGE_LEN: usize = 244;

/// Short text message with an application-defined subheader.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePayload {
    subheader: u8,
    bytes: Vec<u8>,
}

impl MessagePayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from text with subheader zero, truncated to
    /// [`MAX_MESSAGE_LEN`] bytes.
    pub fn from_text(text: &str) -> Self {
        let mut payload = Self::default();
        payload.set_message(text.as_bytes());
        payload
    }

    pub fn msg_type(&self) -> MessageType {
        MessageType::Message
    }

    pub fn subheader(&self) -> u8 {
        self.subheader
    }

    pub fn set_subheader(&mut self, value: u8) -> &mut Self {
        self.subheader = value;
        self
    }

    /// Raw message bytes.
    pub fn message(&self) -> &[u8] {
        &self.bytes
    }

    /// Message as text, with invalid UTF-8 replaced.
    pub fn as_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }

    /// Replace the message, truncating to [`MAX_MESSAGE_LEN`] bytes.
    pub fn set_message(&mut self, message: &[u8]) -> &mut Self {
        let len = message.len().min(MAX_MESSAGE_LEN);
        self.bytes.clear();
        self.bytes.extend_from_slice(&message[..len]);
        self
    }

    pub fn serialize(&self, writer: &mut BitWriter) {
        writer.write_u8(self.subheader);
        for byte in &self.bytes {
            writer.write_u8(*byte);
        }
    }

    /// Consumes the remainder of the stream.
    pub fn deserialize(reader: &mut BitReader<'_>) -> Self {
        let mut payload = Self::default();
        let Some(subheader) = reader.read_u8() else {
            return payload;
        };
        payload.subheader = subheader;
        while payload.bytes.len() < MAX_MESSAGE_LEN {
            match reader.read_u8() {
                Some(byte) => payload.bytes.push(byte),
                None => break,
            }
        }
        payload
    }
}
