//! Name payload (message type 2)
//!
//! Raw bytes filling the rest of the frame. By convention the content is
//! UTF-8 text (pilot or device name) but receivers must not assume valid
//! encoding.

use crate::bitstream::{BitReader, BitWriter};
use crate::header::MessageType;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Upper bound on name length in bytes (255-byte radio frame minus the
/// largest header layout).
pub const MAX_NAME_LEN: usize = 245;

/// Free-form node name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamePayload {
    bytes: Vec<u8>,
}

impl NamePayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from text, truncated to [`MAX_NAME_LEN`] bytes.
    pub fn from_text(text: &str) -> Self {
        let mut payload = Self::default();
        payload.set_name(text.as_bytes());
        payload
    }

    pub fn msg_type(&self) -> MessageType {
        MessageType::Name
    }

    /// Raw name bytes.
    pub fn name(&self) -> &[u8] {
        &self.bytes
    }

    /// Name as text, with invalid UTF-8 replaced.
    pub fn as_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }

    /// Replace the name, truncating to [`MAX_NAME_LEN`] bytes.
    pub fn set_name(&mut self, name: &[u8]) -> &mut Self {
        let len = name.len().min(MAX_NAME_LEN);
        self.bytes.clear();
        self.bytes.extend_from_slice(&name[..len]);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn serialize(&self, writer: &mut BitWriter) {
        for byte in &self.bytes {
            writer.write_u8(*byte);
        }
    }

    /// Consumes the remainder of the stream.
    pub fn deserialize(reader: &mut BitReader<'_>) -> Self {
        let mut payload = Self::default();
        while payload.bytes.len() < MAX_NAME_LEN {
            match reader.read_u8() {
                Some(byte) => payload.bytes.push(byte),
                None => break,
            }
        }
        payload
    }
}
