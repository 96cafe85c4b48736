// Melvin - emergent associative graph engine.
// Copyright (C) 2024-2025 Melvin Engine Team
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! The CAN-bus-style wire frame a port driver uses to hand a byte buffer
//! to the port manager: `[port_id(1B)][timestamp(8B LE)][data_size(4B
//! LE)][data(N B)]`. The engine's own `process_input` consumes the
//! already-unwrapped `[port_id][data]` pair the port manager produces
//! from this — see the design notes in [`crate::engine`] for why the two
//! are not the same buffer.

use crate::error::EngineError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortFrame {
    pub port_id: u8,
    pub timestamp: u64,
    pub data: Vec<u8>,
}

impl PortFrame {
    pub const HEADER_LEN: usize = 1 + 8 + 4;

    pub fn new(port_id: u8, timestamp: u64, data: Vec<u8>) -> Self {
        Self { port_id, timestamp, data }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::HEADER_LEN + self.data.len());
        out.push(self.port_id);
        out.extend_from_slice(&self.timestamp.to_le_bytes());
        out.extend_from_slice(&(self.data.len() as u32).to_le_bytes());
        out.extend_from_slice(&self.data);
        out
    }

    pub fn decode(buf: &[u8]) -> Result<Self, EngineError> {
        if buf.len() < Self::HEADER_LEN {
            return Err(EngineError::MalformedFrame(format!(
                "frame buffer of {} bytes cannot hold the {}-byte header",
                buf.len(),
                Self::HEADER_LEN
            )));
        }
        let port_id = buf[0];
        let timestamp = u64::from_le_bytes(buf[1..9].try_into().unwrap());
        let data_size = u32::from_le_bytes(buf[9..13].try_into().unwrap()) as usize;
        if buf.len() < Self::HEADER_LEN + data_size {
            return Err(EngineError::MalformedFrame(format!(
                "declared data_size {data_size} exceeds the {} bytes available",
                buf.len() - Self::HEADER_LEN
            )));
        }
        let data = buf[Self::HEADER_LEN..Self::HEADER_LEN + data_size].to_vec();
        Ok(Self { port_id, timestamp, data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_round_trip() {
        let frame = PortFrame::new(3, 123456, b"hello".to_vec());
        let bytes = frame.encode();
        let decoded = PortFrame::decode(&bytes).unwrap();
        assert_eq!(frame, decoded);
    }

    #[test]
    fn decode_rejects_short_buffer() {
        let err = PortFrame::decode(&[1, 2, 3]).unwrap_err();
        assert!(matches!(err, EngineError::MalformedFrame(_)));
    }

    #[test]
    fn decode_rejects_truncated_data() {
        let mut bytes = PortFrame::new(1, 0, b"hello".to_vec()).encode();
        bytes.truncate(bytes.len() - 2);
        let err = PortFrame::decode(&bytes).unwrap_err();
        assert!(matches!(err, EngineError::MalformedFrame(_)));
    }

    #[test]
    fn empty_data_round_trips() {
        let frame = PortFrame::new(0, 0, Vec::new());
        let bytes = frame.encode();
        assert_eq!(bytes.len(), PortFrame::HEADER_LEN);
        let decoded = PortFrame::decode(&bytes).unwrap();
        assert_eq!(frame, decoded);
    }
}
