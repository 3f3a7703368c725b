use std::fmt;

use crate::pdu_parse_error::PduParseErr;

/// Octet buffer with a read/write cursor, used for building and parsing layer 2 frames.
/// Header fields are accessed MSB-first at bit granularity, payloads at octet granularity.
/// Writes beyond the end of the buffer extend it.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct MsgBuf {
    buffer: Vec<u8>,
    pos: usize, // next bit offset for read/write
    end: usize, // bits at or after this are out of window
}

impl MsgBuf {
    /// Create an empty buffer. Writes will advance the end pointer.
    pub fn new() -> Self {
        Self::with_capacity(crate::phy_types::GSM_MACBLOCK_LEN)
    }

    pub fn with_capacity(octets: usize) -> Self {
        MsgBuf {
            buffer: Vec::with_capacity(octets),
            pos: 0,
            end: 0,
        }
    }

    /// Wrap an existing byte vector, all octets readable. No new allocation is needed here.
    pub fn from_vec(data: Vec<u8>) -> Self {
        let end = data.len() * 8;
        MsgBuf { buffer: data, pos: 0, end }
    }

    pub fn from_bytes(data: &[u8]) -> Self {
        Self::from_vec(data.to_vec())
    }

    /// Peek `num_bits` at the current pos, without advancing.
    /// Returns None on overflow or if `num_bits > 64`.
    pub fn peek_bits(&self, num_bits: usize) -> Option<u64> {
        if num_bits > 64 || self.pos + num_bits > self.end {
            return None;
        }
        let mut v = 0u64;
        for i in 0..num_bits {
            v = (v << 1) | self.bit_at(self.pos + i) as u64;
        }
        Some(v)
    }

    /// Read `num_bits` at the current pos, advancing on success.
    pub fn read_bits(&mut self, num_bits: usize) -> Option<u64> {
        let v = self.peek_bits(num_bits)?;
        self.pos += num_bits;
        Some(v)
    }

    /// Similar to read_bits, but returns a PduParseErr::BufferEnded with the given field name
    /// if not enough bits are available.
    pub fn read_field(&mut self, num_bits: usize, field: &'static str) -> Result<u64, PduParseErr> {
        self.read_bits(num_bits).ok_or(PduParseErr::BufferEnded { field: Some(field) })
    }

    /// Read `num` whole octets. The cursor must be octet aligned.
    pub fn read_octets(&mut self, num: usize, field: &'static str) -> Result<&[u8], PduParseErr> {
        if self.pos % 8 != 0 {
            return Err(PduParseErr::Inconsistency { field, reason: "unaligned octet read" });
        }
        if self.pos + num * 8 > self.end {
            return Err(PduParseErr::BufferEnded { field: Some(field) });
        }
        let start = self.pos / 8;
        self.pos += num * 8;
        Ok(&self.buffer[start..start + num])
    }

    /// Octets from the (aligned) cursor up to the end of the window
    pub fn remaining_octets(&self) -> &[u8] {
        let start = self.pos.div_ceil(8).min(self.end / 8);
        &self.buffer[start..self.end / 8]
    }

    /// Write up to 64 bits MSB-first, advancing pos and extending the buffer when needed
    pub fn write_bits(&mut self, value: u64, num_bits: usize) {
        assert!(num_bits <= 64, "can only write up to 64 bits");
        assert!(num_bits == 64 || value >> num_bits == 0, "value exceeds num_bits {} {}", value, num_bits);

        let needed = (self.pos + num_bits).div_ceil(8);
        if needed > self.buffer.len() {
            self.buffer.resize(needed, 0);
        }
        for i in 0..num_bits {
            let bit = ((value >> (num_bits - 1 - i)) & 1) as u8;
            let p = self.pos + i;
            let mask = 1u8 << (7 - (p % 8));
            if bit == 1 {
                self.buffer[p / 8] |= mask;
            } else {
                self.buffer[p / 8] &= !mask;
            }
        }
        self.pos += num_bits;
        self.end = self.end.max(self.pos);
    }

    pub fn write_octet(&mut self, value: u8) {
        self.write_bits(value as u64, 8);
    }

    pub fn write_octets(&mut self, data: &[u8]) {
        if self.pos % 8 == 0 {
            let start = self.pos / 8;
            let needed = start + data.len();
            if needed > self.buffer.len() {
                self.buffer.resize(needed, 0);
            }
            self.buffer[start..needed].copy_from_slice(data);
            self.pos += data.len() * 8;
            self.end = self.end.max(self.pos);
        } else {
            for octet in data {
                self.write_octet(*octet);
            }
        }
    }

    /// Fill with `fill` octets from the end of the window up to `len` octets total
    pub fn pad_to(&mut self, len: usize, fill: u8) {
        self.pos = self.end;
        while self.len_octets() < len {
            self.write_octet(fill);
        }
    }

    /// Window length in whole octets
    pub fn len_octets(&self) -> usize {
        self.end.div_ceil(8)
    }

    pub fn is_empty(&self) -> bool {
        self.end == 0
    }

    /// Bits left between pos and end
    pub fn len_remaining(&self) -> usize {
        self.end - self.pos
    }

    pub fn get_pos(&self) -> usize {
        self.pos
    }

    /// Seek `pos` to an absolute bit offset
    pub fn seek(&mut self, bit_offset: usize) {
        assert!(bit_offset <= self.end, "seek out of window: got {}, allowed [0,{}]", bit_offset, self.end);
        self.pos = bit_offset;
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer[..self.len_octets()]
    }

    pub fn into_bytes(mut self) -> Vec<u8> {
        let len = self.len_octets();
        self.buffer.truncate(len);
        self.buffer
    }

    /// Dumps the window as a hex string, octets separated by spaces
    pub fn dump_hex(&self) -> String {
        self.as_bytes()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn bit_at(&self, p: usize) -> u8 {
        (self.buffer[p / 8] >> (7 - (p % 8))) & 1
    }
}

impl fmt::Display for MsgBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] ^{}", self.dump_hex(), self.pos)
    }
}

impl fmt::Debug for MsgBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MsgBuf[{}]", self.dump_hex())
    }
}
