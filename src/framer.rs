//! Splits a firmware image into on-wire packets and builds the start command.
//!
//! Pure and deterministic: every function here is a plain transformation of
//! its arguments with no I/O, no clock, and no session state. `SessionController`
//! is the only consumer that owns any mutable state.

use crate::crc::crc16;

/// Fixed size of one firmware sector. Not configurable — baked into the wire
/// format every deployed device already understands.
pub const SECTOR_SIZE: u32 = 4096;

/// Sequence byte marking the last packet of a sector. Carries the sector CRC.
pub const FINAL_SEQ: u8 = 0xFF;

const START_COMMAND_LEN: usize = 20;
const START_OPCODE: u16 = 0x0001;

/// Number of 4096-byte sectors needed to hold `length` bytes.
pub fn num_sectors(length: u32) -> u32 {
    length.div_ceil(SECTOR_SIZE)
}

/// Byte range `[start, end)` of sector `sector` within an image of `length` bytes.
///
/// The final sector is short if `length` isn't a multiple of [`SECTOR_SIZE`].
pub fn sector_range(sector: u32, length: u32) -> core::ops::Range<u32> {
    let start = sector * SECTOR_SIZE;
    let end = (start + SECTOR_SIZE).min(length);
    start..end
}

/// Build the 20-byte start command.
///
/// Layout: `u16 LE 0x0001 | u32 LE firmware_length | 14 zero bytes | u16 LE crc16(bytes[0..18])`.
pub fn make_start_command(firmware_length: u32) -> [u8; START_COMMAND_LEN] {
    let mut buf = [0u8; START_COMMAND_LEN];
    buf[0..2].copy_from_slice(&START_OPCODE.to_le_bytes());
    buf[2..6].copy_from_slice(&firmware_length.to_le_bytes());
    // bytes 6..18 stay zero
    let crc = crc16(&buf[0..18]);
    buf[18..20].copy_from_slice(&crc.to_le_bytes());
    buf
}

/// One on-wire data packet: header plus payload plus an optional sector-CRC trailer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPacket {
    pub sector: u16,
    pub seq: u8,
    pub payload: Vec<u8>,
    pub sector_crc: Option<u16>,
}

impl DataPacket {
    pub fn is_final(&self) -> bool {
        self.seq == FINAL_SEQ
    }

    /// Serialize to wire bytes: `u16 LE sector | u8 seq | payload | [u16 LE crc]`.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(3 + self.payload.len() + 2);
        out.extend_from_slice(&self.sector.to_le_bytes());
        out.push(self.seq);
        out.extend_from_slice(&self.payload);
        if let Some(crc) = self.sector_crc {
            out.extend_from_slice(&crc.to_le_bytes());
        }
        out
    }

    /// Parse one on-wire data packet. `None` on anything too short to hold a
    /// header (and, for the final sequence, a CRC trailer) — the device
    /// treats this the same as any other malformed-frame abort.
    pub fn decode(bytes: &[u8]) -> Option<DataPacket> {
        if bytes.len() < 3 {
            return None;
        }
        let sector = u16::from_le_bytes([bytes[0], bytes[1]]);
        let seq = bytes[2];
        if seq == FINAL_SEQ {
            if bytes.len() < 5 {
                return None;
            }
            let payload_end = bytes.len() - 2;
            let payload = bytes[3..payload_end].to_vec();
            let crc = u16::from_le_bytes([bytes[payload_end], bytes[payload_end + 1]]);
            Some(DataPacket { sector, seq, payload, sector_crc: Some(crc) })
        } else {
            Some(DataPacket { sector, seq, payload: bytes[3..].to_vec(), sector_crc: None })
        }
    }
}

/// Splits one sector's bytes into an ordered list of [`DataPacket`]s.
///
/// The last packet's `seq` is [`FINAL_SEQ`] regardless of how many packets
/// preceded it, and it alone carries `sector_crc = crc16(sector_bytes)`.
pub fn plan_sector_packets(sector: u16, sector_bytes: &[u8], chunk_size: u16) -> Vec<DataPacket> {
    let chunk_size = chunk_size.max(1) as usize;
    let sector_crc = crc16(sector_bytes);

    if sector_bytes.is_empty() {
        // A zero-length sector never occurs for a non-empty image (the final
        // sector is always >0 bytes), but stay defensive: emit one empty
        // final packet so every sector closes with a CRC trailer.
        return vec![DataPacket {
            sector,
            seq: FINAL_SEQ,
            payload: Vec::new(),
            sector_crc: Some(sector_crc),
        }];
    }

    let chunks: Vec<&[u8]> = sector_bytes.chunks(chunk_size).collect();
    let last_index = chunks.len() - 1;
    chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| {
            let is_last = i == last_index;
            DataPacket {
                sector,
                seq: if is_last { FINAL_SEQ } else { i as u8 },
                payload: chunk.to_vec(),
                sector_crc: if is_last { Some(sector_crc) } else { None },
            }
        })
        .collect()
}
