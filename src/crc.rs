//! CRC-16 used to guard the start command and every sector on the wire.
//!
//! Polynomial `0x1021`, initial value `0x0000`, no input/output reflection,
//! no final XOR, MSB-first byte processing. This is the CRC-16/XMODOM-style
//! variant — deliberately *not* the CRC-16/CCITT-FALSE variant (which seeds
//! the register to `0xFFFF`), so the field-deployed peer population that this
//! protocol already talks to keeps working unmodified.

use crc::{Algorithm, Crc};

const ALGORITHM: Algorithm<u16> = Algorithm {
    width: 16,
    poly: 0x1021,
    init: 0x0000,
    refin: false,
    refout: false,
    xorout: 0x0000,
    check: 0x31c3,
    residue: 0x0000,
};

static CRC16: Crc<u16> = Crc::<u16>::new(&ALGORITHM);

/// Compute the protocol's CRC-16 over `data`.
///
/// Deterministic and independent of how the caller chunks its input: feeding
/// the same bytes through [`crc16`] in one call or through a [`Crc16Digest`]
/// across several `update`s always produces the same value.
pub fn crc16(data: &[u8]) -> u16 {
    CRC16.checksum(data)
}

/// Incremental CRC-16 accumulator for callers that see the image in pieces.
pub struct Crc16Digest {
    digest: crc::Digest<'static, u16>,
}

impl Crc16Digest {
    pub fn new() -> Self {
        Self {
            digest: CRC16.digest(),
        }
    }

    pub fn update(&mut self, bytes: &[u8]) {
        self.digest.update(bytes);
    }

    pub fn finalize(self) -> u16 {
        self.digest.finalize()
    }
}

impl Default for Crc16Digest {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_zero() {
        assert_eq!(crc16(&[]), 0x0000);
    }

    #[test]
    fn deterministic_across_calls() {
        let data = b"firmware-image-bytes";
        assert_eq!(crc16(data), crc16(data));
    }

    #[test]
    fn independent_of_chunking() {
        let data = b"the quick brown fox jumps over the lazy dog";
        let whole = crc16(data);

        let mut digest = Crc16Digest::new();
        for chunk in data.chunks(3) {
            digest.update(chunk);
        }
        assert_eq!(digest.finalize(), whole);

        let mut digest = Crc16Digest::new();
        digest.update(&data[..data.len() / 2]);
        digest.update(&data[data.len() / 2..]);
        assert_eq!(digest.finalize(), whole);
    }

    #[test]
    fn differs_on_single_bit_flip() {
        let a = [0u8, 1, 2, 3, 4];
        let mut b = a;
        b[2] ^= 0x01;
        assert_ne!(crc16(&a), crc16(&b));
    }
}
