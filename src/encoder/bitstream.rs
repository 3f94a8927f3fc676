//! Bitstream assembly for byte-mode segments

use super::tables::{byte_count_bits, data_codewords};
use crate::models::{ECLevel, Version};

const MODE_BYTE: u32 = 0b0100;
const PAD_BYTES: [u8; 2] = [0xEC, 0x11];

/// Growable big-endian bit buffer
#[derive(Debug, Default, Clone)]
pub struct BitBuffer {
    bits: Vec<bool>,
}

impl BitBuffer {
    /// Empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Length in bits
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Whether no bits were appended
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Append the low `count` bits of `value`, most significant first
    pub fn append_bits(&mut self, value: u32, count: usize) {
        debug_assert!(count <= 31 && value >> count == 0);
        for i in (0..count).rev() {
            self.bits.push((value >> i) & 1 == 1);
        }
    }

    /// Pack into bytes; a trailing partial byte is zero-filled
    pub fn to_bytes(&self) -> Vec<u8> {
        self.bits
            .chunks(8)
            .map(|chunk| {
                chunk
                    .iter()
                    .enumerate()
                    .fold(0u8, |acc, (i, &bit)| acc | ((bit as u8) << (7 - i)))
            })
            .collect()
    }
}

/// Bits needed for one byte-mode segment of `len` bytes
pub fn segment_bits(len: usize, version: Version) -> usize {
    4 + byte_count_bits(version) + 8 * len
}

/// Build the padded data codewords for `data` in a single byte-mode segment.
///
/// Returns `None` when the data does not fit `version` at `ec_level`.
pub fn data_codewords_for(data: &[u8], version: Version, ec_level: ECLevel) -> Option<Vec<u8>> {
    let capacity_bits = data_codewords(version, ec_level) * 8;
    if segment_bits(data.len(), version) > capacity_bits {
        return None;
    }

    let mut buffer = BitBuffer::new();
    buffer.append_bits(MODE_BYTE, 4);
    buffer.append_bits(data.len() as u32, byte_count_bits(version));
    for &b in data {
        buffer.append_bits(b as u32, 8);
    }

    // Terminator, then zero-fill to a byte boundary
    let terminator = (capacity_bits - buffer.len()).min(4);
    buffer.append_bits(0, terminator);
    let fill = (8 - buffer.len() % 8) % 8;
    buffer.append_bits(0, fill);

    let mut codewords = buffer.to_bytes();
    for pad in PAD_BYTES.iter().cycle() {
        if codewords.len() * 8 >= capacity_bits {
            break;
        }
        codewords.push(*pad);
    }
    Some(codewords)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_bits() {
        let mut buffer = BitBuffer::new();
        buffer.append_bits(0b0100, 4);
        buffer.append_bits(0b1, 1);
        assert_eq!(buffer.len(), 5);
        assert_eq!(buffer.to_bytes(), vec![0b0100_1000]);
    }

    #[test]
    fn test_data_codewords_layout() {
        let v1 = Version::MIN;
        let codewords = data_codewords_for(b"HI", v1, ECLevel::M).unwrap();
        assert_eq!(codewords.len(), 16);
        // mode 0100, count 00000010, 'H' 01001000, 'I' 01001001, terminator 0000
        assert_eq!(&codewords[..4], &[0x40, 0x24, 0x84, 0x90]);
        assert_eq!(&codewords[4..8], &[0xEC, 0x11, 0xEC, 0x11]);
    }

    #[test]
    fn test_data_too_long_for_version() {
        let v1 = Version::MIN;
        assert!(data_codewords_for(&[b'a'; 17], v1, ECLevel::L).is_some());
        assert!(data_codewords_for(&[b'a'; 18], v1, ECLevel::L).is_none());
    }
}
