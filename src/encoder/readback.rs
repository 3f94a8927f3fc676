//! Reads a generated module grid back into its payload.
//!
//! Works on clean, axis-aligned grids as produced by the generator (no image
//! sampling, no Reed-Solomon correction). A verification helper for checking
//! what a generated symbol carries; nothing on the export or print path calls it.

use thiserror::Error;

use super::canvas::{Canvas, data_module_positions, format_bits};
use super::tables::{byte_count_bits, ec_block_info, total_codewords};
use crate::models::{BitMatrix, Charset, ECLevel, MaskPattern, Version};

/// Why a grid could not be read back
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadbackError {
    /// Side length is not 21 + 4k modules
    #[error("Grid size {0} is not a valid symbol size")]
    InvalidSize(usize),
    /// Format information is too damaged to identify level and mask
    #[error("Format information unreadable")]
    FormatUnreadable,
    /// The first segment is not byte mode
    #[error("Unsupported segment mode {0:#06b}")]
    UnsupportedMode(u32),
    /// The segment claims more bytes than the symbol holds
    #[error("Segment truncated")]
    Truncated,
    /// Bytes are not valid in the requested charset
    #[error("Payload is not valid text")]
    InvalidText,
}

/// Metadata and payload recovered from a grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Readback {
    /// Version implied by the grid size
    pub version: Version,
    /// Level from the format information
    pub ec_level: ECLevel,
    /// Mask from the format information
    pub mask: MaskPattern,
    /// Byte-mode payload
    pub data: Vec<u8>,
}

/// Read the byte-mode payload out of a module grid
pub fn read_symbol(modules: &BitMatrix) -> Result<Readback, ReadbackError> {
    let size = modules.width();
    let version = Version::from_size(size).ok_or(ReadbackError::InvalidSize(size))?;
    let (ec_level, mask) =
        decode_format(read_format_bits(modules)).ok_or(ReadbackError::FormatUnreadable)?;

    let template = Canvas::new(version);
    let positions = data_module_positions(size, template.function_map());
    let codeword_count = total_codewords(version);

    let mut raw = vec![0u8; codeword_count];
    for (i, &(x, y)) in positions.iter().take(codeword_count * 8).enumerate() {
        // Remove the mask while reading
        let bit = modules.get(x, y) ^ mask.is_masked(y, x);
        raw[i / 8] |= (bit as u8) << (7 - i % 8);
    }

    let data_codewords = deinterleave(&raw, version, ec_level);
    let data = parse_byte_segment(&data_codewords, version)?;
    Ok(Readback {
        version,
        ec_level,
        mask,
        data,
    })
}

/// Read a grid and decode its payload as text
pub fn read_text(modules: &BitMatrix, charset: Charset) -> Result<String, ReadbackError> {
    let readback = read_symbol(modules)?;
    charset
        .decode(&readback.data)
        .ok_or(ReadbackError::InvalidText)
}

fn read_format_bits(modules: &BitMatrix) -> u16 {
    let mut coords: Vec<(usize, usize)> = (0..=5).map(|i| (8, i)).collect();
    coords.extend([(8, 7), (8, 8), (7, 8)]);
    coords.extend((9..15).map(|i| (14 - i, 8)));
    coords
        .iter()
        .enumerate()
        .fold(0u16, |acc, (i, &(x, y))| acc | (u16::from(modules.get(x, y)) << i))
}

/// Nearest valid format word, accepting up to three bit errors
fn decode_format(bits: u16) -> Option<(ECLevel, MaskPattern)> {
    ECLevel::ALL
        .iter()
        .flat_map(|&ec| MaskPattern::ALL.iter().map(move |&mask| (ec, mask)))
        .map(|(ec, mask)| ((format_bits(ec, mask) ^ bits).count_ones(), ec, mask))
        .min_by_key(|(distance, _, _)| *distance)
        .filter(|(distance, _, _)| *distance <= 3)
        .map(|(_, ec, mask)| (ec, mask))
}

/// Undo block interleaving and drop the ECC codewords
fn deinterleave(raw: &[u8], version: Version, ec_level: ECLevel) -> Vec<u8> {
    let info = ec_block_info(version, ec_level);
    let total = raw.len();
    let num_short = info.num_blocks - total % info.num_blocks;
    let short_len = total / info.num_blocks;
    let data_lens: Vec<usize> = (0..info.num_blocks)
        .map(|j| short_len - info.ecc_per_block + usize::from(j >= num_short))
        .collect();
    let longest = data_lens.iter().copied().max().unwrap_or(0);

    let mut blocks: Vec<Vec<u8>> = data_lens.iter().map(|&n| Vec::with_capacity(n)).collect();
    let mut next = raw.iter();
    for col in 0..longest {
        for (block, &len) in blocks.iter_mut().zip(&data_lens) {
            if col < len {
                if let Some(&b) = next.next() {
                    block.push(b);
                }
            }
        }
    }
    blocks.concat()
}

fn parse_byte_segment(codewords: &[u8], version: Version) -> Result<Vec<u8>, ReadbackError> {
    let mut reader = BitReader::new(codewords);
    let mode = reader.read(4).ok_or(ReadbackError::Truncated)?;
    if mode != 0b0100 {
        return Err(ReadbackError::UnsupportedMode(mode));
    }
    let count = reader
        .read(byte_count_bits(version))
        .ok_or(ReadbackError::Truncated)? as usize;
    (0..count)
        .map(|_| reader.read(8).map(|b| b as u8))
        .collect::<Option<Vec<u8>>>()
        .ok_or(ReadbackError::Truncated)
}

struct BitReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> BitReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn read(&mut self, count: usize) -> Option<u32> {
        if self.pos + count > self.bytes.len() * 8 {
            return None;
        }
        let mut value = 0u32;
        for _ in 0..count {
            let bit = (self.bytes[self.pos / 8] >> (7 - self.pos % 8)) & 1;
            value = (value << 1) | u32::from(bit);
            self.pos += 1;
        }
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_format_tolerates_bit_errors() {
        let clean = format_bits(ECLevel::Q, MaskPattern::Pattern6);
        assert_eq!(
            decode_format(clean),
            Some((ECLevel::Q, MaskPattern::Pattern6))
        );
        assert_eq!(
            decode_format(clean ^ 0b101),
            Some((ECLevel::Q, MaskPattern::Pattern6))
        );
    }

    #[test]
    fn test_invalid_size() {
        assert_eq!(
            read_symbol(&BitMatrix::square(22)),
            Err(ReadbackError::InvalidSize(22))
        );
    }

    #[test]
    fn test_bit_reader() {
        let mut reader = BitReader::new(&[0b1010_0000, 0xFF]);
        assert_eq!(reader.read(3), Some(0b101));
        assert_eq!(reader.read(5), Some(0));
        assert_eq!(reader.read(8), Some(0xFF));
        assert_eq!(reader.read(1), None);
    }
}
