//! QR symbol generation
//!
//! Encodes text as a single byte-mode segment and builds the module matrix:
//! - Version selection (smallest that fits at the requested level)
//! - Reed-Solomon ECC and block interleaving
//! - Function pattern drawing and zigzag codeword placement
//! - Mask selection by penalty score
//!
//! Every call builds a fresh matrix; nothing is cached between calls.

/// Bit buffer and segment assembly
pub mod bitstream;
/// Module grid with function-pattern tracking
pub mod canvas;
/// Mask penalty rules
pub mod penalty;
/// Reads generated grids back for verification
pub mod readback;
/// Reed-Solomon ECC generation
pub mod reed_solomon;
/// Capacity and block tables
pub mod tables;

use rayon::prelude::*;
use thiserror::Error;
use tracing::debug;

use crate::config::SettingsProvider;
use crate::models::{Charset, ECLevel, MaskPattern, QrContent, QrStyle, QrSymbol, Version};
use bitstream::{data_codewords_for, segment_bits};
use canvas::Canvas;
use penalty::penalty_score;
use reed_solomon::ReedSolomonEncoder;
use tables::{byte_capacity, data_codewords, ec_block_info, total_codewords};

/// Symbol generation failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// A character has no representation in the configured charset
    #[error("Text cannot be encoded as {charset:?}: unsupported character {character:?}")]
    UnencodableText {
        /// First offending character
        character: char,
        /// Charset in use
        charset: Charset,
    },
    /// Even a version 40 symbol cannot hold the text at this level
    #[error("Text is {len} bytes but at most {capacity} fit at level {ec_level}")]
    DataTooLong {
        /// Encoded length in bytes
        len: usize,
        /// Version 40 byte capacity at `ec_level`
        capacity: usize,
        /// Requested level
        ec_level: ECLevel,
    },
}

/// Builds [`QrSymbol`]s from content and style
#[derive(Debug, Clone, Copy, Default)]
pub struct Generator {
    charset: Charset,
}

impl Generator {
    /// Generator encoding text with `charset`
    pub fn new(charset: Charset) -> Self {
        Self { charset }
    }

    /// Generator configured from read-only settings
    pub fn from_settings(settings: &dyn SettingsProvider) -> Self {
        Self::new(settings.charset())
    }

    /// Charset used for text
    pub fn charset(&self) -> Charset {
        self.charset
    }

    /// Encode `content` and attach `style`.
    ///
    /// Deterministic: equal inputs give bit-identical matrices.
    pub fn generate(
        &self,
        content: &QrContent,
        style: &QrStyle,
    ) -> Result<QrSymbol, GenerationError> {
        let ec_level = content.error_correction;
        let data = self.charset.encode(&content.text).map_err(|character| {
            GenerationError::UnencodableText {
                character,
                charset: self.charset,
            }
        })?;

        let version = choose_version(data.len(), ec_level).ok_or(GenerationError::DataTooLong {
            len: data.len(),
            capacity: byte_capacity(Version::MAX, ec_level),
            ec_level,
        })?;
        let codewords =
            data_codewords_for(&data, version, ec_level).ok_or(GenerationError::DataTooLong {
                len: data.len(),
                capacity: byte_capacity(version, ec_level),
                ec_level,
            })?;

        let mut canvas = Canvas::new(version);
        canvas.draw_codewords(&add_ecc_and_interleave(&codewords, version, ec_level));
        let mask = select_mask(&canvas, ec_level);
        canvas.apply_mask(mask);
        canvas.draw_format_bits(ec_level, mask);

        debug!(
            version = version.number(),
            %ec_level,
            mask = mask.bits(),
            bytes = data.len(),
            "generated symbol"
        );

        Ok(QrSymbol {
            modules: canvas.into_modules(),
            version,
            error_correction: ec_level,
            mask_pattern: mask,
            style: style.clone(),
        })
    }
}

/// Generate with the default UTF-8 generator
pub fn generate(content: &QrContent, style: &QrStyle) -> Result<QrSymbol, GenerationError> {
    Generator::default().generate(content, style)
}

fn choose_version(len: usize, ec_level: ECLevel) -> Option<Version> {
    Version::all().find(|&v| segment_bits(len, v) <= data_codewords(v, ec_level) * 8)
}

/// Split data into blocks, append ECC to each, and interleave column-wise
fn add_ecc_and_interleave(data: &[u8], version: Version, ec_level: ECLevel) -> Vec<u8> {
    let info = ec_block_info(version, ec_level);
    let total = total_codewords(version);
    let num_short = info.num_blocks - total % info.num_blocks;
    let short_len = total / info.num_blocks;
    let rs = ReedSolomonEncoder::new(info.ecc_per_block);

    let mut blocks = Vec::with_capacity(info.num_blocks);
    let mut offset = 0;
    for i in 0..info.num_blocks {
        let data_len = short_len - info.ecc_per_block + usize::from(i >= num_short);
        let chunk = &data[offset..offset + data_len];
        offset += data_len;

        let mut block = chunk.to_vec();
        if i < num_short {
            // Placeholder keeps all blocks the same length; skipped below
            block.push(0);
        }
        block.extend(rs.ecc(chunk));
        blocks.push(block);
    }

    let pad_column = short_len - info.ecc_per_block;
    let mut result = Vec::with_capacity(total);
    for col in 0..=short_len {
        for (j, block) in blocks.iter().enumerate() {
            if col != pad_column || j >= num_short {
                result.push(block[col]);
            }
        }
    }
    result
}

/// Lowest-penalty mask; ties go to the lowest mask index
fn select_mask(canvas: &Canvas, ec_level: ECLevel) -> MaskPattern {
    let scores: Vec<u32> = MaskPattern::ALL
        .par_iter()
        .map(|&mask| {
            let mut candidate = canvas.clone();
            candidate.apply_mask(mask);
            candidate.draw_format_bits(ec_level, mask);
            penalty_score(candidate.modules())
        })
        .collect();

    let best = (0..scores.len())
        .min_by_key(|&i| (scores[i], i))
        .unwrap_or(0);
    MaskPattern::from_bits(best as u8)
}
