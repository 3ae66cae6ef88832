//! The packed vertex shader variant key.
//!
//! Bit layout (word 0; word 1 is reserved and always zero):
//!
//! | bits  | field                                                             |
//! |-------|-------------------------------------------------------------------|
//! | 0     | separate specular (secondary color output)                       |
//! | 1     | through mode                                                      |
//! | 2     | fog                                                               |
//! | 3     | vertex has color                                                  |
//! | 4     | texturing                                                         |
//! | 5     | flip texture V                                                    |
//! | 6     | texture projection                                                |
//! | 8     | hardware transform                                                |
//! | 9     | vertex has normal                                                 |
//! | 16-17 | UV generation mode                                                |
//! | 18-19 | UV projection mode, or env map light 0 (depends on bits 16-17)    |
//! | 20-21 | env map light 1                                                   |
//! | 22-24 | bone weight count - 1                                             |
//! | 30    | skinning                                                          |
//! | 32-47 | per light: computation (2 bits) then type (2 bits), 4 bits each   |
//! | 48-50 | material update mask                                              |
//! | 52-55 | per light enable                                                  |
//! | 56    | lighting                                                          |
//! | 57-58 | bone weight format                                                |
//! | 59    | reverse normals                                                   |
//! | 60-61 | texcoord format under UV projection, else bit 60 = has texcoord   |
//! | 62    | flat shading                                                      |

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

pub(crate) const BIT_LMODE: u32 = 0;
pub(crate) const BIT_IS_THROUGH: u32 = 1;
pub(crate) const BIT_ENABLE_FOG: u32 = 2;
pub(crate) const BIT_HAS_COLOR: u32 = 3;
pub(crate) const BIT_DO_TEXTURE: u32 = 4;
pub(crate) const BIT_FLIP_TEXTURE: u32 = 5;
pub(crate) const BIT_DO_TEXTURE_PROJ: u32 = 6;
pub(crate) const BIT_USE_HW_TRANSFORM: u32 = 8;
pub(crate) const BIT_HAS_NORMAL: u32 = 9;
pub(crate) const BIT_UVGEN_MODE: u32 = 16;
pub(crate) const BIT_UVPROJ_MODE: u32 = 18;
pub(crate) const BIT_LS0: u32 = 18;
pub(crate) const BIT_LS1: u32 = 20;
pub(crate) const BIT_BONES: u32 = 22;
pub(crate) const BIT_ENABLE_BONES: u32 = 30;
pub(crate) const BIT_LIGHT0_COMP: u32 = 32;
pub(crate) const BIT_LIGHT0_TYPE: u32 = 34;
pub(crate) const BIT_MATERIAL_UPDATE: u32 = 48;
pub(crate) const BIT_LIGHT0_ENABLE: u32 = 52;
pub(crate) const BIT_LIGHTING_ENABLE: u32 = 56;
pub(crate) const BIT_WEIGHT_FMTSCALE: u32 = 57;
pub(crate) const BIT_NORM_REVERSE: u32 = 59;
pub(crate) const BIT_TEXCOORD_FMTSCALE: u32 = 60;
pub(crate) const BIT_HAS_TEXCOORD: u32 = 60;
pub(crate) const BIT_FLATSHADE: u32 = 62;

/// Bits of word 0 that some field may occupy.
const WORD0_USED: u64 = 0x7ff7_ffff_41ff_037f;

/// Bit offset of the computation field of light `index`; the type field follows it.
pub(crate) const fn light_comp_bit(index: usize) -> u32 {
    BIT_LIGHT0_COMP + 4 * index as u32
}

pub(crate) const fn light_type_bit(index: usize) -> u32 {
    BIT_LIGHT0_TYPE + 4 * index as u32
}

pub(crate) const fn light_enable_bit(index: usize) -> u32 {
    BIT_LIGHT0_ENABLE + index as u32
}

/// Identifies one vertex shader variant.
///
/// Equal keys always generate identical source. Keys are only built through
/// [`crate::build_variant_key`] or [`crate::VertexShaderFeatures::to_key`]; raw words from
/// elsewhere (e.g. a persisted cache index) must pass [`crate::VertexShaderFeatures::decode`]
/// before they are trusted.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariantKey {
    words: [u64; 2],
}

impl VariantKey {
    pub const fn from_words(words: [u64; 2]) -> Self {
        Self { words }
    }

    pub const fn words(&self) -> [u64; 2] {
        self.words
    }

    pub fn bit(&self, bit: u32) -> bool {
        (self.words[(bit >> 6) as usize] >> (bit & 63)) & 1 != 0
    }

    /// Reads a `count`-bit field. Fields never straddle a word boundary.
    pub fn bits(&self, bit: u32, count: u32) -> u32 {
        debug_assert!(count > 0 && count <= 32 && (bit & 63) + count <= 64);
        let mask = (1u64 << count) - 1;
        ((self.words[(bit >> 6) as usize] >> (bit & 63)) & mask) as u32
    }

    pub(crate) fn set_bit(&mut self, bit: u32, value: bool) {
        if value {
            self.words[(bit >> 6) as usize] |= 1 << (bit & 63);
        }
    }

    pub(crate) fn set_bits(&mut self, bit: u32, count: u32, value: u32) {
        debug_assert!(count > 0 && count <= 32 && (bit & 63) + count <= 64);
        debug_assert!(
            u64::from(value) < (1u64 << count),
            "value {value} does not fit in {count} bits"
        );
        let mask = (1u64 << count) - 1;
        self.words[(bit >> 6) as usize] |= (u64::from(value) & mask) << (bit & 63);
    }

    /// Returns the first reserved bit set in this key, as `(word, mask)`.
    pub(crate) fn reserved_bits(&self) -> Option<(usize, u64)> {
        let word0 = self.words[0] & !WORD0_USED;
        if word0 != 0 {
            return Some((0, word0));
        }
        if self.words[1] != 0 {
            return Some((1, self.words[1]));
        }
        None
    }
}

impl fmt::Display for VariantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}{:016x}", self.words[1], self.words[0])
    }
}

impl fmt::Debug for VariantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VariantKey({self})")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseVariantKeyError {
    #[error("variant key is empty")]
    Empty,
    #[error("variant key has {len} hex digits (max 32)")]
    TooLong { len: usize },
    #[error("invalid hex digit {ch:?} at index {index}")]
    InvalidDigit { index: usize, ch: char },
}

impl FromStr for VariantKey {
    type Err = ParseVariantKeyError;

    /// Parses up to 32 hex digits, high word first, with an optional `0x` prefix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if digits.is_empty() {
            return Err(ParseVariantKeyError::Empty);
        }
        if digits.len() > 32 {
            return Err(ParseVariantKeyError::TooLong { len: digits.len() });
        }

        let mut value: u128 = 0;
        for (index, ch) in digits.chars().enumerate() {
            let digit = ch
                .to_digit(16)
                .ok_or(ParseVariantKeyError::InvalidDigit { index, ch })?;
            value = (value << 4) | u128::from(digit);
        }
        Ok(Self::from_words([value as u64, (value >> 64) as u64]))
    }
}

/// Rejection reasons for raw key words.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VariantKeyError {
    #[error("variant key {key} sets reserved bits {bits:#018x} in word {word}")]
    ReservedBits {
        key: VariantKey,
        word: usize,
        bits: u64,
    },
    #[error("variant key {key} is not canonical (re-encodes to {canonical})")]
    NonCanonical {
        key: VariantKey,
        canonical: VariantKey,
    },
    #[error("variant key {key} is inconsistent: {reason}")]
    Inconsistent {
        key: VariantKey,
        reason: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn used_mask_matches_field_catalogue() {
        let mut key = VariantKey::default();
        for bit in [
            BIT_LMODE,
            BIT_IS_THROUGH,
            BIT_ENABLE_FOG,
            BIT_HAS_COLOR,
            BIT_DO_TEXTURE,
            BIT_FLIP_TEXTURE,
            BIT_DO_TEXTURE_PROJ,
            BIT_USE_HW_TRANSFORM,
            BIT_HAS_NORMAL,
            BIT_ENABLE_BONES,
            BIT_LIGHTING_ENABLE,
            BIT_NORM_REVERSE,
            BIT_FLATSHADE,
        ] {
            key.set_bit(bit, true);
        }
        key.set_bits(BIT_UVGEN_MODE, 2, 3);
        key.set_bits(BIT_LS0, 2, 3);
        key.set_bits(BIT_LS1, 2, 3);
        key.set_bits(BIT_BONES, 3, 7);
        for i in 0..4 {
            key.set_bits(light_comp_bit(i), 2, 3);
            key.set_bits(light_type_bit(i), 2, 3);
            key.set_bit(light_enable_bit(i), true);
        }
        key.set_bits(BIT_MATERIAL_UPDATE, 3, 7);
        key.set_bits(BIT_WEIGHT_FMTSCALE, 2, 3);
        key.set_bits(BIT_TEXCOORD_FMTSCALE, 2, 3);

        assert_eq!(key.words(), [WORD0_USED, 0]);
        assert_eq!(key.reserved_bits(), None);
    }

    #[test]
    fn reserved_bits_are_reported() {
        let key = VariantKey::from_words([1 << 7, 0]);
        assert_eq!(key.reserved_bits(), Some((0, 1 << 7)));
        let key = VariantKey::from_words([0, 1]);
        assert_eq!(key.reserved_bits(), Some((1, 1)));
    }

    #[test]
    fn field_accessors() {
        let mut key = VariantKey::default();
        key.set_bits(BIT_BONES, 3, 5);
        key.set_bit(BIT_FLATSHADE, true);
        key.set_bit(BIT_LMODE, false);
        assert_eq!(key.bits(BIT_BONES, 3), 5);
        assert!(key.bit(BIT_FLATSHADE));
        assert!(!key.bit(BIT_LMODE));
        assert_eq!(key.words()[0], (5 << 22) | (1 << 62));
    }

    #[test]
    fn display_and_parse_agree() {
        let key = VariantKey::from_words([0x4000_0000_0000_0113, 0]);
        let text = key.to_string();
        assert_eq!(text, "00000000000000004000000000000113");
        assert_eq!(text.parse::<VariantKey>(), Ok(key));
        assert_eq!("0x113".parse::<VariantKey>().map(|k| k.words()), Ok([0x113, 0]));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!("".parse::<VariantKey>(), Err(ParseVariantKeyError::Empty));
        assert_eq!(
            "12g4".parse::<VariantKey>(),
            Err(ParseVariantKeyError::InvalidDigit { index: 2, ch: 'g' })
        );
        assert_eq!(
            "0".repeat(33).parse::<VariantKey>(),
            Err(ParseVariantKeyError::TooLong { len: 33 })
        );
    }
}
