//! Lane scanners built from `u64` SWAR words only.

use super::LaneScan;
use crate::set::EscapeSet;
use crate::swar::{self, WORD_BYTES};

/// Scans 8-byte lanes, one SWAR word each.
///
/// The flag mask has one bit every eight, so the offset inside the word is
/// `trailing_zeros / 8`.
#[inline]
pub(super) fn scan_64(bytes: &[u8], set: EscapeSet) -> LaneScan {
    match set {
        EscapeSet::Json => words_64(bytes, EscapeSet::Json),
        EscapeSet::Html => words_64(bytes, EscapeSet::Html),
    }
}

/// Scans 16-byte lanes as two words.
#[inline]
pub(super) fn scan_128(bytes: &[u8], set: EscapeSet) -> LaneScan {
    match set {
        EscapeSet::Json => emulated::<2>(bytes, EscapeSet::Json),
        EscapeSet::Html => emulated::<2>(bytes, EscapeSet::Html),
    }
}

/// Scans 32-byte lanes as four words.
#[inline]
pub(super) fn scan_256(bytes: &[u8], set: EscapeSet) -> LaneScan {
    match set {
        EscapeSet::Json => emulated::<4>(bytes, EscapeSet::Json),
        EscapeSet::Html => emulated::<4>(bytes, EscapeSet::Html),
    }
}

#[inline(always)]
fn words_64(bytes: &[u8], set: EscapeSet) -> LaneScan {
    let lanes = bytes.len() / WORD_BYTES;
    for lane in 0..lanes {
        let at = lane * WORD_BYTES;
        let flags = swar::flags(swar::load(bytes, at), set);
        if flags != 0 {
            return LaneScan::Found(at + swar::first_flagged_byte(flags));
        }
    }
    LaneScan::Exhausted {
        consumed: lanes * WORD_BYTES,
    }
}

/// A vector lane of `WORDS` words. Each word's flags are gathered into a
/// byte-per-bit mask, the same shape `pmovmskb` produces, so the offset is
/// the plain trailing-zero count.
#[inline(always)]
fn emulated<const WORDS: usize>(bytes: &[u8], set: EscapeSet) -> LaneScan {
    const { assert!(WORDS * WORD_BYTES <= u32::BITS as usize) };

    let lane_bytes = WORDS * WORD_BYTES;
    let lanes = bytes.len() / lane_bytes;
    for lane in 0..lanes {
        let at = lane * lane_bytes;
        let mut mask = 0u32;
        for w in 0..WORDS {
            let flags = swar::flags(swar::load(bytes, at + w * WORD_BYTES), set);
            mask |= (swar::movemask(flags) as u32) << (w * WORD_BYTES);
        }
        if mask != 0 {
            return LaneScan::Found(at + mask.trailing_zeros() as usize);
        }
    }
    LaneScan::Exhausted {
        consumed: lanes * lane_bytes,
    }
}
