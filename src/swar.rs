//! SWAR ("SIMD within a register") helpers over little-endian `u64` words.
//!
//! Every flag mask produced here carries at most one bit per byte, the byte's
//! high bit (`0x80`). Byte `i` of the input is byte `i` of the word, so the
//! lowest flagged byte is the lowest set bit on every target.
//!
//! The arithmetic is done per byte, never across byte boundaries: a borrow
//! out of one byte must not leak a flag into its neighbour. This keeps every
//! flag exact, not just the first one.

use crate::set::{CONTROL_LIMIT, EscapeSet};

/// Bytes in one SWAR word.
pub(crate) const WORD_BYTES: usize = 8;

/// Broadcasts a byte to every byte of a word.
#[inline(always)]
pub(crate) const fn splat(b: u8) -> u64 {
    u64::from_ne_bytes([b; WORD_BYTES])
}

pub(crate) const LSB: u64 = splat(0x01);
pub(crate) const MSB: u64 = splat(0x80);

/// Loads the eight bytes at `bytes[at..at + 8]` as a little-endian word.
///
/// # Panics
///
/// Panics in debug builds if fewer than eight bytes remain.
#[inline(always)]
pub(crate) fn load(bytes: &[u8], at: usize) -> u64 {
    debug_assert!(at + WORD_BYTES <= bytes.len(), "load: read past end of slice");
    // SAFETY: every caller iterates whole words only, so `at + 8 <= len`.
    // `read_unaligned` places no alignment requirement on the pointer.
    let word = unsafe { (bytes.as_ptr().add(at) as *const u64).read_unaligned() };
    u64::from_le(word)
}

/// Per-byte wrapping subtraction `a - b`, with no borrow between bytes.
#[inline(always)]
pub(crate) const fn sub_bytes(a: u64, b: u64) -> u64 {
    // Setting every high bit of `a` and clearing every high bit of `b` keeps
    // each byte's difference non-negative, so nothing borrows across; the
    // real high bits are then recombined.
    ((a | MSB).wrapping_sub(b & !MSB)) ^ ((a ^ !b) & MSB)
}

/// High bit set in every byte equal to `c`.
///
/// Only exact for bytes below `0x80`; `c` itself must be a 7-bit value.
#[inline(always)]
pub(crate) const fn eq_flags(word: u64, c: u8) -> u64 {
    sub_bytes(word ^ splat(c), LSB)
}

/// High bit set in every byte below `limit`.
///
/// Only exact for bytes below `0x80`, with `limit <= 0x80`.
#[inline(always)]
pub(crate) const fn below_flags(word: u64, limit: u8) -> u64 {
    sub_bytes(word, splat(limit))
}

/// Returns the escape flags of one word: `0x80` in every byte that needs
/// escaping under `set`, `0x00` elsewhere.
#[inline(always)]
pub(crate) fn flags(word: u64, set: EscapeSet) -> u64 {
    let mut mask = below_flags(word, CONTROL_LIMIT);
    for &c in set.specials() {
        mask |= eq_flags(word, c);
    }
    if set.escapes_high_bytes() {
        // A byte with its own high bit set flags itself.
        mask |= word;
    } else {
        // The tests above say nothing about high bytes; drop them.
        mask &= !word;
    }
    mask & MSB
}

/// Byte offset of the first flagged byte of a SWAR word.
///
/// Flags sit eight bits apart, so the bit index is divided by eight.
#[inline(always)]
pub(crate) const fn first_flagged_byte(flags: u64) -> usize {
    debug_assert!(flags != 0);
    flags.trailing_zeros() as usize / WORD_BYTES
}

/// Collapses a word of high-bit flags into one bit per byte, like
/// `pmovmskb` does for a vector register.
///
/// Bit `i` of the result is the flag of byte `i`.
#[inline(always)]
pub(crate) const fn movemask(flags: u64) -> u8 {
    // Byte k of the multiplier is 1 << (7 - k): the product gathers the flag
    // of byte i at bit 56 + i, and no two partial products overlap.
    const GATHER: u64 = 0x0102_0408_1020_4080;
    ((flags >> 7).wrapping_mul(GATHER) >> 56) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(bytes: [u8; 8]) -> u64 {
        load(&bytes, 0)
    }

    #[test]
    fn test_load_is_little_endian() {
        assert_eq!(word([1, 0, 0, 0, 0, 0, 0, 0]), 1);
        assert_eq!(word([0, 0, 0, 0, 0, 0, 0, 0x80]), 1 << 63);

        // Unaligned offsets.
        let bytes = [0u8, 1, 2, 3, 4, 5, 6, 7, 8, 9];
        assert_eq!(load(&bytes, 1) & 0xFF, 1);
        assert_eq!(load(&bytes, 2) >> 56, 9);
    }

    #[test]
    fn test_sub_bytes_matches_wrapping_sub() {
        let samples = [0x00u8, 0x01, 0x1F, 0x20, 0x21, 0x7F, 0x80, 0x81, 0xC3, 0xFF];
        for &a in &samples {
            for &b in &samples {
                let got = sub_bytes(splat(a) ^ 0x5A, splat(b));
                let got = got.to_le_bytes();
                let a_bytes = (splat(a) ^ 0x5A).to_le_bytes();
                for i in 0..8 {
                    assert_eq!(got[i], a_bytes[i].wrapping_sub(b), "a={a:#x} b={b:#x} i={i}");
                }
            }
        }
    }

    #[test]
    fn test_no_borrow_between_bytes() {
        // A zero byte below a match would borrow into it with a plain
        // 64-bit subtraction.
        let w = word([b'"', b'a', 0, b'a', b'"', b'a', b'a', b'a']);
        assert_eq!(eq_flags(w, b'"') & MSB, 0x80 | (0x80 << 32));
        assert_eq!(below_flags(w, 0x20) & MSB, 0x80 << 16);
    }

    #[test]
    fn test_flags_are_exact() {
        for set in EscapeSet::ALL {
            for b in 0..=255u8 {
                // Surround the byte with both clean and dirty neighbours.
                for fill in [b'a', 0x00, b'"', 0xFF] {
                    let mut bytes = [fill; 8];
                    bytes[3] = b;
                    let f = flags(word(bytes), set).to_le_bytes();
                    for (i, &x) in bytes.iter().enumerate() {
                        let want = if set.contains(x) { 0x80 } else { 0 };
                        assert_eq!(f[i], want, "set={set} byte={b:#x} fill={fill:#x} i={i}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_first_flagged_byte_divides_by_eight() {
        for i in 0..8 {
            let flags = 0x80u64 << (i * 8);
            assert_eq!(first_flagged_byte(flags), i);
            assert_eq!(flags.trailing_zeros() as usize, i * 8 + 7);
        }
        assert_eq!(first_flagged_byte(MSB), 0);
    }

    #[test]
    fn test_movemask_one_bit_per_byte() {
        assert_eq!(movemask(0), 0);
        assert_eq!(movemask(MSB), 0xFF);
        for i in 0..8 {
            assert_eq!(movemask(0x80u64 << (i * 8)), 1 << i);
        }
        assert_eq!(movemask(word([0x80, 0, 0x80, 0, 0, 0, 0, 0x80])), 0b1000_0101);
    }
}
