//! SSE2 and AVX2 lane scanners.
//!
//! The per-byte test is the same as the SWAR one, using the byte-wise vector
//! subtraction (`psubb`) so no borrow crosses a byte. `pmovmskb` then keeps
//! only the high bit of each byte, one bit per byte, so the offset is the
//! plain trailing-zero count.

use core::arch::x86_64::*;

use super::LaneScan;
use crate::set::{CONTROL_LIMIT, EscapeSet};

const LANE_128: usize = 16;
const LANE_256: usize = 32;

/// Scans 16-byte lanes.
///
/// # Safety
///
/// The CPU must support SSE2.
#[target_feature(enable = "sse2")]
pub(super) unsafe fn scan_128(bytes: &[u8], set: EscapeSet) -> LaneScan {
    let below_v = _mm_set1_epi8(CONTROL_LIMIT as i8);
    let one_v = _mm_set1_epi8(1);
    let high = set.escapes_high_bytes();

    let lanes = bytes.len() / LANE_128;
    for lane in 0..lanes {
        let at = lane * LANE_128;
        debug_assert!(at + LANE_128 <= bytes.len());
        // SAFETY: `at + 16 <= bytes.len()` for every whole lane; `loadu`
        // accepts any alignment.
        let n = unsafe { _mm_loadu_si128(bytes.as_ptr().add(at) as *const __m128i) };

        let mut mask = _mm_sub_epi8(n, below_v);
        for &c in set.specials() {
            let eq = _mm_sub_epi8(_mm_xor_si128(n, _mm_set1_epi8(c as i8)), one_v);
            mask = _mm_or_si128(mask, eq);
        }
        mask = if high {
            _mm_or_si128(mask, n)
        } else {
            _mm_andnot_si128(n, mask)
        };

        let bits = _mm_movemask_epi8(mask) as u32;
        if bits != 0 {
            return LaneScan::Found(at + bits.trailing_zeros() as usize);
        }
    }
    LaneScan::Exhausted {
        consumed: lanes * LANE_128,
    }
}

/// Scans 32-byte lanes.
///
/// # Safety
///
/// The CPU must support AVX2.
#[target_feature(enable = "avx2")]
pub(super) unsafe fn scan_256(bytes: &[u8], set: EscapeSet) -> LaneScan {
    let below_v = _mm256_set1_epi8(CONTROL_LIMIT as i8);
    let one_v = _mm256_set1_epi8(1);
    let high = set.escapes_high_bytes();

    let lanes = bytes.len() / LANE_256;
    for lane in 0..lanes {
        let at = lane * LANE_256;
        debug_assert!(at + LANE_256 <= bytes.len());
        // SAFETY: `at + 32 <= bytes.len()` for every whole lane; `loadu`
        // accepts any alignment.
        let n = unsafe { _mm256_loadu_si256(bytes.as_ptr().add(at) as *const __m256i) };

        let mut mask = _mm256_sub_epi8(n, below_v);
        for &c in set.specials() {
            let eq = _mm256_sub_epi8(_mm256_xor_si256(n, _mm256_set1_epi8(c as i8)), one_v);
            mask = _mm256_or_si256(mask, eq);
        }
        mask = if high {
            _mm256_or_si256(mask, n)
        } else {
            _mm256_andnot_si256(n, mask)
        };

        let bits = _mm256_movemask_epi8(mask) as u32;
        if bits != 0 {
            return LaneScan::Found(at + bits.trailing_zeros() as usize);
        }
    }
    LaneScan::Exhausted {
        consumed: lanes * LANE_256,
    }
}
