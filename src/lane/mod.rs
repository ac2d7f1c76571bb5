//! Lane scanners: find the first escaping byte in whole lanes of 8, 16 or
//! 32 bytes.
//!
//! A lane scanner never looks at a partial lane. Whatever is left over is
//! reported through [`LaneScan::Exhausted`] so a narrower scanner (or the
//! byte-wise tail scan) can pick it up.
//!
//! Each width has two backends:
//! - **native**: SSE2 (128-bit) and AVX2 (256-bit) on `x86_64`, selected at
//!   runtime when the `std` feature is on, at compile time otherwise.
//! - **portable**: plain `u64` words, available on every target. The 128- and
//!   256-bit lanes are emulated as two and four words with a software
//!   movemask.
//!
//! Both backends compute the same per-byte flags, so they always agree.

use crate::set::EscapeSet;

mod portable;
#[cfg(target_arch = "x86_64")]
mod x86;

/// The size of one lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LaneWidth {
    /// 64 bits, one SWAR word.
    W64,
    /// 128 bits, one SSE2 register.
    W128,
    /// 256 bits, one AVX2 register.
    W256,
}

impl LaneWidth {
    /// All widths, widest first.
    pub const DESCENDING: [LaneWidth; 3] = [LaneWidth::W256, LaneWidth::W128, LaneWidth::W64];

    /// Bytes per lane.
    #[inline]
    pub const fn bytes(self) -> usize {
        match self {
            LaneWidth::W64 => 8,
            LaneWidth::W128 => 16,
            LaneWidth::W256 => 32,
        }
    }

    /// Bits per lane.
    #[inline]
    pub const fn bits(self) -> usize {
        self.bytes() * 8
    }

    /// The next narrower width, if any.
    #[inline]
    pub const fn narrower(self) -> Option<LaneWidth> {
        match self {
            LaneWidth::W256 => Some(LaneWidth::W128),
            LaneWidth::W128 => Some(LaneWidth::W64),
            LaneWidth::W64 => None,
        }
    }

    /// Whether the running CPU has instructions for this width.
    ///
    /// [`LaneWidth::W64`] is plain integer arithmetic and always native.
    pub fn is_native(self) -> bool {
        match self {
            LaneWidth::W64 => true,
            LaneWidth::W128 => has_sse2(),
            LaneWidth::W256 => has_avx2(),
        }
    }
}

/// The outcome of scanning whole lanes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaneScan {
    /// An escaping byte at this offset from the start of the scanned slice.
    Found(usize),
    /// No escaping byte in the first `consumed` bytes, which is the lane
    /// size times the number of whole lanes.
    Exhausted {
        /// Bytes covered by the scanned lanes.
        consumed: usize,
    },
}

/// Which implementation a lane scan runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Backend {
    /// Vector instructions when the CPU has them, portable otherwise.
    Native,
    /// Always the portable `u64` implementation.
    #[cfg_attr(not(test), allow(dead_code))]
    Portable,
}

/// Scans the whole `width` lanes of `bytes` for the first byte that needs
/// escaping under `set`.
///
/// Bytes past the last whole lane are not examined.
///
/// ```
/// use json_escape_scan::EscapeSet;
/// use json_escape_scan::lane::{self, LaneScan, LaneWidth};
///
/// let input = b"0123456789abcdef\"";
/// // The quote sits past the only whole 16-byte lane.
/// assert_eq!(
///     lane::scan(LaneWidth::W128, input, EscapeSet::Json),
///     LaneScan::Exhausted { consumed: 16 },
/// );
/// assert_eq!(
///     lane::scan(LaneWidth::W64, &input[8..], EscapeSet::Json),
///     LaneScan::Exhausted { consumed: 8 },
/// );
/// assert_eq!(
///     lane::scan(LaneWidth::W64, &input[9..], EscapeSet::Json),
///     LaneScan::Found(7),
/// );
/// ```
#[inline]
pub fn scan(width: LaneWidth, bytes: &[u8], set: EscapeSet) -> LaneScan {
    scan_with(Backend::Native, width, bytes, set)
}

#[inline]
pub(crate) fn scan_with(backend: Backend, width: LaneWidth, bytes: &[u8], set: EscapeSet) -> LaneScan {
    #[cfg(target_arch = "x86_64")]
    if backend == Backend::Native {
        match width {
            // SAFETY: the CPU supports the instructions we just checked for.
            LaneWidth::W256 if has_avx2() => return unsafe { x86::scan_256(bytes, set) },
            LaneWidth::W128 if has_sse2() => return unsafe { x86::scan_128(bytes, set) },
            _ => {}
        }
    }
    #[cfg(not(target_arch = "x86_64"))]
    let _ = backend;

    match width {
        LaneWidth::W64 => portable::scan_64(bytes, set),
        LaneWidth::W128 => portable::scan_128(bytes, set),
        LaneWidth::W256 => portable::scan_256(bytes, set),
    }
}

// CPU feature detection cache
#[cfg(all(feature = "std", target_arch = "x86_64"))]
static HAS_AVX2: std::sync::OnceLock<bool> = std::sync::OnceLock::new();

/// Check if AVX2 is available (cached after first call)
#[cfg(all(feature = "std", target_arch = "x86_64"))]
pub(crate) fn has_avx2() -> bool {
    *HAS_AVX2.get_or_init(|| std::is_x86_feature_detected!("avx2"))
}

#[cfg(all(not(feature = "std"), target_arch = "x86_64"))]
pub(crate) fn has_avx2() -> bool {
    cfg!(target_feature = "avx2")
}

/// SSE2 is part of the `x86_64` baseline.
#[cfg(target_arch = "x86_64")]
pub(crate) fn has_sse2() -> bool {
    cfg!(target_feature = "sse2")
}

#[cfg(not(target_arch = "x86_64"))]
pub(crate) fn has_avx2() -> bool {
    false
}

#[cfg(not(target_arch = "x86_64"))]
pub(crate) fn has_sse2() -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::vec::Vec;

    const BACKENDS: [Backend; 2] = [Backend::Native, Backend::Portable];

    /// The answer a lane scanner must give, computed byte by byte.
    fn expected(width: LaneWidth, bytes: &[u8], set: EscapeSet) -> LaneScan {
        let whole = bytes.len() / width.bytes() * width.bytes();
        match bytes[..whole].iter().position(|&b| set.contains(b)) {
            Some(i) => LaneScan::Found(i),
            None => LaneScan::Exhausted { consumed: whole },
        }
    }

    fn run_test(bytes: &[u8], case_name: &str) {
        for set in EscapeSet::ALL {
            for width in LaneWidth::DESCENDING {
                for backend in BACKENDS {
                    assert_eq!(
                        scan_with(backend, width, bytes, set),
                        expected(width, bytes, set),
                        "Failed test case: '{case_name}' ({set}, {width:?}, {backend:?})"
                    );
                }
            }
        }
    }

    #[test]
    fn test_width_sizes() {
        assert_eq!(LaneWidth::W64.bytes(), 8);
        assert_eq!(LaneWidth::W128.bits(), 128);
        assert_eq!(LaneWidth::W256.bytes(), 32);
        assert_eq!(LaneWidth::W256.narrower(), Some(LaneWidth::W128));
        assert_eq!(LaneWidth::W64.narrower(), None);
        assert!(LaneWidth::W64.is_native());
    }

    #[test]
    fn test_shorter_than_one_lane() {
        for width in LaneWidth::DESCENDING {
            let short = std::vec![b'"'; width.bytes() - 1];
            for backend in BACKENDS {
                assert_eq!(
                    scan_with(backend, width, &short, EscapeSet::Json),
                    LaneScan::Exhausted { consumed: 0 }
                );
            }
        }
        run_test(b"", "Empty");
    }

    #[test]
    fn test_clean_input_consumes_whole_lanes() {
        let clean = [b'a'; 100];
        assert_eq!(
            scan(LaneWidth::W256, &clean, EscapeSet::Json),
            LaneScan::Exhausted { consumed: 96 }
        );
        assert_eq!(
            scan(LaneWidth::W128, &clean[96..], EscapeSet::Json),
            LaneScan::Exhausted { consumed: 0 }
        );
        assert_eq!(
            scan(LaneWidth::W64, &clean, EscapeSet::Html),
            LaneScan::Exhausted { consumed: 96 }
        );
    }

    #[test]
    fn test_every_position() {
        for len in [8, 16, 31, 32, 33, 64, 70] {
            for pos in 0..len {
                let mut bytes = std::vec![b'x'; len];
                bytes[pos] = b'\\';
                run_test(&bytes, "backslash");
                bytes[pos] = 0x01;
                run_test(&bytes, "control");
                bytes[pos] = 0xE9;
                run_test(&bytes, "high byte");
                bytes[pos] = b'&';
                run_test(&bytes, "ampersand");
            }
        }
    }

    #[test]
    fn test_every_byte_value() {
        // The tested byte goes in the second lane, after a clean one.
        for width in LaneWidth::DESCENDING {
            for b in 0..=255u8 {
                let mut bytes: Vec<u8> = std::vec![b'0'; width.bytes() * 2];
                bytes[width.bytes() + 3] = b;
                run_test(&bytes, "byte value");
            }
        }
    }

    #[test]
    fn test_high_bytes_before_match() {
        // Non-ASCII bytes must neither match in the HTML set nor hide a
        // later match.
        let mut bytes = std::vec![0xC3u8; 64];
        bytes[47] = b'<';
        run_test(&bytes, "utf8 then lt");
        assert_eq!(
            scan(LaneWidth::W256, &bytes, EscapeSet::Html),
            LaneScan::Found(47)
        );
        assert_eq!(scan(LaneWidth::W256, &bytes, EscapeSet::Json), LaneScan::Found(0));
    }
}
