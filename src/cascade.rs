//! The width cascade: wide lanes first, narrower lanes for what they leave,
//! then a byte-wise scan of the tail.

use crate::lane::{self, Backend, LaneScan, LaneWidth};
use crate::set::EscapeSet;

/// Returns the offset of the first byte in `bytes` that needs escaping under
/// `set`, or `bytes.len()` if there is none.
///
/// `plan` lists the lane widths to run, widest first. Every byte is examined
/// by exactly one stage, and stages run in input order, so the first hit is
/// the lowest offset no matter which widths are in the plan.
#[inline]
pub(crate) fn scan(bytes: &[u8], set: EscapeSet, plan: &[LaneWidth]) -> usize {
    scan_with(Backend::Native, bytes, set, plan)
}

pub(crate) fn scan_with(
    backend: Backend,
    bytes: &[u8],
    set: EscapeSet,
    plan: &[LaneWidth],
) -> usize {
    debug_assert!(plan.windows(2).all(|w| w[0] > w[1]), "plan must be descending");

    // Absolute offset = bytes consumed by the earlier stages + local offset.
    let mut offset = 0;
    for &width in plan {
        match lane::scan_with(backend, width, &bytes[offset..], set) {
            LaneScan::Found(local) => return offset + local,
            LaneScan::Exhausted { consumed } => offset += consumed,
        }
    }
    offset + scan_tail(&bytes[offset..], set)
}

/// Byte-wise scan through the decision table. Returns `bytes.len()` if no
/// byte needs escaping.
#[inline]
pub(crate) fn scan_tail(bytes: &[u8], set: EscapeSet) -> usize {
    let table = set.table();
    bytes
        .iter()
        .position(|&b| table[b as usize])
        .unwrap_or(bytes.len())
}
