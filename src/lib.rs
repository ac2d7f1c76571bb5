//! # Escape Scanning for JSON Strings
//!
//! A small, `no_std` compatible library that answers one question fast: *where
//! is the first byte of this buffer that needs escaping?* A JSON string encoder
//! can then copy the clean prefix verbatim and only pay per-character cost at
//! the escape points, which are rare in most real text.
//!
//! ## Key Features
//! - **Two escape sets**: [`EscapeSet::Json`] (controls, `"`, `\`, and every
//!   non-ASCII byte) and [`EscapeSet::Html`] (controls, `"`, `\`, `<`, `>`, `&`)
//!   for JSON embedded in HTML.
//! - **Width cascade**: 256-bit AVX2 lanes, then 128-bit SSE2 lanes, then
//!   64-bit SWAR words, then a table-driven scan of the last few bytes.
//! - **Same answer on every path**: the width is a [`Strategy`], never an
//!   observable behaviour. Targets without vector instructions run the same
//!   algorithm on plain `u64` words.
//! - **Zero allocation**: the scanner only reads its input and two static
//!   256-entry tables.
//!
//! ## Quick Start
//!
//! ```
//! use json_escape_scan::{EscapeSet, escape_index, find_escape};
//!
//! assert_eq!(escape_index(b"hello", EscapeSet::Json), 5);
//! assert_eq!(escape_index(b"he\"llo", EscapeSet::Json), 2);
//! assert_eq!(find_escape(b"<b>", EscapeSet::Html), Some(0));
//! assert_eq!(find_escape(b"<b>", EscapeSet::Json), None);
//! ```
//!
//! ## Splitting at escape points
//!
//! ```
//! use json_escape_scan::{EscapeSet, Segment, segments};
//!
//! let parts: Vec<_> = segments(b"a\nb", EscapeSet::Json).collect();
//! assert_eq!(
//!     parts,
//!     [Segment::Literal(b"a"), Segment::Escape(b'\n'), Segment::Literal(b"b")]
//! );
//! ```
//!
//! ## Features
//! - `std` (default): runtime CPU detection and the
//!   [`ESCAPE_SCAN_STRATEGY`](STRATEGY_ENV) override. Without it, the widths
//!   are chosen from the compile-time target features.
//! - `tracing`: logs the resolved strategy once per process.
#![no_std]
#![deny(missing_docs)]

#[cfg(any(test, feature = "std"))]
extern crate std;

mod cascade;
pub mod lane;
mod segment;
mod set;
mod strategy;
mod swar;

pub use segment::{Segment, Segments};
pub use set::{EscapeSet, ParseEscapeSetError, needs_escape};
pub use strategy::{ParseStrategyError, STRATEGY_ENV, Strategy};

/// Returns the offset of the first byte in `bytes` that needs escaping under
/// `set`, or `bytes.len()` if there is none.
///
/// Uses [`Strategy::Auto`].
///
/// ```
/// use json_escape_scan::{EscapeSet, escape_index};
///
/// let mut input = [b'a'; 40];
/// input[39] = 0x01;
/// assert_eq!(escape_index(&input, EscapeSet::Json), 39);
///
/// let input = b"abcde\x85fgh";
/// assert_eq!(escape_index(input, EscapeSet::Json), 5);
/// assert_eq!(escape_index(input, EscapeSet::Html), input.len());
/// ```
#[inline]
pub fn escape_index(bytes: &[u8], set: EscapeSet) -> usize {
    Scanner::new(set).escape_index(bytes)
}

/// Returns the offset of the first byte in `bytes` that needs escaping under
/// `set`, or `None` if there is none.
///
/// Uses [`Strategy::Auto`].
#[inline]
pub fn find_escape(bytes: &[u8], set: EscapeSet) -> Option<usize> {
    Scanner::new(set).find(bytes)
}

/// Creates an iterator over the literal runs and escape points of `bytes`.
///
/// Uses [`Strategy::Auto`]. See [`Segments`].
#[inline]
pub fn segments(bytes: &[u8], set: EscapeSet) -> Segments<'_> {
    Scanner::new(set).segments(bytes)
}

/// An escape set bound to a scanning [`Strategy`].
///
/// `Scanner` is `Copy` and holds no buffers, so it can be stored in an
/// encoder and shared across threads freely.
///
/// ```
/// use json_escape_scan::{EscapeSet, Scanner, Strategy};
///
/// let input = "Plain text, then a <tag>".as_bytes();
/// let auto = Scanner::new(EscapeSet::Html);
/// for strategy in Strategy::CONCRETE {
///     let forced = auto.with_strategy(strategy);
///     assert_eq!(forced.escape_index(input), auto.escape_index(input));
/// }
/// assert_eq!(auto.find(input), Some(19));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Scanner {
    set: EscapeSet,
    strategy: Strategy,
}

impl Scanner {
    /// Creates a scanner for `set` using [`Strategy::Auto`].
    #[inline]
    pub const fn new(set: EscapeSet) -> Self {
        Self {
            set,
            strategy: Strategy::Auto,
        }
    }

    /// Returns a copy of this scanner that uses `strategy`.
    ///
    /// A strategy the CPU has no instructions for still works, on the
    /// portable backend.
    #[inline]
    pub const fn with_strategy(self, strategy: Strategy) -> Self {
        Self { strategy, ..self }
    }

    /// The escape set.
    #[inline]
    pub const fn set(&self) -> EscapeSet {
        self.set
    }

    /// The strategy, as configured (possibly [`Strategy::Auto`]).
    #[inline]
    pub const fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Returns the offset of the first byte that needs escaping, or
    /// `bytes.len()` if there is none.
    #[inline]
    pub fn escape_index(&self, bytes: &[u8]) -> usize {
        cascade::scan(bytes, self.set, self.strategy.plan())
    }

    /// Returns the offset of the first byte that needs escaping, if any.
    #[inline]
    pub fn find(&self, bytes: &[u8]) -> Option<usize> {
        let pos = self.escape_index(bytes);
        (pos < bytes.len()).then_some(pos)
    }

    /// Splits `bytes` at the first byte that needs escaping.
    ///
    /// The first half needs no escaping; the second half is empty or starts
    /// with a byte that does.
    ///
    /// ```
    /// use json_escape_scan::{EscapeSet, Scanner};
    ///
    /// let scanner = Scanner::new(EscapeSet::Json);
    /// assert_eq!(scanner.split_at_escape(b"ab\"c"), (&b"ab"[..], &b"\"c"[..]));
    /// assert_eq!(scanner.split_at_escape(b"abc"), (&b"abc"[..], &b""[..]));
    /// ```
    #[inline]
    pub fn split_at_escape<'a>(&self, bytes: &'a [u8]) -> (&'a [u8], &'a [u8]) {
        bytes.split_at(self.escape_index(bytes))
    }

    /// Creates an iterator over the literal runs and escape points of
    /// `bytes`.
    #[inline]
    pub fn segments<'a>(&self, bytes: &'a [u8]) -> Segments<'a> {
        Segments {
            bytes,
            scanner: *self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_scenarios() {
        assert_eq!(escape_index(b"hello", EscapeSet::Json), 5);
        assert_eq!(escape_index(b"he\"llo", EscapeSet::Json), 2);
        assert_eq!(escape_index(b"<b>", EscapeSet::Html), 0);
    }

    #[test]
    fn test_find_mirrors_escape_index() {
        assert_eq!(find_escape(b"", EscapeSet::Json), None);
        assert_eq!(find_escape(b"abc", EscapeSet::Json), None);
        assert_eq!(find_escape(b"ab\\", EscapeSet::Json), Some(2));
    }

    #[test]
    fn test_scanner_accessors() {
        let scanner = Scanner::new(EscapeSet::Html).with_strategy(Strategy::Swar);
        assert_eq!(scanner.set(), EscapeSet::Html);
        assert_eq!(scanner.strategy(), Strategy::Swar);
        assert_eq!(Scanner::default().set(), EscapeSet::Json);
        assert_eq!(Scanner::default().strategy(), Strategy::Auto);
    }

    #[test]
    fn test_scanning_is_pure() {
        let input = std::vec![b'x', b'y', b'"', b'z'];
        let before = input.clone();
        let scanner = Scanner::new(EscapeSet::Json);
        let first = scanner.escape_index(&input);
        for _ in 0..4 {
            assert_eq!(scanner.escape_index(&input), first);
        }
        assert_eq!(input, before);
    }

    // Inspired by and copied from memchr
    #[test]
    fn sync_regression() {
        use core::panic::{RefUnwindSafe, UnwindSafe};

        fn assert_send_sync<T: Send + Sync + UnwindSafe + RefUnwindSafe>() {}
        assert_send_sync::<Scanner>();
        assert_send_sync::<Segments<'_>>();
        assert_send_sync::<EscapeSet>();
        assert_send_sync::<Strategy>();
    }
}
