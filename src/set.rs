//! Escape sets and the byte classifier.
//!
//! Every scanning path in this crate is checked against the two decision
//! tables defined here. The lane scanners are only a faster way of asking
//! [`needs_escape`] for many bytes at once.

use core::{fmt, str::FromStr};

/// The policy deciding which bytes must be specially encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EscapeSet {
    /// Plain JSON output.
    ///
    /// Escapes the control bytes `0x00..=0x1F`, `"`, `\` and every byte
    /// `>= 0x80`, so the unescaped prefix is always printable ASCII.
    #[default]
    Json,
    /// JSON embedded in HTML.
    ///
    /// Escapes the control bytes `0x00..=0x1F`, `"`, `\`, `<`, `>` and `&`.
    /// Bytes `>= 0x80` are passed through.
    Html,
}

impl EscapeSet {
    /// All escape sets, in declaration order.
    pub const ALL: [EscapeSet; 2] = [EscapeSet::Json, EscapeSet::Html];

    /// Returns the 256-entry decision table for this set.
    #[inline(always)]
    pub fn table(self) -> &'static [bool; 256] {
        match self {
            EscapeSet::Json => &JSON_TABLE,
            EscapeSet::Html => &HTML_TABLE,
        }
    }

    /// Returns `true` if `byte` must be escaped under this set.
    #[inline(always)]
    pub fn contains(self, byte: u8) -> bool {
        self.table()[byte as usize]
    }

    /// The fixed 7-bit bytes matched by equality, besides the control range.
    #[inline(always)]
    pub(crate) const fn specials(self) -> &'static [u8] {
        match self {
            EscapeSet::Json => &[b'"', b'\\'],
            EscapeSet::Html => &[b'"', b'\\', b'<', b'>', b'&'],
        }
    }

    /// Whether every byte with its high bit set is escaped.
    #[inline(always)]
    pub(crate) const fn escapes_high_bytes(self) -> bool {
        matches!(self, EscapeSet::Json)
    }

    /// The canonical lowercase name, as accepted by [`FromStr`].
    pub const fn name(self) -> &'static str {
        match self {
            EscapeSet::Json => "json",
            EscapeSet::Html => "html",
        }
    }
}

/// Returns `true` if `byte` must be escaped under `set`.
///
/// This is the ground truth for every scanner in the crate.
///
/// ```
/// use json_escape_scan::{EscapeSet, needs_escape};
///
/// assert!(needs_escape(b'"', EscapeSet::Json));
/// assert!(needs_escape(0x85, EscapeSet::Json));
/// assert!(!needs_escape(0x85, EscapeSet::Html));
/// assert!(needs_escape(b'<', EscapeSet::Html));
/// ```
#[inline(always)]
pub fn needs_escape(byte: u8, set: EscapeSet) -> bool {
    set.contains(byte)
}

/// Control bytes below this value are always escaped.
pub(crate) const CONTROL_LIMIT: u8 = 0x20;

const fn build_table(specials: &[u8], high_bytes: bool) -> [bool; 256] {
    let mut table = [false; 256];

    let mut i = 0;
    while i < CONTROL_LIMIT as usize {
        table[i] = true;
        i += 1;
    }

    let mut j = 0;
    while j < specials.len() {
        table[specials[j] as usize] = true;
        j += 1;
    }

    if high_bytes {
        let mut k = 0x80;
        while k < 256 {
            table[k] = true;
            k += 1;
        }
    }

    table
}

static JSON_TABLE: [bool; 256] = build_table(EscapeSet::Json.specials(), true);
static HTML_TABLE: [bool; 256] = build_table(EscapeSet::Html.specials(), false);

impl fmt::Display for EscapeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EscapeSet {
    type Err = ParseEscapeSetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        for (names, set) in [
            (&["json", "strict", "json-strict"][..], EscapeSet::Json),
            (&["html", "html-safe", "json-html-safe"][..], EscapeSet::Html),
        ] {
            if names.iter().any(|n| n.eq_ignore_ascii_case(s)) {
                return Ok(set);
            }
        }
        Err(ParseEscapeSetError { _priv: () })
    }
}

/// The error returned when parsing an [`EscapeSet`] from an unknown name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEscapeSetError {
    _priv: (),
}

impl fmt::Display for ParseEscapeSetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("unknown escape set, expected `json` or `html`")
    }
}

impl core::error::Error for ParseEscapeSetError {}
