//! Width selection.
//!
//! A [`Strategy`] names the widest lane the cascade starts from. It is purely
//! a performance choice: every strategy returns the same offset for the same
//! input.

use core::{fmt, str::FromStr};

use crate::lane::LaneWidth;

/// Environment variable read once to override [`Strategy::Auto`].
///
/// Accepts the same names as [`Strategy`]'s [`FromStr`] implementation.
/// Only consulted with the `std` feature.
pub const STRATEGY_ENV: &str = "ESCAPE_SCAN_STRATEGY";

/// Which lane widths a scan runs through before the byte-wise tail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Strategy {
    /// Pick the widest strategy the running CPU supports, or the one named
    /// by [`STRATEGY_ENV`].
    #[default]
    Auto,
    /// 256-bit, then 128-bit, then 64-bit lanes.
    Avx2,
    /// 128-bit, then 64-bit lanes.
    Sse2,
    /// 64-bit SWAR words only.
    Swar,
    /// Byte by byte through the decision table.
    Scalar,
}

impl Strategy {
    /// Every concrete strategy, widest first.
    pub const CONCRETE: [Strategy; 4] = [
        Strategy::Avx2,
        Strategy::Sse2,
        Strategy::Swar,
        Strategy::Scalar,
    ];

    /// The lane widths this strategy runs, widest first.
    ///
    /// [`Strategy::Auto`] is resolved first.
    pub fn plan(self) -> &'static [LaneWidth] {
        match self.resolve() {
            Strategy::Avx2 => &[LaneWidth::W256, LaneWidth::W128, LaneWidth::W64],
            Strategy::Sse2 => &[LaneWidth::W128, LaneWidth::W64],
            Strategy::Swar => &[LaneWidth::W64],
            Strategy::Scalar | Strategy::Auto => &[],
        }
    }

    /// Replaces [`Strategy::Auto`] with the strategy picked for this
    /// process. Concrete strategies are returned unchanged.
    #[inline]
    pub fn resolve(self) -> Strategy {
        match self {
            Strategy::Auto => detected(),
            s => s,
        }
    }

    /// Whether the running CPU executes every width of this strategy with
    /// native instructions.
    ///
    /// A strategy that is not native still works: the missing widths run on
    /// the portable backend.
    pub fn is_native(self) -> bool {
        self.plan().iter().all(|w| w.is_native())
    }

    /// The widest strategy the running CPU supports natively.
    pub fn from_cpu() -> Strategy {
        if LaneWidth::W256.is_native() {
            Strategy::Avx2
        } else if LaneWidth::W128.is_native() {
            Strategy::Sse2
        } else {
            Strategy::Swar
        }
    }

    /// The canonical lowercase name, as accepted by [`FromStr`].
    pub const fn name(self) -> &'static str {
        match self {
            Strategy::Auto => "auto",
            Strategy::Avx2 => "avx2",
            Strategy::Sse2 => "sse2",
            Strategy::Swar => "swar",
            Strategy::Scalar => "scalar",
        }
    }
}

#[cfg(feature = "std")]
fn detected() -> Strategy {
    static DETECTED: std::sync::OnceLock<Strategy> = std::sync::OnceLock::new();
    *DETECTED.get_or_init(|| {
        let var = std::env::var(STRATEGY_ENV).ok();
        let strategy = from_env(var.as_deref()).unwrap_or_else(Strategy::from_cpu);
        #[cfg(feature = "tracing")]
        tracing::debug!(
            strategy = %strategy,
            overridden = var.is_some(),
            "resolved escape scan strategy"
        );
        strategy
    })
}

#[cfg(not(feature = "std"))]
fn detected() -> Strategy {
    Strategy::from_cpu()
}

/// Reads an override value. `auto`, an empty value and an unknown name all
/// fall back to detection.
#[cfg(feature = "std")]
fn from_env(value: Option<&str>) -> Option<Strategy> {
    let value = value?;
    match value.parse::<Strategy>() {
        Ok(Strategy::Auto) => None,
        Ok(s) => Some(s),
        Err(_e) => {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                value,
                error = %_e,
                "ignoring {STRATEGY_ENV}"
            );
            None
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = ParseStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        [Strategy::Auto]
            .into_iter()
            .chain(Strategy::CONCRETE)
            .find(|strategy| strategy.name().eq_ignore_ascii_case(s))
            .ok_or(ParseStrategyError { _priv: () })
    }
}

/// The error returned when parsing a [`Strategy`] from an unknown name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStrategyError {
    _priv: (),
}

impl fmt::Display for ParseStrategyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("unknown scan strategy, expected one of `auto`, `avx2`, `sse2`, `swar`, `scalar`")
    }
}

impl core::error::Error for ParseStrategyError {}
