use std::{fmt, str::FromStr};

/// The fraction of non-malicious traffic a [`Splitter`] admits directly,
/// without sending it through scrubbing.
///
/// # Example
///
/// ```
/// use dossim_core::measure::TrustRatio;
///
/// let ratio = TrustRatio::new(0.4).unwrap();
/// assert_eq!(ratio.to_string(), "40%");
/// assert_eq!(ratio.admitted_per_cycle(), 4);
///
/// let parsed: TrustRatio = "40%".parse().unwrap();
/// assert_eq!(parsed, ratio);
/// ```
///
/// [`Splitter`]: crate::traffic::Splitter
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct TrustRatio(pub(crate) f64);

/// Length of the round-robin admission cycle.
pub const ADMISSION_CYCLE: u64 = 10;

impl TrustRatio {
    /// nothing is trusted: every packet is scrubbed
    pub const NONE: Self = Self(0.0);
    /// everything non-malicious is trusted
    pub const FULL: Self = Self(1.0);

    /// Create a validated trust ratio.
    ///
    /// # Errors
    ///
    /// Returns [`TrustRatioError`] if `ratio` is not in `[0.0, 1.0]`
    /// (including NaN).
    pub fn new(ratio: f64) -> Result<Self, TrustRatioError> {
        if !(0.0..=1.0).contains(&ratio) {
            return Err(TrustRatioError(ratio));
        }
        Ok(Self(ratio + 0.0))
    }

    /// Returns the inner `f64` value.
    pub fn value(self) -> f64 {
        self.0
    }

    /// How many packets out of every [`ADMISSION_CYCLE`] are admitted
    /// directly: `round(ratio × 10)`, ties to even.
    ///
    /// ```
    /// # use dossim_core::measure::TrustRatio;
    /// assert_eq!(TrustRatio::new(0.8).unwrap().admitted_per_cycle(), 8);
    /// assert_eq!(TrustRatio::new(0.25).unwrap().admitted_per_cycle(), 2);
    /// assert_eq!(TrustRatio::new(0.33).unwrap().admitted_per_cycle(), 3);
    /// ```
    pub fn admitted_per_cycle(self) -> u64 {
        (self.0 * ADMISSION_CYCLE as f64).round_ties_even() as u64
    }
}

impl fmt::Display for TrustRatio {
    /// Formats as a percentage with up to 2 decimal places.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pct = (self.0 * 10_000.0).round() / 100.0;
        if pct.fract() == 0.0 {
            write!(f, "{}%", pct as u64)
        } else {
            write!(f, "{:.2}%", pct)
        }
    }
}

impl FromStr for TrustRatio {
    type Err = TrustRatioParseError;

    /// Parses a percentage string like `"0%"`, `"40%"`, `"12.50%"`.
    ///
    /// The `%` suffix is required.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let Some(num) = s.strip_suffix('%') else {
            return Err(TrustRatioParseError::MissingSuffix);
        };
        let pct: f64 = num
            .trim()
            .parse()
            .map_err(|_| TrustRatioParseError::InvalidNumber)?;
        TrustRatio::new(pct / 100.0).map_err(TrustRatioParseError::OutOfRange)
    }
}

/// Error returned when constructing a [`TrustRatio`] with a value
/// outside `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, thiserror::Error)]
#[error("trust ratio must be in [0.0, 1.0], got {0}")]
pub struct TrustRatioError(f64);

/// Error returned when parsing a [`TrustRatio`] from a string.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TrustRatioParseError {
    #[error("expected '%' suffix")]
    MissingSuffix,
    #[error("invalid number before '%'")]
    InvalidNumber,
    #[error("{0}")]
    OutOfRange(#[from] TrustRatioError),
}
