use crate::time::Delay;
use anyhow::anyhow;
use std::{fmt, str::FromStr};
use thiserror::Error;

/// A number of abstract units per second of virtual time.
///
/// Used both for emission rates (a [`Source`]) and service rates (a
/// [`Sink`]). A rate of `0` is valid: a source with a zero rate only emits a
/// single probe packet.
///
/// ```
/// # use dossim_core::measure::Rate;
/// let rate: Rate = "7/s".parse().unwrap();
/// assert_eq!(rate, Rate::from(7));
/// assert_eq!(rate.to_string(), "7/s");
///
/// let interval = Rate::from(4).interval().unwrap();
/// assert_eq!(interval.as_secs(), 0.25);
/// assert!(Rate::ZERO.interval().is_none());
/// ```
///
/// [`Source`]: crate::traffic::Source
/// [`Sink`]: crate::traffic::Sink
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Rate(pub(crate) f64);

/// Error returned when a [`Rate`] is negative, infinite or NaN.
#[derive(Debug, Clone, Copy, Error)]
#[error("rate must be finite and non-negative, got {0}")]
pub struct RateError(f64);

impl Rate {
    pub const ZERO: Self = Self(0.0);

    /// create a [`Rate`] of `per_sec` units per second.
    ///
    /// # Errors
    ///
    /// Returns [`RateError`] if `per_sec` is negative, infinite or NaN.
    pub fn new(per_sec: f64) -> Result<Self, RateError> {
        if per_sec.is_finite() && per_sec >= 0.0 {
            Ok(Self(per_sec + 0.0))
        } else {
            Err(RateError(per_sec))
        }
    }

    #[inline]
    pub fn per_sec(self) -> f64 {
        self.0
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.0 == 0.0
    }

    /// the time between two units at this rate (`1 / rate`)
    ///
    /// `None` for a zero rate, or a rate so small the interval is not
    /// representable.
    pub fn interval(self) -> Option<Delay> {
        if self.is_zero() {
            return None;
        }
        Delay::new(1.0 / self.0).ok()
    }

    /// scale the rate by `factor`.
    ///
    /// # Errors
    ///
    /// Returns [`RateError`] if the result is not a valid rate.
    pub fn scale(self, factor: f64) -> Result<Self, RateError> {
        Self::new(self.0 * factor)
    }
}

impl From<u32> for Rate {
    fn from(value: u32) -> Self {
        Self(f64::from(value))
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/s", self.0)
    }
}

impl FromStr for Rate {
    type Err = anyhow::Error;

    /// Parses `"7"` or `"7/s"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let number = s.strip_suffix("/s").unwrap_or(s).trim();
        let value: f64 = number
            .parse()
            .map_err(|error| anyhow!("Failed to parse rate `{s}': {error}"))?;
        Ok(Self::new(value)?)
    }
}
