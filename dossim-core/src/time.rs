use anyhow::{anyhow, bail, ensure};
use logos::{Lexer, Logos};
use std::{cmp::Ordering, fmt, ops::Add, str::FromStr};
use thiserror::Error;

/// A point on the virtual clock, in seconds since the start of the run.
///
/// The clock is purely logical: it never relates to wall-clock time.
/// [`SimTime`] is always finite and non-negative, which gives it a total
/// order and makes it usable as a key in the [`TimeQueue`].
///
/// # Parsing
///
/// ```
/// # use dossim_core::SimTime;
/// let horizon: SimTime = "1m 20s".parse().unwrap();
/// assert_eq!(horizon, "80".parse().unwrap());
/// assert_eq!(horizon.to_string(), "80s");
///
/// let short: SimTime = "250ms".parse().unwrap();
/// assert_eq!(short.as_secs(), 0.25);
/// ```
///
/// [`TimeQueue`]: crate::TimeQueue
#[derive(Clone, Copy, Default)]
pub struct SimTime(pub(crate) f64);

/// A non-negative span of virtual time.
///
/// A [`Delay`] of zero is valid: scheduling after [`Delay::ZERO`] still
/// defers the wake-up to a later scheduler step.
#[derive(Clone, Copy, Default)]
pub struct Delay(pub(crate) f64);

/// Error returned when a time value is negative, infinite or NaN.
#[derive(Debug, Clone, Copy, Error)]
#[error("virtual time must be finite and non-negative, got {0}")]
pub struct TimeError(f64);

fn validate(secs: f64) -> Result<f64, TimeError> {
    if secs.is_finite() && secs >= 0.0 {
        // normalises `-0.0`
        Ok(secs + 0.0)
    } else {
        Err(TimeError(secs))
    }
}

impl SimTime {
    /// The start of every simulation.
    pub const ZERO: Self = Self(0.0);

    /// create a [`SimTime`] from a number of seconds.
    ///
    /// # Errors
    ///
    /// Returns [`TimeError`] if `secs` is negative, infinite or NaN.
    pub fn new(secs: f64) -> Result<Self, TimeError> {
        validate(secs).map(Self)
    }

    #[inline]
    pub fn as_secs(self) -> f64 {
        self.0
    }

    /// seconds elapsed since `earlier`.
    ///
    /// Saturates at `0.0` if `earlier` is in the future.
    #[inline]
    pub fn since(self, earlier: SimTime) -> f64 {
        (self.0 - earlier.0).max(0.0)
    }
}

impl Delay {
    pub const ZERO: Self = Self(0.0);

    /// create a [`Delay`] of `secs` seconds.
    ///
    /// # Errors
    ///
    /// Returns [`TimeError`] if `secs` is negative, infinite or NaN.
    pub fn new(secs: f64) -> Result<Self, TimeError> {
        validate(secs).map(Self)
    }

    #[inline]
    pub fn as_secs(self) -> f64 {
        self.0
    }

    /// multiply the delay by a non-negative `factor`, saturating at
    /// `f64::MAX` seconds.
    pub(crate) fn scaled(self, factor: f64) -> Self {
        let secs = self.0 * factor;
        if secs.is_nan() || secs <= 0.0 {
            Self::ZERO
        } else {
            Self(secs.min(f64::MAX))
        }
    }
}

impl PartialEq for SimTime {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for SimTime {}
impl PartialOrd for SimTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for SimTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl PartialEq for Delay {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}
impl Eq for Delay {}

impl Add<Delay> for SimTime {
    type Output = SimTime;

    /// saturates at `f64::MAX` so the result stays finite.
    fn add(self, rhs: Delay) -> Self::Output {
        Self((self.0 + rhs.0).min(f64::MAX))
    }
}

impl fmt::Debug for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SimTime({}s)", self.0)
    }
}
impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}
impl fmt::Debug for Delay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Delay({}s)", self.0)
    }
}
impl fmt::Display for Delay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

fn parse_secs(s: &str) -> anyhow::Result<f64> {
    let mut lex: Lexer<'_, Token> = Token::lexer(s);

    let mut total = 0.0;
    let mut terms = 0usize;

    while let Some(next) = lex.next() {
        let number: Token = next.map_err(|()| anyhow!("Failed to parse: {s}"))?;

        ensure!(
            number == Token::Value,
            "Expecting time to start with a number. Cannot parse {s}"
        );
        let value: f64 = lex.slice().parse()?;

        let secs = match lex.next() {
            // a lone number is a count of seconds
            None if terms == 0 => value,
            None => bail!("Expecting a measure after `{value}', failed to parse: {s}"),
            Some(Ok(Token::Value)) | Some(Err(())) => {
                bail!("Expecting a measure, failed to parse: {s}")
            }
            Some(Ok(measure)) => measure.to_secs(value),
        };
        total += secs;
        terms += 1;
    }

    ensure!(terms > 0, "Expecting a time value, got an empty string");

    Ok(total)
}

impl FromStr for SimTime {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(parse_secs(s)?)?)
    }
}

impl FromStr for Delay {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(parse_secs(s)?)?)
    }
}

#[derive(Logos, Debug, PartialEq, Clone, Copy)]
#[logos(skip r"[ \t\n\f]+")] // Ignore this regex pattern between tokens
enum Token {
    #[token("ns")]
    NanoSeconds,
    #[regex("us|μs")]
    MicroSeconds,
    #[token("ms")]
    MilliSeconds,
    #[token("s")]
    Seconds,
    #[token("m")]
    Minutes,

    #[regex(r"[0-9]+(\.[0-9]+)?")]
    Value,
}

impl Token {
    fn to_secs(self, value: f64) -> f64 {
        match self {
            Token::NanoSeconds => value / 1_000_000_000.0,
            Token::MicroSeconds => value / 1_000_000.0,
            Token::MilliSeconds => value / 1_000.0,
            Token::Seconds => value,
            Token::Minutes => value * 60.0,
            Token::Value => value,
        }
    }
}
