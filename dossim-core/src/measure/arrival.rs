use super::Rate;
use crate::time::Delay;
use anyhow::{anyhow, bail};
use rand_chacha::ChaChaRng;
use rand_core::SeedableRng as _;
use std::{fmt, str::FromStr};

/// How a [`Source`] spaces its emissions.
///
/// ```
/// use dossim_core::measure::Arrival;
///
/// assert_eq!(Arrival::default(), Arrival::Periodic);
/// assert_eq!("poisson:7".parse::<Arrival>().unwrap(), Arrival::Poisson { seed: 7 });
/// assert_eq!(Arrival::Poisson { seed: 7 }.to_string(), "poisson:7");
/// ```
///
/// [`Source`]: crate::traffic::Source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Arrival {
    /// exactly `1 / rate` between two emissions
    #[default]
    Periodic,
    /// exponentially distributed gaps with mean `1 / rate`, drawn from a
    /// [`ChaChaRng`] seeded with `seed`
    Poisson { seed: u64 },
}

impl Arrival {
    /// derive an independent arrival process from this one.
    ///
    /// Periodic stays periodic; a Poisson process gets a different seed so
    /// that two sources configured alike do not emit in lockstep.
    #[must_use = "function does not modify the current value"]
    pub fn reseeded(self, salt: u64) -> Self {
        match self {
            Self::Periodic => Self::Periodic,
            Self::Poisson { seed } => Self::Poisson {
                seed: seed.wrapping_add(salt),
            },
        }
    }
}

impl fmt::Display for Arrival {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Periodic => f.write_str("periodic"),
            Self::Poisson { seed } => write!(f, "poisson:{seed}"),
        }
    }
}

impl FromStr for Arrival {
    type Err = anyhow::Error;

    /// Parses `"periodic"`, `"poisson"` (seed `0`) or `"poisson:<seed>"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.split_once(':') {
            None if s == "periodic" => Ok(Self::Periodic),
            None if s == "poisson" => Ok(Self::Poisson { seed: 0 }),
            Some(("poisson", seed)) => {
                let seed = seed
                    .trim()
                    .parse()
                    .map_err(|error| anyhow!("Invalid poisson seed `{seed}': {error}"))?;
                Ok(Self::Poisson { seed })
            }
            _ => bail!("Unknown arrival process `{s}', expecting `periodic' or `poisson[:seed]'"),
        }
    }
}

/// Produces the successive inter-emission delays of one source.
pub(crate) enum Pacing {
    Periodic(Delay),
    Poisson { mean: Delay, rng: ChaChaRng },
}

impl Pacing {
    /// `None` when `rate` has no interval (a zero rate).
    pub(crate) fn new(arrival: Arrival, rate: Rate) -> Option<Self> {
        let mean = rate.interval()?;
        Some(match arrival {
            Arrival::Periodic => Self::Periodic(mean),
            Arrival::Poisson { seed } => Self::Poisson {
                mean,
                rng: ChaChaRng::seed_from_u64(seed),
            },
        })
    }

    pub(crate) fn next_delay(&mut self) -> Delay {
        match self {
            Self::Periodic(interval) => *interval,
            Self::Poisson { mean, rng } => {
                let sample = super::unit_sample(rng);
                // inverse CDF of the exponential distribution
                mean.scaled(-(1.0 - sample).ln())
            }
        }
    }
}

impl fmt::Debug for Pacing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Periodic(interval) => f.debug_tuple("Periodic").field(interval).finish(),
            Self::Poisson { mean, .. } => f
                .debug_struct("Poisson")
                .field("mean", mean)
                .finish_non_exhaustive(),
        }
    }
}
