use crate::{
    measure::{Rate, TrustRatio},
    time::SimTime,
};

/// Default service rate of a [`Sink`]
///
/// This is the capacity of the victim in the reference scenarios.
///
/// ```
/// # use dossim_core::defaults::*;
/// assert_eq!(DEFAULT_SERVICE_RATE.to_string(), "10/s");
/// ```
///
/// [`Sink`]: crate::traffic::Sink
pub const DEFAULT_SERVICE_RATE: Rate = Rate(10.0);

/// Default emission rate of a [`Source`]
///
/// ```
/// # use dossim_core::defaults::*;
/// assert_eq!(DEFAULT_LEGITIMATE_RATE.to_string(), "7/s");
/// ```
///
/// [`Source`]: crate::traffic::Source
pub const DEFAULT_LEGITIMATE_RATE: Rate = Rate(7.0);

/// Default service rate of a [`Scrubber`]
///
/// A scrubbing node is provisioned with a lot more capacity than the
/// victim it protects.
///
/// ```
/// # use dossim_core::defaults::*;
/// assert_eq!(DEFAULT_SCRUBBER_RATE.to_string(), "40/s");
/// ```
///
/// [`Scrubber`]: crate::traffic::Scrubber
pub const DEFAULT_SCRUBBER_RATE: Rate = Rate(40.0);

/// Default trust ratio of a [`Splitter`]
///
/// ```
/// # use dossim_core::defaults::*;
/// assert_eq!(DEFAULT_TRUST_RATIO.to_string(), "80%");
/// assert_eq!(DEFAULT_TRUST_RATIO.admitted_per_cycle(), 8);
/// ```
///
/// [`Splitter`]: crate::traffic::Splitter
pub const DEFAULT_TRUST_RATIO: TrustRatio = TrustRatio(0.8);

/// Default virtual time a simulation runs for
///
/// ```
/// # use dossim_core::defaults::*;
/// assert_eq!(DEFAULT_HORIZON.to_string(), "80s");
/// assert_eq!(DEFAULT_HORIZON, "1m 20s".parse().unwrap());
/// ```
pub const DEFAULT_HORIZON: SimTime = SimTime(80.0);
