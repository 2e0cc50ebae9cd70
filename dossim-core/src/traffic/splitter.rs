use super::{Label, Packet};
use crate::{
    measure::{ADMISSION_CYCLE, TrustRatio, unit_sample},
    scheduler::{Address, Router, SimError},
    time::SimTime,
};
use anyhow::{anyhow, bail};
use rand_chacha::ChaChaRng;
use rand_core::SeedableRng as _;
use std::{fmt, str::FromStr};
use tracing::trace;

/// How a [`Splitter`] picks which benign packets bypass the scrubber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Admission {
    /// Deterministic cycle of [`ADMISSION_CYCLE`] benign packets: the first
    /// [`TrustRatio::admitted_per_cycle`] of every cycle go direct.
    #[default]
    RoundRobin,
    /// each benign packet goes direct with probability `trust`
    Sampled { seed: u64 },
}

/// Partially trusting traffic splitter.
///
/// The splitter has no queue and no process: it decides, inside the step
/// of whichever process sent the packet, where the packet goes.
///
/// * malicious packets always go to the scrubber;
/// * benign packets admitted by the [`Admission`] policy are re-attributed
///   to the splitter and go to the direct destination;
/// * the other benign packets go to the scrubber, untouched.
///
/// ```
/// use dossim_core::{
///     scheduler::{Address, Router, Scheduler},
///     traffic::{Component, Label, Packet, PacketId, PacketSize, Splitter},
///     SimTime,
/// };
///
/// let mut scheduler = Scheduler::<Component>::new();
/// let scrubber = Address::Mailbox(scheduler.add_mailbox());
/// let victim = Address::Mailbox(scheduler.add_mailbox());
///
/// let mut splitter = Splitter::new(Label::from("OLAD"), "40%".parse()?);
/// splitter.set_scrubber(scrubber);
/// splitter.set_direct(victim);
///
/// let mut direct = 0;
/// for sequence in 0..10 {
///     let packet = Packet::new(
///         PacketId::new(sequence),
///         PacketSize::Unit,
///         Label::from("legitimate"),
///         false,
///         Label::from("victim"),
///         SimTime::ZERO,
///     );
///     let (to, packet) = splitter.route(SimTime::ZERO, packet)?;
///     if to == victim {
///         assert_eq!(packet.attribution(), "OLAD");
///         direct += 1;
///     }
/// }
/// assert_eq!(direct, 4);
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Debug)]
pub struct Splitter {
    label: Label,
    trust: TrustRatio,
    admission: Admission,
    sampler: Option<Sampler>,

    scrubber: Option<Address>,
    direct: Option<Address>,

    /// benign packets seen so far
    received: u64,
    admitted: u64,
    scrubbed: u64,
    malicious: u64,
}

struct Sampler(ChaChaRng);

impl Splitter {
    pub fn new(label: Label, trust: TrustRatio) -> Self {
        Self {
            label,
            trust,
            admission: Admission::RoundRobin,
            sampler: None,
            scrubber: None,
            direct: None,
            received: 0,
            admitted: 0,
            scrubbed: 0,
            malicious: 0,
        }
    }

    pub fn set_admission(&mut self, admission: Admission) {
        self.admission = admission;
        self.sampler = match admission {
            Admission::RoundRobin => None,
            Admission::Sampled { seed } => Some(Sampler(ChaChaRng::seed_from_u64(seed))),
        };
    }

    pub fn set_scrubber(&mut self, address: Address) {
        self.scrubber = Some(address);
    }

    pub fn set_direct(&mut self, address: Address) {
        self.direct = Some(address);
    }

    #[inline]
    pub fn label(&self) -> &Label {
        &self.label
    }

    #[inline]
    pub fn trust(&self) -> TrustRatio {
        self.trust
    }

    #[inline]
    pub fn admission(&self) -> Admission {
        self.admission
    }

    /// benign packets received
    #[inline]
    pub fn received(&self) -> u64 {
        self.received
    }

    /// benign packets sent direct
    #[inline]
    pub fn admitted(&self) -> u64 {
        self.admitted
    }

    /// benign packets sent to the scrubber
    #[inline]
    pub fn scrubbed(&self) -> u64 {
        self.scrubbed
    }

    /// malicious packets sent to the scrubber
    #[inline]
    pub fn malicious(&self) -> u64 {
        self.malicious
    }

    fn admit(&mut self) -> bool {
        match &mut self.sampler {
            None => self.received % ADMISSION_CYCLE < self.trust.admitted_per_cycle(),
            Some(Sampler(rng)) => unit_sample(rng) < self.trust.value(),
        }
    }

    fn destination(&self, address: Option<Address>, which: &str) -> Result<Address, SimError> {
        address.ok_or_else(|| SimError::DestinationUnset {
            component: format!("{} ({which})", self.label),
        })
    }
}

impl Router for Splitter {
    type Message = Packet;

    fn route(&mut self, now: SimTime, mut packet: Packet) -> Result<(Address, Packet), SimError> {
        if packet.origin().is_malicious() {
            let scrubber = self.destination(self.scrubber, "scrubber")?;
            self.malicious += 1;
            trace!(splitter = %self.label, id = %packet.id(), from = %packet.attribution(), %now, "malicious, scrubbing");
            return Ok((scrubber, packet));
        }

        let admit = self.admit();
        self.received += 1;

        if admit {
            let direct = self.destination(self.direct, "direct")?;
            self.admitted += 1;
            trace!(splitter = %self.label, id = %packet.id(), from = %packet.attribution(), %now, "admitted");
            packet.reattribute(self.label.clone());
            Ok((direct, packet))
        } else {
            let scrubber = self.destination(self.scrubber, "scrubber")?;
            self.scrubbed += 1;
            trace!(splitter = %self.label, id = %packet.id(), from = %packet.attribution(), %now, "scrubbing");
            Ok((scrubber, packet))
        }
    }
}

impl fmt::Debug for Sampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Sampler").finish_non_exhaustive()
    }
}

impl fmt::Display for Admission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RoundRobin => f.write_str("round-robin"),
            Self::Sampled { seed } => write!(f, "sampled:{seed}"),
        }
    }
}

impl FromStr for Admission {
    type Err = anyhow::Error;

    /// Parses `"round-robin"`, `"sampled"` (seed `0`) or `"sampled:<seed>"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.split_once(':') {
            None if s == "round-robin" => Ok(Self::RoundRobin),
            None if s == "sampled" => Ok(Self::Sampled { seed: 0 }),
            Some(("sampled", seed)) => {
                let seed = seed
                    .trim()
                    .parse()
                    .map_err(|error| anyhow!("Invalid sampling seed `{seed}': {error}"))?;
                Ok(Self::Sampled { seed })
            }
            _ => bail!("Unknown admission policy `{s}', expecting `round-robin' or `sampled[:seed]'"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{scheduler::MailboxId, traffic::PacketId, traffic::PacketSize};

    const SCRUBBER: Address = Address::Mailbox(MailboxId::new(0));
    const DIRECT: Address = Address::Mailbox(MailboxId::new(1));

    fn splitter(trust: f64) -> Splitter {
        let mut splitter = Splitter::new(Label::from("OLAD"), TrustRatio::new(trust).unwrap());
        splitter.set_scrubber(SCRUBBER);
        splitter.set_direct(DIRECT);
        splitter
    }

    fn packet(sequence: u64, malicious: bool) -> Packet {
        let origin = if malicious { "attacker" } else { "legitimate" };
        Packet::new(
            PacketId::new(sequence),
            PacketSize::Unit,
            Label::from(origin),
            malicious,
            Label::from("victim"),
            SimTime::ZERO,
        )
    }

    fn pattern(splitter: &mut Splitter, count: u64) -> Vec<bool> {
        (0..count)
            .map(|i| {
                let (to, _) = splitter.route(SimTime::ZERO, packet(i, false)).unwrap();
                to == DIRECT
            })
            .collect()
    }

    #[test]
    fn round_robin_pattern() {
        let mut splitter = splitter(0.4);

        let expected: Vec<bool> = (0..20).map(|i| i % 10 < 4).collect();
        assert_eq!(pattern(&mut splitter, 20), expected);

        assert_eq!(splitter.received(), 20);
        assert_eq!(splitter.admitted(), 8);
        assert_eq!(splitter.scrubbed(), 12);
    }

    #[test]
    fn admitted_packets_are_reattributed() {
        let mut splitter = splitter(0.5);

        let (to, routed) = splitter.route(SimTime::ZERO, packet(0, false)).unwrap();
        assert_eq!(to, DIRECT);
        assert_eq!(routed.attribution(), "OLAD");
        assert_eq!(routed.origin().label(), "legitimate");

        for i in 1..5 {
            splitter.route(SimTime::ZERO, packet(i, false)).unwrap();
        }
        let (to, routed) = splitter.route(SimTime::ZERO, packet(5, false)).unwrap();
        assert_eq!(to, SCRUBBER);
        assert_eq!(routed.attribution(), "legitimate");
    }

    #[test]
    fn malicious_always_scrubbed_and_not_counted() {
        let mut splitter = splitter(1.0);

        for i in 0..5 {
            let (to, routed) = splitter.route(SimTime::ZERO, packet(i, true)).unwrap();
            assert_eq!(to, SCRUBBER);
            assert_eq!(routed.attribution(), "attacker");
        }
        assert_eq!(splitter.malicious(), 5);
        assert_eq!(splitter.received(), 0);

        // the cycle starts with the first benign packet
        assert_eq!(pattern(&mut splitter, 10), vec![true; 10]);
    }

    #[test]
    fn extreme_trust() {
        assert_eq!(pattern(&mut splitter(0.0), 10), vec![false; 10]);
        assert_eq!(pattern(&mut splitter(1.0), 10), vec![true; 10]);
        // 0.25 rounds to 2 per cycle, 0.35 to 4
        assert_eq!(pattern(&mut splitter(0.25), 10).iter().filter(|d| **d).count(), 2);
        assert_eq!(pattern(&mut splitter(0.35), 10).iter().filter(|d| **d).count(), 4);
    }

    #[test]
    fn sampled_admission_follows_trust() {
        let mut sampled = splitter(0.8);
        sampled.set_admission(Admission::Sampled { seed: 7 });

        let direct = pattern(&mut sampled, 10_000).iter().filter(|d| **d).count();
        assert!((7_700..8_300).contains(&direct), "admitted {direct}");

        let draw = || {
            let mut sampled = splitter(0.8);
            sampled.set_admission(Admission::Sampled { seed: 11 });
            pattern(&mut sampled, 100)
        };
        assert_eq!(draw(), draw());
    }

    #[test]
    fn unset_destination() {
        let mut splitter = Splitter::new(Label::from("OLAD"), TrustRatio::FULL);
        let error = splitter.route(SimTime::ZERO, packet(0, false)).unwrap_err();
        assert!(matches!(error, SimError::DestinationUnset { .. }));
        assert_eq!(error.to_string(), "OLAD (direct) has no destination set");
    }

    #[test]
    fn parse_admission() {
        assert_eq!("round-robin".parse::<Admission>().unwrap(), Admission::RoundRobin);
        assert_eq!(
            "sampled:3".parse::<Admission>().unwrap(),
            Admission::Sampled { seed: 3 }
        );
        assert_eq!(Admission::Sampled { seed: 3 }.to_string(), "sampled:3");
        assert!("random".parse::<Admission>().is_err());
    }
}
