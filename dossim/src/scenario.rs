//! The three reference topologies.
//!
//! ```text
//! Baseline:   trusted ──┐
//!             attacker ─┴─> victim
//!
//! Scrubbing:  trusted ──┐
//!             attacker ─┴─> scrubber ──> victim
//!
//! Olad:       legitimate ─┐          ┌──────────────> victim
//!             attacker ───┴─> OLAD ──┴─> scrubber ──> victim
//! ```

use anyhow::bail;
use dossim_core::{
    RunError, SimTime, Simulation, SimulationReport,
    defaults::{
        DEFAULT_HORIZON, DEFAULT_LEGITIMATE_RATE, DEFAULT_SCRUBBER_RATE, DEFAULT_SERVICE_RATE,
        DEFAULT_TRUST_RATIO,
    },
    measure::{Arrival, Rate, TrustRatio},
    traffic::{Admission, Label},
};
use std::{collections::BTreeMap, fmt, str::FromStr};

pub const VICTIM: &str = "victim";
pub const SCRUBBER: &str = "scrubber";
pub const SPLITTER: &str = "OLAD";
pub const ATTACKER: &str = "attacker";
/// the legitimate source of the [`Scenario::Baseline`] and
/// [`Scenario::Scrubbing`] topologies
pub const TRUSTED: &str = "trusted";
/// the legitimate source of the [`Scenario::Olad`] topology
pub const LEGITIMATE: &str = "legitimate";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scenario {
    /// no defense: everything goes to the victim
    Baseline,
    /// everything goes through a scrubbing node first
    Scrubbing,
    /// a splitter sends a trusted share of the legitimate traffic around
    /// the scrubbing node
    Olad,
}

/// Parameters of one scenario run.
///
/// ## Defaults
///
/// | Setting | Default |
/// |---------|---------|
/// | victim rate | [`DEFAULT_SERVICE_RATE`] |
/// | legitimate rate | [`DEFAULT_LEGITIMATE_RATE`] |
/// | attacker rate | `0` |
/// | scrubber rate | [`DEFAULT_SCRUBBER_RATE`] |
/// | trust | [`DEFAULT_TRUST_RATIO`] |
/// | horizon | [`DEFAULT_HORIZON`] |
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScenarioConfig {
    pub victim_rate: Rate,
    pub legitimate_rate: Rate,
    pub attacker_rate: Rate,
    pub scrubber_rate: Rate,
    pub trust: TrustRatio,
    pub admission: Admission,
    pub arrival: Arrival,
    pub horizon: SimTime,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            victim_rate: DEFAULT_SERVICE_RATE,
            legitimate_rate: DEFAULT_LEGITIMATE_RATE,
            attacker_rate: Rate::ZERO,
            scrubber_rate: DEFAULT_SCRUBBER_RATE,
            trust: DEFAULT_TRUST_RATIO,
            admission: Admission::default(),
            arrival: Arrival::default(),
            horizon: DEFAULT_HORIZON,
        }
    }
}

impl Scenario {
    pub const ALL: [Self; 3] = [Self::Baseline, Self::Scrubbing, Self::Olad];

    /// label of the legitimate source
    pub fn legitimate_label(self) -> &'static str {
        match self {
            Self::Baseline | Self::Scrubbing => TRUSTED,
            Self::Olad => LEGITIMATE,
        }
    }

    /// The labels the victim attributes legitimate traffic to once it went
    /// through the topology.
    pub fn delivered_labels(self) -> &'static [&'static str] {
        match self {
            Self::Baseline => &[TRUSTED],
            Self::Scrubbing => &[SCRUBBER],
            Self::Olad => &[SPLITTER, SCRUBBER],
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Baseline => "No Defense (Baseline)",
            Self::Scrubbing => "With Scrubber",
            Self::Olad => "With Scrubber + O-LAD",
        }
    }

    /// Declare the components of this topology.
    ///
    /// The victim is declared first, then the scrubber and the splitter,
    /// then the legitimate source and finally the attacker.
    pub fn simulation(self, config: &ScenarioConfig) -> Simulation {
        let mut simulation = Simulation::new();

        simulation
            .sink(VICTIM)
            .set_service_rate(config.victim_rate)
            .build();

        let entry = match self {
            Self::Baseline => VICTIM,
            Self::Scrubbing => {
                simulation
                    .scrubber(SCRUBBER)
                    .set_service_rate(config.scrubber_rate)
                    .set_forward(VICTIM)
                    .build();
                SCRUBBER
            }
            Self::Olad => {
                simulation
                    .scrubber(SCRUBBER)
                    .set_service_rate(config.scrubber_rate)
                    .set_forward(VICTIM)
                    .build();
                simulation
                    .splitter(SPLITTER)
                    .set_trust(config.trust)
                    .set_admission(config.admission)
                    .set_scrubber(SCRUBBER)
                    .set_direct(VICTIM)
                    .build();
                SPLITTER
            }
        };

        simulation
            .source(self.legitimate_label())
            .set_rate(config.legitimate_rate)
            .set_arrival(config.arrival)
            .set_destination(entry)
            .build();
        simulation
            .source(ATTACKER)
            .set_rate(config.attacker_rate)
            .set_malicious(true)
            .set_arrival(config.arrival.reseeded(1))
            .set_destination(entry)
            .build();

        simulation
    }

    pub fn run(self, config: &ScenarioConfig) -> Result<SimulationReport, RunError> {
        self.simulation(config).run(config.horizon)
    }

    /// Effective throughput at the victim, per attributed source.
    ///
    /// Empty if the report has no victim.
    pub fn victim_rates(report: &SimulationReport) -> BTreeMap<Label, f64> {
        report
            .sink(VICTIM)
            .map(|victim| victim.rates_by_source())
            .unwrap_or_default()
    }

    /// Throughput of the legitimate traffic at the victim, whichever path
    /// it took.
    pub fn legitimate_throughput(self, report: &SimulationReport) -> f64 {
        let rates = Self::victim_rates(report);
        self.delivered_labels()
            .iter()
            .filter_map(|label| rates.get(*label))
            .sum()
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Baseline => f.write_str("baseline"),
            Self::Scrubbing => f.write_str("scrubbing"),
            Self::Olad => f.write_str("olad"),
        }
    }
}

impl FromStr for Scenario {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "baseline" => Ok(Self::Baseline),
            "scrubbing" | "scrubber" => Ok(Self::Scrubbing),
            "olad" | "o-lad" => Ok(Self::Olad),
            other => bail!("Unknown scenario `{other}', expecting baseline, scrubbing or olad"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(attacker: u32) -> ScenarioConfig {
        ScenarioConfig {
            attacker_rate: Rate::from(attacker),
            ..ScenarioConfig::default()
        }
    }

    #[test]
    fn baseline_without_attack() {
        let report = Scenario::Baseline.run(&config(0)).unwrap();
        let rates = Scenario::victim_rates(&report);

        assert!((rates[TRUSTED] - 7.0).abs() < 0.01);
        assert_eq!(rates[ATTACKER], 0.0);
    }

    #[test]
    fn baseline_under_attack() {
        let report = Scenario::Baseline.run(&config(50)).unwrap();
        let legitimate = Scenario::Baseline.legitimate_throughput(&report);

        assert!(legitimate < 3.0, "legitimate throughput {legitimate}");
        // the attacker takes most of the victim
        assert!(Scenario::victim_rates(&report)[ATTACKER] > 5.0);
    }

    #[test]
    fn scrubbing_keeps_attacker_away_from_victim() {
        for attacker in [0, 50] {
            let report = Scenario::Scrubbing.run(&config(attacker)).unwrap();
            let rates = Scenario::victim_rates(&report);

            assert_eq!(rates.keys().collect::<Vec<_>>(), vec![SCRUBBER]);
            let victim = report.sink(VICTIM).unwrap();
            assert!(
                victim
                    .flows
                    .iter()
                    .all(|(key, _)| key.source != ATTACKER)
            );
        }

        let report = Scenario::Scrubbing.run(&config(0)).unwrap();
        let legitimate = Scenario::Scrubbing.legitimate_throughput(&report);
        assert!((legitimate - 7.0).abs() < 0.01, "{legitimate}");
    }

    #[test]
    fn olad_recovers_legitimate_throughput() {
        let undefended = Scenario::Baseline.run(&config(50)).unwrap();
        let undefended = Scenario::Baseline.legitimate_throughput(&undefended);

        let report = Scenario::Olad.run(&config(50)).unwrap();
        let rates = Scenario::victim_rates(&report);
        let legitimate = Scenario::Olad.legitimate_throughput(&report);

        assert!(!rates.contains_key(ATTACKER));
        assert!(legitimate > 6.0, "legitimate throughput {legitimate}");
        assert!(legitimate > undefended);

        let scrubber = report.sink(SCRUBBER).unwrap();
        assert!(scrubber.relay.unwrap().absorbed > 0);
    }

    #[test]
    fn olad_splits_without_attack() {
        let report = Scenario::Olad.run(&config(0)).unwrap();
        let rates = Scenario::victim_rates(&report);

        // 8 direct then 2 scrubbed out of every 10 packets
        assert!((rates[SPLITTER] - 5.6).abs() < 0.05, "{rates:?}");
        assert!((rates[SCRUBBER] - 1.4).abs() < 0.05, "{rates:?}");
    }

    #[test]
    fn parse() {
        for scenario in Scenario::ALL {
            assert_eq!(scenario.to_string().parse::<Scenario>().unwrap(), scenario);
        }
        assert_eq!("O-LAD".parse::<Scenario>().unwrap(), Scenario::Olad);
        assert!("firewall".parse::<Scenario>().is_err());
    }
}
