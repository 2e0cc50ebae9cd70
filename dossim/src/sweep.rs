//! Attack-intensity sweeps.
//!
//! A [`Sweep`] runs the same [`Scenario`] once per attack rate and collects,
//! for every label seen at the victim, the series of effective throughputs.

use crate::scenario::{Scenario, ScenarioConfig};
use dossim_core::{RunError, SimulationReport, measure::Rate, traffic::Label};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::info;

/// Attack rates swept when none are set: `0, 1, ..., 100`.
pub const DEFAULT_MAX_ATTACK_RATE: u32 = 100;

#[derive(Debug, Clone)]
pub struct Sweep {
    scenario: Scenario,
    config: ScenarioConfig,
    attack_rates: Vec<Rate>,
}

/// The effective throughput at the victim for every point of a sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepResults {
    pub scenario: Scenario,
    pub attack_rates: Vec<Rate>,
    /// One value per attack rate, for every label seen at the victim.
    ///
    /// A label absent from a point counts as `0.0` for that point.
    pub series: BTreeMap<Label, Vec<f64>>,
}

#[derive(Debug, Error)]
pub enum SweepError {
    #[error("Nothing to sweep: no attack rate set")]
    NoAttackRate,
    #[error("Sweep point {index} (attack rate {rate}) failed: {source}")]
    Point {
        index: usize,
        rate: Rate,
        #[source]
        source: RunError,
    },
}

impl Sweep {
    pub fn new(scenario: Scenario, config: ScenarioConfig) -> Self {
        Self {
            scenario,
            config,
            attack_rates: (0..=DEFAULT_MAX_ATTACK_RATE).map(Rate::from).collect(),
        }
    }

    pub fn set_attack_rates(mut self, rates: impl IntoIterator<Item = Rate>) -> Self {
        self.attack_rates = rates.into_iter().collect();
        self
    }

    #[inline]
    pub fn scenario(&self) -> Scenario {
        self.scenario
    }

    #[inline]
    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    #[inline]
    pub fn attack_rates(&self) -> &[Rate] {
        &self.attack_rates
    }

    pub fn run(&self) -> Result<SweepResults, SweepError> {
        self.run_with(|_, _| {})
    }

    /// Run every point in order, calling `on_point` with the index and the
    /// report of each point as soon as it completes.
    pub fn run_with<F>(&self, mut on_point: F) -> Result<SweepResults, SweepError>
    where
        F: FnMut(usize, &SimulationReport),
    {
        if self.attack_rates.is_empty() {
            return Err(SweepError::NoAttackRate);
        }

        let mut series: BTreeMap<Label, Vec<f64>> = BTreeMap::new();

        for (index, rate) in self.attack_rates.iter().copied().enumerate() {
            info!(
                scenario = %self.scenario,
                victim = %self.config.victim_rate,
                legitimate = %self.config.legitimate_rate,
                scrubber = %self.config.scrubber_rate,
                trust = %self.config.trust,
                attacker = %rate,
                "running simulation"
            );

            let config = ScenarioConfig {
                attacker_rate: rate,
                ..self.config
            };
            let report = self
                .scenario
                .run(&config)
                .map_err(|source| SweepError::Point {
                    index,
                    rate,
                    source,
                })?;

            for (label, value) in Scenario::victim_rates(&report) {
                let values = series.entry(label).or_default();
                // first seen at this point
                values.resize(index, 0.0);
                values.push(value);
            }
            for values in series.values_mut() {
                values.resize(index + 1, 0.0);
            }

            on_point(index, &report);
        }

        Ok(SweepResults {
            scenario: self.scenario,
            attack_rates: self.attack_rates.clone(),
            series,
        })
    }
}

impl SweepResults {
    /// number of points
    #[inline]
    pub fn len(&self) -> usize {
        self.attack_rates.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.attack_rates.is_empty()
    }

    pub fn series(&self, label: &str) -> Option<&[f64]> {
        self.series.get(label).map(Vec::as_slice)
    }

    pub fn labels(&self) -> impl Iterator<Item = &Label> {
        self.series.keys()
    }

    /// Point-wise sum of the series of `labels`. Unknown labels add nothing.
    pub fn total(&self, labels: &[&str]) -> Vec<f64> {
        let mut total = vec![0.0; self.len()];
        for values in labels.iter().filter_map(|label| self.series(label)) {
            for (sum, value) in total.iter_mut().zip(values) {
                *sum += value;
            }
        }
        total
    }

    /// Throughput of the legitimate traffic at the victim, whichever path
    /// it took.
    pub fn legitimate(&self) -> Vec<f64> {
        self.total(self.scenario.delivered_labels())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::{ATTACKER, SCRUBBER, SPLITTER, TRUSTED};

    fn rates(values: &[u32]) -> Vec<Rate> {
        values.iter().copied().map(Rate::from).collect()
    }

    #[test]
    fn default_attack_rates() {
        let sweep = Sweep::new(Scenario::Baseline, ScenarioConfig::default());
        assert_eq!(sweep.attack_rates().len(), 101);
        assert_eq!(sweep.attack_rates()[100], Rate::from(100));
    }

    #[test]
    fn baseline_series() {
        let results = Sweep::new(Scenario::Baseline, ScenarioConfig::default())
            .set_attack_rates(rates(&[0, 50]))
            .run()
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(
            results.labels().collect::<Vec<_>>(),
            vec![ATTACKER, TRUSTED]
        );

        let trusted = results.series(TRUSTED).unwrap();
        assert!((trusted[0] - 7.0).abs() < 0.01);
        assert!(trusted[1] < 3.0);

        let attacker = results.series(ATTACKER).unwrap();
        assert_eq!(attacker[0], 0.0);
        assert!(attacker[1] > 5.0);

        assert_eq!(results.legitimate(), trusted);
    }

    #[test]
    fn olad_sum() {
        let results = Sweep::new(Scenario::Olad, ScenarioConfig::default())
            .set_attack_rates(rates(&[0, 50]))
            .run()
            .unwrap();

        let sum = results.total(&[SPLITTER, SCRUBBER]);
        assert_eq!(sum, results.legitimate());
        assert!(sum.iter().all(|value| *value > 6.0), "{sum:?}");
        assert!(results.series(ATTACKER).is_none());
    }

    #[test]
    fn every_series_has_one_value_per_point() {
        let mut seen = Vec::new();
        let results = Sweep::new(Scenario::Scrubbing, ScenarioConfig::default())
            .set_attack_rates(rates(&[0, 10, 20]))
            .run_with(|index, report| {
                seen.push((index, report.summary.now.as_secs()));
            })
            .unwrap();

        assert_eq!(seen, vec![(0, 80.0), (1, 80.0), (2, 80.0)]);
        for label in results.labels() {
            assert_eq!(results.series(label.as_str()).unwrap().len(), 3);
        }
    }

    #[test]
    fn empty_sweep() {
        let error = Sweep::new(Scenario::Baseline, ScenarioConfig::default())
            .set_attack_rates([])
            .run()
            .unwrap_err();
        assert!(matches!(error, SweepError::NoAttackRate));
    }

    #[test]
    fn failing_point() {
        let config = ScenarioConfig {
            victim_rate: Rate::ZERO,
            ..ScenarioConfig::default()
        };
        let error = Sweep::new(Scenario::Baseline, config)
            .set_attack_rates(rates(&[5]))
            .run()
            .unwrap_err();
        assert!(
            matches!(error, SweepError::Point { index: 0, .. }),
            "got {error:?}"
        );
    }
}
