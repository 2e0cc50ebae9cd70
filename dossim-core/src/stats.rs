//! Per-flow timing statistics.
//!
//! Every analysing sink keeps a [`FlowTable`]: one [`FlowRecord`] per
//! [`FlowKey`], created on the first serviced packet of that flow. The
//! effective throughput of a flow is derived from the spacing of its
//! completions, not from a count of packets.

use crate::{time::SimTime, traffic::Label};
use std::{collections::BTreeMap, fmt};

/// Identifies a flow at the point of analysis: the attribution of the
/// packet and the destination configured on its emitting source.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FlowKey {
    pub source: Label,
    pub destination: Label,
}

/// Timing samples of one flow, in completion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowRecord {
    /// completion - creation, one sample per serviced packet
    wait_times: Vec<f64>,
    /// time between two consecutive completions
    inter_arrivals: Vec<f64>,
    last_arrival: Option<SimTime>,
}

/// All the flows seen by one sink.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowTable {
    flows: BTreeMap<FlowKey, FlowRecord>,
}

impl FlowKey {
    pub fn new(source: impl Into<Label>, destination: impl Into<Label>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }
}

impl FlowRecord {
    /// record a packet created at `created` and completed at `completed`.
    pub fn record(&mut self, created: SimTime, completed: SimTime) {
        self.wait_times.push(completed.since(created));
        if let Some(last) = self.last_arrival {
            self.inter_arrivals.push(completed.since(last));
        }
        self.last_arrival = Some(completed);
    }

    /// number of packets recorded
    #[inline]
    pub fn arrivals(&self) -> usize {
        self.wait_times.len()
    }

    #[inline]
    pub fn wait_times(&self) -> &[f64] {
        &self.wait_times
    }

    /// Always one sample fewer than [`arrivals`](Self::arrivals), and none
    /// at all for a single arrival.
    #[inline]
    pub fn inter_arrivals(&self) -> &[f64] {
        &self.inter_arrivals
    }

    #[inline]
    pub fn last_arrival(&self) -> Option<SimTime> {
        self.last_arrival
    }

    pub fn mean_wait(&self) -> Option<f64> {
        mean(&self.wait_times)
    }

    pub fn mean_inter_arrival(&self) -> Option<f64> {
        mean(&self.inter_arrivals)
    }

    /// Effective throughput of the flow, in packets per second, rounded to
    /// 4 decimal places.
    ///
    /// This is `1 / mean(inter_arrivals)`; `0.0` when there is no
    /// inter-arrival sample (fewer than two arrivals) or when every arrival
    /// happened at the same instant.
    ///
    /// ```
    /// # use dossim_core::{stats::FlowRecord, SimTime};
    /// let mut record = FlowRecord::default();
    /// assert_eq!(record.effective_rate(), 0.0);
    ///
    /// for t in [0.5, 1.0, 1.5, 2.0] {
    ///     record.record(SimTime::ZERO, SimTime::new(t).unwrap());
    /// }
    /// assert_eq!(record.effective_rate(), 2.0);
    /// ```
    pub fn effective_rate(&self) -> f64 {
        match self.mean_inter_arrival() {
            Some(mean) if mean > 0.0 => round4(1.0 / mean),
            _ => 0.0,
        }
    }
}

impl FlowTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a serviced packet of the flow `key`, creating the flow record
    /// on its first packet.
    pub fn record(&mut self, key: FlowKey, created: SimTime, completed: SimTime) {
        self.flows
            .entry(key)
            .or_default()
            .record(created, completed);
    }

    pub fn get(&self, key: &FlowKey) -> Option<&FlowRecord> {
        self.flows.get(key)
    }

    /// flows in key order
    pub fn iter(&self) -> impl Iterator<Item = (&FlowKey, &FlowRecord)> {
        self.flows.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.flows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    /// effective throughput of every flow
    pub fn effective_rates(&self) -> BTreeMap<FlowKey, f64> {
        self.flows
            .iter()
            .map(|(key, record)| (key.clone(), record.effective_rate()))
            .collect()
    }
}

impl<'a> IntoIterator for &'a FlowTable {
    type Item = (&'a FlowKey, &'a FlowRecord);
    type IntoIter = std::collections::btree_map::Iter<'a, FlowKey, FlowRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.flows.iter()
    }
}

impl fmt::Display for FlowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.source, self.destination)
    }
}

fn mean(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        None
    } else {
        Some(samples.iter().sum::<f64>() / samples.len() as f64)
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round_ties_even() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(secs: f64) -> SimTime {
        SimTime::new(secs).unwrap()
    }

    #[test]
    fn inter_arrivals_are_one_fewer_than_arrivals() {
        let mut record = FlowRecord::default();
        assert_eq!(record.arrivals(), 0);
        assert!(record.inter_arrivals().is_empty());

        record.record(t(0.0), t(0.1));
        assert_eq!(record.arrivals(), 1);
        assert!(record.inter_arrivals().is_empty());
        assert_eq!(record.effective_rate(), 0.0);

        for i in 2..=10 {
            record.record(t(0.0), t(0.1 * i as f64));
            assert_eq!(record.inter_arrivals().len(), record.arrivals() - 1);
        }
        assert_eq!(record.last_arrival(), Some(t(1.0)));
    }

    #[test]
    fn effective_rate_is_rounded() {
        let mut record = FlowRecord::default();
        // three arrivals, 0.3s apart
        for secs in [0.3, 0.6, 0.9] {
            record.record(t(0.0), t(secs));
        }
        assert_eq!(record.effective_rate(), 3.3333);
    }

    #[test]
    fn simultaneous_arrivals_have_no_rate() {
        let mut record = FlowRecord::default();
        record.record(t(0.0), t(1.0));
        record.record(t(0.0), t(1.0));

        assert_eq!(record.inter_arrivals(), &[0.0]);
        assert_eq!(record.effective_rate(), 0.0);
    }

    #[test]
    fn wait_times() {
        let mut record = FlowRecord::default();
        record.record(t(1.0), t(1.5));
        record.record(t(2.0), t(3.0));

        assert_eq!(record.wait_times(), &[0.5, 1.0]);
        assert_eq!(record.mean_wait(), Some(0.75));
        assert_eq!(record.mean_inter_arrival(), Some(1.5));
    }

    #[test]
    fn table_creates_flows_lazily() {
        let mut table = FlowTable::new();
        assert!(table.is_empty());

        let trusted = FlowKey::new("trusted", "victim");
        let attacker = FlowKey::new("attacker", "victim");

        table.record(trusted.clone(), t(0.0), t(0.1));
        table.record(trusted.clone(), t(0.0), t(0.2));
        table.record(attacker.clone(), t(0.0), t(0.3));

        assert_eq!(table.len(), 2);
        assert_eq!(table.get(&trusted).unwrap().arrivals(), 2);

        let rates = table.effective_rates();
        assert_eq!(rates[&trusted], 10.0);
        assert_eq!(rates[&attacker], 0.0);

        // ordered by key
        let keys: Vec<_> = table.iter().map(|(key, _)| key.to_string()).collect();
        assert_eq!(keys, vec!["attacker->victim", "trusted->victim"]);
    }
}
