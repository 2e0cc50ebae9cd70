//! What a [`Simulation`] run leaves behind.
//!
//! [`Simulation`]: crate::Simulation

use crate::{
    measure::{Arrival, Rate, TrustRatio},
    scheduler::RunSummary,
    stats::{FlowKey, FlowTable},
    traffic::{Admission, Label},
};
use std::collections::BTreeMap;

/// Statistics of one [`Sink`] or [`Scrubber`] at the end of a run.
///
/// [`Sink`]: crate::traffic::Sink
/// [`Scrubber`]: crate::traffic::Scrubber
#[derive(Debug, Clone)]
pub struct SinkReport {
    pub label: Label,
    pub service_rate: Rate,
    /// The flows analysed by this sink. Empty if analysis was disabled.
    pub flows: FlowTable,
    /// Packets delivered to the sink's mailbox.
    pub received: u64,
    /// Packets that completed their service.
    pub serviced: u64,
    /// Virtual seconds the server spent servicing unit packets.
    pub busy_time: f64,
    /// Packets still waiting in the mailbox when the run stopped.
    pub backlog: usize,
    /// Largest number of packets that waited in the mailbox at once.
    pub peak_backlog: usize,
    /// Set for a scrubber only.
    pub relay: Option<RelayReport>,
}

/// What a [`Scrubber`] did with the packets it serviced.
///
/// [`Scrubber`]: crate::traffic::Scrubber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayReport {
    pub forwarded: u64,
    pub absorbed: u64,
}

#[derive(Debug, Clone)]
pub struct SourceReport {
    pub label: Label,
    pub rate: Rate,
    pub malicious: bool,
    pub arrival: Arrival,
    pub emitted: u64,
}

#[derive(Debug, Clone)]
pub struct SplitterReport {
    pub label: Label,
    pub trust: TrustRatio,
    pub admission: Admission,
    /// Benign packets received.
    pub received: u64,
    /// Benign packets sent to the direct destination.
    pub admitted: u64,
    /// Benign packets sent to the scrubber.
    pub scrubbed: u64,
    /// Malicious packets sent to the scrubber.
    pub malicious: u64,
}

/// The outcome of one [`Simulation::run`].
///
/// [`Simulation::run`]: crate::Simulation::run
#[derive(Debug, Clone)]
pub struct SimulationReport {
    pub summary: RunSummary,
    pub sinks: BTreeMap<Label, SinkReport>,
    pub sources: BTreeMap<Label, SourceReport>,
    pub splitters: BTreeMap<Label, SplitterReport>,
}

impl SinkReport {
    /// fraction of `elapsed` virtual seconds the server was busy
    pub fn utilization(&self, elapsed: f64) -> f64 {
        if elapsed > 0.0 {
            (self.busy_time / elapsed).min(1.0)
        } else {
            0.0
        }
    }

    /// Effective throughput of every analysed flow.
    pub fn effective_rates(&self) -> BTreeMap<FlowKey, f64> {
        self.flows.effective_rates()
    }

    /// Effective throughput per attributed source.
    ///
    /// Flows of the same source toward different destinations are summed.
    pub fn rates_by_source(&self) -> BTreeMap<Label, f64> {
        let mut rates = BTreeMap::new();
        for (key, record) in &self.flows {
            *rates.entry(key.source.clone()).or_insert(0.0) += record.effective_rate();
        }
        rates
    }
}

impl SimulationReport {
    pub fn sink(&self, label: &str) -> Option<&SinkReport> {
        self.sinks.get(label)
    }

    pub fn source(&self, label: &str) -> Option<&SourceReport> {
        self.sources.get(label)
    }

    pub fn splitter(&self, label: &str) -> Option<&SplitterReport> {
        self.splitters.get(label)
    }

    /// Effective throughput of every flow analysed by the sink `sink`.
    ///
    /// `None` if there is no sink or scrubber with that label.
    pub fn effective_rates(&self, sink: &str) -> Option<BTreeMap<FlowKey, f64>> {
        self.sink(sink).map(SinkReport::effective_rates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::SimTime;

    fn t(secs: f64) -> SimTime {
        SimTime::new(secs).unwrap()
    }

    fn report() -> SinkReport {
        let mut flows = FlowTable::new();
        for i in 1..=5 {
            flows.record(FlowKey::new("scrubber", "scrubber"), t(0.0), t(i as f64));
            flows.record(FlowKey::new("OLAD", "victim"), t(0.0), t(0.5 * i as f64));
        }
        flows.record(FlowKey::new("OLAD", "scrubber"), t(0.0), t(1.0));
        SinkReport {
            label: Label::from("victim"),
            service_rate: Rate::from(10),
            flows,
            received: 11,
            serviced: 11,
            busy_time: 1.1,
            backlog: 0,
            peak_backlog: 2,
            relay: None,
        }
    }

    #[test]
    fn rates_by_source() {
        let rates = report().rates_by_source();
        assert_eq!(rates.len(), 2);
        // the single OLAD->scrubber arrival adds nothing
        assert_eq!(rates["OLAD"], 2.0);
        assert_eq!(rates["scrubber"], 1.0);
    }

    #[test]
    fn utilization() {
        let report = report();
        assert!((report.utilization(11.0) - 0.1).abs() < 1e-12);
        assert_eq!(report.utilization(0.0), 0.0);
        assert_eq!(report.utilization(0.5), 1.0);
    }
}
