use crate::{
    defaults::{
        DEFAULT_LEGITIMATE_RATE, DEFAULT_SCRUBBER_RATE, DEFAULT_SERVICE_RATE, DEFAULT_TRUST_RATIO,
    },
    measure::{Arrival, Rate, TrustRatio},
    report::{RelayReport, SimulationReport, SinkReport, SourceReport, SplitterReport},
    scheduler::{Address, Mailbox, MailboxId, Parts, RouterId, RunSummary, Scheduler, SimError},
    time::SimTime,
    traffic::{Admission, Component, Label, Packet, Scrubber, Sink, Source, Splitter},
};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::debug;

/// One experiment: a set of labelled traffic components and how they are
/// wired together.
///
/// Components are declared with the builders returned by [`sink`],
/// [`scrubber`], [`splitter`] and [`source`], and refer to each other by
/// label. Labels are only resolved by [`run`], so components can be
/// declared in any order. Processes are started in declaration order, which
/// decides who goes first when several wake-ups fall on the same instant.
///
/// ```
/// use dossim_core::{measure::Rate, Simulation};
///
/// let mut simulation = Simulation::new();
/// simulation.sink("victim").set_service_rate(Rate::from(10)).build();
/// simulation
///     .source("trusted")
///     .set_rate(Rate::from(7))
///     .set_destination("victim")
///     .build();
///
/// let report = simulation.run("80s".parse()?)?;
///
/// let rates = report.sink("victim").unwrap().rates_by_source();
/// assert_eq!(rates["trusted"], 7.0);
/// # Ok::<(), anyhow::Error>(())
/// ```
///
/// [`sink`]: Simulation::sink
/// [`scrubber`]: Simulation::scrubber
/// [`splitter`]: Simulation::splitter
/// [`source`]: Simulation::source
/// [`run`]: Simulation::run
#[derive(Debug, Clone, Default)]
pub struct Simulation {
    components: Vec<Declared>,
}

#[derive(Debug, Clone)]
enum Declared {
    Source(SourceConfig),
    Sink(SinkConfig),
    Scrubber(SinkConfig, Option<Label>),
    Splitter(SplitterConfig),
}

#[derive(Debug, Clone)]
struct SourceConfig {
    label: Label,
    rate: Rate,
    malicious: bool,
    arrival: Arrival,
    destination: Option<Label>,
}

#[derive(Debug, Clone)]
struct SinkConfig {
    label: Label,
    service_rate: Rate,
    analyze: bool,
}

#[derive(Debug, Clone)]
struct SplitterConfig {
    label: Label,
    trust: TrustRatio,
    admission: Admission,
    scrubber: Option<Label>,
    direct: Option<Label>,
}

/// Where a declared component lives in the scheduler.
#[derive(Clone, Copy)]
enum Wiring {
    Process,
    Mailbox(MailboxId),
    Router(RouterId),
}

/// Builder for a [`Source`].
///
/// ## Defaults
///
/// | Setting | Default |
/// |---------|---------|
/// | rate | [`DEFAULT_LEGITIMATE_RATE`] |
/// | malicious | `false` |
/// | arrival | [`Arrival::Periodic`] |
/// | destination | none, the first emission fails |
pub struct SourceBuilder<'a> {
    config: SourceConfig,
    simulation: &'a mut Simulation,
}

/// Builder for a [`Sink`].
///
/// ## Defaults
///
/// | Setting | Default |
/// |---------|---------|
/// | service rate | [`DEFAULT_SERVICE_RATE`] |
/// | analyze | `true` |
pub struct SinkBuilder<'a> {
    config: SinkConfig,
    simulation: &'a mut Simulation,
}

/// Builder for a [`Scrubber`].
///
/// ## Defaults
///
/// | Setting | Default |
/// |---------|---------|
/// | service rate | [`DEFAULT_SCRUBBER_RATE`] |
/// | analyze | `true` |
/// | forward | none, the first benign packet fails |
pub struct ScrubberBuilder<'a> {
    config: SinkConfig,
    forward: Option<Label>,
    simulation: &'a mut Simulation,
}

/// Builder for a [`Splitter`].
///
/// ## Defaults
///
/// | Setting | Default |
/// |---------|---------|
/// | trust | [`DEFAULT_TRUST_RATIO`] |
/// | admission | [`Admission::RoundRobin`] |
/// | scrubber, direct | none, the first packet routed there fails |
pub struct SplitterBuilder<'a> {
    config: SplitterConfig,
    simulation: &'a mut Simulation,
}

/// Error returned when the declared components cannot be wired together.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Component label `{label}' is declared more than once")]
    DuplicateLabel { label: Label },
    #[error("Component ({label}) Not Found, referenced by {referenced_by}")]
    UnknownComponent { label: Label, referenced_by: Label },
    /// Sources have no mailbox: nothing can be sent to them.
    #[error("Component ({label}) cannot receive packets, referenced by {referenced_by}")]
    NotAddressable { label: Label, referenced_by: Label },
    #[error("{component} needs a positive service rate")]
    ZeroServiceRate { component: Label },
}

/// Error returned by [`Simulation::run`].
#[derive(Debug, Error)]
pub enum RunError {
    #[error("{0}")]
    Build(#[from] BuildError),
    #[error("{0}")]
    Sim(#[from] SimError),
}

impl SourceBuilder<'_> {
    pub fn set_rate(mut self, rate: Rate) -> Self {
        self.config.rate = rate;
        self
    }

    /// mark every packet of this source as malicious
    pub fn set_malicious(mut self, malicious: bool) -> Self {
        self.config.malicious = malicious;
        self
    }

    pub fn set_arrival(mut self, arrival: Arrival) -> Self {
        self.config.arrival = arrival;
        self
    }

    /// Label of the sink, scrubber or splitter the packets are sent to.
    ///
    /// The label is also the destination half of the flow key of every
    /// packet, wherever the packet is eventually serviced.
    pub fn set_destination(mut self, destination: impl Into<Label>) -> Self {
        self.config.destination = Some(destination.into());
        self
    }

    pub fn build(self) -> Label {
        let Self { config, simulation } = self;
        let label = config.label.clone();
        simulation.components.push(Declared::Source(config));
        label
    }
}

impl SinkBuilder<'_> {
    pub fn set_service_rate(mut self, service_rate: Rate) -> Self {
        self.config.service_rate = service_rate;
        self
    }

    /// record the flow statistics of every completed packet
    pub fn set_analyze(mut self, analyze: bool) -> Self {
        self.config.analyze = analyze;
        self
    }

    pub fn build(self) -> Label {
        let Self { config, simulation } = self;
        let label = config.label.clone();
        simulation.components.push(Declared::Sink(config));
        label
    }
}

impl ScrubberBuilder<'_> {
    pub fn set_service_rate(mut self, service_rate: Rate) -> Self {
        self.config.service_rate = service_rate;
        self
    }

    pub fn set_analyze(mut self, analyze: bool) -> Self {
        self.config.analyze = analyze;
        self
    }

    /// label of the component benign traffic is relayed to
    pub fn set_forward(mut self, forward: impl Into<Label>) -> Self {
        self.forward = Some(forward.into());
        self
    }

    pub fn build(self) -> Label {
        let Self {
            config,
            forward,
            simulation,
        } = self;
        let label = config.label.clone();
        simulation.components.push(Declared::Scrubber(config, forward));
        label
    }
}

impl SplitterBuilder<'_> {
    pub fn set_trust(mut self, trust: TrustRatio) -> Self {
        self.config.trust = trust;
        self
    }

    pub fn set_admission(mut self, admission: Admission) -> Self {
        self.config.admission = admission;
        self
    }

    /// label of the component malicious and untrusted traffic goes to
    pub fn set_scrubber(mut self, scrubber: impl Into<Label>) -> Self {
        self.config.scrubber = Some(scrubber.into());
        self
    }

    /// label of the component trusted traffic goes to
    pub fn set_direct(mut self, direct: impl Into<Label>) -> Self {
        self.config.direct = Some(direct.into());
        self
    }

    pub fn build(self) -> Label {
        let Self { config, simulation } = self;
        let label = config.label.clone();
        simulation.components.push(Declared::Splitter(config));
        label
    }
}

impl Declared {
    fn label(&self) -> &Label {
        match self {
            Self::Source(config) => &config.label,
            Self::Sink(config) | Self::Scrubber(config, _) => &config.label,
            Self::Splitter(config) => &config.label,
        }
    }
}

impl Simulation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(&mut self, label: impl Into<Label>) -> SourceBuilder<'_> {
        SourceBuilder {
            config: SourceConfig {
                label: label.into(),
                rate: DEFAULT_LEGITIMATE_RATE,
                malicious: false,
                arrival: Arrival::default(),
                destination: None,
            },
            simulation: self,
        }
    }

    pub fn sink(&mut self, label: impl Into<Label>) -> SinkBuilder<'_> {
        SinkBuilder {
            config: SinkConfig {
                label: label.into(),
                service_rate: DEFAULT_SERVICE_RATE,
                analyze: true,
            },
            simulation: self,
        }
    }

    pub fn scrubber(&mut self, label: impl Into<Label>) -> ScrubberBuilder<'_> {
        ScrubberBuilder {
            config: SinkConfig {
                label: label.into(),
                service_rate: DEFAULT_SCRUBBER_RATE,
                analyze: true,
            },
            forward: None,
            simulation: self,
        }
    }

    pub fn splitter(&mut self, label: impl Into<Label>) -> SplitterBuilder<'_> {
        SplitterBuilder {
            config: SplitterConfig {
                label: label.into(),
                trust: DEFAULT_TRUST_RATIO,
                admission: Admission::default(),
                scrubber: None,
                direct: None,
            },
            simulation: self,
        }
    }

    /// labels of the declared components, in declaration order
    pub fn labels(&self) -> impl Iterator<Item = &Label> {
        self.components.iter().map(Declared::label)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Wire the components together and run them until `horizon`.
    ///
    /// Every wake-up due at or before `horizon` is processed; the rest is
    /// discarded. The simulation itself is left untouched and can be run
    /// again, each run starting from a clean state.
    ///
    /// # Errors
    ///
    /// - [`RunError::Build`] if the components cannot be wired: duplicate
    ///   labels, a reference to an unknown label or to a source, or a sink
    ///   with a zero service rate.
    /// - [`RunError::Sim`] if a process fails while running, e.g. a source
    ///   without a destination.
    pub fn run(&self, horizon: SimTime) -> Result<SimulationReport, RunError> {
        self.check_labels()?;

        debug!(components = self.components.len(), %horizon, "simulation starting");

        let mut scheduler = Scheduler::<Component>::new();

        let wiring = self.register(&mut scheduler);
        let addresses: BTreeMap<&Label, Address> = self
            .components
            .iter()
            .zip(&wiring)
            .filter_map(|(declared, wiring)| match wiring {
                Wiring::Process => None,
                Wiring::Mailbox(mailbox) => Some((declared.label(), Address::Mailbox(*mailbox))),
                Wiring::Router(router) => Some((declared.label(), Address::Router(*router))),
            })
            .collect();
        let resolve = |label: &Label, referenced_by: &Label| -> Result<Address, BuildError> {
            match addresses.get(label) {
                Some(address) => Ok(*address),
                None if self.labels().any(|declared| declared == label) => {
                    Err(BuildError::NotAddressable {
                        label: label.clone(),
                        referenced_by: referenced_by.clone(),
                    })
                }
                None => Err(BuildError::UnknownComponent {
                    label: label.clone(),
                    referenced_by: referenced_by.clone(),
                }),
            }
        };

        for (declared, wiring) in self.components.iter().zip(wiring) {
            match (declared, wiring) {
                (Declared::Source(config), _) => {
                    let mut source =
                        Source::new(config.label.clone(), config.rate, config.malicious, config.arrival);
                    if let Some(destination) = &config.destination {
                        source.set_destination(resolve(destination, &config.label)?, destination.clone());
                    }
                    scheduler.spawn(source.into());
                }
                (Declared::Sink(config), Wiring::Mailbox(mailbox)) => {
                    let sink =
                        Sink::new(config.label.clone(), mailbox, config.service_rate, config.analyze)?;
                    scheduler.spawn(sink.into());
                }
                (Declared::Scrubber(config, forward), Wiring::Mailbox(mailbox)) => {
                    let mut scrubber =
                        Scrubber::new(config.label.clone(), mailbox, config.service_rate, config.analyze)?;
                    if let Some(forward) = forward {
                        scrubber.set_forward(resolve(forward, &config.label)?);
                    }
                    scheduler.spawn(scrubber.into());
                }
                (Declared::Splitter(config), Wiring::Router(router)) => {
                    let scrubber = config
                        .scrubber
                        .as_ref()
                        .map(|label| resolve(label, &config.label))
                        .transpose()?;
                    let direct = config
                        .direct
                        .as_ref()
                        .map(|label| resolve(label, &config.label))
                        .transpose()?;

                    if let Some(splitter) = scheduler.router_mut(router) {
                        if let Some(scrubber) = scrubber {
                            splitter.set_scrubber(scrubber);
                        }
                        if let Some(direct) = direct {
                            splitter.set_direct(direct);
                        }
                    }
                }
                _ => {}
            }
        }

        let summary = scheduler.run_until(horizon)?;

        debug!(
            steps = summary.steps,
            discarded = summary.discarded,
            halt = ?summary.halt,
            "simulation finished"
        );

        Ok(report(summary, scheduler.into_parts()))
    }

    fn check_labels(&self) -> Result<(), BuildError> {
        let mut seen = BTreeSet::new();
        for label in self.labels() {
            if !seen.insert(label) {
                return Err(BuildError::DuplicateLabel {
                    label: label.clone(),
                });
            }
        }
        Ok(())
    }

    /// create the mailboxes and routers, so every label has an address
    /// before any process is created
    fn register(&self, scheduler: &mut Scheduler<Component>) -> Vec<Wiring> {
        self.components
            .iter()
            .map(|declared| match declared {
                Declared::Source(_) => Wiring::Process,
                Declared::Sink(_) | Declared::Scrubber(..) => {
                    Wiring::Mailbox(scheduler.add_mailbox())
                }
                Declared::Splitter(config) => {
                    let mut splitter = Splitter::new(config.label.clone(), config.trust);
                    splitter.set_admission(config.admission);
                    Wiring::Router(scheduler.add_router(splitter))
                }
            })
            .collect()
    }
}

fn report(summary: RunSummary, parts: Parts<Component>) -> SimulationReport {
    let Parts {
        processes,
        routers,
        mailboxes,
    } = parts;

    let mut sinks = BTreeMap::new();
    let mut sources = BTreeMap::new();

    for component in processes {
        match component {
            Component::Source(source) => {
                let report = SourceReport {
                    label: source.label().clone(),
                    rate: source.rate(),
                    malicious: source.is_malicious(),
                    arrival: source.arrival(),
                    emitted: source.emitted(),
                };
                sources.insert(report.label.clone(), report);
            }
            Component::Sink(sink) => {
                let mut report = sink_report(
                    sink.label().clone(),
                    sink.service_rate(),
                    sink.serviced(),
                    sink.busy_time(),
                    mailboxes.get(sink.mailbox().index()),
                );
                report.flows = sink.into_flows();
                sinks.insert(report.label.clone(), report);
            }
            Component::Scrubber(scrubber) => {
                let mut report = sink_report(
                    scrubber.label().clone(),
                    scrubber.service_rate(),
                    scrubber.serviced(),
                    scrubber.busy_time(),
                    mailboxes.get(scrubber.mailbox().index()),
                );
                report.relay = Some(RelayReport {
                    forwarded: scrubber.forwarded(),
                    absorbed: scrubber.absorbed(),
                });
                report.flows = scrubber.into_flows();
                sinks.insert(report.label.clone(), report);
            }
        }
    }

    let splitters = routers
        .into_iter()
        .map(|splitter| {
            let report = SplitterReport {
                label: splitter.label().clone(),
                trust: splitter.trust(),
                admission: splitter.admission(),
                received: splitter.received(),
                admitted: splitter.admitted(),
                scrubbed: splitter.scrubbed(),
                malicious: splitter.malicious(),
            };
            (report.label.clone(), report)
        })
        .collect();

    SimulationReport {
        summary,
        sinks,
        sources,
        splitters,
    }
}

fn sink_report(
    label: Label,
    service_rate: Rate,
    serviced: u64,
    busy_time: f64,
    mailbox: Option<&Mailbox<Packet>>,
) -> SinkReport {
    SinkReport {
        label,
        service_rate,
        flows: Default::default(),
        received: mailbox.map_or(0, Mailbox::delivered),
        serviced,
        busy_time,
        backlog: mailbox.map_or(0, Mailbox::backlog),
        peak_backlog: mailbox.map_or(0, Mailbox::peak_backlog),
        relay: None,
    }
}
