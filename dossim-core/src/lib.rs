//! Discrete-event simulation of traffic contention during a volumetric
//! denial-of-service attack.
//!
//! Everything runs on a virtual clock ([`SimTime`]) driven by the
//! [`Scheduler`]: no thread, no wall-clock time, and two runs of the same
//! [`Simulation`] produce the same [`SimulationReport`].
//!
//! A simulation is made of labelled components:
//!
//! * a [`Source`] emits packets at a given rate;
//! * a [`Sink`] services packets one at a time and keeps per-flow timing
//!   statistics;
//! * a [`Scrubber`] is a sink that relays the benign traffic it services;
//! * a [`Splitter`] sends a trusted share of the benign traffic around the
//!   scrubber.
//!
//! ```
//! use dossim_core::{measure::Rate, Simulation};
//!
//! let mut simulation = Simulation::new();
//! simulation.sink("victim").build();
//! simulation.source("trusted").set_destination("victim").build();
//! simulation
//!     .source("attacker")
//!     .set_rate(Rate::from(50))
//!     .set_malicious(true)
//!     .set_destination("victim")
//!     .build();
//!
//! let report = simulation.run(dossim_core::defaults::DEFAULT_HORIZON)?;
//! let rates = report.sink("victim").unwrap().rates_by_source();
//!
//! // the victim serves 10 packets per second, mostly to the attacker
//! assert!(rates["trusted"] < 7.0);
//! # Ok::<(), dossim_core::RunError>(())
//! ```
//!
//! [`Scheduler`]: scheduler::Scheduler
//! [`Source`]: traffic::Source
//! [`Sink`]: traffic::Sink
//! [`Scrubber`]: traffic::Scrubber
//! [`Splitter`]: traffic::Splitter

pub mod defaults;
pub mod measure;
pub mod report;
pub mod scheduler;
mod simulation;
pub mod stats;
mod time;
mod time_queue;
pub mod traffic;

pub use self::{
    report::SimulationReport,
    simulation::{
        BuildError, RunError, ScrubberBuilder, Simulation, SinkBuilder, SourceBuilder,
        SplitterBuilder,
    },
    time::{Delay, SimTime, TimeError},
    time_queue::TimeQueue,
};
