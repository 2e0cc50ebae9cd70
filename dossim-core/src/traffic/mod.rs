//! The traffic components of a simulation.
//!
//! [`Source`], [`Sink`] and [`Scrubber`] are processes and run on the
//! [`Scheduler`] as a [`Component`]. The [`Splitter`] is a [`Router`]: it
//! has no process of its own and forwards packets synchronously.
//!
//! [`Scheduler`]: crate::scheduler::Scheduler
//! [`Router`]: crate::scheduler::Router

mod label;
mod packet;
mod scrubber;
mod sink;
mod source;
mod splitter;
mod station;

pub use self::{
    label::Label,
    packet::{Origin, Packet, PacketId, PacketSize},
    scrubber::Scrubber,
    sink::Sink,
    source::Source,
    splitter::{Admission, Splitter},
};
use crate::scheduler::{Context, Process, SimError, Suspend, Wake};

/// Any traffic component driven by the scheduler.
#[derive(Debug)]
pub enum Component {
    Source(Source),
    Sink(Sink),
    Scrubber(Scrubber),
}

impl Component {
    pub fn label(&self) -> &Label {
        match self {
            Self::Source(source) => source.label(),
            Self::Sink(sink) => sink.label(),
            Self::Scrubber(scrubber) => scrubber.label(),
        }
    }
}

impl Process for Component {
    type Router = Splitter;

    fn resume(
        &mut self,
        ctx: &mut Context<'_, Splitter>,
        wake: Wake<Packet>,
    ) -> Result<Suspend, SimError> {
        match self {
            Self::Source(source) => source.resume(ctx, wake),
            Self::Sink(sink) => sink.resume(ctx, wake),
            Self::Scrubber(scrubber) => scrubber.resume(ctx, wake),
        }
    }
}

impl From<Source> for Component {
    fn from(value: Source) -> Self {
        Self::Source(value)
    }
}

impl From<Sink> for Component {
    fn from(value: Sink) -> Self {
        Self::Sink(value)
    }
}

impl From<Scrubber> for Component {
    fn from(value: Scrubber) -> Self {
        Self::Scrubber(value)
    }
}
