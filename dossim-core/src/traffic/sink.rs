use super::{
    Label, Packet,
    station::{Served, Station},
};
use crate::{
    measure::Rate,
    scheduler::{Context, MailboxId, Router, SimError, Suspend, Wake},
    simulation::BuildError,
    stats::FlowTable,
    time::Delay,
};

/// A single-server receiver.
///
/// The sink takes packets from its mailbox one at a time. A unit packet
/// occupies the server for `1 / service_rate`; a probe is completed
/// immediately. Packets waiting for the server stay in the mailbox, in
/// arrival order.
///
/// When `analyze` is set, every completed packet is recorded in the sink's
/// [`FlowTable`].
#[derive(Debug)]
pub struct Sink {
    station: Station,
}

impl Sink {
    /// # Errors
    ///
    /// [`BuildError::ZeroServiceRate`] if `service_rate` is zero.
    pub fn new(
        label: Label,
        mailbox: MailboxId,
        service_rate: Rate,
        analyze: bool,
    ) -> Result<Self, BuildError> {
        Station::new(label, mailbox, service_rate, analyze).map(|station| Self { station })
    }

    #[inline]
    pub fn label(&self) -> &Label {
        self.station.label()
    }

    #[inline]
    pub fn mailbox(&self) -> MailboxId {
        self.station.mailbox()
    }

    #[inline]
    pub fn service_rate(&self) -> Rate {
        self.station.service_rate()
    }

    /// time a unit packet occupies the server
    #[inline]
    pub fn service_time(&self) -> Delay {
        self.station.service_time()
    }

    #[inline]
    pub fn analyze(&self) -> bool {
        self.station.analyze()
    }

    #[inline]
    pub fn flows(&self) -> &FlowTable {
        self.station.flows()
    }

    /// number of packets completed
    #[inline]
    pub fn serviced(&self) -> u64 {
        self.station.serviced()
    }

    /// virtual seconds spent servicing unit packets
    #[inline]
    pub fn busy_time(&self) -> f64 {
        self.station.busy_time()
    }

    /// the packet currently occupying the server
    #[inline]
    pub fn in_service(&self) -> Option<&Packet> {
        self.station.in_service()
    }

    pub fn into_flows(self) -> FlowTable {
        self.station.into_flows()
    }

    pub fn resume<R>(
        &mut self,
        ctx: &mut Context<'_, R>,
        wake: Wake<Packet>,
    ) -> Result<Suspend, SimError>
    where
        R: Router<Message = Packet>,
    {
        match self.station.resume(ctx.now(), wake) {
            Served::Pending(suspend) => Ok(suspend),
            Served::Completed(_) => Ok(self.station.receive()),
        }
    }
}
