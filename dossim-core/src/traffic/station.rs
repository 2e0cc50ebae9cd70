use super::{Label, Packet};
use crate::{
    measure::Rate,
    scheduler::{MailboxId, Suspend, Wake},
    simulation::BuildError,
    stats::FlowTable,
    time::{Delay, SimTime},
};
use tracing::trace;

/// Single-server service loop shared by [`Sink`] and [`Scrubber`].
///
/// [`Sink`]: super::Sink
/// [`Scrubber`]: super::Scrubber
#[derive(Debug)]
pub(crate) struct Station {
    label: Label,
    mailbox: MailboxId,
    service_rate: Rate,
    service_time: Delay,
    analyze: bool,
    flows: FlowTable,

    in_service: Option<Packet>,
    serviced: u64,
    busy_time: f64,
}

/// Outcome of one step of a [`Station`].
pub(crate) enum Served {
    Pending(Suspend),
    /// the packet finished its service; the caller decides what comes next
    Completed(Packet),
}

impl Station {
    pub(crate) fn new(
        label: Label,
        mailbox: MailboxId,
        service_rate: Rate,
        analyze: bool,
    ) -> Result<Self, BuildError> {
        let Some(service_time) = service_rate.interval() else {
            return Err(BuildError::ZeroServiceRate { component: label });
        };

        Ok(Self {
            label,
            mailbox,
            service_rate,
            service_time,
            analyze,
            flows: FlowTable::new(),
            in_service: None,
            serviced: 0,
            busy_time: 0.0,
        })
    }

    pub(crate) fn resume(&mut self, now: SimTime, wake: Wake<Packet>) -> Served {
        match wake {
            Wake::Start => Served::Pending(self.receive()),
            Wake::Received(packet) if packet.size().is_probe() => {
                Served::Completed(self.complete(now, packet))
            }
            Wake::Received(packet) => {
                trace!(station = %self.label, id = %packet.id(), from = %packet.attribution(), %now, "service");
                self.in_service = Some(packet);
                Served::Pending(Suspend::Sleep(self.service_time))
            }
            Wake::Timer => match self.in_service.take() {
                Some(packet) => {
                    self.busy_time += self.service_time.as_secs();
                    Served::Completed(self.complete(now, packet))
                }
                None => Served::Pending(self.receive()),
            },
        }
    }

    #[inline]
    pub(crate) fn receive(&self) -> Suspend {
        Suspend::Receive(self.mailbox)
    }

    fn complete(&mut self, now: SimTime, mut packet: Packet) -> Packet {
        packet.complete(now);
        self.serviced += 1;

        if self.analyze {
            self.flows.record(packet.flow_key(), packet.created(), now);
        }

        trace!(station = %self.label, id = %packet.id(), from = %packet.attribution(), %now, "completed");
        packet
    }

    #[inline]
    pub(crate) fn label(&self) -> &Label {
        &self.label
    }

    #[inline]
    pub(crate) fn mailbox(&self) -> MailboxId {
        self.mailbox
    }

    #[inline]
    pub(crate) fn service_rate(&self) -> Rate {
        self.service_rate
    }

    #[inline]
    pub(crate) fn service_time(&self) -> Delay {
        self.service_time
    }

    #[inline]
    pub(crate) fn analyze(&self) -> bool {
        self.analyze
    }

    #[inline]
    pub(crate) fn flows(&self) -> &FlowTable {
        &self.flows
    }

    pub(crate) fn into_flows(self) -> FlowTable {
        self.flows
    }

    #[inline]
    pub(crate) fn serviced(&self) -> u64 {
        self.serviced
    }

    #[inline]
    pub(crate) fn busy_time(&self) -> f64 {
        self.busy_time
    }

    #[inline]
    pub(crate) fn in_service(&self) -> Option<&Packet> {
        self.in_service.as_ref()
    }
}
