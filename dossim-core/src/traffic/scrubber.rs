use super::{
    Label, Packet,
    station::{Served, Station},
};
use crate::{
    measure::Rate,
    scheduler::{Address, Context, MailboxId, Router, SimError, Suspend, Wake},
    simulation::BuildError,
    stats::FlowTable,
};
use tracing::trace;

/// A [`Sink`] that relays the benign traffic it services.
///
/// After service, a packet whose origin is not malicious is re-attributed
/// to the scrubber and handed to the forward destination. Malicious
/// packets are serviced like any other, then absorbed.
///
/// [`Sink`]: super::Sink
#[derive(Debug)]
pub struct Scrubber {
    station: Station,
    forward: Option<Address>,

    forwarded: u64,
    absorbed: u64,
}

impl Scrubber {
    /// # Errors
    ///
    /// [`BuildError::ZeroServiceRate`] if `service_rate` is zero.
    pub fn new(
        label: Label,
        mailbox: MailboxId,
        service_rate: Rate,
        analyze: bool,
    ) -> Result<Self, BuildError> {
        Ok(Self {
            station: Station::new(label, mailbox, service_rate, analyze)?,
            forward: None,
            forwarded: 0,
            absorbed: 0,
        })
    }

    pub fn set_forward(&mut self, address: Address) {
        self.forward = Some(address);
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

    #[inline]
    pub fn flows(&self) -> &FlowTable {
        self.station.flows()
    }

    #[inline]
    pub fn serviced(&self) -> u64 {
        self.station.serviced()
    }

    #[inline]
    pub fn busy_time(&self) -> f64 {
        self.station.busy_time()
    }

    /// benign packets handed to the forward destination
    #[inline]
    pub fn forwarded(&self) -> u64 {
        self.forwarded
    }

    /// malicious packets dropped after service
    #[inline]
    pub fn absorbed(&self) -> u64 {
        self.absorbed
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
        let mut packet = match self.station.resume(ctx.now(), wake) {
            Served::Pending(suspend) => return Ok(suspend),
            Served::Completed(packet) => packet,
        };

        if packet.origin().is_malicious() {
            self.absorbed += 1;
            trace!(scrubber = %self.label(), id = %packet.id(), from = %packet.origin().label(), "absorbed");
            return Ok(self.station.receive());
        }

        let Some(forward) = self.forward else {
            return Err(SimError::DestinationUnset {
                component: self.label().to_string(),
            });
        };

        packet.reattribute(self.label().clone());
        ctx.send(forward, packet)?;
        self.forwarded += 1;

        Ok(self.station.receive())
    }
}
