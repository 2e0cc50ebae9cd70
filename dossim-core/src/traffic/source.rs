use super::{Label, Packet, PacketId, PacketSize};
use crate::{
    measure::{Arrival, Pacing, Rate},
    scheduler::{Address, Context, Router, SimError, Suspend, Wake},
};
use tracing::trace;

/// Emits packets toward a single destination.
///
/// A source with a positive rate emits one unit packet per inter-emission
/// delay, forever; the first packet leaves one delay after the start. A
/// source with a zero rate emits a single [`PacketSize::Probe`] packet when
/// it starts and then stops.
///
/// Emission never blocks: the packet is handed to the destination and the
/// source immediately goes back to sleep.
#[derive(Debug)]
pub struct Source {
    label: Label,
    rate: Rate,
    malicious: bool,
    arrival: Arrival,

    /// where the packets go, and the destination label they carry
    destination: Option<(Address, Label)>,

    pacing: Option<Pacing>,
    emitted: u64,
}

impl Source {
    pub fn new(label: Label, rate: Rate, malicious: bool, arrival: Arrival) -> Self {
        Self {
            label,
            rate,
            malicious,
            arrival,
            destination: None,
            pacing: Pacing::new(arrival, rate),
            emitted: 0,
        }
    }

    /// send every packet to `address`, tagging it with the `label` of the
    /// component behind that address.
    pub fn set_destination(&mut self, address: Address, label: Label) {
        self.destination = Some((address, label));
    }

    #[inline]
    pub fn label(&self) -> &Label {
        &self.label
    }

    #[inline]
    pub fn rate(&self) -> Rate {
        self.rate
    }

    #[inline]
    pub fn arrival(&self) -> Arrival {
        self.arrival
    }

    #[inline]
    pub fn is_malicious(&self) -> bool {
        self.malicious
    }

    /// label of the configured destination, if any
    pub fn destination(&self) -> Option<&Label> {
        self.destination.as_ref().map(|(_, label)| label)
    }

    /// number of packets emitted so far
    #[inline]
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    pub fn resume<R>(
        &mut self,
        ctx: &mut Context<'_, R>,
        wake: Wake<Packet>,
    ) -> Result<Suspend, SimError>
    where
        R: Router<Message = Packet>,
    {
        let Some(delay) = self.pacing.as_mut().map(Pacing::next_delay) else {
            // zero rate: a single probe on start, then nothing
            if let Wake::Start = wake {
                self.emit(ctx, PacketSize::Probe)?;
            }
            return Ok(Suspend::Exit);
        };

        if !matches!(wake, Wake::Start) {
            self.emit(ctx, PacketSize::Unit)?;
        }
        Ok(Suspend::Sleep(delay))
    }

    fn emit<R>(&mut self, ctx: &mut Context<'_, R>, size: PacketSize) -> Result<(), SimError>
    where
        R: Router<Message = Packet>,
    {
        let Some((address, destination)) = &self.destination else {
            return Err(SimError::DestinationUnset {
                component: self.label.to_string(),
            });
        };

        let id = PacketId::new(self.emitted);
        let packet = Packet::new(
            id,
            size,
            self.label.clone(),
            self.malicious,
            destination.clone(),
            ctx.now(),
        );
        self.emitted += 1;

        trace!(source = %self.label, %id, to = %destination, now = %ctx.now(), "emit");

        ctx.send(*address, packet)
    }
}
