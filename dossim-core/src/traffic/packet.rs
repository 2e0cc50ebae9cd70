use super::Label;
use crate::{stats::FlowKey, time::SimTime};
use std::fmt;

/// The sequence number of a packet, unique per emitting source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PacketId(u64);

/// How many abstract units a packet carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketSize {
    /// a zero-sized packet, serviced without any delay
    Probe,
    Unit,
}

/// Where a packet was first emitted. Never changes after emission.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origin {
    label: Label,
    malicious: bool,
}

/// A unit of traffic.
///
/// The [`Origin`] records the emitting source for the whole life of the
/// packet, while the attribution is the identity the packet is currently
/// accounted under. A relay that re-originates traffic (a scrubber or a
/// splitter) changes the attribution but never the origin.
///
/// ```
/// # use dossim_core::{traffic::{Label, Packet, PacketId, PacketSize}, SimTime};
/// let mut packet = Packet::new(
///     PacketId::new(0),
///     PacketSize::Unit,
///     Label::from("trusted"),
///     false,
///     Label::from("victim"),
///     SimTime::ZERO,
/// );
/// packet.reattribute(Label::from("scrubber"));
///
/// assert_eq!(packet.origin().label(), "trusted");
/// assert_eq!(packet.attribution(), "scrubber");
/// assert_eq!(packet.flow_key().to_string(), "scrubber->victim");
/// ```
#[derive(Debug, Clone)]
pub struct Packet {
    id: PacketId,
    size: PacketSize,
    origin: Origin,
    attribution: Label,

    /// the destination configured on the emitting source
    destination: Label,

    created: SimTime,
    completed: Option<SimTime>,
}

impl PacketId {
    pub const fn new(sequence: u64) -> Self {
        Self(sequence)
    }

    #[inline]
    pub fn sequence(self) -> u64 {
        self.0
    }
}

impl PacketSize {
    #[inline]
    pub fn units(self) -> u32 {
        match self {
            Self::Probe => 0,
            Self::Unit => 1,
        }
    }

    #[inline]
    pub fn is_probe(self) -> bool {
        matches!(self, Self::Probe)
    }
}

impl Origin {
    #[inline]
    pub fn label(&self) -> &Label {
        &self.label
    }

    #[inline]
    pub fn is_malicious(&self) -> bool {
        self.malicious
    }
}

impl Packet {
    /// Create a packet emitted by `origin` toward `destination`.
    ///
    /// The packet is attributed to its origin until a relay re-attributes it.
    pub fn new(
        id: PacketId,
        size: PacketSize,
        origin: Label,
        malicious: bool,
        destination: Label,
        created: SimTime,
    ) -> Self {
        Self {
            id,
            size,
            attribution: origin.clone(),
            origin: Origin {
                label: origin,
                malicious,
            },
            destination,
            created,
            completed: None,
        }
    }

    #[inline]
    pub fn id(&self) -> PacketId {
        self.id
    }

    #[inline]
    pub fn size(&self) -> PacketSize {
        self.size
    }

    #[inline]
    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    #[inline]
    pub fn attribution(&self) -> &Label {
        &self.attribution
    }

    #[inline]
    pub fn destination(&self) -> &Label {
        &self.destination
    }

    #[inline]
    pub fn created(&self) -> SimTime {
        self.created
    }

    /// the time the last sink finished servicing this packet
    #[inline]
    pub fn completed(&self) -> Option<SimTime> {
        self.completed
    }

    /// account the packet under `label` from now on.
    pub fn reattribute(&mut self, label: Label) {
        self.attribution = label;
    }

    pub(crate) fn complete(&mut self, now: SimTime) {
        self.completed = Some(now);
    }

    /// seconds between creation and completion, once serviced
    pub fn wait_time(&self) -> Option<f64> {
        self.completed.map(|completed| completed.since(self.created))
    }

    /// the flow this packet currently belongs to
    pub fn flow_key(&self) -> FlowKey {
        FlowKey::new(self.attribution.clone(), self.destination.clone())
    }
}

impl fmt::Display for PacketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
