use crate::time::{Delay, SimTime};
use core::cmp::Reverse;
use std::collections::BinaryHeap;

/// The virtual clock and its set of pending wake-ups.
///
/// Every entry is tagged with its fire time and an insertion sequence
/// number. Entries pop in `(time, sequence)` order: on a time tie the
/// entry scheduled first comes out first. Popping an entry advances the
/// clock to its fire time; the clock never goes backward.
///
/// ```
/// # use dossim_core::{Delay, SimTime, TimeQueue};
/// let mut queue = TimeQueue::new();
/// queue.schedule_after(Delay::new(2.0)?, "late");
/// queue.schedule_after(Delay::new(1.0)?, "early");
/// queue.schedule_after(Delay::new(1.0)?, "early, second");
///
/// assert_eq!(queue.pop_next(), Some("early"));
/// assert_eq!(queue.now(), SimTime::new(1.0)?);
/// assert_eq!(queue.pop_next(), Some("early, second"));
/// assert_eq!(queue.pop_next(), Some("late"));
/// assert_eq!(queue.pop_next(), None);
/// # Ok::<(), dossim_core::TimeError>(())
/// ```
pub struct TimeQueue<T> {
    now: SimTime,
    sequence: u64,
    map: BinaryHeap<Reverse<OrderedByTime<T>>>,
}

struct OrderedByTime<T> {
    time: SimTime,
    sequence: u64,
    item: T,
}

impl<T> OrderedByTime<T> {
    fn key(&self) -> (SimTime, u64) {
        (self.time, self.sequence)
    }
}

impl<T> PartialEq for OrderedByTime<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl<T> Eq for OrderedByTime<T> {}

impl<T> PartialOrd for OrderedByTime<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl<T> Ord for OrderedByTime<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key().cmp(&other.key())
    }
}

impl<T> TimeQueue<T> {
    pub fn new() -> Self {
        Self {
            now: SimTime::ZERO,
            sequence: 0,
            map: BinaryHeap::new(),
        }
    }

    /// the current virtual time
    #[inline]
    pub fn now(&self) -> SimTime {
        self.now
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// fire time of the next pending entry, if any
    #[inline]
    pub fn time_to_next(&self) -> Option<SimTime> {
        self.map.peek().map(|entry| entry.0.time)
    }

    /// register `item` to fire `delay` after the current time.
    pub fn schedule_after(&mut self, delay: Delay, item: T) {
        let time = self.now + delay;
        let sequence = self.sequence;
        self.sequence += 1;

        self.map.push(Reverse(OrderedByTime {
            time,
            sequence,
            item,
        }))
    }

    /// remove the earliest entry and advance the clock to its fire time.
    pub fn pop_next(&mut self) -> Option<T> {
        let Reverse(entry) = self.map.pop()?;
        self.now = self.now.max(entry.time);
        Some(entry.item)
    }

    /// move the clock forward to `time` without firing anything.
    ///
    /// Does nothing if `time` is not after the current time.
    pub fn advance_to(&mut self, time: SimTime) {
        self.now = self.now.max(time);
    }

    /// drop every pending entry, returning how many were discarded.
    pub fn clear(&mut self) -> usize {
        let discarded = self.map.len();
        self.map.clear();
        discarded
    }
}

impl<T> Default for TimeQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
