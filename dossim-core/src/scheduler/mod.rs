//! Cooperative, single-threaded process scheduler over virtual time.
//!
//! A process is an explicit state machine: the [`Scheduler`] calls
//! [`Process::resume`] with the reason it woke up ([`Wake`]) and the
//! process answers with what it waits for next ([`Suspend`]). Between two
//! suspension points a process runs alone, so there is no locking anywhere.
//!
//! Every wake-up goes through the [`TimeQueue`]: timers fire at their due
//! time and mailbox deliveries fire after a zero delay, which defers them
//! to a later step instead of running them inside the sender's step.
//!
//! [`Router`]s are synchronous forwarding stages. Sending a message to a
//! router address runs the router immediately, within the caller's step,
//! until the message lands in a mailbox.

mod id;
mod mailbox;

pub use self::{
    id::{MailboxId, ProcessId, RouterId},
    mailbox::Mailbox,
};
use crate::{
    time::{Delay, SimTime},
    time_queue::TimeQueue,
};
use std::fmt;
use thiserror::Error;
use tracing::{debug, trace};

/// Where a message can be sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Address {
    Mailbox(MailboxId),
    Router(RouterId),
}

/// Why a process is being resumed.
#[derive(Debug)]
pub enum Wake<M> {
    /// first resumption, right after [`Scheduler::spawn`]
    Start,
    /// the delay requested with [`Suspend::Sleep`] elapsed
    Timer,
    /// a message arrived on the mailbox requested with [`Suspend::Receive`]
    Received(M),
}

/// What a process waits for before its next resumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suspend {
    Sleep(Delay),
    Receive(MailboxId),
    /// the process is done and will never be resumed again
    Exit,
}

/// The state of a process between two steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    /// a wake-up is pending in the event queue
    Ready,
    Sleeping,
    Receiving(MailboxId),
    Finished,
}

/// Why [`Scheduler::run_until`] or [`Scheduler::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Halt {
    /// the next wake-up was past the horizon
    Horizon,
    /// no wake-up was left to process
    Idle,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub halt: Halt,
    /// virtual time when the run returned
    pub now: SimTime,
    /// number of process steps executed during the run
    pub steps: u64,
    /// wake-ups dropped because they were scheduled past the horizon
    pub discarded: usize,
}

/// Error raised by the scheduler or by a process step.
///
/// Any error aborts the run and is returned to the caller as is.
#[derive(Debug, Error)]
pub enum SimError {
    /// A component tried to hand off a packet without a destination.
    #[error("{component} has no destination set")]
    DestinationUnset { component: String },
    #[error("Mailbox ({mailbox}) Not Found")]
    UnknownMailbox { mailbox: MailboxId },
    #[error("Router ({router}) Not Found")]
    UnknownRouter { router: RouterId },
    #[error("Process ({process}) Not Found")]
    UnknownProcess { process: ProcessId },
    /// A mailbox only supports one receiver.
    #[error("Mailbox ({mailbox}) already has a waiting receiver ({receiver})")]
    MailboxBusy {
        mailbox: MailboxId,
        receiver: ProcessId,
    },
    /// A message went through more routers than are registered.
    #[error("Routing loop: message still unrouted after {hops} hops")]
    RoutingLoop { hops: usize },
}

/// A synchronous forwarding stage.
///
/// A router has no mailbox and no process: it decides where a message goes
/// (and may rewrite it) inside the step of the process that sent it.
pub trait Router {
    type Message;

    fn route(
        &mut self,
        now: SimTime,
        msg: Self::Message,
    ) -> Result<(Address, Self::Message), SimError>;
}

/// A unit of cooperative work driven by the [`Scheduler`].
pub trait Process {
    /// The routers this process may send through. It also fixes the
    /// message type exchanged through mailboxes.
    type Router: Router;

    fn resume(
        &mut self,
        ctx: &mut Context<'_, Self::Router>,
        wake: Wake<MessageOf<Self>>,
    ) -> Result<Suspend, SimError>;
}

/// The message type exchanged by the processes `P`.
pub type MessageOf<P> = <<P as Process>::Router as Router>::Message;

struct Event<M> {
    process: ProcessId,
    wake: Wake<M>,
}

struct Core<R: Router> {
    events: TimeQueue<Event<R::Message>>,
    mailboxes: Vec<Mailbox<R::Message>>,
    routers: Vec<R>,
}

/// What a process can do during its step.
pub struct Context<'a, R: Router> {
    core: &'a mut Core<R>,
}

struct Slot<P> {
    process: P,
    state: ProcessState,
}

/// Everything a [`Scheduler`] owned, indexed by identifier.
pub struct Parts<P: Process> {
    pub processes: Vec<P>,
    pub routers: Vec<P::Router>,
    pub mailboxes: Vec<Mailbox<MessageOf<P>>>,
}

/// The discrete-event scheduler.
///
/// ```
/// use dossim_core::{
///     scheduler::{Address, Context, Process, Router, Scheduler, SimError, Suspend, Wake},
///     Delay, SimTime,
/// };
///
/// // a router that never has to route anything
/// struct Direct;
/// impl Router for Direct {
///     type Message = ();
///     fn route(&mut self, _: SimTime, msg: ()) -> Result<(Address, ()), SimError> {
///         unreachable!()
///     }
/// }
///
/// // wakes up every second
/// struct Ticker(u32);
/// impl Process for Ticker {
///     type Router = Direct;
///     fn resume(&mut self, _: &mut Context<'_, Direct>, wake: Wake<()>) -> Result<Suspend, SimError> {
///         if let Wake::Timer = wake {
///             self.0 += 1;
///         }
///         Ok(Suspend::Sleep(Delay::new(1.0).unwrap()))
///     }
/// }
///
/// let mut scheduler = Scheduler::new();
/// let ticker = scheduler.spawn(Ticker(0));
/// scheduler.run_until(SimTime::new(10.0).unwrap())?;
///
/// assert_eq!(scheduler.process(ticker).unwrap().0, 10);
/// # Ok::<(), SimError>(())
/// ```
pub struct Scheduler<P: Process> {
    core: Core<P::Router>,
    processes: Vec<Slot<P>>,
    steps: u64,
}

impl<R: Router> Core<R> {
    fn new() -> Self {
        Self {
            events: TimeQueue::new(),
            mailboxes: Vec::new(),
            routers: Vec::new(),
        }
    }

    fn wake(&mut self, process: ProcessId, wake: Wake<R::Message>) {
        self.events
            .schedule_after(Delay::ZERO, Event { process, wake });
    }

    fn send(&mut self, mut address: Address, mut msg: R::Message) -> Result<(), SimError> {
        let mut hops = 0;

        loop {
            match address {
                Address::Mailbox(mailbox) => {
                    let Some(target) = self.mailboxes.get_mut(mailbox.index()) else {
                        return Err(SimError::UnknownMailbox { mailbox });
                    };
                    if let Some((receiver, msg)) = target.put(msg) {
                        self.wake(receiver, Wake::Received(msg));
                    }
                    return Ok(());
                }
                Address::Router(router) => {
                    if hops >= self.routers.len() {
                        return Err(SimError::RoutingLoop { hops });
                    }
                    hops += 1;

                    let now = self.events.now();
                    let Some(target) = self.routers.get_mut(router.index()) else {
                        return Err(SimError::UnknownRouter { router });
                    };
                    (address, msg) = target.route(now, msg)?;
                }
            }
        }
    }
}

impl<R: Router> Context<'_, R> {
    /// the current virtual time
    #[inline]
    pub fn now(&self) -> SimTime {
        self.core.events.now()
    }

    /// Hand `msg` off to `address` without suspending.
    ///
    /// Routers on the way run immediately. The receiver of the mailbox the
    /// message lands in is woken up in a later step.
    pub fn send(&mut self, address: Address, msg: R::Message) -> Result<(), SimError> {
        self.core.send(address, msg)
    }
}

impl<P: Process> Scheduler<P> {
    pub fn new() -> Self {
        Self {
            core: Core::new(),
            processes: Vec::new(),
            steps: 0,
        }
    }

    /// the current virtual time
    #[inline]
    pub fn now(&self) -> SimTime {
        self.core.events.now()
    }

    /// total number of process steps executed so far
    #[inline]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// number of wake-ups waiting in the event queue
    #[inline]
    pub fn pending(&self) -> usize {
        self.core.events.len()
    }

    pub fn add_mailbox(&mut self) -> MailboxId {
        let id = MailboxId::new(self.core.mailboxes.len());
        self.core.mailboxes.push(Mailbox::new(id));
        id
    }

    pub fn add_router(&mut self, router: P::Router) -> RouterId {
        let id = RouterId::new(self.core.routers.len());
        self.core.routers.push(router);
        id
    }

    /// Register `process`. It is first resumed with [`Wake::Start`] in a
    /// later step at the current virtual time.
    pub fn spawn(&mut self, process: P) -> ProcessId {
        let id = ProcessId::new(self.processes.len());
        self.processes.push(Slot {
            process,
            state: ProcessState::Ready,
        });
        self.core.wake(id, Wake::Start);
        id
    }

    pub fn process(&self, id: ProcessId) -> Option<&P> {
        self.processes.get(id.index()).map(|slot| &slot.process)
    }

    pub fn state(&self, id: ProcessId) -> Option<ProcessState> {
        self.processes.get(id.index()).map(|slot| slot.state)
    }

    pub fn mailbox(&self, id: MailboxId) -> Option<&Mailbox<MessageOf<P>>> {
        self.core.mailboxes.get(id.index())
    }

    pub fn router(&self, id: RouterId) -> Option<&P::Router> {
        self.core.routers.get(id.index())
    }

    pub fn router_mut(&mut self, id: RouterId) -> Option<&mut P::Router> {
        self.core.routers.get_mut(id.index())
    }

    /// Inject a message from outside of any process.
    pub fn send(&mut self, address: Address, msg: MessageOf<P>) -> Result<(), SimError> {
        self.core.send(address, msg)
    }

    /// Process the next wake-up.
    ///
    /// Returns `false` if there was nothing left to process.
    pub fn step(&mut self) -> Result<bool, SimError> {
        let Some(Event { process, wake }) = self.core.events.pop_next() else {
            return Ok(false);
        };

        let Some(slot) = self.processes.get_mut(process.index()) else {
            return Err(SimError::UnknownProcess { process });
        };
        if slot.state == ProcessState::Finished {
            return Ok(true);
        }

        trace!(%process, now = %self.core.events.now(), "resuming");

        let mut ctx = Context {
            core: &mut self.core,
        };
        let suspend = slot.process.resume(&mut ctx, wake)?;
        self.steps += 1;

        slot.state = match suspend {
            Suspend::Sleep(delay) => {
                self.core.events.schedule_after(
                    delay,
                    Event {
                        process,
                        wake: Wake::Timer,
                    },
                );
                ProcessState::Sleeping
            }
            Suspend::Receive(mailbox) => {
                let Some(target) = self.core.mailboxes.get_mut(mailbox.index()) else {
                    return Err(SimError::UnknownMailbox { mailbox });
                };
                match target.take(process)? {
                    Some(msg) => {
                        self.core.wake(process, Wake::Received(msg));
                        ProcessState::Ready
                    }
                    None => ProcessState::Receiving(mailbox),
                }
            }
            Suspend::Exit => ProcessState::Finished,
        };

        Ok(true)
    }

    /// Run until no wake-up is left.
    pub fn run(&mut self) -> Result<RunSummary, SimError> {
        let start = self.steps;
        while self.step()? {}

        debug!(now = %self.now(), steps = self.steps - start, "scheduler idle");

        Ok(RunSummary {
            halt: Halt::Idle,
            now: self.now(),
            steps: self.steps - start,
            discarded: 0,
        })
    }

    /// Run every wake-up due at or before `horizon`, then stop.
    ///
    /// The clock is left at `horizon` (unless it was already past it) and
    /// wake-ups scheduled later are discarded.
    pub fn run_until(&mut self, horizon: SimTime) -> Result<RunSummary, SimError> {
        let start = self.steps;

        let halt = loop {
            match self.core.events.time_to_next() {
                None => break Halt::Idle,
                Some(time) if time > horizon => break Halt::Horizon,
                Some(_) => {
                    self.step()?;
                }
            }
        };

        self.core.events.advance_to(horizon);
        let discarded = self.core.events.clear();

        debug!(
            now = %self.now(),
            steps = self.steps - start,
            discarded,
            ?halt,
            "scheduler halted"
        );

        Ok(RunSummary {
            halt,
            now: self.now(),
            steps: self.steps - start,
            discarded,
        })
    }

    pub fn into_parts(self) -> Parts<P> {
        Parts {
            processes: self.processes.into_iter().map(|slot| slot.process).collect(),
            routers: self.core.routers,
            mailboxes: self.core.mailboxes,
        }
    }
}

impl<P: Process> Default for Scheduler<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mailbox(id) => id.fmt(f),
            Self::Router(id) => id.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Log = Vec<(f64, &'static str, u32)>;

    /// prefixes every message with a tag and forwards it to `next`
    struct Tag {
        next: Address,
        tag: u32,
    }

    impl Router for Tag {
        type Message = u32;

        fn route(&mut self, _now: SimTime, msg: u32) -> Result<(Address, u32), SimError> {
            Ok((self.next, msg + self.tag))
        }
    }

    enum Actor {
        /// sends `count` messages to `to`, one every `every`
        Emit {
            to: Address,
            every: Delay,
            count: u32,
            sent: u32,
        },
        /// receives messages and keeps them with their arrival time
        Collect {
            mailbox: MailboxId,
            log: Log,
            name: &'static str,
        },
    }

    impl Process for Actor {
        type Router = Tag;

        fn resume(
            &mut self,
            ctx: &mut Context<'_, Tag>,
            wake: Wake<u32>,
        ) -> Result<Suspend, SimError> {
            match self {
                Actor::Emit {
                    to,
                    every,
                    count,
                    sent,
                } => {
                    if let Wake::Timer = wake {
                        ctx.send(*to, *sent)?;
                        *sent += 1;
                    }
                    if sent == count {
                        Ok(Suspend::Exit)
                    } else {
                        Ok(Suspend::Sleep(*every))
                    }
                }
                Actor::Collect { mailbox, log, name } => {
                    if let Wake::Received(msg) = wake {
                        log.push((ctx.now().as_secs(), *name, msg));
                    }
                    Ok(Suspend::Receive(*mailbox))
                }
            }
        }
    }

    fn delay(secs: f64) -> Delay {
        Delay::new(secs).unwrap()
    }

    fn time(secs: f64) -> SimTime {
        SimTime::new(secs).unwrap()
    }

    fn emitter(to: Address, every: f64, count: u32) -> Actor {
        Actor::Emit {
            to,
            every: delay(every),
            count,
            sent: 0,
        }
    }

    fn collector(mailbox: MailboxId) -> Actor {
        Actor::Collect {
            mailbox,
            log: Vec::new(),
            name: "collector",
        }
    }

    fn log_of(scheduler: &Scheduler<Actor>, id: ProcessId) -> Log {
        match scheduler.process(id) {
            Some(Actor::Collect { log, .. }) => log.clone(),
            _ => panic!("not a collector"),
        }
    }

    #[test]
    fn empty_scheduler_is_idle() {
        let mut scheduler = Scheduler::<Actor>::new();
        let summary = scheduler.run().unwrap();

        assert_eq!(summary.halt, Halt::Idle);
        assert_eq!(summary.steps, 0);
        assert_eq!(summary.now, SimTime::ZERO);
    }

    #[test]
    fn messages_arrive_in_order() {
        let mut scheduler = Scheduler::new();
        let mailbox = scheduler.add_mailbox();
        let collector = scheduler.spawn(collector(mailbox));
        let emitter = scheduler.spawn(emitter(Address::Mailbox(mailbox), 0.5, 4));

        let summary = scheduler.run_until(time(10.0)).unwrap();

        // the collector keeps waiting forever
        assert_eq!(summary.halt, Halt::Idle);
        assert_eq!(summary.now, time(10.0));
        assert_eq!(scheduler.state(emitter), Some(ProcessState::Finished));
        assert_eq!(
            scheduler.state(collector),
            Some(ProcessState::Receiving(mailbox))
        );

        let log = log_of(&scheduler, collector);
        let values: Vec<_> = log.iter().map(|(_, _, v)| *v).collect();
        assert_eq!(values, vec![0, 1, 2, 3]);
        let times: Vec<_> = log.iter().map(|(t, _, _)| *t).collect();
        assert_eq!(times, vec![0.5, 1.0, 1.5, 2.0]);
        assert_eq!(scheduler.mailbox(mailbox).unwrap().delivered(), 4);
    }

    #[test]
    fn horizon_discards_later_events() {
        let mut scheduler = Scheduler::new();
        let mailbox = scheduler.add_mailbox();
        let collector = scheduler.spawn(collector(mailbox));
        scheduler.spawn(emitter(Address::Mailbox(mailbox), 1.0, 100));

        let summary = scheduler.run_until(time(3.0)).unwrap();

        assert_eq!(summary.halt, Halt::Horizon);
        assert_eq!(summary.now, time(3.0));
        // the emitter's next timer (t=4) was pending
        assert_eq!(summary.discarded, 1);
        assert_eq!(scheduler.pending(), 0);

        // events at exactly the horizon are processed
        let log = log_of(&scheduler, collector);
        assert_eq!(log.len(), 3);
        assert_eq!(log.last().map(|(t, _, v)| (*t, *v)), Some((3.0, 2)));
    }

    #[test]
    fn zero_delay_defers_delivery() {
        let mut scheduler = Scheduler::new();
        let mailbox = scheduler.add_mailbox();
        let collector = scheduler.spawn(collector(mailbox));

        // collector starts and suspends on the mailbox
        assert!(scheduler.step().unwrap());
        assert_eq!(
            scheduler.state(collector),
            Some(ProcessState::Receiving(mailbox))
        );

        scheduler.send(Address::Mailbox(mailbox), 7).unwrap();
        // not delivered synchronously
        assert!(log_of(&scheduler, collector).is_empty());
        assert_eq!(scheduler.pending(), 1);

        assert!(scheduler.step().unwrap());
        assert_eq!(log_of(&scheduler, collector), vec![(0.0, "collector", 7)]);
    }

    #[test]
    fn ties_resume_in_registration_order() {
        let mut scheduler = Scheduler::new();
        let mailbox = scheduler.add_mailbox();
        let collector = scheduler.spawn(collector(mailbox));
        // both fire at t=1; the first spawned schedules its timer first
        scheduler.spawn(emitter(Address::Mailbox(mailbox), 1.0, 1));
        let second = scheduler.add_router(Tag {
            next: Address::Mailbox(mailbox),
            tag: 100,
        });
        scheduler.spawn(emitter(Address::Router(second), 1.0, 1));

        scheduler.run().unwrap();

        let values: Vec<_> = log_of(&scheduler, collector)
            .iter()
            .map(|(_, _, v)| *v)
            .collect();
        assert_eq!(values, vec![0, 100]);
    }

    #[test]
    fn routers_chain_synchronously() {
        let mut scheduler = Scheduler::new();
        let mailbox = scheduler.add_mailbox();
        let collector = scheduler.spawn(collector(mailbox));
        let inner = scheduler.add_router(Tag {
            next: Address::Mailbox(mailbox),
            tag: 10,
        });
        let outer = scheduler.add_router(Tag {
            next: Address::Router(inner),
            tag: 1,
        });

        scheduler.send(Address::Router(outer), 0).unwrap();
        assert_eq!(scheduler.mailbox(mailbox).unwrap().backlog(), 1);

        scheduler.run().unwrap();
        assert_eq!(log_of(&scheduler, collector), vec![(0.0, "collector", 11)]);
    }

    #[test]
    fn routing_loop_is_an_error() {
        let mut scheduler = Scheduler::<Actor>::new();
        let a = scheduler.add_router(Tag {
            next: Address::Router(RouterId::new(1)),
            tag: 0,
        });
        scheduler.add_router(Tag {
            next: Address::Router(a),
            tag: 0,
        });

        let error = scheduler.send(Address::Router(a), 0).unwrap_err();
        assert!(
            matches!(error, SimError::RoutingLoop { hops: 2 }),
            "expected RoutingLoop, got {error:?}"
        );
    }

    #[test]
    fn unknown_addresses() {
        let mut scheduler = Scheduler::<Actor>::new();

        let error = scheduler
            .send(Address::Mailbox(MailboxId::new(3)), 0)
            .unwrap_err();
        assert!(matches!(error, SimError::UnknownMailbox { .. }));

        scheduler.add_router(Tag {
            next: Address::Mailbox(MailboxId::new(0)),
            tag: 0,
        });
        let error = scheduler
            .send(Address::Router(RouterId::new(5)), 0)
            .unwrap_err();
        assert!(matches!(error, SimError::UnknownRouter { .. }));
    }

    #[test]
    fn process_error_aborts_the_run() {
        let mut scheduler = Scheduler::new();
        scheduler.spawn(emitter(Address::Mailbox(MailboxId::new(9)), 1.0, 3));

        let error = scheduler.run_until(time(5.0)).unwrap_err();
        assert!(matches!(error, SimError::UnknownMailbox { .. }));
        assert_eq!(scheduler.now(), time(1.0));
    }

    #[test]
    fn queued_messages_are_handed_out_one_step_at_a_time() {
        let mut scheduler = Scheduler::new();
        let mailbox = scheduler.add_mailbox();
        for i in 0..3 {
            scheduler.send(Address::Mailbox(mailbox), i).unwrap();
        }
        let collector = scheduler.spawn(collector(mailbox));

        let summary = scheduler.run().unwrap();
        // start + three receptions
        assert_eq!(summary.steps, 4);
        assert_eq!(log_of(&scheduler, collector).len(), 3);
        assert_eq!(scheduler.mailbox(mailbox).unwrap().peak_backlog(), 3);
    }
}
