use super::{MailboxId, ProcessId, SimError};
use std::collections::VecDeque;

/// Unbounded FIFO handoff queue between processes.
///
/// Sending never blocks and never fails: the queue grows without limit
/// instead of modelling backpressure. A mailbox has a single receiver;
/// while that receiver is suspended on it, the next message sent is handed
/// straight to the receiver instead of being queued.
#[derive(Debug)]
pub struct Mailbox<M> {
    id: MailboxId,

    queue: VecDeque<M>,

    /// the receiver currently suspended on this mailbox
    waiting: Option<ProcessId>,

    delivered: u64,
    peak_backlog: usize,
}

impl<M> Mailbox<M> {
    pub(crate) fn new(id: MailboxId) -> Self {
        Self {
            id,
            queue: VecDeque::new(),
            waiting: None,
            delivered: 0,
            peak_backlog: 0,
        }
    }

    #[inline]
    pub fn id(&self) -> MailboxId {
        self.id
    }

    /// number of messages waiting to be received
    #[inline]
    pub fn backlog(&self) -> usize {
        self.queue.len()
    }

    /// largest backlog observed since the mailbox was created
    #[inline]
    pub fn peak_backlog(&self) -> usize {
        self.peak_backlog
    }

    /// total number of messages ever sent to this mailbox
    #[inline]
    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    /// the process currently suspended on this mailbox, if any
    #[inline]
    pub fn waiting(&self) -> Option<ProcessId> {
        self.waiting
    }

    /// Accept `msg`.
    ///
    /// If a receiver is waiting, the message is returned together with the
    /// receiver so the scheduler can wake it up; otherwise it is queued.
    pub(crate) fn put(&mut self, msg: M) -> Option<(ProcessId, M)> {
        self.delivered += 1;

        if let Some(receiver) = self.waiting.take() {
            return Some((receiver, msg));
        }

        self.queue.push_back(msg);
        self.peak_backlog = self.peak_backlog.max(self.queue.len());
        None
    }

    /// Take the oldest message on behalf of `receiver`.
    ///
    /// Returns `Ok(None)` and registers `receiver` as waiting when the
    /// mailbox is empty.
    ///
    /// # Errors
    ///
    /// [`SimError::MailboxBusy`] if another process is already waiting.
    pub(crate) fn take(&mut self, receiver: ProcessId) -> Result<Option<M>, SimError> {
        if let Some(waiting) = self.waiting
            && waiting != receiver
        {
            return Err(SimError::MailboxBusy {
                mailbox: self.id,
                receiver: waiting,
            });
        }

        match self.queue.pop_front() {
            Some(msg) => Ok(Some(msg)),
            None => {
                self.waiting = Some(receiver);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECEIVER: ProcessId = ProcessId::new(0);

    #[test]
    fn fifo() {
        let mut mailbox = Mailbox::new(MailboxId::new(0));

        for i in 0..5 {
            assert!(mailbox.put(i).is_none());
        }
        assert_eq!(mailbox.backlog(), 5);
        assert_eq!(mailbox.peak_backlog(), 5);

        for i in 0..5 {
            assert_eq!(mailbox.take(RECEIVER).unwrap(), Some(i));
        }
        assert_eq!(mailbox.backlog(), 0);
        assert_eq!(mailbox.peak_backlog(), 5);
        assert_eq!(mailbox.delivered(), 5);
    }

    #[test]
    fn waiting_receiver_gets_message_directly() {
        let mut mailbox = Mailbox::new(MailboxId::new(0));

        assert_eq!(mailbox.take(RECEIVER).unwrap(), None);
        assert_eq!(mailbox.waiting(), Some(RECEIVER));

        assert_eq!(mailbox.put("hello"), Some((RECEIVER, "hello")));
        assert_eq!(mailbox.waiting(), None);
        assert_eq!(mailbox.backlog(), 0);
        assert_eq!(mailbox.peak_backlog(), 0);
        assert_eq!(mailbox.delivered(), 1);

        // nobody waits anymore: the next one is queued
        assert!(mailbox.put("world").is_none());
        assert_eq!(mailbox.backlog(), 1);
    }

    #[test]
    fn second_receiver_is_rejected() {
        let mut mailbox = Mailbox::<()>::new(MailboxId::new(7));

        assert_eq!(mailbox.take(RECEIVER).unwrap(), None);
        // the same receiver asking again is fine
        assert_eq!(mailbox.take(RECEIVER).unwrap(), None);

        let error = mailbox.take(ProcessId::new(1)).unwrap_err();
        assert!(
            matches!(
                error,
                SimError::MailboxBusy {
                    receiver: RECEIVER,
                    ..
                }
            ),
            "expected MailboxBusy, got {error:?}"
        );
    }
}
