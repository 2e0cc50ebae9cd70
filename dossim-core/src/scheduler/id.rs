use std::fmt;

macro_rules! index_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(usize);

        impl $name {
            pub(crate) const fn new(index: usize) -> Self {
                Self(index)
            }

            #[inline]
            pub(crate) fn index(self) -> usize {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

index_id!(
    /// The identifier of a process registered with a [`Scheduler`].
    ///
    /// [`Scheduler`]: crate::scheduler::Scheduler
    ProcessId,
    "process#"
);

index_id!(
    /// The identifier of a [`Mailbox`].
    ///
    /// [`Mailbox`]: crate::scheduler::Mailbox
    MailboxId,
    "mailbox#"
);

index_id!(
    /// The identifier of a [`Router`] registered with a [`Scheduler`].
    ///
    /// [`Router`]: crate::scheduler::Router
    /// [`Scheduler`]: crate::scheduler::Scheduler
    RouterId,
    "router#"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn print() {
        assert_eq!(ProcessId::new(3).to_string(), "process#3");
        assert_eq!(MailboxId::new(0).to_string(), "mailbox#0");
        assert_eq!(RouterId::new(12).to_string(), "router#12");
    }

    #[test]
    fn index() {
        assert_eq!(ProcessId::new(42).index(), 42);
        assert!(MailboxId::new(1) < MailboxId::new(2));
    }
}
