use std::sync::atomic::{AtomicU64, Ordering};

/// Epoch captured by an asynchronous chain when it starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EpochTicket(u64);

impl EpochTicket {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Monotonic epoch counter. A chain holding a ticket from an older epoch must
/// drop its result instead of applying it.
#[derive(Debug, Default)]
pub struct RequestGuard {
    epoch: AtomicU64,
}

impl RequestGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invalidates every outstanding ticket and returns the new live one.
    pub fn advance(&self) -> EpochTicket {
        EpochTicket(self.epoch.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn capture(&self) -> EpochTicket {
        EpochTicket(self.epoch.load(Ordering::SeqCst))
    }

    pub fn is_live(&self, ticket: EpochTicket) -> bool {
        self.capture() == ticket
    }

    pub fn current(&self) -> u64 {
        self.capture().0
    }
}
