/// Identifies one armed tick. A ticket only fires while it is still the
/// scheduler's current one; cancelling or re-arming invalidates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickTicket(u64);

#[derive(Debug, Clone, Copy)]
struct Pending {
    ticket: TickTicket,
    due_ns: u64,
}

/// Single-slot scheduler for the digit presentation interval.
#[derive(Debug, Default)]
pub struct TickScheduler {
    generation: u64,
    pending: Option<Pending>,
}

impl TickScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms a tick `interval_ns` after `now_ns`, replacing any pending one.
    pub fn arm(&mut self, now_ns: u64, interval_ns: u64) -> TickTicket {
        self.generation += 1;
        let ticket = TickTicket(self.generation);
        self.pending = Some(Pending {
            ticket,
            due_ns: now_ns.saturating_add(interval_ns),
        });
        ticket
    }

    pub fn cancel(&mut self) {
        if self.pending.take().is_some() {
            tracing::trace!(generation = self.generation, "tick cancelled");
        }
    }

    /// Returns the pending ticket once its deadline has passed, disarming it.
    pub fn poll(&mut self, now_ns: u64) -> Option<TickTicket> {
        match self.pending {
            Some(p) if now_ns >= p.due_ns => {
                self.pending = None;
                Some(p.ticket)
            }
            _ => None,
        }
    }

    /// Consumes `ticket` if it is the pending one. Stale tickets are refused.
    pub fn claim(&mut self, ticket: TickTicket) -> bool {
        match self.pending {
            Some(p) if p.ticket == ticket => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    pub fn deadline(&self) -> Option<u64> {
        self.pending.map(|p| p.due_ns)
    }

    pub fn current(&self) -> Option<TickTicket> {
        self.pending.map(|p| p.ticket)
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }
}
