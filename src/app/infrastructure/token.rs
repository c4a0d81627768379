//! Tickets for results that arrive after the UI has moved on.
//!
//! A style load takes a [`Supersede`] ticket: its result is only applied if
//! no newer load has started since. Geocoding lookups go through [`InOrder`]
//! instead, where every request counts and results are released in the order
//! the requests were made.

use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub fn value(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct Supersede {
    latest: u64,
}

impl Supersede {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new ticket, invalidating every ticket issued before it.
    pub fn issue(&mut self) -> Ticket {
        self.latest += 1;
        Ticket(self.latest)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.latest
    }
}

/// Pending requests whose results are released in issue order.
///
/// A result that lands early is held until every request issued before it
/// has completed. Cancelled tickets are forgotten, so their results are
/// refused when they arrive.
#[derive(Debug)]
pub struct InOrder<T> {
    latest: u64,
    pending: VecDeque<(Ticket, Option<T>)>,
}

impl<T> Default for InOrder<T> {
    fn default() -> Self {
        Self {
            latest: 0,
            pending: VecDeque::new(),
        }
    }
}

impl<T> InOrder<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self) -> Ticket {
        self.latest += 1;
        let ticket = Ticket(self.latest);
        self.pending.push_back((ticket, None));
        ticket
    }

    /// Record the result for `ticket` and release everything now ready.
    ///
    /// Returns `None` when the ticket is unknown or was cancelled.
    pub fn complete(&mut self, ticket: Ticket, result: T) -> Option<Vec<T>> {
        let slot = self
            .pending
            .iter_mut()
            .find(|(pending, done)| *pending == ticket && done.is_none())?;
        slot.1 = Some(result);

        let mut ready = Vec::new();
        while matches!(self.pending.front(), Some((_, Some(_)))) {
            if let Some((_, Some(result))) = self.pending.pop_front() {
                ready.push(result);
            }
        }
        Some(ready)
    }

    /// Forget every pending request. Tickets keep counting up.
    pub fn cancel_all(&mut self) -> usize {
        let cancelled = self.pending.len();
        self.pending.clear();
        cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_ticket_is_current() {
        let mut token = Supersede::new();
        let t = token.issue();
        assert!(token.is_current(t));
    }

    #[test]
    fn test_newer_ticket_supersedes_older() {
        let mut token = Supersede::new();
        let first = token.issue();
        let second = token.issue();
        assert!(!token.is_current(first));
        assert!(token.is_current(second));
        assert!(second > first);
    }

    #[test]
    fn test_in_order_holds_early_results() {
        let mut queue = InOrder::new();
        let first = queue.issue();
        let second = queue.issue();
        let third = queue.issue();

        assert_eq!(queue.complete(third, "c"), Some(vec![]));
        assert_eq!(queue.complete(second, "b"), Some(vec![]));
        assert_eq!(queue.complete(first, "a"), Some(vec!["a", "b", "c"]));
        assert_eq!(queue.cancel_all(), 0);
    }

    #[test]
    fn test_in_order_refuses_cancelled_and_repeated_tickets() {
        let mut queue = InOrder::new();
        let first = queue.issue();
        assert_eq!(queue.complete(first, 1), Some(vec![1]));
        assert_eq!(queue.complete(first, 1), None);

        let second = queue.issue();
        assert_eq!(queue.cancel_all(), 1);
        assert_eq!(queue.complete(second, 2), None);

        let third = queue.issue();
        assert!(third > second);
        assert_eq!(queue.complete(third, 3), Some(vec![3]));
    }
}
