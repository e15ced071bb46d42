use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::time::Instant;

/// Deadline-ordered queue of deferred work that can be cancelled as a
/// whole.
///
/// The owner polls it from its event loop; nothing runs on its own thread.
/// Items sit in slots indexed by the heap entries, so entries sharing a
/// deadline fire in scheduling order.
#[derive(Debug)]
pub struct DeferredQueue<T> {
    heap: BinaryHeap<Reverse<(Instant, usize)>>,
    items: Vec<Option<T>>,
}

impl<T> Default for DeferredQueue<T> {
    fn default() -> Self {
        Self {
            heap: BinaryHeap::new(),
            items: Vec::new(),
        }
    }
}

impl<T> DeferredQueue<T> {
    pub fn schedule(&mut self, due: Instant, item: T) {
        let slot = self.items.len();
        self.items.push(Some(item));
        self.heap.push(Reverse((due, slot)));
    }

    /// Pop every entry whose deadline is at or before `now`, in deadline
    /// order.
    pub fn poll(&mut self, now: Instant) -> Vec<T> {
        let mut due = Vec::new();
        while let Some(Reverse((deadline, slot))) = self.heap.peek().copied() {
            if deadline > now {
                break;
            }
            self.heap.pop();
            if let Some(item) = self.items.get_mut(slot).and_then(Option::take) {
                due.push(item);
            }
        }
        if self.heap.is_empty() {
            self.items.clear();
        }
        due
    }

    /// Drop everything still pending. Returns how many entries were dropped.
    pub fn cancel_all(&mut self) -> usize {
        let cancelled = self.len();
        self.heap.clear();
        self.items.clear();
        cancelled
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.heap.peek().map(|Reverse((deadline, _))| *deadline)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn nothing_fires_before_deadline() {
        let start = Instant::now();
        let mut queue = DeferredQueue::default();
        queue.schedule(start + Duration::from_millis(1000), "a");
        assert!(queue.poll(start + Duration::from_millis(999)).is_empty());
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.poll(start + Duration::from_millis(1000)), vec!["a"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn same_deadline_keeps_schedule_order() {
        let start = Instant::now();
        let due = start + Duration::from_secs(1);
        let mut queue = DeferredQueue::default();
        queue.schedule(due, 1);
        queue.schedule(due, 2);
        queue.schedule(due, 3);
        assert_eq!(queue.poll(due), vec![1, 2, 3]);
    }

    #[test]
    fn earlier_deadline_fires_first() {
        let start = Instant::now();
        let mut queue = DeferredQueue::default();
        queue.schedule(start + Duration::from_secs(2), "late");
        queue.schedule(start + Duration::from_secs(1), "early");
        assert_eq!(queue.next_deadline(), Some(start + Duration::from_secs(1)));
        assert_eq!(queue.poll(start + Duration::from_secs(5)), vec!["early", "late"]);
    }

    #[test]
    fn cancel_all_drops_pending_entries() {
        let start = Instant::now();
        let mut queue = DeferredQueue::default();
        queue.schedule(start, "stale");
        queue.schedule(start, "stale too");
        assert_eq!(queue.cancel_all(), 2);
        assert!(queue.poll(start + Duration::from_secs(10)).is_empty());
        assert_eq!(queue.next_deadline(), None);

        queue.schedule(start, "fresh");
        assert_eq!(queue.poll(start), vec!["fresh"]);
    }

    #[test]
    fn len_counts_only_unfired_entries() {
        let start = Instant::now();
        let mut queue = DeferredQueue::default();
        queue.schedule(start + Duration::from_secs(1), "a");
        queue.schedule(start + Duration::from_secs(2), "b");
        assert_eq!(queue.poll(start + Duration::from_secs(1)), vec!["a"]);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.cancel_all(), 1);
        assert!(queue.is_empty());
    }
}
