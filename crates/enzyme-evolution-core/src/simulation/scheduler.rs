use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

#[derive(Clone, Copy, Debug)]
struct Pending {
    time: f64,
    slot: usize,
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Pending {}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pending {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time
            .total_cmp(&other.time)
            .then(self.slot.cmp(&other.slot))
    }
}

/// Next-event-time queue over a fixed set of component slots.
///
/// Rescheduling a slot leaves its old heap entry behind; entries whose time no longer matches
/// the slot's current next time are skipped when they surface.
#[derive(Clone, Debug)]
pub struct Scheduler {
    heap: BinaryHeap<Reverse<Pending>>,
    next: Vec<f64>,
    last: Vec<f64>,
}

impl Scheduler {
    /// All slots start passive with their last event at time 0.
    pub fn new(slots: usize) -> Self {
        Self {
            heap: BinaryHeap::new(),
            next: vec![f64::INFINITY; slots],
            last: vec![0.0; slots],
        }
    }

    /// Record an event for `slot` at `now` and plan its next internal event `time_advance` later.
    pub fn schedule(&mut self, slot: usize, now: f64, time_advance: f64) {
        let time = now + time_advance;
        self.last[slot] = now;
        self.next[slot] = time;
        if time.is_finite() {
            self.heap.push(Reverse(Pending { time, slot }));
        }
    }

    /// Earliest pending event time, if any.
    pub fn next_time(&mut self) -> Option<f64> {
        while let Some(Reverse(top)) = self.heap.peek().copied() {
            if self.next[top.slot] == top.time {
                return Some(top.time);
            }
            self.heap.pop();
        }
        None
    }

    /// Remove and return every slot due at `time`, in ascending slot order.
    pub fn take_imminent(&mut self, time: f64) -> Vec<usize> {
        let mut due = Vec::new();
        while let Some(Reverse(top)) = self.heap.peek().copied() {
            if top.time > time {
                break;
            }
            self.heap.pop();
            if self.next[top.slot] == top.time && top.time == time {
                due.push(top.slot);
            }
        }
        due.sort_unstable();
        due.dedup();
        due
    }

    pub fn elapsed(&self, slot: usize, now: f64) -> f64 {
        now - self.last[slot]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn earliest_time_first_and_ties_in_slot_order() {
        let mut s = Scheduler::new(4);
        s.schedule(3, 0.0, 1.0);
        s.schedule(1, 0.0, 1.0);
        s.schedule(2, 0.0, 0.5);
        s.schedule(0, 0.0, f64::INFINITY);
        assert_eq!(s.next_time(), Some(0.5));
        assert_eq!(s.take_imminent(0.5), vec![2]);
        assert_eq!(s.next_time(), Some(1.0));
        assert_eq!(s.take_imminent(1.0), vec![1, 3]);
        assert_eq!(s.next_time(), None);
    }

    #[test]
    fn rescheduling_supersedes_old_entry() {
        let mut s = Scheduler::new(2);
        s.schedule(0, 0.0, 1.0);
        s.schedule(0, 0.5, 2.0);
        assert_eq!(s.next_time(), Some(2.5));
        assert_eq!(s.elapsed(0, 1.5), 1.0);
        s.schedule(1, 0.0, 0.25);
        s.schedule(1, 0.1, f64::INFINITY);
        assert_eq!(s.take_imminent(2.5), vec![0]);
        assert_eq!(s.next_time(), None);
    }
}
