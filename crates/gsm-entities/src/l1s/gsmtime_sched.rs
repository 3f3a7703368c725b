use gsm_core::FrameNumber;

/// Identifier of a scheduled one-shot event, usable for cancellation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventId(u64);

#[derive(Debug)]
struct GsmTimeEvent<T> {
    target: FrameNumber,
    id: EventId,
    item: T,
}

/// One-shot events keyed by frame number. Events are kept ordered by target frame,
/// events with the same target keep their insertion order.
#[derive(Debug)]
pub struct GsmTimeScheduler<T> {
    events: Vec<GsmTimeEvent<T>>,
    next_id: u64,
}

impl<T> Default for GsmTimeScheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> GsmTimeScheduler<T> {
    pub fn new() -> Self {
        GsmTimeScheduler { events: Vec::new(), next_id: 0 }
    }

    /// Schedule `item` to fire at the first tick whose frame number is at or after `target`.
    /// `now` is the current frame, used to order targets across the hyperframe wrap.
    pub fn schedule(&mut self, now: FrameNumber, target: FrameNumber, item: T) -> EventId {
        let id = EventId(self.next_id);
        self.next_id += 1;

        let dist = target.diff(now);
        let pos = self.events.partition_point(|ev| ev.target.diff(now) <= dist);
        self.events.insert(pos, GsmTimeEvent { target, id, item });
        id
    }

    /// Remove and return all events due at `now`, in firing order
    pub fn pop_due(&mut self, now: FrameNumber) -> Vec<(FrameNumber, T)> {
        let due = self.events.partition_point(|ev| now.reached(ev.target));
        self.events.drain(..due).map(|ev| (ev.target, ev.item)).collect()
    }

    pub fn cancel(&mut self, id: EventId) -> Option<T> {
        let pos = self.events.iter().position(|ev| ev.id == id)?;
        Some(self.events.remove(pos).item)
    }

    /// Drop all events with a target before `to`, without firing them.
    /// Used when the frame clock skipped forward. Returns the number of dropped events.
    pub fn drop_before(&mut self, to: FrameNumber) -> usize {
        let before = self.events.len();
        self.events.retain(|ev| ev.target.reached(to));
        before - self.events.len()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gsm_core::gsm_time::GSM_HYPERFRAME;

    #[test]
    fn test_order_and_fire_once() {
        let now = FrameNumber::new(100);
        let mut sched = GsmTimeScheduler::new();
        sched.schedule(now, FrameNumber::new(110), "b");
        sched.schedule(now, FrameNumber::new(105), "a");
        sched.schedule(now, FrameNumber::new(110), "c");

        assert!(sched.pop_due(FrameNumber::new(104)).is_empty());
        assert_eq!(sched.pop_due(FrameNumber::new(105)), vec![(FrameNumber::new(105), "a")]);
        let due: Vec<_> = sched.pop_due(FrameNumber::new(120)).into_iter().map(|(_, i)| i).collect();
        assert_eq!(due, vec!["b", "c"]);
        assert!(sched.pop_due(FrameNumber::new(200)).is_empty());
    }

    #[test]
    fn test_wraparound() {
        let now = FrameNumber::new(GSM_HYPERFRAME - 2);
        let mut sched = GsmTimeScheduler::new();
        sched.schedule(now, FrameNumber::new(1), 2);
        sched.schedule(now, FrameNumber::new(GSM_HYPERFRAME - 1), 1);

        assert_eq!(sched.pop_due(now).len(), 0);
        assert_eq!(sched.pop_due(now.next()), vec![(FrameNumber::new(GSM_HYPERFRAME - 1), 1)]);
        assert_eq!(sched.pop_due(FrameNumber::new(0)).len(), 0);
        assert_eq!(sched.pop_due(FrameNumber::new(1)), vec![(FrameNumber::new(1), 2)]);
    }

    #[test]
    fn test_cancel_and_drop() {
        let now = FrameNumber::new(0);
        let mut sched = GsmTimeScheduler::new();
        let id = sched.schedule(now, FrameNumber::new(10), 1);
        sched.schedule(now, FrameNumber::new(20), 2);
        sched.schedule(now, FrameNumber::new(30), 3);
        assert_eq!(sched.cancel(id), Some(1));
        assert_eq!(sched.cancel(id), None);

        // Clock jumped from 1 to 25: the event at 20 lies in the gap
        assert_eq!(sched.drop_before(FrameNumber::new(25)), 1);
        assert_eq!(sched.len(), 1);
        assert!(sched.pop_due(FrameNumber::new(25)).is_empty());
        assert_eq!(sched.pop_due(FrameNumber::new(30)), vec![(FrameNumber::new(30), 3)]);
    }
}
