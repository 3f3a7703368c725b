use std::time::Duration;

use thiserror::Error;

/// Stable reference to a timer slot. The generation makes handles of freed slots harmless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle {
    index: u32,
    generation: u32,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimerError {
    #[error("timer handle {0:?} does not refer to an allocated timer")]
    StaleHandle(TimerHandle),
    #[error("periodic timer needs a nonzero period")]
    ZeroPeriod,
}

#[derive(Debug)]
enum SlotState<D> {
    Free,
    Idle,
    Armed {
        deadline: Duration,
        period: Option<Duration>,
        /// Order of scheduling, breaks ties between equal deadlines
        seq: u64,
        data: D,
    },
}

#[derive(Debug)]
struct Slot<D> {
    generation: u32,
    state: SlotState<D>,
}

/// One-shot and periodic wall-clock timers, driven by a monotonic time since stack start.
/// Timers only fire from `timer_tick`, so callbacks run in the caller's (main loop) context.
#[derive(Debug)]
pub struct TimerRegistry<D> {
    slots: Vec<Slot<D>>,
    free: Vec<u32>,
    now: Duration,
    next_seq: u64,
}

impl<D: Clone> Default for TimerRegistry<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Clone> TimerRegistry<D> {
    pub fn new() -> Self {
        TimerRegistry {
            slots: Vec::new(),
            free: Vec::new(),
            now: Duration::ZERO,
            next_seq: 0,
        }
    }

    /// Allocate a timer slot. The timer is not armed.
    pub fn alloc(&mut self) -> TimerHandle {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.state = SlotState::Idle;
            return TimerHandle { index, generation: slot.generation };
        }
        self.slots.push(Slot { generation: 0, state: SlotState::Idle });
        TimerHandle { index: (self.slots.len() - 1) as u32, generation: 0 }
    }

    /// Release a timer slot, cancelling it if armed. Stale handles are ignored.
    pub fn release(&mut self, handle: TimerHandle) {
        if let Some(slot) = self.slot_mut(handle) {
            slot.state = SlotState::Free;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(handle.index);
        }
    }

    /// Arm a one-shot timer `delay` after the last tick time. Re-arming replaces the previous schedule.
    pub fn timer_schedule(&mut self, handle: TimerHandle, delay: Duration, data: D) -> Result<(), TimerError> {
        self.arm(handle, delay, None, data)
    }

    /// Arm a periodic timer, firing every `period` until cancelled
    pub fn timer_schedule_periodic(&mut self, handle: TimerHandle, period: Duration, data: D) -> Result<(), TimerError> {
        if period.is_zero() {
            return Err(TimerError::ZeroPeriod);
        }
        self.arm(handle, period, Some(period), data)
    }

    /// Disarm a timer. Returns whether it was armed. Cancelling a fired, cancelled
    /// or stale timer is a no-op.
    pub fn timer_cancel(&mut self, handle: TimerHandle) -> bool {
        match self.slot_mut(handle) {
            Some(slot) if matches!(slot.state, SlotState::Armed { .. }) => {
                slot.state = SlotState::Idle;
                true
            }
            _ => false,
        }
    }

    pub fn is_armed(&self, handle: TimerHandle) -> bool {
        self.slots
            .get(handle.index as usize)
            .is_some_and(|slot| slot.generation == handle.generation && matches!(slot.state, SlotState::Armed { .. }))
    }

    /// Earliest deadline of all armed timers
    pub fn next_deadline(&self) -> Option<Duration> {
        self.slots
            .iter()
            .filter_map(|slot| match slot.state {
                SlotState::Armed { deadline, .. } => Some(deadline),
                _ => None,
            })
            .min()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    /// Advance time to `now` and invoke `callback` for every expired timer, in deadline order.
    /// One-shot timers are disarmed before their callback runs. Returns the number of timers fired.
    pub fn timer_tick<F: FnMut(TimerHandle, D)>(&mut self, now: Duration, mut callback: F) -> usize {
        if now > self.now {
            self.now = now;
        }

        let mut expired: Vec<(Duration, u64, u32)> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| match slot.state {
                SlotState::Armed { deadline, seq, .. } if deadline <= self.now => Some((deadline, seq, index as u32)),
                _ => None,
            })
            .collect();
        expired.sort_unstable();

        for (_, _, index) in expired.iter() {
            let now = self.now;
            let seq = self.take_seq();
            let slot = &mut self.slots[*index as usize];
            let handle = TimerHandle { index: *index, generation: slot.generation };
            let data = match std::mem::replace(&mut slot.state, SlotState::Idle) {
                SlotState::Armed { deadline, period: Some(period), data, .. } => {
                    // Periodic timers do not catch up on missed periods
                    let mut next = deadline + period;
                    if next <= now {
                        next = now + period;
                    }
                    slot.state = SlotState::Armed { deadline: next, period: Some(period), seq, data: data.clone() };
                    data
                }
                SlotState::Armed { data, .. } => data,
                other => {
                    slot.state = other;
                    continue;
                }
            };
            tracing::trace!("timer {:?} fired at {:?}", handle, now);
            callback(handle, data);
        }
        expired.len()
    }

    fn arm(&mut self, handle: TimerHandle, delay: Duration, period: Option<Duration>, data: D) -> Result<(), TimerError> {
        let deadline = self.now + delay;
        let seq = self.take_seq();
        let Some(slot) = self.slot_mut(handle) else {
            return Err(TimerError::StaleHandle(handle));
        };
        slot.state = SlotState::Armed { deadline, period, seq, data };
        Ok(())
    }

    fn take_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    fn slot_mut(&mut self, handle: TimerHandle) -> Option<&mut Slot<D>> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation && !matches!(slot.state, SlotState::Free))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_one_shot_fires_once() {
        let mut reg = TimerRegistry::new();
        let h = reg.alloc();
        reg.timer_schedule(h, ms(100), 7u32).unwrap();

        let mut fired = Vec::new();
        assert_eq!(reg.timer_tick(ms(99), |h, d| fired.push((h, d))), 0);
        assert_eq!(reg.timer_tick(ms(100), |h, d| fired.push((h, d))), 1);
        assert_eq!(reg.timer_tick(ms(500), |h, d| fired.push((h, d))), 0);
        assert_eq!(fired, vec![(h, 7)]);
        assert!(!reg.is_armed(h));
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut reg = TimerRegistry::new();
        let h = reg.alloc();
        reg.timer_schedule(h, ms(10), ()).unwrap();

        let mut count = 0;
        reg.timer_tick(ms(10), |_, _| count += 1);
        assert_eq!(count, 1);

        // Already fired
        assert!(!reg.timer_cancel(h));
        // Cancel before expiry, twice
        reg.timer_schedule(h, ms(10), ()).unwrap();
        assert!(reg.timer_cancel(h));
        assert!(!reg.timer_cancel(h));
        reg.timer_tick(ms(100), |_, _| count += 1);
        assert_eq!(count, 1);
    }

    #[test]
    fn test_stale_handle() {
        let mut reg = TimerRegistry::new();
        let h = reg.alloc();
        reg.timer_schedule(h, ms(10), 1u8).unwrap();
        reg.release(h);

        // Slot is reused, the old handle must not touch the new timer
        let h2 = reg.alloc();
        assert_ne!(h, h2);
        reg.timer_schedule(h2, ms(10), 2u8).unwrap();
        assert!(!reg.timer_cancel(h));
        assert_eq!(reg.timer_schedule(h, ms(10), 3u8), Err(TimerError::StaleHandle(h)));

        let mut fired = Vec::new();
        reg.timer_tick(ms(10), |_, d| fired.push(d));
        assert_eq!(fired, vec![2]);
    }

    #[test]
    fn test_deadline_then_insertion_order() {
        let mut reg = TimerRegistry::new();
        let a = reg.alloc();
        let b = reg.alloc();
        let c = reg.alloc();
        reg.timer_schedule(c, ms(20), 'c').unwrap();
        reg.timer_schedule(b, ms(10), 'b').unwrap();
        reg.timer_schedule(a, ms(10), 'a').unwrap();
        assert_eq!(reg.next_deadline(), Some(ms(10)));

        let mut fired = String::new();
        reg.timer_tick(ms(30), |_, d| fired.push(d));
        assert_eq!(fired, "bac");
    }

    #[test]
    fn test_periodic() {
        let mut reg = TimerRegistry::new();
        let h = reg.alloc();
        reg.timer_schedule_periodic(h, ms(100), ()).unwrap();

        let mut count = 0;
        for t in (0..=1000).step_by(10) {
            reg.timer_tick(ms(t), |_, _| count += 1);
        }
        assert_eq!(count, 10);
        assert!(reg.is_armed(h));

        // A late tick fires once and does not catch up
        reg.timer_tick(ms(5000), |_, _| count += 1);
        assert_eq!(count, 11);
        assert_eq!(reg.next_deadline(), Some(ms(5100)));

        assert!(reg.timer_cancel(h));
        assert_eq!(reg.timer_schedule_periodic(h, Duration::ZERO, ()), Err(TimerError::ZeroPeriod));
    }
}
