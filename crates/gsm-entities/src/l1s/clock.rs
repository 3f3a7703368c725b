use gsm_core::FrameNumber;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockState {
    /// No frame observed since start or reset
    Wait,
    /// Locked to the observed frame numbers
    Ok,
}

/// Result of feeding an observed frame number into the clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockEvent {
    /// First observation, the clock locked to `fnr`
    Initial { fnr: FrameNumber },
    /// Regular advance by one frame. `jitter` is the observed deviation within tolerance.
    Tick { fnr: FrameNumber, jitter: i32 },
    /// Observation outside tolerance. `from` is the frame that was expected, `to` the observed one.
    Resync { from: FrameNumber, to: FrameNumber },
}

impl ClockEvent {
    /// The frame number the clock is at after this event
    pub fn fnr(&self) -> FrameNumber {
        match *self {
            ClockEvent::Initial { fnr } => fnr,
            ClockEvent::Tick { fnr, .. } => fnr,
            ClockEvent::Resync { to, .. } => to,
        }
    }
}

/// TDMA frame clock, following the frame numbers reported by the PHY
#[derive(Debug)]
pub struct FrameClock {
    state: ClockState,
    counter: FrameNumber,
    tolerance: u32,
    /// Number of resyncs since the last reset
    lost_frames: u32,
}

impl FrameClock {
    pub fn new(tolerance: u32) -> Self {
        FrameClock {
            state: ClockState::Wait,
            counter: FrameNumber::default(),
            tolerance,
            lost_frames: 0,
        }
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    /// Current frame number, None while waiting for the first observation
    pub fn current(&self) -> Option<FrameNumber> {
        match self.state {
            ClockState::Wait => None,
            ClockState::Ok => Some(self.counter),
        }
    }

    pub fn lost_frames(&self) -> u32 {
        self.lost_frames
    }

    pub fn handle(&mut self, observed: FrameNumber) -> ClockEvent {
        match self.state {
            ClockState::Wait => {
                tracing::info!(fnr = observed.get(), "clock: initial frame number {}", observed.get());
                self.state = ClockState::Ok;
                self.counter = observed;
                ClockEvent::Initial { fnr: observed }
            }
            ClockState::Ok => {
                let expected = self.counter.next();
                let delta = observed.diff(expected);
                if delta.unsigned_abs() <= self.tolerance {
                    if delta != 0 {
                        tracing::debug!(fnr = expected.get(), "clock: jitter {} frames", delta);
                    }
                    // Within tolerance the clock still advances by exactly one frame
                    self.counter = expected;
                    ClockEvent::Tick { fnr: expected, jitter: delta }
                } else {
                    tracing::warn!(fnr = observed.get(), "clock: lost sync, expected {} got {} ({} frames)", expected.get(), observed.get(), delta);
                    self.lost_frames += 1;
                    self.counter = observed;
                    ClockEvent::Resync { from: expected, to: observed }
                }
            }
        }
    }

    pub fn reset(&mut self) {
        tracing::info!("clock: reset");
        self.state = ClockState::Wait;
        self.counter = FrameNumber::default();
        self.lost_frames = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gsm_core::gsm_time::GSM_HYPERFRAME;

    #[test]
    fn test_plus_one_stays_ok() {
        let mut clock = FrameClock::new(1);
        let start = GSM_HYPERFRAME - 100;
        assert_eq!(clock.handle(FrameNumber::new(start)), ClockEvent::Initial { fnr: FrameNumber::new(start) });
        for i in 1..1000 {
            let fnr = FrameNumber::new(start + i);
            assert_eq!(clock.handle(fnr), ClockEvent::Tick { fnr, jitter: 0 });
            assert_eq!(clock.state(), ClockState::Ok);
        }
        assert_eq!(clock.current(), Some(FrameNumber::new(start + 999)));
        assert_eq!(clock.lost_frames(), 0);
    }

    #[test]
    fn test_jitter_within_tolerance() {
        let mut clock = FrameClock::new(1);
        clock.handle(FrameNumber::new(100));
        // Observed one too far, counter still moves by one
        let ev = clock.handle(FrameNumber::new(102));
        assert_eq!(ev, ClockEvent::Tick { fnr: FrameNumber::new(101), jitter: 1 });
        let ev = clock.handle(FrameNumber::new(101));
        assert_eq!(ev, ClockEvent::Tick { fnr: FrameNumber::new(102), jitter: -1 });
    }

    #[test]
    fn test_resync_and_reset() {
        let mut clock = FrameClock::new(1);
        clock.handle(FrameNumber::new(100));
        let ev = clock.handle(FrameNumber::new(200));
        assert_eq!(ev, ClockEvent::Resync { from: FrameNumber::new(101), to: FrameNumber::new(200) });
        assert_eq!(clock.current(), Some(FrameNumber::new(200)));
        assert_eq!(clock.lost_frames(), 1);

        clock.reset();
        assert_eq!(clock.state(), ClockState::Wait);
        assert_eq!(clock.current(), None);
        assert!(matches!(clock.handle(FrameNumber::new(5)), ClockEvent::Initial { .. }));
    }
}
