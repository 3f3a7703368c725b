use core::fmt;

/// Number of TDMA frames in a hyperframe. Frame numbers wrap back to 0 here.
pub const GSM_HYPERFRAME: u32 = 26 * 51 * 2048;

/// Frames in a 26-multiframe (traffic channels)
pub const MF26: u32 = 26;
/// Frames in a 51-multiframe (broadcast, common and dedicated signalling channels)
pub const MF51: u32 = 51;
/// Frames in a superframe, the smallest period common to both multiframe types
pub const SUPERFRAME: u32 = MF26 * MF51;

/// Nominal duration of a TDMA frame in microseconds (120ms / 26)
pub const FRAME_DURATION_US: u64 = 4615;

/// Difference between two raw frame numbers, handling wrap-around at the hyperframe boundary.
/// Result lies in [-GSM_HYPERFRAME/2, GSM_HYPERFRAME/2).
pub fn fn_diff(a: u32, b: u32) -> i32 {
    let h = GSM_HYPERFRAME as i64;
    let diff = (a as i64 - b as i64 + h / 2).rem_euclid(h) - h / 2;
    diff as i32
}

/// Absolute TDMA frame number within a hyperframe, 0..=2715647
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FrameNumber(u32);

impl FrameNumber {
    pub const MAX: u32 = GSM_HYPERFRAME - 1;

    /// Constructs a FrameNumber, wrapping values beyond the hyperframe
    pub const fn new(fnr: u32) -> Self {
        FrameNumber(fnr % GSM_HYPERFRAME)
    }

    #[inline(always)]
    pub fn get(self) -> u32 {
        self.0
    }

    /// Add a (possibly negative) number of frames
    pub fn add_frames(self, num_frames: i32) -> FrameNumber {
        let v = (self.0 as i64 + num_frames as i64).rem_euclid(GSM_HYPERFRAME as i64);
        FrameNumber(v as u32)
    }

    #[inline(always)]
    pub fn next(self) -> FrameNumber {
        self.add_frames(1)
    }

    /// Signed distance self - b in frames, wrap-around safe
    pub fn diff(self, b: FrameNumber) -> i32 {
        fn_diff(self.0, b.0)
    }

    /// True if this frame number is equal to or later than `target`.
    /// Only meaningful for distances below half a hyperframe.
    #[inline(always)]
    pub fn reached(self, target: FrameNumber) -> bool {
        self.diff(target) >= 0
    }

    #[inline(always)]
    pub fn modulo(self, m: u32) -> u32 {
        self.0 % m
    }

    /// Position within the 26-multiframe
    pub fn t2(self) -> u8 {
        (self.0 % MF26) as u8
    }

    /// Position within the 51-multiframe
    pub fn t3(self) -> u8 {
        (self.0 % MF51) as u8
    }

    pub fn to_gsm_time(self) -> GsmTime {
        GsmTime::from_fn(self)
    }
}

impl fmt::Display for FrameNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:7}", self.0)
    }
}

impl fmt::Debug for FrameNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn={}", self.0)
    }
}

impl From<u32> for FrameNumber {
    fn from(fnr: u32) -> Self {
        FrameNumber::new(fnr)
    }
}

/// GSM time in multiframe coordinates, TS 05.02 clause 4.3.3
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct GsmTime {
    pub fnr: FrameNumber,
    /// Superframe counter, 0..2047
    pub t1: u16,
    /// Position in 26-multiframe, 0..25
    pub t2: u8,
    /// Position in 51-multiframe, 0..50
    pub t3: u8,
    /// TC, 51-multiframe counter modulo 8 (BCCH Norm/Ext rotation)
    pub tc: u8,
}

impl GsmTime {
    pub fn from_fn(fnr: FrameNumber) -> GsmTime {
        let v = fnr.get();
        GsmTime {
            fnr,
            t1: (v / SUPERFRAME) as u16,
            t2: (v % MF26) as u8,
            t3: (v % MF51) as u8,
            tc: ((v / MF51) % 8) as u8,
        }
    }

    /// Computes the frame number from T1/T2/T3 as in TS 05.02 clause 4.3.3
    pub fn from_t1t2t3(t1: u16, t2: u8, t3: u8) -> GsmTime {
        let t1 = t1 as u32 % 2048;
        let t2 = t2 as u32 % MF26;
        let t3 = t3 as u32 % MF51;
        let t3_t2 = (t3 + MF26 - (t2 % MF26)) % MF26;
        let fnr = MF51 * t3_t2 + t3 + SUPERFRAME * t1;
        GsmTime::from_fn(FrameNumber::new(fnr))
    }

    /// Advance by one frame, updating coordinates incrementally
    pub fn inc(&mut self) {
        self.fnr = self.fnr.next();
        if self.fnr.get() == 0 {
            *self = GsmTime::default();
            return;
        }
        self.t2 = (self.t2 + 1) % MF26 as u8;
        self.t3 = (self.t3 + 1) % MF51 as u8;
        if self.t3 == 0 {
            self.tc = (self.tc + 1) % 8;
            if self.t2 == 0 {
                self.t1 = (self.t1 + 1) % 2048;
            }
        }
    }

    /// Decodes time and BSIC from the 25 information bits of a SCH burst, TS 05.02 clause 3.3.2.2.1.
    /// Returns (time, bsic).
    pub fn from_sch_info(sb: u32) -> (GsmTime, u8) {
        let bsic = ((sb >> 2) & 0x3f) as u8;
        let t1 = (((sb >> 23) & 1) | ((sb >> 7) & 0x1fe) | ((sb << 9) & 0x600)) as u16;
        let t2 = ((sb >> 18) & 0x1f) as u8;
        let t3p = (((sb >> 24) & 1) | ((sb >> 15) & 6)) as u8;
        // The SCH is always in a frame with T3 = 10*T3' + 1
        let t3 = t3p * 10 + 1;
        (GsmTime::from_t1t2t3(t1, t2, t3), bsic)
    }
}

impl fmt::Display for GsmTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}/{:2}/{:2})", self.fnr.get(), self.t1, self.t2, self.t3)
    }
}

impl fmt::Debug for GsmTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}/{:2}/{:2})", self.fnr.get(), self.t1, self.t2, self.t3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_frames_and_diff() {
        let initial = FrameNumber::new(0);

        let mut fnr = initial;
        // Repeat enough times that the hyperframe wraps several times
        let iterations = 100000;
        let increment = 12345;
        for _ in 0..iterations {
            let fnr2 = fnr.add_frames(increment);
            assert_eq!(fnr2.diff(fnr), increment);
            assert_eq!(fnr.diff(fnr2), -increment);
            fnr = fnr2;
        }

        // Go backwards, should end up at the start again
        for _ in 0..iterations {
            fnr = fnr.add_frames(-increment);
        }
        assert_eq!(fnr, initial);
    }

    #[test]
    fn test_wrap_at_hyperframe() {
        let last = FrameNumber::new(FrameNumber::MAX);
        assert_eq!(last.next().get(), 0);
        assert_eq!(FrameNumber::new(0).add_frames(-1).get(), FrameNumber::MAX);
        assert_eq!(FrameNumber::new(2).diff(last), 3);
        assert!(FrameNumber::new(2).reached(last));
        assert!(!last.reached(FrameNumber::new(2)));
        assert_eq!(FrameNumber::new(GSM_HYPERFRAME + 5).get(), 5);

        let half = (GSM_HYPERFRAME / 2) as i32;
        assert_eq!(fn_diff(GSM_HYPERFRAME / 2, 0), -half);
        assert_eq!(fn_diff(0, GSM_HYPERFRAME / 2), -half);
        assert_eq!(fn_diff(GSM_HYPERFRAME / 2 - 1, 0), half - 1);
    }

    #[test]
    fn test_gsm_time_inc_matches_from_fn() {
        let mut time = GsmTime::from_fn(FrameNumber::new(GSM_HYPERFRAME - 3000));
        for _ in 0..6000 {
            time.inc();
            assert_eq!(time, GsmTime::from_fn(time.fnr));
        }
    }

    #[test]
    fn test_t1t2t3_to_fn() {
        for fnr in (0..GSM_HYPERFRAME).step_by(997) {
            let time = GsmTime::from_fn(FrameNumber::new(fnr));
            let back = GsmTime::from_t1t2t3(time.t1, time.t2, time.t3);
            assert_eq!(back.fnr.get(), fnr);
        }
    }

    #[test]
    fn test_decode_sch_info() {
        // T1 = 1234, T2 = 17, T3' = 4 (T3 = 41), BSIC = 0x2a
        let t1: u32 = 1234;
        let t2: u32 = 17;
        let t3p: u32 = 4;
        let bsic: u32 = 0x2a;
        let sb = ((t1 & 1) << 23)
            | (((t1 >> 1) & 0xff) << 8)
            | ((t1 >> 9) & 3)
            | ((t2 & 0x1f) << 18)
            | ((t3p & 1) << 24)
            | (((t3p >> 1) & 3) << 16)
            | ((bsic & 0x3f) << 2);
        let (time, got_bsic) = GsmTime::from_sch_info(sb);
        assert_eq!(got_bsic, 0x2a);
        assert_eq!(time.t1, 1234);
        assert_eq!(time.t2, 17);
        assert_eq!(time.t3, 41);
    }
}
