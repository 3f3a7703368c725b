/// TS 04.06 clause 3.8.1 supervisory function bits
/// Bits: 2
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SFrameType {
    /// Receive ready
    Rr = 0,
    /// Receive not ready
    Rnr = 1,
    /// Reject
    Rej = 2,
}

impl std::convert::TryFrom<u64> for SFrameType {
    type Error = ();
    fn try_from(x: u64) -> Result<Self, Self::Error> {
        match x {
            0 => Ok(SFrameType::Rr),
            1 => Ok(SFrameType::Rnr),
            2 => Ok(SFrameType::Rej),
            _ => Err(()),
        }
    }
}

impl SFrameType {
    /// Convert this enum back into the raw integer value
    pub fn into_raw(self) -> u64 {
        self as u64
    }
}

impl From<SFrameType> for u64 {
    fn from(e: SFrameType) -> Self { e.into_raw() }
}

impl core::fmt::Display for SFrameType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SFrameType::Rr => write!(f, "RR"),
            SFrameType::Rnr => write!(f, "RNR"),
            SFrameType::Rej => write!(f, "REJ"),
        }
    }
}
