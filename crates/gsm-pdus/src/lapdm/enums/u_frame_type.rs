/// TS 04.06 clause 3.8.1 unnumbered function bits.
/// The raw value combines the modifier bits as (M bits 8..6) << 2 | (M bits 4..3).
/// Bits: 5
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum UFrameType {
    /// Unnumbered information
    Ui = 0x00,
    /// Disconnected mode
    Dm = 0x03,
    /// Set asynchronous balanced mode
    Sabm = 0x07,
    /// Disconnect
    Disc = 0x08,
    /// Unnumbered acknowledgement
    Ua = 0x0c,
}

impl std::convert::TryFrom<u64> for UFrameType {
    type Error = ();
    fn try_from(x: u64) -> Result<Self, Self::Error> {
        match x {
            0x00 => Ok(UFrameType::Ui),
            0x03 => Ok(UFrameType::Dm),
            0x07 => Ok(UFrameType::Sabm),
            0x08 => Ok(UFrameType::Disc),
            0x0c => Ok(UFrameType::Ua),
            _ => Err(()),
        }
    }
}

impl UFrameType {
    /// Convert this enum back into the raw integer value
    pub fn into_raw(self) -> u64 {
        self as u64
    }

    /// Commands carry P, responses carry F
    pub fn is_command(self) -> bool {
        matches!(self, UFrameType::Ui | UFrameType::Sabm | UFrameType::Disc)
    }
}

impl From<UFrameType> for u64 {
    fn from(e: UFrameType) -> Self { e.into_raw() }
}

impl core::fmt::Display for UFrameType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            UFrameType::Ui => write!(f, "UI"),
            UFrameType::Dm => write!(f, "DM"),
            UFrameType::Sabm => write!(f, "SABM"),
            UFrameType::Disc => write!(f, "DISC"),
            UFrameType::Ua => write!(f, "UA"),
        }
    }
}
