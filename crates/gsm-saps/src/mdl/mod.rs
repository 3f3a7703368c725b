use gsm_core::{ChanNr, LinkId};

/// MDL-ERROR indication causes, TS 08.58 clause 9.3.22
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MdlCause {
    /// T200 expired (N200+1 times)
    T200Expired = 1,
    /// Re-establishment request
    ReestReq = 2,
    /// Unsolicited UA response
    UnsolUa = 3,
    /// Unsolicited DM response
    UnsolDm = 4,
    /// Unsolicited DM response, multiple frame established state
    UnsolDmMf = 5,
    /// Unsolicited supervisory response
    UnsolSprv = 6,
    /// Sequence error
    SeqErr = 7,
    /// U frame with incorrect parameters
    UfrmIncParam = 8,
    /// S frame with incorrect parameters
    SfrmIncParam = 9,
    /// I frame with incorrect use of M bit
    IfrmIncMbits = 10,
    /// I frame with incorrect length
    IfrmIncLen = 11,
    /// Frame not implemented
    FrmUnimpl = 12,
    /// SABM command, multiple frame established state
    SabmMf = 13,
    /// SABM frame with information not allowed in this state
    SabmInfoNotall = 14,
    /// FRMR received
    Frmr = 15,
}

impl std::convert::TryFrom<u64> for MdlCause {
    type Error = ();
    fn try_from(x: u64) -> Result<Self, Self::Error> {
        match x {
            1 => Ok(MdlCause::T200Expired),
            2 => Ok(MdlCause::ReestReq),
            3 => Ok(MdlCause::UnsolUa),
            4 => Ok(MdlCause::UnsolDm),
            5 => Ok(MdlCause::UnsolDmMf),
            6 => Ok(MdlCause::UnsolSprv),
            7 => Ok(MdlCause::SeqErr),
            8 => Ok(MdlCause::UfrmIncParam),
            9 => Ok(MdlCause::SfrmIncParam),
            10 => Ok(MdlCause::IfrmIncMbits),
            11 => Ok(MdlCause::IfrmIncLen),
            12 => Ok(MdlCause::FrmUnimpl),
            13 => Ok(MdlCause::SabmMf),
            14 => Ok(MdlCause::SabmInfoNotall),
            15 => Ok(MdlCause::Frmr),
            _ => Err(()),
        }
    }
}

impl MdlCause {
    /// Convert this enum back into the raw integer value
    pub fn into_raw(self) -> u64 {
        self as u64
    }
}

impl core::fmt::Display for MdlCause {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MdlCause::T200Expired => write!(f, "T200 expired (N200+1 times)"),
            MdlCause::ReestReq => write!(f, "re-establishment request"),
            MdlCause::UnsolUa => write!(f, "unsolicited UA response"),
            MdlCause::UnsolDm => write!(f, "unsolicited DM response"),
            MdlCause::UnsolDmMf => write!(f, "unsolicited DM response, multiple frame established state"),
            MdlCause::UnsolSprv => write!(f, "unsolicited supervisory response"),
            MdlCause::SeqErr => write!(f, "sequence error"),
            MdlCause::UfrmIncParam => write!(f, "U frame with incorrect parameters"),
            MdlCause::SfrmIncParam => write!(f, "S frame with incorrect parameters"),
            MdlCause::IfrmIncMbits => write!(f, "I frame with incorrect use of M bit"),
            MdlCause::IfrmIncLen => write!(f, "I frame with incorrect length"),
            MdlCause::FrmUnimpl => write!(f, "frame not implemented"),
            MdlCause::SabmMf => write!(f, "SABM command, multiple frame established state"),
            MdlCause::SabmInfoNotall => write!(f, "SABM frame with information not allowed in this state"),
            MdlCause::Frmr => write!(f, "FRMR received"),
        }
    }
}

/// MDL-ERROR indication, reported to the management entity (RR)
#[derive(Debug)]
pub struct MdlErrorInd {
    pub chan_nr: ChanNr,
    pub link_id: LinkId,
    pub cause: MdlCause,
}
