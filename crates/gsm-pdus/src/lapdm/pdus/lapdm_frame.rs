use core::fmt;

use gsm_core::pdu_parse_error::*;
use gsm_core::MsgBuf;

use crate::lapdm::enums::lapdm_format::LapdmFormat;
use crate::lapdm::enums::s_frame_type::SFrameType;
use crate::lapdm::enums::u_frame_type::UFrameType;
use crate::lapdm::fields::address::Address;
use crate::lapdm::fields::control::Control;
use crate::lapdm::fields::length::LengthIndicator;

/// A LAPDm frame of format A, B or B4, TS 04.06 clause 2.
/// Bbis frames have no header and are handled as plain blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LapdmFrame {
    pub addr: Address,
    pub ctrl: Control,
    /// None for format B4
    pub length: Option<LengthIndicator>,
    pub info: Vec<u8>,
}

impl LapdmFrame {
    pub fn new_u(sapi: u8, cr: bool, pf: bool, u: UFrameType, info: Vec<u8>) -> Self {
        LapdmFrame {
            addr: Address::new(sapi, cr),
            ctrl: Control::U { pf, u },
            length: Some(LengthIndicator { l: info.len() as u8, m: false }),
            info,
        }
    }

    pub fn new_s(sapi: u8, cr: bool, pf: bool, s: SFrameType, nr: u8) -> Self {
        LapdmFrame {
            addr: Address::new(sapi, cr),
            ctrl: Control::S { nr, pf, s },
            length: Some(LengthIndicator { l: 0, m: false }),
            info: Vec::new(),
        }
    }

    pub fn new_i(sapi: u8, cr: bool, p: bool, ns: u8, nr: u8, more: bool, info: Vec<u8>) -> Self {
        LapdmFrame {
            addr: Address::new(sapi, cr),
            ctrl: Control::I { nr, p, ns },
            length: Some(LengthIndicator { l: info.len() as u8, m: more }),
            info,
        }
    }

    /// Parses a frame header and its information field.
    /// The information field is cut at the end of the block if L exceeds it;
    /// the raw L value is kept in `length` so the receiver can check it against N201.
    pub fn from_msgbuf(buf: &mut MsgBuf, format: LapdmFormat) -> Result<Self, PduParseErr> {
        if !format.has_header() {
            return Err(PduParseErr::Inconsistency { field: "format", reason: "Bbis frames have no header" });
        }

        let addr = Address::from_msgbuf(buf)?;
        let ctrl = Control::from_msgbuf(buf)?;

        if format.has_length() {
            let length = LengthIndicator::from_msgbuf(buf)?;
            let available = buf.len_remaining() / 8;
            let take = (length.l as usize).min(available);
            let info = buf.read_octets(take, "info")?.to_vec();
            Ok(LapdmFrame { addr, ctrl, length: Some(length), info })
        } else {
            let info = buf.remaining_octets().to_vec();
            Ok(LapdmFrame { addr, ctrl, length: None, info })
        }
    }

    /// Writes header and information field, without padding
    pub fn to_msgbuf(&self, buf: &mut MsgBuf) {
        self.addr.to_msgbuf(buf);
        self.ctrl.to_msgbuf(buf);
        if let Some(length) = self.length {
            length.to_msgbuf(buf);
        }
        buf.write_octets(&self.info);
    }

    pub fn format(&self) -> LapdmFormat {
        match self.length {
            None => LapdmFormat::B4,
            Some(_) if self.info.is_empty() => LapdmFormat::A,
            Some(_) => LapdmFormat::B,
        }
    }

    /// Value of the length indicator, or the information length for B4 frames
    pub fn l(&self) -> usize {
        self.length.map(|li| li.l as usize).unwrap_or(self.info.len())
    }

    /// The M bit
    pub fn more(&self) -> bool {
        self.length.map(|li| li.m).unwrap_or(false)
    }
}

impl fmt::Display for LapdmFrame {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.ctrl, self.addr)?;
        if let Some(length) = self.length {
            write!(f, " {}", length)?;
        }
        Ok(())
    }
}
