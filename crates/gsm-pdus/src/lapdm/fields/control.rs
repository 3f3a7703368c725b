use core::fmt;

use gsm_core::pdu_parse_error::*;
use gsm_core::{MsgBuf, let_field};

use crate::lapdm::enums::s_frame_type::SFrameType;
use crate::lapdm::enums::u_frame_type::UFrameType;

/// TS 04.06 clause 3.4 control field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Information transfer: N(R) P N(S) 0
    I { nr: u8, p: bool, ns: u8 },
    /// Supervisory: N(R) P/F S S 0 1
    S { nr: u8, pf: bool, s: SFrameType },
    /// Unnumbered: M M M P/F M M 1 1
    U { pf: bool, u: UFrameType },
}

impl Control {
    pub fn from_msgbuf(buf: &mut MsgBuf) -> Result<Self, PduParseErr> {
        let Some(ctrl) = buf.peek_bits(8) else {
            return Err(PduParseErr::BufferEnded { field: Some("control") });
        };

        if ctrl & 0x01 == 0 {
            let_field!(buf, nr, 3);
            let_field!(buf, p, 1);
            let_field!(buf, ns, 3);
            let_field!(buf, _i_bit, 1);
            return Ok(Control::I { nr: nr as u8, p: p != 0, ns: ns as u8 });
        }

        if ctrl & 0x03 == 0x01 {
            let_field!(buf, nr, 3);
            let_field!(buf, pf, 1);
            let_field!(buf, s_bits, 2);
            let_field!(buf, _s_id, 2);
            let Ok(s) = SFrameType::try_from(s_bits) else {
                // SREJ is not used in LAPDm
                return Err(PduParseErr::NotImplemented { field: Some("s_frame_type") });
            };
            return Ok(Control::S { nr: nr as u8, pf: pf != 0, s });
        }

        let_field!(buf, m_high, 3);
        let_field!(buf, pf, 1);
        let_field!(buf, m_low, 2);
        let_field!(buf, _u_id, 2);
        let Ok(u) = UFrameType::try_from((m_high << 2) | m_low) else {
            return Err(PduParseErr::NotImplemented { field: Some("u_frame_type") });
        };
        Ok(Control::U { pf: pf != 0, u })
    }

    pub fn to_msgbuf(&self, buf: &mut MsgBuf) {
        match *self {
            Control::I { nr, p, ns } => {
                buf.write_bits(nr as u64 & 7, 3);
                buf.write_bits(p as u64, 1);
                buf.write_bits(ns as u64 & 7, 3);
                buf.write_bits(0, 1);
            }
            Control::S { nr, pf, s } => {
                buf.write_bits(nr as u64 & 7, 3);
                buf.write_bits(pf as u64, 1);
                buf.write_bits(s.into_raw(), 2);
                buf.write_bits(0b01, 2);
            }
            Control::U { pf, u } => {
                let raw = u.into_raw();
                buf.write_bits(raw >> 2, 3);
                buf.write_bits(pf as u64, 1);
                buf.write_bits(raw & 3, 2);
                buf.write_bits(0b11, 2);
            }
        }
    }

    /// The P or F bit
    pub fn pf(&self) -> bool {
        match *self {
            Control::I { p, .. } => p,
            Control::S { pf, .. } => pf,
            Control::U { pf, .. } => pf,
        }
    }

    pub fn is_i(&self) -> bool {
        matches!(self, Control::I { .. })
    }
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Control::I { nr, p, ns } => write!(f, "I N(S)={} N(R)={} P={}", ns, nr, *p as u8),
            Control::S { nr, pf, s } => write!(f, "{} N(R)={} P/F={}", s, nr, *pf as u8),
            Control::U { pf, u } => write!(f, "{} P/F={}", u, *pf as u8),
        }
    }
}
