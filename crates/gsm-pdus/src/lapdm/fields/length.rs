use core::fmt;

use gsm_core::pdu_parse_error::*;
use gsm_core::{MsgBuf, expect_value, let_field};

/// TS 04.06 clause 3.6 length indicator field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthIndicator {
    // 6
    pub l: u8,
    // 1, more data bit
    pub m: bool,
}

impl LengthIndicator {
    pub fn from_msgbuf(buf: &mut MsgBuf) -> Result<Self, PduParseErr> {
        let_field!(buf, l, 6);
        let_field!(buf, m, 1);
        let_field!(buf, el, 1);
        // Length field extension is not used in LAPDm
        expect_value!(el, 1u64)?;

        Ok(LengthIndicator { l: l as u8, m: m != 0 })
    }

    pub fn to_msgbuf(&self, buf: &mut MsgBuf) {
        buf.write_bits(self.l as u64, 6);
        buf.write_bits(self.m as u64, 1);
        buf.write_bits(1, 1);
    }
}

impl fmt::Display for LengthIndicator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "L={} M={}", self.l, self.m as u8)
    }
}
