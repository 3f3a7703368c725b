use core::fmt;

use gsm_core::pdu_parse_error::*;
use gsm_core::{MsgBuf, expect_value, let_field};

/// Link protocol discriminator of normal LAPDm operation. Value 1 is used by SMSCB.
pub const LPD_NORMAL: u8 = 0;

/// TS 04.06 clause 3.2 address field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Address {
    // 2
    pub lpd: u8,
    // 3
    pub sapi: u8,
    // 1
    pub cr: bool,
}

impl Address {
    pub fn new(sapi: u8, cr: bool) -> Self {
        Address { lpd: LPD_NORMAL, sapi, cr }
    }

    pub fn from_msgbuf(buf: &mut MsgBuf) -> Result<Self, PduParseErr> {
        let_field!(buf, spare, 1);
        let_field!(buf, lpd, 2);
        let_field!(buf, sapi, 3);
        let_field!(buf, cr, 1);
        let_field!(buf, ea, 1);
        // Address field extension is not used in LAPDm
        expect_value!(ea, 1u64)?;
        expect_value!(spare, 0u64)?;

        Ok(Address {
            lpd: lpd as u8,
            sapi: sapi as u8,
            cr: cr != 0,
        })
    }

    pub fn to_msgbuf(&self, buf: &mut MsgBuf) {
        buf.write_bits(0, 1);
        buf.write_bits(self.lpd as u64, 2);
        buf.write_bits(self.sapi as u64, 3);
        buf.write_bits(self.cr as u64, 1);
        buf.write_bits(1, 1);
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "sapi={} cr={} lpd={}", self.sapi, self.cr as u8, self.lpd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_octet() {
        let mut buf = MsgBuf::new();
        Address::new(3, true).to_msgbuf(&mut buf);
        assert_eq!(buf.as_bytes(), &[0x0f]);

        let mut buf = MsgBuf::from_bytes(&[0x01]);
        let addr = Address::from_msgbuf(&mut buf).unwrap();
        assert_eq!(addr, Address { lpd: 0, sapi: 0, cr: false });

        // EA=0
        let mut buf = MsgBuf::from_bytes(&[0x02]);
        assert_eq!(Address::from_msgbuf(&mut buf), Err(PduParseErr::InvalidValue { field: "ea", value: 0 }));
    }
}
