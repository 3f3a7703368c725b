//! PHY-layer types that are used across multiple layers
//!
//! These types originate from the PHY boundary but are referenced by L1, LAPDm
//! and SAP primitives, so they live in gsm-core to avoid circular dependencies.

use crate::{ChanNr, LinkId};

/// Burst types, TS 05.02 clause 5.2
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BurstType {
    /// Frequency correction burst
    Fb,
    /// Synchronization burst
    Sb,
    /// Normal burst
    Nb,
    /// Access burst (RACH)
    Ab,
    /// Dummy burst
    Dummy,
}

/// Length of a decoded normal burst block (four bursts of one interleaving period)
pub const GSM_MACBLOCK_LEN: usize = 23;
/// Fill octet used by LAPDm and L1 for unused octets
pub const GSM_MACBLOCK_PADDING: u8 = 0x2b;
/// Octets of the SACCH layer 1 header (MS power, timing advance)
pub const SACCH_L1_HDR_LEN: usize = 2;

/// Timeslots per TDMA frame
pub const NUM_TIMESLOTS: u8 = 8;

/// Measurements reported with a received burst or block
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub struct SignalQuality {
    /// Received level in dBm
    pub rssi_dbm: i16,
    /// Time of arrival in quarter bits
    pub toa_qbits: i16,
    /// Number of bit errors detected by the channel decoder
    pub num_biterr: u16,
    /// Decoder failed, the payload is not usable
    pub crc_fail: bool,
}

/// C-bits of a channel number, TS 08.58 clause 9.3.1
pub mod cbits {
    pub const TCH_F: u8 = 0x01;
    /// TCH/H, add the subchannel (0..1)
    pub const TCH_H: u8 = 0x02;
    /// SDCCH/4, add the subchannel (0..3)
    pub const SDCCH4: u8 = 0x04;
    /// SDCCH/8, add the subchannel (0..7)
    pub const SDCCH8: u8 = 0x08;
    pub const BCCH: u8 = 0x10;
    pub const RACH: u8 = 0x11;
    pub const PCH_AGCH: u8 = 0x12;
}

/// Link identifier bit marking the SACCH
pub const LINK_ID_SACCH: LinkId = 0x40;

pub fn chan_nr(cbits: u8, tn: u8) -> ChanNr {
    (cbits << 3) | (tn & 0x07)
}

pub fn chan_nr_tn(chan_nr: ChanNr) -> u8 {
    chan_nr & 0x07
}

pub fn chan_nr_cbits(chan_nr: ChanNr) -> u8 {
    chan_nr >> 3
}

/// True for channel numbers of broadcast and common control channels, which carry Bbis frames
pub fn chan_nr_is_ccch(chan_nr: ChanNr) -> bool {
    matches!(chan_nr_cbits(chan_nr), cbits::BCCH | cbits::RACH | cbits::PCH_AGCH)
}

/// True for channel numbers carrying TCH (and thus FACCH signalling)
pub fn chan_nr_is_tch(chan_nr: ChanNr) -> bool {
    matches!(chan_nr_cbits(chan_nr), cbits::TCH_F | 0x02 | 0x03)
}

pub fn link_id_is_sacch(link_id: LinkId) -> bool {
    link_id & LINK_ID_SACCH != 0
}

/// SAPI carried in the low bits of a link identifier
pub fn link_id_sapi(link_id: LinkId) -> u8 {
    link_id & 0x07
}

pub fn link_id(sapi: u8, sacch: bool) -> LinkId {
    (sapi & 0x07) | if sacch { LINK_ID_SACCH } else { 0 }
}
