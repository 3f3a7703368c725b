use gsm_core::{ChanNr, FrameNumber, LinkId, SignalQuality};

/// PH-DATA indication: a decoded block received on a dedicated or common channel
#[derive(Debug)]
pub struct PhDataInd {
    pub chan_nr: ChanNr,
    pub link_id: LinkId,
    /// Frame number of the first burst of the block
    pub fnr: FrameNumber,
    /// One 23 octet block, including the SACCH layer 1 header if on SACCH
    pub payload: Vec<u8>,
    pub quality: SignalQuality,
}

/// PH-DATA request: a block to be transmitted at the next opportunity of the channel
#[derive(Debug)]
pub struct PhDataReq {
    pub chan_nr: ChanNr,
    pub link_id: LinkId,
    pub payload: Vec<u8>,
}

/// PH-FLUSH request: drop uplink blocks queued but not yet transmitted
#[derive(Debug)]
pub struct PhFlushReq {
    pub chan_nr: ChanNr,
    /// Blocks of this data link only, or of the whole channel if None
    pub link_id: Option<LinkId>,
}

/// PH-RACH request: transmit an access burst
#[derive(Debug)]
pub struct PhRachReq {
    /// 8 bit random access reference
    pub ra: u8,
    /// Transmit at this frame, or at the next frame if in the past or None
    pub fnr: Option<FrameNumber>,
}

/// PH-RACH confirm: the access burst was handed to the PHY
#[derive(Debug)]
pub struct PhRachConf {
    pub ra: u8,
    pub fnr: FrameNumber,
}
