use gsm_core::{ChanNr, LinkId};

/// Release mode of DL-RELEASE request, TS 04.06 clause 5.4.4
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseMode {
    /// Send DISC and wait for UA or DM
    Normal,
    /// Release locally without peer exchange
    Local,
}

/// Reason attached to a DL-RELEASE indication
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseCause {
    /// Peer sent DISC
    PeerDisc,
    /// Peer answered with DM
    PeerDm,
    /// N200 retransmissions exhausted
    LinkFailure,
    /// Contention resolution failed, UA did not echo the SABM information field
    ContentionResolution,
}

/// DL-ESTABLISH request. An information field triggers contention resolution.
#[derive(Debug)]
pub struct DlEstablishReq {
    pub chan_nr: ChanNr,
    pub link_id: LinkId,
    pub l3: Option<Vec<u8>>,
}

/// DL-ESTABLISH indication: peer established the link, with its SABM information if any
#[derive(Debug)]
pub struct DlEstablishInd {
    pub chan_nr: ChanNr,
    pub link_id: LinkId,
    pub l3: Option<Vec<u8>>,
}

/// DL-ESTABLISH confirm
#[derive(Debug)]
pub struct DlEstablishConf {
    pub chan_nr: ChanNr,
    pub link_id: LinkId,
}

/// DL-DATA request: acknowledged transfer
#[derive(Debug)]
pub struct DlDataReq {
    pub chan_nr: ChanNr,
    pub link_id: LinkId,
    pub l3: Vec<u8>,
}

/// DL-DATA indication: reassembled layer 3 message
#[derive(Debug)]
pub struct DlDataInd {
    pub chan_nr: ChanNr,
    pub link_id: LinkId,
    pub l3: Vec<u8>,
}

/// DL-UNIT-DATA request: unacknowledged transfer in a UI frame
#[derive(Debug)]
pub struct DlUnitDataReq {
    pub chan_nr: ChanNr,
    pub link_id: LinkId,
    pub l3: Vec<u8>,
}

/// DL-UNIT-DATA indication: UI frame or Bbis block content
#[derive(Debug)]
pub struct DlUnitDataInd {
    pub chan_nr: ChanNr,
    pub link_id: LinkId,
    pub l3: Vec<u8>,
}

#[derive(Debug)]
pub struct DlReleaseReq {
    pub chan_nr: ChanNr,
    pub link_id: LinkId,
    pub mode: ReleaseMode,
}

#[derive(Debug)]
pub struct DlReleaseInd {
    pub chan_nr: ChanNr,
    pub link_id: LinkId,
    pub cause: ReleaseCause,
}

#[derive(Debug)]
pub struct DlReleaseConf {
    pub chan_nr: ChanNr,
    pub link_id: LinkId,
}
