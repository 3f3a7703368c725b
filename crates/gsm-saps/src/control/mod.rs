use gsm_core::{ChanNr, LinkId};

/// Control messages towards the LAPDm entity that have no standard primitive
#[derive(Debug)]
pub enum LapdmControl {
    /// Create the data link entities of a dedicated channel
    ActivateChannel { chan_nr: ChanNr },
    /// Drop the data link entities of a dedicated channel, without peer signalling
    DeactivateChannel { chan_nr: ChanNr },
    /// Set or clear the own receiver busy condition of a data link
    SetOwnBusy { chan_nr: ChanNr, link_id: LinkId, busy: bool },
}
