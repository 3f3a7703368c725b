use gsm_config::SharedConfig;
use gsm_core::{ChanNr, LinkId, link_id_is_sacch};

use crate::lapdm::lapdm_entity::{LapdmEntity, LapdmOutput};

/// The pair of LAPDm entities of an active dedicated channel
pub struct LapdmChannel {
    /// Main signalling channel (SDCCH or FACCH)
    pub dcch: LapdmEntity,
    /// Slow associated control channel
    pub acch: LapdmEntity,
}

impl LapdmChannel {
    pub fn new(config: &SharedConfig, chan_nr: ChanNr) -> Option<Self> {
        Some(LapdmChannel {
            dcch: LapdmEntity::new(config, chan_nr, false)?,
            acch: LapdmEntity::new(config, chan_nr, true)?,
        })
    }

    pub fn chan_nr(&self) -> ChanNr {
        self.dcch.chan_nr()
    }

    pub fn entity(&self, sacch: bool) -> &LapdmEntity {
        if sacch { &self.acch } else { &self.dcch }
    }

    pub fn entity_mut(&mut self, sacch: bool) -> &mut LapdmEntity {
        if sacch { &mut self.acch } else { &mut self.dcch }
    }

    /// Entity addressed by a link identifier
    pub fn entity_for_link(&mut self, link_id: LinkId) -> &mut LapdmEntity {
        self.entity_mut(link_id_is_sacch(link_id))
    }

    /// Resets both entities. Returns the actions per SACCH flag.
    pub fn reset(&mut self) -> Vec<(bool, LapdmOutput)> {
        let mut out: Vec<(bool, LapdmOutput)> = self.dcch.reset().into_iter().map(|o| (false, o)).collect();
        out.extend(self.acch.reset().into_iter().map(|o| (true, o)));
        out
    }
}
