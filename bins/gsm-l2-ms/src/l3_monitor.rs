use gsm_core::gsm_entities::GsmEntity;
use gsm_entities::{GsmEntityTrait, MessageQueue};
use gsm_saps::{SapMsg, SapMsgInner};

/// Stand-in for a layer 3 entity (RR or SMS). Logs what the lower layers deliver.
pub struct L3Monitor {
    entity: GsmEntity,
    received: u64,
}

impl L3Monitor {
    pub fn new(entity: GsmEntity) -> Self {
        Self { entity, received: 0 }
    }
}

impl GsmEntityTrait for L3Monitor {
    fn entity(&self) -> GsmEntity {
        self.entity
    }

    fn rx_prim(&mut self, _queue: &mut MessageQueue, message: SapMsg) {
        self.received += 1;
        match &message.msg {
            SapMsgInner::MphSyncInd(ind) => {
                tracing::info!("{:?}: synchronized at {} bsic {}", self.entity, ind.time, ind.bsic);
            }
            SapMsgInner::MphClockLostInd(ind) => {
                tracing::warn!("{:?}: frame clock lost, last fn {:?}", self.entity, ind.last_fn);
            }
            SapMsgInner::MdlErrorInd(ind) => {
                tracing::warn!("{:?}: MDL-ERROR {} on {:#04x}/{:#04x}", self.entity, ind.cause, ind.chan_nr, ind.link_id);
            }
            SapMsgInner::DlUnitDataInd(ind) => {
                tracing::debug!("{:?}: unit data on {:#04x}: {:02x?}", self.entity, ind.chan_nr, ind.l3);
            }
            other => {
                tracing::info!("{:?}: {} from {:?} (#{})", self.entity, other, message.src, self.received);
            }
        }
    }
}
