use std::collections::HashMap;

use thiserror::Error;

use gsm_config::StackConfig;
use gsm_core::gsm_entities::GsmEntity;
use gsm_core::{ChanNr, FrameNumber, LinkId, Sap, link_id_sapi};
use gsm_saps::dl::*;
use gsm_saps::{SapMsg, SapMsgInner};

use crate::MessageQueue;
use crate::lapdm::datalink::{DlAction, DlUp, LapdmError};
use crate::lapdm::lapdm_entity::LapdmEntity;
use crate::lapdm::params::{SAPI_RR, SAPI_SMS};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("no handler registered for SAPI {0}")]
    UnknownSapi(u8),
    #[error("channel {0:#04x} not active")]
    UnknownChannel(ChanNr),
    #[error("rejected by data link: {0}")]
    Rejected(#[from] LapdmError),
    #[error("not a downlink DL primitive")]
    NotADownlinkPrimitive,
}

/// Maps SAPIs to the upper layer entities consuming their indications,
/// and validates DL requests before handing them to a data link.
pub struct PrimRouter {
    handlers: HashMap<u8, GsmEntity>,
}

impl PrimRouter {
    pub fn new(cfg: &StackConfig) -> Self {
        let mut handlers = HashMap::new();
        handlers.insert(SAPI_RR, GsmEntity::Rr);
        if cfg.lapdm.sapi3_enabled {
            handlers.insert(SAPI_SMS, GsmEntity::Sms);
        }
        PrimRouter { handlers }
    }

    /// Registers `entity` as consumer of the indications of `sapi`, replacing any previous one
    pub fn register(&mut self, sapi: u8, entity: GsmEntity) {
        self.handlers.insert(sapi, entity);
    }

    pub fn handler(&self, sapi: u8) -> Option<GsmEntity> {
        self.handlers.get(&sapi).copied()
    }

    /// Delivers an indication or confirm of a data link to the handler of its SAPI
    pub fn route_up(
        &self,
        queue: &mut MessageQueue,
        fnr: FrameNumber,
        chan_nr: ChanNr,
        link_id: LinkId,
        up: DlUp,
    ) -> Result<(), RouteError> {
        let sapi = link_id_sapi(link_id);
        let dest = self.handler(sapi).ok_or(RouteError::UnknownSapi(sapi))?;

        let msg = match up {
            DlUp::EstablishInd(l3) => SapMsgInner::DlEstablishInd(DlEstablishInd { chan_nr, link_id, l3 }),
            DlUp::EstablishConf => SapMsgInner::DlEstablishConf(DlEstablishConf { chan_nr, link_id }),
            DlUp::DataInd(l3) => SapMsgInner::DlDataInd(DlDataInd { chan_nr, link_id, l3 }),
            DlUp::UnitDataInd(l3) => SapMsgInner::DlUnitDataInd(DlUnitDataInd { chan_nr, link_id, l3 }),
            DlUp::ReleaseInd(cause) => SapMsgInner::DlReleaseInd(DlReleaseInd { chan_nr, link_id, cause }),
            DlUp::ReleaseConf => SapMsgInner::DlReleaseConf(DlReleaseConf { chan_nr, link_id }),
        };
        tracing::debug!("<- {} chan_nr={:#04x} link_id={:#04x} to {:?}", msg, chan_nr, link_id, dest);
        queue.push_back(SapMsg::new(Sap::DlSap, GsmEntity::Lapdm, dest, fnr, msg));
        Ok(())
    }

    /// Hands a DL request to the data link of its SAPI on `entity`.
    /// The request is validated first; on rejection it is returned to the caller unconsumed.
    pub fn route_down(
        &self,
        entity: &mut LapdmEntity,
        prim: SapMsgInner,
    ) -> Result<Vec<DlAction>, (RouteError, SapMsgInner)> {
        let link_id = match &prim {
            SapMsgInner::DlEstablishReq(req) => req.link_id,
            SapMsgInner::DlDataReq(req) => req.link_id,
            SapMsgInner::DlUnitDataReq(req) => req.link_id,
            SapMsgInner::DlReleaseReq(req) => req.link_id,
            _ => return Err((RouteError::NotADownlinkPrimitive, prim)),
        };
        let sapi = link_id_sapi(link_id);
        if !self.handlers.contains_key(&sapi) {
            return Err((RouteError::UnknownSapi(sapi), prim));
        }
        let Some(dl) = entity.datalink(sapi) else {
            return Err((RouteError::Rejected(LapdmError::UnknownSapi(sapi)), prim));
        };

        let check = match &prim {
            SapMsgInner::DlEstablishReq(req) => dl.check_establish(req.l3.as_ref().map_or(0, |l3| l3.len())),
            SapMsgInner::DlDataReq(req) => dl.check_data_request(req.l3.len()),
            SapMsgInner::DlUnitDataReq(req) => dl.check_unit_data_request(req.l3.len()),
            _ => dl.check_release(),
        };
        if let Err(e) = check {
            return Err((e.into(), prim));
        }

        let result = match prim {
            SapMsgInner::DlEstablishReq(req) => entity.establish(sapi, req.l3),
            SapMsgInner::DlDataReq(req) => entity.data_request(sapi, req.l3),
            SapMsgInner::DlUnitDataReq(req) => entity.unit_data_request(sapi, req.l3),
            SapMsgInner::DlReleaseReq(req) => entity.release(sapi, req.mode),
            _ => Ok(Vec::new()),
        };
        match result {
            Ok(actions) => Ok(actions),
            Err(e) => {
                tracing::error!("lapdm: sapi {} request failed after validation: {}", sapi, e);
                Ok(Vec::new())
            }
        }
    }
}
