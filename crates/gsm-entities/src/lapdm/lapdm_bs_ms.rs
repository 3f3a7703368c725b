use std::collections::HashMap;
use std::time::Duration;

use gsm_config::SharedConfig;
use gsm_core::gsm_entities::GsmEntity;
use gsm_core::{ChanNr, FrameNumber, LinkId, Sap, chan_nr_is_ccch, link_id, link_id_is_sacch, link_id_sapi};
use gsm_saps::control::LapdmControl;
use gsm_saps::mdl::MdlErrorInd;
use gsm_saps::ph::{PhDataInd, PhDataReq, PhFlushReq};
use gsm_saps::{SapMsg, SapMsgInner};

use crate::lapdm::datalink::{DlAction, DlUp};
use crate::lapdm::lapdm_channel::LapdmChannel;
use crate::lapdm::params::SAPI_RR;
use crate::lapdm::prim_router::{PrimRouter, RouteError};
use crate::timer::{TimerHandle, TimerRegistry};
use crate::{GsmEntityTrait, MessageQueue};

/// Identifies the data link a T200 instance belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct T200Key {
    chan_nr: ChanNr,
    sacch: bool,
    sapi: u8,
}

/// LAPDm layer of the MS (or of the network side in BTS mode).
/// Holds the entities of all active dedicated channels and their T200 timers.
pub struct Lapdm {
    config: SharedConfig,
    channels: HashMap<ChanNr, LapdmChannel>,
    router: PrimRouter,

    timers: TimerRegistry<T200Key>,
    t200: HashMap<T200Key, TimerHandle>,

    /// Frame number of the last received block
    fnr: FrameNumber,
}

impl Lapdm {
    pub fn new(config: SharedConfig) -> Self {
        let router = PrimRouter::new(&config.config());
        Self {
            config,
            channels: HashMap::new(),
            router,
            timers: TimerRegistry::new(),
            t200: HashMap::new(),
            fnr: FrameNumber::default(),
        }
    }

    pub fn router_mut(&mut self) -> &mut PrimRouter {
        &mut self.router
    }

    pub fn channel(&self, chan_nr: ChanNr) -> Option<&LapdmChannel> {
        self.channels.get(&chan_nr)
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    fn activate(&mut self, chan_nr: ChanNr) {
        if self.channels.contains_key(&chan_nr) {
            tracing::warn!("lapdm: channel {:#04x} already active", chan_nr);
            return;
        }
        let Some(channel) = LapdmChannel::new(&self.config, chan_nr) else {
            tracing::warn!("lapdm: {:#04x} is not a dedicated channel", chan_nr);
            return;
        };

        for sacch in [false, true] {
            for sapi in channel.entity(sacch).sapis() {
                let handle = self.timers.alloc();
                self.t200.insert(T200Key { chan_nr, sacch, sapi }, handle);
            }
        }
        tracing::info!("lapdm: channel {:#04x} activated", chan_nr);
        self.channels.insert(chan_nr, channel);
    }

    /// Returns false if the channel was not active
    fn deactivate(&mut self, chan_nr: ChanNr) -> bool {
        let Some(mut channel) = self.channels.remove(&chan_nr) else {
            tracing::debug!("lapdm: channel {:#04x} not active", chan_nr);
            return false;
        };
        channel.reset();

        let keys: Vec<T200Key> = self.t200.keys().filter(|k| k.chan_nr == chan_nr).copied().collect();
        for key in keys {
            if let Some(handle) = self.t200.remove(&key) {
                self.timers.release(handle);
            }
        }
        tracing::info!("lapdm: channel {:#04x} deactivated", chan_nr);
        true
    }

    fn send_ph_data_req(&self, queue: &mut MessageQueue, chan_nr: ChanNr, link_id: LinkId, payload: Vec<u8>) {
        tracing::trace!("-> PH-DATA.req chan_nr={:#04x} link_id={:#04x} {:02x?}", chan_nr, link_id, payload);
        let req = PhDataReq { chan_nr, link_id, payload };
        queue.push_back(SapMsg::new(Sap::PhSap, GsmEntity::Lapdm, GsmEntity::L1, self.fnr, SapMsgInner::PhDataReq(req)));
    }

    fn send_ph_flush_req(&self, queue: &mut MessageQueue, chan_nr: ChanNr, link_id: Option<LinkId>) {
        tracing::trace!("-> PH-FLUSH.req chan_nr={:#04x} link_id={:?}", chan_nr, link_id);
        let req = PhFlushReq { chan_nr, link_id };
        queue.push_back(SapMsg::new(Sap::PhSap, GsmEntity::Lapdm, GsmEntity::L1, self.fnr, SapMsgInner::PhFlushReq(req)));
    }

    /// Executes the actions of one data link in order
    fn apply_actions(&mut self, queue: &mut MessageQueue, key: T200Key, actions: Vec<DlAction>) {
        let link_id = link_id(key.sapi, key.sacch);

        for action in actions {
            match action {
                DlAction::Tx(frame) => {
                    let Some(channel) = self.channels.get(&key.chan_nr) else {
                        continue;
                    };
                    tracing::debug!("lapdm {:#04x}/{:#04x}: tx {}", key.chan_nr, link_id, frame);
                    let payload = channel.entity(key.sacch).encode(&frame);
                    self.send_ph_data_req(queue, key.chan_nr, link_id, payload);
                }
                DlAction::FlushTx => self.send_ph_flush_req(queue, key.chan_nr, Some(link_id)),
                DlAction::StartT200 => {
                    let t200 = self
                        .channels
                        .get(&key.chan_nr)
                        .and_then(|ch| ch.entity(key.sacch).datalink(key.sapi))
                        .map(|dl| dl.params().t200);
                    if let (Some(handle), Some(t200)) = (self.t200.get(&key), t200) {
                        if let Err(e) = self.timers.timer_schedule(*handle, t200, key) {
                            tracing::error!("lapdm: cannot start T200 for {:?}: {}", key, e);
                        }
                    }
                }
                DlAction::StopT200 => {
                    if let Some(handle) = self.t200.get(&key) {
                        self.timers.timer_cancel(*handle);
                    }
                }
                DlAction::Up(up) => {
                    if let Err(e) = self.router.route_up(queue, self.fnr, key.chan_nr, link_id, up) {
                        tracing::warn!("lapdm {:#04x}/{:#04x}: indication dropped: {}", key.chan_nr, link_id, e);
                    }
                }
                DlAction::MdlError(cause) => {
                    tracing::warn!("lapdm {:#04x}/{:#04x}: MDL-ERROR {}", key.chan_nr, link_id, cause);
                    let ind = MdlErrorInd { chan_nr: key.chan_nr, link_id, cause };
                    queue.push_back(SapMsg::new(
                        Sap::MdlSap,
                        GsmEntity::Lapdm,
                        GsmEntity::Rr,
                        self.fnr,
                        SapMsgInner::MdlErrorInd(ind),
                    ));
                }
            }
        }
    }

    fn rx_ph_data_ind(&mut self, queue: &mut MessageQueue, ind: PhDataInd) {
        self.fnr = ind.fnr;

        if chan_nr_is_ccch(ind.chan_nr) {
            // Bbis blocks carry a plain layer 3 message
            let up = DlUp::UnitDataInd(ind.payload);
            if let Err(e) = self.router.route_up(queue, ind.fnr, ind.chan_nr, link_id(SAPI_RR, false), up) {
                tracing::warn!("lapdm: CCCH block dropped: {}", e);
            }
            return;
        }

        let sacch = link_id_is_sacch(ind.link_id);
        let Some(channel) = self.channels.get_mut(&ind.chan_nr) else {
            tracing::debug!("lapdm: block on inactive channel {:#04x} dropped", ind.chan_nr);
            return;
        };

        let outputs = channel.entity_mut(sacch).rx_block(&ind.payload);
        for output in outputs {
            let key = T200Key { chan_nr: ind.chan_nr, sacch, sapi: output.sapi };
            self.apply_actions(queue, key, vec![output.action]);
        }
    }

    fn rx_dl_req(&mut self, queue: &mut MessageQueue, prim: SapMsgInner) {
        let (chan_nr, link_id) = match &prim {
            SapMsgInner::DlEstablishReq(req) => (req.chan_nr, req.link_id),
            SapMsgInner::DlDataReq(req) => (req.chan_nr, req.link_id),
            SapMsgInner::DlUnitDataReq(req) => (req.chan_nr, req.link_id),
            SapMsgInner::DlReleaseReq(req) => (req.chan_nr, req.link_id),
            _ => {
                tracing::warn!("lapdm: rejected {}: {}", prim, RouteError::NotADownlinkPrimitive);
                return;
            }
        };

        let sacch = link_id_is_sacch(link_id);
        let Some(channel) = self.channels.get_mut(&chan_nr) else {
            tracing::warn!("lapdm: rejected {}: {}", prim, RouteError::UnknownChannel(chan_nr));
            return;
        };

        match self.router.route_down(channel.entity_mut(sacch), prim) {
            Ok(actions) => {
                let key = T200Key { chan_nr, sacch, sapi: link_id_sapi(link_id) };
                self.apply_actions(queue, key, actions);
            }
            Err((e, prim)) => {
                tracing::warn!("lapdm: rejected {} chan_nr={:#04x} link_id={:#04x}: {}", prim, chan_nr, link_id, e);
            }
        }
    }

    fn rx_control(&mut self, queue: &mut MessageQueue, ctrl: LapdmControl) {
        match ctrl {
            LapdmControl::ActivateChannel { chan_nr } => self.activate(chan_nr),
            LapdmControl::DeactivateChannel { chan_nr } => {
                if self.deactivate(chan_nr) {
                    self.send_ph_flush_req(queue, chan_nr, None);
                }
            }
            LapdmControl::SetOwnBusy { chan_nr, link_id, busy } => {
                let sacch = link_id_is_sacch(link_id);
                let sapi = link_id_sapi(link_id);
                let Some(channel) = self.channels.get_mut(&chan_nr) else {
                    tracing::warn!("lapdm: own busy on inactive channel {:#04x}", chan_nr);
                    return;
                };
                match channel.entity_mut(sacch).set_own_busy(sapi, busy) {
                    Ok(actions) => self.apply_actions(queue, T200Key { chan_nr, sacch, sapi }, actions),
                    Err(e) => tracing::warn!("lapdm: own busy rejected on {:#04x}/{:#04x}: {}", chan_nr, link_id, e),
                }
            }
        }
    }
}

impl GsmEntityTrait for Lapdm {
    fn entity(&self) -> GsmEntity {
        GsmEntity::Lapdm
    }

    fn set_config(&mut self, config: SharedConfig) {
        self.config = config;
    }

    fn rx_prim(&mut self, queue: &mut MessageQueue, message: SapMsg) {
        tracing::trace!("rx_prim: {} from {:?}", message.msg, message.src);

        match message.msg {
            SapMsgInner::PhDataInd(ind) => self.rx_ph_data_ind(queue, ind),
            SapMsgInner::LapdmControl(ctrl) => self.rx_control(queue, ctrl),
            prim @ (SapMsgInner::DlEstablishReq(_)
            | SapMsgInner::DlDataReq(_)
            | SapMsgInner::DlUnitDataReq(_)
            | SapMsgInner::DlReleaseReq(_)) => {
                tracing::debug!("-> {} from {:?}", prim, message.src);
                self.rx_dl_req(queue, prim);
            }
            other => {
                tracing::warn!("lapdm: unexpected primitive {}", other);
            }
        }
    }

    fn tick_start(&mut self, queue: &mut MessageQueue, now: Duration) {
        let mut expired = Vec::new();
        self.timers.timer_tick(now, |_, key| expired.push(key));

        for key in expired {
            let Some(channel) = self.channels.get_mut(&key.chan_nr) else {
                continue;
            };
            tracing::debug!("lapdm {:#04x}: T200 expired on sapi {} sacch={}", key.chan_nr, key.sapi, key.sacch);
            let actions = channel.entity_mut(key.sacch).t200_expired(key.sapi);
            self.apply_actions(queue, key, actions);
        }
    }
}
