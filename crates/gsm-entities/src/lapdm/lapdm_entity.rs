use std::collections::BTreeMap;

use gsm_config::{SharedConfig, StackMode};
use gsm_core::{ChanNr, GSM_MACBLOCK_LEN, GSM_MACBLOCK_PADDING, LinkId, MsgBuf, SACCH_L1_HDR_LEN, link_id};
use gsm_pdus::lapdm::enums::lapdm_format::LapdmFormat;
use gsm_pdus::lapdm::fields::address::LPD_NORMAL;
use gsm_pdus::lapdm::fields::control::Control;
use gsm_pdus::lapdm::enums::u_frame_type::UFrameType;
use gsm_pdus::lapdm::pdus::lapdm_frame::LapdmFrame;
use gsm_saps::dl::ReleaseMode;
use gsm_saps::mdl::MdlCause;

use crate::lapdm::datalink::{Datalink, DlAction, LapdmError};
use crate::lapdm::params::{ChanKind, DatalinkParams, SAPI_RR, SAPI_SMS};

/// An action produced for one of the data links of an entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LapdmOutput {
    pub sapi: u8,
    pub action: DlAction,
}

/// LAPDm entity of one logical channel (main DCCH or SACCH of a dedicated channel).
/// Owns the data links of all SAPIs served on that channel, TS 04.06 clause 4.
pub struct LapdmEntity {
    config: SharedConfig,
    chan_nr: ChanNr,
    kind: ChanKind,
    mode: StackMode,
    datalinks: BTreeMap<u8, Datalink>,
}

fn is_ui_ctrl(ctrl: u8) -> bool {
    ctrl & 0xef == 0x03
}

impl LapdmEntity {
    /// Creates the entity for the main channel or the SACCH of `chan_nr`.
    /// Returns None if the channel carries no data links.
    pub fn new(config: &SharedConfig, chan_nr: ChanNr, sacch: bool) -> Option<Self> {
        let kind = ChanKind::from_chan_nr(chan_nr, sacch)?;
        let cfg = config.config();

        let mut datalinks = BTreeMap::new();
        datalinks.insert(SAPI_RR, Datalink::new(DatalinkParams::new(&cfg, kind, SAPI_RR)));
        if cfg.lapdm.sapi3_enabled {
            datalinks.insert(SAPI_SMS, Datalink::new(DatalinkParams::new(&cfg, kind, SAPI_SMS)));
        }

        Some(LapdmEntity { config: config.clone(), chan_nr, kind, mode: cfg.stack_mode, datalinks })
    }

    pub fn chan_nr(&self) -> ChanNr {
        self.chan_nr
    }

    pub fn kind(&self) -> ChanKind {
        self.kind
    }

    pub fn is_sacch(&self) -> bool {
        self.kind == ChanKind::Sacch
    }

    /// Link identifier of a SAPI on this entity
    pub fn link_id(&self, sapi: u8) -> LinkId {
        link_id(sapi, self.is_sacch())
    }

    pub fn sapis(&self) -> impl Iterator<Item = u8> + '_ {
        self.datalinks.keys().copied()
    }

    pub fn datalink(&self, sapi: u8) -> Option<&Datalink> {
        self.datalinks.get(&sapi)
    }

    pub fn datalink_mut(&mut self, sapi: u8) -> Option<&mut Datalink> {
        self.datalinks.get_mut(&sapi)
    }

    fn dl(&mut self, sapi: u8) -> Result<&mut Datalink, LapdmError> {
        self.datalinks.get_mut(&sapi).ok_or(LapdmError::UnknownSapi(sapi))
    }

    pub fn establish(&mut self, sapi: u8, l3: Option<Vec<u8>>) -> Result<Vec<DlAction>, LapdmError> {
        self.dl(sapi)?.establish(l3)
    }

    pub fn release(&mut self, sapi: u8, mode: ReleaseMode) -> Result<Vec<DlAction>, LapdmError> {
        self.dl(sapi)?.release(mode)
    }

    pub fn data_request(&mut self, sapi: u8, l3: Vec<u8>) -> Result<Vec<DlAction>, LapdmError> {
        self.dl(sapi)?.data_request(l3)
    }

    pub fn unit_data_request(&mut self, sapi: u8, l3: Vec<u8>) -> Result<Vec<DlAction>, LapdmError> {
        self.dl(sapi)?.unit_data_request(l3)
    }

    pub fn set_own_busy(&mut self, sapi: u8, busy: bool) -> Result<Vec<DlAction>, LapdmError> {
        self.dl(sapi)?.set_own_busy(busy)
    }

    pub fn t200_expired(&mut self, sapi: u8) -> Vec<DlAction> {
        match self.datalinks.get_mut(&sapi) {
            Some(dl) => dl.t200_expired(),
            None => Vec::new(),
        }
    }

    /// Drops the state of all data links without peer signalling
    pub fn reset(&mut self) -> Vec<LapdmOutput> {
        let mut out = Vec::new();
        for (sapi, dl) in self.datalinks.iter_mut() {
            out.extend(dl.reset().into_iter().map(|action| LapdmOutput { sapi: *sapi, action }));
        }
        out
    }

    /// Frame format of a received block (after the SACCH L1 header).
    /// UI frames on the SACCH downlink come without length octet.
    fn rx_format(&self, block: &[u8]) -> LapdmFormat {
        match (self.mode, self.is_sacch(), block.get(1)) {
            (StackMode::Ms, true, Some(ctrl)) if is_ui_ctrl(*ctrl) => LapdmFormat::B4,
            _ => LapdmFormat::B,
        }
    }

    /// Processes a received 23 octet block
    pub fn rx_block(&mut self, payload: &[u8]) -> Vec<LapdmOutput> {
        gsm_core::assert_warn!(payload.len() == GSM_MACBLOCK_LEN, "lapdm {:#04x}: block of {} octets", self.chan_nr, payload.len());
        let mut block = payload;
        if self.is_sacch() {
            if payload.len() < SACCH_L1_HDR_LEN {
                tracing::warn!("lapdm {:#04x}: short SACCH block of {} octets", self.chan_nr, payload.len());
                return Vec::new();
            }
            if self.mode == StackMode::Ms {
                // Ordered MS power and timing advance from the downlink L1 header
                let mut state = self.config.state_write();
                state.ms_power = payload[0] & 0x1f;
                state.timing_advance = payload[1];
            }
            block = &payload[SACCH_L1_HDR_LEN..];
        }

        let format = self.rx_format(block);
        let mut buf = MsgBuf::from_bytes(block);
        let frame = match LapdmFrame::from_msgbuf(&mut buf, format) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!("lapdm {:#04x}: dropping malformed frame: {:?}", self.chan_nr, e);
                let sapi = block.first().map_or(SAPI_RR, |a| (a >> 2) & 0x07);
                return vec![LapdmOutput { sapi, action: DlAction::MdlError(MdlCause::FrmUnimpl) }];
            }
        };
        tracing::trace!("lapdm {:#04x}: rx {}", self.chan_nr, frame);

        if frame.addr.lpd != LPD_NORMAL {
            tracing::debug!("lapdm {:#04x}: ignoring frame with LPD={}", self.chan_nr, frame.addr.lpd);
            return Vec::new();
        }

        let sapi = frame.addr.sapi;
        let Some(dl) = self.datalinks.get_mut(&sapi) else {
            if matches!(frame.ctrl, Control::U { u: UFrameType::Ui, .. }) {
                tracing::debug!("lapdm {:#04x}: UI on unsupported SAPI {} discarded", self.chan_nr, sapi);
                return Vec::new();
            }
            tracing::warn!("lapdm {:#04x}: frame for unsupported SAPI {}", self.chan_nr, sapi);
            return vec![LapdmOutput { sapi, action: DlAction::MdlError(MdlCause::FrmUnimpl) }];
        };

        dl.rx_frame(frame).into_iter().map(|action| LapdmOutput { sapi, action }).collect()
    }

    /// Encodes a frame into a padded block, with the L1 header on the SACCH
    pub fn encode(&self, frame: &LapdmFrame) -> Vec<u8> {
        let mut buf = MsgBuf::with_capacity(GSM_MACBLOCK_LEN);
        if self.is_sacch() {
            let state = self.config.state_read();
            buf.write_octet(state.ms_power & 0x1f);
            buf.write_octet(state.timing_advance);
        }

        let b4 = self.mode == StackMode::Bts
            && self.is_sacch()
            && matches!(frame.ctrl, Control::U { u: UFrameType::Ui, .. });
        if b4 {
            frame.addr.to_msgbuf(&mut buf);
            frame.ctrl.to_msgbuf(&mut buf);
            buf.write_octets(&frame.info);
        } else {
            frame.to_msgbuf(&mut buf);
        }

        buf.pad_to(GSM_MACBLOCK_LEN, GSM_MACBLOCK_PADDING);
        buf.into_bytes()
    }
}
