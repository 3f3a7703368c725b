use std::collections::VecDeque;

use thiserror::Error;

use gsm_pdus::lapdm::enums::s_frame_type::SFrameType;
use gsm_pdus::lapdm::enums::u_frame_type::UFrameType;
use gsm_pdus::lapdm::fields::control::Control;
use gsm_pdus::lapdm::pdus::lapdm_frame::LapdmFrame;
use gsm_saps::dl::{ReleaseCause, ReleaseMode};
use gsm_saps::mdl::MdlCause;

use crate::lapdm::params::DatalinkParams;

/// Externally visible data link state, TS 04.06 clause 5.4
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DlState {
    /// Released after a link failure
    Null,
    Idle,
    SabmSent,
    DiscSent,
    MfEst,
    TimerRecovery,
    /// Multiple frame established with own receiver busy
    OwnRcvrBusy,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LapdmError {
    #[error("data link not established")]
    NotEstablished,
    #[error("send queue full")]
    QueueFull,
    #[error("message of {len} octets exceeds maximum of {max}")]
    TooLong { len: usize, max: usize },
    #[error("empty message")]
    Empty,
    #[error("request not allowed in state {0:?}")]
    InvalidState(DlState),
    #[error("no data link for SAPI {0}")]
    UnknownSapi(u8),
}

/// Indications towards layer 3
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DlUp {
    EstablishInd(Option<Vec<u8>>),
    EstablishConf,
    DataInd(Vec<u8>),
    UnitDataInd(Vec<u8>),
    ReleaseInd(ReleaseCause),
    ReleaseConf,
}

/// Side effects of a state machine step, executed by the owner in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DlAction {
    Tx(LapdmFrame),
    /// Drop frames of this data link still waiting in layer 1
    FlushTx,
    StartT200,
    StopT200,
    Up(DlUp),
    MdlError(MdlCause),
}

/// The single unacknowledged I-frame (window size 1)
#[derive(Debug, Clone)]
struct Outstanding {
    ns: u8,
    info: Vec<u8>,
    more: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkState {
    Null,
    Idle,
    SabmSent,
    DiscSent,
    MfEst,
    TimerRecovery,
}

fn inc(v: u8) -> u8 {
    (v + 1) & 7
}

/// One LAPDm data link (one SAPI of one entity)
#[derive(Debug)]
pub struct Datalink {
    params: DatalinkParams,
    state: LinkState,

    vs: u8,
    va: u8,
    vr: u8,
    retrans: u32,
    t200_running: bool,

    outstanding: Option<Outstanding>,
    send_queue: VecDeque<Vec<u8>>,
    /// Octets of the front message already segmented
    tx_offset: usize,
    rx_buf: Vec<u8>,

    peer_busy: bool,
    own_busy: bool,
    reject_exception: bool,
    /// Information field of our SABM, UA must echo it
    contention: Option<Vec<u8>>,
    /// Information field of the last SABM accepted from the peer, repeated SABMs get the same UA
    peer_sabm: Option<Vec<u8>>,
}

impl Datalink {
    pub fn new(params: DatalinkParams) -> Self {
        Datalink {
            params,
            state: LinkState::Idle,
            vs: 0,
            va: 0,
            vr: 0,
            retrans: 0,
            t200_running: false,
            outstanding: None,
            send_queue: VecDeque::new(),
            tx_offset: 0,
            rx_buf: Vec::new(),
            peer_busy: false,
            own_busy: false,
            reject_exception: false,
            contention: None,
            peer_sabm: None,
        }
    }

    pub fn params(&self) -> &DatalinkParams {
        &self.params
    }

    pub fn sapi(&self) -> u8 {
        self.params.sapi
    }

    pub fn state(&self) -> DlState {
        match self.state {
            LinkState::Null => DlState::Null,
            LinkState::Idle => DlState::Idle,
            LinkState::SabmSent => DlState::SabmSent,
            LinkState::DiscSent => DlState::DiscSent,
            LinkState::MfEst if self.own_busy => DlState::OwnRcvrBusy,
            LinkState::MfEst => DlState::MfEst,
            LinkState::TimerRecovery => DlState::TimerRecovery,
        }
    }

    /// (V(S), V(A), V(R))
    pub fn seq_vars(&self) -> (u8, u8, u8) {
        (self.vs, self.va, self.vr)
    }

    pub fn retrans_count(&self) -> u32 {
        self.retrans
    }

    pub fn t200_running(&self) -> bool {
        self.t200_running
    }

    pub fn peer_busy(&self) -> bool {
        self.peer_busy
    }

    /// Number of messages waiting, including the one being segmented
    pub fn queued(&self) -> usize {
        self.send_queue.len()
    }

    fn established(&self) -> bool {
        matches!(self.state, LinkState::MfEst | LinkState::TimerRecovery)
    }

    fn set_state(&mut self, state: LinkState) {
        if self.state != state {
            tracing::debug!("lapdm sapi {}: {:?} -> {:?}", self.params.sapi, self.state, state);
            self.state = state;
        }
    }

    fn start_t200(&mut self, out: &mut Vec<DlAction>) {
        self.t200_running = true;
        out.push(DlAction::StartT200);
    }

    fn stop_t200(&mut self, out: &mut Vec<DlAction>) {
        if self.t200_running {
            self.t200_running = false;
            out.push(DlAction::StopT200);
        }
    }

    fn clear_vars(&mut self) {
        self.vs = 0;
        self.va = 0;
        self.vr = 0;
        self.retrans = 0;
        self.peer_busy = false;
        self.own_busy = false;
        self.reject_exception = false;
    }

    fn flush(&mut self) {
        self.outstanding = None;
        self.send_queue.clear();
        self.tx_offset = 0;
        self.rx_buf.clear();
    }

    /// Return to `state` with T200 stopped, queues flushed and sequence variables cleared
    fn release_to(&mut self, state: LinkState, out: &mut Vec<DlAction>) {
        if !matches!(self.state, LinkState::Null | LinkState::Idle) {
            out.push(DlAction::FlushTx);
        }
        self.stop_t200(out);
        self.flush();
        self.clear_vars();
        self.contention = None;
        self.peer_sabm = None;
        self.set_state(state);
    }

    fn tx_u(&self, cmd: bool, pf: bool, u: UFrameType, info: Vec<u8>) -> DlAction {
        let cr = if cmd { self.params.cmd_cr() } else { self.params.resp_cr() };
        DlAction::Tx(LapdmFrame::new_u(self.params.sapi, cr, pf, u, info))
    }

    fn tx_s(&self, cmd: bool, pf: bool, s: SFrameType) -> DlAction {
        let cr = if cmd { self.params.cmd_cr() } else { self.params.resp_cr() };
        DlAction::Tx(LapdmFrame::new_s(self.params.sapi, cr, pf, s, self.vr))
    }

    fn tx_outstanding(&self, p: bool) -> Option<DlAction> {
        let o = self.outstanding.as_ref()?;
        let frame = LapdmFrame::new_i(self.params.sapi, self.params.cmd_cr(), p, o.ns, self.vr, o.more, o.info.clone());
        Some(DlAction::Tx(frame))
    }

    /// Receiver ready or not ready, depending on the own busy condition
    fn rr_or_rnr(&self) -> SFrameType {
        if self.own_busy { SFrameType::Rnr } else { SFrameType::Rr }
    }

    /// Establish request. An information field starts contention resolution.
    pub fn establish(&mut self, l3: Option<Vec<u8>>) -> Result<Vec<DlAction>, LapdmError> {
        self.check_establish(l3.as_ref().map_or(0, |l3| l3.len()))?;

        let mut out = Vec::new();
        if self.established() {
            tracing::info!("lapdm sapi {}: re-establishing", self.params.sapi);
        }
        self.release_to(LinkState::Idle, &mut out);

        let info = l3.unwrap_or_default();
        self.contention = if info.is_empty() { None } else { Some(info.clone()) };
        out.push(self.tx_u(true, true, UFrameType::Sabm, info));
        self.set_state(LinkState::SabmSent);
        self.start_t200(&mut out);
        Ok(out)
    }

    pub fn check_establish(&self, len: usize) -> Result<(), LapdmError> {
        if matches!(self.state, LinkState::SabmSent | LinkState::DiscSent) {
            return Err(LapdmError::InvalidState(self.state()));
        }
        if len > self.params.n201 {
            return Err(LapdmError::TooLong { len, max: self.params.n201 });
        }
        Ok(())
    }

    pub fn check_release(&self) -> Result<(), LapdmError> {
        if self.state == LinkState::DiscSent {
            return Err(LapdmError::InvalidState(self.state()));
        }
        Ok(())
    }

    /// Release request. NORMAL exchanges DISC/UA with the peer, LOCAL releases immediately.
    pub fn release(&mut self, mode: ReleaseMode) -> Result<Vec<DlAction>, LapdmError> {
        self.check_release()?;
        let mut out = Vec::new();
        match (mode, self.state) {
            (ReleaseMode::Normal, LinkState::MfEst | LinkState::TimerRecovery) => {
                out.push(DlAction::FlushTx);
                self.stop_t200(&mut out);
                self.flush();
                self.clear_vars();
                out.push(self.tx_u(true, true, UFrameType::Disc, Vec::new()));
                self.set_state(LinkState::DiscSent);
                self.start_t200(&mut out);
            }
            _ => {
                self.release_to(LinkState::Idle, &mut out);
                out.push(DlAction::Up(DlUp::ReleaseConf));
            }
        }
        Ok(out)
    }

    pub fn check_data_request(&self, len: usize) -> Result<(), LapdmError> {
        if !self.established() {
            return Err(LapdmError::NotEstablished);
        }
        if len == 0 {
            return Err(LapdmError::Empty);
        }
        if len > self.params.max_reassembly_len {
            return Err(LapdmError::TooLong { len, max: self.params.max_reassembly_len });
        }
        if self.send_queue.len() >= self.params.send_queue_limit {
            return Err(LapdmError::QueueFull);
        }
        Ok(())
    }

    /// Acknowledged transfer. Messages longer than N201 are segmented.
    pub fn data_request(&mut self, l3: Vec<u8>) -> Result<Vec<DlAction>, LapdmError> {
        self.check_data_request(l3.len())?;
        let mut out = Vec::new();
        self.send_queue.push_back(l3);
        self.try_send_next(&mut out);
        Ok(out)
    }

    pub fn check_unit_data_request(&self, len: usize) -> Result<(), LapdmError> {
        if len == 0 {
            return Err(LapdmError::Empty);
        }
        if len > self.params.n201_ui {
            return Err(LapdmError::TooLong { len, max: self.params.n201_ui });
        }
        Ok(())
    }

    /// Unacknowledged transfer in a UI command, allowed in any state
    pub fn unit_data_request(&mut self, l3: Vec<u8>) -> Result<Vec<DlAction>, LapdmError> {
        self.check_unit_data_request(l3.len())?;
        Ok(vec![self.tx_u(true, false, UFrameType::Ui, l3)])
    }

    /// Set or clear the own receiver busy condition
    pub fn set_own_busy(&mut self, busy: bool) -> Result<Vec<DlAction>, LapdmError> {
        if !self.established() {
            return Err(LapdmError::NotEstablished);
        }
        let mut out = Vec::new();
        if busy != self.own_busy {
            self.own_busy = busy;
            out.push(self.tx_s(false, false, self.rr_or_rnr()));
        }
        Ok(out)
    }

    /// Drop all state without peer signalling
    pub fn reset(&mut self) -> Vec<DlAction> {
        let mut out = Vec::new();
        self.release_to(LinkState::Idle, &mut out);
        out
    }

    /// Send the next I-frame segment if the window is open
    fn try_send_next(&mut self, out: &mut Vec<DlAction>) -> bool {
        if self.state != LinkState::MfEst || self.peer_busy || self.outstanding.is_some() {
            return false;
        }
        let Some(msg) = self.send_queue.front() else {
            return false;
        };

        let end = (self.tx_offset + self.params.n201).min(msg.len());
        let info = msg[self.tx_offset..end].to_vec();
        let more = end < msg.len();
        if more {
            self.tx_offset = end;
        } else {
            self.send_queue.pop_front();
            self.tx_offset = 0;
        }

        self.outstanding = Some(Outstanding { ns: self.vs, info, more });
        if let Some(tx) = self.tx_outstanding(false) {
            out.push(tx);
        }
        self.vs = inc(self.vs);
        self.start_t200(out);
        true
    }

    /// T200 expiry
    pub fn t200_expired(&mut self) -> Vec<DlAction> {
        let mut out = Vec::new();
        if !self.t200_running {
            return out;
        }
        self.t200_running = false;

        match self.state {
            LinkState::SabmSent => {
                if self.retrans < self.params.n200_est_rel {
                    self.retrans += 1;
                    tracing::debug!("lapdm sapi {}: SABM retransmission {}", self.params.sapi, self.retrans);
                    let info = self.contention.clone().unwrap_or_default();
                    out.push(self.tx_u(true, true, UFrameType::Sabm, info));
                    self.start_t200(&mut out);
                } else {
                    self.link_failure(&mut out);
                }
            }
            LinkState::DiscSent => {
                if self.retrans < self.params.n200_est_rel {
                    self.retrans += 1;
                    out.push(self.tx_u(true, true, UFrameType::Disc, Vec::new()));
                    self.start_t200(&mut out);
                } else {
                    self.release_to(LinkState::Idle, &mut out);
                    out.push(DlAction::Up(DlUp::ReleaseConf));
                }
            }
            LinkState::MfEst => {
                if self.outstanding.is_some() {
                    self.retrans = 1;
                    self.set_state(LinkState::TimerRecovery);
                    out.extend(self.tx_outstanding(true));
                    self.start_t200(&mut out);
                }
            }
            LinkState::TimerRecovery => {
                if self.retrans >= self.params.n200 {
                    self.link_failure(&mut out);
                } else {
                    self.retrans += 1;
                    tracing::debug!("lapdm sapi {}: retransmission {}", self.params.sapi, self.retrans);
                    out.extend(self.tx_outstanding(true));
                    self.start_t200(&mut out);
                }
            }
            LinkState::Null | LinkState::Idle => {}
        }
        out
    }

    fn link_failure(&mut self, out: &mut Vec<DlAction>) {
        tracing::warn!("lapdm sapi {}: link failure in {:?} after {} retransmissions", self.params.sapi, self.state, self.retrans);
        self.release_to(LinkState::Null, out);
        out.push(DlAction::Up(DlUp::ReleaseInd(ReleaseCause::LinkFailure)));
        out.push(DlAction::MdlError(MdlCause::T200Expired));
    }

    /// Process a received frame of this SAPI
    pub fn rx_frame(&mut self, frame: LapdmFrame) -> Vec<DlAction> {
        let mut out = Vec::new();
        let cmd = self.params.rx_is_command(frame.addr.cr);
        tracing::debug!("lapdm sapi {}: rx {} in {:?}", self.params.sapi, frame, self.state());

        match frame.ctrl {
            Control::U { pf, u } => self.rx_u(frame, cmd, pf, u, &mut out),
            Control::S { nr, pf, s } => self.rx_s(frame.l(), cmd, pf, nr, s, &mut out),
            Control::I { nr, p, ns } => self.rx_i(frame, cmd, p, ns, nr, &mut out),
        }
        out
    }

    fn rx_u(&mut self, frame: LapdmFrame, cmd: bool, pf: bool, u: UFrameType, out: &mut Vec<DlAction>) {
        if cmd != u.is_command() {
            tracing::debug!("lapdm sapi {}: {} with wrong C/R", self.params.sapi, u);
            out.push(DlAction::MdlError(MdlCause::UfrmIncParam));
            return;
        }

        match u {
            UFrameType::Sabm => self.rx_sabm(frame, pf, out),
            UFrameType::Ua => self.rx_ua(frame, pf, out),
            UFrameType::Dm => {
                if frame.l() > 0 {
                    out.push(DlAction::MdlError(MdlCause::UfrmIncParam));
                    return;
                }
                self.rx_dm(pf, out);
            }
            UFrameType::Disc => {
                if frame.l() > 0 {
                    out.push(DlAction::MdlError(MdlCause::UfrmIncParam));
                    return;
                }
                self.rx_disc(pf, out);
            }
            UFrameType::Ui => {
                if frame.l() == 0 {
                    return;
                }
                out.push(DlAction::Up(DlUp::UnitDataInd(frame.info)));
            }
        }
    }

    fn rx_sabm(&mut self, frame: LapdmFrame, pf: bool, out: &mut Vec<DlAction>) {
        if frame.l() > self.params.n201 {
            out.push(DlAction::MdlError(MdlCause::UfrmIncParam));
            return;
        }
        let info = frame.info;
        match self.state {
            LinkState::Null | LinkState::Idle => {
                self.release_to(LinkState::Idle, out);
                out.push(self.tx_u(false, pf, UFrameType::Ua, info.clone()));
                self.set_state(LinkState::MfEst);
                tracing::info!("lapdm sapi {}: established by peer", self.params.sapi);
                let l3 = if info.is_empty() { None } else { Some(info.clone()) };
                self.peer_sabm = Some(info);
                out.push(DlAction::Up(DlUp::EstablishInd(l3)));
            }
            LinkState::MfEst | LinkState::TimerRecovery => {
                if !info.is_empty() {
                    if self.peer_sabm.as_ref() == Some(&info) {
                        // Our UA was lost, repeat it
                        out.push(self.tx_u(false, pf, UFrameType::Ua, info));
                    } else {
                        out.push(DlAction::MdlError(MdlCause::SabmInfoNotall));
                    }
                    return;
                }
                self.release_to(LinkState::Idle, out);
                out.push(self.tx_u(false, pf, UFrameType::Ua, Vec::new()));
                self.set_state(LinkState::MfEst);
                self.peer_sabm = Some(info);
                out.push(DlAction::MdlError(MdlCause::SabmMf));
                out.push(DlAction::Up(DlUp::EstablishInd(None)));
            }
            LinkState::SabmSent => {
                // Both sides establishing at once
                out.push(self.tx_u(false, pf, UFrameType::Ua, info));
                self.stop_t200(out);
                self.clear_vars();
                self.set_state(LinkState::MfEst);
                out.push(DlAction::Up(DlUp::EstablishConf));
            }
            LinkState::DiscSent => {
                out.push(self.tx_u(false, pf, UFrameType::Dm, Vec::new()));
            }
        }
    }

    fn rx_ua(&mut self, frame: LapdmFrame, pf: bool, out: &mut Vec<DlAction>) {
        match self.state {
            LinkState::SabmSent if pf => {
                let expected = self.contention.take().unwrap_or_default();
                if frame.info != expected {
                    tracing::warn!("lapdm sapi {}: contention resolution failed", self.params.sapi);
                    self.release_to(LinkState::Idle, out);
                    out.push(DlAction::Up(DlUp::ReleaseInd(ReleaseCause::ContentionResolution)));
                    out.push(DlAction::MdlError(MdlCause::UfrmIncParam));
                    return;
                }
                self.stop_t200(out);
                self.clear_vars();
                self.set_state(LinkState::MfEst);
                tracing::info!("lapdm sapi {}: established", self.params.sapi);
                out.push(DlAction::Up(DlUp::EstablishConf));
            }
            LinkState::DiscSent if pf => {
                self.release_to(LinkState::Idle, out);
                out.push(DlAction::Up(DlUp::ReleaseConf));
            }
            _ => out.push(DlAction::MdlError(MdlCause::UnsolUa)),
        }
    }

    fn rx_dm(&mut self, pf: bool, out: &mut Vec<DlAction>) {
        match self.state {
            LinkState::SabmSent if pf => {
                self.release_to(LinkState::Idle, out);
                out.push(DlAction::Up(DlUp::ReleaseInd(ReleaseCause::PeerDm)));
            }
            LinkState::DiscSent if pf => {
                self.release_to(LinkState::Idle, out);
                out.push(DlAction::Up(DlUp::ReleaseConf));
            }
            LinkState::MfEst | LinkState::TimerRecovery => {
                let cause = if pf { MdlCause::UnsolDmMf } else { MdlCause::UnsolDm };
                out.push(DlAction::MdlError(cause));
            }
            _ => {}
        }
    }

    fn rx_disc(&mut self, pf: bool, out: &mut Vec<DlAction>) {
        match self.state {
            LinkState::MfEst | LinkState::TimerRecovery => {
                self.release_to(LinkState::Idle, out);
                out.push(self.tx_u(false, pf, UFrameType::Ua, Vec::new()));
                out.push(DlAction::Up(DlUp::ReleaseInd(ReleaseCause::PeerDisc)));
            }
            LinkState::SabmSent => {
                self.release_to(LinkState::Idle, out);
                out.push(self.tx_u(false, pf, UFrameType::Dm, Vec::new()));
                out.push(DlAction::Up(DlUp::ReleaseInd(ReleaseCause::PeerDisc)));
            }
            LinkState::DiscSent => {
                out.push(self.tx_u(false, pf, UFrameType::Ua, Vec::new()));
            }
            LinkState::Null | LinkState::Idle => {
                out.push(self.tx_u(false, pf, UFrameType::Dm, Vec::new()));
            }
        }
    }

    /// Answer a command with P=1 received while not established
    fn dm_if_polled(&self, cmd: bool, pf: bool, out: &mut Vec<DlAction>) {
        if cmd && pf && matches!(self.state, LinkState::Null | LinkState::Idle) {
            out.push(self.tx_u(false, true, UFrameType::Dm, Vec::new()));
        }
    }

    /// Process N(R). Returns false on a sequence error, in which case the frame must be discarded.
    fn ack(&mut self, nr: u8, out: &mut Vec<DlAction>) -> bool {
        // With window size 1, V(A) <= N(R) <= V(S) leaves exactly these two values
        if nr != self.va && nr != self.vs {
            tracing::debug!("lapdm sapi {}: N(R)={} outside V(A)={} V(S)={}", self.params.sapi, nr, self.va, self.vs);
            out.push(DlAction::MdlError(MdlCause::SeqErr));
            return false;
        }
        if nr == self.vs && self.outstanding.is_some() {
            self.va = nr;
            self.outstanding = None;
            self.stop_t200(out);
            self.retrans = 0;
            if self.state == LinkState::TimerRecovery {
                self.set_state(LinkState::MfEst);
            }
        }
        true
    }

    fn rx_s(&mut self, l: usize, cmd: bool, pf: bool, nr: u8, s: SFrameType, out: &mut Vec<DlAction>) {
        if l > 0 {
            out.push(DlAction::MdlError(MdlCause::SfrmIncParam));
            return;
        }
        if !self.established() {
            self.dm_if_polled(cmd, pf, out);
            return;
        }

        if !self.ack(nr, out) {
            return;
        }
        self.peer_busy = s == SFrameType::Rnr;

        if cmd && pf {
            out.push(self.tx_s(false, true, self.rr_or_rnr()));
        }

        if self.outstanding.is_some() && (s == SFrameType::Rej || (!cmd && pf && self.state == LinkState::TimerRecovery)) {
            // Peer asks for the outstanding frame again
            out.extend(self.tx_outstanding(false));
            self.set_state(LinkState::MfEst);
            self.stop_t200(out);
            self.start_t200(out);
            return;
        }
        self.try_send_next(out);
    }

    fn rx_i(&mut self, frame: LapdmFrame, cmd: bool, p: bool, ns: u8, nr: u8, out: &mut Vec<DlAction>) {
        let len = frame.l();
        if len > self.params.n201 {
            out.push(DlAction::MdlError(MdlCause::IfrmIncLen));
            return;
        }
        if frame.more() && len != self.params.n201 {
            out.push(DlAction::MdlError(MdlCause::IfrmIncMbits));
            return;
        }
        if !cmd {
            out.push(DlAction::MdlError(MdlCause::FrmUnimpl));
            return;
        }
        if !self.established() {
            self.dm_if_polled(cmd, p, out);
            return;
        }

        let mut ack_owed = p;
        if self.own_busy {
            // Discard without advancing V(R), the peer will retransmit
            tracing::debug!("lapdm sapi {}: own receiver busy, discarding N(S)={}", self.params.sapi, ns);
            out.push(self.tx_s(false, p, SFrameType::Rnr));
            ack_owed = false;
        } else if ns == self.vr {
            self.vr = inc(self.vr);
            self.reject_exception = false;
            let more = frame.more();
            self.rx_buf.extend_from_slice(&frame.info);
            if self.rx_buf.len() > self.params.max_reassembly_len {
                tracing::warn!("lapdm sapi {}: reassembly exceeds {} octets, dropped", self.params.sapi, self.params.max_reassembly_len);
                self.rx_buf.clear();
                out.push(DlAction::MdlError(MdlCause::IfrmIncLen));
            } else if !more {
                out.push(DlAction::Up(DlUp::DataInd(std::mem::take(&mut self.rx_buf))));
            }
            ack_owed = true;
        } else if !self.reject_exception {
            self.reject_exception = true;
            out.push(self.tx_s(false, p, SFrameType::Rej));
            out.push(DlAction::MdlError(MdlCause::SeqErr));
            ack_owed = false;
        }

        if !self.ack(nr, out) {
            return;
        }

        if p && ack_owed {
            // Polled: answer immediately with F=1
            out.push(self.tx_s(false, true, SFrameType::Rr));
        } else if !self.try_send_next(out) && ack_owed {
            // Nothing to piggyback N(R) on
            out.push(self.tx_s(false, false, SFrameType::Rr));
        }
    }
}
