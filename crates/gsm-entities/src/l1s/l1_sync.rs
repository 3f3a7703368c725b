use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use crossbeam_channel::{Receiver, Sender, TryRecvError};

use gsm_config::SharedConfig;
use gsm_core::mframe_task::MframeTask;
use gsm_core::{
    BurstType, ChanNr, FrameNumber, GSM_MACBLOCK_LEN, GSM_MACBLOCK_PADDING, GsmTime, LinkId, MsgBuf,
    SACCH_L1_HDR_LEN, SignalQuality, link_id_is_sacch, link_id_sapi,
};
use gsm_saps::ph::PhDataInd;

use crate::l1s::clock::{ClockEvent, FrameClock};
use crate::l1s::gsmtime_sched::GsmTimeScheduler;
use crate::l1s::mframe_sched::{MframeJob, MframeScheduler, TaskMaskHandle};
use crate::l1s::mframe_tables::MframeOp;
use crate::phy::PhyIf;

/// LAPDm fill frame sent when no block is queued: UI, SAPI 0, L=0
const LAPDM_FILL_FRAME: [u8; 3] = [0x01, 0x03, 0x01];

/// Frames after its first burst before an unanswered receive job is dropped
const RX_JOB_TIMEOUT: i32 = 8;

/// Requests from the main loop to the tick context
#[derive(Debug)]
pub enum L1Command {
    /// Queue a block for the next uplink opportunity of the channel
    DataReq { chan_nr: ChanNr, link_id: LinkId, payload: Vec<u8> },
    /// Drop queued blocks of one data link, or of the whole channel
    Flush { chan_nr: ChanNr, link_id: Option<LinkId> },
    /// Send an access burst at `fnr`, or as soon as possible
    RachReq { ra: u8, fnr: Option<FrameNumber> },
    /// Return the frame clock to WAIT and drop everything pending
    ClockReset,
}

/// Reports from the tick context to the main loop
#[derive(Debug)]
pub enum L1Event {
    PhDataInd(PhDataInd),
    RachConf { ra: u8, fnr: FrameNumber },
    Sync { time: GsmTime, bsic: u8 },
    Resync { from: FrameNumber, to: FrameNumber, dropped: usize },
}

/// Frame counters written by the tick context, read by the main loop clock supervision
#[derive(Debug)]
pub struct L1Status {
    frames: AtomicU64,
    last_fn: AtomicU32,
}

impl L1Status {
    const NO_FN: u32 = u32::MAX;

    fn new() -> Self {
        L1Status { frames: AtomicU64::new(0), last_fn: AtomicU32::new(Self::NO_FN) }
    }

    /// Number of frames processed since start
    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Acquire)
    }

    pub fn last_fn(&self) -> Option<FrameNumber> {
        match self.last_fn.load(Ordering::Acquire) {
            Self::NO_FN => None,
            fnr => Some(FrameNumber::new(fnr)),
        }
    }

    fn record(&self, fnr: FrameNumber) {
        self.last_fn.store(fnr.get(), Ordering::Release);
        self.frames.fetch_add(1, Ordering::AcqRel);
    }
}

/// Main loop end of the connection to L1Sync
pub struct L1Link {
    pub cmd_tx: Sender<L1Command>,
    pub event_rx: Receiver<L1Event>,
    pub tasks: TaskMaskHandle,
    pub status: Arc<L1Status>,
}

#[derive(Debug)]
struct RachBurst {
    ra: u8,
    fnr: FrameNumber,
}

/// Downlink block expected from the PHY
#[derive(Debug)]
struct RxJob {
    fnr: FrameNumber,
    tn: u8,
    chan_nr: ChanNr,
    link_id: LinkId,
}

/// Layer 1 synchronous part, running in the frame tick context of the PHY.
/// Never blocks; talks to the main loop only through channels and the atomic task mask.
pub struct L1Sync {
    clock: FrameClock,
    sched: MframeScheduler,
    gsmtime: GsmTimeScheduler<RachBurst>,
    phy: Box<dyn PhyIf>,

    cmd_rx: Receiver<L1Command>,
    event_tx: Sender<L1Event>,
    status: Arc<L1Status>,

    /// Uplink blocks per (channel, SACCH flag) with their link identifier, FIFO
    ul_queues: HashMap<(ChanNr, bool), VecDeque<(LinkId, Vec<u8>)>>,
    rx_jobs: Vec<RxJob>,
    ahead: u32,
    /// Last SACCH layer 1 header handed down by LAPDm, reused for fill frames
    sacch_hdr: [u8; SACCH_L1_HDR_LEN],
}

impl L1Sync {
    pub fn new(config: &SharedConfig, phy: Box<dyn PhyIf>) -> (L1Sync, L1Link) {
        let cfg = config.config();
        let (cmd_tx, cmd_rx) = crossbeam_channel::unbounded();
        let (event_tx, event_rx) = crossbeam_channel::unbounded();
        let tasks = TaskMaskHandle::new();
        let status = Arc::new(L1Status::new());
        let sacch_hdr = {
            let state = config.state_read();
            [state.ms_power, state.timing_advance]
        };

        let l1s = L1Sync {
            clock: FrameClock::new(cfg.l1.clock_tolerance),
            sched: MframeScheduler::new(tasks.clone(), cfg.l1.schedule_ahead),
            gsmtime: GsmTimeScheduler::new(),
            phy,
            cmd_rx,
            event_tx,
            status: status.clone(),
            ul_queues: HashMap::new(),
            rx_jobs: Vec::new(),
            ahead: cfg.l1.schedule_ahead,
            sacch_hdr,
        };
        let link = L1Link { cmd_tx, event_rx, tasks, status };
        (l1s, link)
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    /// Enable a task directly from the tick context, equivalent to an MPH-TASK request
    pub fn enable_task(&self, task: MframeTask) {
        self.sched.handle().enable(task);
    }

    /// Frame indication from the PHY. Runs clock, commands, one-shot events and the multiframe scheduler.
    pub fn frame_tick(&mut self, observed: FrameNumber) {
        let event = self.clock.handle(observed);
        let current = event.fnr();

        if let ClockEvent::Resync { from, to } = event {
            let dropped = if to.diff(from) > 0 { self.gsmtime.drop_before(to) } else { 0 };
            if dropped > 0 {
                tracing::warn!(fnr = current.get(), "l1s: dropped {} one-shot events in skipped frames", dropped);
            }
            self.rx_jobs.clear();
            self.sched.reset();
            self.emit(L1Event::Resync { from, to, dropped });
        }

        if !self.drain_commands(current) {
            return;
        }

        for (_, rach) in self.gsmtime.pop_due(current) {
            tracing::debug!(fnr = current.get(), "l1s: RACH ra={:#04x} at {:?}", rach.ra, rach.fnr);
            self.phy.burst_send(0, rach.fnr, BurstType::Ab, &[rach.ra]);
            self.emit(L1Event::RachConf { ra: rach.ra, fnr: rach.fnr });
        }

        for job in self.sched.schedule(current) {
            self.run_job(&job);
        }

        self.status.record(current);
        self.rx_jobs.retain(|job| current.diff(job.fnr) <= RX_JOB_TIMEOUT);
    }

    /// Burst or decoded block received by the PHY
    pub fn burst_receive_indication(&mut self, tn: u8, fnr: FrameNumber, burst_type: BurstType, payload: &[u8], quality: SignalQuality) {
        match burst_type {
            BurstType::Nb => {
                let Some(pos) = self.rx_jobs.iter().position(|job| job.tn == tn && job.fnr == fnr) else {
                    tracing::trace!(fnr = fnr.get(), "l1s: unsolicited block on tn {}", tn);
                    return;
                };
                let job = self.rx_jobs.swap_remove(pos);
                if quality.crc_fail {
                    tracing::debug!(fnr = fnr.get(), "l1s: bad block on chan_nr {:#04x}", job.chan_nr);
                    return;
                }
                if payload.len() != GSM_MACBLOCK_LEN {
                    tracing::warn!(fnr = fnr.get(), "l1s: block of {} octets on chan_nr {:#04x}", payload.len(), job.chan_nr);
                    return;
                }
                self.emit(L1Event::PhDataInd(PhDataInd {
                    chan_nr: job.chan_nr,
                    link_id: job.link_id,
                    fnr,
                    payload: payload.to_vec(),
                    quality,
                }));
            }
            BurstType::Sb => {
                let Some(octets) = payload.first_chunk::<4>() else {
                    tracing::warn!(fnr = fnr.get(), "l1s: short SCH payload");
                    return;
                };
                let (time, bsic) = GsmTime::from_sch_info(u32::from_le_bytes(*octets));
                tracing::debug!(fnr = fnr.get(), "l1s: SCH time {} bsic {}", time, bsic);
                self.emit(L1Event::Sync { time, bsic });
            }
            BurstType::Fb | BurstType::Ab | BurstType::Dummy => {
                tracing::trace!(fnr = fnr.get(), "l1s: ignoring {:?} burst on tn {}", burst_type, tn);
            }
        }
    }

    /// Returns false if the clock was reset and the rest of the tick must be skipped
    fn drain_commands(&mut self, current: FrameNumber) -> bool {
        loop {
            match self.cmd_rx.try_recv() {
                Ok(L1Command::DataReq { chan_nr, link_id, payload }) => self.queue_ul(chan_nr, link_id, payload),
                Ok(L1Command::Flush { chan_nr, link_id }) => self.flush_ul(current, chan_nr, link_id),
                Ok(L1Command::RachReq { ra, fnr }) => {
                    let earliest = current.add_frames(self.ahead as i32);
                    let fnr = fnr.filter(|f| f.reached(earliest)).unwrap_or(earliest);
                    self.gsmtime.schedule(current, fnr.add_frames(-(self.ahead as i32)), RachBurst { ra, fnr });
                }
                Ok(L1Command::ClockReset) => {
                    self.clock.reset();
                    self.gsmtime.clear();
                    self.ul_queues.clear();
                    self.rx_jobs.clear();
                    self.sched.reset();
                    return false;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return true,
            }
        }
    }

    fn queue_ul(&mut self, chan_nr: ChanNr, link_id: LinkId, payload: Vec<u8>) {
        let sacch = link_id_is_sacch(link_id);
        if payload.len() != GSM_MACBLOCK_LEN {
            tracing::warn!("l1s: uplink block of {} octets on chan_nr {:#04x}", payload.len(), chan_nr);
        }
        if sacch {
            if let Some(hdr) = payload.first_chunk::<SACCH_L1_HDR_LEN>() {
                self.sacch_hdr = *hdr;
            }
        }
        self.ul_queues.entry((chan_nr, sacch)).or_default().push_back((link_id, payload));
    }

    fn flush_ul(&mut self, current: FrameNumber, chan_nr: ChanNr, link_id: Option<LinkId>) {
        let before: usize = self.ul_queues.values().map(VecDeque::len).sum();
        match link_id {
            Some(link_id) => {
                let sapi = link_id_sapi(link_id);
                if let Some(q) = self.ul_queues.get_mut(&(chan_nr, link_id_is_sacch(link_id))) {
                    q.retain(|(queued, _)| link_id_sapi(*queued) != sapi);
                }
            }
            None => {
                self.ul_queues.retain(|(queued, _), _| *queued != chan_nr);
            }
        }
        let after: usize = self.ul_queues.values().map(VecDeque::len).sum();
        if before != after {
            tracing::debug!(fnr = current.get(), "l1s: flushed {} uplink blocks of chan_nr {:#04x}", before - after, chan_nr);
        }
    }

    fn pop_ul(&mut self, chan_nr: ChanNr, sacch: bool) -> Option<Vec<u8>> {
        self.ul_queues.get_mut(&(chan_nr, sacch)).and_then(|q| q.pop_front()).map(|(_, payload)| payload)
    }

    fn fill_block(&self, sacch: bool) -> Vec<u8> {
        let mut buf = MsgBuf::with_capacity(GSM_MACBLOCK_LEN);
        if sacch {
            buf.write_octets(&self.sacch_hdr);
        }
        buf.write_octets(&LAPDM_FILL_FRAME);
        buf.pad_to(GSM_MACBLOCK_LEN, GSM_MACBLOCK_PADDING);
        buf.into_bytes()
    }

    fn expect_rx(&mut self, job: &MframeJob, chan_nr: ChanNr) {
        self.rx_jobs.push(RxJob { fnr: job.fnr, tn: job.tn, chan_nr, link_id: job.link_id });
    }

    fn run_job(&mut self, job: &MframeJob) {
        let sacch = job.is_sacch();
        match (job.op, job.chan_nr) {
            (MframeOp::NbQuadDl, Some(chan_nr)) => self.expect_rx(job, chan_nr),
            (MframeOp::NbQuadUl, Some(chan_nr)) => {
                let block = self.pop_ul(chan_nr, sacch).unwrap_or_else(|| self.fill_block(sacch));
                self.phy.burst_send(job.tn, job.fnr, BurstType::Nb, &block);
            }
            (MframeOp::NbQuadUl, None) => {
                // Test transmission on all normal burst opportunities
                let block = self.fill_block(false);
                self.phy.burst_send(job.tn, job.fnr, BurstType::Nb, &block);
            }
            (MframeOp::Tch, Some(chan_nr)) => {
                if facch_block_start(job.task, job.fnr) {
                    self.expect_rx(job, chan_nr);
                    if let Some(block) = self.pop_ul(chan_nr, false) {
                        self.phy.burst_send(job.tn, job.fnr, BurstType::Nb, &block);
                    }
                }
            }
            (MframeOp::TchA, Some(chan_nr)) => {
                // SACCH/T blocks span four 26-multiframes
                if (job.fnr.get() / 26) % 4 == 0 {
                    self.expect_rx(job, chan_nr);
                    let block = self.pop_ul(chan_nr, true).unwrap_or_else(|| self.fill_block(true));
                    self.phy.burst_send(job.tn, job.fnr, BurstType::Nb, &block);
                }
            }
            (MframeOp::TchD, _) => {}
            (MframeOp::NeighPm, _) => self.phy.power_measurement(job.fnr),
            (op, None) => {
                tracing::warn!(fnr = job.fnr.get(), "l1s: {:?} of {} without channel", op, job.task);
            }
        }
    }

    fn emit(&self, event: L1Event) {
        if self.event_tx.send(event).is_err() {
            tracing::warn!("l1s: main loop gone, dropping event");
        }
    }
}

/// FACCH blocks start on every fourth traffic frame of the 13-frame group
fn facch_block_start(task: MframeTask, fnr: FrameNumber) -> bool {
    let t = fnr.modulo(13);
    let phase = if task == MframeTask::TchH1 { 1 } else { 0 };
    t < 12 && t % 4 == phase
}
