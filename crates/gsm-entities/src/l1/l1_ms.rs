use std::time::Duration;

use gsm_config::SharedConfig;
use gsm_core::gsm_entities::GsmEntity;
use gsm_core::mframe_task::MframeTask;
use gsm_core::{FrameNumber, Sap};
use gsm_saps::mph::{MphClockLostInd, MphResyncInd, MphSyncInd, MphTaskOp, MphTaskReq};
use gsm_saps::ph::PhRachConf;
use gsm_saps::{SapMsg, SapMsgInner};

use crate::l1s::{L1Command, L1Event, L1Link};
use crate::timer::{TimerHandle, TimerRegistry};
use crate::{GsmEntityTrait, MessageQueue};

/// Main loop front of the tick-context L1. Converts L1Sync events into primitives,
/// forwards PH and MPH requests and supervises the frame clock.
pub struct L1Ms {
    config: SharedConfig,
    link: L1Link,

    timers: TimerRegistry<()>,
    supervision: TimerHandle,
    /// Frame count at the last supervision expiry
    last_frames: u64,
    idle_periods: u32,
    clock_lost: bool,

    /// Latest frame number reported by L1Sync
    fnr: FrameNumber,
}

impl L1Ms {
    pub fn new(config: SharedConfig, link: L1Link) -> Self {
        let cfg = config.config();
        let mut timers = TimerRegistry::new();
        let supervision = timers.alloc();
        if let Err(e) = timers.timer_schedule_periodic(supervision, Duration::from_millis(cfg.l1.supervision_ms), ()) {
            tracing::error!("l1: cannot start clock supervision: {}", e);
        }

        let initial = MframeTask::mask_of(&cfg.l1.initial_tasks);
        if initial != 0 {
            tracing::info!("l1: initial tasks {:#010x}", initial);
            link.tasks.set(initial);
        }

        Self {
            config,
            link,
            timers,
            supervision,
            last_frames: 0,
            idle_periods: 0,
            clock_lost: false,
            fnr: FrameNumber::default(),
        }
    }

    fn send_cmd(&self, cmd: L1Command) {
        if self.link.cmd_tx.send(cmd).is_err() {
            tracing::warn!("l1: tick context gone, dropping command");
        }
    }

    fn send_up(&self, queue: &mut MessageQueue, sap: Sap, dest: GsmEntity, msg: SapMsgInner) {
        tracing::debug!("<- {} to {:?}", msg, dest);
        queue.push_back(SapMsg::new(sap, GsmEntity::L1, dest, self.fnr, msg));
    }

    fn drain_events(&mut self, queue: &mut MessageQueue) {
        while let Ok(event) = self.link.event_rx.try_recv() {
            match event {
                L1Event::PhDataInd(ind) => {
                    self.fnr = ind.fnr;
                    self.send_up(queue, Sap::PhSap, GsmEntity::Lapdm, SapMsgInner::PhDataInd(ind));
                }
                L1Event::RachConf { ra, fnr } => {
                    self.fnr = fnr;
                    self.send_up(queue, Sap::PhSap, GsmEntity::Rr, SapMsgInner::PhRachConf(PhRachConf { ra, fnr }));
                }
                L1Event::Sync { time, bsic } => {
                    self.send_up(queue, Sap::MphSap, GsmEntity::Rr, SapMsgInner::MphSyncInd(MphSyncInd { time, bsic }));
                }
                L1Event::Resync { from, to, dropped } => {
                    self.fnr = to;
                    self.send_up(queue, Sap::MphSap, GsmEntity::Rr, SapMsgInner::MphResyncInd(MphResyncInd { from, to, dropped }));
                }
            }
        }
    }

    /// Called every supervision period. Declares the clock lost after the configured
    /// number of periods without any processed frame.
    fn supervise(&mut self, queue: &mut MessageQueue) {
        let frames = self.link.status.frames();
        if frames != self.last_frames {
            if self.clock_lost {
                tracing::info!("l1: frame indications resumed");
            }
            self.last_frames = frames;
            self.idle_periods = 0;
            self.clock_lost = false;
            return;
        }
        // Never had a clock, nothing to lose
        if frames == 0 || self.clock_lost {
            return;
        }

        self.idle_periods += 1;
        if self.idle_periods >= self.config.config().l1.clock_loss_periods {
            let last_fn = self.link.status.last_fn();
            tracing::warn!("l1: no frame indication for {} periods, clock lost at {:?}", self.idle_periods, last_fn);
            self.clock_lost = true;
            self.send_cmd(L1Command::ClockReset);
            self.send_up(queue, Sap::MphSap, GsmEntity::Rr, SapMsgInner::MphClockLostInd(MphClockLostInd { last_fn }));
        }
    }

    fn rx_task_req(&mut self, req: MphTaskReq) {
        let tasks = &self.link.tasks;
        match req.op {
            MphTaskOp::Enable(task) => tasks.enable(task),
            MphTaskOp::Disable(task) => tasks.disable(task),
            MphTaskOp::Set(mask) => tasks.set(mask),
            MphTaskOp::Reset => tasks.reset(),
            MphTaskOp::SetTimeslot(tn) => tasks.set_timeslot(tn),
        }
        tracing::debug!("l1: task target now {:#010x}", tasks.target());
    }
}

impl GsmEntityTrait for L1Ms {
    fn entity(&self) -> GsmEntity {
        GsmEntity::L1
    }

    fn set_config(&mut self, config: SharedConfig) {
        self.config = config;
    }

    fn rx_prim(&mut self, _queue: &mut MessageQueue, message: SapMsg) {
        tracing::debug!("rx_prim: {} from {:?}", message.msg, message.src);

        match message.msg {
            SapMsgInner::PhDataReq(req) => {
                self.send_cmd(L1Command::DataReq { chan_nr: req.chan_nr, link_id: req.link_id, payload: req.payload });
            }
            SapMsgInner::PhFlushReq(req) => {
                self.send_cmd(L1Command::Flush { chan_nr: req.chan_nr, link_id: req.link_id });
            }
            SapMsgInner::PhRachReq(req) => {
                self.send_cmd(L1Command::RachReq { ra: req.ra, fnr: req.fnr });
            }
            SapMsgInner::MphTaskReq(req) => self.rx_task_req(req),
            SapMsgInner::MphClockResetReq(_) => {
                self.send_cmd(L1Command::ClockReset);
            }
            other => {
                tracing::warn!("l1: unexpected primitive {}", other);
            }
        }
    }

    fn tick_start(&mut self, queue: &mut MessageQueue, now: Duration) {
        self.drain_events(queue);

        let mut expired = false;
        self.timers.timer_tick(now, |handle, _| expired |= handle == self.supervision);
        if expired {
            self.supervise(queue);
        }
    }
}
