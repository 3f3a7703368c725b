use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU32, Ordering};

use gsm_core::mframe_task::{MframeTask, TaskMask};
use gsm_core::{ChanNr, FrameNumber, LinkId, LINK_ID_SACCH};

use crate::l1s::mframe_tables::{MframeOp, task_chan_nr, task_is_dedicated, task_items};

#[derive(Debug, Default)]
struct TaskMaskShared {
    target: AtomicU32,
    dedicated_tn: AtomicU8,
}

/// Main loop side of the task mask. Writes are lock-free and picked up by
/// the tick context at its next `schedule` call.
#[derive(Debug, Clone, Default)]
pub struct TaskMaskHandle {
    shared: Arc<TaskMaskShared>,
}

impl TaskMaskHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enable(&self, task: MframeTask) {
        self.shared.target.fetch_or(task.bit(), Ordering::AcqRel);
    }

    pub fn disable(&self, task: MframeTask) {
        self.shared.target.fetch_and(!task.bit(), Ordering::AcqRel);
    }

    /// Replace the whole target mask at once
    pub fn set(&self, mask: TaskMask) {
        self.shared.target.store(mask, Ordering::Release);
    }

    pub fn reset(&self) {
        self.set(0);
    }

    pub fn target(&self) -> TaskMask {
        self.shared.target.load(Ordering::Acquire)
    }

    /// Timeslot the dedicated channel tasks run on
    pub fn set_timeslot(&self, tn: u8) {
        self.shared.dedicated_tn.store(tn & 0x07, Ordering::Release);
    }

    pub fn timeslot(&self) -> u8 {
        self.shared.dedicated_tn.load(Ordering::Acquire)
    }
}

/// Burst level work produced by the scheduler for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MframeJob {
    /// Frame the job targets
    pub fnr: FrameNumber,
    pub tn: u8,
    pub task: MframeTask,
    pub op: MframeOp,
    pub chan_nr: Option<ChanNr>,
    pub link_id: LinkId,
}

impl MframeJob {
    pub fn is_sacch(&self) -> bool {
        self.link_id & LINK_ID_SACCH != 0
    }
}

/// Multiframe task scheduler, owned by the tick context
#[derive(Debug)]
pub struct MframeScheduler {
    /// Tasks currently dispatched
    active: TaskMask,
    target: TaskMaskHandle,
    /// First frame at which no previously scheduled multi-frame operation is in flight
    safe_fn: Option<FrameNumber>,
    ahead: u32,
}

impl MframeScheduler {
    pub fn new(target: TaskMaskHandle, ahead: u32) -> Self {
        MframeScheduler { active: 0, target, safe_fn: None, ahead }
    }

    pub fn handle(&self) -> TaskMaskHandle {
        self.target.clone()
    }

    pub fn active(&self) -> TaskMask {
        self.active
    }

    /// Forget operations in flight, used after the frame clock jumped
    pub fn reset(&mut self) {
        self.active = 0;
        self.safe_fn = None;
    }

    /// Produce the jobs for all active tasks whose table entries trigger at `current + ahead`
    pub fn schedule(&mut self, current: FrameNumber) -> Vec<MframeJob> {
        let target = self.target.target();
        let safe = self.safe_fn.is_none_or(|safe_fn| current.reached(safe_fn));
        let next = if safe { target } else { self.active & target };
        if next != self.active {
            tracing::debug!(fnr = current.get(), "mframe: tasks {:#010x} -> {:#010x}", self.active, next);
        }
        self.active = next;

        let job_fn = current.add_frames(self.ahead as i32);
        let dedicated_tn = self.target.timeslot();
        let mut jobs = Vec::new();

        for task in MframeTask::from_mask(self.active) {
            let tn = if task_is_dedicated(task) { dedicated_tn } else { 0 };
            for item in task_items(task) {
                if job_fn.modulo(item.modulo) != item.frame_nr % item.modulo {
                    continue;
                }
                let job = MframeJob {
                    fnr: job_fn,
                    tn,
                    task,
                    op: item.op,
                    chan_nr: task_chan_nr(task, tn),
                    link_id: if item.sacch { LINK_ID_SACCH } else { 0 },
                };
                tracing::trace!(fnr = current.get(), "mframe: {} {:?} at {:?}", task, item.op, job_fn);

                // Commands leave for the PHY now, the mask may change once they completed
                let busy_until = current.add_frames(item.op.duration() as i32);
                if self.safe_fn.is_none_or(|safe_fn| busy_until.diff(safe_fn) > 0) {
                    self.safe_fn = Some(busy_until);
                }
                jobs.push(job);
            }
        }
        jobs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::l1s::mframe_tables::task_period;

    fn strip_fn(jobs: &[MframeJob]) -> Vec<(u8, MframeTask, MframeOp, Option<ChanNr>, LinkId)> {
        jobs.iter().map(|j| (j.tn, j.task, j.op, j.chan_nr, j.link_id)).collect()
    }

    #[test]
    fn test_bcch_norm_only_on_table_entry() {
        let handle = TaskMaskHandle::new();
        let mut sched = MframeScheduler::new(handle.clone(), 2);
        handle.enable(MframeTask::BcchNorm);

        let mut hits = vec![];
        for f in 0..51 {
            let jobs = sched.schedule(FrameNumber::new(f));
            for job in jobs {
                assert_eq!(job.op, MframeOp::NbQuadDl);
                hits.push((f, job.fnr.get()));
            }
        }
        // Triggered by frame 0, targeting frame 2
        assert_eq!(hits, vec![(0, 2)]);
    }

    #[test]
    fn test_disable_stops_next_call() {
        let handle = TaskMaskHandle::new();
        let mut sched = MframeScheduler::new(handle.clone(), 2);
        handle.enable(MframeTask::Sdcch8_0);

        // Frame 49 + 2 = 51 -> block 0 of SDCCH/8 subchannel 0
        assert_eq!(sched.schedule(FrameNumber::new(49)).len(), 1);
        handle.disable(MframeTask::Sdcch8_0);
        for f in 50..50 + 102 {
            assert!(sched.schedule(FrameNumber::new(f)).is_empty());
        }
        assert_eq!(sched.active(), 0);
    }

    #[test]
    fn test_periodicity() {
        let handle = TaskMaskHandle::new();
        handle.set(MframeTask::mask_of(&[MframeTask::Sdcch4_2, MframeTask::TchH1, MframeTask::NeighPm51]));
        handle.set_timeslot(3);
        let mut sched = MframeScheduler::new(handle.clone(), 2);
        let period = [MframeTask::Sdcch4_2, MframeTask::TchH1, MframeTask::NeighPm51]
            .iter()
            .map(|t| task_period(*t))
            .fold(1, |a, p| if a % p == 0 { a } else { a * p });
        assert_eq!(period, 102 * 26);

        // Run once to settle the active mask
        sched.schedule(FrameNumber::new(0));
        for f in (1000..1000 + 300).step_by(7) {
            let a = sched.schedule(FrameNumber::new(f));
            let b = sched.schedule(FrameNumber::new(f + period));
            assert_eq!(strip_fn(&a), strip_fn(&b));
            assert!(a.iter().all(|j| j.task == MframeTask::NeighPm51 || j.tn == 3));
        }
    }

    #[test]
    fn test_enable_deferred_while_unsafe() {
        let handle = TaskMaskHandle::new();
        let mut sched = MframeScheduler::new(handle.clone(), 2);
        handle.enable(MframeTask::BcchNorm);
        // Quad receive at frame 2..5 is now in flight
        assert_eq!(sched.schedule(FrameNumber::new(0)).len(), 1);

        handle.enable(MframeTask::CcchComb);
        sched.schedule(FrameNumber::new(1));
        assert_eq!(sched.active(), MframeTask::BcchNorm.bit());
        for f in 2..=6 {
            sched.schedule(FrameNumber::new(f));
        }
        assert_eq!(sched.active(), MframeTask::mask_of(&[MframeTask::BcchNorm, MframeTask::CcchComb]));
    }

    #[test]
    fn test_enable_applied_beside_traffic_channel() {
        let handle = TaskMaskHandle::new();
        let mut sched = MframeScheduler::new(handle.clone(), 2);
        handle.enable(MframeTask::TchFEven);
        sched.schedule(FrameNumber::new(0));

        // TCH/F keeps a single frame operation in flight on almost every frame
        handle.enable(MframeTask::NeighPm26e);
        sched.schedule(FrameNumber::new(1));
        assert_eq!(sched.active(), MframeTask::mask_of(&[MframeTask::TchFEven, MframeTask::NeighPm26e]));

        let mut pm_jobs = 0;
        for f in 2..2 + 26 {
            pm_jobs += sched.schedule(FrameNumber::new(f)).iter().filter(|j| j.task == MframeTask::NeighPm26e).count();
        }
        assert_eq!(pm_jobs, 1);
    }

    #[test]
    fn test_sacch_link_id() {
        let handle = TaskMaskHandle::new();
        handle.enable(MframeTask::Sdcch8_0);
        let mut sched = MframeScheduler::new(handle, 2);
        // SACCH downlink of SDCCH/8 subchannel 0 at 32 mod 102
        let jobs = sched.schedule(FrameNumber::new(30));
        assert_eq!(jobs.len(), 1);
        assert!(jobs[0].is_sacch());
        assert_eq!(jobs[0].op, MframeOp::NbQuadDl);
        assert!(sched.schedule(FrameNumber::new(30 + 51)).is_empty());
    }
}
