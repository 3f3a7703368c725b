use gsm_core::{FrameNumber, GsmTime, MframeTask, mframe_task::TaskMask};

/// Operation on the multiframe task mask
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MphTaskOp {
    Enable(MframeTask),
    Disable(MframeTask),
    /// Atomic replacement of the full mask
    Set(TaskMask),
    Reset,
    /// Timeslot used by the dedicated channel tasks (SDCCH, TCH)
    SetTimeslot(u8),
}

/// MPH-TASK request
#[derive(Debug)]
pub struct MphTaskReq {
    pub op: MphTaskOp,
}

/// MPH-CLOCK-RESET request: return the frame clock to the WAIT state
#[derive(Debug)]
pub struct MphClockResetReq {}

/// MPH-SYNC indication: frame timing and BSIC were recovered from a SCH burst
#[derive(Debug)]
pub struct MphSyncInd {
    pub time: GsmTime,
    pub bsic: u8,
}

/// MPH-RESYNC indication: the frame clock jumped, one-shot events in the gap were dropped
#[derive(Debug)]
pub struct MphResyncInd {
    pub from: FrameNumber,
    pub to: FrameNumber,
    /// Number of one-shot events dropped
    pub dropped: usize,
}

/// MPH-CLOCK-LOST indication: no frame indication arrived during supervision
#[derive(Debug)]
pub struct MphClockLostInd {
    /// Last frame number seen before the loss
    pub last_fn: Option<FrameNumber>,
}
