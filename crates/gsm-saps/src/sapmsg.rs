use core::fmt::Display;

use gsm_core::gsm_entities::GsmEntity;
use gsm_core::{FrameNumber, PrimOp, Sap};

use crate::control::LapdmControl;
use crate::dl::*;
use crate::mdl::*;
use crate::mph::*;
use crate::ph::*;

/// Exhaustive list of primitives for use in the SapMsg struct
#[derive(Debug)]
pub enum SapMsgInner {
    // PH-SAP
    PhDataInd(PhDataInd),
    PhDataReq(PhDataReq),
    PhFlushReq(PhFlushReq),
    PhRachReq(PhRachReq),
    PhRachConf(PhRachConf),

    // MPH-SAP
    MphTaskReq(MphTaskReq),
    MphClockResetReq(MphClockResetReq),
    MphSyncInd(MphSyncInd),
    MphResyncInd(MphResyncInd),
    MphClockLostInd(MphClockLostInd),

    // DL-SAP
    DlEstablishReq(DlEstablishReq),
    DlEstablishInd(DlEstablishInd),
    DlEstablishConf(DlEstablishConf),
    DlDataReq(DlDataReq),
    DlDataInd(DlDataInd),
    DlUnitDataReq(DlUnitDataReq),
    DlUnitDataInd(DlUnitDataInd),
    DlReleaseReq(DlReleaseReq),
    DlReleaseInd(DlReleaseInd),
    DlReleaseConf(DlReleaseConf),

    // MDL-SAP
    MdlErrorInd(MdlErrorInd),

    // Control
    LapdmControl(LapdmControl),
}

impl SapMsgInner {
    /// Operation of the primitive, part of its fixed header
    pub fn op(&self) -> PrimOp {
        match self {
            SapMsgInner::PhDataReq(_)
            | SapMsgInner::PhFlushReq(_)
            | SapMsgInner::PhRachReq(_)
            | SapMsgInner::MphTaskReq(_)
            | SapMsgInner::MphClockResetReq(_)
            | SapMsgInner::DlEstablishReq(_)
            | SapMsgInner::DlDataReq(_)
            | SapMsgInner::DlUnitDataReq(_)
            | SapMsgInner::DlReleaseReq(_)
            | SapMsgInner::LapdmControl(_) => PrimOp::Request,

            SapMsgInner::PhDataInd(_)
            | SapMsgInner::MphSyncInd(_)
            | SapMsgInner::MphResyncInd(_)
            | SapMsgInner::MphClockLostInd(_)
            | SapMsgInner::DlEstablishInd(_)
            | SapMsgInner::DlDataInd(_)
            | SapMsgInner::DlUnitDataInd(_)
            | SapMsgInner::DlReleaseInd(_)
            | SapMsgInner::MdlErrorInd(_) => PrimOp::Indication,

            SapMsgInner::PhRachConf(_) | SapMsgInner::DlEstablishConf(_) | SapMsgInner::DlReleaseConf(_) => {
                PrimOp::Confirm
            }
        }
    }
}

impl Display for SapMsgInner {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SapMsgInner::PhDataInd(_) => write!(f, "PH-DATA.ind"),
            SapMsgInner::PhDataReq(_) => write!(f, "PH-DATA.req"),
            SapMsgInner::PhFlushReq(_) => write!(f, "PH-FLUSH.req"),
            SapMsgInner::PhRachReq(_) => write!(f, "PH-RACH.req"),
            SapMsgInner::PhRachConf(_) => write!(f, "PH-RACH.conf"),
            SapMsgInner::MphTaskReq(_) => write!(f, "MPH-TASK.req"),
            SapMsgInner::MphClockResetReq(_) => write!(f, "MPH-CLOCK-RESET.req"),
            SapMsgInner::MphSyncInd(_) => write!(f, "MPH-SYNC.ind"),
            SapMsgInner::MphResyncInd(_) => write!(f, "MPH-RESYNC.ind"),
            SapMsgInner::MphClockLostInd(_) => write!(f, "MPH-CLOCK-LOST.ind"),
            SapMsgInner::DlEstablishReq(_) => write!(f, "DL-ESTABLISH.req"),
            SapMsgInner::DlEstablishInd(_) => write!(f, "DL-ESTABLISH.ind"),
            SapMsgInner::DlEstablishConf(_) => write!(f, "DL-ESTABLISH.conf"),
            SapMsgInner::DlDataReq(_) => write!(f, "DL-DATA.req"),
            SapMsgInner::DlDataInd(_) => write!(f, "DL-DATA.ind"),
            SapMsgInner::DlUnitDataReq(_) => write!(f, "DL-UNIT-DATA.req"),
            SapMsgInner::DlUnitDataInd(_) => write!(f, "DL-UNIT-DATA.ind"),
            SapMsgInner::DlReleaseReq(_) => write!(f, "DL-RELEASE.req"),
            SapMsgInner::DlReleaseInd(_) => write!(f, "DL-RELEASE.ind"),
            SapMsgInner::DlReleaseConf(_) => write!(f, "DL-RELEASE.conf"),
            SapMsgInner::MdlErrorInd(_) => write!(f, "MDL-ERROR.ind"),
            SapMsgInner::LapdmControl(_) => write!(f, "LAPDM-CONTROL"),
        }
    }
}

#[derive(Debug)]
pub struct SapMsg {
    pub sap: Sap,
    pub src: GsmEntity,
    pub dest: GsmEntity,
    /// Frame number at the time the message was created
    pub fnr: FrameNumber,

    pub msg: SapMsgInner,
}

impl SapMsg {
    pub fn new(sap: Sap, src: GsmEntity, dest: GsmEntity, fnr: FrameNumber, msg: SapMsgInner) -> Self {
        Self { sap, src, dest, fnr, msg }
    }

    pub fn get_source(&self) -> &GsmEntity {
        &self.src
    }
    pub fn get_dest(&self) -> &GsmEntity {
        &self.dest
    }
    pub fn get_sap(&self) -> &Sap {
        &self.sap
    }
    pub fn get_op(&self) -> PrimOp {
        self.msg.op()
    }
}
