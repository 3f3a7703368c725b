use gsm_core::mframe_task::MframeTask;
use gsm_core::{ChanNr, cbits, chan_nr};

/// Burst level operation of a multiframe table entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MframeOp {
    /// Receive the four normal bursts of one block
    NbQuadDl,
    /// Transmit the four normal bursts of one block
    NbQuadUl,
    /// Traffic frame, carries FACCH when signalling is pending
    Tch,
    /// Associated frame of a traffic channel (SACCH/T)
    TchA,
    /// Frame of the other half rate subchannel, nothing to do
    TchD,
    /// Neighbour cell power measurement
    NeighPm,
}

impl MframeOp {
    /// Number of frames the PHY is busy with this operation
    pub fn duration(self) -> u32 {
        match self {
            MframeOp::NbQuadDl | MframeOp::NbQuadUl => 4,
            _ => 1,
        }
    }
}

/// One entry of a task table. The entry triggers when `fn % modulo == frame_nr % modulo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MframeSchedItem {
    pub op: MframeOp,
    pub modulo: u32,
    pub frame_nr: u32,
    /// Entry belongs to the associated control channel
    pub sacch: bool,
}

const fn item(op: MframeOp, modulo: u32, frame_nr: u32) -> MframeSchedItem {
    MframeSchedItem { op, modulo, frame_nr, sacch: false }
}

const fn sacch(op: MframeOp, modulo: u32, frame_nr: u32) -> MframeSchedItem {
    MframeSchedItem { op, modulo, frame_nr, sacch: true }
}

use MframeOp::*;

/// Uplink blocks follow their downlink counterpart by 15 frames in the 51-multiframe
const UL_OFFSET: u32 = 15;

static MF_BCCH_NORM: [MframeSchedItem; 1] = [item(NbQuadDl, 51, 2)];
static MF_BCCH_EXT: [MframeSchedItem; 1] = [item(NbQuadDl, 51, 6)];
static MF_CCCH: [MframeSchedItem; 9] = [
    item(NbQuadDl, 51, 6),
    item(NbQuadDl, 51, 12),
    item(NbQuadDl, 51, 16),
    item(NbQuadDl, 51, 22),
    item(NbQuadDl, 51, 26),
    item(NbQuadDl, 51, 32),
    item(NbQuadDl, 51, 36),
    item(NbQuadDl, 51, 42),
    item(NbQuadDl, 51, 46),
];
static MF_CCCH_COMB: [MframeSchedItem; 3] = [item(NbQuadDl, 51, 6), item(NbQuadDl, 51, 12), item(NbQuadDl, 51, 16)];

static MF_SDCCH4_0: [MframeSchedItem; 4] = [
    item(NbQuadDl, 51, 22),
    item(NbQuadUl, 51, 22 + UL_OFFSET),
    sacch(NbQuadDl, 102, 42),
    sacch(NbQuadUl, 102, 42 + UL_OFFSET),
];
static MF_SDCCH4_1: [MframeSchedItem; 4] = [
    item(NbQuadDl, 51, 26),
    item(NbQuadUl, 51, 26 + UL_OFFSET),
    sacch(NbQuadDl, 102, 46),
    sacch(NbQuadUl, 102, 46 + UL_OFFSET),
];
static MF_SDCCH4_2: [MframeSchedItem; 4] = [
    item(NbQuadDl, 51, 32),
    item(NbQuadUl, 51, 32 + UL_OFFSET),
    sacch(NbQuadDl, 102, 51 + 42),
    sacch(NbQuadUl, 102, 51 + 42 + UL_OFFSET),
];
static MF_SDCCH4_3: [MframeSchedItem; 4] = [
    item(NbQuadDl, 51, 36),
    item(NbQuadUl, 51, 36 + UL_OFFSET),
    sacch(NbQuadDl, 102, 51 + 46),
    sacch(NbQuadUl, 102, 51 + 46 + UL_OFFSET),
];
static MF_SDCCH8_0: [MframeSchedItem; 4] = [
    item(NbQuadDl, 51, 0),
    item(NbQuadUl, 51, 0 + UL_OFFSET),
    sacch(NbQuadDl, 102, 32),
    sacch(NbQuadUl, 102, 32 + UL_OFFSET),
];
static MF_SDCCH8_1: [MframeSchedItem; 4] = [
    item(NbQuadDl, 51, 4),
    item(NbQuadUl, 51, 4 + UL_OFFSET),
    sacch(NbQuadDl, 102, 36),
    sacch(NbQuadUl, 102, 36 + UL_OFFSET),
];
static MF_SDCCH8_2: [MframeSchedItem; 4] = [
    item(NbQuadDl, 51, 8),
    item(NbQuadUl, 51, 8 + UL_OFFSET),
    sacch(NbQuadDl, 102, 40),
    sacch(NbQuadUl, 102, 40 + UL_OFFSET),
];
static MF_SDCCH8_3: [MframeSchedItem; 4] = [
    item(NbQuadDl, 51, 12),
    item(NbQuadUl, 51, 12 + UL_OFFSET),
    sacch(NbQuadDl, 102, 44),
    sacch(NbQuadUl, 102, 44 + UL_OFFSET),
];
static MF_SDCCH8_4: [MframeSchedItem; 4] = [
    item(NbQuadDl, 51, 16),
    item(NbQuadUl, 51, 16 + UL_OFFSET),
    sacch(NbQuadDl, 102, 51 + 32),
    sacch(NbQuadUl, 102, 51 + 32 + UL_OFFSET),
];
static MF_SDCCH8_5: [MframeSchedItem; 4] = [
    item(NbQuadDl, 51, 20),
    item(NbQuadUl, 51, 20 + UL_OFFSET),
    sacch(NbQuadDl, 102, 51 + 36),
    sacch(NbQuadUl, 102, 51 + 36 + UL_OFFSET),
];
static MF_SDCCH8_6: [MframeSchedItem; 4] = [
    item(NbQuadDl, 51, 24),
    item(NbQuadUl, 51, 24 + UL_OFFSET),
    sacch(NbQuadDl, 102, 51 + 40),
    sacch(NbQuadUl, 102, 51 + 40 + UL_OFFSET),
];
static MF_SDCCH8_7: [MframeSchedItem; 4] = [
    item(NbQuadDl, 51, 28),
    item(NbQuadUl, 51, 28 + UL_OFFSET),
    sacch(NbQuadDl, 102, 51 + 44),
    sacch(NbQuadUl, 102, 51 + 44 + UL_OFFSET),
];

static MF_TCH_F_EVEN: [MframeSchedItem; 13] = [
    item(Tch, 13, 0),
    item(Tch, 13, 1),
    item(Tch, 13, 2),
    item(Tch, 13, 3),
    item(Tch, 13, 4),
    item(Tch, 13, 5),
    item(Tch, 13, 6),
    item(Tch, 13, 7),
    item(Tch, 13, 8),
    item(Tch, 13, 9),
    item(Tch, 13, 10),
    item(Tch, 13, 11),
    sacch(TchA, 26, 12),
];
static MF_TCH_F_ODD: [MframeSchedItem; 13] = [
    item(Tch, 13, 0),
    item(Tch, 13, 1),
    item(Tch, 13, 2),
    item(Tch, 13, 3),
    item(Tch, 13, 4),
    item(Tch, 13, 5),
    item(Tch, 13, 6),
    item(Tch, 13, 7),
    item(Tch, 13, 8),
    item(Tch, 13, 9),
    item(Tch, 13, 10),
    item(Tch, 13, 11),
    sacch(TchA, 26, 25),
];
static MF_TCH_H_0: [MframeSchedItem; 13] = [
    item(Tch, 13, 0),
    item(TchD, 13, 1),
    item(Tch, 13, 2),
    item(TchD, 13, 3),
    item(Tch, 13, 4),
    item(TchD, 13, 5),
    item(Tch, 13, 6),
    item(TchD, 13, 7),
    item(Tch, 13, 8),
    item(TchD, 13, 9),
    item(Tch, 13, 10),
    item(TchD, 13, 11),
    sacch(TchA, 26, 12),
];
static MF_TCH_H_1: [MframeSchedItem; 13] = [
    item(TchD, 13, 0),
    item(Tch, 13, 1),
    item(TchD, 13, 2),
    item(Tch, 13, 3),
    item(TchD, 13, 4),
    item(Tch, 13, 5),
    item(TchD, 13, 6),
    item(Tch, 13, 7),
    item(TchD, 13, 8),
    item(Tch, 13, 9),
    item(TchD, 13, 10),
    item(Tch, 13, 11),
    sacch(TchA, 26, 25),
];

static MF_NEIGH_PM51_C0T0: [MframeSchedItem; 5] = [
    item(NeighPm, 51, 0),
    item(NeighPm, 51, 10),
    item(NeighPm, 51, 20),
    item(NeighPm, 51, 30),
    item(NeighPm, 51, 40),
];
static MF_NEIGH_PM51: [MframeSchedItem; 1] = [item(NeighPm, 51, 50)];
static MF_NEIGH_PM26E: [MframeSchedItem; 1] = [item(NeighPm, 26, 25)];
static MF_NEIGH_PM26O: [MframeSchedItem; 1] = [item(NeighPm, 26, 12)];
static MF_UL_ALL_NB: [MframeSchedItem; 1] = [item(NbQuadUl, 4, 0)];

/// Table of burst operations of a task
pub fn task_items(task: MframeTask) -> &'static [MframeSchedItem] {
    match task {
        MframeTask::BcchNorm => &MF_BCCH_NORM,
        MframeTask::BcchExt => &MF_BCCH_EXT,
        MframeTask::Ccch => &MF_CCCH,
        MframeTask::CcchComb => &MF_CCCH_COMB,
        MframeTask::Sdcch4_0 => &MF_SDCCH4_0,
        MframeTask::Sdcch4_1 => &MF_SDCCH4_1,
        MframeTask::Sdcch4_2 => &MF_SDCCH4_2,
        MframeTask::Sdcch4_3 => &MF_SDCCH4_3,
        MframeTask::Sdcch8_0 => &MF_SDCCH8_0,
        MframeTask::Sdcch8_1 => &MF_SDCCH8_1,
        MframeTask::Sdcch8_2 => &MF_SDCCH8_2,
        MframeTask::Sdcch8_3 => &MF_SDCCH8_3,
        MframeTask::Sdcch8_4 => &MF_SDCCH8_4,
        MframeTask::Sdcch8_5 => &MF_SDCCH8_5,
        MframeTask::Sdcch8_6 => &MF_SDCCH8_6,
        MframeTask::Sdcch8_7 => &MF_SDCCH8_7,
        MframeTask::TchFEven => &MF_TCH_F_EVEN,
        MframeTask::TchFOdd => &MF_TCH_F_ODD,
        MframeTask::TchH0 => &MF_TCH_H_0,
        MframeTask::TchH1 => &MF_TCH_H_1,
        MframeTask::NeighPm51C0t0 => &MF_NEIGH_PM51_C0T0,
        MframeTask::NeighPm51 => &MF_NEIGH_PM51,
        MframeTask::NeighPm26e => &MF_NEIGH_PM26E,
        MframeTask::NeighPm26o => &MF_NEIGH_PM26O,
        MframeTask::UlAllNb => &MF_UL_ALL_NB,
    }
}

fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 { a } else { gcd(b, a % b) }
}

/// Period of a task in frames: the least common multiple of its entry moduli
pub fn task_period(task: MframeTask) -> u32 {
    task_items(task).iter().fold(1, |acc, item| acc / gcd(acc, item.modulo) * item.modulo)
}

/// True for tasks serving a dedicated channel, which run on the dedicated timeslot
pub fn task_is_dedicated(task: MframeTask) -> bool {
    (MframeTask::Sdcch4_0 as u8..=MframeTask::TchH1 as u8).contains(&(task as u8))
}

/// Channel number served by a task on timeslot `tn`, TS 08.58 clause 9.3.1.
/// Measurement and test tasks have no channel.
pub fn task_chan_nr(task: MframeTask, tn: u8) -> Option<ChanNr> {
    let c = match task {
        MframeTask::BcchNorm | MframeTask::BcchExt => cbits::BCCH,
        MframeTask::Ccch | MframeTask::CcchComb => cbits::PCH_AGCH,
        MframeTask::Sdcch4_0 => cbits::SDCCH4,
        MframeTask::Sdcch4_1 => cbits::SDCCH4 + 1,
        MframeTask::Sdcch4_2 => cbits::SDCCH4 + 2,
        MframeTask::Sdcch4_3 => cbits::SDCCH4 + 3,
        MframeTask::Sdcch8_0 => cbits::SDCCH8,
        MframeTask::Sdcch8_1 => cbits::SDCCH8 + 1,
        MframeTask::Sdcch8_2 => cbits::SDCCH8 + 2,
        MframeTask::Sdcch8_3 => cbits::SDCCH8 + 3,
        MframeTask::Sdcch8_4 => cbits::SDCCH8 + 4,
        MframeTask::Sdcch8_5 => cbits::SDCCH8 + 5,
        MframeTask::Sdcch8_6 => cbits::SDCCH8 + 6,
        MframeTask::Sdcch8_7 => cbits::SDCCH8 + 7,
        MframeTask::TchFEven | MframeTask::TchFOdd => cbits::TCH_F,
        MframeTask::TchH0 => cbits::TCH_H,
        MframeTask::TchH1 => cbits::TCH_H + 1,
        MframeTask::NeighPm51C0t0
        | MframeTask::NeighPm51
        | MframeTask::NeighPm26e
        | MframeTask::NeighPm26o
        | MframeTask::UlAllNb => return None,
    };
    Some(chan_nr(c, tn))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_periods() {
        assert_eq!(task_period(MframeTask::BcchNorm), 51);
        assert_eq!(task_period(MframeTask::Sdcch8_5), 102);
        assert_eq!(task_period(MframeTask::TchH1), 26);
        assert_eq!(task_period(MframeTask::UlAllNb), 4);
        for task in MframeTask::ALL {
            let period = task_period(task);
            assert_eq!((51 * 26 * 2) % period, 0, "{} period {}", task, period);
        }
    }

    #[test]
    fn test_chan_nr() {
        assert_eq!(task_chan_nr(MframeTask::BcchNorm, 0), Some(0x80));
        assert_eq!(task_chan_nr(MframeTask::CcchComb, 0), Some(0x90));
        assert_eq!(task_chan_nr(MframeTask::Sdcch8_3, 2), Some(0x5a));
        assert_eq!(task_chan_nr(MframeTask::TchH1, 3), Some(0x1b));
        assert_eq!(task_chan_nr(MframeTask::NeighPm26o, 0), None);
        assert!(task_is_dedicated(MframeTask::Sdcch4_0));
        assert!(task_is_dedicated(MframeTask::TchH1));
        assert!(!task_is_dedicated(MframeTask::Ccch));
        assert!(!task_is_dedicated(MframeTask::NeighPm51C0t0));
    }

    #[test]
    fn test_sdcch8_regions_disjoint() {
        // Downlink SDCCH/8 blocks of all subchannels must not overlap in the 51-multiframe
        let mut used = [false; 51];
        for n in 0..8 {
            let task = MframeTask::try_from(MframeTask::Sdcch8_0.into_raw() + n).unwrap();
            let dl = task_items(task)[0];
            for f in dl.frame_nr..dl.frame_nr + 4 {
                assert!(!used[f as usize]);
                used[f as usize] = true;
            }
        }
    }
}
