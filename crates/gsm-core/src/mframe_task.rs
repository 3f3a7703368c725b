use serde::Deserialize;

/// Multiframe tasks, one per logical channel role the L1 can be asked to serve.
/// The discriminant is the bit index in the task mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[repr(u8)]
pub enum MframeTask {
    #[serde(rename = "BCCH_NORM")]
    BcchNorm = 0,
    #[serde(rename = "BCCH_EXT")]
    BcchExt = 1,
    #[serde(rename = "CCCH")]
    Ccch = 2,
    #[serde(rename = "CCCH_COMB")]
    CcchComb = 3,
    #[serde(rename = "SDCCH4_0")]
    Sdcch4_0 = 4,
    #[serde(rename = "SDCCH4_1")]
    Sdcch4_1 = 5,
    #[serde(rename = "SDCCH4_2")]
    Sdcch4_2 = 6,
    #[serde(rename = "SDCCH4_3")]
    Sdcch4_3 = 7,
    #[serde(rename = "SDCCH8_0")]
    Sdcch8_0 = 8,
    #[serde(rename = "SDCCH8_1")]
    Sdcch8_1 = 9,
    #[serde(rename = "SDCCH8_2")]
    Sdcch8_2 = 10,
    #[serde(rename = "SDCCH8_3")]
    Sdcch8_3 = 11,
    #[serde(rename = "SDCCH8_4")]
    Sdcch8_4 = 12,
    #[serde(rename = "SDCCH8_5")]
    Sdcch8_5 = 13,
    #[serde(rename = "SDCCH8_6")]
    Sdcch8_6 = 14,
    #[serde(rename = "SDCCH8_7")]
    Sdcch8_7 = 15,
    #[serde(rename = "TCH_F_EVEN")]
    TchFEven = 16,
    #[serde(rename = "TCH_F_ODD")]
    TchFOdd = 17,
    #[serde(rename = "TCH_H_0")]
    TchH0 = 18,
    #[serde(rename = "TCH_H_1")]
    TchH1 = 19,
    #[serde(rename = "NEIGH_PM51_C0T0")]
    NeighPm51C0t0 = 20,
    #[serde(rename = "NEIGH_PM51")]
    NeighPm51 = 21,
    #[serde(rename = "NEIGH_PM26E")]
    NeighPm26e = 22,
    #[serde(rename = "NEIGH_PM26O")]
    NeighPm26o = 23,
    #[serde(rename = "UL_ALL_NB")]
    UlAllNb = 24,
}

/// Bit mask of enabled tasks
pub type TaskMask = u32;

impl MframeTask {
    pub const ALL: [MframeTask; 25] = [
        MframeTask::BcchNorm,
        MframeTask::BcchExt,
        MframeTask::Ccch,
        MframeTask::CcchComb,
        MframeTask::Sdcch4_0,
        MframeTask::Sdcch4_1,
        MframeTask::Sdcch4_2,
        MframeTask::Sdcch4_3,
        MframeTask::Sdcch8_0,
        MframeTask::Sdcch8_1,
        MframeTask::Sdcch8_2,
        MframeTask::Sdcch8_3,
        MframeTask::Sdcch8_4,
        MframeTask::Sdcch8_5,
        MframeTask::Sdcch8_6,
        MframeTask::Sdcch8_7,
        MframeTask::TchFEven,
        MframeTask::TchFOdd,
        MframeTask::TchH0,
        MframeTask::TchH1,
        MframeTask::NeighPm51C0t0,
        MframeTask::NeighPm51,
        MframeTask::NeighPm26e,
        MframeTask::NeighPm26o,
        MframeTask::UlAllNb,
    ];

    /// Bit of this task in a TaskMask
    pub fn bit(self) -> TaskMask {
        1 << self.into_raw()
    }

    /// Tasks contained in a mask, in task order
    pub fn from_mask(mask: TaskMask) -> impl Iterator<Item = MframeTask> {
        Self::ALL.into_iter().filter(move |t| mask & t.bit() != 0)
    }

    pub fn mask_of(tasks: &[MframeTask]) -> TaskMask {
        tasks.iter().fold(0, |m, t| m | t.bit())
    }
}

impl std::convert::TryFrom<u64> for MframeTask {
    type Error = ();
    fn try_from(x: u64) -> Result<Self, Self::Error> {
        match x {
            0 => Ok(MframeTask::BcchNorm),
            1 => Ok(MframeTask::BcchExt),
            2 => Ok(MframeTask::Ccch),
            3 => Ok(MframeTask::CcchComb),
            4 => Ok(MframeTask::Sdcch4_0),
            5 => Ok(MframeTask::Sdcch4_1),
            6 => Ok(MframeTask::Sdcch4_2),
            7 => Ok(MframeTask::Sdcch4_3),
            8 => Ok(MframeTask::Sdcch8_0),
            9 => Ok(MframeTask::Sdcch8_1),
            10 => Ok(MframeTask::Sdcch8_2),
            11 => Ok(MframeTask::Sdcch8_3),
            12 => Ok(MframeTask::Sdcch8_4),
            13 => Ok(MframeTask::Sdcch8_5),
            14 => Ok(MframeTask::Sdcch8_6),
            15 => Ok(MframeTask::Sdcch8_7),
            16 => Ok(MframeTask::TchFEven),
            17 => Ok(MframeTask::TchFOdd),
            18 => Ok(MframeTask::TchH0),
            19 => Ok(MframeTask::TchH1),
            20 => Ok(MframeTask::NeighPm51C0t0),
            21 => Ok(MframeTask::NeighPm51),
            22 => Ok(MframeTask::NeighPm26e),
            23 => Ok(MframeTask::NeighPm26o),
            24 => Ok(MframeTask::UlAllNb),
            _ => Err(()),
        }
    }
}

impl MframeTask {
    /// Convert this enum back into the raw integer value
    pub fn into_raw(self) -> u64 {
        self as u64
    }
}

impl From<MframeTask> for u64 {
    fn from(e: MframeTask) -> Self { e.into_raw() }
}

impl core::fmt::Display for MframeTask {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MframeTask::BcchNorm => write!(f, "BCCH_NORM"),
            MframeTask::BcchExt => write!(f, "BCCH_EXT"),
            MframeTask::Ccch => write!(f, "CCCH"),
            MframeTask::CcchComb => write!(f, "CCCH_COMB"),
            MframeTask::Sdcch4_0 => write!(f, "SDCCH4_0"),
            MframeTask::Sdcch4_1 => write!(f, "SDCCH4_1"),
            MframeTask::Sdcch4_2 => write!(f, "SDCCH4_2"),
            MframeTask::Sdcch4_3 => write!(f, "SDCCH4_3"),
            MframeTask::Sdcch8_0 => write!(f, "SDCCH8_0"),
            MframeTask::Sdcch8_1 => write!(f, "SDCCH8_1"),
            MframeTask::Sdcch8_2 => write!(f, "SDCCH8_2"),
            MframeTask::Sdcch8_3 => write!(f, "SDCCH8_3"),
            MframeTask::Sdcch8_4 => write!(f, "SDCCH8_4"),
            MframeTask::Sdcch8_5 => write!(f, "SDCCH8_5"),
            MframeTask::Sdcch8_6 => write!(f, "SDCCH8_6"),
            MframeTask::Sdcch8_7 => write!(f, "SDCCH8_7"),
            MframeTask::TchFEven => write!(f, "TCH_F_EVEN"),
            MframeTask::TchFOdd => write!(f, "TCH_F_ODD"),
            MframeTask::TchH0 => write!(f, "TCH_H_0"),
            MframeTask::TchH1 => write!(f, "TCH_H_1"),
            MframeTask::NeighPm51C0t0 => write!(f, "NEIGH_PM51_C0T0"),
            MframeTask::NeighPm51 => write!(f, "NEIGH_PM51"),
            MframeTask::NeighPm26e => write!(f, "NEIGH_PM26E"),
            MframeTask::NeighPm26o => write!(f, "NEIGH_PM26O"),
            MframeTask::UlAllNb => write!(f, "UL_ALL_NB"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_roundtrip() {
        let tasks = [MframeTask::BcchNorm, MframeTask::Sdcch8_3, MframeTask::UlAllNb];
        let mask = MframeTask::mask_of(&tasks);
        assert_eq!(mask, 1 | (1 << 11) | (1 << 24));
        assert_eq!(MframeTask::from_mask(mask).collect::<Vec<_>>(), tasks.to_vec());
        for t in MframeTask::ALL {
            assert_eq!(MframeTask::try_from(t.into_raw()), Ok(t));
        }
        assert!(MframeTask::try_from(25).is_err());
    }
}
