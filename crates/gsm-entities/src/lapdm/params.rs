use std::time::Duration;

use gsm_config::{StackConfig, StackMode};
use gsm_core::{ChanNr, cbits, chan_nr_cbits};

/// Maximum information field length, TS 04.06 clause 5.8.3
pub const N201_AB_SACCH: usize = 18;
pub const N201_AB_SDCCH: usize = 20;
pub const N201_AB_FACCH: usize = 20;
pub const N201_BBIS: usize = 23;
pub const N201_B4: usize = 19;

/// Retransmissions of SABM and DISC, TS 04.06 clause 5.8.2
pub const N200_EST_REL: u32 = 5;
pub const N200_SACCH: u32 = 5;
pub const N200_SDCCH: u32 = 23;
pub const N200_FACCH_F: u32 = 34;
pub const N200_FACCH_H: u32 = 29;

/// SAPIs served on dedicated channels
pub const SAPI_RR: u8 = 0;
pub const SAPI_SMS: u8 = 3;

/// Channel type of a LAPDm entity, determines N201, N200 and T200
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChanKind {
    Sdcch,
    Sacch,
    FacchF,
    FacchH,
}

impl ChanKind {
    /// Kind of the main (`sacch == false`) or associated entity of a dedicated channel.
    /// None for broadcast and common channels, which carry no data links.
    pub fn from_chan_nr(chan_nr: ChanNr, sacch: bool) -> Option<ChanKind> {
        let c = chan_nr_cbits(chan_nr);
        let main = match c {
            cbits::TCH_F => ChanKind::FacchF,
            0x02 | 0x03 => ChanKind::FacchH,
            0x04..=0x07 | 0x08..=0x0f => ChanKind::Sdcch,
            _ => return None,
        };
        Some(if sacch { ChanKind::Sacch } else { main })
    }

    pub fn n201(self) -> usize {
        match self {
            ChanKind::Sdcch => N201_AB_SDCCH,
            ChanKind::Sacch => N201_AB_SACCH,
            ChanKind::FacchF | ChanKind::FacchH => N201_AB_FACCH,
        }
    }

    pub fn n200(self, cfg: &StackConfig) -> u32 {
        let lapdm = &cfg.lapdm;
        match self {
            ChanKind::Sdcch => lapdm.n200_sdcch.unwrap_or(N200_SDCCH),
            ChanKind::Sacch => lapdm.n200_sacch.unwrap_or(N200_SACCH),
            ChanKind::FacchF => lapdm.n200_facch_f.unwrap_or(N200_FACCH_F),
            ChanKind::FacchH => lapdm.n200_facch_h.unwrap_or(N200_FACCH_H),
        }
    }

    pub fn t200(self, cfg: &StackConfig) -> Duration {
        match self {
            ChanKind::Sdcch => cfg.lapdm.t200_sdcch(),
            ChanKind::Sacch => cfg.lapdm.t200_sacch(),
            ChanKind::FacchF | ChanKind::FacchH => cfg.lapdm.t200_facch(),
        }
    }
}

/// Per data link constants
#[derive(Debug, Clone)]
pub struct DatalinkParams {
    pub sapi: u8,
    pub mode: StackMode,
    pub n201: usize,
    /// Longest UI information field, larger on the SACCH downlink where B4 frames carry no length octet
    pub n201_ui: usize,
    pub n200: u32,
    pub n200_est_rel: u32,
    pub t200: Duration,
    pub send_queue_limit: usize,
    pub max_reassembly_len: usize,
}

impl DatalinkParams {
    pub fn new(cfg: &StackConfig, kind: ChanKind, sapi: u8) -> Self {
        let n201 = kind.n201();
        let n201_ui = if kind == ChanKind::Sacch && cfg.stack_mode == StackMode::Bts { N201_B4 } else { n201 };
        DatalinkParams {
            sapi,
            mode: cfg.stack_mode,
            n201,
            n201_ui,
            n200: kind.n200(cfg),
            n200_est_rel: N200_EST_REL,
            t200: kind.t200(cfg),
            send_queue_limit: cfg.lapdm.send_queue_limit,
            max_reassembly_len: cfg.lapdm.max_reassembly_len,
        }
    }

    /// C/R bit of commands we send, TS 04.06 clause 3.3.2
    pub fn cmd_cr(&self) -> bool {
        self.mode == StackMode::Bts
    }

    /// C/R bit of responses we send
    pub fn resp_cr(&self) -> bool {
        !self.cmd_cr()
    }

    /// Whether a received frame with this C/R bit is a command
    pub fn rx_is_command(&self, cr: bool) -> bool {
        cr != self.cmd_cr()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gsm_core::chan_nr;

    #[test]
    fn test_kind_and_constants() {
        let cfg = StackConfig::new(StackMode::Ms);
        let sdcch = chan_nr(cbits::SDCCH8 + 2, 1);
        assert_eq!(ChanKind::from_chan_nr(sdcch, false), Some(ChanKind::Sdcch));
        assert_eq!(ChanKind::from_chan_nr(sdcch, true), Some(ChanKind::Sacch));
        assert_eq!(ChanKind::from_chan_nr(chan_nr(cbits::TCH_H + 1, 2), false), Some(ChanKind::FacchH));
        assert_eq!(ChanKind::from_chan_nr(chan_nr(cbits::BCCH, 0), false), None);

        let p = DatalinkParams::new(&cfg, ChanKind::FacchF, 0);
        assert_eq!((p.n201, p.n200), (20, 34));
        let p = DatalinkParams::new(&cfg, ChanKind::Sacch, 0);
        assert_eq!((p.n201, p.n201_ui, p.n200), (18, 18, 5));
        assert_eq!(p.t200, Duration::from_millis(1000));
        // MS sends commands with C/R=0 and receives commands with C/R=1
        assert!(!p.cmd_cr());
        assert!(p.rx_is_command(true));

        let mut cfg = StackConfig::new(StackMode::Bts);
        cfg.lapdm.n200_sdcch = Some(3);
        let p = DatalinkParams::new(&cfg, ChanKind::Sacch, 0);
        assert_eq!(p.n201_ui, 19);
        assert!(p.cmd_cr());
        assert_eq!(DatalinkParams::new(&cfg, ChanKind::Sdcch, 3).n200, 3);
    }
}
