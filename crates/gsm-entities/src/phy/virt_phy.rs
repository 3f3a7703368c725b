use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use gsm_config::SharedConfig;
use gsm_core::gsm_time::FRAME_DURATION_US;
use gsm_core::{BurstType, FrameNumber, GsmTime, SignalQuality};

use crate::l1s::L1Sync;
use crate::phy::PhyIf;

/// Software PHY without a radio. Logs transmitted bursts and counts them.
#[derive(Debug, Default)]
pub struct VirtPhy {
    tx_bursts: u64,
    pm_count: u64,
}

impl VirtPhy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PhyIf for VirtPhy {
    fn burst_send(&mut self, tn: u8, fnr: FrameNumber, burst_type: BurstType, payload: &[u8]) {
        self.tx_bursts += 1;
        tracing::trace!(fnr = fnr.get(), "virt phy: tx #{} {:?} tn {} {:02x?}", self.tx_bursts, burst_type, tn, payload);
    }

    fn power_measurement(&mut self, fnr: FrameNumber) {
        self.pm_count += 1;
        tracing::trace!(fnr = fnr.get(), "virt phy: power measurement #{}", self.pm_count);
    }
}

/// Encodes time and BSIC into the 25 information bits of a SCH burst, TS 05.02 clause 3.3.2.2.1
pub fn sch_info(time: &GsmTime, bsic: u8) -> u32 {
    let t1 = time.t1 as u32;
    let t2 = time.t2 as u32;
    let t3p = (time.t3 as u32).saturating_sub(1) / 10;
    ((t1 & 1) << 23)
        | (((t1 >> 1) & 0xff) << 8)
        | ((t1 >> 9) & 3)
        | ((t2 & 0x1f) << 18)
        | ((t3p & 1) << 24)
        | (((t3p >> 1) & 3) << 16)
        | ((bsic as u32 & 0x3f) << 2)
}

/// Drives L1Sync from the system clock: one frame indication per frame period,
/// plus a synchronization burst in every SCH frame of timeslot 0.
pub struct VirtPhyDriver {
    l1s: L1Sync,
    fnr: FrameNumber,
    period: Duration,
    bsic: u8,
}

impl VirtPhyDriver {
    pub fn new(config: &SharedConfig, l1s: L1Sync) -> Self {
        let cfg = config.config();
        let period_us = cfg.phy_io.frame_period_us.unwrap_or(FRAME_DURATION_US);
        VirtPhyDriver {
            l1s,
            fnr: FrameNumber::new(cfg.phy_io.virt_start_fn),
            period: Duration::from_micros(period_us),
            bsic: 0,
        }
    }

    /// Process one frame and advance to the next
    pub fn step(&mut self) {
        self.l1s.frame_tick(self.fnr);

        let time = self.fnr.to_gsm_time();
        if time.t3 % 10 == 1 {
            let sb = sch_info(&time, self.bsic);
            self.l1s.burst_receive_indication(0, self.fnr, BurstType::Sb, &sb.to_le_bytes(), SignalQuality::default());
        }
        self.fnr = self.fnr.next();
    }

    /// Run until `running` is cleared, keeping the frame rate against the system clock
    pub fn run(mut self, running: Arc<AtomicBool>) {
        tracing::info!("virt phy: starting at {:?}, period {:?}", self.fnr, self.period);
        let mut deadline = Instant::now();
        while running.load(Ordering::Relaxed) {
            self.step();
            deadline += self.period;
            let now = Instant::now();
            if deadline > now {
                std::thread::sleep(deadline - now);
            } else if now - deadline > self.period * 26 {
                // Far behind, frames were lost anyway
                tracing::warn!("virt phy: lagging {:?}, skipping ahead", now - deadline);
                deadline = now;
            }
        }
        tracing::info!("virt phy: stopped at {:?}", self.fnr);
    }

    pub fn spawn(self, running: Arc<AtomicBool>) -> std::io::Result<JoinHandle<()>> {
        std::thread::Builder::new().name("virt_phy".to_string()).spawn(move || self.run(running))
    }
}
