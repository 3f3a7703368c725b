use std::sync::{Arc, Mutex};

use gsm_core::{BurstType, FrameNumber};
use gsm_entities::phy::PhyIf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedBurst {
    pub tn: u8,
    pub fnr: FrameNumber,
    pub burst_type: BurstType,
    pub payload: Vec<u8>,
}

/// PHY that records every burst handed down by L1Sync.
/// Clones share the same record, keep one to inspect what the tick context sent.
#[derive(Clone, Default)]
pub struct RecordingPhy {
    bursts: Arc<Mutex<Vec<RecordedBurst>>>,
    measurements: Arc<Mutex<Vec<FrameNumber>>>,
}

impl RecordingPhy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take_bursts(&self) -> Vec<RecordedBurst> {
        std::mem::take(&mut *self.bursts.lock().unwrap())
    }

    pub fn take_measurements(&self) -> Vec<FrameNumber> {
        std::mem::take(&mut *self.measurements.lock().unwrap())
    }
}

impl PhyIf for RecordingPhy {
    fn burst_send(&mut self, tn: u8, fnr: FrameNumber, burst_type: BurstType, payload: &[u8]) {
        self.bursts.lock().unwrap().push(RecordedBurst { tn, fnr, burst_type, payload: payload.to_vec() });
    }

    fn power_measurement(&mut self, fnr: FrameNumber) {
        self.measurements.lock().unwrap().push(fnr);
    }
}
