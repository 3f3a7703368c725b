use gsm_core::{BurstType, FrameNumber};

/// Downward interface of the tick-context L1 towards the burst level PHY.
/// Implementations must not block, they are called from the frame tick.
pub trait PhyIf: Send {
    /// Hand over one block or burst for transmission on timeslot `tn` starting at frame `fnr`.
    /// Normal burst payloads are one 23 octet block, access bursts carry the RA octet.
    fn burst_send(&mut self, tn: u8, fnr: FrameNumber, burst_type: BurstType, payload: &[u8]);

    /// Perform a neighbour power measurement in frame `fnr`
    fn power_measurement(&mut self, _fnr: FrameNumber) {}
}

/// PHY that discards everything, for stacks running without a radio
#[derive(Debug, Default)]
pub struct NullPhy;

impl PhyIf for NullPhy {
    fn burst_send(&mut self, tn: u8, fnr: FrameNumber, burst_type: BurstType, _payload: &[u8]) {
        tracing::trace!(fnr = fnr.get(), "null phy: drop {:?} burst on tn {}", burst_type, tn);
    }
}
