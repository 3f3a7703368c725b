use serde::Deserialize;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use gsm_core::MframeTask;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum StackMode {
    /// Mobile station, the default role of this stack
    Ms,
    /// Network side of LAPDm, used for loopback testing against an MS
    Bts,
}

/// The PHY layer backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum PhyBackend {
    Undefined,
    None,
    /// Software PHY generating frame ticks from the system clock
    Virtual,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("unrecognized config_version: {found}, expect {expected}")]
    Version { found: String, expected: &'static str },
    #[error("unrecognized fields in {section}: {fields:?}")]
    UnknownFields { section: &'static str, fields: Vec<String> },
    #[error("invalid stack configuration: {0}")]
    Invalid(&'static str),
}

/// PHY layer I/O configuration
#[derive(Debug, Clone)]
pub struct CfgPhyIo {
    pub backend: PhyBackend,

    /// For the Virtual backend: frame number of the first generated frame
    pub virt_start_fn: u32,
    /// For the Virtual backend: frame period in microseconds, None for the nominal 4615
    pub frame_period_us: Option<u64>,
}

impl Default for CfgPhyIo {
    fn default() -> Self {
        Self {
            backend: PhyBackend::Undefined,
            virt_start_fn: 0,
            frame_period_us: None,
        }
    }
}

/// Layer 1 scheduler configuration
#[derive(Debug, Clone)]
pub struct CfgL1 {
    /// Maximum deviation in frames between observed and expected frame number
    /// before the frame clock resynchronizes
    pub clock_tolerance: u32,
    /// Number of frames the scheduler runs ahead of the observed frame
    pub schedule_ahead: u32,
    /// Number of supervision periods without a frame indication before the clock is declared lost
    pub clock_loss_periods: u32,
    /// Period of the clock supervision timer
    pub supervision_ms: u64,
    /// Tasks enabled when the stack starts
    pub initial_tasks: Vec<MframeTask>,
}

impl Default for CfgL1 {
    fn default() -> Self {
        Self {
            clock_tolerance: 1,
            schedule_ahead: 2,
            clock_loss_periods: 2,
            supervision_ms: 500,
            initial_tasks: Vec::new(),
        }
    }
}

/// LAPDm timers and counters. Unset N200 values use the TS 04.06 clause 5.8.2 defaults.
#[derive(Debug, Clone)]
pub struct CfgLapdm {
    pub t200_sdcch_ms: u64,
    pub t200_sacch_ms: u64,
    pub t200_facch_ms: u64,

    pub n200_sdcch: Option<u32>,
    pub n200_sacch: Option<u32>,
    pub n200_facch_f: Option<u32>,
    pub n200_facch_h: Option<u32>,

    /// Maximum number of upper layer messages waiting per data link
    pub send_queue_limit: usize,
    /// Maximum length of a reassembled layer 3 message
    pub max_reassembly_len: usize,
    /// Whether the SAPI 3 (SMS) data link is created
    pub sapi3_enabled: bool,
}

impl CfgLapdm {
    pub fn t200_sdcch(&self) -> Duration {
        Duration::from_millis(self.t200_sdcch_ms)
    }
    pub fn t200_sacch(&self) -> Duration {
        Duration::from_millis(self.t200_sacch_ms)
    }
    pub fn t200_facch(&self) -> Duration {
        Duration::from_millis(self.t200_facch_ms)
    }
}

impl Default for CfgLapdm {
    fn default() -> Self {
        Self {
            t200_sdcch_ms: 1000,
            t200_sacch_ms: 1000,
            t200_facch_ms: 1000,
            n200_sdcch: None,
            n200_sacch: None,
            n200_facch_f: None,
            n200_facch_h: None,
            send_queue_limit: 16,
            max_reassembly_len: 251,
            sapi3_enabled: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StackConfig {
    pub stack_mode: StackMode,
    pub debug_log: Option<String>,

    pub phy_io: CfgPhyIo,
    pub l1: CfgL1,
    pub lapdm: CfgLapdm,
}

impl StackConfig {
    pub fn new(mode: StackMode) -> Self {
        StackConfig {
            stack_mode: mode,
            debug_log: None,
            phy_io: CfgPhyIo::default(),
            l1: CfgL1::default(),
            lapdm: CfgLapdm::default(),
        }
    }

    /// Validate that all required configuration fields are properly set.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.phy_io.backend == PhyBackend::Undefined {
            return Err(ConfigError::Invalid("phy_io backend must be defined"));
        }
        if self.phy_io.frame_period_us == Some(0) {
            return Err(ConfigError::Invalid("phy_io frame_period_us must be nonzero"));
        }
        if self.l1.schedule_ahead == 0 || self.l1.schedule_ahead > 26 {
            return Err(ConfigError::Invalid("l1 schedule_ahead must be within 1..=26"));
        }
        if self.l1.supervision_ms == 0 || self.l1.clock_loss_periods == 0 {
            return Err(ConfigError::Invalid("l1 clock supervision period and count must be nonzero"));
        }
        let lapdm = &self.lapdm;
        if lapdm.t200_sdcch_ms == 0 || lapdm.t200_sacch_ms == 0 || lapdm.t200_facch_ms == 0 {
            return Err(ConfigError::Invalid("lapdm T200 values must be nonzero"));
        }
        if [lapdm.n200_sdcch, lapdm.n200_sacch, lapdm.n200_facch_f, lapdm.n200_facch_h].contains(&Some(0)) {
            return Err(ConfigError::Invalid("lapdm N200 overrides must be nonzero"));
        }
        if lapdm.send_queue_limit == 0 {
            return Err(ConfigError::Invalid("lapdm send_queue_limit must be nonzero"));
        }
        if lapdm.max_reassembly_len < 23 {
            return Err(ConfigError::Invalid("lapdm max_reassembly_len must hold at least one block"));
        }
        Ok(())
    }
}

/// Mutable, stack-editable state (lock-protected).
#[derive(Debug, Clone, Default)]
pub struct StackState {
    /// Timing advance, sent in the SACCH layer 1 header
    pub timing_advance: u8,
    /// MS power level, sent in the SACCH layer 1 header
    pub ms_power: u8,
}

/// Global shared configuration: immutable config + mutable state.
#[derive(Clone)]
pub struct SharedConfig {
    /// Read-only configuration (immutable after construction).
    cfg: Arc<StackConfig>,
    /// Mutable state guarded with RwLock (write by the stack, read by others).
    state: Arc<RwLock<StackState>>,
}

impl SharedConfig {
    pub fn new(mode: StackMode) -> Self {
        Self::from_config(StackConfig::new(mode))
    }

    pub fn from_config(cfg: StackConfig) -> Self {
        Self::from_parts(cfg, StackState::default())
    }

    pub fn from_parts(cfg: StackConfig, state: StackState) -> Self {
        // Check config for validity before returning the SharedConfig object
        if let Err(e) = cfg.validate() {
            panic!("{}", e);
        }

        Self {
            cfg: Arc::new(cfg),
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Access immutable config.
    pub fn config(&self) -> Arc<StackConfig> {
        Arc::clone(&self.cfg)
    }

    /// Read guard for mutable state.
    pub fn state_read(&self) -> std::sync::RwLockReadGuard<'_, StackState> {
        self.state.read().expect("StackState RwLock blocked")
    }

    /// Write guard for mutable state.
    pub fn state_write(&self) -> std::sync::RwLockWriteGuard<'_, StackState> {
        self.state.write().expect("StackState RwLock blocked")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        let mut cfg = StackConfig::new(StackMode::Ms);
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
        cfg.phy_io.backend = PhyBackend::None;
        assert!(cfg.validate().is_ok());
        cfg.lapdm.n200_sacch = Some(0);
        assert!(cfg.validate().is_err());
    }

    #[test]
    #[should_panic]
    fn test_invalid_config_panics() {
        let _ = SharedConfig::new(StackMode::Ms);
    }

    #[test]
    fn test_state_shared_between_clones() {
        let mut cfg = StackConfig::new(StackMode::Ms);
        cfg.phy_io.backend = PhyBackend::None;
        let shared = SharedConfig::from_config(cfg);
        let clone = shared.clone();
        clone.state_write().timing_advance = 7;
        assert_eq!(shared.state_read().timing_advance, 7);
    }
}
