use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use gsm_core::MframeTask;
use serde::Deserialize;
use toml::Value;

use super::stack_config::{CfgL1, CfgLapdm, CfgPhyIo, ConfigError, PhyBackend, SharedConfig, StackConfig, StackMode, StackState};

const EXPECTED_CONFIG_VERSION: &str = "0.1";

/// Build `SharedConfig` from a TOML configuration string
pub fn from_toml_str(toml_str: &str) -> Result<SharedConfig, ConfigError> {
    let root: TomlConfigRoot = toml::from_str(toml_str)?;

    // Various sanity checks
    if root.config_version != EXPECTED_CONFIG_VERSION {
        return Err(ConfigError::Version {
            found: root.config_version,
            expected: EXPECTED_CONFIG_VERSION,
        });
    }
    check_extra("top-level", &root.extra)?;
    if let Some(ref phy) = root.phy_io {
        check_extra("phy_io", &phy.extra)?;
    }
    if let Some(ref l1) = root.l1 {
        check_extra("l1", &l1.extra)?;
    }
    if let Some(ref lapdm) = root.lapdm {
        check_extra("lapdm", &lapdm.extra)?;
    }
    if let Some(ref ss) = root.stack_state {
        check_extra("stack_state", &ss.extra)?;
    }

    // Build config from required and optional values
    let mut cfg = StackConfig {
        stack_mode: root.stack_mode,
        debug_log: root.debug_log,
        phy_io: CfgPhyIo::default(),
        l1: CfgL1::default(),
        lapdm: CfgLapdm::default(),
    };

    if let Some(phy) = root.phy_io {
        apply_phy_io_patch(&mut cfg.phy_io, phy);
    }
    if let Some(l1) = root.l1 {
        apply_l1_patch(&mut cfg.l1, l1);
    }
    if let Some(lapdm) = root.lapdm {
        apply_lapdm_patch(&mut cfg.lapdm, lapdm);
    }

    let mut state = StackState::default();
    if let Some(ss) = root.stack_state {
        if let Some(v) = ss.timing_advance {
            state.timing_advance = v;
        }
        if let Some(v) = ss.ms_power {
            state.ms_power = v;
        }
    }

    // Report invalid settings as an error here, SharedConfig::from_parts would panic on them
    cfg.validate()?;
    Ok(SharedConfig::from_parts(cfg, state))
}

/// Build `SharedConfig` from any reader.
pub fn from_reader<R: Read>(reader: R) -> Result<SharedConfig, ConfigError> {
    let mut contents = String::new();
    let mut reader = BufReader::new(reader);
    reader.read_to_string(&mut contents)?;
    from_toml_str(&contents)
}

/// Build `SharedConfig` from a file path.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<SharedConfig, ConfigError> {
    let f = File::open(path)?;
    from_reader(f)
}

fn apply_phy_io_patch(dst: &mut CfgPhyIo, src: PhyIoDto) {
    dst.backend = src.backend;
    if let Some(v) = src.virt_start_fn {
        dst.virt_start_fn = v;
    }
    dst.frame_period_us = src.frame_period_us;
}

fn apply_l1_patch(dst: &mut CfgL1, src: L1Dto) {
    if let Some(v) = src.clock_tolerance {
        dst.clock_tolerance = v;
    }
    if let Some(v) = src.schedule_ahead {
        dst.schedule_ahead = v;
    }
    if let Some(v) = src.clock_loss_periods {
        dst.clock_loss_periods = v;
    }
    if let Some(v) = src.supervision_ms {
        dst.supervision_ms = v;
    }
    if let Some(v) = src.initial_tasks {
        dst.initial_tasks = v;
    }
}

fn apply_lapdm_patch(dst: &mut CfgLapdm, src: LapdmDto) {
    if let Some(v) = src.t200_sdcch_ms {
        dst.t200_sdcch_ms = v;
    }
    if let Some(v) = src.t200_sacch_ms {
        dst.t200_sacch_ms = v;
    }
    if let Some(v) = src.t200_facch_ms {
        dst.t200_facch_ms = v;
    }
    dst.n200_sdcch = src.n200_sdcch;
    dst.n200_sacch = src.n200_sacch;
    dst.n200_facch_f = src.n200_facch_f;
    dst.n200_facch_h = src.n200_facch_h;
    if let Some(v) = src.send_queue_limit {
        dst.send_queue_limit = v;
    }
    if let Some(v) = src.max_reassembly_len {
        dst.max_reassembly_len = v;
    }
    if let Some(v) = src.sapi3_enabled {
        dst.sapi3_enabled = v;
    }
}

fn check_extra(section: &'static str, map: &HashMap<String, Value>) -> Result<(), ConfigError> {
    if map.is_empty() {
        return Ok(());
    }
    let mut fields: Vec<String> = map.keys().cloned().collect();
    fields.sort_unstable();
    Err(ConfigError::UnknownFields { section, fields })
}

/// ----------------------- DTOs for input shape -----------------------

#[derive(Deserialize)]
struct TomlConfigRoot {
    config_version: String,
    stack_mode: StackMode,
    debug_log: Option<String>,

    #[serde(default)]
    phy_io: Option<PhyIoDto>,

    #[serde(default)]
    l1: Option<L1Dto>,

    #[serde(default)]
    lapdm: Option<LapdmDto>,

    #[serde(default)]
    stack_state: Option<StackStatePatch>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Deserialize)]
struct PhyIoDto {
    pub backend: PhyBackend,
    pub virt_start_fn: Option<u32>,
    pub frame_period_us: Option<u64>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Default, Deserialize)]
struct L1Dto {
    pub clock_tolerance: Option<u32>,
    pub schedule_ahead: Option<u32>,
    pub clock_loss_periods: Option<u32>,
    pub supervision_ms: Option<u64>,
    pub initial_tasks: Option<Vec<MframeTask>>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Default, Deserialize)]
struct LapdmDto {
    pub t200_sdcch_ms: Option<u64>,
    pub t200_sacch_ms: Option<u64>,
    pub t200_facch_ms: Option<u64>,
    pub n200_sdcch: Option<u32>,
    pub n200_sacch: Option<u32>,
    pub n200_facch_f: Option<u32>,
    pub n200_facch_h: Option<u32>,
    pub send_queue_limit: Option<usize>,
    pub max_reassembly_len: Option<usize>,
    pub sapi3_enabled: Option<bool>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Default, Deserialize)]
struct StackStatePatch {
    pub timing_advance: Option<u8>,
    pub ms_power: Option<u8>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}
