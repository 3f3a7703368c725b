#![allow(dead_code)]

pub mod component_test;
pub mod recording_phy;
pub mod sink;

pub use component_test::{ComponentTest, default_test_config};
pub use recording_phy::{RecordedBurst, RecordingPhy};
pub use sink::Sink;
