pub mod registry;

pub use registry::{TimerError, TimerHandle, TimerRegistry};
