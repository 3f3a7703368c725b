use std::time::Duration;

use as_any::AsAny;
use gsm_config::SharedConfig;
use gsm_core::gsm_entities::GsmEntity;
use gsm_saps::SapMsg;

use crate::MessageQueue;

/// Trait for main-loop entities of the stack
/// Used by MessageRouter for passing messages between entities
pub trait GsmEntityTrait: Send + AsAny {
    /// Returns the entity type identifier
    fn entity(&self) -> GsmEntity;

    /// Handle incoming SAP primitive
    fn rx_prim(&mut self, queue: &mut MessageQueue, message: SapMsg);

    /// Update configuration (optional)
    #[allow(dead_code)]
    fn set_config(&mut self, _config: SharedConfig) {}

    /// Called at the start of each main loop iteration, with the monotonic time since stack start.
    /// Wall-clock timers are processed here.
    fn tick_start(&mut self, _queue: &mut MessageQueue, _now: Duration) {}

    /// Called at the end of each main loop iteration. Returns true if the entity has more work pending.
    fn tick_end(&mut self, _queue: &mut MessageQueue, _now: Duration) -> bool {
        false
    }
}
