pub mod entity_trait;
pub mod l1;
pub mod l1s;
pub mod lapdm;
pub mod messagerouter;
pub mod phy;
pub mod timer;

// Re-export commonly used items from router
pub use entity_trait::GsmEntityTrait;
pub use messagerouter::{MessagePrio, MessageQueue, MessageRouter};
