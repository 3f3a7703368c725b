pub mod clock;
pub mod gsmtime_sched;
pub mod l1_sync;
pub mod mframe_sched;
pub mod mframe_tables;

pub use clock::{ClockEvent, ClockState, FrameClock};
pub use gsmtime_sched::{EventId, GsmTimeScheduler};
pub use l1_sync::{L1Command, L1Event, L1Link, L1Status, L1Sync};
pub use mframe_sched::{MframeJob, MframeScheduler, TaskMaskHandle};
pub use mframe_tables::{MframeOp, MframeSchedItem};
