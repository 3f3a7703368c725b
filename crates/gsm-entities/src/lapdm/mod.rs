pub mod datalink;
pub mod lapdm_bs_ms;
pub mod lapdm_channel;
pub mod lapdm_entity;
pub mod params;
pub mod prim_router;

pub use datalink::{Datalink, DlAction, DlState, DlUp, LapdmError};
pub use lapdm_bs_ms::Lapdm;
pub use lapdm_channel::LapdmChannel;
pub use lapdm_entity::{LapdmEntity, LapdmOutput};
pub use params::{ChanKind, DatalinkParams};
pub use prim_router::{PrimRouter, RouteError};
