pub mod phy_if;
pub mod virt_phy;

pub use phy_if::{NullPhy, PhyIf};
