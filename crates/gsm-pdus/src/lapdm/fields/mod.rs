pub mod address;
pub mod control;
pub mod length;
