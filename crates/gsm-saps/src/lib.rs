/// Custom definitions for stack control
pub mod control;

pub mod dl;
pub mod mdl;
pub mod mph;
pub mod ph;
pub mod sapmsg;

pub use sapmsg::*;
