//! Layer 2 PDU definitions
//!
//! LAPDm frame header fields and frames as defined in TS 04.06 clause 3.

pub mod lapdm;
