//! Core utilities for the GSM MS layer 1/layer 2 stack
//!
//! This crate provides fundamental types and utilities used across the stack:
//! - MsgBuf for octet and bit-field level PDU manipulation
//! - FrameNumber and GsmTime for TDMA frame timing
//! - PHY types (BurstType, SignalQuality, channel numbers)
//! - SAP and entity identifiers
//! - Common macros and debug utilities

pub mod debug;
pub mod gsm_common;
pub mod gsm_entities;
pub mod gsm_time;
pub mod msgbuf;
pub mod mframe_task;
pub mod pdu_parse_error;
pub mod phy_types;

// Re-export commonly used items
pub use gsm_common::*;
pub use gsm_time::{FrameNumber, GsmTime};
pub use mframe_task::MframeTask;
pub use msgbuf::MsgBuf;
pub use pdu_parse_error::PduParseErr;
pub use phy_types::*;

/// Channel number as defined in TS 08.58 clause 9.3.1: C-bits (5) followed by timeslot (3)
pub type ChanNr = u8;

/// Link identifier as defined in TS 08.58 clause 9.3.2. Bit 6 set means SACCH.
pub type LinkId = u8;
