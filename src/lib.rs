//! True RMS, power and energy metering over windows of raw ADC samples.
//!
//! The sample path (`update`, `update_phase_a`, `update_phase_b`) is integer
//! only and cheap enough for an interrupt handler; `publish` converts the last
//! complete window into calibrated values. Without the default `std` feature
//! the crate is `no_std`.
#![cfg_attr(not(feature = "std"), no_std)]

pub mod metrology_rms;

pub use metrology_rms::*;
