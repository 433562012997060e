//! USB Subsystem
//!
//! Provides the USB CDC ACM virtual serial port that carries SCPI traffic.

pub mod cdc;
