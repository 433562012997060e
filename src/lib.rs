//! Relay Mux Firmware Library
//!
//! This library provides the control core for an STM32F042-based
//! 8-channel relay multiplexer. The instrument is driven over USB CDC-ACM
//! with SCPI commands, and manually from two front-panel buttons.
//!
//! # Architecture
//!
//! The firmware is organized in layers:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    APPLICATION LAYER                         │
//! │  Instrument  │  Command Dispatcher  │  Front Panel           │
//! ├─────────────────────────────────────────────────────────────┤
//! │                   PROTOCOL / CORE LAYER                      │
//! │  SCPI Parser  │  Relay Bank  │  Debouncer  │  Transport      │
//! ├─────────────────────────────────────────────────────────────┤
//! │                   HAL / DRIVER LAYER                         │
//! │  Relay GPIO  │  Buttons  │  Status LED  │  USB CDC           │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    RTOS / SCHEDULER                          │
//! │  embassy-rs (thread executor + interrupt executor)           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Design Principles
//!
//! - **Validate, then act**: no relay moves until a command is fully parsed
//! - **Type-driven design**: channels and masks are range-checked newtypes
//! - **No unsafe in application code**: unsafe only in the binary's interrupt and fault handlers
//! - **Functional core, imperative shell**: hardware sits behind small traits
//! - **Explicit error handling**: all fallible operations return `Result`

#![cfg_attr(feature = "embedded", no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Re-export dependencies needed by applications (only in embedded mode)
#[cfg(feature = "embedded")]
pub use embassy_executor;
#[cfg(feature = "embedded")]
pub use embassy_stm32;
#[cfg(feature = "embedded")]
pub use embassy_time;
#[cfg(feature = "embedded")]
pub use embassy_usb;

/// Hardware Abstraction Layer
///
/// Board wiring: relay outputs, panel buttons, status LED.
#[cfg(feature = "embedded")]
pub mod hal;

/// USB Subsystem
///
/// CDC ACM transport for SCPI control.
#[cfg(feature = "embedded")]
pub mod usb;

/// Relay Control Logic
///
/// Relay bank state machine and front-panel policy.
pub mod relay;

/// Front-panel button debouncing
pub mod buttons;

/// Communication Protocols
///
/// SCPI line parser, header matching, parameters and responses.
pub mod protocol;

/// SCPI command dispatch
pub mod dispatch;

/// Byte buffers between the USB receiver and the command loop
pub mod transport;

/// Foreground instrument core
pub mod instrument;

/// Device serial number
pub mod identity;

/// SCPI errors
pub mod error;

/// Shared types used across modules
pub mod types;

/// System configuration and constants
pub mod config;

/// Prelude module for common imports
#[cfg(feature = "embedded")]
pub mod prelude {
    //! Convenient re-exports for common types and traits.

    pub use crate::config::*;
    pub use crate::types::*;

    // Common traits
    pub use embedded_hal::delay::DelayNs;

    // Embassy
    pub use embassy_time::{Duration, Instant, Timer};

    // Error handling
    pub use core::result::Result;

    // Logging
    pub use defmt::{debug, error, info, trace, warn};
}
