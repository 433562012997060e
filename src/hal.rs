//! Hardware Abstraction Layer
//!
//! Provides safe abstractions over the STM32F042 pins used by the board.
//! This module isolates hardware-specific code behind the core's
//! [`RelayOutputs`](crate::relay::RelayOutputs) and
//! [`ButtonInputs`](crate::buttons::ButtonInputs) traits.

pub mod gpio;
