//! GPIO Abstractions
//!
//! Type-safe GPIO pin wrappers for the relay mux board.
//! Provides semantic meaning to pins through the type system.

use embassy_stm32::gpio::{Input, Output};

use crate::buttons::ButtonInputs;
use crate::config::RELAY_COUNT;
use crate::relay::RelayOutputs;
use crate::types::{Buttons, Channel, ChannelMask};

/// Status LED state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LedState {
    /// LED is off
    #[default]
    Off,
    /// LED is on
    On,
}

impl defmt::Format for LedState {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Off => defmt::write!(f, "OFF"),
            Self::On => defmt::write!(f, "ON"),
        }
    }
}

/// Status LED driver (active low)
pub struct StatusLed<'d> {
    pin: Output<'d>,
}

impl<'d> StatusLed<'d> {
    /// Take the LED pin, starting dark
    #[must_use]
    pub fn new(mut pin: Output<'d>) -> Self {
        pin.set_high();
        Self { pin }
    }

    /// Drive the LED
    pub fn set(&mut self, state: LedState) {
        match state {
            LedState::On => self.pin.set_low(),
            LedState::Off => self.pin.set_high(),
        }
    }

    /// Turn LED on
    pub fn on(&mut self) {
        self.set(LedState::On);
    }

    /// Read the state back from the output latch
    #[must_use]
    pub fn state(&self) -> LedState {
        if self.pin.is_set_low() {
            LedState::On
        } else {
            LedState::Off
        }
    }
}

/// Relay coil power switch (active low enable)
pub struct RelayPower<'d> {
    pin: Output<'d>,
}

impl<'d> RelayPower<'d> {
    /// Create relay power control (starts disabled)
    #[must_use]
    pub fn new(mut pin: Output<'d>) -> Self {
        pin.set_high();
        Self { pin }
    }

    /// Enable or disable coil power
    pub fn set_enabled(&mut self, enabled: bool) {
        if enabled {
            self.pin.set_low();
        } else {
            self.pin.set_high();
        }
    }

    /// Check if coil power is enabled
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.pin.is_set_low()
    }
}

/// Relay driver outputs, channel 1 on index 0 (active high)
pub struct RelayPins<'d> {
    pins: [Output<'d>; RELAY_COUNT as usize],
}

impl<'d> RelayPins<'d> {
    /// Create relay outputs from the eight driver pins
    #[must_use]
    pub fn new(pins: [Output<'d>; RELAY_COUNT as usize]) -> Self {
        Self { pins }
    }

    fn each(&mut self, channels: ChannelMask, high: bool) {
        for ch in channels.channels() {
            let pin = &mut self.pins[usize::from(ch.number() - 1)];
            if high {
                pin.set_high();
            } else {
                pin.set_low();
            }
        }
    }
}

impl RelayOutputs for RelayPins<'_> {
    fn assert(&mut self, channels: ChannelMask) {
        self.each(channels, true);
    }

    fn deassert(&mut self, channels: ChannelMask) {
        self.each(channels, false);
    }

    fn asserted(&self) -> ChannelMask {
        self.pins
            .iter()
            .enumerate()
            .filter(|(_, pin)| pin.is_set_high())
            .filter_map(|(i, _)| u8::try_from(i + 1).ok().and_then(Channel::new))
            .fold(ChannelMask::NONE, |acc, ch| acc | ch.mask())
    }
}

/// Front-panel buttons (active high with pull-downs)
pub struct PanelButtons<'d> {
    cycle: Input<'d>,
    clear: Input<'d>,
}

impl<'d> PanelButtons<'d> {
    /// Create panel buttons
    #[must_use]
    pub fn new(cycle: Input<'d>, clear: Input<'d>) -> Self {
        Self { cycle, clear }
    }
}

impl ButtonInputs for PanelButtons<'_> {
    fn read(&mut self) -> Buttons {
        let mut buttons = Buttons::NONE;
        if self.cycle.is_high() {
            buttons |= Buttons::CYCLE;
        }
        if self.clear.is_high() {
            buttons |= Buttons::CLEAR;
        }
        buttons
    }
}
