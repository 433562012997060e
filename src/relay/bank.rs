//! Relay Bank
//!
//! Owns the authoritative mask of closed channels. Every transition
//! blocks for the relay settle time before the new state becomes visible.

use embedded_hal::delay::DelayNs;

use super::RelayOutputs;
use crate::config::RelayTiming;
use crate::types::{ChannelMask, SwitchPolicy};

/// Relay bank with settle-delay sequencing
///
/// Bits outside the bank are dropped silently; no operation can fail.
pub struct RelayBank<O, D> {
    outputs: O,
    delay: D,
    timing: RelayTiming,
    state: ChannelMask,
}

impl<O: RelayOutputs, D: DelayNs> RelayBank<O, D> {
    /// Create a relay bank with board timing
    ///
    /// All coils are released immediately so the bank starts all-open.
    pub fn new(outputs: O, delay: D) -> Self {
        Self::with_timing(outputs, delay, RelayTiming::new())
    }

    /// Create a relay bank with explicit settle timing
    pub fn with_timing(outputs: O, delay: D, timing: RelayTiming) -> Self {
        let mut bank = Self {
            outputs,
            delay,
            timing,
            state: ChannelMask::NONE,
        };
        bank.force_safe();
        bank
    }

    /// Close the channels in `mask`, then wait the operate time
    pub fn close(&mut self, mask: ChannelMask) {
        let mask = mask.valid();
        self.outputs.assert(mask);
        self.delay.delay_ms(self.timing.operate_ms);
        self.state |= mask;
    }

    /// Open the channels in `mask`, then wait the release time
    pub fn open(&mut self, mask: ChannelMask) {
        let mask = mask.valid();
        self.outputs.deassert(mask);
        self.delay.delay_ms(self.timing.release_ms);
        self.state = self.state.without(mask);
    }

    /// Open every channel regardless of the current state
    pub fn open_all(&mut self) {
        self.open(ChannelMask::ALL);
    }

    /// Move to exactly `mask` using the given ordering
    pub fn set(&mut self, mask: ChannelMask, policy: SwitchPolicy) {
        let target = mask.valid();
        let stale = self.state.without(target);

        match policy {
            SwitchPolicy::BreakBeforeMake => {
                self.open(stale);
                self.close(target);
            }
            SwitchPolicy::MakeBeforeBreak => {
                self.close(target);
                self.open(stale);
            }
        }
    }

    /// Get the closed channels
    #[must_use]
    pub const fn state(&self) -> ChannelMask {
        self.state
    }

    /// Release every coil without waiting
    pub fn force_safe(&mut self) {
        self.outputs.deassert(ChannelMask::ALL);
        self.state = ChannelMask::NONE;
    }

    /// Get settle timing
    #[must_use]
    pub const fn timing(&self) -> RelayTiming {
        self.timing
    }

    /// Borrow the output driver
    pub const fn outputs(&self) -> &O {
        &self.outputs
    }
}

#[cfg(feature = "embedded")]
impl<O, D> defmt::Format for RelayBank<O, D> {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "RelayBank({})", self.state);
    }
}
