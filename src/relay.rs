//! Relay Control Logic
//!
//! The relay bank state machine and the front-panel policy that drives it.
//! Both run in the foreground context; the hardware sits behind [`RelayOutputs`].

use crate::types::ChannelMask;

pub mod bank;
pub mod front_panel;

/// Parallel relay driver outputs
///
/// Implementations only move pins. Settle delays belong to [`bank::RelayBank`].
pub trait RelayOutputs {
    /// Energize the coils in `channels`
    fn assert(&mut self, channels: ChannelMask);

    /// De-energize the coils in `channels`
    fn deassert(&mut self, channels: ChannelMask);

    /// Read back the currently energized coils
    fn asserted(&self) -> ChannelMask;
}

impl<T: RelayOutputs + ?Sized> RelayOutputs for &mut T {
    fn assert(&mut self, channels: ChannelMask) {
        (**self).assert(channels);
    }

    fn deassert(&mut self, channels: ChannelMask) {
        (**self).deassert(channels);
    }

    fn asserted(&self) -> ChannelMask {
        (**self).asserted()
    }
}
