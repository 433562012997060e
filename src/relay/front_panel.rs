//! Front-Panel Control
//!
//! Manual relay control from the two panel buttons:
//! - Clear opens every channel
//! - Cycle steps through the channels one at a time, 1 → 2 → … → 8 → 1

use embedded_hal::delay::DelayNs;

use super::bank::RelayBank;
use super::RelayOutputs;
use crate::types::{Buttons, ChannelMask, SwitchPolicy};

/// Action taken for a set of button events
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanelAction {
    /// Nothing pressed
    None,
    /// All channels opened
    Cleared,
    /// Moved to the given single channel
    Cycled(ChannelMask),
}

#[cfg(feature = "embedded")]
impl defmt::Format for PanelAction {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::None => defmt::write!(f, "None"),
            Self::Cleared => defmt::write!(f, "Cleared"),
            Self::Cycled(mask) => defmt::write!(f, "Cycled({})", mask),
        }
    }
}

/// Next channel in the cycle sequence
///
/// A single closed channel advances by one, wrapping after the last channel.
/// Anything else (none closed, several closed) restarts at channel 1.
#[must_use]
pub const fn next_cycle(state: ChannelMask) -> ChannelMask {
    let shifted = ChannelMask::from_bits(state.bits() << 1);
    if shifted.is_single() {
        shifted
    } else {
        ChannelMask::from_bits(1)
    }
}

/// Apply debounced button events to the bank
///
/// Clear takes priority when both buttons were pressed.
pub fn apply<O: RelayOutputs, D: DelayNs>(
    bank: &mut RelayBank<O, D>,
    buttons: Buttons,
) -> PanelAction {
    if buttons.contains(Buttons::CLEAR) {
        bank.open_all();
        PanelAction::Cleared
    } else if buttons.contains(Buttons::CYCLE) {
        let next = next_cycle(bank.state());
        bank.set(next, SwitchPolicy::BreakBeforeMake);
        PanelAction::Cycled(next)
    } else {
        PanelAction::None
    }
}
