//! Shared types used across the relay mux firmware
//!
//! This module defines domain-specific types that enforce invariants
//! at compile time and provide type safety throughout the codebase.

use core::fmt;
use core::ops::{BitAnd, BitOr, BitOrAssign, Not};

use crate::config::{RELAY_COUNT, RELAY_MASK};

/// Relay channel number with validation
///
/// Channels are numbered from 1 to [`RELAY_COUNT`] and map to bit `n - 1`
/// of a [`ChannelMask`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Channel(u8);

impl Channel {
    /// Lowest channel number
    pub const MIN: u8 = 1;

    /// Highest channel number
    pub const MAX: u8 = RELAY_COUNT;

    /// Create a channel, returns None if out of range
    #[must_use]
    pub const fn new(number: u8) -> Option<Self> {
        if number >= Self::MIN && number <= Self::MAX {
            Some(Self(number))
        } else {
            None
        }
    }

    /// Create a channel from a parsed protocol integer
    #[must_use]
    pub fn from_i32(number: i32) -> Option<Self> {
        u8::try_from(number).ok().and_then(Self::new)
    }

    /// Get the 1-based channel number
    #[must_use]
    pub const fn number(self) -> u8 {
        self.0
    }

    /// Get the single-bit mask for this channel
    #[must_use]
    pub const fn mask(self) -> ChannelMask {
        ChannelMask(1 << (self.0 - 1))
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Channel({})", self.0)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Channel {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "CH{}", self.0);
    }
}

/// Set of relay channels, one bit per channel, 1 = closed
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ChannelMask(u32);

impl ChannelMask {
    /// No channels
    pub const NONE: Self = Self(0);

    /// Every valid channel
    pub const ALL: Self = Self(RELAY_MASK);

    /// Create a mask from raw bits, silently dropping bits outside the bank
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits & RELAY_MASK)
    }

    /// Create a mask from raw bits without masking
    ///
    /// Used for protocol arguments, which may carry bits the bank ignores.
    #[must_use]
    pub const fn from_bits_unmasked(bits: u32) -> Self {
        Self(bits)
    }

    /// Mask covering the inclusive range `from..=to`
    ///
    /// A reversed range (`from > to`) covers no channels.
    #[must_use]
    pub const fn range(from: Channel, to: Channel) -> Self {
        if from.0 > to.0 {
            return Self::NONE;
        }
        let width = to.0 - from.0 + 1;
        Self((((1u64 << width) - 1) as u32) << (from.0 - 1))
    }

    /// Get raw bits
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Restrict to channels that exist on the bank
    #[must_use]
    pub const fn valid(self) -> Self {
        Self(self.0 & RELAY_MASK)
    }

    /// Check if no channel is set
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Check if a channel is set
    #[must_use]
    pub const fn contains(self, channel: Channel) -> bool {
        self.0 & channel.mask().0 != 0
    }

    /// Check if exactly one channel is set
    #[must_use]
    pub const fn is_single(self) -> bool {
        self.0 != 0 && self.0 & (self.0 - 1) == 0
    }

    /// Number of channels set
    #[must_use]
    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// Channels in `self` that are not in `other`
    #[must_use]
    pub const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Iterate over set channels in ascending order
    pub fn channels(self) -> impl Iterator<Item = Channel> {
        (Channel::MIN..=Channel::MAX)
            .filter_map(Channel::new)
            .filter(move |ch| self.contains(*ch))
    }
}

impl From<Channel> for ChannelMask {
    fn from(channel: Channel) -> Self {
        channel.mask()
    }
}

impl BitOr for ChannelMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ChannelMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for ChannelMask {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl Not for ChannelMask {
    type Output = Self;

    fn not(self) -> Self {
        Self(!self.0)
    }
}

impl fmt::Debug for ChannelMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChannelMask({:#010b})", self.0)
    }
}

/// Formats as an SCPI channel list: `(@1,3)`, or `(@)` when empty
impl fmt::Display for ChannelMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(@")?;
        for (i, ch) in self.channels().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{ch}")?;
        }
        f.write_str(")")
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for ChannelMask {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=u32:08b}", self.0);
    }
}

/// Front-panel button event set
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct Buttons(u8);

impl Buttons {
    /// No buttons
    pub const NONE: Self = Self(0);

    /// Cycle button: step to the next single channel
    pub const CYCLE: Self = Self(0x01);

    /// Clear button: open every channel
    pub const CLEAR: Self = Self(0x02);

    /// Create from raw bits (unknown bits dropped)
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & 0x03)
    }

    /// Get raw bits
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Check if no button is set
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Check if all buttons in `other` are set
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }
}

impl BitOr for Buttons {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Buttons {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for Buttons {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Buttons(cycle={}, clear={})",
            self.contains(Self::CYCLE),
            self.contains(Self::CLEAR)
        )
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Buttons {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "Buttons(cycle={}, clear={})",
            self.contains(Self::CYCLE),
            self.contains(Self::CLEAR)
        );
    }
}

/// Ordering of open and close when moving to a new channel set
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SwitchPolicy {
    /// Open stale channels first, then close the target (momentary disconnect)
    #[default]
    BreakBeforeMake,
    /// Close the target first, then open stale channels (momentary overlap)
    MakeBeforeBreak,
}

#[cfg(feature = "embedded")]
impl defmt::Format for SwitchPolicy {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::BreakBeforeMake => defmt::write!(f, "BBM"),
            Self::MakeBeforeBreak => defmt::write!(f, "MBB"),
        }
    }
}
