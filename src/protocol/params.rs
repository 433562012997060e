//! SCPI parameter parsing
//!
//! Channel lists and unsigned numbers. Every channel reference is checked
//! against the bank here, so a command that parses cleanly can never touch
//! a channel that does not exist.

use heapless::Vec;

use crate::config::MAX_CHANNEL_LIST_ENTRIES;
use crate::error::{ScpiError, ScpiResult};
use crate::types::{Channel, ChannelMask};

/// One entry of a channel list
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelListEntry {
    /// A single channel, `3`
    Single(Channel),
    /// An inclusive range, `2:5`
    Range(Channel, Channel),
}

impl ChannelListEntry {
    /// Channels covered by this entry
    #[must_use]
    pub const fn mask(self) -> ChannelMask {
        match self {
            Self::Single(ch) => ch.mask(),
            Self::Range(from, to) => ChannelMask::range(from, to),
        }
    }

    /// Channels in the order written; a reversed range such as `5:2` yields none
    pub fn channels(self) -> impl Iterator<Item = Channel> {
        let (from, to) = match self {
            Self::Single(ch) => (ch.number(), ch.number()),
            Self::Range(from, to) => (from.number(), to.number()),
        };

        (from..=to).filter_map(Channel::new)
    }
}

/// Parsed `(@...)` channel list
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChannelList {
    entries: Vec<ChannelListEntry, MAX_CHANNEL_LIST_ENTRIES>,
}

impl ChannelList {
    /// Parse a channel list parameter such as `(@1,3:5)`
    pub fn parse(text: &str) -> ScpiResult<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ScpiError::MissingParameter);
        }

        let inner = text
            .strip_prefix('(')
            .map(str::trim_start)
            .and_then(|t| t.strip_prefix('@'))
            .ok_or(ScpiError::DataTypeError)?;
        let close = inner.find(')').ok_or(ScpiError::SyntaxError)?;
        if !inner[close + 1..].trim().is_empty() {
            return Err(ScpiError::ParameterNotAllowed);
        }

        let body = inner[..close].trim();
        let mut entries = Vec::new();
        if body.is_empty() {
            return Ok(Self { entries });
        }

        for item in body.split(',') {
            let entry = parse_entry(item.trim())?;
            entries.push(entry).map_err(|_| ScpiError::TooMuchData)?;
        }

        Ok(Self { entries })
    }

    /// Union of every entry
    #[must_use]
    pub fn mask(&self) -> ChannelMask {
        self.entries
            .iter()
            .fold(ChannelMask::NONE, |acc, entry| acc | entry.mask())
    }

    /// Channels in request order, duplicates kept
    pub fn channels(&self) -> impl Iterator<Item = Channel> + '_ {
        self.entries.iter().flat_map(|entry| entry.channels())
    }

    /// Parsed entries
    #[must_use]
    pub fn entries(&self) -> &[ChannelListEntry] {
        &self.entries
    }

    /// Check if the list names no channels
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_entry(item: &str) -> ScpiResult<ChannelListEntry> {
    if item.is_empty() || item.contains('!') {
        // Multi-dimensional entries do not exist on a single bank
        return Err(ScpiError::SyntaxError);
    }

    match item.split_once(':') {
        None => Ok(ChannelListEntry::Single(parse_channel(item)?)),
        Some((from, to)) => Ok(ChannelListEntry::Range(
            parse_channel(from.trim())?,
            parse_channel(to.trim())?,
        )),
    }
}

fn parse_channel(text: &str) -> ScpiResult<Channel> {
    let number: i32 = text.parse().map_err(|_| ScpiError::SyntaxError)?;
    Channel::from_i32(number).ok_or(ScpiError::DataOutOfRange)
}

/// Parse a single unsigned 32-bit numeric parameter
///
/// Accepts decimal, `#H` hex, `#Q` octal and `#B` binary.
pub fn parse_u32(text: &str) -> ScpiResult<u32> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ScpiError::MissingParameter);
    }
    if text.contains(',') {
        return Err(ScpiError::ParameterNotAllowed);
    }

    let (digits, radix) = match text.as_bytes() {
        [b'#', b'H' | b'h', ..] => (&text[2..], 16),
        [b'#', b'Q' | b'q', ..] => (&text[2..], 8),
        [b'#', b'B' | b'b', ..] => (&text[2..], 2),
        [b'-', rest @ ..] if !rest.is_empty() && rest.iter().all(u8::is_ascii_digit) => {
            return Err(ScpiError::DataOutOfRange);
        }
        _ => (text.strip_prefix('+').unwrap_or(text), 10),
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(ScpiError::DataTypeError);
    }

    u32::from_str_radix(digits, radix).map_err(|_| ScpiError::DataOutOfRange)
}

/// Parse a register value (0..=255) for `*ESE` / `*SRE`
pub fn parse_register(text: &str) -> ScpiResult<u8> {
    let value = parse_u32(text)?;
    u8::try_from(value).map_err(|_| ScpiError::DataOutOfRange)
}

/// Reject any parameter text for commands that take none
pub fn expect_none(text: &str) -> ScpiResult<()> {
    if text.trim().is_empty() {
        Ok(())
    } else {
        Err(ScpiError::ParameterNotAllowed)
    }
}
