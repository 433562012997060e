//! SCPI response formatting
//!
//! Replies of separate units in one line are joined with `;` and the line
//! is closed with `\r\n`. Errors are reported on a line of their own.

use core::fmt::{self, Write};

use heapless::Vec;

use crate::config::{IDN_FIRMWARE, IDN_MANUFACTURER, IDN_MODEL, MAX_QUERY_FLAGS};
use crate::error::ScpiError;
use crate::types::ChannelMask;

/// Structured result of one command
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply<'a> {
    /// Command produced no output
    Done,
    /// Comma separated 0/1 flags
    Flags(Vec<u8, MAX_QUERY_FLAGS>),
    /// Single unsigned integer
    Unsigned(u32),
    /// Channel list, `(@1,3)`
    Channels(ChannelMask),
    /// `*IDN?` fields around the device serial
    Identity(&'a str),
    /// `SYSTem:ERRor?` entry, `None` meaning no error
    ErrorEntry(Option<ScpiError>),
    /// Fixed text
    Text(&'static str),
}

impl fmt::Display for Reply<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Done => Ok(()),
            Self::Flags(flags) => {
                for (i, flag) in flags.iter().enumerate() {
                    if i > 0 {
                        f.write_char(',')?;
                    }
                    write!(f, "{flag}")?;
                }
                Ok(())
            }
            Self::Unsigned(value) => write!(f, "{value}"),
            Self::Channels(mask) => write!(f, "{mask}"),
            Self::Identity(serial) => {
                write!(f, "{IDN_MANUFACTURER},{IDN_MODEL},{serial},{IDN_FIRMWARE}")
            }
            Self::ErrorEntry(Some(error)) => write!(f, "{error}"),
            Self::ErrorEntry(None) => f.write_str("0,\"No error\""),
            Self::Text(text) => f.write_str(text),
        }
    }
}

/// Tracks separators while a line's replies are written
#[derive(Clone, Copy, Debug, Default)]
pub struct ResponseWriter {
    /// Replies written since the line began
    results: usize,
}

impl ResponseWriter {
    /// Create a writer at the start of a line
    #[must_use]
    pub const fn new() -> Self {
        Self { results: 0 }
    }

    /// Write one reply, preceded by `;` if another reply is already on the line
    pub fn reply<W: Write>(&mut self, out: &mut W, reply: &Reply<'_>) {
        if *reply == Reply::Done {
            return;
        }
        if self.results > 0 {
            let _ = out.write_char(';');
        }
        let _ = write!(out, "{reply}");
        self.results += 1;
    }

    /// Write an error on its own line
    pub fn error<W: Write>(&mut self, out: &mut W, error: ScpiError) {
        self.end_line(out);
        let _ = write!(out, "{error}\r\n");
    }

    /// Terminate the line if anything was written
    pub fn end_line<W: Write>(&mut self, out: &mut W) {
        if self.results > 0 {
            let _ = out.write_str("\r\n");
            self.results = 0;
        }
    }
}
