//! Communication Protocols
//!
//! SCPI line handling: bytes are collected into lines, lines are split into
//! program units, and each unit's header is matched against the command
//! table in [`crate::dispatch`].
//!
//! Only the subset of IEEE 488.2 / SCPI-99 the relay mux needs is handled:
//! short and long keyword forms, optional nodes, `;` separated units,
//! channel lists and unsigned numbers.

use heapless::Vec;

use crate::config::SCPI_INPUT_BUFFER_LENGTH;
use crate::error::{ScpiError, ScpiResult};

pub mod params;
pub mod pattern;
pub mod response;
pub mod status;

/// One complete input line, terminator stripped
pub type Line = Vec<u8, SCPI_INPUT_BUFFER_LENGTH>;

/// SCPI line assembler
pub struct ScpiParser {
    /// Line buffer
    buffer: Line,
    /// Current line overflowed and is being discarded
    overrun: bool,
}

impl ScpiParser {
    /// Create a new SCPI parser
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: Vec::new(),
            overrun: false,
        }
    }

    /// Feed a byte to the parser
    /// Returns a line if one is complete
    pub fn feed(&mut self, byte: u8) -> Option<ScpiResult<Line>> {
        match byte {
            b'\n' => {
                let line = core::mem::take(&mut self.buffer);
                if core::mem::take(&mut self.overrun) {
                    Some(Err(ScpiError::InputBufferOverrun))
                } else {
                    Some(Ok(line))
                }
            }
            // Tolerate CRLF hosts
            b'\r' => None,
            _ => {
                if !self.overrun && self.buffer.push(byte).is_err() {
                    self.buffer.clear();
                    self.overrun = true;
                }
                None
            }
        }
    }

    /// Clear the buffer
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.overrun = false;
    }

    /// Bytes held for an incomplete line
    #[must_use]
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

impl Default for ScpiParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Header and parameter text of one program unit
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProgramUnit<'a> {
    /// Command header, e.g. `ROUT:CLOS` or `*IDN?`
    pub header: &'a str,
    /// Parameter text after the header, trimmed (may be empty)
    pub params: &'a str,
}

impl<'a> ProgramUnit<'a> {
    /// Split a unit into header and parameters
    ///
    /// Returns `Ok(None)` for an empty unit (e.g. a trailing `;`).
    pub fn parse(unit: &'a str) -> ScpiResult<Option<Self>> {
        let unit = unit.trim();
        if unit.is_empty() {
            return Ok(None);
        }

        let (header, params) = match unit.find(|c: char| c.is_ascii_whitespace()) {
            Some(pos) => (&unit[..pos], unit[pos..].trim()),
            None => (unit, ""),
        };

        let valid = header
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b':' | b'*' | b'?' | b'_'));
        if !valid {
            return Err(ScpiError::SyntaxError);
        }

        Ok(Some(Self { header, params }))
    }
}

/// Split a line into program units on `;` outside quoted strings
pub fn units(line: &str) -> Units<'_> {
    Units { rest: Some(line) }
}

/// Iterator over the program units of a line
pub struct Units<'a> {
    rest: Option<&'a str>,
}

impl<'a> Iterator for Units<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let text = self.rest?;
        let mut quote = None;

        for (i, c) in text.char_indices() {
            match (quote, c) {
                (None, '"' | '\'') => quote = Some(c),
                (Some(q), c) if c == q => quote = None,
                (None, ';') => {
                    self.rest = Some(&text[i + 1..]);
                    return Some(&text[..i]);
                }
                _ => {}
            }
        }

        self.rest = None;
        Some(text)
    }
}
