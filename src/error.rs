//! SCPI error types
//!
//! Standard SCPI error numbers (SCPI-99 volume 2, chapter 21).

use core::fmt;

/// SCPI error with standard code and message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScpiError {
    /// -102: Malformed program unit or parameter
    SyntaxError,
    /// -104: Parameter of the wrong kind (e.g. number where a channel list is expected)
    DataTypeError,
    /// -108: Parameter given to a command that takes none
    ParameterNotAllowed,
    /// -109: Required parameter absent
    MissingParameter,
    /// -113: Header matches no command
    UndefinedHeader,
    /// -222: Channel or value outside the allowed range
    DataOutOfRange,
    /// -223: Channel list or reply larger than the fixed buffers
    TooMuchData,
    /// -350: Error queue full; later errors were lost
    QueueOverflow,
    /// -363: Line longer than the input buffer
    InputBufferOverrun,
}

/// Result type for protocol and dispatch operations
pub type ScpiResult<T> = Result<T, ScpiError>;

impl ScpiError {
    /// Get SCPI error number
    #[must_use]
    pub const fn code(self) -> i16 {
        match self {
            Self::SyntaxError => -102,
            Self::DataTypeError => -104,
            Self::ParameterNotAllowed => -108,
            Self::MissingParameter => -109,
            Self::UndefinedHeader => -113,
            Self::DataOutOfRange => -222,
            Self::TooMuchData => -223,
            Self::QueueOverflow => -350,
            Self::InputBufferOverrun => -363,
        }
    }

    /// Get SCPI error message
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::SyntaxError => "Syntax error",
            Self::DataTypeError => "Data type error",
            Self::ParameterNotAllowed => "Parameter not allowed",
            Self::MissingParameter => "Missing parameter",
            Self::UndefinedHeader => "Undefined header",
            Self::DataOutOfRange => "Data out of range",
            Self::TooMuchData => "Too much data",
            Self::QueueOverflow => "Queue overflow",
            Self::InputBufferOverrun => "Input buffer overrun",
        }
    }

    /// Event status register bit raised by this error class
    #[must_use]
    pub const fn esr_bit(self) -> u8 {
        match self.code() {
            -199..=-100 => crate::protocol::status::ESR_CME,
            -299..=-200 => crate::protocol::status::ESR_EXE,
            -399..=-300 => crate::protocol::status::ESR_DDE,
            _ => crate::protocol::status::ESR_QYE,
        }
    }
}

impl fmt::Display for ScpiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},\"{}\"", self.code(), self.message())
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for ScpiError {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{},\"{}\"", self.code(), self.message());
    }
}
