//! Command Dispatcher
//!
//! Binds the SCPI vocabulary to relay bank operations.
//!
//! Parsing and execution are separate steps: [`Command::parse`] validates
//! every argument, and only a fully valid [`Command`] reaches
//! [`Dispatcher::execute`]. A rejected command therefore never moves a relay.

use embedded_hal::delay::DelayNs;
use heapless::{String, Vec};

use crate::config::{MAX_QUERY_FLAGS, SCPI_VERSION};
use crate::error::{ScpiError, ScpiResult};
use crate::protocol::params::{expect_none, parse_register, parse_u32, ChannelList};
use crate::protocol::pattern;
use crate::protocol::response::Reply;
use crate::protocol::status::{ErrorQueue, StatusRegisters, ESR_OPC};
use crate::protocol::ProgramUnit;
use crate::relay::bank::RelayBank;
use crate::relay::RelayOutputs;
use crate::types::{ChannelMask, SwitchPolicy};

/// Longest device serial kept for `*IDN?`
pub const MAX_SERIAL_LEN: usize = 16;

/// Header tag, resolved from the command table
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Tag {
    Cls,
    Ese,
    EseQuery,
    EsrQuery,
    Idn,
    Opc,
    OpcQuery,
    Rst,
    Sre,
    SreQuery,
    StbQuery,
    TstQuery,
    Wai,
    Open,
    Close,
    CloseQuery,
    OpenAll,
    StateQuery,
    SetBbm,
    SetMbb,
    GetQuery,
    ErrorNext,
    ErrorCount,
    Version,
}

/// Supported headers, matched in order
const COMMANDS: &[(&str, Tag)] = &[
    // IEEE mandated commands (SCPI std V1999.0 4.1.1)
    ("*CLS", Tag::Cls),
    ("*ESE", Tag::Ese),
    ("*ESE?", Tag::EseQuery),
    ("*ESR?", Tag::EsrQuery),
    ("*IDN?", Tag::Idn),
    ("*OPC", Tag::Opc),
    ("*OPC?", Tag::OpcQuery),
    ("*RST", Tag::Rst),
    ("*SRE", Tag::Sre),
    ("*SRE?", Tag::SreQuery),
    ("*STB?", Tag::StbQuery),
    ("*TST?", Tag::TstQuery),
    ("*WAI", Tag::Wai),
    // Relay routing
    ("[ROUTe]:OPEN", Tag::Open),
    ("[ROUTe]:CLOSe", Tag::Close),
    ("[ROUTe]:CLOSe?", Tag::CloseQuery),
    ("[ROUTe]:OPEN:ALL", Tag::OpenAll),
    ("[ROUTe]:CLOSe:STATe?", Tag::StateQuery),
    ("[ROUTe]:SET[:BBM]", Tag::SetBbm),
    ("[ROUTe]:SET:MBB", Tag::SetMbb),
    ("[ROUTe]:GET?", Tag::GetQuery),
    // Required SCPI system commands
    ("SYSTem:ERRor[:NEXT]?", Tag::ErrorNext),
    ("SYSTem:ERRor:COUNt?", Tag::ErrorCount),
    ("SYSTem:VERSion?", Tag::Version),
];

/// Fully validated command
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// `*CLS`: clear status and error queue
    ClearStatus,
    /// `*ESE <n>`
    SetEventEnable(u8),
    /// `*ESE?`
    EventEnableQuery,
    /// `*ESR?`
    EventStatusQuery,
    /// `*IDN?`
    Identify,
    /// `*OPC`
    OperationComplete,
    /// `*OPC?`
    OperationCompleteQuery,
    /// `*RST`: open every relay, clear enables
    Reset,
    /// `*SRE <n>`
    SetServiceEnable(u8),
    /// `*SRE?`
    ServiceEnableQuery,
    /// `*STB?`
    StatusByteQuery,
    /// `*TST?`
    SelfTestQuery,
    /// `*WAI`
    Wait,
    /// `ROUT:OPEN (@...)`
    Open(ChannelList),
    /// `ROUT:CLOS (@...)`
    Close(ChannelList),
    /// `ROUT:CLOS? (@...)`: one flag per requested channel, in request order
    CloseQuery(ChannelList),
    /// `ROUT:OPEN:ALL`
    OpenAll,
    /// `ROUT:CLOS:STAT?`: closed channels as a channel list
    StateQuery,
    /// `ROUT:SET <mask>` and `ROUT:SET:MBB <mask>`
    Set {
        /// Target channel bits exactly as sent
        mask: u32,
        /// Transition ordering
        policy: SwitchPolicy,
    },
    /// `ROUT:GET?`: closed channels as a number
    GetQuery,
    /// `SYST:ERR?`
    ErrorNextQuery,
    /// `SYST:ERR:COUN?`
    ErrorCountQuery,
    /// `SYST:VERS?`
    VersionQuery,
}

impl Command {
    /// Resolve a program unit into a command, validating all parameters
    pub fn parse(unit: &ProgramUnit<'_>) -> ScpiResult<Self> {
        let tag = COMMANDS
            .iter()
            .find(|(pat, _)| pattern::matches(pat, unit.header))
            .map(|(_, tag)| *tag)
            .ok_or(ScpiError::UndefinedHeader)?;

        let params = unit.params;
        let command = match tag {
            Tag::Open => Self::Open(ChannelList::parse(params)?),
            Tag::Close => Self::Close(ChannelList::parse(params)?),
            Tag::CloseQuery => Self::CloseQuery(ChannelList::parse(params)?),
            Tag::SetBbm => Self::Set {
                mask: parse_u32(params)?,
                policy: SwitchPolicy::BreakBeforeMake,
            },
            Tag::SetMbb => Self::Set {
                mask: parse_u32(params)?,
                policy: SwitchPolicy::MakeBeforeBreak,
            },
            Tag::Ese => Self::SetEventEnable(parse_register(params)?),
            Tag::Sre => Self::SetServiceEnable(parse_register(params)?),
            Tag::Cls => Self::bare(params, Self::ClearStatus)?,
            Tag::EseQuery => Self::bare(params, Self::EventEnableQuery)?,
            Tag::EsrQuery => Self::bare(params, Self::EventStatusQuery)?,
            Tag::Idn => Self::bare(params, Self::Identify)?,
            Tag::Opc => Self::bare(params, Self::OperationComplete)?,
            Tag::OpcQuery => Self::bare(params, Self::OperationCompleteQuery)?,
            Tag::Rst => Self::bare(params, Self::Reset)?,
            Tag::SreQuery => Self::bare(params, Self::ServiceEnableQuery)?,
            Tag::StbQuery => Self::bare(params, Self::StatusByteQuery)?,
            Tag::TstQuery => Self::bare(params, Self::SelfTestQuery)?,
            Tag::Wai => Self::bare(params, Self::Wait)?,
            Tag::OpenAll => Self::bare(params, Self::OpenAll)?,
            Tag::StateQuery => Self::bare(params, Self::StateQuery)?,
            Tag::GetQuery => Self::bare(params, Self::GetQuery)?,
            Tag::ErrorNext => Self::bare(params, Self::ErrorNextQuery)?,
            Tag::ErrorCount => Self::bare(params, Self::ErrorCountQuery)?,
            Tag::Version => Self::bare(params, Self::VersionQuery)?,
        };

        Ok(command)
    }

    /// Accept a command that takes no parameters
    fn bare(params: &str, command: Self) -> ScpiResult<Self> {
        expect_none(params)?;
        Ok(command)
    }

    /// Check if the command changes relay state
    #[must_use]
    pub const fn is_mutating(&self) -> bool {
        matches!(
            self,
            Self::Open(_) | Self::Close(_) | Self::OpenAll | Self::Set { .. } | Self::Reset
        )
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Command {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Open(list) => defmt::write!(f, "Open({})", list.mask()),
            Self::Close(list) => defmt::write!(f, "Close({})", list.mask()),
            Self::CloseQuery(list) => defmt::write!(f, "Close?({})", list.mask()),
            Self::OpenAll => defmt::write!(f, "OpenAll"),
            Self::StateQuery => defmt::write!(f, "State?"),
            Self::Set { mask, policy } => defmt::write!(f, "Set({=u32:#x}, {})", mask, policy),
            Self::GetQuery => defmt::write!(f, "Get?"),
            Self::Reset => defmt::write!(f, "*RST"),
            Self::Identify => defmt::write!(f, "*IDN?"),
            _ => defmt::write!(f, "SCPI(...)"),
        }
    }
}

/// Command executor with IEEE 488.2 status state
pub struct Dispatcher {
    /// Device serial reported by `*IDN?`
    serial: String<MAX_SERIAL_LEN>,
    /// ESR / ESE / SRE
    status: StatusRegisters,
    /// Pending errors for `SYST:ERR?`
    errors: ErrorQueue,
}

impl Dispatcher {
    /// Create a dispatcher reporting `serial` in `*IDN?`
    ///
    /// Serials longer than [`MAX_SERIAL_LEN`] are cut short.
    #[must_use]
    pub fn new(serial: &str) -> Self {
        let mut owned = String::new();
        for c in serial.chars() {
            if owned.push(c).is_err() {
                break;
            }
        }

        Self {
            serial: owned,
            status: StatusRegisters::new(),
            errors: ErrorQueue::new(),
        }
    }

    /// Execute a validated command against the bank
    pub fn execute<O: RelayOutputs, D: DelayNs>(
        &mut self,
        bank: &mut RelayBank<O, D>,
        command: Command,
    ) -> ScpiResult<Reply<'_>> {
        let reply = match command {
            Command::Open(list) => {
                bank.open(list.mask());
                Reply::Done
            }
            Command::Close(list) => {
                bank.close(list.mask());
                Reply::Done
            }
            Command::CloseQuery(list) => {
                let state = bank.state();
                let mut flags: Vec<u8, MAX_QUERY_FLAGS> = Vec::new();
                for ch in list.channels() {
                    flags
                        .push(u8::from(state.contains(ch)))
                        .map_err(|_| ScpiError::TooMuchData)?;
                }
                Reply::Flags(flags)
            }
            Command::OpenAll => {
                bank.open_all();
                Reply::Done
            }
            Command::StateQuery => Reply::Channels(bank.state()),
            Command::Set { mask, policy } => {
                bank.set(ChannelMask::from_bits_unmasked(mask), policy);
                Reply::Done
            }
            Command::GetQuery => Reply::Unsigned(bank.state().bits()),
            Command::ClearStatus => {
                self.status.esr = 0;
                self.errors.clear();
                Reply::Done
            }
            Command::SetEventEnable(value) => {
                self.status.ese = value;
                Reply::Done
            }
            Command::EventEnableQuery => Reply::Unsigned(u32::from(self.status.ese)),
            Command::EventStatusQuery => Reply::Unsigned(u32::from(self.status.take_esr())),
            Command::Identify => Reply::Identity(self.serial.as_str()),
            Command::OperationComplete => {
                // Commands run to completion before the next is parsed
                self.status.esr |= ESR_OPC;
                Reply::Done
            }
            Command::OperationCompleteQuery => Reply::Unsigned(1),
            Command::Reset => {
                bank.open_all();
                self.status.ese = 0;
                self.status.sre = 0;
                Reply::Done
            }
            Command::SetServiceEnable(value) => {
                self.status.sre = value;
                Reply::Done
            }
            Command::ServiceEnableQuery => Reply::Unsigned(u32::from(self.status.sre)),
            Command::StatusByteQuery => {
                Reply::Unsigned(u32::from(self.status.stb(!self.errors.is_empty())))
            }
            Command::SelfTestQuery => Reply::Unsigned(0),
            Command::Wait => Reply::Done,
            Command::ErrorNextQuery => Reply::ErrorEntry(self.errors.pop()),
            Command::ErrorCountQuery => Reply::Unsigned(self.errors.len() as u32),
            Command::VersionQuery => Reply::Text(SCPI_VERSION),
        };

        Ok(reply)
    }

    /// Record an error in the queue and the event status register
    pub fn report(&mut self, error: ScpiError) {
        self.status.esr |= error.esr_bit();
        self.errors.push(error);
    }

    /// Get the device serial
    #[must_use]
    pub fn serial(&self) -> &str {
        &self.serial
    }

    /// Get status registers
    #[must_use]
    pub const fn status(&self) -> &StatusRegisters {
        &self.status
    }

    /// Get error queue
    #[must_use]
    pub const fn errors(&self) -> &ErrorQueue {
        &self.errors
    }
}
