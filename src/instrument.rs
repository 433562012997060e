//! Instrument
//!
//! Everything the foreground loop owns: the relay bank, the SCPI parser,
//! the dispatcher and the outbound reply buffer. Manual (front panel) and
//! remote (SCPI) control both go through here, one call at a time.

use embedded_hal::delay::DelayNs;

use crate::config::{RelayTiming, TX_BUFFER_SIZE};
use crate::dispatch::{Command, Dispatcher};
use crate::error::{ScpiError, ScpiResult};
use crate::protocol::response::ResponseWriter;
use crate::protocol::{units, ProgramUnit, ScpiParser};
use crate::relay::bank::RelayBank;
use crate::relay::front_panel::{self, PanelAction};
use crate::relay::RelayOutputs;
use crate::transport::{OutputBuffer, SharedRxBuffer, TxPacket};
use crate::types::Buttons;

/// Relay mux instrument core
pub struct Instrument<O, D> {
    bank: RelayBank<O, D>,
    parser: ScpiParser,
    dispatcher: Dispatcher,
    output: OutputBuffer<TX_BUFFER_SIZE>,
}

impl<O: RelayOutputs, D: DelayNs> Instrument<O, D> {
    /// Create an instrument with board relay timing
    pub fn new(outputs: O, delay: D, serial: &str) -> Self {
        Self::with_timing(outputs, delay, RelayTiming::new(), serial)
    }

    /// Create an instrument with explicit relay timing
    pub fn with_timing(outputs: O, delay: D, timing: RelayTiming, serial: &str) -> Self {
        Self {
            bank: RelayBank::with_timing(outputs, delay, timing),
            parser: ScpiParser::new(),
            dispatcher: Dispatcher::new(serial),
            output: OutputBuffer::new(),
        }
    }

    /// Feed received bytes; replies collect in the output buffer
    pub fn input(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            match self.parser.feed(byte) {
                Some(Ok(line)) => self.process_line(&line),
                Some(Err(error)) => self.fail(&mut ResponseWriter::new(), error),
                None => {}
            }
        }
    }

    /// Execute every program unit of one line
    ///
    /// A failing unit is reported and the rest of the line is skipped.
    pub fn process_line(&mut self, line: &[u8]) {
        let mut writer = ResponseWriter::new();

        let Ok(text) = core::str::from_utf8(line) else {
            self.fail(&mut writer, ScpiError::SyntaxError);
            return;
        };

        for unit in units(text) {
            if let Err(error) = self.process_unit(&mut writer, unit) {
                self.fail(&mut writer, error);
                return;
            }
        }

        writer.end_line(&mut self.output);
    }

    fn process_unit(&mut self, writer: &mut ResponseWriter, unit: &str) -> ScpiResult<()> {
        let Some(unit) = ProgramUnit::parse(unit)? else {
            return Ok(());
        };

        let command = Command::parse(&unit)?;

        #[cfg(feature = "embedded")]
        if command.is_mutating() {
            defmt::info!("SCPI {}", command);
        } else {
            defmt::debug!("SCPI {}", command);
        }

        let reply = self.dispatcher.execute(&mut self.bank, command)?;
        writer.reply(&mut self.output, &reply);
        Ok(())
    }

    fn fail(&mut self, writer: &mut ResponseWriter, error: ScpiError) {
        #[cfg(feature = "embedded")]
        defmt::warn!("SCPI error {}", error);

        self.dispatcher.report(error);
        writer.error(&mut self.output, error);
    }

    /// One transport poll: parse whatever has arrived, then collect the replies
    ///
    /// Returns a packet for the transmitter when there is reply data.
    pub fn poll_transport<const N: usize>(&mut self, rx: &SharedRxBuffer<N>) -> Option<TxPacket> {
        rx.drain_with(|bytes| self.input(bytes));

        if self.output.is_empty() {
            None
        } else {
            Some(self.output.take())
        }
    }

    /// Apply debounced front-panel presses
    pub fn handle_buttons(&mut self, buttons: Buttons) -> PanelAction {
        front_panel::apply(&mut self.bank, buttons)
    }

    /// Release every relay immediately
    pub fn force_safe(&mut self) {
        self.bank.force_safe();
    }

    /// Get the relay bank
    pub const fn bank(&self) -> &RelayBank<O, D> {
        &self.bank
    }

    /// Get the relay bank mutably
    pub fn bank_mut(&mut self) -> &mut RelayBank<O, D> {
        &mut self.bank
    }

    /// Get the dispatcher
    pub const fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Take pending reply bytes
    pub fn take_output(&mut self) -> TxPacket {
        self.output.take()
    }
}
