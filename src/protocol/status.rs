//! IEEE 488.2 status reporting
//!
//! Event status register, service request enable and the SCPI error queue.

use heapless::Deque;

use crate::config::SCPI_ERROR_QUEUE_SIZE;
use crate::error::ScpiError;

/// ESR bit 0: operation complete
pub const ESR_OPC: u8 = 0x01;
/// ESR bit 2: query error
pub const ESR_QYE: u8 = 0x04;
/// ESR bit 3: device-dependent error
pub const ESR_DDE: u8 = 0x08;
/// ESR bit 4: execution error
pub const ESR_EXE: u8 = 0x10;
/// ESR bit 5: command error
pub const ESR_CME: u8 = 0x20;

/// STB bit 2: error/event queue not empty
pub const STB_EAV: u8 = 0x04;
/// STB bit 5: event status summary
pub const STB_ESB: u8 = 0x20;
/// STB bit 6: master summary status
pub const STB_MSS: u8 = 0x40;

/// SCPI error queue
///
/// First in, first out. When full, the newest entry is replaced by
/// [`ScpiError::QueueOverflow`].
#[derive(Clone, Debug, Default)]
pub struct ErrorQueue {
    queue: Deque<ScpiError, SCPI_ERROR_QUEUE_SIZE>,
}

impl ErrorQueue {
    /// Create an empty queue
    #[must_use]
    pub const fn new() -> Self {
        Self {
            queue: Deque::new(),
        }
    }

    /// Queue an error
    pub fn push(&mut self, error: ScpiError) {
        if self.queue.is_full() {
            self.queue.pop_back();
            let _ = self.queue.push_back(ScpiError::QueueOverflow);
        } else {
            let _ = self.queue.push_back(error);
        }
    }

    /// Take the oldest error
    pub fn pop(&mut self) -> Option<ScpiError> {
        self.queue.pop_front()
    }

    /// Number of queued errors
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Check if empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Drop every queued error
    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

/// Status registers
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatusRegisters {
    /// Event status register (cleared on read)
    pub esr: u8,
    /// Event status enable
    pub ese: u8,
    /// Service request enable
    pub sre: u8,
}

impl StatusRegisters {
    /// Create cleared registers
    #[must_use]
    pub const fn new() -> Self {
        Self {
            esr: 0,
            ese: 0,
            sre: 0,
        }
    }

    /// Read and clear the event status register
    pub fn take_esr(&mut self) -> u8 {
        core::mem::take(&mut self.esr)
    }

    /// Compute the status byte
    #[must_use]
    pub const fn stb(&self, errors_pending: bool) -> u8 {
        let mut stb = 0;
        if errors_pending {
            stb |= STB_EAV;
        }
        if self.esr & self.ese != 0 {
            stb |= STB_ESB;
        }
        if stb & self.sre & !STB_MSS != 0 {
            stb |= STB_MSS;
        }
        stb
    }
}
