//! System configuration and hardware constants
//!
//! This module defines compile-time constants for the relay mux hardware.
//! All pin mappings, timings, buffer sizes and identity strings are centralized here.

/// System clock frequency (STM32F042 from HSI48)
pub const SYSTEM_CLOCK_HZ: u32 = 48_000_000;

/// Number of relay channels on the board
pub const RELAY_COUNT: u8 = 8;

/// Mask covering every valid relay channel bit
pub const RELAY_MASK: u32 = (1 << RELAY_COUNT) - 1;

/// Relay operate (close) settle time in milliseconds
pub const RELAY_OPERATE_DELAY_MS: u32 = 10;

/// Relay release (open) settle time in milliseconds
pub const RELAY_RELEASE_DELAY_MS: u32 = 10;

/// Front-panel button sampling period in milliseconds
pub const BUTTON_SAMPLE_PERIOD_MS: u64 = 1;

/// Quiet time required after the last raw assertion before a press is reported
pub const BUTTON_DEBOUNCE_MS: u32 = 100;

/// Inbound transport buffer size (bytes from the host)
pub const RX_BUFFER_SIZE: usize = 128;

/// Outbound transport buffer size (reply bytes to the host)
pub const TX_BUFFER_SIZE: usize = 128;

/// Longest SCPI line accepted by the parser
pub const SCPI_INPUT_BUFFER_LENGTH: usize = 128;

/// SCPI error queue depth
pub const SCPI_ERROR_QUEUE_SIZE: usize = 17;

/// Most entries accepted in one channel list
pub const MAX_CHANNEL_LIST_ENTRIES: usize = 16;

/// Most flags a single `CLOSe?` can report
pub const MAX_QUERY_FLAGS: usize = 64;

/// USB CDC ACM packet size
pub const USB_CDC_PACKET_SIZE: u16 = 64;

/// Longest a reply may wait for the host to poll the IN endpoint
pub const USB_TX_TIMEOUT_MS: u64 = 100;

/// Reply packets queued for the USB writer
pub const TX_QUEUE_DEPTH: usize = 2;

/// USB VID
pub const USB_VID: u16 = 0x0483;

/// USB PID
pub const USB_PID: u16 = 0x5640;

/// USB device release (BCD 2.00)
pub const USB_DEVICE_RELEASE: u16 = 0x0200;

/// USB manufacturer string
pub const USB_MANUFACTURER: &str = "devEmbedded";

/// USB product string
pub const USB_PRODUCT: &str = "Relay Mux";

/// `*IDN?` manufacturer field
pub const IDN_MANUFACTURER: &str = "devEmbedded";

/// `*IDN?` model field
pub const IDN_MODEL: &str = "RelayMux";

/// `*IDN?` firmware field
pub const IDN_FIRMWARE: &str = env!("CARGO_PKG_VERSION");

/// SCPI standard version reported by `SYSTem:VERSion?`
pub const SCPI_VERSION: &str = "1999.0";

/// Pin assignments for GPIO
pub mod pins {
    //! GPIO pin assignments for the 2x4 relay mux board

    /// Relay driver outputs, channel 1..8 on PA0..PA7
    pub const RELAYS: &str = "PA0-PA7";

    /// Relay coil power enable (active low)
    pub const RELAY_PWR_EN: &str = "PB1";

    /// Cycle button (active high, pull-down)
    pub const BTN_CYCLE: &str = "PF0";

    /// Clear button (active high, pull-down)
    pub const BTN_CLEAR: &str = "PB8";

    /// Status LED (active low)
    pub const LED_STATUS: &str = "PF1";

    /// USB D+ (remapped from PA10)
    pub const USB_DP: &str = "PA12";

    /// USB D- (remapped from PA9)
    pub const USB_DM: &str = "PA11";
}

/// Relay settle timing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RelayTiming {
    /// Wait after asserting a coil, in milliseconds
    pub operate_ms: u32,
    /// Wait after releasing a coil, in milliseconds
    pub release_ms: u32,
}

impl RelayTiming {
    /// Board timing from the constants above
    #[must_use]
    pub const fn new() -> Self {
        Self {
            operate_ms: RELAY_OPERATE_DELAY_MS,
            release_ms: RELAY_RELEASE_DELAY_MS,
        }
    }
}

impl Default for RelayTiming {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for RelayTiming {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Timing(op={}ms, rel={}ms)", self.operate_ms, self.release_ms);
    }
}
