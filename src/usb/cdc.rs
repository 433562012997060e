//! USB CDC ACM (Serial) Implementation
//!
//! Provides the virtual serial port for SCPI control. The receive side
//! feeds the shared receive buffer, the transmit side drains the outbound
//! packet channel.

use defmt::{debug, info, warn};
use embassy_time::{with_timeout, Duration, Timer};
use embassy_usb::class::cdc_acm::{Receiver, Sender};
use embassy_usb::driver::{Driver, EndpointError};

use crate::config::{
    USB_CDC_PACKET_SIZE, USB_DEVICE_RELEASE, USB_MANUFACTURER, USB_PID, USB_PRODUCT,
    USB_TX_TIMEOUT_MS, USB_VID,
};
use crate::transport::{needs_zero_length_packet, SharedRxBuffer, TxChannel};

/// How long the receiver waits before rechecking buffer space
const BACKPRESSURE_POLL_MS: u64 = 1;

/// USB device descriptor strings
#[derive(Clone, Copy, Debug)]
pub struct UsbStrings {
    /// Manufacturer name
    pub manufacturer: &'static str,
    /// Product name
    pub product: &'static str,
    /// Serial number
    pub serial: &'static str,
}

impl UsbStrings {
    /// Board strings with the given serial number
    #[must_use]
    pub const fn new(serial: &'static str) -> Self {
        Self {
            manufacturer: USB_MANUFACTURER,
            product: USB_PRODUCT,
            serial,
        }
    }
}

/// USB device info for descriptor
#[derive(Clone, Copy, Debug)]
pub struct UsbDeviceInfo {
    /// Vendor ID
    pub vid: u16,
    /// Product ID
    pub pid: u16,
    /// Device release number
    pub device_release: u16,
}

impl Default for UsbDeviceInfo {
    fn default() -> Self {
        Self {
            vid: USB_VID,
            pid: USB_PID,
            device_release: USB_DEVICE_RELEASE,
        }
    }
}

impl defmt::Format for UsbDeviceInfo {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "USB({:04X}:{:04X})", self.vid, self.pid);
    }
}

/// Build the device configuration
#[must_use]
pub fn device_config(info: UsbDeviceInfo, strings: UsbStrings) -> embassy_usb::Config<'static> {
    let mut config = embassy_usb::Config::new(info.vid, info.pid);
    config.manufacturer = Some(strings.manufacturer);
    config.product = Some(strings.product);
    config.serial_number = Some(strings.serial);
    config.device_release = info.device_release;
    config.max_power = 100;
    config.max_packet_size_0 = 64;

    // IAD descriptors so hosts bind the CDC pair as one function
    config.device_class = 0xEF;
    config.device_sub_class = 0x02;
    config.device_protocol = 0x01;
    config.composite_with_iads = true;
    config
}

/// Receive loop: move host packets into the shared buffer
///
/// A packet is only read once a full packet of space is free, so the host
/// is throttled by NAKs instead of losing bytes.
pub async fn run_receiver<'d, D: Driver<'d>, const N: usize>(
    receiver: &mut Receiver<'d, D>,
    rx: &SharedRxBuffer<N>,
) -> ! {
    let mut packet = [0u8; USB_CDC_PACKET_SIZE as usize];

    loop {
        receiver.wait_connection().await;
        info!("CDC host connected");

        loop {
            while rx.free() < packet.len() {
                Timer::after_millis(BACKPRESSURE_POLL_MS).await;
            }

            match receiver.read_packet(&mut packet).await {
                Ok(len) => {
                    let accepted = rx.append(&packet[..len]);
                    if accepted < len {
                        warn!("RX dropped {} bytes", len - accepted);
                    }
                }
                Err(EndpointError::BufferOverflow) => warn!("RX packet overflow"),
                Err(EndpointError::Disabled) => break,
            }
        }

        info!("CDC host disconnected");
    }
}

/// Transmit loop: send reply packets to the host
///
/// Replies are cut into endpoint-sized packets. Packets produced while no
/// host is attached, or that the host does not collect within
/// [`USB_TX_TIMEOUT_MS`], are discarded.
pub async fn run_sender<'d, D: Driver<'d>, const N: usize>(
    sender: &mut Sender<'d, D>,
    tx: &TxChannel<N>,
) -> ! {
    let timeout = Duration::from_millis(USB_TX_TIMEOUT_MS);

    loop {
        let packet = tx.receive().await;
        match with_timeout(timeout, write_transfer(sender, &packet)).await {
            Ok(Ok(())) => {}
            Ok(Err(error)) => debug!("TX dropped {} bytes: {}", packet.len(), error),
            Err(_) => warn!("TX timed out, dropped {} bytes", packet.len()),
        }
    }
}

async fn write_transfer<'d, D: Driver<'d>>(
    sender: &mut Sender<'d, D>,
    data: &[u8],
) -> Result<(), EndpointError> {
    let size = usize::from(USB_CDC_PACKET_SIZE);
    for chunk in data.chunks(size) {
        sender.write_packet(chunk).await?;
    }
    if needs_zero_length_packet(data.len(), size) {
        sender.write_packet(&[]).await?;
    }
    Ok(())
}
