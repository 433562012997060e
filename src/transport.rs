//! Transport Bridge
//!
//! Byte buffers between the asynchronous USB receiver and the foreground
//! command loop. No framing is assumed; lines are found by the SCPI parser.
//!
//! The receive side appends under a critical section. The foreground works
//! on a snapshot, and afterwards removes exactly the bytes it saw. Anything
//! appended in the meantime is moved to the front and kept.

use core::cell::RefCell;
use core::fmt;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::channel::{Channel, TrySendError};
use heapless::Vec;

use crate::config::TX_BUFFER_SIZE;

/// Packet handed to the USB transmitter
pub type TxPacket = Vec<u8, TX_BUFFER_SIZE>;

/// Outbound packet channel between the foreground loop and the USB writer
pub type TxChannel<const N: usize> = Channel<CriticalSectionRawMutex, TxPacket, N>;

/// Queue a reply for the USB writer without waiting
///
/// Returns the packet when the queue is full; the caller drops it.
pub fn queue_reply<const N: usize>(tx: &TxChannel<N>, packet: TxPacket) -> Result<(), TxPacket> {
    tx.try_send(packet).map_err(|error| match error {
        TrySendError::Full(packet) => packet,
    })
}

/// Fixed-capacity receive buffer
pub struct RxBuffer<const N: usize> {
    buffer: [u8; N],
    len: usize,
}

impl<const N: usize> RxBuffer<N> {
    /// Create an empty buffer
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: [0; N],
            len: 0,
        }
    }

    /// Append as much of `data` as fits, returns bytes accepted
    pub fn push(&mut self, data: &[u8]) -> usize {
        let accepted = data.len().min(self.free());
        self.buffer[self.len..self.len + accepted].copy_from_slice(&data[..accepted]);
        self.len += accepted;
        accepted
    }

    /// Drop the first `count` bytes, moving the tail to the start
    pub fn consume(&mut self, count: usize) {
        let count = count.min(self.len);
        self.buffer.copy_within(count..self.len, 0);
        self.len -= count;
    }

    /// Get buffered bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer[..self.len]
    }

    /// Get used length
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Check if empty
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Get free space
    #[must_use]
    pub const fn free(&self) -> usize {
        N - self.len
    }

    /// Clear the buffer
    pub fn clear(&mut self) {
        self.len = 0;
    }
}

impl<const N: usize> Default for RxBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Receive buffer shared between the USB receiver and the foreground loop
pub struct SharedRxBuffer<const N: usize> {
    inner: Mutex<CriticalSectionRawMutex, RefCell<RxBuffer<N>>>,
}

impl<const N: usize> SharedRxBuffer<N> {
    /// Create an empty shared buffer
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(RxBuffer::new())),
        }
    }

    /// Receiver side: append as much of `data` as fits
    pub fn append(&self, data: &[u8]) -> usize {
        self.inner.lock(|rx| rx.borrow_mut().push(data))
    }

    /// Get used length
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock(|rx| rx.borrow().len())
    }

    /// Check if empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get free space
    #[must_use]
    pub fn free(&self) -> usize {
        self.inner.lock(|rx| rx.borrow().free())
    }

    /// Foreground side: hand the buffered bytes to `f`, then remove them
    ///
    /// `f` runs outside the critical section, so the receiver may keep
    /// appending; those bytes stay buffered for the next call. Returns the
    /// number of bytes handed over, `f` is not called when empty.
    pub fn drain_with<F: FnOnce(&[u8])>(&self, f: F) -> usize {
        let mut snapshot = [0u8; N];
        let len = self.inner.lock(|rx| {
            let rx = rx.borrow();
            snapshot[..rx.len()].copy_from_slice(rx.as_bytes());
            rx.len()
        });

        if len == 0 {
            return 0;
        }

        f(&snapshot[..len]);

        self.inner.lock(|rx| rx.borrow_mut().consume(len));
        len
    }
}

impl<const N: usize> Default for SharedRxBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Outbound reply buffer
///
/// Writes past capacity are dropped without error.
pub struct OutputBuffer<const N: usize> {
    buffer: [u8; N],
    len: usize,
}

impl<const N: usize> OutputBuffer<N> {
    /// Create a new write buffer
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: [0; N],
            len: 0,
        }
    }

    /// Write data to buffer, returns bytes kept
    pub fn write(&mut self, data: &[u8]) -> usize {
        let space = N - self.len;
        let to_write = data.len().min(space);
        self.buffer[self.len..self.len + to_write].copy_from_slice(&data[..to_write]);
        self.len += to_write;
        to_write
    }

    /// Get buffer contents
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer[..self.len]
    }

    /// Hand the contents to the transmitter and reset the length
    pub fn take(&mut self) -> Vec<u8, N> {
        let mut packet = Vec::new();
        let _ = packet.extend_from_slice(self.as_bytes());
        self.len = 0;
        packet
    }

    /// Clear the buffer
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Get used length
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Check if empty
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<const N: usize> Default for OutputBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> fmt::Write for OutputBuffer<N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write(s.as_bytes());
        Ok(())
    }
}

/// A bulk transfer ending on a full packet needs a zero-length packet to terminate it
#[must_use]
pub const fn needs_zero_length_packet(len: usize, packet_size: usize) -> bool {
    len != 0 && packet_size != 0 && len % packet_size == 0
}
