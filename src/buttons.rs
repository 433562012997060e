//! Front-Panel Button Debouncer
//!
//! "Wait for quiet" debouncing: raw assertions accumulate, and the set is
//! released only after no button has been seen asserted for a full window.
//! A held or bouncing button is therefore reported exactly once.
//!
//! [`ButtonDebouncer::sample`] runs from the tick context and
//! [`ButtonDebouncer::take`] from the foreground loop; [`SharedDebouncer`]
//! keeps the two mutually atomic.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use crate::config::BUTTON_DEBOUNCE_MS;
use crate::types::Buttons;

/// Raw front-panel inputs
pub trait ButtonInputs {
    /// Read the buttons asserted right now (active high, already conditioned)
    fn read(&mut self) -> Buttons;
}

/// Debounce state
#[derive(Clone, Copy, Debug)]
pub struct ButtonDebouncer {
    /// Buttons seen since the last [`take`](Self::take)
    pressed: Buttons,
    /// Tick of the most recent raw assertion
    last_activity_ms: u32,
    /// Required quiet time
    window_ms: u32,
}

impl ButtonDebouncer {
    /// Create a debouncer with the board window
    #[must_use]
    pub const fn new() -> Self {
        Self::with_window(BUTTON_DEBOUNCE_MS)
    }

    /// Create a debouncer with an explicit window
    #[must_use]
    pub const fn with_window(window_ms: u32) -> Self {
        Self {
            pressed: Buttons::NONE,
            last_activity_ms: 0,
            window_ms,
        }
    }

    /// Record one raw sample taken at `now_ms`
    pub fn sample(&mut self, raw: Buttons, now_ms: u32) {
        if !raw.is_empty() {
            self.pressed |= raw;
            self.last_activity_ms = now_ms;
        }
    }

    /// Return and clear the accumulated presses once the inputs are quiet
    pub fn take(&mut self, now_ms: u32) -> Buttons {
        // Elapsed time is valid across tick wrap-around; ticks more than half
        // the range behind `last_activity_ms` count as not yet quiet
        let quiet = now_ms.wrapping_sub(self.last_activity_ms);
        if !self.pressed.is_empty() && quiet > self.window_ms && quiet < 0x8000_0000 {
            let result = self.pressed;
            self.pressed = Buttons::NONE;
            result
        } else {
            Buttons::NONE
        }
    }

    /// Get accumulated presses without consuming them
    #[must_use]
    pub const fn pending(&self) -> Buttons {
        self.pressed
    }
}

impl Default for ButtonDebouncer {
    fn default() -> Self {
        Self::new()
    }
}

/// Debouncer shared between the tick context and the foreground loop
pub struct SharedDebouncer {
    inner: Mutex<CriticalSectionRawMutex, RefCell<ButtonDebouncer>>,
}

impl SharedDebouncer {
    /// Create a shared debouncer with the board window
    #[must_use]
    pub const fn new() -> Self {
        Self::with_window(BUTTON_DEBOUNCE_MS)
    }

    /// Create a shared debouncer with an explicit window
    #[must_use]
    pub const fn with_window(window_ms: u32) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(ButtonDebouncer::with_window(window_ms))),
        }
    }

    /// Tick side: record a raw sample
    pub fn sample(&self, raw: Buttons, now_ms: u32) {
        self.inner.lock(|state| state.borrow_mut().sample(raw, now_ms));
    }

    /// Tick side: read the inputs and record the sample
    pub fn poll<I: ButtonInputs>(&self, inputs: &mut I, now_ms: u32) {
        let raw = inputs.read();
        self.sample(raw, now_ms);
    }

    /// Foreground side: take debounced presses
    pub fn take(&self, now_ms: u32) -> Buttons {
        self.inner.lock(|state| state.borrow_mut().take(now_ms))
    }
}

impl Default for SharedDebouncer {
    fn default() -> Self {
        Self::new()
    }
}
