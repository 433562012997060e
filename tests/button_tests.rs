//! Button Debouncer Tests
//!
//! Tests for wait-for-quiet debouncing and the shared tick/foreground pair.

use relay_mux::buttons::{ButtonDebouncer, ButtonInputs, SharedDebouncer};
use relay_mux::config::BUTTON_DEBOUNCE_MS;
use relay_mux::types::Buttons;

/// Scripted raw inputs, one entry per sample
struct ScriptedButtons {
    samples: Vec<Buttons>,
    index: usize,
}

impl ScriptedButtons {
    fn new(samples: Vec<Buttons>) -> Self {
        Self { samples, index: 0 }
    }
}

impl ButtonInputs for ScriptedButtons {
    fn read(&mut self) -> Buttons {
        let raw = self.samples.get(self.index).copied().unwrap_or(Buttons::NONE);
        self.index += 1;
        raw
    }
}

/// Run a 1 ms sample/take loop and collect every reported event with its tick
fn run(
    debouncer: &mut ButtonDebouncer,
    start: u32,
    raw: impl Fn(u32) -> Buttons,
    ticks: u32,
) -> Vec<(u32, Buttons)> {
    let mut events = Vec::new();
    for i in 0..ticks {
        let now = start.wrapping_add(i);
        debouncer.sample(raw(i), now);
        let taken = debouncer.take(now);
        if !taken.is_empty() {
            events.push((now, taken));
        }
    }
    events
}

// ============================================================================
// Debouncer Tests
// ============================================================================

#[test]
fn test_idle_reports_nothing() {
    let mut debouncer = ButtonDebouncer::new();
    assert_eq!(debouncer.take(0), Buttons::NONE);
    assert_eq!(debouncer.take(1_000_000), Buttons::NONE);
}

#[test]
fn test_short_burst_reports_once() {
    let mut debouncer = ButtonDebouncer::new();
    // Bouncy press: on for a few ticks, off, on again
    let raw = |t: u32| {
        if t < 20 && t % 3 != 0 {
            Buttons::CYCLE
        } else {
            Buttons::NONE
        }
    };

    let events = run(&mut debouncer, 0, raw, 500);

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].1, Buttons::CYCLE);
    // Last raw assertion at t = 19, quiet must exceed the window
    assert_eq!(events[0].0, 19 + BUTTON_DEBOUNCE_MS + 1);
}

#[test]
fn test_not_reported_before_window() {
    let mut debouncer = ButtonDebouncer::new();
    debouncer.sample(Buttons::CLEAR, 10);

    assert_eq!(debouncer.take(10 + BUTTON_DEBOUNCE_MS), Buttons::NONE);
    assert_eq!(debouncer.pending(), Buttons::CLEAR);
    assert_eq!(debouncer.take(11 + BUTTON_DEBOUNCE_MS), Buttons::CLEAR);
    assert_eq!(debouncer.pending(), Buttons::NONE);
}

#[test]
fn test_held_button_reports_once_after_release() {
    let mut debouncer = ButtonDebouncer::new();
    let raw = |t: u32| if t < 500 { Buttons::CYCLE } else { Buttons::NONE };

    let events = run(&mut debouncer, 0, raw, 2_000);

    assert_eq!(events, vec![(499 + BUTTON_DEBOUNCE_MS + 1, Buttons::CYCLE)]);
}

#[test]
fn test_buttons_accumulate_within_burst() {
    let mut debouncer = ButtonDebouncer::new();
    debouncer.sample(Buttons::CYCLE, 0);
    debouncer.sample(Buttons::CLEAR, 50);

    assert_eq!(debouncer.take(120), Buttons::NONE);
    assert_eq!(debouncer.take(151), Buttons::CYCLE | Buttons::CLEAR);
}

#[test]
fn test_tick_wrap_around() {
    let mut debouncer = ButtonDebouncer::new();
    let start = u32::MAX - 10;

    debouncer.sample(Buttons::CYCLE, start);

    // 91 ms later, across the wrap
    assert_eq!(debouncer.take(start.wrapping_add(91)), Buttons::NONE);
    assert_eq!(debouncer.take(start.wrapping_add(101)), Buttons::CYCLE);
}

#[test]
fn test_take_behind_last_sample_waits() {
    let mut debouncer = ButtonDebouncer::new();
    debouncer.sample(Buttons::CYCLE, 1_000);

    // Foreground read a tick value older than the sample
    assert_eq!(debouncer.take(999), Buttons::NONE);
    assert_eq!(debouncer.take(1_000u32.wrapping_sub(0x8000_0000)), Buttons::NONE);
    assert_eq!(debouncer.pending(), Buttons::CYCLE);

    assert_eq!(debouncer.take(1_000 + 0x7FFF_FFFF), Buttons::CYCLE);
}

#[test]
fn test_burst_across_wrap_reports_once() {
    let mut debouncer = ButtonDebouncer::new();
    let raw = |t: u32| if t < 30 { Buttons::CLEAR } else { Buttons::NONE };

    let events = run(&mut debouncer, u32::MAX - 15, raw, 400);

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].1, Buttons::CLEAR);
}

#[test]
fn test_custom_window() {
    let mut debouncer = ButtonDebouncer::with_window(5);
    debouncer.sample(Buttons::CYCLE, 0);
    assert_eq!(debouncer.take(5), Buttons::NONE);
    assert_eq!(debouncer.take(6), Buttons::CYCLE);
}

// ============================================================================
// Shared Debouncer Tests
// ============================================================================

#[test]
fn test_shared_poll_and_take() {
    let shared = SharedDebouncer::new();
    let mut inputs = ScriptedButtons::new(vec![Buttons::CYCLE; 10]);

    let mut events = Vec::new();
    for now in 0..300 {
        shared.poll(&mut inputs, now);
        let taken = shared.take(now);
        if !taken.is_empty() {
            events.push(taken);
        }
    }

    assert_eq!(events, vec![Buttons::CYCLE]);
}

#[test]
fn test_shared_static_instance() {
    static BUTTONS: SharedDebouncer = SharedDebouncer::with_window(10);

    BUTTONS.sample(Buttons::CLEAR, 100);
    assert_eq!(BUTTONS.take(105), Buttons::NONE);
    assert_eq!(BUTTONS.take(111), Buttons::CLEAR);
    assert_eq!(BUTTONS.take(200), Buttons::NONE);
}
