//! Relay Mux Main Application
//!
//! Entry point for the STM32F042-based 8-channel relay multiplexer.
//! Initializes hardware, starts the high-priority executor for the
//! button sampler and USB, and runs the command loop in thread mode.

#![no_std]
#![no_main]

use defmt::{info, warn};
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_futures::join::join3;
use embassy_futures::yield_now;
use embassy_stm32::gpio::{Input, Level, Output, Pull, Speed};
use embassy_stm32::interrupt;
use embassy_stm32::interrupt::{InterruptExt, Priority};
use embassy_stm32::usb::Driver;
use embassy_stm32::{bind_interrupts, pac, peripherals, rcc};
use embassy_time::{Delay, Ticker};
use embassy_usb::class::cdc_acm::{CdcAcmClass, State};
use embassy_usb::Builder;
use heapless::String;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use relay_mux::buttons::SharedDebouncer;
use relay_mux::hal::gpio::{PanelButtons, RelayPins, RelayPower, StatusLed};
use relay_mux::identity;
use relay_mux::instrument::Instrument;
use relay_mux::prelude::*;
use relay_mux::relay::front_panel::PanelAction;
use relay_mux::transport::{queue_reply, SharedRxBuffer, TxChannel};
use relay_mux::usb::cdc::{self, UsbDeviceInfo, UsbStrings};

// Bind interrupt handlers
bind_interrupts!(struct Irqs {
    USB => embassy_stm32::usb::InterruptHandler<peripherals::USB>;
});

/// Bytes from the host, filled by the CDC receiver
static RX: SharedRxBuffer<RX_BUFFER_SIZE> = SharedRxBuffer::new();

/// Replies to the host, drained by the CDC sender
static TX: TxChannel<TX_QUEUE_DEPTH> = TxChannel::new();

/// Button debouncer, sampled every tick
static BUTTONS: SharedDebouncer = SharedDebouncer::new();

static SERIAL: StaticCell<String<8>> = StaticCell::new();

/// Executor for the tick and USB work, preempts the command loop
static EXECUTOR_HIGH: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
unsafe fn SPI1() {
    EXECUTOR_HIGH.on_interrupt();
}

/// Main entry point
#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("Relay Mux Firmware v{}", env!("CARGO_PKG_VERSION"));

    // 48 MHz from HSI48, trimmed by the CRS against USB SOF
    let mut config = embassy_stm32::Config::default();
    config.rcc.hsi48 = Some(rcc::Hsi48Config {
        sync_from_usb: true,
    });
    config.rcc.sys = rcc::Sysclk::HSI48;
    let p = embassy_stm32::init(config);

    // USB lives on the remapped PA11/PA12 pins of the 20-pin package
    pac::RCC.apb2enr().modify(|w| w.set_syscfgen(true));
    pac::SYSCFG.cfgr1().modify(|w| w.set_pa11_pa12_rmp(true));

    info!("Peripherals initialized");

    let mut led = StatusLed::new(Output::new(p.PF1, Level::High, Speed::Low));
    let mut power = RelayPower::new(Output::new(p.PB1, Level::High, Speed::Low));

    let relays = RelayPins::new([
        Output::new(p.PA0, Level::Low, Speed::Low),
        Output::new(p.PA1, Level::Low, Speed::Low),
        Output::new(p.PA2, Level::Low, Speed::Low),
        Output::new(p.PA3, Level::Low, Speed::Low),
        Output::new(p.PA4, Level::Low, Speed::Low),
        Output::new(p.PA5, Level::Low, Speed::Low),
        Output::new(p.PA6, Level::Low, Speed::Low),
        Output::new(p.PA7, Level::Low, Speed::Low),
    ]);

    let serial: &'static String<8> = SERIAL.init(identity::serial_number(identity::uid_words(
        embassy_stm32::uid::uid(),
    )));
    info!("Serial number {}", serial.as_str());

    let mut instrument = Instrument::new(relays, Delay, serial.as_str());
    info!("Relay timing {}", instrument.bank().timing());

    // Start the high-priority executor
    interrupt::SPI1.set_priority(Priority::P1);
    let spawner = EXECUTOR_HIGH.start(interrupt::SPI1);
    spawner.spawn(button_task(p.PF0, p.PB8)).unwrap();
    spawner
        .spawn(usb_task(p.USB, p.PA12, p.PA11, serial.as_str()))
        .unwrap();

    power.set_enabled(true);
    led.on();
    info!(
        "Relay power {}, LED {}, entering command loop",
        power.is_enabled(),
        led.state()
    );

    loop {
        match instrument.handle_buttons(BUTTONS.take(now_ms())) {
            PanelAction::None => {}
            action => info!("Front panel: {} -> {}", action, instrument.bank().state()),
        }

        if let Some(packet) = instrument.poll_transport(&RX) {
            if let Err(dropped) = queue_reply(&TX, packet) {
                warn!("TX queue full, dropped {} bytes", dropped.len());
            }
        }

        yield_now().await;
    }
}

/// Millisecond tick, wrapping
#[allow(clippy::cast_possible_truncation)]
fn now_ms() -> u32 {
    Instant::now().as_millis() as u32
}

/// Button sampler - one raw sample per tick
#[embassy_executor::task]
async fn button_task(cycle: peripherals::PF0, clear: peripherals::PB8) {
    let mut buttons = PanelButtons::new(
        Input::new(cycle, Pull::Down),
        Input::new(clear, Pull::Down),
    );
    let mut ticker = Ticker::every(Duration::from_millis(BUTTON_SAMPLE_PERIOD_MS));

    loop {
        BUTTONS.poll(&mut buttons, now_ms());
        ticker.next().await;
    }
}

/// USB device plus CDC receive and transmit loops
#[embassy_executor::task]
async fn usb_task(
    usb: peripherals::USB,
    dp: peripherals::PA12,
    dm: peripherals::PA11,
    serial: &'static str,
) {
    static CONFIG_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
    static BOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
    static MSOS_DESCRIPTOR: StaticCell<[u8; 0]> = StaticCell::new();
    static CONTROL_BUF: StaticCell<[u8; 64]> = StaticCell::new();
    static CDC_STATE: StaticCell<State<'static>> = StaticCell::new();

    let info = UsbDeviceInfo::default();
    info!("USB {} serial {}", info, serial);

    let driver = Driver::new(usb, Irqs, dp, dm);
    let mut builder = Builder::new(
        driver,
        cdc::device_config(info, UsbStrings::new(serial)),
        CONFIG_DESCRIPTOR.init([0; 256]),
        BOS_DESCRIPTOR.init([0; 256]),
        MSOS_DESCRIPTOR.init([0; 0]),
        CONTROL_BUF.init([0; 64]),
    );

    let class = CdcAcmClass::new(&mut builder, CDC_STATE.init(State::new()), USB_CDC_PACKET_SIZE);
    let (mut sender, mut receiver) = class.split();
    let mut device = builder.build();

    join3(
        device.run(),
        cdc::run_receiver(&mut receiver, &RX),
        cdc::run_sender(&mut sender, &TX),
    )
    .await;
}

/// Fault handler - drop every relay, cut coil power, blink the LED
#[cortex_m_rt::exception]
unsafe fn HardFault(_frame: &cortex_m_rt::ExceptionFrame) -> ! {
    pac::GPIOA.bsrr().write(|w| {
        for pin in 0..usize::from(RELAY_COUNT) {
            w.set_br(pin, true);
        }
    });
    pac::GPIOB.bsrr().write(|w| w.set_bs(1, true));

    loop {
        pac::GPIOF.bsrr().write(|w| w.set_br(1, true));
        cortex_m::asm::delay(SYSTEM_CLOCK_HZ / 8);
        pac::GPIOF.bsrr().write(|w| w.set_bs(1, true));
        cortex_m::asm::delay(SYSTEM_CLOCK_HZ / 8);
    }
}
