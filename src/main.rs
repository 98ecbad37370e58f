//! Firmware for the serial-console alarm clock.
//!
//! # Overview
//!
//! This firmware turns an STM32L031G6 board into an alarm clock operated
//! from a serial terminal:
//! - A menu on USART2 to set the clock, the alarm time and the alarm options
//! - One alarm deadline, repeated a configurable number of times
//! - A melody on the speaker gate and a light pattern on four LEDs per firing
//!
//! # Hardware
//!
//! - **MCU**: STM32L031G6U6 (Cortex-M0+, ultra-low-power)
//! - **Console**: USART2 at 9600 baud
//! - **Annunciator**: 4 active-low LEDs and an active-high speaker gate
//! - **Timekeeping**: 32.768 kHz crystal
//!
//! # Tasks
//!
//! - The main loop polls the console one byte at a time and dispatches
//!   completed lines; it never blocks on the UART
//! - [`wall_clock::deadline_task`] waits for the alarm deadline and runs the
//!   repeat scheduler
//! - [`announcer::playback_task`] renders firings with timer waits
//! - [`serial::console_writer_task`] owns the UART transmitter
//!
//! The console loop and the deadline task share only the alarm configuration
//! store.
//!
//! # Module Organization
//!
//! - [`hardware`] - Pin mappings and peripheral initialization
//! - [`wall_clock`] - Wall clock, deadline register and deadline task
//! - [`announcer`] - Firing playback task
//! - [`serial`] - Console output pipe and writer task

#![no_std]
#![no_main]

mod announcer;
mod hardware;
mod serial;
mod wall_clock;

use alarm_clock::alarm::ConfigStore;
use alarm_clock::console::InputSession;
use alarm_clock::dispatcher::Dispatcher;
use embassy_executor::Spawner;
use embassy_stm32::{
    Config,
    rcc::{LsConfig, LseConfig, mux::ClockMux},
    time::Hertz,
};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::Timer;
use {defmt_rtt as _, panic_probe as _};

use announcer::playback_task;
use hardware::Peripherals;
use serial::console_writer_task;
use wall_clock::{WallClock, deadline_task};

/// Console poll period while no input is pending, in milliseconds.
///
/// The UART receive buffer holds the bytes that arrive in between.
const IDLE_POLL_MS: u64 = 5;

/// The alarm configuration shared by the console and the deadline task.
static STORE: ConfigStore<CriticalSectionRawMutex> = ConfigStore::new(CriticalSectionRawMutex::new());

/// Creates the clock configuration for STM32L031.
///
/// # Clock Settings
///
/// - **MSI**: 2.097 MHz, enough for 9600 baud on USART2
/// - **System clock**: MSI (no PLL)
/// - **LSE**: 32.768 kHz external crystal
/// - **Voltage scale**: Range 1
///
/// # Returns
///
/// Configured RCC settings for embassy-stm32 initialization
fn create_console_clock_config() -> embassy_stm32::rcc::Config {
    embassy_stm32::rcc::Config {
        msi: Some(embassy_stm32::rcc::MSIRange::RANGE2M),
        hsi: false,
        hse: None,
        pll: None,
        sys: embassy_stm32::rcc::Sysclk::MSI,
        ahb_pre: embassy_stm32::rcc::AHBPrescaler::DIV1,
        apb1_pre: embassy_stm32::rcc::APBPrescaler::DIV1,
        apb2_pre: embassy_stm32::rcc::APBPrescaler::DIV1,
        ls: LsConfig {
            rtc: embassy_stm32::rcc::RtcClockSource::LSE,
            lsi: false,
            lse: Some(LseConfig {
                frequency: Hertz::hz(32768),
                mode: embassy_stm32::rcc::LseMode::Oscillator(embassy_stm32::rcc::LseDrive::Low),
            }),
        },
        voltage_scale: embassy_stm32::rcc::VoltageScale::RANGE1,
        mux: ClockMux::default(),
    }
}

/// Main entry point for the alarm clock firmware.
///
/// # Initialization Sequence
///
/// 1. Configure clocks
/// 2. Initialize STM32 peripherals, console UART and annunciator pins
/// 3. Spawn the console writer, playback and deadline tasks
/// 4. Print the banner and the menu
/// 5. Enter the console loop
///
/// # Main Loop
///
/// Each pass advances the console input state machine by one step. A
/// completed line goes to the dispatcher, whose reply is queued for the
/// writer task. When a pass makes no progress the loop sleeps for
/// [`IDLE_POLL_MS`].
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let mut config = Config::default();
    config.rcc = create_console_clock_config();

    let p = embassy_stm32::init(config);

    #[cfg(feature = "debug-mode")]
    defmt::info!("Alarm clock firmware starting...");

    #[cfg(feature = "debug-mode")]
    defmt::info!("Initializing peripherals...");

    let Peripherals {
        annunciator,
        console,
    } = Peripherals::new(p).unwrap();
    let (tx, mut rx) = console.split();

    #[cfg(feature = "debug-mode")]
    defmt::info!("Spawning tasks...");

    spawner.spawn(console_writer_task(tx)).unwrap();
    spawner.spawn(playback_task(annunciator)).unwrap();
    spawner.spawn(deadline_task(&STORE)).unwrap();

    let mut dispatcher = Dispatcher::new(&STORE, WallClock);
    let mut session = InputSession::new();

    serial::send(&serial::render(|out| dispatcher.greet(out))).await;

    #[cfg(feature = "debug-mode")]
    defmt::info!("Entering console loop...");

    loop {
        let before = (session.state(), session.cursor());

        match session.poll(&mut rx) {
            Ok(Some(line)) => {
                #[cfg(feature = "debug-mode")]
                defmt::debug!("Line of {} bytes in state {}", line.as_bytes().len(), dispatcher.prompt());

                let reply = serial::render(|out| dispatcher.handle_line(&line, out));
                serial::send(&reply).await;
            }
            Ok(None) if (session.state(), session.cursor()) == before => {
                Timer::after_millis(IDLE_POLL_MS).await;
            }
            Ok(None) => embassy_futures::yield_now().await,
            Err(_error) => {
                #[cfg(feature = "debug-mode")]
                defmt::warn!("Console read failed: {}", _error);

                Timer::after_millis(IDLE_POLL_MS).await;
            }
        }
    }
}
