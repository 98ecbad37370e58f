//! Hardware abstraction and peripheral initialization.
//!
//! This module defines the pin mappings and peripheral initialization
//! for the alarm clock board.
//!
//! # Pin Assignments
//!
//! ## Annunciator
//! - **PA4**: D9 - First alarm LED (active-low)
//! - **PA5**: D10 - Second alarm LED (active-low)
//! - **PA6**: D11 - Third alarm LED (active-low)
//! - **PA7**: D12 - Fourth alarm LED (active-low)
//! - **PB1**: SPKR - Speaker gate (active-high)
//!
//! ## Console (USART2)
//! - **PA9**: TX
//! - **PA10**: RX
//!
//! ## Low Power & RTC
//! - **PC14**: OSC32_IN - 32.768 kHz crystal input
//! - **PC15**: OSC32_OUT - 32.768 kHz crystal output
//!
//! ## Debug (SWD)
//! - **PA13**: SWDIO
//! - **PA14**: SWCLK

use alarm_clock::annunciator::{PinAnnunciator, Polarity};
use embassy_stm32::gpio::{Level, Output, Speed};
use embassy_stm32::usart::{self, BufferedUart};
use embassy_stm32::{bind_interrupts, peripherals};
use static_cell::StaticCell;

/// Console baud rate.
const CONSOLE_BAUD: u32 = 9600;

/// Size of each console ring buffer in bytes.
const CONSOLE_BUFFER_LEN: usize = 64;

bind_interrupts!(struct Irqs {
    USART2 => usart::BufferedInterruptHandler<peripherals::USART2>;
});

static CONSOLE_TX_BUFFER: StaticCell<[u8; CONSOLE_BUFFER_LEN]> = StaticCell::new();
static CONSOLE_RX_BUFFER: StaticCell<[u8; CONSOLE_BUFFER_LEN]> = StaticCell::new();

/// Speaker and LEDs driven straight from GPIO.
pub type Outputs = PinAnnunciator<Output<'static>, Output<'static>>;

/// Top-level peripheral container for the alarm clock.
pub struct Peripherals {
    /// Speaker gate and the four alarm LEDs
    pub annunciator: Outputs,
    /// Operator console
    pub console: BufferedUart<'static>,
}

impl Peripherals {
    /// Initializes all peripherals from STM32 peripheral singleton.
    ///
    /// Every output starts in its off state: speaker low, LEDs high.
    ///
    /// # Arguments
    ///
    /// * `p` - STM32 peripheral singleton from embassy_stm32::init()
    ///
    /// # Errors
    ///
    /// Returns the USART configuration error if the console baud rate cannot
    /// be reached from the current kernel clock.
    ///
    /// # Panics
    ///
    /// Panics if called more than once, since the console buffers are static.
    pub fn new(p: embassy_stm32::Peripherals) -> Result<Self, usart::ConfigError> {
        let mut config = usart::Config::default();
        config.baudrate = CONSOLE_BAUD;

        let console = BufferedUart::new(
            p.USART2,
            p.PA10,
            p.PA9,
            CONSOLE_TX_BUFFER.init([0; CONSOLE_BUFFER_LEN]),
            CONSOLE_RX_BUFFER.init([0; CONSOLE_BUFFER_LEN]),
            Irqs,
            config,
        )?;

        let annunciator = PinAnnunciator::new(
            Output::new(p.PB1, Level::Low, Speed::Low),
            Polarity::ActiveHigh,
            [
                Output::new(p.PA4, Level::High, Speed::Low),
                Output::new(p.PA5, Level::High, Speed::Low),
                Output::new(p.PA6, Level::High, Speed::Low),
                Output::new(p.PA7, Level::High, Speed::Low),
            ],
            Polarity::ActiveLow,
        );

        Ok(Self {
            annunciator,
            console,
        })
    }
}
