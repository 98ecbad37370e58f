//! Console output path.
//!
//! The main loop and the playback task both talk to the operator. Each
//! renders its text into a [`ConsoleText`] first and then pushes the bytes
//! into [`CONSOLE_OUT`]; the writer task is the only owner of the UART
//! transmitter.

use core::fmt;

use alarm_clock::console::CrLf;
use embassy_stm32::usart::BufferedUartTx;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::pipe::Pipe;
use embedded_io_async::Write;

/// Rendered console text; large enough for the status block plus the menu.
pub type ConsoleText = heapless::String<1024>;

/// Bytes waiting for the UART transmitter.
static CONSOLE_OUT: Pipe<CriticalSectionRawMutex, 128> = Pipe::new();

/// Renders console text through the CR/LF adapter.
///
/// Text that does not fit is cut short rather than dropped.
pub fn render(write: impl FnOnce(&mut CrLf<&mut ConsoleText>) -> fmt::Result) -> ConsoleText {
    let mut text = ConsoleText::new();
    let mut out = CrLf::new(&mut text);
    if write(&mut out).is_err() {
        #[cfg(feature = "debug-mode")]
        defmt::warn!("Console text truncated at {} bytes", text.len());
    }
    text
}

/// Queues `text` for transmission, waiting while the pipe is full.
pub async fn send(text: &str) {
    CONSOLE_OUT.write_all(text.as_bytes()).await;
}

/// Async task draining the console pipe into the UART.
///
/// # Arguments
///
/// * `tx` - Transmit half of the console UART (takes ownership)
#[embassy_executor::task]
pub async fn console_writer_task(mut tx: BufferedUartTx<'static>) {
    let mut chunk = [0u8; 32];
    loop {
        let len = CONSOLE_OUT.read(&mut chunk).await;
        if let Err(_error) = tx.write_all(&chunk[..len]).await {
            #[cfg(feature = "debug-mode")]
            defmt::warn!("Console write failed: {}", _error);
        }
    }
}
