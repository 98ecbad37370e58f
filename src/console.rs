//! Operator console: line input state machine and output helpers.
//!
//! # Input
//!
//! [`InputSession`] is polled from the main loop. Each poll consumes at most
//! one byte and makes at most one state transition, so the loop never blocks
//! on the serial port:
//!
//! ```text
//! Idle       --byte ready-->              Reading
//! Reading    --'\r' | '\n' | buffer full--> Processing
//! Reading    --'\n' right after a '\r' line--> Idle
//! Processing --line handed out-->          Idle
//! ```
//!
//! Backspace (`0x08`) and DEL (`0x7f`) erase the last buffered byte. A `\r\n`
//! pair ends one line, not two.

use core::fmt;

use embedded_io::{Read, ReadReady};
use heapless::Vec;

/// Longest line kept; the next byte is left unread and the line is processed.
pub const LINE_CAPACITY: usize = 99;

const BACKSPACE: u8 = 0x08;
const DELETE: u8 = 0x7f;

/// A completed console line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Line {
    bytes: Vec<u8, LINE_CAPACITY>,
}

impl Line {
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The line as text, or `None` if it is not valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        core::str::from_utf8(&self.bytes).ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputState {
    Idle,
    Reading,
    Processing,
}

/// Console line reader owned by the main loop.
#[derive(Debug)]
pub struct InputSession {
    state: InputState,
    line: Line,
    /// The previous line ended with `\r`
    after_cr: bool,
}

impl InputSession {
    pub const fn new() -> Self {
        Self {
            state: InputState::Idle,
            line: Line { bytes: Vec::new() },
            after_cr: false,
        }
    }

    pub fn state(&self) -> InputState {
        self.state
    }

    /// Bytes buffered for the line being read.
    pub fn cursor(&self) -> usize {
        self.line.bytes.len()
    }

    /// Advances the state machine by one step.
    ///
    /// Returns the completed line on the pass that leaves `Processing`.
    ///
    /// # Errors
    ///
    /// Propagates serial port errors; the session state is left unchanged.
    pub fn poll<R>(&mut self, port: &mut R) -> Result<Option<Line>, R::Error>
    where
        R: Read + ReadReady,
    {
        match self.state {
            InputState::Idle => {
                if port.read_ready()? {
                    self.line.bytes.clear();
                    self.state = InputState::Reading;
                }
            }
            InputState::Reading => {
                if self.line.bytes.is_full() {
                    self.state = InputState::Processing;
                } else if port.read_ready()? {
                    let mut byte = [0u8; 1];
                    if port.read(&mut byte)? == 1 {
                        self.accept(byte[0]);
                    }
                }
            }
            InputState::Processing => {
                self.state = InputState::Idle;
                return Ok(Some(core::mem::take(&mut self.line)));
            }
        }
        Ok(None)
    }

    fn accept(&mut self, byte: u8) {
        let after_cr = core::mem::replace(&mut self.after_cr, false);
        match byte {
            b'\n' if after_cr && self.line.bytes.is_empty() => self.state = InputState::Idle,
            b'\r' => {
                self.after_cr = true;
                self.state = InputState::Processing;
            }
            b'\n' => self.state = InputState::Processing,
            BACKSPACE | DELETE => {
                self.line.bytes.pop();
            }
            _ => {
                // capacity was checked by the caller
                let _ = self.line.bytes.push(byte);
            }
        }
    }
}

impl Default for InputSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses a whole line as a decimal integer, ignoring surrounding whitespace.
pub fn parse_number(line: &str) -> Option<i32> {
    line.trim().parse().ok()
}

/// Writes `\r` after every `\n`, as serial terminals expect.
pub struct CrLf<W> {
    inner: W,
}

impl<W: fmt::Write> CrLf<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: fmt::Write> fmt::Write for CrLf<W> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let mut lines = s.split('\n');
        if let Some(first) = lines.next() {
            self.inner.write_str(first)?;
        }
        for rest in lines {
            self.inner.write_str("\n\r")?;
            self.inner.write_str(rest)?;
        }
        Ok(())
    }
}

/// Boot banner.
pub const BANNER: &str = "Initialization complete.\n";

/// Writes the command menu and the input prompt.
pub fn write_menu(out: &mut impl fmt::Write) -> fmt::Result {
    out.write_str(concat!(
        "\nDigital Alarm Clock\n",
        "1. Set clock - set the current time\n",
        "2. Set alarm - set when the alarm goes off\n",
        "3. Enable/disable alarm\n",
        "4. Choose melody\n",
        "5. Choose light pattern\n",
        "6. Set alarm repeats - repeat count and interval\n",
        "7. Show alarm status\n",
        "Enter choice: ",
    ))
}
