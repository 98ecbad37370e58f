//! Timing capability used by the sequencers.
//!
//! Rendering only ever needs "wait this many microseconds". On the chip the
//! wait is an `embassy-time` timer so other tasks keep running; the blocking
//! adapter below turns any `embedded-hal` busy-wait delay into the same
//! capability when cooperative waiting is not available.

use embedded_hal::blocking::delay::DelayUs;

/// Waits for an approximate duration. No minimum precision is guaranteed.
#[allow(async_fn_in_trait)]
pub trait Pause {
    async fn pause_us(&mut self, micros: u32);
}

/// Busy-waits through an `embedded-hal` blocking delay.
///
/// The returned future completes on its first poll, after the delay has
/// already spun for the whole duration.
pub struct BlockingPause<D> {
    delay: D,
}

impl<D: DelayUs<u32>> BlockingPause<D> {
    pub fn new(delay: D) -> Self {
        Self { delay }
    }

    pub fn release(self) -> D {
        self.delay
    }
}

impl<D: DelayUs<u32>> Pause for BlockingPause<D> {
    async fn pause_us(&mut self, micros: u32) {
        if micros > 0 {
            self.delay.delay_us(micros);
        }
    }
}
