//! Renders alarm firings on the speaker and LEDs.
//!
//! The deadline task only decides that an alarm fires; the firing is queued
//! in [`FIRINGS`] and rendered here with cooperative timer waits, so the
//! console keeps running while the melody plays. Firings are rendered one
//! after another in the order they were decided.

use alarm_clock::annunciator::Annunciator;
use alarm_clock::console::write_menu;
use alarm_clock::delay::Pause;
use alarm_clock::scheduler::FiringQueue;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::Timer;

use crate::hardware::Outputs;
use crate::serial;

/// Firings waiting to be rendered.
///
/// Four slots cover a few repeats queued behind one slow melody.
const FIRING_SLOTS: usize = 4;

/// Firings decided by the deadline task, waiting to be rendered.
pub static FIRINGS: FiringQueue<CriticalSectionRawMutex, FIRING_SLOTS> = FiringQueue::new();

/// Pause backed by the embassy timer; other tasks run while it waits.
pub struct TimerPause;

impl Pause for TimerPause {
    async fn pause_us(&mut self, micros: u32) {
        Timer::after_micros(u64::from(micros)).await;
    }
}

/// Async task rendering firings.
///
/// For each firing: prints the attempt notice, plays the melody and light
/// pattern to completion, switches every output off and redisplays the menu.
///
/// # Arguments
///
/// * `outputs` - Speaker and LED pins (takes ownership)
#[embassy_executor::task]
pub async fn playback_task(mut outputs: Outputs) {
    let Ok(()) = outputs.silence();

    loop {
        let firing = FIRINGS.next().await;

        let notice = serial::render(|out| {
            use core::fmt::Write;
            writeln!(out, "\n{firing}")
        });
        serial::send(&notice).await;

        let playback = firing.playback();

        #[cfg(feature = "debug-mode")]
        defmt::info!(
            "Playback of attempt {} started: melody {}, lights {}",
            firing.attempt,
            playback.melody(),
            playback.light()
        );

        let Ok(_finished) = playback.run(&mut outputs, &mut TimerPause).await;

        #[cfg(feature = "debug-mode")]
        defmt::debug!("Playback finished: {}", _finished);

        serial::send(&serial::render(|out| write_menu(out))).await;
    }
}
