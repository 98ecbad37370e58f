//! Wall clock and alarm deadline on top of the embassy time driver.
//!
//! Wall time is the driver's uptime plus an offset written by "set clock".
//! The single alarm deadline lives in a critical-section cell; every write to
//! it (or to the offset, which moves the deadline's instant) signals the
//! deadline task, which sleeps until whichever comes first: the deadline or
//! the next change.

use core::cell::Cell;

use alarm_clock::alarm::ConfigStore;
use alarm_clock::rtc::RealTimeClock;
use alarm_clock::scheduler::RepeatScheduler;
use alarm_clock::time::Timestamp;
use embassy_futures::select::{Either, select};
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Instant, TICK_HZ, Timer};
use portable_atomic::{AtomicI64, Ordering};

use crate::announcer::FIRINGS;

/// Wall time minus uptime, in seconds.
static CLOCK_OFFSET: AtomicI64 = AtomicI64::new(0);

/// The pending alarm deadline, if any.
static DEADLINE: Mutex<CriticalSectionRawMutex, Cell<Option<Timestamp>>> = Mutex::new(Cell::new(None));

/// Raised whenever the deadline or the clock offset changes.
static DEADLINE_CHANGED: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Largest uptime an [`Instant`] can hold without overflowing its tick count.
const MAX_UPTIME_SECS: u64 = u64::MAX / TICK_HZ;

/// Handle to the board's wall clock and deadline register.
#[derive(Debug, Clone, Copy, Default)]
pub struct WallClock;

impl RealTimeClock for WallClock {
    fn now(&mut self) -> Timestamp {
        Timestamp(uptime_secs().saturating_add(CLOCK_OFFSET.load(Ordering::Relaxed)))
    }

    fn set_now(&mut self, now: Timestamp) {
        CLOCK_OFFSET.store(now.as_secs().saturating_sub(uptime_secs()), Ordering::Relaxed);
        DEADLINE_CHANGED.signal(());

        #[cfg(feature = "debug-mode")]
        defmt::info!("Clock set to {}", now);
    }

    fn arm_deadline(&mut self, at: Timestamp) {
        DEADLINE.lock(|deadline| deadline.set(Some(at)));
        DEADLINE_CHANGED.signal(());

        #[cfg(feature = "debug-mode")]
        defmt::info!("Deadline armed for {}", at);
    }

    fn clear_deadline(&mut self) {
        DEADLINE.lock(|deadline| deadline.set(None));
        DEADLINE_CHANGED.signal(());

        #[cfg(feature = "debug-mode")]
        defmt::info!("Deadline cleared");
    }
}

fn uptime_secs() -> i64 {
    i64::try_from(Instant::now().as_secs()).unwrap_or(i64::MAX)
}

/// Driver instant at which the wall clock reads `at`. Times before boot map
/// to instant zero, so they are already due.
fn instant_at(at: Timestamp) -> Instant {
    let uptime = at.as_secs().saturating_sub(CLOCK_OFFSET.load(Ordering::Relaxed));
    let uptime = u64::try_from(uptime).unwrap_or(0).min(MAX_UPTIME_SECS);
    Instant::from_secs(uptime)
}

/// Takes the deadline if it is still `expected`.
fn take_deadline(expected: Timestamp) -> bool {
    DEADLINE.lock(|deadline| {
        let reached = deadline.get() == Some(expected);
        if reached {
            deadline.set(None);
        }
        reached
    })
}

/// Async task standing in for the RTC alarm interrupt.
///
/// Waits for the pending deadline, consumes it, and lets the repeat
/// scheduler decide what it means. A firing is queued for the playback task
/// in [`FIRINGS`]; this task only waits when the queue is full, and any
/// deadline that passes meanwhile fires as soon as it is looked at.
///
/// # Arguments
///
/// * `store` - Alarm configuration shared with the console
#[embassy_executor::task]
pub async fn deadline_task(store: &'static ConfigStore<CriticalSectionRawMutex>) {
    let mut scheduler = RepeatScheduler::new();
    let mut clock = WallClock;

    loop {
        let Some(deadline) = DEADLINE.lock(Cell::get) else {
            DEADLINE_CHANGED.wait().await;
            continue;
        };

        match select(Timer::at(instant_at(deadline)), DEADLINE_CHANGED.wait()).await {
            Either::First(()) => {
                if !take_deadline(deadline) {
                    continue;
                }

                #[cfg(feature = "debug-mode")]
                defmt::info!("Deadline {} reached", deadline);

                scheduler.deliver(store.snapshot(), &mut clock, &FIRINGS).await;
            }
            Either::Second(()) => {}
        }
    }
}
