//! Alarm repeat scheduler.
//!
//! Runs once per reached deadline and decides what that deadline means:
//!
//! ```text
//! Idle       --set alarm-->            Armed(1)
//! Armed(n)   --deadline, n <= count--> Armed(n+1)   fire, re-arm at deadline + n*interval
//! Armed(n)   --deadline, n == count+1--> Idle       fire, clear the deadline
//! Armed(n)   --deadline, disabled-->   Idle         clear the deadline
//! ```
//!
//! An enabled alarm therefore sounds once at its deadline and then
//! `repeat_count` more times. The firing itself is returned as a [`Firing`]
//! for the caller to render; the scheduler never waits on playback, so a
//! deadline handler calling it stays short.
//!
//! Rendering a firing takes longer than a short repeat interval, so firings
//! are handed to the renderer through a [`FiringQueue`] in the order they
//! were decided.

use core::fmt;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Channel;

use crate::alarm::{LightId, MelodyId, Snapshot};
use crate::playback::Playback;
use crate::rtc::RealTimeClock;
use crate::time::Timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SchedulerState {
    Idle,
    /// Waiting for the deadline of repeat attempt `attempt` (1-based)
    Armed { attempt: u32 },
}

/// A firing decided by the scheduler, ready to be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Firing {
    pub attempt: u32,
    /// Deadline armed for the following attempt, if any
    pub next: Option<Timestamp>,
    pub melody: MelodyId,
    pub light: LightId,
}

impl Firing {
    /// Fresh playback for this firing.
    pub fn playback(&self) -> Playback {
        Playback::start(self.melody, self.light)
    }
}

/// The progress notice printed on the console for a firing.
impl fmt::Display for Firing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.next {
            Some(next) => write!(f, "Alarm attempt {}, next alarm at {}", self.attempt, next),
            None => write!(f, "Alarm attempt {}, no further repeats", self.attempt),
        }
    }
}

/// Repeat cursor and the arming generation it belongs to.
#[derive(Debug)]
pub struct RepeatScheduler {
    state: SchedulerState,
    arming: u32,
}

impl RepeatScheduler {
    pub const fn new() -> Self {
        Self {
            state: SchedulerState::Idle,
            arming: 0,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Restarts the cursor if the operator has set a new alarm since the
    /// last call.
    pub fn observe(&mut self, snapshot: &Snapshot) {
        if snapshot.arming != self.arming {
            self.arming = snapshot.arming;
            self.state = SchedulerState::Armed { attempt: 1 };
        }
    }

    /// Handles a reached deadline.
    ///
    /// Re-arms or clears the clock's deadline before returning, and returns
    /// the firing to render, if any.
    ///
    /// # Arguments
    ///
    /// * `snapshot` - Configuration taken once for this deadline
    /// * `clock` - Clock holding the single pending deadline
    pub fn on_deadline(&mut self, snapshot: Snapshot, clock: &mut impl RealTimeClock) -> Option<Firing> {
        self.observe(&snapshot);
        let config = snapshot.config;

        let attempt = match self.state {
            SchedulerState::Armed { attempt } if config.enabled => attempt,
            _ => {
                #[cfg(feature = "debug-mode")]
                defmt::info!("Alarm disabled or idle, clearing deadline");

                self.reset(clock);
                return None;
            }
        };

        let count = config.repeat.count();
        if attempt > count.saturating_add(1) {
            // count lowered below the current attempt
            self.reset(clock);
            return None;
        }

        let next = if attempt <= count {
            let offset = i64::from(attempt).saturating_mul(i64::from(config.repeat.interval_secs()));
            let next = Timestamp(config.deadline.as_secs().saturating_add(offset));
            clock.arm_deadline(next);
            self.state = SchedulerState::Armed {
                attempt: attempt + 1,
            };
            Some(next)
        } else {
            self.reset(clock);
            None
        };

        #[cfg(feature = "debug-mode")]
        defmt::info!("Alarm attempt {}, next {}", attempt, next);

        Some(Firing {
            attempt,
            next,
            melody: config.melody,
            light: config.light,
        })
    }

    /// Handles a reached deadline and queues the resulting firing.
    ///
    /// Waits while `queue` is full. Returns `true` if a firing was queued.
    pub async fn deliver<M: RawMutex, const N: usize>(
        &mut self,
        snapshot: Snapshot,
        clock: &mut impl RealTimeClock,
        queue: &FiringQueue<M, N>,
    ) -> bool {
        match self.on_deadline(snapshot, clock) {
            Some(firing) => {
                queue.post(firing).await;
                true
            }
            None => false,
        }
    }

    fn reset(&mut self, clock: &mut impl RealTimeClock) {
        clock.clear_deadline();
        self.state = SchedulerState::Idle;
    }
}

impl Default for RepeatScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Firings decided but not yet rendered, oldest first.
///
/// Posting waits while all `N` slots are taken, so a slow renderer delays
/// the following deadlines instead of losing firings.
pub struct FiringQueue<M: RawMutex, const N: usize> {
    channel: Channel<M, Firing, N>,
}

impl<M: RawMutex, const N: usize> FiringQueue<M, N> {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
        }
    }

    pub async fn post(&self, firing: Firing) {
        self.channel.send(firing).await;
    }

    /// Waits for the oldest queued firing.
    pub async fn next(&self) -> Firing {
        self.channel.receive().await
    }

    /// Firings waiting to be rendered.
    pub fn pending(&self) -> usize {
        self.channel.len()
    }
}

impl<M: RawMutex, const N: usize> Default for FiringQueue<M, N> {
    fn default() -> Self {
        Self::new()
    }
}
