//! Alarm configuration and the store shared between the console and the
//! deadline handler.
//!
//! The console side never mutates fields in place. It builds a complete new
//! [`AlarmConfig`] and publishes it with one locked write; the deadline side
//! takes one [`Snapshot`] per firing. A firing that is already rendering keeps
//! the melody and light pattern it started with.

use core::cell::Cell;

use embassy_sync::blocking_mutex::{Mutex, raw::RawMutex};

use crate::error::InputError;
use crate::time::Timestamp;

/// Number of selectable melodies and light patterns.
pub const CHOICES: u8 = 3;

/// Melody selection, always within `1..=3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MelodyId(u8);

/// Light pattern selection, always within `1..=3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LightId(u8);

macro_rules! choice_id {
    ($name:ident) => {
        impl $name {
            pub const FIRST: $name = $name(1);

            /// Validates an operator choice.
            ///
            /// # Errors
            ///
            /// [`InputError::Range`] unless `value` is within `1..=3`.
            pub fn new(value: i32) -> Result<Self, InputError> {
                match u8::try_from(value) {
                    Ok(id) if (1..=CHOICES).contains(&id) => Ok($name(id)),
                    _ => Err(InputError::Range),
                }
            }

            pub const fn get(self) -> u8 {
                self.0
            }

            pub(crate) const fn index(self) -> usize {
                self.0 as usize - 1
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

choice_id!(MelodyId);
choice_id!(LightId);

/// Repeat count and interval, validated together.
///
/// `interval_secs` is never zero, so a non-zero count always has a usable
/// interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Repeat {
    count: u32,
    interval_secs: u32,
}

impl Repeat {
    /// # Errors
    ///
    /// [`InputError::Range`] if `count` is negative.
    pub fn validate_count(count: i32) -> Result<u32, InputError> {
        u32::try_from(count).map_err(|_| InputError::Range)
    }

    /// # Errors
    ///
    /// [`InputError::Range`] unless `interval_secs` is positive.
    pub fn new(count: u32, interval_secs: i32) -> Result<Self, InputError> {
        match u32::try_from(interval_secs) {
            Ok(interval_secs) if interval_secs > 0 => Ok(Repeat {
                count,
                interval_secs,
            }),
            _ => Err(InputError::Range),
        }
    }

    pub const fn count(self) -> u32 {
        self.count
    }

    pub const fn interval_secs(self) -> u32 {
        self.interval_secs
    }
}

/// Everything the operator configures about the alarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AlarmConfig {
    pub enabled: bool,
    pub deadline: Timestamp,
    pub melody: MelodyId,
    pub light: LightId,
    pub repeat: Repeat,
}

impl AlarmConfig {
    /// Power-on configuration: disabled, melody 1, lights 1, five repeats
    /// five seconds apart.
    pub const DEFAULT: AlarmConfig = AlarmConfig {
        enabled: false,
        deadline: Timestamp::EPOCH,
        melody: MelodyId::FIRST,
        light: LightId::FIRST,
        repeat: Repeat {
            count: 5,
            interval_secs: 5,
        },
    };
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// One consistent view of the store.
///
/// `arming` increases every time the operator sets a new alarm time, which
/// lets the scheduler restart its repeat cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Snapshot {
    pub config: AlarmConfig,
    pub arming: u32,
}

/// The single process-wide alarm configuration slot.
pub struct ConfigStore<M: RawMutex> {
    slot: Mutex<M, Cell<Snapshot>>,
}

impl<M: RawMutex> ConfigStore<M> {
    /// Creates a store holding [`AlarmConfig::DEFAULT`].
    pub const fn new(raw: M) -> Self {
        Self {
            slot: Mutex::const_new(
                raw,
                Cell::new(Snapshot {
                    config: AlarmConfig::DEFAULT,
                    arming: 0,
                }),
            ),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        self.slot.lock(|slot| slot.get())
    }

    pub fn config(&self) -> AlarmConfig {
        self.snapshot().config
    }

    /// Replaces the configuration with `config`, built by `change` from the
    /// current one. The read and the write happen under one lock.
    pub fn update(&self, change: impl FnOnce(AlarmConfig) -> AlarmConfig) -> AlarmConfig {
        self.slot.lock(|slot| {
            let mut snapshot = slot.get();
            snapshot.config = change(snapshot.config);
            slot.set(snapshot);
            snapshot.config
        })
    }

    /// Publishes a new alarm deadline and starts a new arming generation.
    pub fn arm(&self, deadline: Timestamp) -> Snapshot {
        self.slot.lock(|slot| {
            let mut snapshot = slot.get();
            snapshot.config.deadline = deadline;
            snapshot.arming = snapshot.arming.wrapping_add(1);
            slot.set(snapshot);
            snapshot
        })
    }
}
