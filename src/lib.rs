//! Alarm scheduling and playback engine for the serial-console alarm clock.
//!
//! # Overview
//!
//! The engine is hardware independent and `no_std`. The firmware binary
//! (`src/main.rs`, built with the `firmware` feature) wires it to the
//! STM32L031 peripherals:
//!
//! - A single alarm deadline, repeated a bounded number of times at a fixed
//!   interval by the [`scheduler::RepeatScheduler`]
//! - A melody on the speaker gate and a pattern on four LEDs, rendered step by
//!   step by the [`melody`] and [`lights`] sequencers through [`playback`]
//! - A line-oriented operator console: the non-blocking [`console`] input
//!   state machine feeding the [`dispatcher`]
//!
//! # Concurrency
//!
//! Exactly two contexts touch shared state: the console loop (writer) and the
//! deadline handler (reader). They only share the [`alarm::ConfigStore`],
//! which publishes whole [`alarm::AlarmConfig`] values under a raw mutex, so
//! the deadline handler always sees one consistent snapshot per firing.
//!
//! # Module Organization
//!
//! - [`time`] - Timestamps and `YYYY-MM-DD HH:MM:SS` parsing/formatting
//! - [`error`] - Operator input errors
//! - [`alarm`] - Alarm configuration and the shared configuration store
//! - [`rtc`] - Real-time clock collaborator interface
//! - [`delay`] - Pause capability used by the sequencers
//! - [`annunciator`] - Speaker and LED output interface
//! - [`melody`], [`lights`] - Step sequencers and their timing tables
//! - [`playback`] - Renders one firing by draining both sequencers
//! - [`scheduler`] - Repeat scheduler driven by reached deadlines
//! - [`console`] - Console input state machine and output helpers
//! - [`dispatcher`] - Menu command handling

#![cfg_attr(not(test), no_std)]

pub mod alarm;
pub mod annunciator;
pub mod console;
pub mod delay;
pub mod dispatcher;
pub mod error;
pub mod lights;
pub mod melody;
pub mod playback;
pub mod rtc;
pub mod scheduler;
pub mod time;
