//! Melody sequencer.
//!
//! A melody is a short table of [`ToneGate`]s. Every step of the melody plays
//! the whole table once, with tone lengths growing linearly with the step
//! index, so each melody rises over its `TOTAL_NOTES` steps.

use crate::alarm::MelodyId;

/// Steps in one melody.
pub const TOTAL_NOTES: u8 = 10;

/// One speaker pulse followed by silence, in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ToneGate {
    pub tone_us: u32,
    pub tone_step_us: u32,
    pub rest_us: u32,
}

impl ToneGate {
    const fn new(tone_us: u32, tone_step_us: u32, rest_us: u32) -> Self {
        Self {
            tone_us,
            tone_step_us,
            rest_us,
        }
    }

    /// Tone length at `step`.
    pub const fn tone_at(&self, step: u8) -> u32 {
        self.tone_us + self.tone_step_us * step as u32
    }
}

const RISING: [ToneGate; 1] = [ToneGate::new(50_000, 5_000, 50_000)];

const TRIPLE: [ToneGate; 3] = [
    ToneGate::new(100_000, 10_000, 10_000),
    ToneGate::new(100_000, 10_000, 10_000),
    ToneGate::new(100_000, 10_000, 0),
];

const CHIRP: [ToneGate; 4] = [
    ToneGate::new(10_000, 5_000, 2_000),
    ToneGate::new(100_000, 5_000, 10_000),
    ToneGate::new(10_000, 5_000, 5_000),
    ToneGate::new(100_000, 5_000, 1_000),
];

/// Melodies selectable by [`MelodyId`], in id order.
pub static MELODIES: [&[ToneGate]; 3] = [&RISING, &TRIPLE, &CHIRP];

/// One melody step: the gates to play and the step they are scaled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Note {
    pub step: u8,
    pub gates: &'static [ToneGate],
}

impl Note {
    /// `(tone, rest)` pairs for this step.
    pub fn timings(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.gates
            .iter()
            .map(move |gate| (gate.tone_at(self.step), gate.rest_us))
    }
}

/// Steps through one melody.
#[derive(Debug, Clone, Copy)]
pub struct MelodySequencer {
    melody: MelodyId,
    step: u8,
    playing: bool,
}

impl MelodySequencer {
    /// Starts `melody` from step 0.
    pub fn start(melody: MelodyId) -> Self {
        Self {
            melody,
            step: 0,
            playing: true,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn step(&self) -> u8 {
        self.step
    }

    pub fn melody(&self) -> MelodyId {
        self.melody
    }

    /// Returns the next note, or `None` once the melody is over.
    pub fn advance(&mut self) -> Option<Note> {
        if !self.playing {
            return None;
        }

        let note = Note {
            step: self.step,
            gates: MELODIES[self.melody.index()],
        };
        self.step += 1;
        self.playing = self.step < TOTAL_NOTES;
        Some(note)
    }
}
