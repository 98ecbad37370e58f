//! Light pattern sequencer.
//!
//! Each pattern is a pure function of the step index; the sequencer walks
//! `TOTAL_LIGHT_STATES` steps and hands out one [`LightFrame`] per step.

use crate::alarm::LightId;

/// Steps in one light sequence.
pub const TOTAL_LIGHT_STATES: u8 = 20;

/// How long each frame stays on the LEDs, in microseconds.
pub const FRAME_HOLD_US: u32 = 200_000;

const LED_COUNT: u8 = 4;

/// Set of lit LEDs, bit `n` for LED `n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LightMask(u8);

impl LightMask {
    pub const NONE: LightMask = LightMask(0);
    pub const ALL: LightMask = LightMask(0b1111);

    pub const fn from_bits(bits: u8) -> Self {
        LightMask(bits & Self::ALL.0)
    }

    pub const fn single(position: u8) -> Self {
        Self::from_bits(1 << (position % LED_COUNT))
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_lit(self, position: usize) -> bool {
        position < LED_COUNT as usize && self.0 & (1 << position) != 0
    }
}

/// One light pattern, indexed by step.
#[derive(Debug, Clone, Copy)]
pub struct LightPattern {
    frame: fn(u8) -> LightMask,
}

impl LightPattern {
    pub fn frame(&self, step: u8) -> LightMask {
        (self.frame)(step)
    }
}

fn blink_all(step: u8) -> LightMask {
    if step % 2 == 0 {
        LightMask::ALL
    } else {
        LightMask::NONE
    }
}

// one pass across the LEDs, dark afterwards
fn walk(step: u8) -> LightMask {
    if step < LED_COUNT {
        LightMask::single(step)
    } else {
        LightMask::NONE
    }
}

fn rotate(step: u8) -> LightMask {
    LightMask::single(step % LED_COUNT)
}

/// Patterns selectable by [`LightId`], in id order.
pub static PATTERNS: [LightPattern; 3] = [
    LightPattern { frame: blink_all },
    LightPattern { frame: walk },
    LightPattern { frame: rotate },
];

/// A frame to show and how long to hold it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LightFrame {
    pub step: u8,
    pub lit: LightMask,
    pub hold_us: u32,
}

/// Steps through one light pattern.
#[derive(Debug, Clone, Copy)]
pub struct LightSequencer {
    light: LightId,
    step: u8,
    showing: bool,
}

impl LightSequencer {
    /// Starts `light` from step 0.
    pub fn start(light: LightId) -> Self {
        Self {
            light,
            step: 0,
            showing: true,
        }
    }

    pub fn is_showing(&self) -> bool {
        self.showing
    }

    pub fn step(&self) -> u8 {
        self.step
    }

    pub fn light(&self) -> LightId {
        self.light
    }

    /// Returns the next frame, or `None` once all steps have been shown.
    ///
    /// Handing out the last frame clears the showing flag; later calls have
    /// no effect.
    pub fn advance(&mut self) -> Option<LightFrame> {
        if !self.showing {
            return None;
        }

        let frame = LightFrame {
            step: self.step,
            lit: PATTERNS[self.light.index()].frame(self.step),
            hold_us: FRAME_HOLD_US,
        };
        self.step += 1;
        self.showing = self.step < TOTAL_LIGHT_STATES;
        Some(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames(id: i32) -> Vec<u8> {
        let mut sequencer = LightSequencer::start(LightId::new(id).unwrap());
        core::iter::from_fn(|| sequencer.advance())
            .map(|frame| frame.lit.bits())
            .collect()
    }

    #[test]
    fn blink_alternates_all_and_none() {
        let bits = frames(1);
        assert_eq!(bits.len(), TOTAL_LIGHT_STATES as usize);
        assert_eq!(&bits[..4], &[0b1111, 0, 0b1111, 0]);
    }

    #[test]
    fn walk_lights_each_led_once() {
        let bits = frames(2);
        assert_eq!(&bits[..5], &[1, 2, 4, 8, 0]);
        assert!(bits[LED_COUNT as usize..].iter().all(|b| *b == 0));
    }

    #[test]
    fn rotate_cycles_four_positions() {
        let bits = frames(3);
        assert_eq!(&bits[..6], &[1, 2, 4, 8, 1, 2]);
    }

    #[test]
    fn stops_after_last_state_and_stays_stopped() {
        let mut sequencer = LightSequencer::start(LightId::FIRST);
        for _ in 0..TOTAL_LIGHT_STATES {
            assert!(sequencer.is_showing());
            assert!(sequencer.advance().is_some());
        }
        assert!(!sequencer.is_showing());
        assert_eq!(sequencer.advance(), None);
        assert!(!sequencer.is_showing());
        assert_eq!(sequencer.step(), TOTAL_LIGHT_STATES);
    }

    #[test]
    fn mask_ignores_missing_leds() {
        assert_eq!(LightMask::from_bits(0xff), LightMask::ALL);
        assert!(!LightMask::ALL.is_lit(4));
    }
}
