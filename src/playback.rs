//! Renders one firing: the melody on the speaker and the pattern on the LEDs.
//!
//! Both sequencers advance in lock-step, one step each per pass, until both
//! are drained. A [`Playback`] is built fresh for every firing from the ids
//! captured when the firing was decided and is dropped when it finishes, so a
//! configuration change made meanwhile only affects the next firing.

use crate::alarm::{LightId, MelodyId};
use crate::annunciator::Annunciator;
use crate::delay::Pause;
use crate::lights::{LightFrame, LightSequencer};
use crate::melody::{MelodySequencer, Note};

/// Progress of a playback, as reported to callers and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PlaybackState {
    pub playing_melody: bool,
    pub melody_step: u8,
    pub showing_lights: bool,
    pub light_step: u8,
}

/// Notification sequence for one firing.
pub struct Playback {
    melody: MelodySequencer,
    lights: LightSequencer,
}

impl Playback {
    /// Starts both sequencers from step 0.
    pub fn start(melody: MelodyId, light: LightId) -> Self {
        Self {
            melody: MelodySequencer::start(melody),
            lights: LightSequencer::start(light),
        }
    }

    pub fn is_active(&self) -> bool {
        self.melody.is_playing() || self.lights.is_showing()
    }

    pub fn state(&self) -> PlaybackState {
        PlaybackState {
            playing_melody: self.melody.is_playing(),
            melody_step: self.melody.step(),
            showing_lights: self.lights.is_showing(),
            light_step: self.lights.step(),
        }
    }

    pub fn melody(&self) -> MelodyId {
        self.melody.melody()
    }

    pub fn light(&self) -> LightId {
        self.lights.light()
    }

    /// Renders one pass: the next note, then the next light frame. Either is
    /// skipped once its sequencer is drained.
    pub async fn step<A, P>(&mut self, out: &mut A, pause: &mut P) -> Result<(), A::Error>
    where
        A: Annunciator,
        P: Pause,
    {
        if let Some(note) = self.melody.advance() {
            play_note(note, out, pause).await?;
        }
        if let Some(frame) = self.lights.advance() {
            show_frame(frame, out, pause).await?;
        }
        Ok(())
    }

    /// Drains both sequencers, then switches every output off.
    pub async fn run<A, P>(mut self, out: &mut A, pause: &mut P) -> Result<PlaybackState, A::Error>
    where
        A: Annunciator,
        P: Pause,
    {
        while self.is_active() {
            self.step(out, pause).await?;
        }
        out.silence()?;

        Ok(self.state())
    }
}

async fn play_note<A: Annunciator, P: Pause>(
    note: Note,
    out: &mut A,
    pause: &mut P,
) -> Result<(), A::Error> {
    for (tone_us, rest_us) in note.timings() {
        out.set_speaker(true)?;
        pause.pause_us(tone_us).await;
        out.set_speaker(false)?;
        pause.pause_us(rest_us).await;
    }
    Ok(())
}

async fn show_frame<A: Annunciator, P: Pause>(
    frame: LightFrame,
    out: &mut A,
    pause: &mut P,
) -> Result<(), A::Error> {
    out.set_lights(frame.lit)?;
    pause.pause_us(frame.hold_us).await;
    Ok(())
}
