//! Speaker and LED outputs used to announce a firing.
//!
//! The board has a speaker gate and four LEDs (D9..D12). Tone generation is a
//! plain on/off gate; lights are addressed as a 4-bit [`LightMask`], bit 0
//! being the first LED.

use embedded_hal::digital::v2::OutputPin;

use crate::lights::LightMask;

/// Output side of a firing.
pub trait Annunciator {
    type Error;

    fn set_speaker(&mut self, on: bool) -> Result<(), Self::Error>;

    fn set_lights(&mut self, lit: LightMask) -> Result<(), Self::Error>;

    /// Forces every output to its off state.
    fn silence(&mut self) -> Result<(), Self::Error> {
        self.set_speaker(false)?;
        self.set_lights(LightMask::NONE)
    }
}

/// Electrical level that switches an output on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    ActiveHigh,
    ActiveLow,
}

fn drive<P: OutputPin>(pin: &mut P, polarity: Polarity, on: bool) -> Result<(), P::Error> {
    match (polarity, on) {
        (Polarity::ActiveHigh, true) | (Polarity::ActiveLow, false) => pin.set_high(),
        (Polarity::ActiveHigh, false) | (Polarity::ActiveLow, true) => pin.set_low(),
    }
}

/// Annunciator on plain GPIO pins.
pub struct PinAnnunciator<S, L> {
    speaker: S,
    speaker_polarity: Polarity,
    leds: [L; 4],
    led_polarity: Polarity,
}

impl<S, L, E> PinAnnunciator<S, L>
where
    S: OutputPin<Error = E>,
    L: OutputPin<Error = E>,
{
    /// # Arguments
    ///
    /// * `speaker` - Speaker gate pin
    /// * `speaker_polarity` - Level that sounds the speaker
    /// * `leds` - LED pins, bit 0 of a [`LightMask`] first
    /// * `led_polarity` - Level that lights an LED
    pub fn new(speaker: S, speaker_polarity: Polarity, leds: [L; 4], led_polarity: Polarity) -> Self {
        Self {
            speaker,
            speaker_polarity,
            leds,
            led_polarity,
        }
    }
}

impl<S, L, E> Annunciator for PinAnnunciator<S, L>
where
    S: OutputPin<Error = E>,
    L: OutputPin<Error = E>,
{
    type Error = E;

    fn set_speaker(&mut self, on: bool) -> Result<(), E> {
        drive(&mut self.speaker, self.speaker_polarity, on)
    }

    fn set_lights(&mut self, lit: LightMask) -> Result<(), E> {
        for (position, led) in self.leds.iter_mut().enumerate() {
            drive(led, self.led_polarity, lit.is_lit(position))?;
        }
        Ok(())
    }
}
