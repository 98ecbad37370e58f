//! Menu command handling.
//!
//! Commands are single digits. A command that needs a value prints its
//! prompt and waits for the next line instead of blocking on the serial port;
//! the answer is validated, committed in one store update and followed by the
//! menu again. Anything unrecognized just redisplays the menu.

use core::fmt::{self, Write};

use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::alarm::{AlarmConfig, ConfigStore, LightId, MelodyId, Repeat};
use crate::console::{BANNER, Line, parse_number, write_menu};
use crate::error::InputError;
use crate::rtc::RealTimeClock;
use crate::time::DateTime;

/// What the next completed line answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Prompt {
    Menu,
    ClockTime,
    AlarmTime,
    Enable,
    Melody,
    Light,
    RepeatCount,
    RepeatInterval { count: u32 },
}

const DATE_PROMPT: &str = "\nEnter date and time (YYYY-MM-DD HH:MM:SS): ";

pub struct Dispatcher<'a, M: RawMutex, C> {
    store: &'a ConfigStore<M>,
    clock: C,
    prompt: Prompt,
}

impl<'a, M: RawMutex, C: RealTimeClock> Dispatcher<'a, M, C> {
    /// # Arguments
    ///
    /// * `store` - Alarm configuration shared with the scheduler
    /// * `clock` - Clock to set and to program the alarm deadline into
    pub fn new(store: &'a ConfigStore<M>, clock: C) -> Self {
        Self {
            store,
            clock,
            prompt: Prompt::Menu,
        }
    }

    pub fn prompt(&self) -> Prompt {
        self.prompt
    }

    /// Writes the boot banner and the menu.
    pub fn greet(&self, out: &mut impl Write) -> fmt::Result {
        out.write_str(BANNER)?;
        write_menu(out)
    }

    pub fn handle_line(&mut self, line: &Line, out: &mut impl Write) -> fmt::Result {
        self.handle(line.as_str(), out)
    }

    /// Handles one completed line. `None` stands for a line that is not
    /// valid text.
    pub fn handle(&mut self, text: Option<&str>, out: &mut impl Write) -> fmt::Result {
        let text = text.unwrap_or("");
        match core::mem::replace(&mut self.prompt, Prompt::Menu) {
            Prompt::Menu => return self.command(text, out),
            Prompt::ClockTime => self.set_clock(text, out)?,
            Prompt::AlarmTime => self.set_alarm(text, out)?,
            Prompt::Enable => self.set_enabled(text, out)?,
            Prompt::Melody => self.choose_melody(text, out)?,
            Prompt::Light => self.choose_light(text, out)?,
            Prompt::RepeatCount => {
                if self.set_repeat_count(text, out)? {
                    return Ok(());
                }
            }
            Prompt::RepeatInterval { count } => self.set_repeat_interval(count, text, out)?,
        }
        write_menu(out)
    }

    fn command(&mut self, text: &str, out: &mut impl Write) -> fmt::Result {
        #[cfg(feature = "debug-mode")]
        defmt::debug!("Console command {=str}", text);

        let (prompt, message) = match parse_number(text) {
            Some(1) => (Prompt::ClockTime, DATE_PROMPT),
            Some(2) => (Prompt::AlarmTime, DATE_PROMPT),
            Some(3) => (Prompt::Enable, "\n1 - enable\n0 - disable\n"),
            Some(4) => (Prompt::Melody, "\nChoose melody (1-3): "),
            Some(5) => (Prompt::Light, "\nChoose light pattern (1-3): "),
            Some(6) => (
                Prompt::RepeatCount,
                "\nEnter alarm repeat count (0 for no repeats): ",
            ),
            Some(7) => {
                self.write_status(out)?;
                return write_menu(out);
            }
            _ => {
                #[cfg(feature = "debug-mode")]
                defmt::debug!("{}", InputError::InvalidCommand);

                return write_menu(out);
            }
        };

        self.prompt = prompt;
        out.write_str(message)
    }

    fn set_clock(&mut self, text: &str, out: &mut impl Write) -> fmt::Result {
        match DateTime::parse(text) {
            Ok(datetime) => {
                self.clock.set_now(datetime.to_timestamp());
                out.write_str("\nClock set.\n")
            }
            Err(error) => {
                report_date_error(error, out)?;
                out.write_str("Clock not set.\n")
            }
        }
    }

    fn set_alarm(&mut self, text: &str, out: &mut impl Write) -> fmt::Result {
        match DateTime::parse(text) {
            Ok(datetime) => {
                let deadline = datetime.to_timestamp();
                // publish before arming so the deadline never sees the old generation
                self.store.arm(deadline);
                self.clock.arm_deadline(deadline);

                #[cfg(feature = "debug-mode")]
                defmt::info!("Alarm deadline set to {}", deadline);

                out.write_str("\nAlarm set.\n")
            }
            Err(error) => {
                report_date_error(error, out)?;
                out.write_str("Alarm not set.\n")
            }
        }
    }

    fn set_enabled(&mut self, text: &str, out: &mut impl Write) -> fmt::Result {
        let enabled = match parse_number(text) {
            Some(1) => true,
            Some(0) => false,
            Some(_) => {
                return write!(
                    out,
                    "\nInvalid choice ({}), enter 1 to enable or 0 to disable the alarm.\n",
                    InputError::Range
                );
            }
            None => {
                return write!(
                    out,
                    "\nInvalid input for enabling/disabling the alarm ({}).\n",
                    InputError::Parse
                );
            }
        };

        self.store.update(|config| AlarmConfig { enabled, ..config });
        if enabled {
            out.write_str("\nAlarm enabled.\n")
        } else {
            out.write_str("\nAlarm disabled.\n")
        }
    }

    fn choose_melody(&mut self, text: &str, out: &mut impl Write) -> fmt::Result {
        match parse_choice(text, MelodyId::new) {
            Ok(melody) => {
                self.store.update(|config| AlarmConfig { melody, ..config });
                out.write_str("\nMelody selected.\n")
            }
            Err(error) => report_choice_error(error, out),
        }
    }

    fn choose_light(&mut self, text: &str, out: &mut impl Write) -> fmt::Result {
        match parse_choice(text, LightId::new) {
            Ok(light) => {
                self.store.update(|config| AlarmConfig { light, ..config });
                out.write_str("\nLight pattern selected.\n")
            }
            Err(error) => report_choice_error(error, out),
        }
    }

    /// Returns `true` when the count was accepted and the interval prompt is
    /// now pending.
    fn set_repeat_count(&mut self, text: &str, out: &mut impl Write) -> Result<bool, fmt::Error> {
        let count = parse_number(text)
            .ok_or(InputError::Parse)
            .and_then(Repeat::validate_count);

        match count {
            Ok(count) => {
                self.prompt = Prompt::RepeatInterval { count };
                out.write_str("\nEnter interval between repeats in seconds: ")?;
                Ok(true)
            }
            Err(error) => {
                write!(
                    out,
                    "\nInvalid repeat count ({error}), must be a non-negative number.\n"
                )?;
                Ok(false)
            }
        }
    }

    fn set_repeat_interval(&mut self, count: u32, text: &str, out: &mut impl Write) -> fmt::Result {
        let repeat = parse_number(text)
            .ok_or(InputError::Parse)
            .and_then(|interval| Repeat::new(count, interval));

        match repeat {
            Ok(repeat) => {
                self.store.update(|config| AlarmConfig { repeat, ..config });
                out.write_str("\nAlarm repeat settings updated.\n")
            }
            Err(error) => write!(
                out,
                "\nInvalid interval ({error}), must be greater than 0.\n"
            ),
        }
    }

    fn write_status(&mut self, out: &mut impl Write) -> fmt::Result {
        let config = self.store.config();
        let now = self.clock.now();

        out.write_str("\nAlarm status\n")?;
        writeln!(
            out,
            " Alarm is {}",
            if config.enabled { "enabled" } else { "disabled" }
        )?;
        writeln!(out, " Alarm time: {}", config.deadline)?;
        writeln!(out, " Current time: {now}")?;
        writeln!(out, " Selected melody: {}", config.melody)?;
        writeln!(out, " Selected light pattern: {}", config.light)?;
        writeln!(out, " Repeat count: {}", config.repeat.count())?;
        writeln!(
            out,
            " Repeat interval (seconds): {}",
            config.repeat.interval_secs()
        )
    }
}

fn parse_choice<T>(text: &str, choose: fn(i32) -> Result<T, InputError>) -> Result<T, InputError> {
    parse_number(text).ok_or(InputError::Parse).and_then(choose)
}

fn report_choice_error(error: InputError, out: &mut impl Write) -> fmt::Result {
    write!(out, "\nInvalid choice ({error}), enter a number between 1 and 3.\n")
}

fn report_date_error(error: InputError, out: &mut impl Write) -> fmt::Result {
    match error {
        InputError::Range => out.write_str(
            "\nInvalid date or time (value out of range), enter it in the correct format.\n",
        ),
        _ => out.write_str("\nMalformed date and time, try again.\n"),
    }
}

#[cfg(test)]
mod tests {
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    use super::*;
    use crate::time::Timestamp;

    #[derive(Default)]
    struct FakeClock {
        now: Timestamp,
        deadline: Option<Timestamp>,
    }

    impl RealTimeClock for FakeClock {
        fn now(&mut self) -> Timestamp {
            self.now
        }

        fn set_now(&mut self, now: Timestamp) {
            self.now = now;
        }

        fn arm_deadline(&mut self, at: Timestamp) {
            self.deadline = Some(at);
        }

        fn clear_deadline(&mut self) {
            self.deadline = None;
        }
    }

    fn run(dispatcher: &mut Dispatcher<'_, NoopRawMutex, &mut FakeClock>, lines: &[&str]) -> String {
        let mut out = String::new();
        for line in lines {
            dispatcher.handle(Some(*line), &mut out).unwrap();
        }
        out
    }

    #[test]
    fn set_clock_commits_valid_time() {
        let store = ConfigStore::new(NoopRawMutex::new());
        let mut clock = FakeClock::default();
        let mut dispatcher = Dispatcher::new(&store, &mut clock);

        let out = run(&mut dispatcher, &["1", "2025-01-01 12:00:00"]);

        assert!(out.contains("YYYY-MM-DD HH:MM:SS"));
        assert!(out.contains("Clock set."));
        assert!(out.ends_with("Enter choice: "));
        assert_eq!(dispatcher.prompt(), Prompt::Menu);
        drop(dispatcher);
        assert_eq!(clock.now.to_string(), "2025-01-01 12:00:00");
    }

    #[test]
    fn month_thirteen_leaves_clock_untouched() {
        let store = ConfigStore::new(NoopRawMutex::new());
        let mut clock = FakeClock {
            now: Timestamp(42),
            ..FakeClock::default()
        };
        let mut dispatcher = Dispatcher::new(&store, &mut clock);

        let out = run(&mut dispatcher, &["1", "2025-13-01 12:00:00"]);

        assert!(out.contains("out of range"));
        assert!(out.contains("Clock not set."));
        drop(dispatcher);
        assert_eq!(clock.now, Timestamp(42));
    }

    #[test]
    fn set_alarm_arms_store_and_clock() {
        let store = ConfigStore::new(NoopRawMutex::new());
        let mut clock = FakeClock::default();
        let mut dispatcher = Dispatcher::new(&store, &mut clock);

        let out = run(&mut dispatcher, &["2", "2025-01-01 12:00:00"]);

        assert!(out.contains("Alarm set."));
        let snapshot = store.snapshot();
        assert_eq!(snapshot.arming, 1);
        drop(dispatcher);
        assert_eq!(clock.deadline, Some(snapshot.config.deadline));
    }

    #[test]
    fn malformed_alarm_changes_nothing() {
        let store = ConfigStore::new(NoopRawMutex::new());
        let mut clock = FakeClock::default();
        let mut dispatcher = Dispatcher::new(&store, &mut clock);

        let out = run(&mut dispatcher, &["2", "tomorrow"]);

        assert!(out.contains("Malformed"));
        assert!(out.contains("Alarm not set."));
        assert_eq!(store.snapshot().arming, 0);
        drop(dispatcher);
        assert_eq!(clock.deadline, None);
    }

    #[test]
    fn enable_accepts_only_one_or_zero() {
        let store = ConfigStore::new(NoopRawMutex::new());
        let mut clock = FakeClock::default();
        let mut dispatcher = Dispatcher::new(&store, &mut clock);

        let out = run(&mut dispatcher, &["3", "1"]);
        assert!(out.contains("Alarm enabled."));
        assert!(store.config().enabled);

        let out = run(&mut dispatcher, &["3", "2"]);
        assert!(out.contains("enter 1 to enable or 0 to disable"));
        assert!(store.config().enabled);

        let out = run(&mut dispatcher, &["3", "yes"]);
        assert!(out.contains("malformed input"));
        assert!(store.config().enabled);

        run(&mut dispatcher, &["3", "0"]);
        assert!(!store.config().enabled);
    }

    #[test]
    fn melody_and_light_choices() {
        let store = ConfigStore::new(NoopRawMutex::new());
        let mut clock = FakeClock::default();
        let mut dispatcher = Dispatcher::new(&store, &mut clock);

        let out = run(&mut dispatcher, &["4", "3", "5", "2"]);
        assert!(out.contains("Melody selected."));
        assert!(out.contains("Light pattern selected."));
        assert_eq!(store.config().melody.get(), 3);
        assert_eq!(store.config().light.get(), 2);

        let out = run(&mut dispatcher, &["4", "4", "5", "0"]);
        assert_eq!(out.matches("enter a number between 1 and 3").count(), 2);
        assert_eq!(store.config().melody.get(), 3);
        assert_eq!(store.config().light.get(), 2);
    }

    #[test]
    fn repeat_count_and_interval_commit_together() {
        let store = ConfigStore::new(NoopRawMutex::new());
        let mut clock = FakeClock::default();
        let mut dispatcher = Dispatcher::new(&store, &mut clock);

        let out = run(&mut dispatcher, &["6", "2"]);
        assert!(out.contains("interval between repeats"));
        assert_eq!(dispatcher.prompt(), Prompt::RepeatInterval { count: 2 });

        let out = run(&mut dispatcher, &["0"]);
        assert!(out.contains("must be greater than 0"));
        assert_eq!(store.config().repeat, AlarmConfig::DEFAULT.repeat);

        let out = run(&mut dispatcher, &["6", "-1"]);
        assert!(out.contains("must be a non-negative number"));
        assert!(!out.contains("interval between repeats"));
        assert_eq!(dispatcher.prompt(), Prompt::Menu);

        let out = run(&mut dispatcher, &["6", "0", "30"]);
        assert!(out.contains("Alarm repeat settings updated."));
        assert_eq!(store.config().repeat.count(), 0);
        assert_eq!(store.config().repeat.interval_secs(), 30);
    }

    #[test]
    fn status_reports_configuration() {
        let store = ConfigStore::new(NoopRawMutex::new());
        let mut clock = FakeClock::default();
        let mut dispatcher = Dispatcher::new(&store, &mut clock);

        let out = run(
            &mut dispatcher,
            &["1", "2024-12-31 23:59:00", "2", "2025-01-01 12:00:00", "7"],
        );

        assert!(out.contains(" Alarm is disabled\n"));
        assert!(out.contains(" Alarm time: 2025-01-01 12:00:00\n"));
        assert!(out.contains(" Current time: 2024-12-31 23:59:00\n"));
        assert!(out.contains(" Selected melody: 1\n"));
        assert!(out.contains(" Selected light pattern: 1\n"));
        assert!(out.contains(" Repeat count: 5\n"));
        assert!(out.contains(" Repeat interval (seconds): 5\n"));
    }

    #[test]
    fn unknown_input_redisplays_menu() {
        let store = ConfigStore::new(NoopRawMutex::new());
        let mut clock = FakeClock::default();
        let mut dispatcher = Dispatcher::new(&store, &mut clock);

        for input in [Some("9"), Some("hello"), Some(""), None] {
            let mut out = String::new();
            dispatcher.handle(input, &mut out).unwrap();
            assert!(out.starts_with("\nDigital Alarm Clock"));
            assert_eq!(dispatcher.prompt(), Prompt::Menu);
        }
        assert_eq!(store.config(), AlarmConfig::DEFAULT);
    }
}
