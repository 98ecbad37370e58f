use core::convert::Infallible;

use alarm_clock::alarm::{AlarmConfig, ConfigStore, LightId, MelodyId, Repeat};
use alarm_clock::annunciator::Annunciator;
use alarm_clock::delay::Pause;
use alarm_clock::dispatcher::Dispatcher;
use alarm_clock::lights::LightMask;
use alarm_clock::melody::TOTAL_NOTES;
use alarm_clock::rtc::RealTimeClock;
use alarm_clock::scheduler::{Firing, FiringQueue, RepeatScheduler, SchedulerState};
use alarm_clock::time::{DateTime, Timestamp};
use embassy_futures::join::join;
use embassy_futures::{block_on, yield_now};
use embassy_sync::blocking_mutex::raw::{CriticalSectionRawMutex, NoopRawMutex};

/// Clock with a one-shot deadline that tests fire by hand.
#[derive(Default)]
struct SimulatedRtc {
    now: Timestamp,
    deadline: Option<Timestamp>,
}

impl SimulatedRtc {
    /// Jumps to the pending deadline and consumes it.
    fn reach_deadline(&mut self) -> Option<Timestamp> {
        let at = self.deadline.take()?;
        self.now = at;
        Some(at)
    }
}

impl RealTimeClock for SimulatedRtc {
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

#[derive(Default)]
struct Outputs {
    tones: usize,
    speaker_on: bool,
    lit: LightMask,
}

impl Annunciator for Outputs {
    type Error = Infallible;

    fn set_speaker(&mut self, on: bool) -> Result<(), Infallible> {
        if on {
            self.tones += 1;
        }
        self.speaker_on = on;
        Ok(())
    }

    fn set_lights(&mut self, lit: LightMask) -> Result<(), Infallible> {
        self.lit = lit;
        Ok(())
    }
}

struct NoWait;

impl Pause for NoWait {
    async fn pause_us(&mut self, _micros: u32) {}
}

/// Hands control back to the other side on every wait, like a timer would.
struct Yielding;

impl Pause for Yielding {
    async fn pause_us(&mut self, _micros: u32) {
        yield_now().await;
    }
}

fn at(text: &str) -> Timestamp {
    DateTime::parse(text).unwrap().to_timestamp()
}

/// Fires deadlines until the scheduler stops re-arming, returning when each
/// firing happened.
fn fire_all(
    store: &ConfigStore<impl embassy_sync::blocking_mutex::raw::RawMutex>,
    scheduler: &mut RepeatScheduler,
    rtc: &mut SimulatedRtc,
) -> Vec<(Timestamp, Firing)> {
    let mut fired = Vec::new();
    while let Some(reached) = rtc.reach_deadline() {
        if let Some(firing) = scheduler.on_deadline(store.snapshot(), rtc) {
            fired.push((reached, firing));
        }
        assert!(fired.len() < 1_000, "scheduler never went idle");
    }
    fired
}

#[test]
fn configured_alarm_repeats_then_goes_idle() {
    let store = ConfigStore::new(NoopRawMutex::new());
    let mut rtc = SimulatedRtc::default();
    let mut scheduler = RepeatScheduler::new();

    let mut console = String::new();
    let mut dispatcher = Dispatcher::new(&store, &mut rtc);
    for line in ["3", "1", "6", "2", "5", "2", "2025-01-01 12:00:00"] {
        dispatcher.handle(Some(line), &mut console).unwrap();
    }
    drop(dispatcher);

    let t = at("2025-01-01 12:00:00");
    assert_eq!(rtc.deadline, Some(t));

    let fired = fire_all(&store, &mut scheduler, &mut rtc);

    let times: Vec<Timestamp> = fired.iter().map(|(when, _)| *when).collect();
    assert_eq!(times, vec![t, t + 5, t + 10]);
    let attempts: Vec<u32> = fired.iter().map(|(_, firing)| firing.attempt).collect();
    assert_eq!(attempts, vec![1, 2, 3]);
    assert_eq!(fired[0].1.next, Some(t + 5));
    assert_eq!(fired[2].1.next, None);

    assert_eq!(scheduler.state(), SchedulerState::Idle);
    assert_eq!(rtc.deadline, None);
}

#[test]
fn enabled_alarm_fires_count_plus_one_times() {
    for count in 0..6 {
        for interval in [1, 7, 3600] {
            let store = ConfigStore::new(NoopRawMutex::new());
            store.update(|config| AlarmConfig {
                enabled: true,
                repeat: Repeat::new(count, interval).unwrap(),
                ..config
            });
            let deadline = at("2030-06-01 06:30:00");
            store.arm(deadline);

            let mut rtc = SimulatedRtc::default();
            rtc.arm_deadline(deadline);
            let mut scheduler = RepeatScheduler::new();

            let fired = fire_all(&store, &mut scheduler, &mut rtc);

            assert_eq!(fired.len() as u32, count + 1, "count {count} interval {interval}");
            assert_eq!(rtc.deadline, None);
        }
    }
}

#[test]
fn disabling_mid_sequence_stops_at_next_deadline() {
    let store = ConfigStore::new(NoopRawMutex::new());
    store.update(|config| AlarmConfig {
        enabled: true,
        ..config
    });
    let deadline = at("2025-03-01 07:00:00");
    store.arm(deadline);
    let mut rtc = SimulatedRtc::default();
    rtc.arm_deadline(deadline);
    let mut scheduler = RepeatScheduler::new();

    rtc.reach_deadline();
    assert!(scheduler.on_deadline(store.snapshot(), &mut rtc).is_some());
    rtc.reach_deadline();
    assert!(scheduler.on_deadline(store.snapshot(), &mut rtc).is_some());
    assert_eq!(scheduler.state(), SchedulerState::Armed { attempt: 3 });

    store.update(|config| AlarmConfig {
        enabled: false,
        ..config
    });
    rtc.reach_deadline();
    assert_eq!(scheduler.on_deadline(store.snapshot(), &mut rtc), None);
    assert_eq!(scheduler.state(), SchedulerState::Idle);
    assert_eq!(rtc.deadline, None);
}

#[test]
fn melody_change_during_firing_applies_next_time() {
    static STORE: ConfigStore<CriticalSectionRawMutex> =
        ConfigStore::new(CriticalSectionRawMutex::new());
    STORE.update(|config| AlarmConfig {
        enabled: true,
        ..config
    });
    let deadline = at("2025-01-01 12:00:00");
    STORE.arm(deadline);
    let mut rtc = SimulatedRtc::default();
    rtc.arm_deadline(deadline);
    let mut scheduler = RepeatScheduler::new();
    let mut outputs = Outputs::default();

    rtc.reach_deadline();
    let firing = scheduler.on_deadline(STORE.snapshot(), &mut rtc).unwrap();
    let mut playback = firing.playback();
    block_on(playback.step(&mut outputs, &mut NoWait)).unwrap();

    STORE.update(|config| AlarmConfig {
        melody: MelodyId::new(3).unwrap(),
        ..config
    });

    assert_eq!(playback.melody(), MelodyId::FIRST);
    assert_eq!(playback.state().melody_step, 1);
    let end = block_on(playback.run(&mut outputs, &mut NoWait)).unwrap();
    assert_eq!(end.melody_step, TOTAL_NOTES);
    // melody 1 plays one tone per note
    assert_eq!(outputs.tones, TOTAL_NOTES as usize);
    assert!(!outputs.speaker_on);
    assert_eq!(outputs.lit, LightMask::NONE);

    rtc.reach_deadline();
    let next = scheduler.on_deadline(STORE.snapshot(), &mut rtc).unwrap();
    assert_eq!(next.melody.get(), 3);
    assert_eq!(next.playback().melody().get(), 3);
}

#[test]
fn slow_playback_still_renders_every_firing() {
    let store = ConfigStore::new(NoopRawMutex::new());
    store.update(|config| AlarmConfig {
        enabled: true,
        melody: MelodyId::new(2).unwrap(),
        repeat: Repeat::new(5, 5).unwrap(),
        ..config
    });
    let deadline = at("2025-01-01 12:00:00");
    store.arm(deadline);
    let mut rtc = SimulatedRtc::default();
    rtc.arm_deadline(deadline);
    let queue: FiringQueue<NoopRawMutex, 2> = FiringQueue::new();

    // deadlines come round much faster than a melody plays
    let deadlines = async {
        let mut scheduler = RepeatScheduler::new();
        let mut decided = 0;
        while rtc.reach_deadline().is_some() {
            if scheduler.deliver(store.snapshot(), &mut rtc, &queue).await {
                decided += 1;
            }
            yield_now().await;
        }
        decided
    };
    let renderer = async {
        let mut outputs = Outputs::default();
        let mut rendered = Vec::new();
        loop {
            let firing = queue.next().await;
            let playback = firing.playback();
            assert_eq!(playback.light(), LightId::FIRST);
            play_to_end(playback, &mut outputs).await;
            rendered.push(firing.attempt);
            if firing.next.is_none() {
                break rendered;
            }
        }
    };

    let (decided, rendered) = block_on(join(deadlines, renderer));

    assert_eq!(decided, 6);
    assert_eq!(rendered, vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(queue.pending(), 0);
    assert_eq!(rtc.deadline, None);
}

async fn play_to_end(playback: alarm_clock::playback::Playback, outputs: &mut Outputs) {
    let Ok(end) = playback.run(outputs, &mut Yielding).await;
    assert!(!end.playing_melody && !end.showing_lights);
}
