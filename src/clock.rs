//! # Game Clock
//!
//! Time of day for the day/night cycle. The clock reads seconds from a
//! [`TimeSource`] and maps them onto a repeating day of `day_length` seconds;
//! jumping to a preset time only moves an offset, never the source.

use std::sync::Arc;

use parking_lot::Mutex;
use web_time::Instant;

/// Monotonic seconds.
pub trait TimeSource {
    /// Seconds since an arbitrary fixed point.
    fn seconds(&self) -> f64;
}

/// Wall-clock seconds since the source was created.
#[derive(Clone, Copy, Debug)]
pub struct SystemTime {
    start: Instant,
}

impl SystemTime {
    /// Starts counting from now.
    pub fn new() -> Self {
        SystemTime {
            start: Instant::now(),
        }
    }
}

impl Default for SystemTime {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemTime {
    fn seconds(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

/// Time that only moves when told to. Clones share the same time.
#[derive(Clone, Debug, Default)]
pub struct ManualTime {
    now: Arc<Mutex<f64>>,
}

impl ManualTime {
    /// Starts at `seconds`.
    pub fn new(seconds: f64) -> Self {
        ManualTime {
            now: Arc::new(Mutex::new(seconds)),
        }
    }

    /// Moves time forward by `seconds`.
    pub fn advance(&self, seconds: f64) {
        *self.now.lock() += seconds;
    }
}

impl TimeSource for ManualTime {
    fn seconds(&self) -> f64 {
        *self.now.lock()
    }
}

/// Named points of the day, as fractions of a full day.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TimeOfDay {
    /// Start of the day.
    Midnight,
    /// Sunrise.
    Dawn,
    /// Where a fresh clock starts.
    Morning,
    /// Brightest point of the day.
    Noon,
    /// Sunset.
    Dusk,
    /// Fully dark.
    Night,
}

impl TimeOfDay {
    /// Fraction of the day this preset stands for.
    pub fn fraction(self) -> f64 {
        match self {
            TimeOfDay::Midnight => 0.0,
            TimeOfDay::Dawn => 0.25,
            TimeOfDay::Morning => 1.0 / 3.0,
            TimeOfDay::Noon => 0.5,
            TimeOfDay::Dusk => 0.75,
            TimeOfDay::Night => 0.85,
        }
    }
}

/// Day/night cycle over a [`TimeSource`].
#[derive(Clone, Debug)]
pub struct GameClock<C: TimeSource> {
    source: C,
    day_length: i32,
    offset: f64,
}

impl<C: TimeSource> GameClock<C> {
    /// Creates a clock that starts in the [`TimeOfDay::Morning`].
    ///
    /// # Arguments
    /// * `day_length` - Seconds per day; zero or less freezes the clock at noon
    /// * `source` - Where seconds come from
    pub fn new(day_length: i32, source: C) -> Self {
        let mut clock = GameClock {
            source,
            day_length,
            offset: 0.0,
        };
        clock.reset();
        clock
    }

    /// Seconds reported by the underlying source.
    pub fn now(&self) -> f64 {
        self.source.seconds()
    }

    /// Seconds per day.
    pub fn day_length(&self) -> i32 {
        self.day_length
    }

    /// Fraction of the current day in `0..1`.
    pub fn time_of_day(&self) -> f64 {
        if self.day_length <= 0 {
            return 0.5;
        }
        ((self.now() + self.offset) / f64::from(self.day_length)).rem_euclid(1.0)
    }

    /// Sky brightness in `0..=1`: a steep ramp up around dawn and down around
    /// nightfall.
    pub fn daylight(&self) -> f64 {
        let t = self.time_of_day();
        if t < 0.5 {
            let t = (t - 0.25) * 100.0;
            1.0 / (1.0 + 2f64.powf(-t))
        } else {
            let t = (t - 0.85) * 100.0;
            1.0 - 1.0 / (1.0 + 2f64.powf(-t))
        }
    }

    /// Jumps to a preset time of day.
    pub fn set_to(&mut self, time: TimeOfDay) {
        self.offset = time.fraction() * f64::from(self.day_length) - self.now();
    }

    /// Jumps back to the time a fresh clock starts at.
    pub fn reset(&mut self) {
        self.set_to(TimeOfDay::Morning);
    }

    /// Changes the length of a day without changing the current time of day.
    pub fn set_day_length(&mut self, day_length: i32) {
        let t = self.time_of_day();
        self.day_length = day_length;
        self.offset = t * f64::from(day_length) - self.now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn fresh_clock_starts_in_the_morning_and_wraps() {
        let time = ManualTime::new(1000.0);
        let clock = GameClock::new(30, time.clone());
        assert!(close(clock.time_of_day(), 1.0 / 3.0));
        time.advance(10.0);
        assert!(close(clock.time_of_day(), 2.0 / 3.0));
        time.advance(20.0);
        assert!(close(clock.time_of_day(), 1.0 / 3.0));
    }

    #[test]
    fn presets_move_only_the_offset() {
        let time = ManualTime::new(12.5);
        let mut clock = GameClock::new(100, time.clone());
        clock.set_to(TimeOfDay::Dusk);
        assert!(close(clock.time_of_day(), 0.75));
        assert!(close(time.seconds(), 12.5));
        clock.set_to(TimeOfDay::Midnight);
        assert!(close(clock.time_of_day(), 0.0));
    }

    #[test]
    fn frozen_clock_sits_at_noon() {
        let clock = GameClock::new(0, ManualTime::new(5.0));
        assert!(close(clock.time_of_day(), 0.5));
    }

    #[test]
    fn daylight_is_bright_at_noon_and_dark_at_midnight() {
        let mut clock = GameClock::new(60, ManualTime::new(0.0));
        clock.set_to(TimeOfDay::Noon);
        assert!(clock.daylight() > 0.99);
        clock.set_to(TimeOfDay::Midnight);
        assert!(clock.daylight() < 0.01);
        clock.set_to(TimeOfDay::Dawn);
        assert!(close(clock.daylight(), 0.5));
    }

    #[test]
    fn changing_day_length_keeps_the_time_of_day() {
        let mut clock = GameClock::new(30, ManualTime::new(3.0));
        clock.set_to(TimeOfDay::Dusk);
        clock.set_day_length(600);
        assert!(close(clock.time_of_day(), 0.75));
        assert_eq!(clock.day_length(), 600);
    }
}
