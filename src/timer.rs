/*
 * Copyright 2018 Ian Johnson
 *
 * This is free software, distributed under the MIT license.  A copy of the
 * license can be found in the LICENSE file in the project root, or at
 * https://opensource.org/licenses/MIT.
 */

//! The delay and sound timers.
//!
//! `Timers` holds the two countdown registers.  Nothing in here ticks by
//! itself: a driver either calls `Timers::tick` at 60 Hz (from any thread,
//! since the state is atomic) or asks a `Clock` how many ticks have elapsed
//! in wall-clock time and applies them.

use std::num::Wrapping;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use time;

/// The rate at which the timers count down, in Hz.
pub const TIMER_FREQ: u32 = 60;

/// The delay and sound countdown registers.
#[derive(Debug, Default)]
pub struct Timers {
    delay: AtomicU8,
    sound: AtomicU8,
    /// Ticks are ignored unless this is set.
    running: AtomicBool,
}

impl Timers {
    /// Returns a stopped pair of timers at zero.
    pub fn new() -> Self {
        Timers::default()
    }

    /// Lets subsequent ticks decrement the timers.
    pub fn start(&self) {
        self.running.store(true, Ordering::SeqCst);
    }

    /// Makes subsequent ticks do nothing.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Returns whether the timers are running.
    pub fn running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Performs one 60 Hz step: each nonzero timer is decremented by one.
    pub fn tick(&self) {
        if self.running() {
            countdown(&self.delay);
            countdown(&self.sound);
        }
    }

    pub fn delay(&self) -> u8 {
        self.delay.load(Ordering::SeqCst)
    }

    pub fn set_delay(&self, val: u8) {
        self.delay.store(val, Ordering::SeqCst);
    }

    pub fn sound(&self) -> u8 {
        self.sound.load(Ordering::SeqCst)
    }

    pub fn set_sound(&self, val: u8) {
        self.sound.store(val, Ordering::SeqCst);
    }

    /// Returns whether a tone should be playing.
    pub fn should_beep(&self) -> bool {
        self.sound() != 0
    }

    /// Zeroes both timers without changing whether they run.
    pub fn reset(&self) {
        self.set_delay(0);
        self.set_sound(0);
    }
}

/// Decrements the counter unless it is already zero.
fn countdown(counter: &AtomicU8) {
    let _ = counter.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |v| v.checked_sub(1));
}

/// A wall clock counting ticks at a fixed frequency.
#[derive(Debug)]
pub struct Clock {
    /// Whether the clock is running.
    enabled: bool,
    /// The frequency of the clock, in Hz.
    frequency: u32,
    /// The tick count at the last lap.
    ticks: Wrapping<u32>,
}

impl Clock {
    /// Returns a new clock at the given frequency which is stopped.
    pub fn new(frequency: u32) -> Self {
        Clock {
            enabled: false,
            frequency,
            ticks: Wrapping(0),
        }
    }

    /// Starts the clock, counting from now.
    pub fn start(&mut self) {
        self.enabled = true;
        self.ticks = self.now();
    }

    /// Stops the clock.
    pub fn stop(&mut self) {
        self.enabled = false;
    }

    /// Returns the number of ticks which have elapsed since the last call to
    /// this method (or the start of the clock).
    ///
    /// If the clock is stopped, this always returns 0.
    pub fn lap(&mut self) -> u32 {
        if self.enabled {
            let old = self.ticks;
            self.ticks = self.now();
            (self.ticks - old).0
        } else {
            0
        }
    }

    fn now(&self) -> Wrapping<u32> {
        Wrapping((time::precise_time_ns() as f64 * f64::from(self.frequency) / 1e9) as u64 as u32)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use super::{Clock, Timers};

    #[test]
    fn tick_floors_at_zero() {
        let timers = Timers::new();
        timers.start();
        timers.set_delay(2);
        timers.set_sound(1);

        timers.tick();
        assert_eq!((timers.delay(), timers.sound()), (1, 0));
        assert!(!timers.should_beep());
        timers.tick();
        timers.tick();
        assert_eq!((timers.delay(), timers.sound()), (0, 0));
    }

    #[test]
    fn stopped_timers_hold() {
        let timers = Timers::new();
        timers.set_delay(10);
        timers.set_sound(10);
        timers.tick();
        assert_eq!((timers.delay(), timers.sound()), (10, 10));
        assert!(timers.should_beep());

        timers.start();
        timers.tick();
        timers.stop();
        timers.tick();
        assert_eq!((timers.delay(), timers.sound()), (9, 9));
    }

    #[test]
    fn tick_from_another_thread() {
        let timers = Arc::new(Timers::new());
        timers.start();
        timers.set_delay(200);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let timers = Arc::clone(&timers);
                thread::spawn(move || {
                    for _ in 0..25 {
                        timers.tick();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(timers.delay(), 100);
    }

    #[test]
    fn stopped_clock_laps_nothing() {
        let mut clock = Clock::new(1000);
        thread::sleep(Duration::from_millis(20));
        assert_eq!(clock.lap(), 0);

        clock.start();
        thread::sleep(Duration::from_millis(20));
        // Whatever has elapsed so far, a stop discards it.
        clock.stop();
        assert_eq!(clock.lap(), 0);
    }

    #[test]
    fn running_clock_counts_elapsed_ticks() {
        let mut clock = Clock::new(1000);
        clock.start();
        thread::sleep(Duration::from_millis(20));
        assert!(clock.lap() >= 10);
    }
}
