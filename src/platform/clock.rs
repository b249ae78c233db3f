//! Frame clocks
//!
//! The run loop only asks "how many milliseconds since last frame", after the
//! clock has waited out the frame cap.

use std::thread;
use std::time::{Duration, Instant};

pub trait Clock {
    /// Block until at least `1 / max_fps` seconds have passed since the last
    /// tick, then return the milliseconds that actually passed
    fn tick(&mut self, max_fps: u32) -> u64;
}

/// Real time, capped by sleeping
#[derive(Debug)]
pub struct FrameClock {
    last: Instant,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    pub fn new() -> Self {
        Self { last: Instant::now() }
    }
}

impl Clock for FrameClock {
    fn tick(&mut self, max_fps: u32) -> u64 {
        if max_fps > 0 {
            let min_frame = Duration::from_secs_f64(1.0 / f64::from(max_fps));
            let spent = self.last.elapsed();
            if spent < min_frame {
                thread::sleep(min_frame - spent);
            }
        }
        let now = Instant::now();
        let ms = u64::try_from(now.duration_since(self.last).as_millis()).unwrap_or(u64::MAX);
        // Advance by whole milliseconds only; the sub-millisecond remainder
        // carries into the next frame
        self.last = self.last.checked_add(Duration::from_millis(ms)).unwrap_or(now);
        ms
    }
}

/// Every frame takes the same time; never sleeps
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    pub frame_ms: u64,
}

impl FixedClock {
    pub fn new(frame_ms: u64) -> Self {
        Self { frame_ms }
    }
}

impl Clock for FixedClock {
    fn tick(&mut self, _max_fps: u32) -> u64 {
        self.frame_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_clock_honours_cap() {
        let mut clock = FrameClock::new();
        let start = Instant::now();
        clock.tick(50);
        clock.tick(50);
        // Two frames at 50 fps take at least 40 ms
        assert!(start.elapsed() >= Duration::from_millis(40));
    }

    #[test]
    fn test_frame_clock_keeps_fractional_millis() {
        let mut clock = FrameClock::new();
        let start = Instant::now();
        let mut reported = 0;
        for _ in 0..200 {
            thread::sleep(Duration::from_micros(1700));
            reported += clock.tick(0);
        }
        let real = u64::try_from(start.elapsed().as_millis()).unwrap();
        assert!(real.abs_diff(reported) <= 1, "reported {reported} ms vs real {real} ms");
    }

    #[test]
    fn test_fixed_clock() {
        let mut clock = FixedClock::new(16);
        assert_eq!(clock.tick(100), 16);
        assert_eq!(clock.tick(0), 16);
    }
}
