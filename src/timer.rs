//! A single armable one-shot timer standing in for a `SIGALRM`-driven alarm.
//! Firing sets a flag the read loop samples between blocking reads;
//! re-arming bumps a generation counter so a stale sleep thread from a
//! previous arm cannot set the flag for a wait it no longer belongs to.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

pub struct AlarmTimer {
    fired: Arc<AtomicBool>,
    generation: Arc<AtomicU64>,
}

impl AlarmTimer {
    pub fn new() -> Self {
        AlarmTimer {
            fired: Arc::new(AtomicBool::new(false)),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Arm the timer for `duration`. Any previously armed, not-yet-fired
    /// timer is implicitly disarmed.
    pub fn arm(&self, duration: Duration) {
        self.fired.store(false, Ordering::SeqCst);
        let my_generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let fired = Arc::clone(&self.fired);
        let generation = Arc::clone(&self.generation);
        thread::spawn(move || {
            thread::sleep(duration);
            if generation.load(Ordering::SeqCst) == my_generation {
                fired.store(true, Ordering::SeqCst);
            }
        });
    }

    /// Disarm the timer. Safe to call whether or not it has fired.
    pub fn disarm(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.fired.store(false, Ordering::SeqCst);
    }

    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }
}

impl Default for AlarmTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_after_duration() {
        let timer = AlarmTimer::new();
        timer.arm(Duration::from_millis(20));
        assert!(!timer.has_fired());
        thread::sleep(Duration::from_millis(60));
        assert!(timer.has_fired());
    }

    #[test]
    fn disarm_prevents_fire() {
        let timer = AlarmTimer::new();
        timer.arm(Duration::from_millis(20));
        timer.disarm();
        thread::sleep(Duration::from_millis(60));
        assert!(!timer.has_fired());
    }

    #[test]
    fn rearming_cancels_the_previous_arm() {
        let timer = AlarmTimer::new();
        timer.arm(Duration::from_millis(10));
        thread::sleep(Duration::from_millis(5));
        // Re-arm before the first timer would have fired.
        timer.arm(Duration::from_millis(50));
        thread::sleep(Duration::from_millis(20));
        assert!(!timer.has_fired(), "stale first arm must not set the flag");
        thread::sleep(Duration::from_millis(60));
        assert!(timer.has_fired());
    }
}
