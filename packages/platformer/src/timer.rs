//! Countdown timers, ticked once per frame.

use crate::handle::TimerHandle;
use slab::Slab;


#[derive(Debug, Copy, Clone, PartialEq)]
struct Timer {
    duration: f32,
    time_left: f32,
    running: bool,
    complete: bool,
}

/// Timer storage.
///
/// Handles of destroyed timers are recycled as-is, so a handle must not be
/// used after destroying its timer.
#[derive(Debug, Default)]
pub struct Timers {
    slab: Slab<Timer>,
}

impl Timers {
    pub fn new() -> Self {
        Timers {
            slab: Slab::new(),
        }
    }

    /// Create a timer counting down from `duration` seconds, optionally
    /// starting it right away.
    pub fn create(&mut self, duration: f32, start_now: bool) -> TimerHandle {
        TimerHandle(self.slab.insert(Timer {
            duration,
            time_left: duration,
            running: start_now,
            complete: false,
        }))
    }

    fn get_mut(&mut self, handle: TimerHandle) -> Option<&mut Timer> {
        let timer = self.slab.get_mut(handle.0);
        if timer.is_none() {
            warn!("no timer with key {}", handle.0);
        }
        timer
    }

    /// Resume counting down from where the timer was.
    pub fn start(&mut self, handle: TimerHandle) {
        if let Some(timer) = self.get_mut(handle) {
            timer.running = !timer.complete;
        }
    }

    /// Start counting down again from the full duration.
    pub fn restart(&mut self, handle: TimerHandle) {
        if let Some(timer) = self.get_mut(handle) {
            timer.time_left = timer.duration;
            timer.complete = false;
            timer.running = true;
        }
    }

    pub fn stop(&mut self, handle: TimerHandle) {
        if let Some(timer) = self.get_mut(handle) {
            timer.running = false;
        }
    }

    /// Returns whether the timer existed.
    pub fn destroy(&mut self, handle: TimerHandle) -> bool {
        if self.slab.contains(handle.0) {
            self.slab.remove(handle.0);
            true
        } else {
            warn!("cannot destroy timer, no timer with key {}", handle.0);
            false
        }
    }

    /// Count every running timer down by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        for (_, timer) in self.slab.iter_mut() {
            if !timer.running {
                continue;
            }
            timer.time_left -= dt;
            if timer.time_left <= 0.0 {
                timer.time_left = 0.0;
                timer.running = false;
                timer.complete = true;
            }
        }
    }

    /// Whether the timer has run out. False for unknown handles.
    pub fn is_complete(&self, handle: TimerHandle) -> bool {
        self.slab
            .get(handle.0)
            .map(|timer| timer.complete)
            .unwrap_or(false)
    }

    pub fn is_running(&self, handle: TimerHandle) -> bool {
        self.slab
            .get(handle.0)
            .map(|timer| timer.running)
            .unwrap_or(false)
    }

    /// Seconds left on the timer.
    pub fn time_left(&self, handle: TimerHandle) -> Option<f32> {
        self.slab.get(handle.0).map(|timer| timer.time_left)
    }

    pub fn len(&self) -> usize {
        self.slab.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slab.is_empty()
    }
}


#[test]
fn test_timer_runs_out() {
    let mut timers = Timers::new();
    let timer = timers.create(0.5, true);
    let idle = timers.create(0.5, false);

    timers.update(0.25);
    assert_eq!(timers.time_left(timer), Some(0.25));
    assert!(!timers.is_complete(timer));
    assert_eq!(timers.time_left(idle), Some(0.5));

    timers.update(0.5);
    assert!(timers.is_complete(timer));
    assert!(!timers.is_running(timer));
    assert_eq!(timers.time_left(timer), Some(0.0));
    assert!(!timers.is_complete(idle));
}

#[test]
fn test_timer_stop_start_restart() {
    let mut timers = Timers::new();
    let timer = timers.create(1.0, false);

    timers.start(timer);
    timers.update(0.25);
    timers.stop(timer);
    timers.update(10.0);
    assert_eq!(timers.time_left(timer), Some(0.75));

    timers.start(timer);
    timers.update(1.0);
    assert!(timers.is_complete(timer));

    // a finished timer only comes back through restart
    timers.start(timer);
    assert!(!timers.is_running(timer));
    timers.restart(timer);
    assert!(timers.is_running(timer));
    assert!(!timers.is_complete(timer));
    assert_eq!(timers.time_left(timer), Some(1.0));
}

#[test]
fn test_timer_destroy() {
    let mut timers = Timers::new();
    let a = timers.create(1.0, true);
    let b = timers.create(2.0, true);
    assert!(timers.destroy(a));
    assert!(!timers.destroy(a));
    assert_eq!(timers.time_left(a), None);
    assert!(!timers.is_complete(a));
    assert_eq!(timers.len(), 1);

    let c = timers.create(3.0, false);
    assert_eq!(c, a);
    assert_eq!(timers.time_left(b), Some(2.0));
}
