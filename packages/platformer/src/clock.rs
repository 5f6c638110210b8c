//! See `FrameClock`.

use std::time::{
    Instant,
    Duration,
};


const FPS_WINDOW: Duration = Duration::from_secs(1);


/// Measures wall-clock time between frames and counts frames per second.
pub struct FrameClock {
    target_fps: u32,
    last: Instant,
    delta: f32,
    window_start: Instant,
    window_frames: u32,
    fps: u32,
}

impl FrameClock {
    /// Construct a clock with the given target frame rate, starting now.
    pub fn new(target_fps: u32) -> Self {
        Self::starting_at(target_fps, Instant::now())
    }

    fn starting_at(target_fps: u32, now: Instant) -> Self {
        FrameClock {
            target_fps,
            last: now,
            delta: 0.0,
            window_start: now,
            window_frames: 0,
            fps: target_fps,
        }
    }

    /// Call at the start of each frame. Returns the seconds since the last
    /// call.
    pub fn tick(&mut self) -> f32 {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> f32 {
        self.delta = (now - self.last).as_secs_f32();
        self.last = now;

        self.window_frames += 1;
        if now - self.window_start >= FPS_WINDOW {
            self.fps = self.window_frames;
            self.window_frames = 0;
            self.window_start = now;
        }
        self.delta
    }

    /// Seconds between the last two ticks.
    pub fn delta(&self) -> f32 {
        self.delta
    }

    /// Frames counted over the last full second. Reads as the target frame
    /// rate until a second has passed.
    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn target_fps(&self) -> u32 {
        self.target_fps
    }

    /// Time budget of one frame at the target frame rate.
    pub fn frame_budget(&self) -> Duration {
        Duration::from_secs(1) / self.target_fps.max(1)
    }
}


#[test]
fn test_clock_delta() {
    let start = Instant::now();
    let mut clock = FrameClock::starting_at(60, start);
    let delta = clock.tick_at(start + Duration::from_millis(20));
    assert!((delta - 0.02).abs() < 1e-6);
    assert_eq!(clock.delta(), delta);
    let delta = clock.tick_at(start + Duration::from_millis(25));
    assert!((delta - 0.005).abs() < 1e-6);
}

#[test]
fn test_clock_counts_fps() {
    let start = Instant::now();
    let mut clock = FrameClock::starting_at(60, start);
    assert_eq!(clock.fps(), 60);
    for i in 1..=30 {
        clock.tick_at(start + Duration::from_millis(i * 40));
    }
    // the 25th frame closed the first window
    assert_eq!(clock.fps(), 25);
    assert_eq!(clock.frame_budget(), Duration::from_secs(1) / 60);
}
