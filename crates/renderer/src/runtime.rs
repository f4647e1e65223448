use std::time::{Duration, Instant};

use anyhow::{ensure, Result};

/// Snapshot of the clock handed to the frame loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSample {
    /// Elapsed wall-clock or simulated time since the origin.
    pub elapsed: Duration,
    /// Monotonic frame counter for the running session.
    pub frame_index: u64,
}

impl TimeSample {
    pub fn new(elapsed: Duration, frame_index: u64) -> Self {
        Self {
            elapsed,
            frame_index,
        }
    }

    pub fn seconds(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }
}

/// Abstraction over where time values originate from.
pub trait TimeSource: Send {
    /// Resets the source to its initial state.
    fn reset(&mut self);
    /// Produces a time sample for the next frame.
    fn sample(&mut self) -> TimeSample;
    /// Whether samples follow the wall clock; callers pace frames only then.
    fn is_realtime(&self) -> bool;
}

/// Time source backed by the system monotonic clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemTimeSource {
    origin: Instant,
    frame: u64,
}

impl SystemTimeSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
            frame: 0,
        }
    }
}

impl TimeSource for SystemTimeSource {
    fn reset(&mut self) {
        self.origin = Instant::now();
        self.frame = 0;
    }

    fn sample(&mut self) -> TimeSample {
        let sample = TimeSample::new(self.origin.elapsed(), self.frame);
        self.frame = self.frame.saturating_add(1);
        sample
    }

    fn is_realtime(&self) -> bool {
        true
    }
}

/// Simulated clock that advances by exactly one step per sample.
///
/// Headless and scripted runs use it so that the same inputs always produce
/// the same frames, however fast the host is.
#[derive(Debug, Clone, Copy)]
pub struct FixedStepTimeSource {
    step: Duration,
    frame: u64,
}

impl FixedStepTimeSource {
    pub fn new(step: Duration) -> Self {
        Self { step, frame: 0 }
    }

    pub fn from_fps(fps: f32) -> Result<Self> {
        ensure!(
            fps.is_finite() && fps > 0.0,
            "frame rate must be a positive number, got {fps}"
        );
        Ok(Self::new(Duration::from_secs_f64(1.0 / f64::from(fps))))
    }

    pub fn step(&self) -> Duration {
        self.step
    }
}

impl TimeSource for FixedStepTimeSource {
    fn reset(&mut self) {
        self.frame = 0;
    }

    fn sample(&mut self) -> TimeSample {
        let elapsed = self.step.saturating_mul(self.frame.min(u64::from(u32::MAX)) as u32);
        let sample = TimeSample::new(elapsed, self.frame);
        self.frame = self.frame.saturating_add(1);
        sample
    }

    fn is_realtime(&self) -> bool {
        false
    }
}

/// Convenient alias for owning time sources behind trait objects.
pub type BoxedTimeSource = Box<dyn TimeSource + Send>;

/// Wall clock for live input, fixed steps otherwise.
pub fn time_source_for(realtime: bool, fps: f32) -> Result<BoxedTimeSource> {
    if realtime {
        Ok(Box::new(SystemTimeSource::new()))
    } else {
        Ok(Box::new(FixedStepTimeSource::from_fps(fps)?))
    }
}
