use log::{info, trace};

// Paces the frame loop and measures the time between frames.
#[derive(Debug)]
pub struct FpsEstimator {
    iteration_start: std::time::Instant,
    pub iteration_duration: std::time::Duration,
    // Sleep off the rest of the frame budget in tick.
    pub pace: bool,
    frames: u64,
    // Exponential moving average of the frame time, in seconds.
    average_frame_time: f64,
}

static NATIVE_SLEEP_ACCURACY: std::time::Duration = std::time::Duration::from_micros(500);
const SMOOTHING: f64 = 0.1;

impl FpsEstimator {
    pub fn new(fps: f64, pace: bool) -> FpsEstimator {
        let iteration_duration = std::time::Duration::from_secs_f64(1.0 / fps.max(1.0));
        FpsEstimator {
            iteration_start: std::time::Instant::now(),
            iteration_duration,
            pace,
            frames: 0,
            average_frame_time: iteration_duration.as_secs_f64(),
        }
    }

    fn high_resolution_sleep_until(done: &std::time::Instant) {
        let now = std::time::Instant::now();
        let system_sleep_until = done.checked_sub(NATIVE_SLEEP_ACCURACY).unwrap_or(now);
        if now < system_sleep_until {
            std::thread::sleep(system_sleep_until.duration_since(now));
        }
        while std::time::Instant::now() < *done {
            std::hint::spin_loop();
        }
    }

    // Ends the current frame and returns its duration.
    pub fn tick(&mut self) -> std::time::Duration {
        let sleep_until = self.iteration_start + self.iteration_duration;
        if self.pace {
            FpsEstimator::high_resolution_sleep_until(&sleep_until);
        }
        let now = std::time::Instant::now();
        if now > sleep_until + NATIVE_SLEEP_ACCURACY {
            let overslept_by = now - sleep_until;
            trace!("Over time budget by: {:?}", overslept_by);
        }
        let delta_t = now - self.iteration_start;
        self.iteration_start = now;
        self.frames += 1;
        self.average_frame_time =
            SMOOTHING * delta_t.as_secs_f64() + (1.0 - SMOOTHING) * self.average_frame_time;
        delta_t
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn fps(&self) -> f64 {
        if self.average_frame_time > 0.0 {
            1.0 / self.average_frame_time
        } else {
            0.0
        }
    }

    pub fn report(&self) {
        info!("{} frames, {:0.2} fps", self.frames, self.fps());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_frames() {
        let mut fps = FpsEstimator::new(1000.0, false);
        assert!((fps.fps() - 1000.0).abs() < 1e-6);
        for _ in 0..3 {
            fps.tick();
        }
        assert_eq!(fps.frames(), 3);
        assert!(fps.fps() > 0.0);
    }

    #[test]
    fn paced_tick_waits_for_budget() {
        let mut fps = FpsEstimator::new(200.0, true);
        let delta = fps.tick();
        assert!(delta >= std::time::Duration::from_millis(5));
    }

    // Overshoot of the hybrid sleep at 60 fps.
    #[test]
    #[ignore] // Takes a few seconds, run on demand.
    fn high_resolution_sleep_accuracy() {
        let target = std::time::Duration::from_secs_f64(1.0 / 60.0);
        let mut max_overshoot = std::time::Duration::from_secs(0);
        let mut total_overshoot = std::time::Duration::from_secs(0);
        let iterations = 300;
        for _ in 0..iterations {
            let start = std::time::Instant::now();
            FpsEstimator::high_resolution_sleep_until(&(start + target));
            let elapsed = start.elapsed();
            assert!(elapsed >= target);
            let overshoot = elapsed - target;
            total_overshoot += overshoot;
            max_overshoot = max_overshoot.max(overshoot);
        }
        println!(
            "Max overshoot: {:?}, Avg overshoot: {:?}",
            max_overshoot,
            total_overshoot / iterations
        );
    }
}
