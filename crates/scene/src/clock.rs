/// Scene time, advanced by wall-clock deltas.
///
/// Pausing freezes scene time; `time_scale` stretches it. Negative deltas
/// are ignored so a clock hiccup never runs the animation backwards.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClock {
    time: f32,
    pub time_scale: f32,
    pub paused: bool,
}

impl Default for AnimationClock {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl AnimationClock {
    pub fn new(time_scale: f32) -> Self {
        Self {
            time: 0.0,
            time_scale,
            paused: false,
        }
    }

    /// Current scene time in seconds.
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Jump to an absolute scene time.
    pub fn set_time(&mut self, time: f32) {
        self.time = time;
    }

    /// Advance by `dt` wall-clock seconds and return the new scene time.
    pub fn advance(&mut self, dt: f32) -> f32 {
        if !self.paused && dt > 0.0 {
            self.time += dt * self.time_scale;
        }
        self.time
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_by_scaled_delta() {
        let mut clock = AnimationClock::new(2.0);
        clock.advance(0.5);
        assert_eq!(clock.time(), 1.0);
    }

    #[test]
    fn paused_clock_holds_time() {
        let mut clock = AnimationClock::default();
        clock.advance(1.0);
        clock.toggle_pause();
        clock.advance(5.0);
        assert_eq!(clock.time(), 1.0);
        clock.toggle_pause();
        clock.advance(1.0);
        assert_eq!(clock.time(), 2.0);
    }

    #[test]
    fn negative_delta_ignored() {
        let mut clock = AnimationClock::default();
        clock.advance(1.0);
        clock.advance(-0.5);
        assert_eq!(clock.time(), 1.0);
    }
}
