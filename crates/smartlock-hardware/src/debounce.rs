//! Software debounce for polled digital inputs.

use std::time::Duration;

use tokio::time::Instant;

/// Accepts a sampled level only after it has held for the settle window.
///
/// The first stable value also has to settle, so a freshly started sensor
/// reports nothing until its input has been steady for one window.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use smartlock_hardware::debounce::Debouncer;
/// use tokio::time::Instant;
///
/// let mut debouncer = Debouncer::new(Duration::from_millis(50));
/// let t0 = Instant::now();
///
/// assert_eq!(debouncer.update(true, t0), None);
/// assert_eq!(debouncer.update(true, t0 + Duration::from_millis(50)), Some(true));
/// assert_eq!(debouncer.stable(), Some(true));
/// ```
#[derive(Debug, Clone)]
pub struct Debouncer {
    settle: Duration,
    stable: Option<bool>,
    candidate: Option<(bool, Instant)>,
}

impl Debouncer {
    pub fn new(settle: Duration) -> Self {
        Self {
            settle,
            stable: None,
            candidate: None,
        }
    }

    /// Current stable value, if one has been established.
    pub fn stable(&self) -> Option<bool> {
        self.stable
    }

    /// Feed a sample taken at `now`; returns the new stable value when it
    /// changes.
    pub fn update(&mut self, sample: bool, now: Instant) -> Option<bool> {
        if self.stable == Some(sample) {
            self.candidate = None;
            return None;
        }

        match self.candidate {
            Some((value, since)) if value == sample => {
                if now.saturating_duration_since(since) >= self.settle {
                    self.stable = Some(sample);
                    self.candidate = None;
                    return Some(sample);
                }
            }
            _ => self.candidate = Some((sample, now)),
        }

        if self.settle.is_zero() {
            self.stable = Some(sample);
            self.candidate = None;
            return Some(sample);
        }
        None
    }

    /// Forget everything, e.g. after a read failure.
    pub fn reset(&mut self) {
        self.stable = None;
        self.candidate = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SETTLE: Duration = Duration::from_millis(50);

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_initial_value_needs_to_settle() {
        let mut debouncer = Debouncer::new(SETTLE);
        let t0 = Instant::now();

        assert_eq!(debouncer.update(false, t0), None);
        assert_eq!(debouncer.update(false, t0 + ms(30)), None);
        assert_eq!(debouncer.stable(), None);
        assert_eq!(debouncer.update(false, t0 + ms(50)), Some(false));
    }

    #[test]
    fn test_bounce_is_rejected() {
        let mut debouncer = Debouncer::new(SETTLE);
        let t0 = Instant::now();
        debouncer.update(false, t0);
        debouncer.update(false, t0 + ms(60));
        assert_eq!(debouncer.stable(), Some(false));

        // Glitches shorter than the window never surface.
        assert_eq!(debouncer.update(true, t0 + ms(70)), None);
        assert_eq!(debouncer.update(false, t0 + ms(80)), None);
        assert_eq!(debouncer.update(true, t0 + ms(90)), None);
        assert_eq!(debouncer.update(true, t0 + ms(130)), None);
        assert_eq!(debouncer.update(true, t0 + ms(140)), Some(true));
    }

    #[test]
    fn test_repeated_stable_samples_are_silent() {
        let mut debouncer = Debouncer::new(SETTLE);
        let t0 = Instant::now();
        debouncer.update(true, t0);
        debouncer.update(true, t0 + ms(50));

        for i in 6..20 {
            assert_eq!(debouncer.update(true, t0 + ms(i * 10)), None);
        }
    }

    #[test]
    fn test_zero_window_passes_through() {
        let mut debouncer = Debouncer::new(Duration::ZERO);
        let t0 = Instant::now();
        assert_eq!(debouncer.update(true, t0), Some(true));
        assert_eq!(debouncer.update(false, t0), Some(false));
    }

    #[test]
    fn test_reset() {
        let mut debouncer = Debouncer::new(SETTLE);
        let t0 = Instant::now();
        debouncer.update(true, t0);
        debouncer.update(true, t0 + ms(50));

        debouncer.reset();
        assert_eq!(debouncer.stable(), None);
    }
}
