//! Frame-loop plumbing: the loop state machine, optional per-frame pacing,
//! and debounced resize handling.

use std::time::{Duration, Instant};

use crate::error::{WavesceneError, WavesceneResult};

/// Lifecycle of the animation loop. `Idle → Running` on successful setup,
/// `Running → Stopped` on teardown; a stopped loop never restarts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
    Stopped,
}

impl LoopState {
    pub fn start(&mut self) -> WavesceneResult<()> {
        match self {
            Self::Idle => {
                *self = Self::Running;
                Ok(())
            }
            Self::Running => Err(WavesceneError::validation("animation loop already running")),
            Self::Stopped => Err(WavesceneError::validation(
                "animation loop was stopped and cannot restart",
            )),
        }
    }

    pub fn stop(&mut self) {
        *self = Self::Stopped;
    }

    pub fn is_running(self) -> bool {
        self == Self::Running
    }
}

/// Optional artificial delay between frames, for throttled/low-power
/// rendering or deterministic testing.
#[derive(Clone, Copy, Debug, Default)]
pub struct FramePacer {
    delay: Option<Duration>,
}

impl FramePacer {
    pub fn new(delay_ms: Option<u64>) -> Self {
        Self {
            delay: delay_ms.map(Duration::from_millis),
        }
    }

    pub fn after_frame(&self) {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
    }
}

/// Default quiet period before a resize is applied.
pub const RESIZE_QUIET: Duration = Duration::from_millis(100);

/// Coalesces a burst of resize events into one camera/renderer update per
/// quiet period, avoiding redundant projection churn during a drag.
#[derive(Clone, Copy, Debug)]
pub struct ResizeDebouncer {
    pending: Option<(u32, u32)>,
    last_event: Option<Instant>,
    quiet: Duration,
}

impl Default for ResizeDebouncer {
    fn default() -> Self {
        Self::new(RESIZE_QUIET)
    }
}

impl ResizeDebouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            pending: None,
            last_event: None,
            quiet,
        }
    }

    pub fn push(&mut self, width: u32, height: u32) {
        self.push_at(width, height, Instant::now());
    }

    pub fn push_at(&mut self, width: u32, height: u32, now: Instant) {
        self.pending = Some((width, height));
        self.last_event = Some(now);
    }

    /// The settled size, if the quiet period has elapsed. Consumes the
    /// pending event.
    pub fn poll(&mut self) -> Option<(u32, u32)> {
        self.poll_at(Instant::now())
    }

    pub fn poll_at(&mut self, now: Instant) -> Option<(u32, u32)> {
        let last = self.last_event?;
        if now.duration_since(last) < self.quiet {
            return None;
        }
        self.last_event = None;
        self.pending.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loop_state_transitions() {
        let mut state = LoopState::Idle;
        state.start().unwrap();
        assert!(state.is_running());
        assert!(state.start().is_err());
        state.stop();
        assert!(!state.is_running());
        assert!(state.start().is_err(), "stopped loops never restart");
    }

    #[test]
    fn resize_burst_coalesces_to_last_size() {
        let t0 = Instant::now();
        let mut debouncer = ResizeDebouncer::new(Duration::from_millis(100));
        debouncer.push_at(100, 100, t0);
        debouncer.push_at(200, 150, t0 + Duration::from_millis(50));
        debouncer.push_at(300, 200, t0 + Duration::from_millis(90));

        // Still inside the quiet window measured from the last event.
        assert_eq!(debouncer.poll_at(t0 + Duration::from_millis(120)), None);
        assert_eq!(
            debouncer.poll_at(t0 + Duration::from_millis(195)),
            Some((300, 200))
        );
        // Consumed; nothing further until the next event.
        assert_eq!(debouncer.poll_at(t0 + Duration::from_secs(10)), None);
    }
}
