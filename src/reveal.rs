//! Two-tap reveal gesture for the player currently holding the device.
//!
//! The first tap arms the controller and shows a prompt; a second tap within
//! the disarm window reveals the player's message. Each arm gets a fresh
//! generation number so a disarm scheduled for an older arm can never clear
//! a newer one.

use crate::types::RevealState;
use std::time::Duration;
use tokio::time::Instant;

pub const ARM_PROMPT: &str = "Tap again to reveal";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PressOutcome {
    /// First tap registered; the caller must schedule a disarm for `generation`
    Armed { generation: u64 },
    Revealed(String),
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceOutcome {
    NextPlayer { index: usize, name: String },
    /// Everyone has seen their role
    Finished,
    Ignored,
}

#[derive(Debug, Clone)]
pub struct RevealController {
    state: RevealState,
    armed_at: Option<Instant>,
    message: Option<String>,
    generation: u64,
    window: Duration,
}

impl RevealController {
    pub fn new(window: Duration) -> Self {
        Self {
            state: RevealState::Idle,
            armed_at: None,
            message: None,
            generation: 0,
            window,
        }
    }

    pub fn state(&self) -> RevealState {
        self.state
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The latched message, once revealed
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// What the screen should show under the player's name
    pub fn display(&self) -> Option<&str> {
        match self.state {
            RevealState::Idle => None,
            RevealState::Armed => Some(ARM_PROMPT),
            RevealState::Revealed => self.message(),
        }
    }

    /// Register a tap. `compute` runs at most once per player.
    pub fn press<F>(&mut self, now: Instant, compute: F) -> PressOutcome
    where
        F: FnOnce() -> String,
    {
        match self.state {
            RevealState::Revealed => PressOutcome::Ignored,
            RevealState::Armed if self.within_window(now) => {
                self.state = RevealState::Revealed;
                self.armed_at = None;
                self.generation += 1;
                let message = compute();
                self.message = Some(message.clone());
                PressOutcome::Revealed(message)
            }
            // Idle, or armed but the window lapsed before the disarm ran
            _ => self.arm(now),
        }
    }

    fn arm(&mut self, now: Instant) -> PressOutcome {
        self.state = RevealState::Armed;
        self.armed_at = Some(now);
        self.generation += 1;
        PressOutcome::Armed {
            generation: self.generation,
        }
    }

    fn within_window(&self, now: Instant) -> bool {
        self.armed_at
            .map(|armed_at| now.saturating_duration_since(armed_at) < self.window)
            .unwrap_or(false)
    }

    /// Disarm timeout. Returns false when `generation` is stale.
    pub fn disarm(&mut self, generation: u64) -> bool {
        if self.state != RevealState::Armed || self.generation != generation {
            return false;
        }
        self.state = RevealState::Idle;
        self.armed_at = None;
        true
    }

    /// Back to idle for the next player
    pub fn reset(&mut self) {
        self.state = RevealState::Idle;
        self.armed_at = None;
        self.message = None;
        self.generation += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(1500);

    #[test]
    fn test_single_press_never_reveals() {
        let mut reveal = RevealController::new(WINDOW);
        let now = Instant::now();

        let outcome = reveal.press(now, || "apple".to_string());
        assert!(matches!(outcome, PressOutcome::Armed { .. }));
        assert_eq!(reveal.state(), RevealState::Armed);
        assert_eq!(reveal.display(), Some(ARM_PROMPT));
        assert!(reveal.message().is_none());
    }

    #[test]
    fn test_double_press_within_window_reveals() {
        let mut reveal = RevealController::new(WINDOW);
        let now = Instant::now();

        reveal.press(now, || unreachable!());
        let outcome = reveal.press(now + Duration::from_millis(400), || "apple".to_string());

        assert_eq!(outcome, PressOutcome::Revealed("apple".to_string()));
        assert_eq!(reveal.state(), RevealState::Revealed);
        assert_eq!(reveal.display(), Some("apple"));
    }

    #[test]
    fn test_press_after_window_rearms() {
        let mut reveal = RevealController::new(WINDOW);
        let now = Instant::now();

        let first = reveal.press(now, || unreachable!());
        let second = reveal.press(now + WINDOW, || unreachable!());

        match (first, second) {
            (PressOutcome::Armed { generation: a }, PressOutcome::Armed { generation: b }) => {
                assert!(b > a)
            }
            other => panic!("Expected two arms, got {:?}", other),
        }
        assert_eq!(reveal.state(), RevealState::Armed);
    }

    #[test]
    fn test_revealed_message_is_latched() {
        let mut reveal = RevealController::new(WINDOW);
        let now = Instant::now();
        let mut computed = 0;

        reveal.press(now, || unreachable!());
        reveal.press(now, || {
            computed += 1;
            "moon".to_string()
        });

        for _ in 0..3 {
            assert_eq!(reveal.press(now, || unreachable!()), PressOutcome::Ignored);
            assert_eq!(reveal.message(), Some("moon"));
        }
        assert_eq!(computed, 1);
    }

    #[test]
    fn test_disarm_ignores_stale_generation() {
        let mut reveal = RevealController::new(WINDOW);
        let now = Instant::now();

        let PressOutcome::Armed { generation: old } = reveal.press(now, || unreachable!()) else {
            panic!("Expected arm");
        };
        assert!(reveal.disarm(old));
        assert_eq!(reveal.state(), RevealState::Idle);

        let PressOutcome::Armed { generation: new } =
            reveal.press(now + Duration::from_secs(2), || unreachable!())
        else {
            panic!("Expected arm");
        };

        // The first arm's timeout firing late must not clear the second prompt
        assert!(!reveal.disarm(old));
        assert_eq!(reveal.state(), RevealState::Armed);
        assert!(reveal.disarm(new));
    }

    #[test]
    fn test_disarm_after_reveal_is_noop() {
        let mut reveal = RevealController::new(WINDOW);
        let now = Instant::now();

        let PressOutcome::Armed { generation } = reveal.press(now, || unreachable!()) else {
            panic!("Expected arm");
        };
        reveal.press(now, || "apple".to_string());

        assert!(!reveal.disarm(generation));
        assert_eq!(reveal.state(), RevealState::Revealed);
    }

    #[test]
    fn test_reset_invalidates_pending_disarm() {
        let mut reveal = RevealController::new(WINDOW);
        let now = Instant::now();

        let PressOutcome::Armed { generation } = reveal.press(now, || unreachable!()) else {
            panic!("Expected arm");
        };
        reveal.reset();
        reveal.press(now, || unreachable!());

        assert!(!reveal.disarm(generation));
        assert_eq!(reveal.state(), RevealState::Armed);
    }
}
