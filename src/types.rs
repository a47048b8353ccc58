use crate::reveal::RevealController;
use crate::roles::RoleAssignment;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Opaque ID types for type safety
pub type SessionId = String;
pub type PlayerIndex = usize;

/// Fewest players a session can be started with
pub const MIN_PLAYERS: usize = 3;

/// Shortest vote timer a user may configure
pub const MIN_TIMER_SECONDS: u32 = 5;
pub const DEFAULT_TIMER_SECONDS: u32 = 60;
pub const DEFAULT_IMPOSTER_COUNT: u32 = 1;

/// Window after a first tap during which a second tap reveals
pub const DEFAULT_DISARM_WINDOW: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Setup,
    Revealing,
    Finished,
    VoteTimer,
    Disclosed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RevealState {
    Idle,
    Armed,
    Revealed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TimerStatus {
    Stopped,
    Running,
    Paused,
    Expired,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub disarm_window: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            disarm_window: DEFAULT_DISARM_WINDOW,
        }
    }
}

/// The live game instance. A default `Session` is the pre-game setup screen.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Option<SessionId>,
    pub version: u64,
    pub phase: Phase,
    pub players: Vec<String>,
    pub assignment: Option<RoleAssignment>,
    pub current_index: PlayerIndex,
    pub reveal: RevealController,
    pub started_at: Option<String>, // RFC 3339
}

impl Session {
    pub fn new(disarm_window: Duration) -> Self {
        Self {
            id: None,
            version: 0,
            phase: Phase::Setup,
            players: Vec::new(),
            assignment: None,
            current_index: 0,
            reveal: RevealController::new(disarm_window),
            started_at: None,
        }
    }

    /// Check if a phase transition is valid
    pub fn is_valid_transition(from: Phase, to: Phase) -> bool {
        use Phase::*;

        match (from, to) {
            // A fresh deal may replace whatever is on screen
            (_, Revealing) => true,
            (Revealing, Finished) => true,
            (Finished, VoteTimer) => true,
            // Stopping the timer returns to the debate screen
            (VoteTimer, Finished) => true,
            (Finished, Disclosed) => true,
            (VoteTimer, Disclosed) => true,
            (_, Setup) => true,
            _ => false,
        }
    }

    pub(crate) fn transition(&mut self, to: Phase) -> bool {
        if !Self::is_valid_transition(self.phase, to) {
            return false;
        }
        self.phase = to;
        self.version += 1;
        true
    }

    pub fn current_player(&self) -> Option<&str> {
        self.players.get(self.current_index).map(String::as_str)
    }

    pub fn imposter_count(&self) -> usize {
        self.assignment
            .as_ref()
            .map(|a| a.imposters.len())
            .unwrap_or(0)
    }
}

/// Parse raw player-name input: split on commas and newlines, trim, drop blanks.
/// Duplicates are kept; order defines turn order.
pub fn parse_player_names(raw: &str) -> Vec<String> {
    raw.split([',', '\n'])
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
