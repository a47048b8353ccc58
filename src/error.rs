use crate::types::Phase;

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Recoverable configuration and sequencing errors. None of these are fatal:
/// the caller reports them and the session stays as it was.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Need at least {required} players, got {actual}")]
    TooFewPlayers { required: usize, actual: usize },

    #[error("Word list not loaded yet, try again in a second")]
    WordsUnavailable,

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("No eligible first player: all {players} players are imposters")]
    NoEligibleFirstPlayer { players: usize },

    #[error("Cannot {action} during {phase:?} phase")]
    InvalidPhase { action: &'static str, phase: Phase },
}

impl SessionError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::TooFewPlayers { .. } => "TOO_FEW_PLAYERS",
            SessionError::WordsUnavailable => "WORDS_UNAVAILABLE",
            SessionError::InvalidConfiguration(_) => "INVALID_CONFIGURATION",
            SessionError::NoEligibleFirstPlayer { .. } => "NO_ELIGIBLE_FIRST_PLAYER",
            SessionError::InvalidPhase { .. } => "INVALID_PHASE",
        }
    }
}
