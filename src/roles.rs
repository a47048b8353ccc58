//! Role assignment: who is an imposter, which word everyone else sees,
//! and who opens the debate.
//!
//! Pure apart from the random source, which is injected so a seeded
//! generator gives reproducible deals. Fairness of the imposter draw is only
//! as good as that source.

use crate::error::{SessionError, SessionResult};
use crate::types::{PlayerIndex, MIN_PLAYERS};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Shown to imposters outside stealth mode
pub const IMPOSTER_MESSAGE: &str = "IMPOSTER";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub secret_word: String,
    /// Decoy for imposters; only set in stealth mode
    pub imposter_word: Option<String>,
    pub imposters: BTreeSet<PlayerIndex>,
    pub first_player_index: PlayerIndex,
    pub stealth: bool,
}

impl RoleAssignment {
    pub fn is_imposter(&self, index: PlayerIndex) -> bool {
        self.imposters.contains(&index)
    }

    /// The text a player sees on reveal
    pub fn message_for(&self, index: PlayerIndex) -> String {
        if !self.is_imposter(index) {
            return self.secret_word.clone();
        }

        if !self.stealth {
            return IMPOSTER_MESSAGE.to_string();
        }

        match self.imposter_word.as_deref() {
            Some(word) if !word.is_empty() => word.to_string(),
            // Safety fallback
            _ => IMPOSTER_MESSAGE.to_string(),
        }
    }
}

/// Clamp a requested imposter count into `[1, players - 1]`
pub fn clamp_imposter_count(requested: usize, players: usize) -> usize {
    requested.clamp(1, players.saturating_sub(1).max(1))
}

/// Deal roles for a session.
pub fn assign<R: Rng + ?Sized>(
    players: &[String],
    words: &[String],
    imposter_count: usize,
    stealth: bool,
    rng: &mut R,
) -> SessionResult<RoleAssignment> {
    let n = players.len();
    if n < MIN_PLAYERS {
        return Err(SessionError::InvalidConfiguration(format!(
            "need at least {} players to assign roles, got {}",
            MIN_PLAYERS, n
        )));
    }
    if words.is_empty() {
        return Err(SessionError::InvalidConfiguration(
            "word list is empty".to_string(),
        ));
    }

    let secret_word = words[rng.random_range(0..words.len())].clone();

    let k = clamp_imposter_count(imposter_count, n);
    let mut imposters = BTreeSet::new();
    while imposters.len() < k {
        imposters.insert(rng.random_range(0..n));
    }

    if imposters.len() >= n {
        return Err(SessionError::NoEligibleFirstPlayer { players: n });
    }
    let first_player_index = loop {
        let candidate = rng.random_range(0..n);
        if !imposters.contains(&candidate) {
            break candidate;
        }
    };

    let imposter_word = if stealth && k > 0 {
        let mut decoy = words[rng.random_range(0..words.len())].clone();
        // A pool with a single distinct word can't yield a different decoy
        let has_alternative = words.iter().any(|word| *word != secret_word);
        while decoy == secret_word && has_alternative {
            decoy = words[rng.random_range(0..words.len())].clone();
        }
        Some(decoy)
    } else {
        None
    };

    tracing::debug!(
        "Assigned {} imposter(s) among {} players (stealth: {})",
        k,
        n,
        stealth
    );

    Ok(RoleAssignment {
        secret_word,
        imposter_word,
        imposters,
        first_player_index,
        stealth,
    })
}
