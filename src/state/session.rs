use super::AppState;
use crate::error::{SessionError, SessionResult};
use crate::protocol::{Disclosure, ImposterInfo, SessionView};
use crate::roles;
use crate::types::*;

impl AppState {
    /// Deal a new session. On error nothing changes, including any session
    /// already in progress.
    pub async fn start_game(
        &self,
        names: Vec<String>,
        imposter_count: usize,
        stealth: bool,
    ) -> SessionResult<SessionView> {
        let players: Vec<String> = names
            .into_iter()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();

        if players.len() < MIN_PLAYERS {
            return Err(SessionError::TooFewPlayers {
                required: MIN_PLAYERS,
                actual: players.len(),
            });
        }

        let words = {
            let pool = self.words.read().await;
            if !pool.is_ready() {
                return Err(SessionError::WordsUnavailable);
            }
            pool.words.clone()
        };

        let assignment = {
            let mut rng = self.rng.lock().await;
            roles::assign(&players, &words, imposter_count, stealth, &mut *rng)?
        };
        let imposters = assignment.imposters.len();

        {
            let mut session = self.session.write().await;
            self.cancel_disarm().await;
            // Dropping the timer aborts its ticker
            self.vote_timer.write().await.take();

            let mut fresh = Session::new(self.config.disarm_window);
            fresh.id = Some(ulid::Ulid::new().to_string());
            fresh.version = session.version;
            fresh.phase = session.phase;
            fresh.players = players;
            fresh.assignment = Some(assignment);
            fresh.started_at = Some(chrono::Utc::now().to_rfc3339());
            fresh.transition(Phase::Revealing);
            *session = fresh;

            tracing::info!(
                "Session {} started: {} players, {} imposter(s), stealth {}",
                session.id.as_deref().unwrap_or("-"),
                session.players.len(),
                imposters,
                stealth
            );
        }

        Ok(self.view().await)
    }

    /// Start from the stored setup inputs
    pub async fn start_from_setup(&self) -> SessionResult<SessionView> {
        let setup = self.setup.read().await.clone();
        let names = parse_player_names(&setup.names_raw);
        self.start_game(names, setup.imposter_count as usize, setup.stealth)
            .await
    }

    /// Expose the imposters. Irreversible for the rest of the session.
    pub async fn reveal_imposters(&self) -> SessionResult<Disclosure> {
        let mut session = self.session.write().await;

        match session.phase {
            Phase::Finished | Phase::Disclosed => {}
            Phase::VoteTimer => {
                let expired = match self.vote_timer.read().await.as_ref() {
                    Some(timer) => timer.status().await == TimerStatus::Expired,
                    None => true,
                };
                if !expired {
                    return Err(SessionError::InvalidPhase {
                        action: "reveal imposters before the vote timer expires",
                        phase: session.phase,
                    });
                }
            }
            phase => {
                return Err(SessionError::InvalidPhase {
                    action: "reveal imposters",
                    phase,
                })
            }
        }

        if session.phase != Phase::Disclosed {
            session.transition(Phase::Disclosed);
            tracing::info!("Imposters disclosed");
        }

        disclosure_for(&session).ok_or_else(|| {
            SessionError::InvalidConfiguration("session has no role assignment".to_string())
        })
    }

    /// Back to setup, cancelling any pending disarm or vote timer
    pub async fn reset(&self) {
        let mut session = self.session.write().await;
        self.cancel_disarm().await;
        if let Some(mut timer) = self.vote_timer.write().await.take() {
            timer.stop().await;
        }

        let version = session.version;
        *session = Session::new(self.config.disarm_window);
        session.version = version + 1;

        tracing::info!("Session reset");
    }
}

pub(super) fn disclosure_for(session: &Session) -> Option<Disclosure> {
    let assignment = session.assignment.as_ref()?;

    let imposters = assignment
        .imposters
        .iter()
        .filter_map(|&index| {
            session.players.get(index).map(|name| ImposterInfo {
                index,
                name: name.clone(),
            })
        })
        .collect();

    let (secret_word, imposter_word) = if assignment.stealth {
        (
            Some(assignment.secret_word.clone()),
            assignment.imposter_word.clone(),
        )
    } else {
        (None, None)
    };

    Some(Disclosure {
        imposters,
        secret_word,
        imposter_word,
    })
}
