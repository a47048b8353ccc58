mod reveal;
mod session;
mod setup;
mod vote;

use crate::prefs::{MemoryPreferenceStore, PreferenceStore, SetupInput};
use crate::protocol::SessionView;
use crate::timer::{CountdownTimer, SilentAlert, TimerAlert};
use crate::types::*;
use crate::words::{WordPool, WordResult, WordSource};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;

/// Shared session state.
///
/// Lock order, where more than one is held: `session`, then `vote_timer`,
/// then `disarm_task`.
#[derive(Clone)]
pub struct AppState {
    pub config: SessionConfig,
    pub session: Arc<RwLock<Session>>,
    pub vote_timer: Arc<RwLock<Option<CountdownTimer>>>,
    pub words: Arc<RwLock<WordPool>>,
    pub setup: Arc<RwLock<SetupInput>>,
    prefs: Arc<dyn PreferenceStore>,
    alert: Arc<dyn TimerAlert>,
    rng: Arc<Mutex<StdRng>>,
    /// Pending disarm timeout for the current player, if armed
    disarm_task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl AppState {
    pub fn new() -> Self {
        Self::new_with(
            SessionConfig::default(),
            Arc::new(MemoryPreferenceStore::new()),
            Arc::new(SilentAlert),
            StdRng::from_os_rng(),
        )
    }

    /// Deterministic deals, for tests and replays
    pub fn with_seed(seed: u64) -> Self {
        Self::new_with(
            SessionConfig::default(),
            Arc::new(MemoryPreferenceStore::new()),
            Arc::new(SilentAlert),
            StdRng::seed_from_u64(seed),
        )
    }

    pub fn new_with(
        config: SessionConfig,
        prefs: Arc<dyn PreferenceStore>,
        alert: Arc<dyn TimerAlert>,
        rng: StdRng,
    ) -> Self {
        let setup = SetupInput::load(prefs.as_ref());

        Self {
            session: Arc::new(RwLock::new(Session::new(config.disarm_window))),
            vote_timer: Arc::new(RwLock::new(None)),
            words: Arc::new(RwLock::new(WordPool::default())),
            setup: Arc::new(RwLock::new(setup)),
            config,
            prefs,
            alert,
            rng: Arc::new(Mutex::new(rng)),
            disarm_task: Arc::new(Mutex::new(None)),
        }
    }

    /// Load the word pool. On failure the pool is left empty and unloaded.
    pub async fn load_words(&self, source: &dyn WordSource) -> WordResult<usize> {
        match source.load().await {
            Ok(words) => {
                let count = words.len();
                *self.words.write().await = WordPool {
                    words,
                    loaded: true,
                };
                tracing::info!("Loaded {} words from {}", count, source.describe());
                Ok(count)
            }
            Err(e) => {
                tracing::error!("Failed to load words from {}: {}", source.describe(), e);
                *self.words.write().await = WordPool::default();
                Err(e)
            }
        }
    }

    /// Replace the word pool directly
    pub async fn set_words(&self, words: Vec<String>) {
        let loaded = !words.is_empty();
        *self.words.write().await = WordPool { words, loaded };
    }

    /// Snapshot of everything the screen may show
    pub async fn view(&self) -> SessionView {
        let session = self.session.read().await;
        let timer = match self.vote_timer.read().await.as_ref() {
            Some(timer) => Some(timer.snapshot().await),
            None => None,
        };

        SessionView {
            id: session.id.clone(),
            version: session.version,
            phase: session.phase,
            players: session.players.clone(),
            current_index: session.current_index,
            current_player: session.current_player().map(str::to_string),
            reveal_state: session.reveal.state(),
            display: match session.phase {
                Phase::Revealing => session.reveal.display().map(str::to_string),
                _ => None,
            },
            imposter_count: session.imposter_count(),
            stealth: session
                .assignment
                .as_ref()
                .map(|a| a.stealth)
                .unwrap_or(false),
            first_player: match session.phase {
                Phase::Finished | Phase::VoteTimer | Phase::Disclosed => session
                    .assignment
                    .as_ref()
                    .and_then(|a| session.players.get(a.first_player_index))
                    .cloned(),
                _ => None,
            },
            timer,
            disclosure: match session.phase {
                Phase::Disclosed => session::disclosure_for(&session),
                _ => None,
            },
            started_at: session.started_at.clone(),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
