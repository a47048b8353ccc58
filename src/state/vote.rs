use super::AppState;
use crate::error::{SessionError, SessionResult};
use crate::prefs::normalize_timer_seconds;
use crate::timer::{CountdownTimer, TimerSnapshot};
use crate::types::*;

impl AppState {
    /// Begin (or restart after expiry) the debate countdown. `None` uses the
    /// duration from setup.
    pub async fn start_vote_timer(&self, seconds: Option<u32>) -> SessionResult<TimerSnapshot> {
        let duration = match seconds {
            Some(seconds) => normalize_timer_seconds(seconds),
            None => self.setup.read().await.timer_seconds,
        };

        let mut session = self.session.write().await;
        match session.phase {
            Phase::Finished => {
                let mut timer = self.new_vote_timer(session.id.clone());
                timer.start(duration).await;
                let snapshot = timer.snapshot().await;

                *self.vote_timer.write().await = Some(timer);
                session.transition(Phase::VoteTimer);
                Ok(snapshot)
            }
            Phase::VoteTimer => {
                let mut slot = self.vote_timer.write().await;
                let timer = slot.get_or_insert_with(|| self.new_vote_timer(session.id.clone()));
                if timer.start(duration).await {
                    session.version += 1;
                }
                Ok(timer.snapshot().await)
            }
            phase => Err(SessionError::InvalidPhase {
                action: "start the vote timer",
                phase,
            }),
        }
    }

    pub async fn pause_vote_timer(&self) -> Option<TimerSnapshot> {
        let mut session = self.session.write().await;
        let mut slot = self.vote_timer.write().await;
        let timer = slot.as_mut()?;

        if timer.pause().await {
            session.version += 1;
        }
        Some(timer.snapshot().await)
    }

    pub async fn resume_vote_timer(&self) -> Option<TimerSnapshot> {
        let mut session = self.session.write().await;
        let mut slot = self.vote_timer.write().await;
        let timer = slot.as_mut()?;

        if timer.resume().await {
            session.version += 1;
        }
        Some(timer.snapshot().await)
    }

    /// Cancel the countdown and drop back to the post-reveal screen
    pub async fn stop_vote_timer(&self) -> Option<TimerSnapshot> {
        let mut session = self.session.write().await;
        let mut timer = self.vote_timer.write().await.take()?;

        timer.stop().await;
        let snapshot = timer.snapshot().await;
        if session.phase == Phase::VoteTimer {
            session.transition(Phase::Finished);
        }
        Some(snapshot)
    }

    pub async fn vote_timer(&self) -> Option<TimerSnapshot> {
        match self.vote_timer.read().await.as_ref() {
            Some(timer) => Some(timer.snapshot().await),
            None => None,
        }
    }

    /// A timer whose expiries count as session changes. The watcher ends
    /// when the timer is dropped.
    fn new_vote_timer(&self, session_id: Option<SessionId>) -> CountdownTimer {
        let timer = CountdownTimer::new(self.alert.clone());
        let mut expirations = timer.expirations();
        let session = self.session.clone();

        tokio::spawn(async move {
            while expirations.changed().await.is_ok() {
                let mut session = session.write().await;
                if session.id != session_id {
                    return;
                }
                session.version += 1;
            }
        });

        timer
    }
}
