use super::AppState;
use crate::reveal::{AdvanceOutcome, PressOutcome};
use crate::types::*;
use tokio::time::Instant;

impl AppState {
    /// One tap on the current player's card
    pub async fn press_reveal(&self) -> PressOutcome {
        let now = Instant::now();
        let mut session = self.session.write().await;

        if session.phase != Phase::Revealing {
            tracing::debug!("Ignoring tap during {:?} phase", session.phase);
            return PressOutcome::Ignored;
        }

        let index = session.current_index;
        let session_id = session.id.clone();
        let outcome = {
            let Session {
                reveal, assignment, ..
            } = &mut *session;
            let Some(assignment) = assignment.as_ref() else {
                return PressOutcome::Ignored;
            };
            reveal.press(now, || assignment.message_for(index))
        };

        match &outcome {
            PressOutcome::Armed { generation } => {
                tracing::debug!("Reveal armed for player {}", index + 1);
                self.schedule_disarm(session_id, *generation).await;
            }
            PressOutcome::Revealed(_) => {
                self.cancel_disarm().await;
                session.version += 1;
                tracing::info!("Player {} revealed", index + 1);
            }
            PressOutcome::Ignored => {
                tracing::debug!("Player {} already revealed", index + 1);
            }
        }

        outcome
    }

    /// Hand the device to the next player. Only allowed once the current
    /// player has revealed.
    pub async fn advance(&self) -> AdvanceOutcome {
        let mut session = self.session.write().await;

        if session.phase != Phase::Revealing || session.reveal.state() != RevealState::Revealed {
            tracing::debug!(
                "Ignoring advance ({:?}, {:?})",
                session.phase,
                session.reveal.state()
            );
            return AdvanceOutcome::Ignored;
        }

        self.cancel_disarm().await;

        if session.current_index + 1 >= session.players.len() {
            session.current_index = session.players.len();
            session.transition(Phase::Finished);
            tracing::info!("All players revealed");
            return AdvanceOutcome::Finished;
        }

        session.current_index += 1;
        session.reveal.reset();
        session.version += 1;

        AdvanceOutcome::NextPlayer {
            index: session.current_index,
            name: session.players[session.current_index].clone(),
        }
    }

    /// Replace any pending disarm with a new one for `generation`
    async fn schedule_disarm(&self, session_id: Option<SessionId>, generation: u64) {
        let session = self.session.clone();
        let window = self.config.disarm_window;

        let handle = tokio::spawn(async move {
            tokio::time::sleep(window).await;

            let mut session = session.write().await;
            if session.id != session_id {
                return;
            }
            if session.reveal.disarm(generation) {
                session.version += 1;
                tracing::debug!("Reveal disarmed after {:?}", window);
            }
        });

        if let Some(previous) = self.disarm_task.lock().await.replace(handle) {
            previous.abort();
        }
    }

    pub(super) async fn cancel_disarm(&self) {
        if let Some(handle) = self.disarm_task.lock().await.take() {
            handle.abort();
        }
    }
}
