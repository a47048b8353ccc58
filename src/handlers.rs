//! Command dispatch
//!
//! Maps each parsed `Command` onto the session state and turns the result
//! into a `ServerMessage` for the front end to render.

use crate::error::SessionError;
use crate::protocol::{Command, ServerMessage};
use crate::reveal::{AdvanceOutcome, PressOutcome};
use crate::state::AppState;
use crate::timer::TimerSnapshot;
use crate::types::{Phase, PlayerIndex};
use std::sync::Arc;

pub fn error_message(err: &SessionError) -> ServerMessage {
    ServerMessage::Error {
        code: err.code().to_string(),
        msg: err.to_string(),
    }
}

/// Handle one command and return the response to show
pub async fn handle_command(cmd: Command, state: &Arc<AppState>) -> ServerMessage {
    match cmd {
        // Setup screen
        Command::SetNames { names } => ServerMessage::Setup {
            setup: state.set_names_input(names).await,
        },
        Command::SetImposters { count } => ServerMessage::Setup {
            setup: state.set_imposter_count(count).await,
        },
        Command::SetStealth { enabled } => ServerMessage::Setup {
            setup: state.set_stealth(enabled).await,
        },
        Command::SetTimer { seconds } => ServerMessage::Setup {
            setup: state.set_timer_seconds(seconds).await,
        },
        Command::Setup => ServerMessage::Setup {
            setup: state.setup().await,
        },

        Command::Start => match state.start_from_setup().await {
            Ok(session) => ServerMessage::State { session },
            Err(e) => {
                tracing::warn!("Failed to start game: {}", e);
                error_message(&e)
            }
        },

        // Reveal phase
        Command::Tap => handle_tap(state).await,
        Command::Next => {
            match state.advance().await {
                AdvanceOutcome::NextPlayer { index, name } => {
                    tracing::debug!("Passing device to {} ({})", name, index + 1);
                }
                AdvanceOutcome::Finished => {}
                AdvanceOutcome::Ignored => {
                    tracing::debug!("Next ignored until the current player reveals");
                }
            }
            ServerMessage::State {
                session: state.view().await,
            }
        }

        // Vote phase
        Command::StartTimer { seconds } => match state.start_vote_timer(seconds).await {
            Ok(timer) => ServerMessage::Timer { timer },
            Err(e) => error_message(&e),
        },
        Command::PauseTimer => timer_or_state(state, state.pause_vote_timer().await).await,
        Command::ResumeTimer => timer_or_state(state, state.resume_vote_timer().await).await,
        Command::StopTimer => timer_or_state(state, state.stop_vote_timer().await).await,
        Command::RevealImposters => match state.reveal_imposters().await {
            Ok(disclosure) => ServerMessage::Disclosure { disclosure },
            Err(e) => error_message(&e),
        },

        Command::Reset => {
            state.reset().await;
            ServerMessage::State {
                session: state.view().await,
            }
        }
        Command::Status => ServerMessage::State {
            session: state.view().await,
        },
    }
}

async fn handle_tap(state: &Arc<AppState>) -> ServerMessage {
    if let PressOutcome::Ignored = state.press_reveal().await {
        tracing::debug!("Tap ignored");
    }

    let session = state.view().await;
    match (session.phase, session.current_player.clone()) {
        (Phase::Revealing, Some(player)) => ServerMessage::Reveal {
            player,
            state: session.reveal_state,
            text: session.display,
        },
        _ => ServerMessage::State { session },
    }
}

/// Whether a response moved the device on from `previous_index`
pub fn device_passed(previous_index: PlayerIndex, response: &ServerMessage) -> bool {
    matches!(
        response,
        ServerMessage::State { session } if session.current_index != previous_index
    )
}

/// Timer controls with no timer running fall back to the session view
async fn timer_or_state(state: &Arc<AppState>, timer: Option<TimerSnapshot>) -> ServerMessage {
    match timer {
        Some(timer) => ServerMessage::Timer { timer },
        None => ServerMessage::State {
            session: state.view().await,
        },
    }
}
