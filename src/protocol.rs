use crate::prefs::SetupInput;
use crate::timer::{format_mm_ss, TimerSnapshot};
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum Command {
    SetNames {
        names: String,
    },
    SetImposters {
        count: u32,
    },
    SetStealth {
        enabled: bool,
    },
    SetTimer {
        seconds: u32,
    },
    Start,
    /// One tap on the current player's card
    Tap,
    Next,
    StartTimer {
        #[serde(default)]
        seconds: Option<u32>,
    },
    PauseTimer,
    ResumeTimer,
    StopTimer,
    RevealImposters,
    Reset,
    Status,
    Setup,
}

impl FromStr for Command {
    type Err = String;

    /// Parse a short text command, or a JSON object tagged by `"t"`
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        if line.starts_with('{') {
            return serde_json::from_str(line).map_err(|e| format!("Invalid JSON command: {}", e));
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        match word.to_lowercase().as_str() {
            // A bare Enter is a tap
            "" | "tap" | "t" => Ok(Command::Tap),
            "names" => Ok(Command::SetNames {
                names: rest.replace("\\n", "\n"),
            }),
            "imposters" | "imps" => Ok(Command::SetImposters {
                count: parse_number(rest, "imposter count")?,
            }),
            "stealth" => Ok(Command::SetStealth {
                enabled: parse_toggle(rest)?,
            }),
            "timer" => Ok(Command::SetTimer {
                seconds: parse_number(rest, "timer seconds")?,
            }),
            "start" => Ok(Command::Start),
            "next" | "n" => Ok(Command::Next),
            "vote" => Ok(Command::StartTimer {
                seconds: if rest.is_empty() {
                    None
                } else {
                    Some(parse_number(rest, "timer seconds")?)
                },
            }),
            "pause" => Ok(Command::PauseTimer),
            "resume" => Ok(Command::ResumeTimer),
            "stop" => Ok(Command::StopTimer),
            "reveal" => Ok(Command::RevealImposters),
            "reset" => Ok(Command::Reset),
            "status" => Ok(Command::Status),
            "setup" => Ok(Command::Setup),
            other => Err(format!("Unknown command: {}", other)),
        }
    }
}

fn parse_number(value: &str, what: &str) -> Result<u32, String> {
    value
        .parse()
        .map_err(|_| format!("Expected a positive number for {}, got '{}'", what, value))
}

fn parse_toggle(value: &str) -> Result<bool, String> {
    match value.to_lowercase().as_str() {
        "on" | "1" | "true" | "yes" => Ok(true),
        "off" | "0" | "false" | "no" => Ok(false),
        other => Err(format!("Expected on/off, got '{}'", other)),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImposterInfo {
    pub index: PlayerIndex,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disclosure {
    pub imposters: Vec<ImposterInfo>,
    /// Both words are only disclosed in stealth mode
    pub secret_word: Option<String>,
    pub imposter_word: Option<String>,
}

/// What the screen may show. Secret words only appear as the current
/// player's latched reveal or in the final disclosure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionView {
    pub id: Option<SessionId>,
    pub version: u64,
    pub phase: Phase,
    pub players: Vec<String>,
    pub current_index: PlayerIndex,
    pub current_player: Option<String>,
    pub reveal_state: RevealState,
    pub display: Option<String>,
    pub imposter_count: usize,
    pub stealth: bool,
    /// Announced once everyone has seen their role
    pub first_player: Option<String>,
    pub timer: Option<TimerSnapshot>,
    pub disclosure: Option<Disclosure>,
    pub started_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ServerMessage {
    State {
        session: SessionView,
    },
    Setup {
        setup: SetupInput,
    },
    Reveal {
        player: String,
        state: RevealState,
        text: Option<String>,
    },
    Timer {
        timer: TimerSnapshot,
    },
    Disclosure {
        disclosure: Disclosure,
    },
    Error {
        code: String,
        msg: String,
    },
}

impl fmt::Display for Disclosure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plural = self.imposters.len() != 1;
        writeln!(
            f,
            "The imposter{}:",
            if plural { "s were" } else { " was" }
        )?;
        for imposter in &self.imposters {
            writeln!(f, "  - {}", imposter.name)?;
        }
        if let (Some(secret), Some(decoy)) = (&self.secret_word, &self.imposter_word) {
            write!(
                f,
                "(Stealth mode: imposters saw \"{}\", civilians saw \"{}\".)",
                decoy, secret
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerMessage::State { session } => fmt_session(f, session),
            ServerMessage::Setup { setup } => {
                let names = parse_player_names(&setup.names_raw);
                writeln!(f, "Players ({}): {}", names.len(), names.join(", "))?;
                writeln!(f, "Imposters: {}", setup.imposter_count)?;
                writeln!(f, "Stealth: {}", if setup.stealth { "on" } else { "off" })?;
                write!(f, "Vote timer: {}", format_mm_ss(setup.timer_seconds))
            }
            ServerMessage::Reveal {
                player,
                state,
                text,
            } => match (state, text) {
                (RevealState::Revealed, Some(text)) => write!(f, "{} >>> {} <<<", player, text),
                (_, Some(text)) => write!(f, "{}: {}", player, text),
                (_, None) => write!(f, "{}: -", player),
            },
            ServerMessage::Timer { timer } => {
                write!(f, "Timer {} ({:?})", timer.display, timer.status)
            }
            ServerMessage::Disclosure { disclosure } => write!(f, "{}", disclosure),
            ServerMessage::Error { code, msg } => write!(f, "Error [{}]: {}", code, msg),
        }
    }
}

fn fmt_session(f: &mut fmt::Formatter<'_>, session: &SessionView) -> fmt::Result {
    match session.phase {
        Phase::Setup => write!(f, "No game running. Enter names and type `start`."),
        Phase::Revealing => {
            writeln!(
                f,
                "Double-tap the player to reveal ({} / {})",
                session.current_index + 1,
                session.players.len()
            )?;
            write!(
                f,
                "{}: {}",
                session.current_player.as_deref().unwrap_or("?"),
                session.display.as_deref().unwrap_or("-")
            )
        }
        Phase::Finished | Phase::VoteTimer | Phase::Disclosed => {
            writeln!(f, "All players have been revealed.")?;
            if let Some(first) = &session.first_player {
                writeln!(f, "First player: {}", first)?;
            }
            write!(
                f,
                "{} imposter{} hidden among you.",
                session.imposter_count,
                if session.imposter_count == 1 { "" } else { "s" }
            )?;
            if let Some(timer) = &session.timer {
                write!(f, "\nTimer {} ({:?})", timer.display, timer.status)?;
            }
            if let Some(disclosure) = &session.disclosure {
                write!(f, "\n{}", disclosure)?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_text_commands() {
        assert_eq!("".parse::<Command>().unwrap(), Command::Tap);
        assert_eq!("tap".parse::<Command>().unwrap(), Command::Tap);
        assert_eq!("  NEXT ".parse::<Command>().unwrap(), Command::Next);
        assert_eq!(
            "names Alex, Sam\\nJamie".parse::<Command>().unwrap(),
            Command::SetNames {
                names: "Alex, Sam\nJamie".to_string()
            }
        );
        assert_eq!(
            "imposters 2".parse::<Command>().unwrap(),
            Command::SetImposters { count: 2 }
        );
        assert_eq!(
            "stealth on".parse::<Command>().unwrap(),
            Command::SetStealth { enabled: true }
        );
        assert_eq!(
            "vote".parse::<Command>().unwrap(),
            Command::StartTimer { seconds: None }
        );
        assert_eq!(
            "vote 90".parse::<Command>().unwrap(),
            Command::StartTimer { seconds: Some(90) }
        );
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!("imposters lots".parse::<Command>().is_err());
        assert!("stealth maybe".parse::<Command>().is_err());
        assert!("dance".parse::<Command>().is_err());
        assert!("{\"t\":\"dance\"}".parse::<Command>().is_err());
    }

    #[test]
    fn test_parse_json_commands() {
        assert_eq!(
            r#"{"t":"start_timer","seconds":30}"#.parse::<Command>().unwrap(),
            Command::StartTimer { seconds: Some(30) }
        );
        assert_eq!(
            r#"{"t":"start_timer"}"#.parse::<Command>().unwrap(),
            Command::StartTimer { seconds: None }
        );
        assert_eq!(
            r#"{"t":"reveal_imposters"}"#.parse::<Command>().unwrap(),
            Command::RevealImposters
        );
    }

    #[test]
    fn test_server_message_tagging() {
        let msg = ServerMessage::Error {
            code: "TOO_FEW_PLAYERS".to_string(),
            msg: "Need at least 3 players, got 2".to_string(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["t"], "error");
        assert_eq!(json["code"], "TOO_FEW_PLAYERS");
    }

    #[test]
    fn test_disclosure_display() {
        let disclosure = Disclosure {
            imposters: vec![ImposterInfo {
                index: 1,
                name: "Sam".to_string(),
            }],
            secret_word: Some("apple".to_string()),
            imposter_word: Some("moon".to_string()),
        };

        let text = disclosure.to_string();
        assert!(text.starts_with("The imposter was:"));
        assert!(text.contains("Sam"));
        assert!(text.contains("imposters saw \"moon\", civilians saw \"apple\""));
    }
}
