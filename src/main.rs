use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wordimposter::config::AppConfig;
use wordimposter::handlers::{device_passed, handle_command};
use wordimposter::prefs::JsonFilePreferenceStore;
use wordimposter::protocol::{Command, ServerMessage};
use wordimposter::state::AppState;
use wordimposter::timer::{SilentAlert, TerminalBell, TimerAlert};

const HELP: &str = "\
Setup:   names <a, b, c>   imposters <n>   stealth on|off   timer <secs>   setup
Play:    start   tap (or just Enter)   next
Vote:    vote [secs]   pause   resume   stop   reveal
Other:   status   reset   help   quit";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    // Logs go to stderr so they never interleave with the game screen
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wordimposter=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = AppConfig::from_env();
    tracing::info!("Starting word imposter...");

    let prefs = Arc::new(JsonFilePreferenceStore::open(config.prefs_path.clone()));
    tracing::debug!("Preferences at {}", prefs.path().display());

    let alert: Arc<dyn TimerAlert> = if config.bell {
        Arc::new(TerminalBell)
    } else {
        Arc::new(SilentAlert)
    };
    let rng = match config.seed {
        Some(seed) => {
            tracing::debug!("Using fixed seed {}", seed);
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_os_rng(),
    };

    let state = Arc::new(AppState::new_with(
        config.session_config(),
        prefs,
        alert,
        rng,
    ));

    match config.build_word_source() {
        Ok(source) => {
            if let Err(e) = state.load_words(source.as_ref()).await {
                tracing::warn!("Word list unavailable ({}). Games cannot start.", e);
            }
        }
        Err(e) => tracing::warn!("Failed to set up word source: {}", e),
    }

    println!("{}", HELP);
    println!("{}", ServerMessage::Setup {
        setup: state.setup().await,
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt();
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::error!("Failed to read input: {}", e);
                break;
            }
        };

        match line.trim() {
            "quit" | "exit" | "q" => break,
            "help" | "?" => {
                println!("{}", HELP);
                continue;
            }
            _ => {}
        }

        let cmd = match line.parse::<Command>() {
            Ok(cmd) => cmd,
            Err(e) => {
                println!("{} (type `help` for commands)", e);
                continue;
            }
        };

        let is_next = cmd == Command::Next;
        let index_before = state.view().await.current_index;
        let response = handle_command(cmd, &state).await;

        // Hide the previous player's word before handing the device on
        if is_next && device_passed(index_before, &response) {
            print!("\x1b[2J\x1b[H");
        }
        println!("{}", response);
    }

    state.reset().await;
    tracing::info!("Goodbye");
}

fn prompt() {
    let mut out = std::io::stdout().lock();
    if write!(out, "> ").and_then(|_| out.flush()).is_err() {
        tracing::debug!("Failed to write prompt");
    }
}
