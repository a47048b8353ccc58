//! Runtime configuration from environment variables (and `.env`)

use crate::types::{SessionConfig, DEFAULT_DISARM_WINDOW};
use crate::words::{FileWordSource, HttpWordSource, WordResult, WordSource};
use std::path::PathBuf;
use std::time::Duration;

const MIN_DISARM_MS: u64 = 100;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Word list path, or an http(s) URL
    pub words_location: String,
    pub prefs_path: PathBuf,
    pub disarm_window: Duration,
    /// Fixed seed for reproducible deals
    pub seed: Option<u64>,
    pub bell: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            words_location: "words.txt".to_string(),
            prefs_path: PathBuf::from(".wordimposter-prefs.json"),
            disarm_window: DEFAULT_DISARM_WINDOW,
            seed: None,
            bell: true,
        }
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            words_location: env_non_empty("WORDIMPOSTER_WORDS").unwrap_or(defaults.words_location),
            prefs_path: env_non_empty("WORDIMPOSTER_PREFS")
                .map(PathBuf::from)
                .unwrap_or(defaults.prefs_path),
            disarm_window: env_non_empty("WORDIMPOSTER_DISARM_MS")
                .and_then(|s| s.parse::<u64>().ok())
                .map(|ms| Duration::from_millis(ms.max(MIN_DISARM_MS)))
                .unwrap_or(defaults.disarm_window),
            seed: env_non_empty("WORDIMPOSTER_SEED").and_then(|s| s.parse().ok()),
            bell: env_non_empty("WORDIMPOSTER_BELL")
                .map(|s| s != "0")
                .unwrap_or(defaults.bell),
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            disarm_window: self.disarm_window,
        }
    }

    /// Pick the word source matching the configured location
    pub fn build_word_source(&self) -> WordResult<Box<dyn WordSource>> {
        let location = &self.words_location;
        if location.starts_with("http://") || location.starts_with("https://") {
            Ok(Box::new(HttpWordSource::new(location.clone())?))
        } else {
            Ok(Box::new(FileWordSource::new(location)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const KEYS: [&str; 5] = [
        "WORDIMPOSTER_WORDS",
        "WORDIMPOSTER_PREFS",
        "WORDIMPOSTER_DISARM_MS",
        "WORDIMPOSTER_SEED",
        "WORDIMPOSTER_BELL",
    ];

    fn clear_env() {
        for key in KEYS {
            std::env::remove_var(key);
        }
    }

    fn set_env(key: &str, value: &str) {
        std::env::set_var(key, value);
    }

    #[test]
    #[serial]
    fn test_defaults_without_env() {
        clear_env();
        let config = AppConfig::from_env();

        assert_eq!(config.words_location, "words.txt");
        assert_eq!(config.disarm_window, Duration::from_millis(1500));
        assert!(config.seed.is_none());
        assert!(config.bell);
    }

    #[test]
    #[serial]
    fn test_reads_env() {
        clear_env();
        set_env("WORDIMPOSTER_WORDS", " https://example.com/words.txt ");
        set_env("WORDIMPOSTER_PREFS", "/tmp/prefs.json");
        set_env("WORDIMPOSTER_DISARM_MS", "900");
        set_env("WORDIMPOSTER_SEED", "1234");
        set_env("WORDIMPOSTER_BELL", "0");

        let config = AppConfig::from_env();
        clear_env();

        assert_eq!(config.words_location, "https://example.com/words.txt");
        assert_eq!(config.prefs_path, PathBuf::from("/tmp/prefs.json"));
        assert_eq!(config.disarm_window, Duration::from_millis(900));
        assert_eq!(config.seed, Some(1234));
        assert!(!config.bell);
    }

    #[test]
    #[serial]
    fn test_invalid_values_fall_back() {
        clear_env();
        set_env("WORDIMPOSTER_DISARM_MS", "soon");
        set_env("WORDIMPOSTER_SEED", "-1");
        set_env("WORDIMPOSTER_WORDS", "   ");

        let config = AppConfig::from_env();
        clear_env();

        assert_eq!(config.disarm_window, Duration::from_millis(1500));
        assert!(config.seed.is_none());
        assert_eq!(config.words_location, "words.txt");
    }

    #[test]
    #[serial]
    fn test_disarm_window_has_floor() {
        clear_env();
        set_env("WORDIMPOSTER_DISARM_MS", "5");
        let config = AppConfig::from_env();
        clear_env();

        assert_eq!(config.disarm_window, Duration::from_millis(100));
    }

    #[test]
    fn test_build_word_source() {
        let config = AppConfig::default();
        let source = config.build_word_source().unwrap();
        assert_eq!(source.describe(), "words.txt");

        let config = AppConfig {
            words_location: "https://example.com/words.txt".to_string(),
            ..AppConfig::default()
        };
        let source = config.build_word_source().unwrap();
        assert_eq!(source.describe(), "https://example.com/words.txt");
    }
}
