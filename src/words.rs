//! Word list loading.
//!
//! A word list is line-delimited text; every non-blank trimmed line is one
//! candidate secret word.

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Result type for word source operations
pub type WordResult<T> = Result<T, WordSourceError>;

#[derive(Debug, thiserror::Error)]
pub enum WordSourceError {
    #[error("Failed to read word list: {0}")]
    Io(#[from] std::io::Error),

    #[error("Word list request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Word list request returned status {0}")]
    Status(u16),

    #[error("Word list is empty")]
    Empty,
}

/// Anything that can hand over the raw word list text
#[async_trait]
pub trait WordSource: Send + Sync {
    async fn fetch_text(&self) -> WordResult<String>;

    /// Human-readable origin for logs
    fn describe(&self) -> String;

    /// Fetch and parse, rejecting lists with no usable words
    async fn load(&self) -> WordResult<Vec<String>> {
        let text = self.fetch_text().await?;
        let words = parse_word_list(&text);
        if words.is_empty() {
            return Err(WordSourceError::Empty);
        }
        Ok(words)
    }
}

/// Split on line breaks, trim, drop blank lines
pub fn parse_word_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

pub struct FileWordSource {
    path: PathBuf,
}

impl FileWordSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl WordSource for FileWordSource {
    async fn fetch_text(&self) -> WordResult<String> {
        Ok(tokio::fs::read_to_string(&self.path).await?)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

pub struct HttpWordSource {
    url: String,
    client: reqwest::Client,
}

impl HttpWordSource {
    pub fn new(url: String) -> WordResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()?;
        Ok(Self::with_client(url, client))
    }

    pub fn with_client(url: String, client: reqwest::Client) -> Self {
        Self { url, client }
    }
}

#[async_trait]
impl WordSource for HttpWordSource {
    async fn fetch_text(&self) -> WordResult<String> {
        let response = self.client.get(&self.url).send().await?;
        if !response.status().is_success() {
            return Err(WordSourceError::Status(response.status().as_u16()));
        }
        Ok(response.text().await?)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// In-memory list, handy for tests and embedded defaults
pub struct StaticWordSource {
    text: String,
}

impl StaticWordSource {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait]
impl WordSource for StaticWordSource {
    async fn fetch_text(&self) -> WordResult<String> {
        Ok(self.text.clone())
    }

    fn describe(&self) -> String {
        "built-in list".to_string()
    }
}

/// Words available to the next deal
#[derive(Debug, Clone, Default)]
pub struct WordPool {
    pub words: Vec<String>,
    pub loaded: bool,
}

impl WordPool {
    pub fn is_ready(&self) -> bool {
        self.loaded && !self.words.is_empty()
    }
}
