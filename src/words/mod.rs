use std::time::Duration;

use crate::config::WordsConfig;
use crate::error::{GameError, Result};

/// Client for the random-word and dictionary services used by hangman and
/// wordle
pub struct WordClient {
    config: WordsConfig,
    client: reqwest::Client,
}

impl WordClient {
    pub fn new(config: WordsConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| GameError::internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Fetches one random lower-case word of `length` letters
    pub async fn random_word(&self, length: usize) -> Result<String> {
        let url = format!(
            "{}/word?length={}",
            self.config.word_api_url.trim_end_matches('/'),
            length
        );

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(GameError::Transport(format!(
                "Word service returned {}",
                response.status()
            )));
        }

        let words: Vec<String> = response.json().await.map_err(|e| {
            GameError::Transport(format!("Failed to parse word service response: {}", e))
        })?;

        let word = words
            .into_iter()
            .next()
            .map(|w| w.to_lowercase())
            .ok_or_else(|| GameError::transport("Word service returned no words"))?;

        tracing::debug!(length, "Fetched random word");
        Ok(word)
    }

    /// Whether the dictionary knows `word`. Lookups that fail count as
    /// unknown.
    pub async fn is_valid(&self, word: &str) -> bool {
        let url = format!(
            "{}/{}",
            self.config.dictionary_api_url.trim_end_matches('/'),
            urlencoding::encode(&word.to_lowercase())
        );

        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::warn!(word = %word, error = %e, "Dictionary lookup failed");
                false
            }
        }
    }
}
