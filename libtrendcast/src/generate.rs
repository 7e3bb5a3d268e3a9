//! Post text generation
//!
//! The generation seam is a trait so callers never know which vendor
//! produced the text. [`TemplateGenerator`] is the offline fallback: it
//! works from the topic alone, appends the hashtag tail, and fits the
//! result to a target length. No network.

use async_trait::async_trait;

use crate::error::{Result, TrendcastError};

pub const DEFAULT_TARGET_LEN: usize = 757;
pub const DEFAULT_TOLERANCE: usize = 20;

/// Produces post text from a topic prompt.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, topic: &str) -> Result<String>;
}

/// Offline generator: topic lead-in, stock framing, hashtag tail.
pub struct TemplateGenerator {
    target_len: usize,
    tolerance: usize,
    hashtags: Vec<String>,
}

impl Default for TemplateGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateGenerator {
    pub fn new() -> Self {
        Self {
            target_len: DEFAULT_TARGET_LEN,
            tolerance: DEFAULT_TOLERANCE,
            hashtags: vec![
                "#crypto".to_string(),
                "#AI".to_string(),
                "#trends".to_string(),
            ],
        }
    }

    pub fn with_target(mut self, target_len: usize, tolerance: usize) -> Self {
        self.target_len = target_len;
        self.tolerance = tolerance;
        self
    }

    pub fn with_hashtags(mut self, hashtags: Vec<String>) -> Self {
        self.hashtags = hashtags;
        self
    }

    fn compose(&self, topic: &str) -> String {
        let mut text = format!(
            "{topic}. Worth watching today: sentiment is shifting fast and the usual \
             suspects are already positioning. Not financial advice, just the trend line."
        );
        if !self.hashtags.is_empty() {
            text.push_str("\n\n");
            text.push_str(&self.hashtags.join(" "));
        }
        text
    }
}

#[async_trait]
impl TextGenerator for TemplateGenerator {
    async fn generate(&self, topic: &str) -> Result<String> {
        let topic = topic.trim().trim_end_matches(['.', '!', '?']);
        if topic.is_empty() {
            return Err(TrendcastError::InvalidInput(
                "Generation topic cannot be empty".to_string(),
            ));
        }
        Ok(fit_to_target(
            &self.compose(topic),
            self.target_len,
            self.tolerance,
        ))
    }
}

/// Trim `text` so it fits within `target + tolerance` characters,
/// preferring a sentence boundary, then a word boundary. Text already
/// within bounds is returned unchanged; nothing is ever padded.
pub fn fit_to_target(text: &str, target: usize, tolerance: usize) -> String {
    let max = target + tolerance;
    if text.chars().count() <= max {
        return text.to_string();
    }

    let cut: String = text.chars().take(max).collect();

    // Byte offset and char count of the last sentence terminator; the band
    // check below is in chars, like the length limit.
    let sentence_end = cut
        .char_indices()
        .enumerate()
        .filter(|(_, (_, c))| matches!(c, '.' | '!' | '?'))
        .last();
    if let Some((char_pos, (byte_pos, _))) = sentence_end {
        // Only accept the sentence cut if it does not undershoot the band.
        if char_pos + 1 >= target.saturating_sub(tolerance) {
            return cut[..=byte_pos].trim_end().to_string();
        }
    }

    match cut.rfind(char::is_whitespace) {
        Some(pos) => cut[..pos].trim_end().to_string(),
        None => cut,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_generate_mentions_topic_and_hashtags() {
        let generator = TemplateGenerator::new();
        let text = generator.generate("Bitcoin ETF inflows").await.unwrap();
        assert!(text.starts_with("Bitcoin ETF inflows"));
        assert!(text.contains("#crypto"));
    }

    #[tokio::test]
    async fn test_generate_rejects_empty_topic() {
        let generator = TemplateGenerator::new();
        assert!(generator.generate("   ").await.is_err());
    }

    #[tokio::test]
    async fn test_generate_respects_target_length() {
        let generator = TemplateGenerator::new().with_target(120, 10);
        let long_topic = "Layer-2 rollups, restaking, modular data availability and the \
                          eternal question of whether any of it matters for fees";
        let text = generator.generate(long_topic).await.unwrap();
        assert!(text.chars().count() <= 130);
    }

    #[tokio::test]
    async fn test_custom_hashtags() {
        let generator = TemplateGenerator::new().with_hashtags(vec!["#solana".to_string()]);
        let text = generator.generate("Validator economics").await.unwrap();
        assert!(text.contains("#solana"));
        assert!(!text.contains("#crypto"));
    }

    #[test]
    fn test_fit_to_target_leaves_short_text_alone() {
        assert_eq!(fit_to_target("short", 100, 10), "short");
    }

    #[test]
    fn test_fit_to_target_prefers_sentence_boundary() {
        let text = "First sentence is here. Second sentence is also here and it runs long.";
        let fitted = fit_to_target(text, 25, 5);
        assert_eq!(fitted, "First sentence is here.");
    }

    #[test]
    fn test_fit_to_target_falls_back_to_word_boundary() {
        let text = "no punctuation at all just words going on and on and on forever";
        let fitted = fit_to_target(text, 30, 5);
        assert!(fitted.chars().count() <= 35);
        assert!(!fitted.ends_with(' '));
        assert!(text.starts_with(&fitted));
    }

    #[test]
    fn test_fit_to_target_band_is_measured_in_chars() {
        // The first sentence is 6 chars but 11 bytes; with a lower band of
        // 10 chars it must be rejected in favor of the word boundary.
        let text = "ééééé. plus more words here";
        let fitted = fit_to_target(text, 12, 2);
        assert_eq!(fitted, "ééééé. plus");
    }

    #[test]
    fn test_fit_to_target_handles_unbroken_runs() {
        let text = "x".repeat(100);
        let fitted = fit_to_target(&text, 30, 5);
        assert_eq!(fitted.chars().count(), 35);
    }
}
