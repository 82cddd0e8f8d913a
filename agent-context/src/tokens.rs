//! Token counting, with a precise-then-fallback dependency-injection seam.
//!
//! `DefaultTokenCounter` tries a byte-pair-encoding counter first and
//! falls back to a character-ratio estimator when none is configured —
//! both paths are exposed so a caller can substitute a real tokenizer
//! without touching the rest of the pipeline.

use agent_types::Message;

/// Counts tokens for raw text and message sequences.
///
/// Implementations must be monotone: a substring never counts more
/// tokens than the string it's drawn from.
pub trait TokenCounter: Send + Sync {
    fn count_text(&self, text: &str) -> usize;

    fn count_messages(&self, messages: &[Message]) -> usize {
        messages.iter().map(|m| self.count_text(&m.content)).sum()
    }
}

/// Falls back to 4 characters per token — a rough but monotone estimator
/// that needs no external tokenizer.
pub struct CharRatioCounter {
    chars_per_token: usize,
}

impl Default for CharRatioCounter {
    fn default() -> Self {
        Self { chars_per_token: 4 }
    }
}

impl TokenCounter for CharRatioCounter {
    fn count_text(&self, text: &str) -> usize {
        text.chars().count().div_ceil(self.chars_per_token)
    }
}

/// A precise counter backed by an injected byte-pair-encoding function.
/// Falls back to [`CharRatioCounter`] if none is supplied.
pub struct DefaultTokenCounter {
    bpe: Option<Box<dyn Fn(&str) -> usize + Send + Sync>>,
    fallback: CharRatioCounter,
}

impl DefaultTokenCounter {
    pub fn new() -> Self {
        Self {
            bpe: None,
            fallback: CharRatioCounter::default(),
        }
    }

    /// Injects a precise tokenizer (e.g. a `tiktoken`-style BPE encoder).
    pub fn with_bpe(mut self, bpe: impl Fn(&str) -> usize + Send + Sync + 'static) -> Self {
        self.bpe = Some(Box::new(bpe));
        self
    }
}

impl Default for DefaultTokenCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenCounter for DefaultTokenCounter {
    fn count_text(&self, text: &str) -> usize {
        match &self.bpe {
            Some(f) => f(text),
            None => self.fallback.count_text(text),
        }
    }
}
