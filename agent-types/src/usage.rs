//! Token usage accounting, aggregated across every provider call in a run.

use std::iter::Sum;
use std::ops::Add;

use serde::{Deserialize, Serialize};

/// Prompt/completion/total token counts for a single provider call, or the
/// sum across many. `TokenUsage` forms a monoid under addition with
/// `TokenUsage::default()` as the identity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt: u32,
    pub completion: u32,
    pub total: u32,
}

impl TokenUsage {
    pub fn new(prompt: u32, completion: u32, total: u32) -> Self {
        Self {
            prompt,
            completion,
            total,
        }
    }

    /// Builds usage from prompt/completion counts alone, computing `total`.
    pub fn from_parts(prompt: u32, completion: u32) -> Self {
        Self {
            prompt,
            completion,
            total: prompt.saturating_add(completion),
        }
    }
}

impl Add for TokenUsage {
    type Output = TokenUsage;

    fn add(self, rhs: Self) -> Self::Output {
        TokenUsage {
            prompt: self.prompt.saturating_add(rhs.prompt),
            completion: self.completion.saturating_add(rhs.completion),
            total: self.total.saturating_add(rhs.total),
        }
    }
}

impl Sum for TokenUsage {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(TokenUsage::default(), Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addition_is_componentwise() {
        let a = TokenUsage::new(10, 8, 18);
        let b = TokenUsage::new(5, 2, 7);
        let sum = a + b;
        assert_eq!(sum, TokenUsage::new(15, 10, 25));
    }

    #[test]
    fn default_is_additive_identity() {
        let a = TokenUsage::new(10, 8, 18);
        assert_eq!(a + TokenUsage::default(), a);
    }

    #[test]
    fn sum_over_iterator_matches_manual_fold() {
        let calls = vec![
            TokenUsage::new(10, 8, 18),
            TokenUsage::new(3, 1, 4),
            TokenUsage::new(0, 0, 0),
        ];
        let total: TokenUsage = calls.into_iter().sum();
        assert_eq!(total, TokenUsage::new(13, 9, 22));
    }

    #[test]
    fn from_parts_computes_total() {
        assert_eq!(TokenUsage::from_parts(10, 8), TokenUsage::new(10, 8, 18));
    }

    proptest::proptest! {
        #[test]
        fn addition_never_panics(
            p1 in 0u32..1_000_000, c1 in 0u32..1_000_000, t1 in 0u32..1_000_000,
            p2 in 0u32..1_000_000, c2 in 0u32..1_000_000, t2 in 0u32..1_000_000,
        ) {
            let a = TokenUsage::new(p1, c1, t1);
            let b = TokenUsage::new(p2, c2, t2);
            let sum = a + b;
            prop_assert!(sum.prompt >= a.prompt && sum.prompt >= b.prompt);
            prop_assert!(sum.completion >= a.completion && sum.completion >= b.completion);
        }
    }
}
