use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::rules::GameRules;

/// One "odd one out" round: the token at `answer_index` is the outlier.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    rkyv::Archive,
    rkyv::Serialize,
    rkyv::Deserialize,
)]
pub struct Puzzle {
    pub tokens: Vec<String>,
    pub answer_index: usize,
    pub category: String,
    pub explanation: String,
    #[serde(default)]
    pub completed: bool,
}

impl Puzzle {
    pub fn answer(&self) -> Option<&str> {
        self.tokens.get(self.answer_index).map(String::as_str)
    }

    pub fn token_index(&self, text: &str) -> Option<usize> {
        self.tokens.iter().position(|token| token == text)
    }

    pub fn validate(&self, rules: &GameRules) -> Result<(), PuzzleError> {
        if self.tokens.len() != rules.tokens_per_puzzle {
            return Err(PuzzleError::WrongTokenCount {
                expected: rules.tokens_per_puzzle,
                found: self.tokens.len(),
            });
        }
        let mut seen = HashSet::new();
        for (index, token) in self.tokens.iter().enumerate() {
            if token.trim().is_empty() {
                return Err(PuzzleError::BlankToken { index });
            }
            if !seen.insert(token.as_str()) {
                return Err(PuzzleError::DuplicateToken {
                    token: token.clone(),
                });
            }
        }
        if self.answer_index >= self.tokens.len() {
            return Err(PuzzleError::AnswerOutOfRange {
                answer: self.answer_index,
                len: self.tokens.len(),
            });
        }
        if self.category.trim().is_empty() {
            return Err(PuzzleError::MissingCategory);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PuzzleError {
    #[error("expected {expected} tokens, found {found}")]
    WrongTokenCount { expected: usize, found: usize },
    #[error("token {index} is blank")]
    BlankToken { index: usize },
    #[error("token '{token}' appears more than once")]
    DuplicateToken { token: String },
    #[error("answer index {answer} is outside 0..{len}")]
    AnswerOutOfRange { answer: usize, len: usize },
    #[error("missing category")]
    MissingCategory,
}
