//! Quiz configuration.

use clap::ValueEnum;

use crate::constants::{DEFAULT_COMPARISON_THRESHOLD, DEFAULT_MAX_QUESTIONS};

/// Which question kinds a session asks.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum QuizMode {
    /// Liberty-count questions only.
    Count,
    /// Liberty-count questions followed by comparison questions.
    Compare,
    /// Liberty-marking questions only.
    Mark,
}

/// Which moves are allowed to generate questions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum QuestionGate {
    /// Every move; "changed" means changed by that move.
    EveryMove,
    /// Only the last move; "changed" means different from the starting position.
    FinalMove,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct QuizConfig {
    pub mode: QuizMode,
    /// Per-move cap on questions of each kind. `0` disables quizzing.
    pub max_questions: usize,
    pub gate: QuestionGate,
    /// Drop groups at or above the liberty ceiling when other questions remain.
    pub skip_saturated: bool,
    /// Largest liberty difference a comparison pair may have.
    pub comparison_threshold: usize,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            mode: QuizMode::Count,
            max_questions: DEFAULT_MAX_QUESTIONS,
            gate: QuestionGate::EveryMove,
            skip_saturated: true,
            comparison_threshold: DEFAULT_COMPARISON_THRESHOLD,
        }
    }
}

impl QuizConfig {
    pub fn with_mode(mut self, mode: QuizMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_max_questions(mut self, max_questions: usize) -> Self {
        self.max_questions = max_questions;
        self
    }

    pub fn with_gate(mut self, gate: QuestionGate) -> Self {
        self.gate = gate;
        self
    }

    /// A pure playback session.
    pub fn playback() -> Self {
        Self::default().with_max_questions(0)
    }
}
