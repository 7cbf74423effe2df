//! Liberty-Drill: a liberty-reading trainer for Go.
//!
//! A recorded game or problem is replayed move by move. Newly played
//! stones stay hidden, and after each move the learner is asked how many
//! liberties the affected groups have, to mark those liberties, or which
//! of two touching groups is shorter of liberties.
//!
//! ## Modules
//!
//! - [`constants`] - Answer ceiling, staleness bounds and defaults
//! - [`board`] - Board state, captures and group queries
//! - [`coord`] - Human and SGF coordinate conversions
//! - [`record`] - Game record (SGF subset) reader
//! - [`rng`] - Seeded deterministic sequence
//! - [`config`] - Quiz configuration
//! - [`scorer`] - Per-group liberty scoring
//! - [`scheduler`] - Question selection and ordering
//! - [`engine`] - The quiz state machine and replay
//! - [`session`] - Line-oriented interactive driver
//!
//! ## Example
//!
//! ```
//! use liberty_drill::config::QuizConfig;
//! use liberty_drill::engine::{AnswerOutcome, QuizEngine};
//!
//! let mut engine = QuizEngine::new("(;SZ[9];B[ee])", QuizConfig::default()).unwrap();
//! engine.advance();
//! assert!(engine.activate_questions());
//! assert_eq!(engine.answer(4), AnswerOutcome::Correct);
//! assert!(engine.is_finished());
//! ```

pub mod board;
pub mod config;
pub mod constants;
pub mod coord;
pub mod engine;
pub mod record;
pub mod rng;
pub mod scheduler;
pub mod scorer;
pub mod session;
