//! The quiz engine.
//!
//! [`QuizEngine`] replays a record move by move over a [`Board`], keeps
//! newly played stones hidden from the learner, asks questions about the
//! groups each move affected and scores the answers.
//!
//! ## Protocol
//!
//! ```text
//! Waiting --advance()--> ShowingMove --activate_questions()--> Questioning
//!                                                          \-> Comparing
//! Questioning --last answer--> Comparing | Waiting | Finished
//! ```
//!
//! Liberty-count and comparison questions use a retry-until-correct loop:
//! a wrong answer is scored once, the value is blocked and the same
//! question stays active. Liberty-marking questions are scored once and
//! always move on.
//!
//! Calling an answer method without a matching active question, or
//! advancing while questions are pending, is a caller bug and panics.
//!
//! ## Replay
//!
//! Scheduling only draws from the engine's own [`Sequence`], seeded from
//! the record text, so [`QuizEngine::from_replay`] can rebuild a session
//! from nothing but the list of first-try results.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use thiserror::Error;

use crate::board::{Board, Color, MoveError, SignMap, Vertex};
use crate::config::{QuestionGate, QuizConfig, QuizMode};
use crate::constants::{JUST_ASKED, MAX_LIBERTIES, MAX_STALENESS};
use crate::record::{self, GameRecord, Placement, RecordError};
use crate::rng::{Sequence, hash_text};
use crate::scheduler::{Comparison, Side, pair_comparisons, schedule};
use crate::scorer::{Baseline, GroupScore, LibertySnapshot, score_groups, snapshot};

/// Errors raised while building an engine. Nothing is returned on failure.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error("invalid setup stone: {0}")]
    Setup(#[from] MoveError),
    #[error("record has no moves to play")]
    NoMoves,
}

/// A non-pass move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Stone {
    pub color: Color,
    pub vertex: Vertex,
}

/// A stone on the true board that the learner has not been shown yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InvisibleStone {
    pub color: Color,
    pub vertex: Vertex,
    /// 1-based number of the move that placed it.
    pub move_number: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Question {
    /// How many liberties does the group at `vertex` have? `liberties` is
    /// already capped at [`MAX_LIBERTIES`].
    Liberties { vertex: Vertex, liberties: usize },
    /// Mark every liberty of the group at `vertex`.
    Mark {
        vertex: Vertex,
        liberties: BTreeSet<Vertex>,
    },
    /// Which of two adjacent groups has fewer liberties?
    Compare(Comparison),
}

impl Question {
    /// Target stone of a liberty or marking question.
    pub fn vertex(&self) -> Option<Vertex> {
        match self {
            Question::Liberties { vertex, .. } | Question::Mark { vertex, .. } => Some(*vertex),
            Question::Compare(_) => None,
        }
    }
}

/// First-try result of a question.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Correct,
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnswerOutcome {
    Correct,
    Wrong,
    /// The value was already rejected for this question; nothing was scored.
    Blocked,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarkOutcome {
    /// Marked points that are not liberties.
    pub false_positives: Vec<Vertex>,
    /// Liberties that were not marked.
    pub false_negatives: Vec<Vertex>,
}

impl MarkOutcome {
    pub fn penalty(&self) -> usize {
        self.false_positives.len() + self.false_negatives.len()
    }

    pub fn is_correct(&self) -> bool {
        self.penalty() == 0
    }
}

/// Questions generated for one move and how they went.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MoveProgress {
    pub total: usize,
    pub results: Vec<Outcome>,
}

/// Returned by [`QuizEngine::advance`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoveSnapshot {
    /// 1-based index of the move just played.
    pub move_index: usize,
    pub total_moves: usize,
    pub current_move: Stone,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Before the first move, or after a move's questions are done.
    Waiting,
    ShowingMove,
    Questioning,
    Comparing,
    Finished,
}

#[derive(Debug)]
pub struct QuizEngine {
    config: QuizConfig,
    moves: Vec<Placement>,
    rng: Sequence,

    /// Setup stones only; never changes.
    initial: Board,
    /// Every move played so far, hidden stones included.
    board: Board,
    /// What the learner sees. Only rewritten by `materialize`.
    base_signs: SignMap,
    invisible: BTreeMap<Vertex, InvisibleStone>,
    staleness: BTreeMap<Vertex, u8>,

    move_index: usize,
    current_move: Option<Stone>,
    phase: Phase,
    scores: Vec<GroupScore>,
    pending: VecDeque<Question>,
    active: Option<Question>,
    retrying: bool,
    blocked_counts: Vec<usize>,
    blocked_sides: Vec<Side>,

    correct: usize,
    wrong: usize,
    mistakes: usize,
    results: Vec<Outcome>,
    progress: Vec<MoveProgress>,
    question_counts: Vec<usize>,
}

impl QuizEngine {
    /// Parse `text` and build an engine seeded from it.
    pub fn new(text: &str, config: QuizConfig) -> Result<Self, EngineError> {
        let record = record::parse(text)?;
        Self::from_record(&record, hash_text(text), config)
    }

    /// Build an engine over an already parsed record, drawing from a
    /// sequence seeded with `seed`.
    ///
    /// The per-move question counts are precomputed by running a second
    /// engine with the same seed over the whole record. That engine never
    /// finishes, so it logs nothing.
    pub fn from_record(record: &GameRecord, seed: u64, config: QuizConfig) -> Result<Self, EngineError> {
        let mut engine = Self::build(record, Sequence::new(seed), config)?;
        let mut shadow = Self::build(record, Sequence::new(seed), config)?;
        while let Ok(Some(_)) = shadow.apply_next() {
            engine.question_counts.push(shadow.pending.len());
        }
        Ok(engine)
    }

    fn build(record: &GameRecord, rng: Sequence, config: QuizConfig) -> Result<Self, EngineError> {
        let moves = record.playable_moves();
        if moves.is_empty() {
            return Err(EngineError::NoMoves);
        }
        let initial = record.initial_board()?;
        Ok(Self {
            config,
            moves,
            rng,
            base_signs: initial.sign_map(),
            board: initial.clone(),
            initial,
            invisible: BTreeMap::new(),
            staleness: BTreeMap::new(),
            move_index: 0,
            current_move: None,
            phase: Phase::Waiting,
            scores: Vec::new(),
            pending: VecDeque::new(),
            active: None,
            retrying: false,
            blocked_counts: Vec::new(),
            blocked_sides: Vec::new(),
            correct: 0,
            wrong: 0,
            mistakes: 0,
            results: Vec::new(),
            progress: Vec::new(),
            question_counts: Vec::new(),
        })
    }

    /// Rebuild a session from its first-try results.
    ///
    /// Each `true` answers the next question correctly; each `false` first
    /// submits a wrong answer of the right kind, then the correct one.
    ///
    /// No move is played once the history is used up: if it runs out
    /// mid-move the engine is left on the pending question, otherwise it
    /// waits on the last move answered.
    pub fn from_replay(text: &str, history: &[bool], config: QuizConfig) -> Result<Self, EngineError> {
        let mut engine = Self::new(text, config)?;
        let mut answers = history.iter().copied().peekable();
        'moves: while answers.peek().is_some() && engine.advance().is_some() {
            if !engine.activate_questions() {
                continue;
            }
            while let Some(question) = engine.active.clone() {
                let Some(first_try) = answers.next() else {
                    break 'moves;
                };
                engine.replay_answer(&question, first_try);
            }
        }
        Ok(engine)
    }

    fn replay_answer(&mut self, question: &Question, first_try: bool) {
        match question {
            Question::Liberties { liberties, .. } => {
                if !first_try {
                    let wrong = if *liberties == 1 { 2 } else { liberties - 1 };
                    self.answer(wrong);
                }
                self.answer(*liberties);
            }
            Question::Mark { liberties, .. } => {
                if first_try {
                    self.answer_mark(liberties);
                } else {
                    self.answer_mark(&BTreeSet::new());
                }
            }
            Question::Compare(pair) => {
                let right = pair.answer();
                if !first_try {
                    let wrong = if right == Side::First { Side::Second } else { Side::First };
                    self.answer_comparison(wrong);
                }
                self.answer_comparison(right);
            }
        }
    }

    // =========================================================================
    // Moves
    // =========================================================================

    /// Play the next move.
    ///
    /// Returns `None` once the sequence is exhausted or the next move is
    /// illegal; either way the engine is finished.
    pub fn advance(&mut self) -> Option<MoveSnapshot> {
        assert!(
            !matches!(self.phase, Phase::Questioning | Phase::Comparing),
            "advance() called while a question is active"
        );
        assert!(
            self.phase != Phase::ShowingMove || self.pending.is_empty(),
            "advance() called before activating the questions of move {}",
            self.move_index
        );
        self.play_next()
    }

    fn play_next(&mut self) -> Option<MoveSnapshot> {
        if self.phase == Phase::Finished {
            return None;
        }
        match self.apply_next() {
            Ok(Some(snap)) => Some(snap),
            Ok(None) => {
                self.finish();
                None
            }
            Err(e) => {
                log::warn!(
                    "move {} of {}: {e}; ending the sequence early",
                    self.move_index + 1,
                    self.moves.len()
                );
                self.finish();
                None
            }
        }
    }

    /// Play the next move and schedule its questions. `Ok(None)` once the
    /// sequence is exhausted; the board is left as it was on error.
    fn apply_next(&mut self) -> Result<Option<MoveSnapshot>, MoveError> {
        let Some(&next) = self.moves.get(self.move_index) else {
            return Ok(None);
        };
        let stone = Stone {
            color: next.color,
            vertex: next.vertex,
        };

        let before = snapshot(&self.board);
        let board = if next.passes > 0 {
            self.board.pass().play(stone.color, stone.vertex)?
        } else {
            self.board.play(stone.color, stone.vertex)?
        };
        self.board = board;
        self.move_index += 1;
        self.current_move = Some(stone);

        for age in self.staleness.values_mut() {
            *age = (*age + 1).min(MAX_STALENESS);
        }
        self.staleness.insert(stone.vertex, 0);
        self.invisible.insert(
            stone.vertex,
            InvisibleStone {
                color: stone.color,
                vertex: stone.vertex,
                move_number: self.move_index,
            },
        );
        let board = &self.board;
        self.invisible.retain(|v, _| board.get(*v).is_some());
        self.staleness.retain(|v, _| board.get(*v).is_some());

        self.schedule_questions(&before);
        self.progress.push(MoveProgress {
            total: self.pending.len(),
            results: Vec::new(),
        });
        self.phase = Phase::ShowingMove;

        Ok(Some(MoveSnapshot {
            move_index: self.move_index,
            total_moves: self.moves.len(),
            current_move: stone,
        }))
    }

    fn schedule_questions(&mut self, before: &LibertySnapshot) {
        let last = self.current_move.map(|m| m.vertex);
        let (baseline, eligible) = match self.config.gate {
            QuestionGate::EveryMove => (Baseline::PreMove(before), true),
            QuestionGate::FinalMove => (
                Baseline::Initial(&self.initial),
                self.move_index == self.moves.len(),
            ),
        };
        self.scores = score_groups(&self.board, last, baseline);
        self.pending.clear();
        if !eligible {
            return;
        }

        let picked = schedule(&self.scores, &self.config, &mut self.rng);
        for pick in &picked {
            let group = &self.scores[pick.group];
            for &member in &group.vertices {
                self.staleness.insert(member, JUST_ASKED);
            }
            self.pending.push_back(match self.config.mode {
                QuizMode::Mark => Question::Mark {
                    vertex: pick.vertex,
                    liberties: group.liberties.clone(),
                },
                QuizMode::Count | QuizMode::Compare => Question::Liberties {
                    vertex: pick.vertex,
                    liberties: group.reported_liberties(),
                },
            });
        }

        if let (QuizMode::Compare, Some(mover)) = (self.config.mode, self.current_move) {
            let pairs = pair_comparisons(
                &self.board,
                &self.scores,
                &picked,
                mover.color,
                &self.config,
                &mut self.rng,
            );
            self.pending.extend(pairs.into_iter().map(Question::Compare));
        }
    }

    fn finish(&mut self) {
        self.phase = Phase::Finished;
        self.active = None;
        self.pending.clear();
        self.materialize();
        log::info!(
            "finished after {} of {} moves: {} correct, {} wrong",
            self.move_index,
            self.moves.len(),
            self.correct,
            self.wrong
        );
    }

    /// Reveal every hidden stone at once, per the current true board.
    pub fn materialize(&mut self) {
        log::trace!("materializing {} hidden stones", self.invisible.len());
        self.base_signs = self.board.sign_map();
        self.invisible.clear();
        self.staleness.clear();
    }

    // =========================================================================
    // Questions
    // =========================================================================

    /// Start on the questions of the move being shown.
    ///
    /// Returns `false` if the move has none; the engine then waits for the
    /// next [`advance`](Self::advance), or finishes after the last move.
    pub fn activate_questions(&mut self) -> bool {
        assert_eq!(
            self.phase,
            Phase::ShowingMove,
            "activate_questions() called while not showing a move"
        );
        self.next_question()
    }

    fn next_question(&mut self) -> bool {
        self.retrying = false;
        self.blocked_counts.clear();
        self.blocked_sides.clear();
        match self.pending.pop_front() {
            Some(question) => {
                log::debug!("move {}: asking {:?}", self.move_index, question);
                self.phase = match question {
                    Question::Compare(_) => Phase::Comparing,
                    _ => Phase::Questioning,
                };
                self.active = Some(question);
                true
            }
            None => {
                self.active = None;
                if self.move_index >= self.moves.len() {
                    self.finish();
                } else {
                    self.phase = Phase::Waiting;
                }
                false
            }
        }
    }

    fn record(&mut self, outcome: Outcome) {
        self.results.push(outcome);
        if let Some(progress) = self.progress.last_mut() {
            progress.results.push(outcome);
        }
    }

    fn resolve_correct(&mut self) {
        self.correct += 1;
        if !self.retrying {
            self.record(Outcome::Correct);
        }
        self.next_question();
    }

    fn reject(&mut self) {
        self.mistakes += 1;
        if !self.retrying {
            self.retrying = true;
            self.wrong += 1;
            self.record(Outcome::Failed);
        }
    }

    /// Answer a liberty-count question. Values above the ceiling count as
    /// the ceiling.
    pub fn answer(&mut self, value: usize) -> AnswerOutcome {
        let expected = match &self.active {
            Some(Question::Liberties { liberties, .. }) => *liberties,
            other => panic!("answer() called without an active liberty question: {other:?}"),
        };
        let value = value.min(MAX_LIBERTIES);
        if value == expected {
            self.resolve_correct();
            AnswerOutcome::Correct
        } else if self.blocked_counts.contains(&value) {
            AnswerOutcome::Blocked
        } else {
            self.blocked_counts.push(value);
            self.reject();
            AnswerOutcome::Wrong
        }
    }

    /// Answer a liberty-marking question. Scored once; the engine always
    /// moves on.
    pub fn answer_mark(&mut self, marked: &BTreeSet<Vertex>) -> MarkOutcome {
        let outcome = match &self.active {
            Some(Question::Mark { liberties, .. }) => MarkOutcome {
                false_positives: marked.difference(liberties).copied().collect(),
                false_negatives: liberties.difference(marked).copied().collect(),
            },
            other => panic!("answer_mark() called without an active marking question: {other:?}"),
        };
        if outcome.is_correct() {
            self.correct += 1;
            self.record(Outcome::Correct);
        } else {
            self.wrong += 1;
            self.mistakes += 1;
            self.record(Outcome::Failed);
        }
        self.next_question();
        outcome
    }

    /// Answer a comparison question.
    pub fn answer_comparison(&mut self, choice: Side) -> AnswerOutcome {
        let expected = match &self.active {
            Some(Question::Compare(pair)) => pair.answer(),
            other => panic!("answer_comparison() called without an active comparison: {other:?}"),
        };
        if choice == expected {
            self.resolve_correct();
            AnswerOutcome::Correct
        } else if self.blocked_sides.contains(&choice) {
            AnswerOutcome::Blocked
        } else {
            self.blocked_sides.push(choice);
            self.reject();
            AnswerOutcome::Wrong
        }
    }

    // =========================================================================
    // Read-only state
    // =========================================================================

    pub fn config(&self) -> &QuizConfig {
        &self.config
    }

    pub fn board_size(&self) -> usize {
        self.board.size()
    }

    pub fn move_index(&self) -> usize {
        self.move_index
    }

    /// Nominal number of moves; an illegal move can end the session sooner.
    pub fn total_moves(&self) -> usize {
        self.moves.len()
    }

    pub fn current_move(&self) -> Option<Stone> {
        self.current_move
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    pub fn is_showing_move(&self) -> bool {
        self.phase == Phase::ShowingMove
    }

    pub fn is_retrying(&self) -> bool {
        self.retrying
    }

    pub fn question(&self) -> Option<&Question> {
        self.active.as_ref()
    }

    pub fn question_vertex(&self) -> Option<Vertex> {
        self.active.as_ref().and_then(Question::vertex)
    }

    pub fn comparison_pair(&self) -> Option<&Comparison> {
        match &self.active {
            Some(Question::Compare(pair)) => Some(pair),
            _ => None,
        }
    }

    pub fn correct(&self) -> usize {
        self.correct
    }

    /// Questions whose first answer was wrong.
    pub fn wrong(&self) -> usize {
        self.wrong
    }

    /// Every wrong submission, retries included.
    pub fn mistakes(&self) -> usize {
        self.mistakes
    }

    pub fn results(&self) -> &[Outcome] {
        &self.results
    }

    /// The replay history of this session.
    pub fn history(&self) -> Vec<bool> {
        self.results.iter().map(|&o| o == Outcome::Correct).collect()
    }

    pub fn move_progress(&self) -> &[MoveProgress] {
        &self.progress
    }

    /// Questions each move will generate, for progress display.
    pub fn question_counts(&self) -> &[usize] {
        &self.question_counts
    }

    pub fn total_questions(&self) -> usize {
        self.question_counts.iter().sum()
    }

    /// The true board, hidden stones included.
    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn initial_board(&self) -> &Board {
        &self.initial
    }

    /// What the learner sees. Never includes the stone being shown as the
    /// current move unless it was materialized.
    pub fn display_sign_map(&self) -> SignMap {
        self.base_signs.clone()
    }

    /// Scored groups of the current move.
    pub fn group_scores(&self) -> &[GroupScore] {
        &self.scores
    }

    pub fn invisible_stones(&self) -> BTreeMap<Vertex, InvisibleStone> {
        self.invisible.clone()
    }

    pub fn staleness(&self) -> BTreeMap<Vertex, u8> {
        self.staleness.clone()
    }
}
