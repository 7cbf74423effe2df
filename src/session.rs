//! Line-oriented quiz session.
//!
//! Drives a [`QuizEngine`] from text input, one line per command or
//! answer. Responses follow the GTP convention: `=` for success, `?` for
//! failure, each followed by a blank line.
//!
//! ## Input
//!
//! While a question is active, a line is read as its answer:
//! - liberty count: a number (`5` means "5 or more")
//! - liberty marking: coordinates separated by spaces or commas (`D4 E5`)
//! - comparison: `1`, `2` or `=`
//!
//! Commands: `board`, `next`, `reveal`, `peek`, `stats`, `help`, `quit`.

use std::collections::BTreeSet;
use std::io::{self, BufRead, Write};

use crate::board::{Color, SignMap, Vertex};
use crate::coord::{parse_coord, str_coord};
use crate::engine::{AnswerOutcome, Question, QuizEngine};
use crate::scheduler::Side;

const HELP: &str = "answer the prompt, or: board, next, reveal, peek, stats, help, quit";

pub struct Session {
    engine: QuizEngine,
}

impl Session {
    pub fn new(engine: QuizEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &QuizEngine {
        &self.engine
    }

    pub fn into_engine(self) -> QuizEngine {
        self.engine
    }

    /// Run the session until `quit`, end of input, or the end of the record.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut out: W) -> io::Result<()> {
        let opening = self.step();
        writeln!(out, "{opening}\n{}", self.prompt())?;
        out.flush()?;

        for line in input.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (success, message) = self.execute(line);
            let prefix = if success { '=' } else { '?' };
            writeln!(out, "{prefix} {message}\n")?;
            if line == "quit" || self.engine.is_finished() {
                break;
            }
            writeln!(out, "{}", self.prompt())?;
            out.flush()?;
        }
        out.flush()
    }

    /// Advance until a question is active, the record ends, or (in playback)
    /// one move has been shown. Returns a description of the moves played.
    fn step(&mut self) -> String {
        let size = self.engine.board_size();
        let mut shown = Vec::new();
        while self.engine.question().is_none() && !self.engine.is_finished() {
            let Some(snap) = self.engine.advance() else {
                break;
            };
            let stone = snap.current_move;
            shown.push(format!(
                "move {}/{}: {} {}",
                snap.move_index,
                snap.total_moves,
                match stone.color {
                    Color::Black => 'B',
                    Color::White => 'W',
                },
                str_coord(stone.vertex, size)
            ));
            if !self.engine.activate_questions() && self.engine.config().max_questions == 0 {
                break;
            }
        }
        if self.engine.is_finished() {
            shown.push(self.stats());
        }
        shown.join("\n")
    }

    fn prompt(&self) -> String {
        let size = self.engine.board_size();
        match self.engine.question() {
            Some(Question::Liberties { vertex, .. }) => {
                format!("liberties of {}?", str_coord(*vertex, size))
            }
            Some(Question::Mark { vertex, .. }) => {
                format!("mark the liberties of {}:", str_coord(*vertex, size))
            }
            Some(Question::Compare(pair)) => format!(
                "fewer liberties: 1) {} 2) {} or = ?",
                str_coord(pair.first, size),
                str_coord(pair.second, size)
            ),
            None if self.engine.is_finished() => "finished".to_string(),
            None => "next?".to_string(),
        }
    }

    fn stats(&self) -> String {
        let history: String = self
            .engine
            .history()
            .iter()
            .map(|&ok| if ok { '1' } else { '0' })
            .collect();
        format!(
            "move {}/{}, {} correct, {} wrong, {} mistakes, history [{}]",
            self.engine.move_index(),
            self.engine.total_moves(),
            self.engine.correct(),
            self.engine.wrong(),
            self.engine.mistakes(),
            history
        )
    }

    /// Execute one line and return (success, response).
    pub fn execute(&mut self, line: &str) -> (bool, String) {
        let size = self.engine.board_size();
        match line.to_lowercase().as_str() {
            "quit" => return (true, String::new()),
            "help" => return (true, HELP.to_string()),
            "stats" => return (true, self.stats()),
            "board" => {
                let marker = self.engine.current_move().map(|m| m.vertex);
                return (true, render(&self.engine.display_sign_map(), marker));
            }
            "reveal" => {
                self.engine.materialize();
                return (true, render(&self.engine.display_sign_map(), None));
            }
            "peek" => {
                let lines: Vec<String> = self
                    .engine
                    .group_scores()
                    .iter()
                    .map(|g| {
                        format!(
                            "{}{} {} liberties{}",
                            str_coord(g.vertices[0], size),
                            if g.vertices.len() > 1 { "+" } else { "" },
                            g.liberty_count(),
                            if g.changed { " (changed)" } else { "" }
                        )
                    })
                    .collect();
                return (true, lines.join("\n"));
            }
            "next" => {
                if self.engine.question().is_some() {
                    return (false, "answer the current question first".to_string());
                }
                return (true, self.step());
            }
            _ => {}
        }

        let Some(question) = self.engine.question().cloned() else {
            return (false, format!("unknown command: {line}"));
        };
        match question {
            Question::Liberties { .. } => match line.parse::<usize>() {
                Ok(value) => {
                    let outcome = self.engine.answer(value);
                    self.respond(outcome)
                }
                Err(_) => (false, "expected a number of liberties".to_string()),
            },
            Question::Mark { .. } => {
                let mut marked = BTreeSet::new();
                for token in line.split(|c: char| c == ',' || c.is_whitespace()) {
                    if token.is_empty() {
                        continue;
                    }
                    match parse_coord(token, size) {
                        Some(v) => {
                            marked.insert(v);
                        }
                        None => return (false, format!("invalid coordinate: {token}")),
                    }
                }
                let outcome = self.engine.answer_mark(&marked);
                let verdict = if outcome.is_correct() {
                    "correct".to_string()
                } else {
                    format!(
                        "{} off: missed [{}], extra [{}]",
                        outcome.penalty(),
                        coords(&outcome.false_negatives, size),
                        coords(&outcome.false_positives, size)
                    )
                };
                (true, self.with_step(verdict))
            }
            Question::Compare(_) => {
                let side = match line.to_lowercase().as_str() {
                    "1" | "first" => Side::First,
                    "2" | "second" => Side::Second,
                    "=" | "equal" => Side::Equal,
                    _ => return (false, "expected 1, 2 or =".to_string()),
                };
                let outcome = self.engine.answer_comparison(side);
                self.respond(outcome)
            }
        }
    }

    fn respond(&mut self, outcome: AnswerOutcome) -> (bool, String) {
        match outcome {
            AnswerOutcome::Correct => (true, self.with_step("correct".to_string())),
            AnswerOutcome::Wrong => (true, "wrong, try again".to_string()),
            AnswerOutcome::Blocked => (false, "already tried".to_string()),
        }
    }

    fn with_step(&mut self, verdict: String) -> String {
        if self.engine.question().is_some() {
            return verdict;
        }
        let moved = self.step();
        if moved.is_empty() {
            verdict
        } else {
            format!("{verdict}\n{moved}")
        }
    }
}

fn coords(vertices: &[Vertex], size: usize) -> String {
    vertices
        .iter()
        .map(|&v| str_coord(v, size))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render a sign map with coordinate labels. `marker` is drawn as `*`.
pub fn render(signs: &SignMap, marker: Option<Vertex>) -> String {
    let size = signs.len();
    let mut out = String::from("   ");
    for x in 0..size {
        out.push_str(&str_coord(Vertex::new(x, 0), size)[..1]);
        out.push(' ');
    }
    out.push('\n');
    for (y, row) in signs.iter().enumerate() {
        out.push_str(&format!("{:>2} ", size - y));
        for (x, &sign) in row.iter().enumerate() {
            let ch = if marker == Some(Vertex::new(x, y)) {
                '*'
            } else {
                match sign {
                    1 => 'X',
                    -1 => 'O',
                    _ => '.',
                }
            };
            out.push(ch);
            out.push(' ');
        }
        out.push('\n');
    }
    out
}
