//! Game record reader (SGF subset).
//!
//! Only what the trainer needs is read: the board size (`SZ`), setup
//! stones (`AB`, `AW`) and the main line of moves (`B`, `W`). At every
//! branch the first variation is followed; the others are parsed and
//! discarded. All other properties are ignored.

use thiserror::Error;

use crate::board::{Board, Color, MoveError, Vertex};
use crate::constants::{DEFAULT_BOARD_SIZE, MAX_BOARD_SIZE, MIN_BOARD_SIZE};
use crate::coord::parse_sgf_point;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("record is empty")]
    Empty,
    #[error("expected '{expected}' at byte {pos}")]
    Expected { expected: char, pos: usize },
    #[error("unexpected '{found}' at byte {pos}")]
    Unexpected { found: char, pos: usize },
    #[error("record ends inside a property value")]
    UnterminatedValue,
    #[error("record ends before the game tree is closed")]
    Unterminated,
    #[error("invalid board size {0:?}")]
    BadSize(String),
    #[error("invalid point {0:?}")]
    BadPoint(String),
}

/// A single move; `vertex` is `None` for a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub color: Color,
    pub vertex: Option<Vertex>,
}

/// A main-line move that places a stone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub color: Color,
    pub vertex: Vertex,
    /// Passes played since the previous placement.
    pub passes: usize,
}

/// A parsed record: what the quiz engine consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRecord {
    pub board_size: usize,
    pub setup: Vec<(Color, Vertex)>,
    pub moves: Vec<Move>,
}

impl GameRecord {
    /// The position before any move: setup stones only.
    pub fn initial_board(&self) -> Result<Board, MoveError> {
        let mut board = Board::new(self.board_size);
        for &(color, v) in &self.setup {
            board.set(v, Some(color))?;
        }
        Ok(board)
    }

    /// Main-line moves with passes folded into the placement that follows.
    /// Trailing passes are dropped.
    pub fn playable_moves(&self) -> Vec<Placement> {
        let mut passes = 0;
        let mut out = Vec::new();
        for m in &self.moves {
            match m.vertex {
                Some(vertex) => {
                    out.push(Placement {
                        color: m.color,
                        vertex,
                        passes,
                    });
                    passes = 0;
                }
                None => passes += 1,
            }
        }
        out
    }
}

type Property = (String, Vec<String>);
type Node = Vec<Property>;

struct Parser<'a> {
    src: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn unexpected(&self, b: u8) -> RecordError {
        RecordError::Unexpected {
            found: b as char,
            pos: self.pos,
        }
    }

    /// Parse one game tree, appending its nodes to `out` when `main` is set.
    fn parse_tree(&mut self, out: &mut Vec<Node>, main: bool) -> Result<(), RecordError> {
        self.skip_ws();
        if self.peek() != Some(b'(') {
            return Err(RecordError::Expected {
                expected: '(',
                pos: self.pos,
            });
        }
        self.pos += 1;

        // Sequence
        loop {
            self.skip_ws();
            match self.peek() {
                Some(b';') => {
                    let node = self.parse_node()?;
                    if main {
                        out.push(node);
                    }
                }
                Some(b'(') => break,
                Some(b')') => {
                    self.pos += 1;
                    return Ok(());
                }
                Some(b) => return Err(self.unexpected(b)),
                None => return Err(RecordError::Unterminated),
            }
        }

        // Variations: only the first continues the main line
        let mut first = true;
        loop {
            self.skip_ws();
            match self.peek() {
                Some(b'(') => {
                    self.parse_tree(out, main && first)?;
                    first = false;
                }
                Some(b')') => {
                    self.pos += 1;
                    return Ok(());
                }
                Some(b) => return Err(self.unexpected(b)),
                None => return Err(RecordError::Unterminated),
            }
        }
    }

    fn parse_node(&mut self) -> Result<Node, RecordError> {
        self.pos += 1; // ';'
        let mut node = Vec::new();
        loop {
            self.skip_ws();
            match self.peek() {
                Some(b) if b.is_ascii_alphabetic() => {
                    let mut ident = String::new();
                    while let Some(b) = self.peek().filter(u8::is_ascii_alphabetic) {
                        // Long-form FF[1-3] names such as "AddBlack" reduce to "AB"
                        if b.is_ascii_uppercase() {
                            ident.push(b as char);
                        }
                        self.pos += 1;
                    }
                    self.skip_ws();
                    if self.peek() != Some(b'[') {
                        return Err(RecordError::Expected {
                            expected: '[',
                            pos: self.pos,
                        });
                    }
                    let mut values = Vec::new();
                    while self.peek() == Some(b'[') {
                        values.push(self.parse_value()?);
                        self.skip_ws();
                    }
                    node.push((ident, values));
                }
                _ => return Ok(node),
            }
        }
    }

    fn parse_value(&mut self) -> Result<String, RecordError> {
        self.pos += 1; // '['
        let mut raw = Vec::new();
        loop {
            match self.peek() {
                Some(b'\\') => {
                    self.pos += 1;
                    match self.peek() {
                        Some(b) => raw.push(b),
                        None => return Err(RecordError::UnterminatedValue),
                    }
                }
                Some(b']') => {
                    self.pos += 1;
                    return Ok(String::from_utf8_lossy(&raw).into_owned());
                }
                Some(b) => raw.push(b),
                None => return Err(RecordError::UnterminatedValue),
            }
            self.pos += 1;
        }
    }
}

fn parse_size(value: &str) -> Result<usize, RecordError> {
    let head = value.split(':').next().unwrap_or_default().trim();
    match head.parse::<usize>() {
        Ok(size) if (MIN_BOARD_SIZE..=MAX_BOARD_SIZE).contains(&size) => Ok(size),
        _ => Err(RecordError::BadSize(value.to_string())),
    }
}

/// Expand a setup value, which may be a single point or an `aa:cc` rectangle.
fn setup_points(value: &str, size: usize) -> Result<Vec<Vertex>, RecordError> {
    let point = |s: &str| match parse_sgf_point(s, size) {
        Ok(Some(v)) => Ok(v),
        _ => Err(RecordError::BadPoint(value.to_string())),
    };
    match value.split_once(':') {
        Some((a, b)) => {
            let (a, b) = (point(a)?, point(b)?);
            let mut out = Vec::new();
            for y in a.y.min(b.y)..=a.y.max(b.y) {
                for x in a.x.min(b.x)..=a.x.max(b.x) {
                    out.push(Vertex::new(x, y));
                }
            }
            Ok(out)
        }
        None => Ok(vec![point(value)?]),
    }
}

/// Parse record text into its main line.
pub fn parse(text: &str) -> Result<GameRecord, RecordError> {
    if text.trim().is_empty() {
        return Err(RecordError::Empty);
    }
    let mut parser = Parser {
        src: text.as_bytes(),
        pos: 0,
    };
    let mut nodes = Vec::new();
    parser.parse_tree(&mut nodes, true)?;

    let board_size = match nodes
        .first()
        .and_then(|root| root.iter().find(|(id, _)| id == "SZ"))
        .and_then(|(_, values)| values.first())
    {
        Some(value) => parse_size(value)?,
        None => DEFAULT_BOARD_SIZE,
    };

    let mut record = GameRecord {
        board_size,
        setup: Vec::new(),
        moves: Vec::new(),
    };
    for node in &nodes {
        for (ident, values) in node {
            let color = match ident.as_str() {
                "B" | "AB" => Color::Black,
                "W" | "AW" => Color::White,
                _ => continue,
            };
            if ident.starts_with('A') {
                if !record.moves.is_empty() {
                    log::warn!("ignoring setup stones after the first move");
                    continue;
                }
                for value in values {
                    for v in setup_points(value, board_size)? {
                        record.setup.push((color, v));
                    }
                }
            } else {
                let value = values.first().map(String::as_str).unwrap_or_default();
                let vertex = parse_sgf_point(value, board_size).map_err(RecordError::BadPoint)?;
                record.moves.push(Move { color, vertex });
            }
        }
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_record() {
        let record = parse("(;GM[1]FF[4]SZ[9];B[ee];W[dc];B[fc];W[];B[hh])").unwrap();
        assert_eq!(record.board_size, 9);
        assert_eq!(record.moves.len(), 5);
        assert_eq!(record.moves[3].vertex, None, "W[] is a pass");
        assert_eq!(record.playable_moves().len(), 4);
        let moves = record.playable_moves();
        assert_eq!(
            moves[0],
            Placement {
                color: Color::Black,
                vertex: Vertex::new(4, 4),
                passes: 0
            }
        );
        assert_eq!(moves[3].vertex, Vertex::new(7, 7));
        assert_eq!(moves[3].passes, 1, "W[] comes before B[hh]");
    }

    #[test]
    fn test_default_size_and_tt_pass() {
        let record = parse("(;B[dd];W[tt];B[pp])").unwrap();
        assert_eq!(record.board_size, 19);
        assert_eq!(record.moves[1].vertex, None);
    }

    #[test]
    fn test_setup_stones_and_rectangles() {
        let record = parse("(;SZ[9]AB[aa][bb:cc]AW[ee];W[ff])").unwrap();
        assert_eq!(record.setup.len(), 6);
        let board = record.initial_board().unwrap();
        assert_eq!(board.get(Vertex::new(2, 2)), Some(Color::Black));
        assert_eq!(board.get(Vertex::new(4, 4)), Some(Color::White));
        assert_eq!(board.get(Vertex::new(5, 5)), None, "Moves are not setup");
    }

    #[test]
    fn test_follows_first_variation() {
        let record = parse("(;SZ[9];B[aa](;W[bb];B[cc])(;W[dd]))").unwrap();
        let moves: Vec<_> = record.playable_moves().into_iter().map(|m| m.vertex).collect();
        assert_eq!(
            moves,
            vec![Vertex::new(0, 0), Vertex::new(1, 1), Vertex::new(2, 2)]
        );
    }

    #[test]
    fn test_escaped_values_and_long_names() {
        let record = parse("(;SZ[9]C[a \\] tricky comment]AddBlack[aa];B[bb])").unwrap();
        assert_eq!(record.setup, vec![(Color::Black, Vertex::new(0, 0))]);
        assert_eq!(record.moves.len(), 1);
    }

    #[test]
    fn test_errors() {
        assert_eq!(parse("   "), Err(RecordError::Empty));
        assert!(matches!(parse("x(;B[aa])"), Err(RecordError::Expected { .. })));
        assert_eq!(parse("(;SZ[9];B[aa"), Err(RecordError::UnterminatedValue));
        assert_eq!(parse("(;SZ[9];B[aa]"), Err(RecordError::Unterminated));
        assert_eq!(parse("(;SZ[99])"), Err(RecordError::BadSize("99".into())));
        assert_eq!(parse("(;SZ[9];B[zz])"), Err(RecordError::BadPoint("zz".into())));
    }
}
