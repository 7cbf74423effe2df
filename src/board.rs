//! Board state with immutable-per-move play.
//!
//! A [`Board`] is a plain grid of optional stones. [`Board::play`] never
//! mutates the receiver: it returns the next board value, with captures
//! resolved. Setup stones go through [`Board::set`], which has no capture
//! logic.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use thiserror::Error;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Color {
    Black,
    White,
}

impl Color {
    pub fn opposite(self) -> Color {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }

    /// `+1` for the first player, `-1` for the second.
    pub fn sign(self) -> i8 {
        match self {
            Color::Black => 1,
            Color::White => -1,
        }
    }
}

/// An intersection, `0 <= x, y < size`, with `y = 0` the top row.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Vertex {
    pub x: usize,
    pub y: usize,
}

impl Vertex {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// Canonical `"x,y"` key.
impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// Per-intersection colors as signs (`1`, `-1`, `0` for empty), indexed `[y][x]`.
pub type SignMap = Vec<Vec<i8>>;

/// Reasons a move cannot be played.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("illegal move: {0} is off the board")]
    OutOfBounds(Vertex),
    #[error("illegal move: {0} is not empty")]
    Occupied(Vertex),
    #[error("illegal move: {0} retakes ko")]
    Ko(Vertex),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    size: usize,
    cells: Vec<Option<Color>>,
    /// Point the given color may not play on next.
    ko: Option<(Vertex, Color)>,
}

impl Board {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![None; size * size],
            ko: None,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    fn idx(&self, v: Vertex) -> usize {
        v.y * self.size + v.x
    }

    pub fn contains(&self, v: Vertex) -> bool {
        v.x < self.size && v.y < self.size
    }

    pub fn get(&self, v: Vertex) -> Option<Color> {
        if !self.contains(v) {
            return None;
        }
        self.cells[self.idx(v)]
    }

    /// Place (or clear) a setup stone without resolving captures.
    pub fn set(&mut self, v: Vertex, color: Option<Color>) -> Result<(), MoveError> {
        if !self.contains(v) {
            return Err(MoveError::OutOfBounds(v));
        }
        let i = self.idx(v);
        self.cells[i] = color;
        Ok(())
    }

    /// The 4-neighbors of `v` that lie on the board.
    pub fn neighbors(&self, v: Vertex) -> impl Iterator<Item = Vertex> + use<> {
        let s = self.size;
        let mut out = Vec::with_capacity(4);
        if v.x > 0 {
            out.push(Vertex::new(v.x - 1, v.y));
        }
        if v.x + 1 < s {
            out.push(Vertex::new(v.x + 1, v.y));
        }
        if v.y > 0 {
            out.push(Vertex::new(v.x, v.y - 1));
        }
        if v.y + 1 < s {
            out.push(Vertex::new(v.x, v.y + 1));
        }
        out.into_iter()
    }

    /// Every occupied vertex, row by row.
    pub fn stones(&self) -> impl Iterator<Item = (Vertex, Color)> + '_ {
        (0..self.size).flat_map(move |y| {
            (0..self.size).filter_map(move |x| {
                let v = Vertex::new(x, y);
                self.get(v).map(|c| (v, c))
            })
        })
    }

    /// Play `color` at `v`, returning the resulting board.
    ///
    /// Opposing groups left without liberties are removed first; if nothing
    /// was captured and the played group has no liberties, it is removed
    /// itself.
    pub fn play(&self, color: Color, v: Vertex) -> Result<Board, MoveError> {
        if !self.contains(v) {
            return Err(MoveError::OutOfBounds(v));
        }
        if self.get(v).is_some() {
            return Err(MoveError::Occupied(v));
        }
        if self.ko == Some((v, color)) {
            return Err(MoveError::Ko(v));
        }

        let mut next = self.clone();
        next.ko = None;
        let i = next.idx(v);
        next.cells[i] = Some(color);

        let opp = color.opposite();
        let mut captured: Vec<Vertex> = Vec::new();
        for n in self.neighbors(v) {
            if next.get(n) == Some(opp) && !captured.contains(&n) && next.liberties(n).is_empty()
            {
                captured.extend(next.chain(n));
            }
        }
        for &c in &captured {
            let ci = next.idx(c);
            next.cells[ci] = None;
        }

        if captured.is_empty() {
            if next.liberties(v).is_empty() {
                for s in next.chain(v) {
                    let si = next.idx(s);
                    next.cells[si] = None;
                }
            }
        } else if captured.len() == 1 {
            let libs = next.liberties(v);
            if next.chain(v).len() == 1 && libs.len() == 1 && libs.contains(&captured[0]) {
                next.ko = Some((captured[0], opp));
            }
        }
        Ok(next)
    }

    /// A pass: the stones stay, any ko restriction is lifted.
    pub fn pass(&self) -> Board {
        let mut next = self.clone();
        next.ko = None;
        next
    }

    /// All vertices of the group containing `v`, sorted. Empty if `v` is empty.
    pub fn chain(&self, v: Vertex) -> Vec<Vertex> {
        let Some(color) = self.get(v) else {
            return Vec::new();
        };
        let mut stack = vec![v];
        let mut visited = HashSet::new();
        let mut out = Vec::new();
        while let Some(c) = stack.pop() {
            if !visited.insert(c) {
                continue;
            }
            out.push(c);
            for n in self.neighbors(c) {
                if !visited.contains(&n) && self.get(n) == Some(color) {
                    stack.push(n);
                }
            }
        }
        out.sort();
        out
    }

    /// Empty points adjacent to the group containing `v`.
    pub fn liberties(&self, v: Vertex) -> BTreeSet<Vertex> {
        let mut libs = BTreeSet::new();
        for c in self.chain(v) {
            for n in self.neighbors(c) {
                if self.get(n).is_none() {
                    libs.insert(n);
                }
            }
        }
        libs
    }

    pub fn sign_map(&self) -> SignMap {
        (0..self.size)
            .map(|y| {
                (0..self.size)
                    .map(|x| self.get(Vertex::new(x, y)).map_or(0, Color::sign))
                    .collect()
            })
            .collect()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.size {
            for x in 0..self.size {
                let ch = match self.get(Vertex::new(x, y)) {
                    Some(Color::Black) => 'X',
                    Some(Color::White) => 'O',
                    None => '.',
                };
                write!(f, "{ch} ")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: usize, y: usize) -> Vertex {
        Vertex::new(x, y)
    }

    #[test]
    fn test_play_returns_new_board() {
        let board = Board::new(9);
        let next = board.play(Color::Black, v(4, 4)).unwrap();
        assert_eq!(board.get(v(4, 4)), None, "Original board must be untouched");
        assert_eq!(next.get(v(4, 4)), Some(Color::Black));
    }

    #[test]
    fn test_liberties_center_edge_corner() {
        let mut board = Board::new(9);
        board = board.play(Color::Black, v(4, 4)).unwrap();
        board = board.play(Color::White, v(0, 4)).unwrap();
        board = board.play(Color::Black, v(0, 0)).unwrap();
        assert_eq!(board.liberties(v(4, 4)).len(), 4);
        assert_eq!(board.liberties(v(0, 4)).len(), 3);
        assert_eq!(board.liberties(v(0, 0)).len(), 2);
    }

    #[test]
    fn test_chain_and_shared_liberties() {
        let mut board = Board::new(9);
        board = board.play(Color::Black, v(2, 2)).unwrap();
        board = board.play(Color::Black, v(3, 2)).unwrap();
        assert_eq!(board.chain(v(2, 2)), vec![v(2, 2), v(3, 2)]);
        assert_eq!(board.liberties(v(3, 2)).len(), 6);
        assert!(board.chain(v(5, 5)).is_empty());
    }

    #[test]
    fn test_occupied_and_out_of_bounds() {
        let board = Board::new(9).play(Color::Black, v(1, 1)).unwrap();
        assert_eq!(
            board.play(Color::White, v(1, 1)),
            Err(MoveError::Occupied(v(1, 1)))
        );
        assert_eq!(
            board.play(Color::White, v(9, 0)),
            Err(MoveError::OutOfBounds(v(9, 0)))
        );
    }

    #[test]
    fn test_capture_corner_stone() {
        let mut board = Board::new(9);
        board = board.play(Color::Black, v(0, 0)).unwrap();
        board = board.play(Color::White, v(1, 0)).unwrap();
        board = board.play(Color::White, v(0, 1)).unwrap();
        assert_eq!(board.get(v(0, 0)), None);
        assert_eq!(board.liberties(v(1, 0)).len(), 3);
    }

    #[test]
    fn test_suicide_removes_played_group() {
        let mut board = Board::new(9);
        board = board.play(Color::White, v(1, 0)).unwrap();
        board = board.play(Color::White, v(0, 1)).unwrap();
        board = board.play(Color::Black, v(0, 0)).unwrap();
        assert_eq!(board.get(v(0, 0)), None, "Suicide stone must be removed");
        assert_eq!(board.get(v(1, 0)), Some(Color::White));
    }

    #[test]
    fn test_capture_beats_suicide() {
        // White at (0,0) with one liberty at (1,0); Black fills it and captures.
        let mut board = Board::new(9);
        board.set(v(0, 0), Some(Color::White)).unwrap();
        board.set(v(0, 1), Some(Color::Black)).unwrap();
        board.set(v(2, 0), Some(Color::White)).unwrap();
        board.set(v(1, 1), Some(Color::White)).unwrap();
        let next = board.play(Color::Black, v(1, 0)).unwrap();
        assert_eq!(next.get(v(0, 0)), None);
        assert_eq!(next.get(v(1, 0)), Some(Color::Black));
    }

    #[test]
    fn test_ko_recapture_rejected() {
        //   . X O .
        //   X O . O
        //   . X O .
        let mut board = Board::new(9);
        for &(x, y) in &[(1, 0), (0, 1), (1, 2)] {
            board.set(v(x, y), Some(Color::Black)).unwrap();
        }
        for &(x, y) in &[(2, 0), (1, 1), (3, 1), (2, 2)] {
            board.set(v(x, y), Some(Color::White)).unwrap();
        }
        let taken = board.play(Color::Black, v(2, 1)).unwrap();
        assert_eq!(taken.get(v(1, 1)), None, "White stone should be captured");
        assert_eq!(
            taken.play(Color::White, v(1, 1)),
            Err(MoveError::Ko(v(1, 1)))
        );
        // Any other move clears the ko.
        let elsewhere = taken.play(Color::White, v(8, 8)).unwrap();
        let elsewhere = elsewhere.play(Color::Black, v(7, 8)).unwrap();
        assert!(elsewhere.play(Color::White, v(1, 1)).is_ok());
    }

    #[test]
    fn test_pass_lifts_ko() {
        let mut board = Board::new(9);
        for &(x, y) in &[(1, 0), (0, 1), (1, 2)] {
            board.set(v(x, y), Some(Color::Black)).unwrap();
        }
        for &(x, y) in &[(2, 0), (1, 1), (3, 1), (2, 2)] {
            board.set(v(x, y), Some(Color::White)).unwrap();
        }
        let taken = board.play(Color::Black, v(2, 1)).unwrap();
        let passed = taken.pass();
        assert_eq!(passed.sign_map(), taken.sign_map());
        let retaken = passed.play(Color::White, v(1, 1)).unwrap();
        assert_eq!(retaken.get(v(2, 1)), None, "Black stone should be recaptured");
    }

    #[test]
    fn test_sign_map_and_display() {
        let board = Board::new(3)
            .play(Color::Black, v(0, 0))
            .unwrap()
            .play(Color::White, v(2, 1))
            .unwrap();
        assert_eq!(
            board.sign_map(),
            vec![vec![1, 0, 0], vec![0, 0, -1], vec![0, 0, 0]]
        );
        assert_eq!(board.to_string(), "X . . \n. . O \n. . . \n");
        assert_eq!(v(3, 7).to_string(), "3,7");
    }
}
