//! Group scoring.
//!
//! Walks every connected group on the board once and annotates it with
//! its liberties and whether those liberties changed relative to a
//! [`Baseline`].

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::board::{Board, Color, Vertex};
use crate::constants::MAX_LIBERTIES;

/// Liberty set of the group owning each occupied vertex.
pub type LibertySnapshot = BTreeMap<Vertex, BTreeSet<Vertex>>;

/// What a group is compared against to decide whether it changed.
#[derive(Clone, Copy, Debug)]
pub enum Baseline<'a> {
    /// Liberty sets recorded just before the current move.
    PreMove(&'a LibertySnapshot),
    /// The starting position: a group is unchanged only if the same
    /// stones formed a group there with the same liberties.
    Initial(&'a Board),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupScore {
    pub color: Color,
    /// Member stones, sorted.
    pub vertices: Vec<Vertex>,
    pub liberties: BTreeSet<Vertex>,
    /// The group contains the stone just played.
    pub contains_last: bool,
    pub changed: bool,
}

impl GroupScore {
    pub fn liberty_count(&self) -> usize {
        self.liberties.len()
    }

    /// Liberty count as the learner reports it.
    pub fn reported_liberties(&self) -> usize {
        self.liberty_count().min(MAX_LIBERTIES)
    }

    pub fn contains(&self, v: Vertex) -> bool {
        self.vertices.binary_search(&v).is_ok()
    }
}

/// Record the liberty set of every occupied vertex.
pub fn snapshot(board: &Board) -> LibertySnapshot {
    let mut out = LibertySnapshot::new();
    for (v, _) in board.stones() {
        if out.contains_key(&v) {
            continue;
        }
        let libs = board.liberties(v);
        for member in board.chain(v) {
            out.insert(member, libs.clone());
        }
    }
    out
}

fn unchanged_from(initial: &Board, color: Color, vertices: &[Vertex], libs: &BTreeSet<Vertex>) -> bool {
    let first = vertices[0];
    initial.get(first) == Some(color)
        && initial.chain(first) == vertices
        && initial.liberties(first) == *libs
}

/// Score every group on `board`, in row-major order of each group's first stone.
pub fn score_groups(board: &Board, last: Option<Vertex>, baseline: Baseline<'_>) -> Vec<GroupScore> {
    let mut seen = HashSet::new();
    let mut scores = Vec::new();
    for (v, color) in board.stones() {
        if seen.contains(&v) {
            continue;
        }
        let vertices = board.chain(v);
        seen.extend(vertices.iter().copied());
        let liberties = board.liberties(v);
        let contains_last = last.is_some_and(|l| vertices.contains(&l));
        let changed = contains_last
            || match baseline {
                Baseline::PreMove(before) => {
                    vertices.iter().any(|m| before.get(m) != Some(&liberties))
                }
                Baseline::Initial(initial) => !unchanged_from(initial, color, &vertices, &liberties),
            };
        scores.push(GroupScore {
            color,
            vertices,
            liberties,
            contains_last,
            changed,
        });
    }
    scores
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: usize, y: usize) -> Vertex {
        Vertex::new(x, y)
    }

    #[test]
    fn test_one_entry_per_group() {
        let mut board = Board::new(9);
        board = board.play(Color::Black, v(2, 2)).unwrap();
        board = board.play(Color::Black, v(2, 3)).unwrap();
        board = board.play(Color::White, v(6, 6)).unwrap();
        let before = snapshot(&board);
        let scores = score_groups(&board, None, Baseline::PreMove(&before));
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[0].vertices, vec![v(2, 2), v(2, 3)]);
        assert_eq!(scores[0].liberty_count(), 6);
        assert!(scores.iter().all(|s| !s.changed), "Nothing moved since the snapshot");
    }

    #[test]
    fn test_changed_by_adjacent_move() {
        let mut board = Board::new(9);
        board = board.play(Color::Black, v(2, 2)).unwrap();
        board = board.play(Color::White, v(6, 6)).unwrap();
        let before = snapshot(&board);
        let after = board.play(Color::White, v(3, 2)).unwrap();
        let scores = score_groups(&after, Some(v(3, 2)), Baseline::PreMove(&before));

        let black = scores.iter().find(|s| s.contains(v(2, 2))).unwrap();
        let far = scores.iter().find(|s| s.contains(v(6, 6))).unwrap();
        let new = scores.iter().find(|s| s.contains(v(3, 2))).unwrap();
        assert!(black.changed && !black.contains_last);
        assert_eq!(black.liberty_count(), 3);
        assert!(!far.changed);
        assert!(new.changed && new.contains_last);
    }

    #[test]
    fn test_changed_against_initial_board() {
        let mut initial = Board::new(9);
        initial.set(v(0, 0), Some(Color::Black)).unwrap();
        initial.set(v(6, 6), Some(Color::White)).unwrap();
        let board = initial
            .play(Color::White, v(1, 0))
            .unwrap()
            .play(Color::White, v(8, 8))
            .unwrap();
        let scores = score_groups(&board, Some(v(8, 8)), Baseline::Initial(&initial));

        let corner = scores.iter().find(|s| s.contains(v(0, 0))).unwrap();
        let setup = scores.iter().find(|s| s.contains(v(6, 6))).unwrap();
        let earlier = scores.iter().find(|s| s.contains(v(1, 0))).unwrap();
        assert!(corner.changed, "Lost a liberty since the start");
        assert!(!setup.changed);
        assert!(earlier.changed, "Not present at the start");
    }

    #[test]
    fn test_reported_liberties_saturate() {
        let mut board = Board::new(9);
        for x in 2..5 {
            board = board.play(Color::Black, v(x, 4)).unwrap();
        }
        let before = snapshot(&board);
        let scores = score_groups(&board, None, Baseline::PreMove(&before));
        assert_eq!(scores[0].liberty_count(), 8);
        assert_eq!(scores[0].reported_liberties(), MAX_LIBERTIES);
    }
}
