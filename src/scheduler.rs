//! Question scheduling.
//!
//! Given the scored groups of the current move, [`schedule`] picks which
//! groups become liberty questions and in what order, and
//! [`pair_comparisons`] picks adjacent opposite-colored group pairs to
//! compare. All randomness is drawn from the engine's [`Sequence`], in a
//! fixed order, so a record always yields the same questions.

use std::collections::{BTreeMap, BTreeSet};

use crate::board::{Board, Color, Vertex};
use crate::config::QuizConfig;
use crate::constants::MAX_LIBERTIES;
use crate::rng::Sequence;
use crate::scorer::GroupScore;

/// A group picked for a liberty question.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Scheduled {
    /// Index into the group scores.
    pub group: usize,
    /// Representative stone the question points at.
    pub vertex: Vertex,
}

/// Answer to a comparison question: which side has fewer liberties.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    First,
    Second,
    Equal,
}

/// Two adjacent groups of opposite colors, each tagged with its true
/// liberty count. The first side belongs to the player who just moved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Comparison {
    pub first: Vertex,
    pub first_liberties: usize,
    pub second: Vertex,
    pub second_liberties: usize,
}

impl Comparison {
    pub fn answer(&self) -> Side {
        use std::cmp::Ordering;
        match self.first_liberties.cmp(&self.second_liberties) {
            Ordering::Less => Side::First,
            Ordering::Greater => Side::Second,
            Ordering::Equal => Side::Equal,
        }
    }
}

fn representative(group: &GroupScore, rng: &mut Sequence) -> Vertex {
    group.vertices[rng.below(group.vertices.len())]
}

/// Choose the liberty questions for the current move.
///
/// Changed groups are ordered by liberty count, then groups holding the
/// stone just played, then a random key. Saturated groups are dropped
/// while any unsaturated one remains (if enabled), and the list is cut to
/// `max_questions`.
pub fn schedule(scores: &[GroupScore], config: &QuizConfig, rng: &mut Sequence) -> Vec<Scheduled> {
    if config.max_questions == 0 {
        return Vec::new();
    }

    let mut candidates: Vec<(usize, u32)> = scores
        .iter()
        .enumerate()
        .filter(|(_, s)| s.changed)
        .map(|(i, _)| (i, rng.key()))
        .collect();
    candidates.sort_by_key(|&(i, key)| {
        let s = &scores[i];
        (s.liberty_count(), !s.contains_last, key)
    });

    let mut picked: Vec<Scheduled> = candidates
        .into_iter()
        .map(|(group, _)| Scheduled {
            group,
            vertex: representative(&scores[group], rng),
        })
        .collect();

    let unsaturated = |p: &Scheduled| scores[p.group].liberty_count() < MAX_LIBERTIES;
    if config.skip_saturated && picked.iter().any(unsaturated) {
        picked.retain(unsaturated);
    }
    picked.truncate(config.max_questions);

    log::debug!(
        "scheduled {} of {} groups: {:?}",
        picked.len(),
        scores.len(),
        picked.iter().map(|p| p.vertex.to_string()).collect::<Vec<_>>()
    );
    picked
}

/// Pair each selected group with adjacent opposite-colored groups whose
/// liberty counts differ by at most the configured threshold.
///
/// Pairs are ordered by liberty difference, then pairs where the
/// opponent of `mover` has more liberties, then pairs touching the stone
/// just played, then a random key.
pub fn pair_comparisons(
    board: &Board,
    scores: &[GroupScore],
    selected: &[Scheduled],
    mover: Color,
    config: &QuizConfig,
    rng: &mut Sequence,
) -> Vec<Comparison> {
    if config.max_questions == 0 || selected.is_empty() {
        return Vec::new();
    }

    let mut group_of = BTreeMap::new();
    for (i, s) in scores.iter().enumerate() {
        for &v in &s.vertices {
            group_of.insert(v, i);
        }
    }

    let mut seen = BTreeSet::new();
    let mut candidates: Vec<(usize, usize, u32)> = Vec::new();
    for pick in selected {
        let group = &scores[pick.group];
        for &member in &group.vertices {
            for n in board.neighbors(member) {
                let Some(&other) = group_of.get(&n) else {
                    continue;
                };
                if scores[other].color == group.color {
                    continue;
                }
                let (mine, theirs) = if group.color == mover {
                    (pick.group, other)
                } else {
                    (other, pick.group)
                };
                if !seen.insert((mine, theirs)) {
                    continue;
                }
                let diff = scores[mine]
                    .liberty_count()
                    .abs_diff(scores[theirs].liberty_count());
                if diff <= config.comparison_threshold {
                    candidates.push((mine, theirs, rng.key()));
                }
            }
        }
    }

    candidates.sort_by_key(|&(mine, theirs, key)| {
        let (a, b) = (&scores[mine], &scores[theirs]);
        let diff = a.liberty_count().abs_diff(b.liberty_count());
        let opponent_ahead = b.liberty_count() > a.liberty_count();
        let touches_last = a.contains_last || b.contains_last;
        (diff, !opponent_ahead, !touches_last, key)
    });
    candidates.truncate(config.max_questions);

    candidates
        .into_iter()
        .map(|(mine, theirs, _)| Comparison {
            first: representative(&scores[mine], rng),
            first_liberties: scores[mine].liberty_count(),
            second: representative(&scores[theirs], rng),
            second_liberties: scores[theirs].liberty_count(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scorer::{Baseline, score_groups, snapshot};

    fn v(x: usize, y: usize) -> Vertex {
        Vertex::new(x, y)
    }

    /// Play `moves` on an empty 9x9 board and score the final move.
    fn scored(moves: &[(Color, (usize, usize))]) -> (Board, Vec<GroupScore>) {
        let mut board = Board::new(9);
        let (last, init) = moves.split_last().unwrap();
        for &(c, (x, y)) in init {
            board = board.play(c, v(x, y)).unwrap();
        }
        let before = snapshot(&board);
        let board = board.play(last.0, v(last.1.0, last.1.1)).unwrap();
        let scores = score_groups(&board, Some(v(last.1.0, last.1.1)), Baseline::PreMove(&before));
        (board, scores)
    }

    #[test]
    fn test_schedule_orders_by_liberties() {
        // White's atari leaves the black corner stone on one liberty.
        let (_, scores) = scored(&[
            (Color::Black, (0, 0)),
            (Color::White, (5, 5)),
            (Color::White, (1, 0)),
        ]);
        let mut rng = Sequence::new(7);
        let picked = schedule(&scores, &QuizConfig::default(), &mut rng);
        assert_eq!(picked.len(), 2, "Black corner and the new white stone changed");
        assert_eq!(picked[0].vertex, v(0, 0));
        assert_eq!(picked[1].vertex, v(1, 0));
    }

    /// Place setup stones on an empty 9x9 board and score every group as new.
    fn placed(black: &[(usize, usize)], white: &[(usize, usize)], last: Option<Vertex>) -> (Board, Vec<GroupScore>) {
        let mut board = Board::new(9);
        for &(x, y) in black {
            board.set(v(x, y), Some(Color::Black)).unwrap();
        }
        for &(x, y) in white {
            board.set(v(x, y), Some(Color::White)).unwrap();
        }
        let empty = Board::new(9);
        let scores = score_groups(&board, last, Baseline::Initial(&empty));
        (board, scores)
    }

    #[test]
    fn test_schedule_puts_last_move_first_among_equals() {
        let (_, scores) = placed(&[(4, 4), (5, 5)], &[(4, 5)], Some(v(5, 5)));
        for seed in 0..20 {
            let picked = schedule(&scores, &QuizConfig::default(), &mut Sequence::new(seed));
            let order: Vec<(Vertex, usize)> = picked
                .iter()
                .map(|p| (p.vertex, scores[p.group].liberty_count()))
                .collect();
            assert_eq!(
                order,
                vec![(v(4, 5), 2), (v(5, 5), 3), (v(4, 4), 3)],
                "seed {seed}"
            );
        }
    }

    #[test]
    fn test_pairs_with_opponent_ahead_come_first() {
        // Black (4,4) has 2 liberties, mover. White (3,4) has 3, white
        // (5,4) has 1: both differ by one.
        let (board, scores) = placed(&[(4, 4), (6, 4), (5, 3)], &[(3, 4), (5, 4)], None);
        let group = scores.iter().position(|s| s.contains(v(4, 4))).unwrap();
        let selected = [Scheduled {
            group,
            vertex: v(4, 4),
        }];
        for seed in 0..20 {
            let mut rng = Sequence::new(seed);
            let pairs = pair_comparisons(&board, &scores, &selected, Color::Black, &QuizConfig::default(), &mut rng);
            assert_eq!(pairs.len(), 2, "seed {seed}");
            assert_eq!((pairs[0].first, pairs[0].second), (v(4, 4), v(3, 4)), "seed {seed}");
            assert_eq!(pairs[0].answer(), Side::First);
            assert_eq!((pairs[1].first, pairs[1].second), (v(4, 4), v(5, 4)), "seed {seed}");
            assert_eq!(pairs[1].answer(), Side::Second);
        }
    }

    #[test]
    fn test_schedule_respects_cap_and_zero() {
        let (_, scores) = scored(&[
            (Color::Black, (0, 0)),
            (Color::White, (1, 0)),
        ]);
        let mut rng = Sequence::new(7);
        let one = QuizConfig::default().with_max_questions(1);
        assert_eq!(schedule(&scores, &one, &mut rng).len(), 1);
        assert!(schedule(&scores, &QuizConfig::playback(), &mut rng).is_empty());
    }

    #[test]
    fn test_schedule_skips_saturated_groups() {
        // The new black stone extends its group to 5 liberties while taking
        // one from the white stone beside it.
        let (_, scores) = scored(&[
            (Color::Black, (4, 4)),
            (Color::White, (3, 5)),
            (Color::Black, (4, 5)),
        ]);
        let mut rng = Sequence::new(3);
        let picked = schedule(&scores, &QuizConfig::default(), &mut rng);
        assert!(picked.iter().all(|p| scores[p.group].liberty_count() < MAX_LIBERTIES));
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].vertex, v(3, 5));

        let mut keep = QuizConfig::default();
        keep.skip_saturated = false;
        let mut rng = Sequence::new(3);
        assert_eq!(schedule(&scores, &keep, &mut rng).len(), 2);
    }

    #[test]
    fn test_schedule_is_deterministic() {
        let (_, scores) = scored(&[
            (Color::Black, (3, 3)),
            (Color::White, (3, 4)),
            (Color::Black, (4, 4)),
            (Color::White, (4, 3)),
        ]);
        let a = schedule(&scores, &QuizConfig::default(), &mut Sequence::new(11));
        let b = schedule(&scores, &QuizConfig::default(), &mut Sequence::new(11));
        assert_eq!(a, b);
    }

    #[test]
    fn test_pair_comparisons() {
        let (board, scores) = scored(&[
            (Color::Black, (4, 4)),
            (Color::White, (5, 4)),
        ]);
        let config = QuizConfig::default();
        let mut rng = Sequence::new(5);
        let picked = schedule(&scores, &config, &mut rng);
        let pairs = pair_comparisons(&board, &scores, &picked, Color::White, &config, &mut rng);
        assert_eq!(pairs.len(), 1, "One adjacent pair, found from both sides once");
        let pair = pairs[0];
        assert_eq!(pair.first, v(5, 4), "Mover's group comes first");
        assert_eq!(pair.second, v(4, 4));
        assert_eq!(pair.answer(), Side::Equal);
    }

    #[test]
    fn test_pair_threshold() {
        // Black at the edge has 2 liberties after the white contact; white has 3.
        let (board, scores) = scored(&[
            (Color::Black, (0, 4)),
            (Color::White, (1, 4)),
        ]);
        let mut config = QuizConfig::default();
        let mut rng = Sequence::new(5);
        let picked = schedule(&scores, &config, &mut rng);
        let pairs = pair_comparisons(&board, &scores, &picked, Color::White, &config, &mut rng);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].answer(), Side::Second);

        config.comparison_threshold = 0;
        let pairs = pair_comparisons(&board, &scores, &picked, Color::White, &config, &mut rng);
        assert!(pairs.is_empty());
    }

    #[test]
    fn test_comparison_answer() {
        let mut c = Comparison {
            first: v(0, 0),
            first_liberties: 1,
            second: v(1, 0),
            second_liberties: 2,
        };
        assert_eq!(c.answer(), Side::First);
        c.first_liberties = 3;
        assert_eq!(c.answer(), Side::Second);
    }
}
