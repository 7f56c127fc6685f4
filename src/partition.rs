use serde::{Deserialize, Serialize};

use crate::score_matrix::GRID;

/// (home goals, away goals)
pub type Scoreline = (usize, usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineMode {
    Handicap,
    Total,
}

impl LineMode {
    pub fn bucket_names(self) -> [&'static str; 3] {
        match self {
            LineMode::Handicap => ["home_win", "draw", "away_win"],
            LineMode::Total => ["big", "draw", "small"],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub mode: LineMode,
    pub line: f64,
    buckets: [Vec<Scoreline>; 3],
}

impl Partition {
    pub fn names(&self) -> [&'static str; 3] {
        self.mode.bucket_names()
    }

    pub fn buckets(&self) -> &[Vec<Scoreline>; 3] {
        &self.buckets
    }

    pub fn bucket(&self, name: &str) -> Option<&[Scoreline]> {
        self.names()
            .iter()
            .position(|n| *n == name)
            .map(|i| self.buckets[i].as_slice())
    }
}

/// Assigns each of the 121 scorelines to exactly one bucket.
///
/// Lines are quarter-goal multiples, so the level test is an exact float comparison.
pub fn partition(line: f64, mode: LineMode) -> Partition {
    let mut buckets: [Vec<Scoreline>; 3] = Default::default();
    for i in 0..GRID {
        for j in 0..GRID {
            let diff = match mode {
                LineMode::Handicap => i as f64 - j as f64 + line,
                LineMode::Total => i as f64 + j as f64 - line,
            };
            let slot = if diff > 0.0 {
                0
            } else if diff == 0.0 {
                1
            } else {
                2
            };
            buckets[slot].push((i, j));
        }
    }
    Partition {
        mode,
        line,
        buckets,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn assert_exact_cover(p: &Partition) {
        let mut seen = HashSet::new();
        for bucket in p.buckets() {
            for s in bucket {
                assert!(seen.insert(*s), "{s:?} appears twice at line {}", p.line);
            }
        }
        assert_eq!(seen.len(), GRID * GRID);
    }

    #[test]
    fn every_line_covers_grid_once() {
        for quarter in -20..=40 {
            let line = quarter as f64 * 0.25;
            assert_exact_cover(&partition(line, LineMode::Handicap));
            assert_exact_cover(&partition(line, LineMode::Total));
        }
    }

    #[test]
    fn level_handicap_draws_are_the_diagonal() {
        let p = partition(0.0, LineMode::Handicap);
        let draws = p.bucket("draw").unwrap();
        assert_eq!(draws.len(), GRID);
        assert!(draws.iter().all(|(i, j)| i == j));
        assert!(p.bucket("home_win").unwrap().contains(&(1, 0)));
        assert!(p.bucket("away_win").unwrap().contains(&(0, 1)));
    }

    #[test]
    fn half_goal_handicap_has_no_draw() {
        let p = partition(-0.5, LineMode::Handicap);
        assert!(p.bucket("draw").unwrap().is_empty());
        // Level scores lose when giving half a goal.
        assert!(p.bucket("away_win").unwrap().contains(&(2, 2)));
    }

    #[test]
    fn whole_goal_handicap_pushes_on_margin() {
        let p = partition(-1.0, LineMode::Handicap);
        let draws = p.bucket("draw").unwrap();
        assert!(draws.contains(&(1, 0)));
        assert!(draws.iter().all(|(i, j)| *i == j + 1));
    }

    #[test]
    fn total_buckets() {
        let p = partition(2.5, LineMode::Total);
        assert!(p.bucket("draw").unwrap().is_empty());
        assert!(p.bucket("big").unwrap().contains(&(2, 1)));
        assert!(p.bucket("small").unwrap().contains(&(1, 1)));

        let p = partition(3.0, LineMode::Total);
        assert!(p.bucket("draw").unwrap().contains(&(0, 3)));
        assert_eq!(p.bucket("draw").unwrap().len(), 4);
        assert!(p.bucket("home_win").is_none());
    }
}
