use std::collections::BTreeMap;

use serde::Serialize;

use crate::partition::{LineMode, Partition, partition};
use crate::score_matrix::{ScoreMatrix, round_dp};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MarketProbs {
    pub mode: LineMode,
    pub line: f64,
    pub names: [&'static str; 3],
    pub probs: [f64; 3],
}

impl MarketProbs {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| *n == name)
            .map(|i| self.probs[i])
    }

    pub fn sum(&self) -> f64 {
        self.probs.iter().sum()
    }

    pub fn to_map(&self) -> BTreeMap<&'static str, f64> {
        self.names.iter().copied().zip(self.probs).collect()
    }
}

/// Sums each bucket's mass (rounded to 2 decimals), then splits `1 - sum` equally across
/// all three buckets. The split is applied unconditionally, negative residuals included.
pub fn aggregate(grid: &ScoreMatrix, buckets: &Partition) -> MarketProbs {
    let mut probs = [0.0; 3];
    for (slot, members) in buckets.buckets().iter().enumerate() {
        let mass: f64 = members.iter().map(|&(i, j)| grid.get(i, j)).sum();
        probs[slot] = round_dp(mass, 2);
    }
    let residual = (1.0 - probs.iter().sum::<f64>()) / 3.0;
    for p in &mut probs {
        *p += residual;
    }
    MarketProbs {
        mode: buckets.mode,
        line: buckets.line,
        names: buckets.names(),
        probs,
    }
}

pub fn aggregate_1x2(grid: &ScoreMatrix) -> MarketProbs {
    aggregate(grid, &partition(0.0, LineMode::Handicap))
}
