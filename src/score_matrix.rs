use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::strength::{StrengthFit, TeamStrength};

pub const MAX_GOALS: usize = 10;
pub const GRID: usize = MAX_GOALS + 1;

/// Joint probability of every scoreline from 0:0 to 10:10, indexed `[home][away]`.
///
/// Goals above ten are cut from the support, so the cells sum to slightly less than one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreMatrix {
    pub home_strength: f64,
    pub away_strength: f64,
    cells: [[f64; GRID]; GRID],
}

impl ScoreMatrix {
    pub fn from_strengths(home_strength: f64, away_strength: f64) -> Self {
        let pmf_h = poisson_pmf(home_strength, MAX_GOALS);
        let pmf_a = poisson_pmf(away_strength, MAX_GOALS);
        let mut cells = [[0.0; GRID]; GRID];
        for (i, p_i) in pmf_h.iter().enumerate() {
            for (j, p_j) in pmf_a.iter().enumerate() {
                cells[i][j] = round_dp(p_i * p_j, 4);
            }
        }
        Self {
            home_strength,
            away_strength,
            cells,
        }
    }

    pub fn from_cells(cells: [[f64; GRID]; GRID]) -> Self {
        Self {
            home_strength: f64::NAN,
            away_strength: f64::NAN,
            cells,
        }
    }

    pub fn get(&self, home_goals: usize, away_goals: usize) -> f64 {
        self.cells[home_goals][away_goals]
    }

    pub fn total(&self) -> f64 {
        self.cells.iter().flatten().sum()
    }

    pub fn sparse(&self) -> BTreeMap<String, f64> {
        let mut out = BTreeMap::new();
        for (i, row) in self.cells.iter().enumerate() {
            for (j, &p) in row.iter().enumerate() {
                if p != 0.0 {
                    out.insert(format!("{i}:{j}"), p);
                }
            }
        }
        out
    }
}

pub fn fixture_strengths(home: &TeamStrength, away: &TeamStrength, home_advantage: f64) -> (f64, f64) {
    (
        home.attack * away.defense * home_advantage,
        away.attack * home.defense,
    )
}

pub fn score_matrix(home_team: &str, away_team: &str, fit: &StrengthFit) -> Result<ScoreMatrix> {
    let home = fit.team(home_team)?;
    let away = fit.team(away_team)?;
    let (home_strength, away_strength) =
        fixture_strengths(home, away, fit.home_advantage.current());
    Ok(ScoreMatrix::from_strengths(home_strength, away_strength))
}

/// Poisson pmf for k = 0..=max_k. The tail above `max_k` is dropped, not folded back in.
pub fn poisson_pmf(lambda: f64, max_k: usize) -> Vec<f64> {
    let mut out = vec![0.0; max_k + 1];
    out[0] = (-lambda).exp();
    for k in 1..=max_k {
        out[k] = out[k - 1] * lambda / k as f64;
    }
    out
}

pub fn round_dp(v: f64, dp: i32) -> f64 {
    let scale = 10_f64.powi(dp);
    (v * scale).round() / scale
}
