use std::fmt;

use serde::{Deserialize, Serialize};

use crate::aggregate::{MarketProbs, aggregate};
use crate::error::{PredictError, Result};
use crate::lines::{handicap_line, total_line};
use crate::partition::{LineMode, partition};
use crate::score_matrix::ScoreMatrix;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketKind {
    OneXTwo,
    Handicap,
    Total,
}

impl MarketKind {
    pub fn mode(self) -> LineMode {
        match self {
            MarketKind::OneXTwo | MarketKind::Handicap => LineMode::Handicap,
            MarketKind::Total => LineMode::Total,
        }
    }

    pub fn resolve_line(self, quote: Option<&str>) -> Result<f64> {
        match (self, quote) {
            (MarketKind::OneXTwo, _) => Ok(0.0),
            (MarketKind::Handicap, Some(q)) => handicap_line(q),
            (MarketKind::Total, Some(q)) => total_line(q),
            (_, None) => Err(PredictError::UnknownLine(String::new())),
        }
    }
}

impl fmt::Display for MarketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MarketKind::OneXTwo => "1X2",
            MarketKind::Handicap => "handicap",
            MarketKind::Total => "total",
        };
        f.write_str(s)
    }
}

/// Market probabilities for a quoted line. Handicap quotes go through the handicap table;
/// totals accept numeric or split quotes.
pub fn market_probabilities(
    grid: &ScoreMatrix,
    kind: MarketKind,
    quote: Option<&str>,
) -> Result<MarketProbs> {
    let line = kind.resolve_line(quote)?;
    Ok(market_probabilities_at(grid, kind, line))
}

pub fn market_probabilities_at(grid: &ScoreMatrix, kind: MarketKind, line: f64) -> MarketProbs {
    let line = if kind == MarketKind::OneXTwo { 0.0 } else { line };
    aggregate(grid, &partition(line, kind.mode()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate_1x2;

    #[test]
    fn one_x_two_is_level_handicap() {
        let grid = ScoreMatrix::from_strengths(1.7, 0.9);
        let base = market_probabilities(&grid, MarketKind::OneXTwo, None).unwrap();
        let level = market_probabilities(&grid, MarketKind::Handicap, Some("level")).unwrap();
        assert_eq!(base, level);
        assert_eq!(base, aggregate_1x2(&grid));
    }

    #[test]
    fn handicap_quote_is_required() {
        let grid = ScoreMatrix::from_strengths(1.2, 1.2);
        assert!(matches!(
            market_probabilities(&grid, MarketKind::Handicap, None),
            Err(PredictError::UnknownLine(_))
        ));
        assert!(matches!(
            market_probabilities(&grid, MarketKind::Handicap, Some("2.5")),
            Err(PredictError::UnknownLine(_))
        ));
    }

    #[test]
    fn giving_goals_lowers_home_chance() {
        let grid = ScoreMatrix::from_strengths(1.8, 0.8);
        let level = market_probabilities(&grid, MarketKind::OneXTwo, None).unwrap();
        let giving = market_probabilities(&grid, MarketKind::Handicap, Some("一球")).unwrap();
        assert!(giving.get("home_win").unwrap() < level.get("home_win").unwrap());
    }

    #[test]
    fn split_total_has_no_push() {
        let grid = ScoreMatrix::from_strengths(1.4, 1.1);
        let probs = market_probabilities(&grid, MarketKind::Total, Some("2.5/3")).unwrap();
        assert_eq!(probs.line, 2.75);
        let residual_only = probs.get("draw").unwrap();
        assert!(residual_only.abs() < 0.01);
    }

    #[test]
    fn repeated_calls_are_bit_identical() {
        let grid = ScoreMatrix::from_strengths(1.33, 0.97);
        let a = market_probabilities(&grid, MarketKind::Total, Some("2.5")).unwrap();
        let b = market_probabilities(&grid, MarketKind::Total, Some("2.5")).unwrap();
        for (x, y) in a.probs.iter().zip(b.probs.iter()) {
            assert_eq!(x.to_bits(), y.to_bits());
        }
    }

    #[test]
    fn kind_names() {
        let names = [MarketKind::OneXTwo, MarketKind::Handicap, MarketKind::Total].map(|k| k.to_string());
        assert_eq!(names, ["1X2", "handicap", "total"]);
    }
}
