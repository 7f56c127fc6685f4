use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{debug, warn};

use crate::aggregate::MarketProbs;
use crate::dataset::Fixture;
use crate::error::Result;
use crate::markets::{MarketKind, market_probabilities};
use crate::score_matrix::score_matrix;
use crate::strength::StrengthFit;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuotedMarket {
    pub quote: String,
    pub probs: MarketProbs,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FixturePrediction {
    pub fixture_id: u64,
    pub date: NaiveDateTime,
    pub home_team: String,
    pub away_team: String,
    pub home_strength: f64,
    pub away_strength: f64,
    pub home_advantage: f64,
    pub score: BTreeMap<String, f64>,
    pub one_x_two: MarketProbs,
    pub handicap: Option<QuotedMarket>,
    pub total: Option<QuotedMarket>,
}

#[derive(Debug, Clone)]
pub struct FixtureOutcome {
    pub fixture: Fixture,
    pub result: Result<FixturePrediction>,
}

pub fn predict_fixture(fit: &StrengthFit, fixture: &Fixture) -> Result<FixturePrediction> {
    let grid = score_matrix(&fixture.home_team, &fixture.away_team, fit)?;
    debug!(
        fixture_id = fixture.id,
        home_strength = grid.home_strength,
        away_strength = grid.away_strength,
        "fixture strengths"
    );

    let quoted = |kind: MarketKind, quote: &Option<String>| -> Result<Option<QuotedMarket>> {
        let Some(quote) = quote.as_deref() else {
            return Ok(None);
        };
        let probs = market_probabilities(&grid, kind, Some(quote))?;
        debug!(fixture_id = fixture.id, market = %kind, line = probs.line, "priced market");
        Ok(Some(QuotedMarket {
            quote: quote.to_string(),
            probs,
        }))
    };
    let handicap = quoted(MarketKind::Handicap, &fixture.handicap_line)?;
    let total = quoted(MarketKind::Total, &fixture.total_line)?;

    Ok(FixturePrediction {
        fixture_id: fixture.id,
        date: fixture.date,
        home_team: fixture.home_team.clone(),
        away_team: fixture.away_team.clone(),
        home_strength: grid.home_strength,
        away_strength: grid.away_strength,
        home_advantage: fit.home_advantage.current(),
        score: grid.sparse(),
        one_x_two: market_probabilities(&grid, MarketKind::OneXTwo, None)?,
        handicap,
        total,
    })
}

pub fn predict_fixtures(fit: &StrengthFit, fixtures: &[Fixture]) -> Vec<FixtureOutcome> {
    fixtures
        .iter()
        .map(|fixture| {
            let result = predict_fixture(fit, fixture);
            if let Err(err) = &result {
                warn!(
                    fixture_id = fixture.id,
                    home = %fixture.home_team,
                    away = %fixture.away_team,
                    "fixture skipped: {err}"
                );
            }
            FixtureOutcome {
                fixture: fixture.clone(),
                result,
            }
        })
        .collect()
}
