use anyhow::Result;
use chrono::NaiveDateTime;
use rusqlite::Connection;
use tracing::{info, warn};

use crate::dataset::Fixture;
use crate::predict::{FixturePrediction, predict_fixtures};
use crate::store;
use crate::strength::{SamplerConfig, fit_strengths};

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub competition: String,
    pub already_predicted: usize,
    pub matches_used: usize,
    pub saved: Vec<FixturePrediction>,
    pub skipped: Vec<(Fixture, String)>,
}

// Store reads abort the run; a failed fit or save only skips fixtures.
pub fn run_competition(
    conn: &Connection,
    competition: &str,
    from: &NaiveDateTime,
    to: &NaiveDateTime,
    sampler: &SamplerConfig,
    force: bool,
) -> Result<RunSummary> {
    let mut summary = RunSummary {
        competition: competition.to_string(),
        ..RunSummary::default()
    };

    let mut pending = Vec::new();
    for fixture in store::load_fixtures(conn, competition, from, to)? {
        if !force && store::has_prediction(conn, fixture.id)? {
            info!(fixture_id = fixture.id, "prediction already stored");
            summary.already_predicted += 1;
            continue;
        }
        pending.push(fixture);
    }
    if pending.is_empty() {
        return Ok(summary);
    }

    let matches = store::load_finished_matches(conn, competition)?;
    summary.matches_used = matches.len();
    let fit = match fit_strengths(&matches, sampler) {
        Ok(fit) => fit,
        Err(err) => {
            warn!(%competition, pending = pending.len(), "fit failed, skipping fixtures: {err}");
            let reason = err.to_string();
            summary.skipped = pending.into_iter().map(|f| (f, reason.clone())).collect();
            return Ok(summary);
        }
    };

    for outcome in predict_fixtures(&fit, &pending) {
        let prediction = match outcome.result {
            Ok(p) => p,
            Err(err) => {
                summary.skipped.push((outcome.fixture, err.to_string()));
                continue;
            }
        };
        if let Err(err) = store::save_prediction(conn, competition, &prediction) {
            warn!(fixture_id = prediction.fixture_id, "save failed: {err:#}");
            summary.skipped.push((outcome.fixture, format!("{err:#}")));
            continue;
        }
        summary.saved.push(prediction);
    }
    Ok(summary)
}
