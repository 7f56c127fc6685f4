use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use chrono::{Duration, NaiveDateTime, Utc};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use scoreprob::batch::{RunSummary, run_competition};
use scoreprob::config::{self, load_env_files};
use scoreprob::dataset::{self, parse_match_time};
use scoreprob::store;
use scoreprob::strength::SamplerConfig;

const DEFAULT_WINDOW_DAYS: i64 = 7;

fn main() -> Result<()> {
    load_env_files();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut competitions = parse_str_args("--competition");
    if competitions.is_empty() {
        competitions = std::env::var("SCOREPROB_COMPETITION")
            .map(|v| split_list(&v))
            .unwrap_or_default();
    }
    if competitions.is_empty() {
        return Err(anyhow!("no competition given (--competition or SCOREPROB_COMPETITION)"));
    }

    let db_path = parse_str_arg("--db")
        .map(PathBuf::from)
        .or_else(config::db_path_from_env)
        .or_else(store::default_db_path)
        .context("unable to resolve sqlite path")?;
    let mut conn = store::open_db(&db_path)?;

    let imports = [
        parse_str_arg("--import-matches"),
        parse_str_arg("--import-fixtures"),
    ];
    if imports.iter().any(Option::is_some) && competitions.len() > 1 {
        return Err(anyhow!("imports need exactly one --competition"));
    }
    let competition = &competitions[0];
    if let Some(path) = &imports[0] {
        let raw = fs::read_to_string(path).with_context(|| format!("read {path}"))?;
        let rows = dataset::parse_matches_csv(&raw).with_context(|| format!("parse {path}"))?;
        let n = store::upsert_matches(&mut conn, competition, &rows)?;
        info!(rows = n, %path, "imported matches");
    }
    if let Some(path) = &imports[1] {
        let raw = fs::read_to_string(path).with_context(|| format!("read {path}"))?;
        let rows = dataset::parse_fixtures_csv(&raw).with_context(|| format!("parse {path}"))?;
        let n = store::upsert_fixtures(&mut conn, competition, &rows)?;
        info!(rows = n, %path, "imported fixtures");
    }

    let now = Utc::now().naive_utc();
    let from = parse_time_arg("--from")?.unwrap_or(now);
    let to = parse_time_arg("--to")?.unwrap_or(from + Duration::days(DEFAULT_WINDOW_DAYS));
    let force = has_flag("--force");

    let mut sampler = SamplerConfig::from_env();
    if let Some(seed) = parse_str_arg("--seed") {
        sampler.seed = Some(seed.parse().with_context(|| format!("bad --seed {seed:?}"))?);
    }

    let mut saved = 0usize;
    let mut skipped = 0usize;
    let mut failed_runs = 0usize;
    for competition in &competitions {
        match run_competition(&conn, competition, &from, &to, &sampler, force) {
            Ok(summary) => {
                print_summary(&summary);
                saved += summary.saved.len();
                skipped += summary.skipped.len();
            }
            Err(err) => {
                failed_runs += 1;
                warn!(%competition, "competition run failed: {err:#}");
            }
        }
    }

    println!("Prediction run complete");
    println!("DB: {}", db_path.display());
    println!("Window: {from} .. {to}");
    println!("Fixtures: {saved} saved, {skipped} skipped");
    if failed_runs > 0 {
        println!("Competitions failed: {failed_runs}/{}", competitions.len());
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!(
        "[{}] matches used: {}, already predicted: {}",
        summary.competition, summary.matches_used, summary.already_predicted
    );
    for p in &summary.saved {
        println!(
            "{} {} vs {}  1X2 {:?}",
            p.fixture_id,
            p.home_team,
            p.away_team,
            p.one_x_two.to_map()
        );
        if let Some(h) = &p.handicap {
            println!("    handicap {}  {:?}", h.quote, h.probs.to_map());
        }
        if let Some(t) = &p.total {
            println!("    total {}  {:?}", t.quote, t.probs.to_map());
        }
    }
    for (f, reason) in &summary.skipped {
        println!("{} {} vs {}  skipped: {reason}", f.id, f.home_team, f.away_team);
    }
}

fn has_flag(name: &str) -> bool {
    std::env::args().skip(1).any(|a| a == name)
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// Every value given for `name`, repeated flags and comma lists both accepted.
fn parse_str_args(name: &str) -> Vec<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let prefix = format!("{name}=");
    let mut out = Vec::new();
    for (idx, arg) in args.iter().enumerate() {
        let raw = match arg.strip_prefix(&prefix) {
            Some(val) => val,
            None if arg == name => match args.get(idx + 1) {
                Some(next) => next.as_str(),
                None => continue,
            },
            None => continue,
        };
        for val in split_list(raw) {
            if !out.contains(&val) {
                out.push(val);
            }
        }
    }
    out
}

fn parse_str_arg(name: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let prefix = format!("{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(val) = arg.strip_prefix(&prefix) {
            let trimmed = val.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}

fn parse_time_arg(name: &str) -> Result<Option<NaiveDateTime>> {
    let Some(raw) = parse_str_arg(name) else {
        return Ok(None);
    };
    parse_match_time(&raw)
        .map(Some)
        .ok_or_else(|| anyhow!("bad {name} value {raw:?}"))
}
