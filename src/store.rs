use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{NaiveDateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use crate::config::app_cache_dir;
use crate::dataset::{Fixture, MatchRecord};
use crate::predict::FixturePrediction;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn default_db_path() -> Option<PathBuf> {
    app_cache_dir().map(|dir| dir.join("matches.sqlite"))
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS matches (
            competition TEXT NOT NULL,
            utc_time TEXT NOT NULL,
            home_team TEXT NOT NULL,
            away_team TEXT NOT NULL,
            home_goals INTEGER NOT NULL,
            away_goals INTEGER NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (competition, utc_time, home_team, away_team)
        );
        CREATE INDEX IF NOT EXISTS idx_matches_utc_time ON matches(utc_time);

        CREATE TABLE IF NOT EXISTS fixtures (
            fixture_id INTEGER PRIMARY KEY,
            competition TEXT NOT NULL,
            utc_time TEXT NOT NULL,
            home_team TEXT NOT NULL,
            away_team TEXT NOT NULL,
            handicap_line TEXT NULL,
            total_line TEXT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_fixtures_competition ON fixtures(competition, utc_time);

        CREATE TABLE IF NOT EXISTS predictions (
            fixture_id INTEGER PRIMARY KEY,
            competition TEXT NOT NULL,
            utc_time TEXT NOT NULL,
            home_team TEXT NOT NULL,
            away_team TEXT NOT NULL,
            payload_json TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

fn fmt_time(t: &NaiveDateTime) -> String {
    t.format(TIME_FORMAT).to_string()
}

fn parse_time(raw: &str) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, TIME_FORMAT).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(err))
    })
}

pub fn upsert_matches(conn: &mut Connection, competition: &str, rows: &[MatchRecord]) -> Result<usize> {
    let tx = conn.transaction().context("begin match upsert")?;
    let now = Utc::now().to_rfc3339();
    for m in rows {
        tx.execute(
            r#"
            INSERT INTO matches (
                competition, utc_time, home_team, away_team, home_goals, away_goals, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(competition, utc_time, home_team, away_team) DO UPDATE SET
                home_goals = excluded.home_goals,
                away_goals = excluded.away_goals,
                updated_at = excluded.updated_at
            "#,
            params![
                competition,
                fmt_time(&m.date),
                m.home_team,
                m.away_team,
                m.home_goals as i64,
                m.away_goals as i64,
                now,
            ],
        )
        .context("upsert match")?;
    }
    tx.commit().context("commit match upsert")?;
    Ok(rows.len())
}

pub fn load_finished_matches(conn: &Connection, competition: &str) -> Result<Vec<MatchRecord>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT utc_time, home_team, away_team, home_goals, away_goals
            FROM matches
            WHERE competition = ?1
            ORDER BY utc_time ASC, home_team ASC
            "#,
        )
        .context("prepare load matches query")?;

    let rows = stmt
        .query_map(params![competition], |row| {
            Ok(MatchRecord {
                date: parse_time(&row.get::<_, String>(0)?)?,
                home_team: row.get(1)?,
                away_team: row.get(2)?,
                home_goals: row.get::<_, u32>(3)?,
                away_goals: row.get::<_, u32>(4)?,
            })
        })
        .context("query load matches")?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode match row")?);
    }
    Ok(out)
}

pub fn upsert_fixtures(conn: &mut Connection, competition: &str, rows: &[Fixture]) -> Result<usize> {
    let tx = conn.transaction().context("begin fixture upsert")?;
    for f in rows {
        tx.execute(
            r#"
            INSERT INTO fixtures (
                fixture_id, competition, utc_time, home_team, away_team, handicap_line, total_line
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(fixture_id) DO UPDATE SET
                competition = excluded.competition,
                utc_time = excluded.utc_time,
                home_team = excluded.home_team,
                away_team = excluded.away_team,
                handicap_line = excluded.handicap_line,
                total_line = excluded.total_line
            "#,
            params![
                f.id as i64,
                competition,
                fmt_time(&f.date),
                f.home_team,
                f.away_team,
                f.handicap_line,
                f.total_line,
            ],
        )
        .context("upsert fixture")?;
    }
    tx.commit().context("commit fixture upsert")?;
    Ok(rows.len())
}

pub fn load_fixtures(
    conn: &Connection,
    competition: &str,
    from: &NaiveDateTime,
    to: &NaiveDateTime,
) -> Result<Vec<Fixture>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT fixture_id, utc_time, home_team, away_team, handicap_line, total_line
            FROM fixtures
            WHERE competition = ?1 AND utc_time > ?2 AND utc_time < ?3
            ORDER BY utc_time ASC, fixture_id ASC
            "#,
        )
        .context("prepare load fixtures query")?;

    let rows = stmt
        .query_map(params![competition, fmt_time(from), fmt_time(to)], |row| {
            Ok(Fixture {
                id: row.get::<_, i64>(0)? as u64,
                date: parse_time(&row.get::<_, String>(1)?)?,
                home_team: row.get(2)?,
                away_team: row.get(3)?,
                handicap_line: row.get(4)?,
                total_line: row.get(5)?,
            })
        })
        .context("query load fixtures")?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode fixture row")?);
    }
    Ok(out)
}

pub fn has_prediction(conn: &Connection, fixture_id: u64) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM predictions WHERE fixture_id = ?1",
            params![fixture_id as i64],
            |row| row.get::<_, i64>(0),
        )
        .optional()
        .context("query prediction")?;
    Ok(found.is_some())
}

pub fn save_prediction(conn: &Connection, competition: &str, p: &FixturePrediction) -> Result<()> {
    let payload = serde_json::to_string(p).context("serialize prediction")?;
    conn.execute(
        r#"
        INSERT INTO predictions (
            fixture_id, competition, utc_time, home_team, away_team, payload_json, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        ON CONFLICT(fixture_id) DO UPDATE SET
            payload_json = excluded.payload_json,
            created_at = excluded.created_at
        "#,
        params![
            p.fixture_id as i64,
            competition,
            fmt_time(&p.date),
            p.home_team,
            p.away_team,
            payload,
            Utc::now().to_rfc3339(),
        ],
    )
    .context("save prediction")?;
    Ok(())
}

pub fn load_prediction_json(conn: &Connection, fixture_id: u64) -> Result<Option<serde_json::Value>> {
    let raw = conn
        .query_row(
            "SELECT payload_json FROM predictions WHERE fixture_id = ?1",
            params![fixture_id as i64],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .context("query prediction payload")?;
    raw.map(|s| serde_json::from_str(&s).context("decode prediction payload"))
        .transpose()
}
