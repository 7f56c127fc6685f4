use anyhow::{Context, Result, anyhow};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub date: NaiveDateTime,
    pub home_team: String,
    pub away_team: String,
    pub home_goals: u32,
    pub away_goals: u32,
}

impl MatchRecord {
    pub fn new(
        date: NaiveDateTime,
        home_team: impl Into<String>,
        away_team: impl Into<String>,
        home_goals: u32,
        away_goals: u32,
    ) -> Self {
        Self {
            date,
            home_team: home_team.into(),
            away_team: away_team.into(),
            home_goals,
            away_goals,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    pub id: u64,
    pub date: NaiveDateTime,
    pub home_team: String,
    pub away_team: String,
    pub handicap_line: Option<String>,
    pub total_line: Option<String>,
}

pub fn roster(matches: &[MatchRecord]) -> Vec<String> {
    let mut teams = matches
        .iter()
        .flat_map(|m| [m.home_team.clone(), m.away_team.clone()])
        .collect::<Vec<_>>();
    teams.sort_unstable();
    teams.dedup();
    teams
}

pub fn parse_match_time(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Parses `Date,HomeTeam,AwayTeam,FTHG,FTAG[,...]`. Rows with an empty or negative score are
/// unplayed and skipped; any other score that is not a whole number is an error.
pub fn parse_matches_csv(raw: &str) -> Result<Vec<MatchRecord>> {
    let mut out = Vec::new();
    for (line_no, line) in raw.lines().enumerate().skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        let cols = split_row(line);
        if cols.len() < 5 {
            return Err(anyhow!("line {}: expected 5 columns, got {}", line_no + 1, cols.len()));
        }
        let date = parse_match_time(cols[0])
            .with_context(|| format!("line {}: bad date {:?}", line_no + 1, cols[0]))?;
        let home_goals = parse_goals(cols[3])
            .with_context(|| format!("line {}: bad home goals {:?}", line_no + 1, cols[3]))?;
        let away_goals = parse_goals(cols[4])
            .with_context(|| format!("line {}: bad away goals {:?}", line_no + 1, cols[4]))?;
        let (Some(home_goals), Some(away_goals)) = (home_goals, away_goals) else {
            continue;
        };
        out.push(MatchRecord::new(date, cols[1], cols[2], home_goals, away_goals));
    }
    Ok(out)
}

pub fn parse_fixtures_csv(raw: &str) -> Result<Vec<Fixture>> {
    let mut out = Vec::new();
    for (line_no, line) in raw.lines().enumerate().skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        let cols = split_row(line);
        if cols.len() < 4 {
            return Err(anyhow!("line {}: expected at least 4 columns, got {}", line_no + 1, cols.len()));
        }
        let id = cols[0]
            .parse::<u64>()
            .with_context(|| format!("line {}: bad fixture id {:?}", line_no + 1, cols[0]))?;
        let date = parse_match_time(cols[1])
            .with_context(|| format!("line {}: bad date {:?}", line_no + 1, cols[1]))?;
        out.push(Fixture {
            id,
            date,
            home_team: cols[2].to_string(),
            away_team: cols[3].to_string(),
            handicap_line: non_empty(cols.get(4).copied()),
            total_line: non_empty(cols.get(5).copied()),
        });
    }
    Ok(out)
}

fn split_row(line: &str) -> Vec<&str> {
    line.split(',').map(|c| c.trim().trim_matches('"').trim()).collect()
}

// `None` marks an unplayed cell. Exports that store goals as floats write "2.0".
fn parse_goals(raw: &str) -> Result<Option<u32>> {
    if raw.is_empty() {
        return Ok(None);
    }
    let goals = match raw.parse::<i64>() {
        Ok(g) => g as f64,
        Err(_) => raw.parse::<f64>()?,
    };
    if !goals.is_finite() || goals.fract() != 0.0 {
        return Err(anyhow!("not a whole number of goals"));
    }
    if goals < 0.0 {
        return Ok(None);
    }
    u32::try_from(goals as i64)
        .map(Some)
        .map_err(|_| anyhow!("goal count out of range"))
}

fn non_empty(raw: Option<&str>) -> Option<String> {
    raw.filter(|s| !s.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roster_is_sorted_and_unique() {
        let d = parse_match_time("2018-12-01").unwrap();
        let matches = vec![
            MatchRecord::new(d, "Wolves", "Arsenal", 1, 1),
            MatchRecord::new(d, "Arsenal", "Chelsea", 2, 0),
        ];
        assert_eq!(roster(&matches), vec!["Arsenal", "Chelsea", "Wolves"]);
    }

    #[test]
    fn parse_match_time_accepts_common_shapes() {
        assert!(parse_match_time("2016-08-13 11:30:00").is_some());
        assert!(parse_match_time("2016-08-13T11:30:00").is_some());
        assert!(parse_match_time("2016-08-13").is_some());
        assert!(parse_match_time("13/08/2016").is_none());
    }

    #[test]
    fn matches_csv_skips_unplayed_rows() {
        let raw = "Date,HomeTeam,AwayTeam,FTHG,FTAG,status\n\
                   2016-08-13 11:30:00,Hull City,Leicester City,2,1,Played\n\
                   2016-08-20 11:30:00,Leicester City,Hull City,-1,-1,Fixture\n\
                   2016-08-27 11:30:00,Leicester City,Hull City,,,Fixture\n";
        let rows = parse_matches_csv(raw).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].home_team, "Hull City");
        assert_eq!(rows[0].home_goals, 2);
        assert_eq!(rows[0].away_goals, 1);
    }

    #[test]
    fn matches_csv_accepts_float_goals_and_rejects_junk() {
        let raw = "Date,HomeTeam,AwayTeam,FTHG,FTAG\n\
                   2016-08-13 11:30:00,Hull City,Leicester City,2.0,1.0\n\
                   2016-08-20 11:30:00,Leicester City,Hull City,-1.0,\n";
        let rows = parse_matches_csv(raw).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!((rows[0].home_goals, rows[0].away_goals), (2, 1));

        for bad in ["two,1", "1.5,0", "3,nan"] {
            let raw = format!("Date,HomeTeam,AwayTeam,FTHG,FTAG\n2016-08-20 11:30:00,Leicester City,Hull City,{bad}\n");
            let err = parse_matches_csv(&raw).unwrap_err();
            assert!(err.to_string().starts_with("line 2:"), "{bad}: {err}");
        }
    }

    #[test]
    fn fixtures_csv_keeps_optional_lines() {
        let raw = "id,Date,HomeTeam,AwayTeam,handicap,total\n\
                   7,2019-01-12 15:00:00,Chelsea,Newcastle,一球/球半,2.5/3\n\
                   8,2019-01-12 17:30:00,Wolves,Leicester,,\n";
        let rows = parse_fixtures_csv(raw).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].handicap_line.as_deref(), Some("一球/球半"));
        assert_eq!(rows[0].total_line.as_deref(), Some("2.5/3"));
        assert!(rows[1].handicap_line.is_none());
        assert!(rows[1].total_line.is_none());
    }
}
