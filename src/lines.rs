use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::error::{PredictError, Result};

// Whole and half-goal handicap quotes, in half-goal steps from level to four goals.
const HALF_STEPS: [(&str, &str); 9] = [
    ("平手", "level"),
    ("半球", "half goal"),
    ("一球", "one ball"),
    ("球半", "ball and a half"),
    ("两球", "two balls"),
    ("两球半", "two and a half balls"),
    ("三球", "three balls"),
    ("三球半", "three and a half balls"),
    ("四球", "four balls"),
];

const RECEIVE_CN: &str = "受让";
const RECEIVE_EN: &str = "receive ";

/// Quoted handicap → numeric offset added to the home side's goals.
///
/// Giving goals is negative, receiving is positive; quarter lines are the split quotes
/// between neighbouring half-goal steps (`"半球/一球"` is -0.75).
static HANDICAP_LINES: Lazy<HashMap<String, f64>> = Lazy::new(|| {
    let mut table = HashMap::new();
    for (n, (cn, en)) in HALF_STEPS.iter().enumerate() {
        let value = n as f64 * 0.5;
        table.insert(cn.to_string(), -value);
        table.insert(en.to_string(), -value);
        if n > 0 {
            table.insert(format!("{RECEIVE_CN}{cn}"), value);
            table.insert(format!("{RECEIVE_EN}{en}"), value);
        }
        let Some((next_cn, next_en)) = HALF_STEPS.get(n + 1) else {
            continue;
        };
        let split = value + 0.25;
        table.insert(format!("{cn}/{next_cn}"), -split);
        table.insert(format!("{en}/{next_en}"), -split);
        table.insert(format!("{RECEIVE_CN}{cn}/{next_cn}"), split);
        table.insert(format!("{RECEIVE_EN}{en}/{next_en}"), split);
    }
    for alias in ["pick'em", "pickem", "pk", "level ball"] {
        table.insert(alias.to_string(), 0.0);
    }
    table
});

fn normalize(raw: &str) -> String {
    raw.split('/')
        .map(|part| part.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("/")
        .to_lowercase()
}

pub fn handicap_line(raw: &str) -> Result<f64> {
    HANDICAP_LINES
        .get(&normalize(raw))
        .copied()
        .ok_or_else(|| PredictError::UnknownLine(raw.to_string()))
}

pub fn handicap_table() -> Vec<(&'static str, f64)> {
    let mut rows = HANDICAP_LINES
        .iter()
        .map(|(k, v)| (k.as_str(), *v))
        .collect::<Vec<_>>();
    rows.sort_by(|a, b| a.0.cmp(b.0));
    rows
}

pub fn total_line(raw: &str) -> Result<f64> {
    let unknown = || PredictError::UnknownLine(raw.to_string());
    let parts = raw
        .split('/')
        .map(|p| p.trim().parse::<f64>().map_err(|_| unknown()))
        .collect::<Result<Vec<_>>>()?;
    let line = match parts.as_slice() {
        [one] => *one,
        [lo, hi] => (lo + hi) / 2.0,
        _ => return Err(unknown()),
    };
    if !line.is_finite() || line < 0.0 {
        return Err(unknown());
    }
    Ok(line)
}
