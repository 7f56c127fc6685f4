use std::path::PathBuf;

use crate::strength::SamplerConfig;

const CACHE_DIR: &str = "scoreprob";

pub fn app_cache_dir() -> Option<PathBuf> {
    // Prefer XDG cache.
    if let Ok(base) = std::env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(CACHE_DIR));
        }
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR))
}

/// Loads `.env.local` then `.env` if present. Values already set in the process win.
pub fn load_env_files() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key)
        .ok()
        .and_then(|val| val.trim().parse::<T>().ok())
}

impl SamplerConfig {
    pub fn from_env() -> Self {
        let d = SamplerConfig::default();
        Self {
            iterations: env_parse("SCOREPROB_ITERATIONS")
                .unwrap_or(d.iterations)
                .max(1),
            burn_in: env_parse("SCOREPROB_BURN_IN").unwrap_or(d.burn_in),
            thin: env_parse("SCOREPROB_THIN").unwrap_or(d.thin).max(1),
            decay: env_parse("SCOREPROB_DECAY")
                .unwrap_or(d.decay)
                .clamp(0.0, 1.0),
            step: env_parse::<f64>("SCOREPROB_STEP")
                .filter(|s| *s > 0.0)
                .unwrap_or(d.step),
            chains: env_parse("SCOREPROB_CHAINS").unwrap_or(d.chains).clamp(1, 16),
            seed: env_parse("SCOREPROB_SEED"),
        }
    }
}

pub fn db_path_from_env() -> Option<PathBuf> {
    std::env::var("SCOREPROB_DB")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
}
