use std::collections::HashMap;

use chrono::Duration;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::dataset::{MatchRecord, roster};
use crate::error::{PredictError, Result};
use crate::score_matrix::round_dp;

// Gamma(shape, rate) prior shared by every attack, defense and home-advantage variable.
const PRIOR_SHAPE: f64 = 1.0;
const PRIOR_RATE: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerConfig {
    pub iterations: usize,
    pub burn_in: usize,
    pub thin: usize,
    pub decay: f64,
    pub step: f64,
    pub chains: usize,
    pub seed: Option<u64>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            iterations: 5000,
            burn_in: 100,
            thin: 10,
            decay: 0.01,
            step: 0.25,
            chains: 1,
            seed: None,
        }
    }
}

impl SamplerConfig {
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    pub fn retained_per_chain(&self) -> usize {
        if self.thin == 0 || self.iterations <= self.burn_in {
            return 0;
        }
        (self.iterations - self.burn_in).div_ceil(self.thin)
    }

    fn validate(&self) -> Result<()> {
        if self.thin == 0 {
            return Err(PredictError::InvalidSampler("thin must be at least 1".to_string()));
        }
        if self.chains == 0 {
            return Err(PredictError::InvalidSampler("chains must be at least 1".to_string()));
        }
        if self.retained_per_chain() == 0 {
            return Err(PredictError::InvalidSampler(format!(
                "iterations {} do not exceed burn-in {}",
                self.iterations, self.burn_in
            )));
        }
        if self.step.is_nan() || self.step <= 0.0 {
            return Err(PredictError::InvalidSampler(format!("step {} is not positive", self.step)));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamStrength {
    pub team: String,
    pub attack: f64,
    pub defense: f64,
}

/// Posterior draws of the global home multiplier. Downstream code uses the last sampled value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeAdvantage {
    trace: Vec<f64>,
}

impl HomeAdvantage {
    pub fn from_trace(trace: Vec<f64>) -> Self {
        Self { trace }
    }

    pub fn fixed(value: f64) -> Self {
        Self { trace: vec![value] }
    }

    pub fn current(&self) -> f64 {
        self.trace.last().copied().unwrap_or(PRIOR_SHAPE / PRIOR_RATE)
    }

    pub fn mean(&self) -> f64 {
        if self.trace.is_empty() {
            return PRIOR_SHAPE / PRIOR_RATE;
        }
        self.trace.iter().sum::<f64>() / self.trace.len() as f64
    }

    pub fn trace(&self) -> &[f64] {
        &self.trace
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrengthFit {
    teams: Vec<TeamStrength>,
    index: HashMap<String, usize>,
    pub home_advantage: HomeAdvantage,
    pub matches: usize,
    pub acceptance: f64,
}

impl StrengthFit {
    pub fn from_parts(teams: Vec<TeamStrength>, home_advantage: HomeAdvantage) -> Self {
        let index = teams
            .iter()
            .enumerate()
            .map(|(i, t)| (t.team.clone(), i))
            .collect();
        Self {
            teams,
            index,
            home_advantage,
            matches: 0,
            acceptance: 0.0,
        }
    }

    pub fn team(&self, name: &str) -> Result<&TeamStrength> {
        self.index
            .get(name)
            .map(|&i| &self.teams[i])
            .ok_or_else(|| PredictError::MissingTeamParams(name.to_string()))
    }

    pub fn teams(&self) -> &[TeamStrength] {
        &self.teams
    }
}

struct Observations {
    home: Vec<usize>,
    away: Vec<usize>,
    home_goals: Vec<f64>,
    away_goals: Vec<f64>,
    weight: Vec<f64>,
    by_team: Vec<Vec<usize>>,
}

impl Observations {
    fn build(matches: &[MatchRecord], index: &HashMap<String, usize>, decay: f64) -> Self {
        let weights = recency_weights(matches, decay);
        let mut by_team = vec![Vec::new(); index.len()];
        let mut obs = Self {
            home: Vec::with_capacity(matches.len()),
            away: Vec::with_capacity(matches.len()),
            home_goals: Vec::with_capacity(matches.len()),
            away_goals: Vec::with_capacity(matches.len()),
            weight: weights,
            by_team: Vec::new(),
        };
        for (k, m) in matches.iter().enumerate() {
            let h = index[&m.home_team];
            let a = index[&m.away_team];
            obs.home.push(h);
            obs.away.push(a);
            obs.home_goals.push(m.home_goals as f64);
            obs.away_goals.push(m.away_goals as f64);
            by_team[h].push(k);
            if a != h {
                by_team[a].push(k);
            }
        }
        obs.by_team = by_team;
        obs
    }

    fn len(&self) -> usize {
        self.home.len()
    }

    // Poisson log-pmf without the log(k!) constant, scaled by the match's recency weight.
    fn match_loglik(&self, k: usize, state: &ChainState) -> f64 {
        let (h, a) = (self.home[k], self.away[k]);
        let mu_home = state.attack[h] * state.defense[a] * state.home_adv;
        let mu_away = state.defense[h] * state.attack[a];
        self.weight[k]
            * (self.home_goals[k] * mu_home.ln() - mu_home + self.away_goals[k] * mu_away.ln()
                - mu_away)
    }

    fn team_loglik(&self, team: usize, state: &ChainState) -> f64 {
        self.by_team[team]
            .iter()
            .map(|&k| self.match_loglik(k, state))
            .sum()
    }

    fn total_loglik(&self, state: &ChainState) -> f64 {
        (0..self.len()).map(|k| self.match_loglik(k, state)).sum()
    }
}

pub fn recency_weights(matches: &[MatchRecord], decay: f64) -> Vec<f64> {
    let Some(latest) = matches.iter().map(|m| m.date).max() else {
        return Vec::new();
    };
    let t_now = latest + Duration::days(1);
    matches
        .iter()
        .map(|m| {
            let age_days = (t_now - m.date).num_days() as f64;
            (-age_days * decay).exp()
        })
        .collect()
}

#[derive(Clone)]
struct ChainState {
    attack: Vec<f64>,
    defense: Vec<f64>,
    home_adv: f64,
}

#[derive(Clone, Copy)]
enum Param {
    Attack(usize),
    Defense(usize),
    Home,
}

impl ChainState {
    fn start(n: usize) -> Self {
        Self {
            attack: vec![1.0; n],
            defense: vec![1.0; n],
            home_adv: 1.0,
        }
    }

    fn get(&self, p: Param) -> f64 {
        match p {
            Param::Attack(i) => self.attack[i],
            Param::Defense(i) => self.defense[i],
            Param::Home => self.home_adv,
        }
    }

    fn set(&mut self, p: Param, v: f64) {
        match p {
            Param::Attack(i) => self.attack[i] = v,
            Param::Defense(i) => self.defense[i] = v,
            Param::Home => self.home_adv = v,
        }
    }
}

struct ChainTrace {
    attack_sum: Vec<f64>,
    defense_sum: Vec<f64>,
    retained: usize,
    home_trace: Vec<f64>,
    accepted: usize,
    proposed: usize,
}

// Gamma(shape, rate) log-density of exp(theta) including the log-transform Jacobian.
fn log_prior(theta: f64) -> f64 {
    PRIOR_SHAPE * theta - PRIOR_RATE * theta.exp()
}

fn local_loglik(obs: &Observations, state: &ChainState, p: Param) -> f64 {
    match p {
        Param::Attack(i) | Param::Defense(i) => obs.team_loglik(i, state),
        Param::Home => obs.total_loglik(state),
    }
}

fn run_chain(obs: &Observations, n: usize, cfg: &SamplerConfig, seed: Option<u64>) -> ChainTrace {
    let mut rng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };
    let mut state = ChainState::start(n);
    let mut params = Vec::with_capacity(2 * n + 1);
    params.extend((0..n).map(Param::Attack));
    params.extend((0..n).map(Param::Defense));
    params.push(Param::Home);

    let mut trace = ChainTrace {
        attack_sum: vec![0.0; n],
        defense_sum: vec![0.0; n],
        retained: 0,
        home_trace: Vec::with_capacity(cfg.retained_per_chain()),
        accepted: 0,
        proposed: 0,
    };

    for iter in 0..cfg.iterations {
        for &p in &params {
            let current = state.get(p);
            let theta = current.ln();
            let before = local_loglik(obs, &state, p) + log_prior(theta);

            let proposal = theta + rng.gen_range(-cfg.step..cfg.step);
            state.set(p, proposal.exp());
            let after = local_loglik(obs, &state, p) + log_prior(proposal);

            trace.proposed += 1;
            let u: f64 = rng.gen_range(0.0..1.0);
            if u.ln() < after - before {
                trace.accepted += 1;
            } else {
                state.set(p, current);
            }
        }

        if iter >= cfg.burn_in && (iter - cfg.burn_in) % cfg.thin == 0 {
            for i in 0..n {
                trace.attack_sum[i] += state.attack[i];
                trace.defense_sum[i] += state.defense[i];
            }
            trace.home_trace.push(state.home_adv);
            trace.retained += 1;
        }
    }

    trace
}

pub fn fit_strengths(matches: &[MatchRecord], cfg: &SamplerConfig) -> Result<StrengthFit> {
    let teams = roster(matches);
    if matches.is_empty() || teams.len() < 2 {
        return Err(PredictError::DataInsufficient {
            teams: teams.len(),
            matches: matches.len(),
        });
    }
    cfg.validate()?;

    let index = teams
        .iter()
        .enumerate()
        .map(|(i, t)| (t.clone(), i))
        .collect::<HashMap<_, _>>();
    let obs = Observations::build(matches, &index, cfg.decay);
    let n = teams.len();

    let chains = (0..cfg.chains)
        .into_par_iter()
        .map(|c| run_chain(&obs, n, cfg, cfg.seed.map(|s| s.wrapping_add(c as u64))))
        .collect::<Vec<_>>();

    let mut attack_sum = vec![0.0; n];
    let mut defense_sum = vec![0.0; n];
    let mut retained = 0usize;
    let mut accepted = 0usize;
    let mut proposed = 0usize;
    let mut home_trace = Vec::new();
    for chain in chains {
        for i in 0..n {
            attack_sum[i] += chain.attack_sum[i];
            defense_sum[i] += chain.defense_sum[i];
        }
        retained += chain.retained;
        accepted += chain.accepted;
        proposed += chain.proposed;
        home_trace.extend(chain.home_trace);
    }

    let strengths = teams
        .into_iter()
        .enumerate()
        .map(|(i, team)| TeamStrength {
            team,
            attack: round_dp(attack_sum[i] / retained as f64, 2),
            defense: round_dp(defense_sum[i] / retained as f64, 2),
        })
        .collect::<Vec<_>>();
    for s in &strengths {
        debug!(team = %s.team, attack = s.attack, defense = s.defense, "team strength");
    }

    let mut fit = StrengthFit::from_parts(strengths, HomeAdvantage::from_trace(home_trace));
    fit.matches = matches.len();
    fit.acceptance = if proposed > 0 {
        accepted as f64 / proposed as f64
    } else {
        0.0
    };

    info!(
        teams = n,
        matches = matches.len(),
        retained,
        home_advantage = fit.home_advantage.current(),
        home_advantage_mean = fit.home_advantage.mean(),
        acceptance = fit.acceptance,
        "fitted team strengths"
    );
    Ok(fit)
}
