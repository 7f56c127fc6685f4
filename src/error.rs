use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictError {
    #[error("insufficient data: {teams} distinct teams across {matches} matches")]
    DataInsufficient { teams: usize, matches: usize },

    #[error("unknown market line: {0:?}")]
    UnknownLine(String),

    #[error("no fitted parameters for team {0:?}")]
    MissingTeamParams(String),

    #[error("invalid sampler config: {0}")]
    InvalidSampler(String),
}

pub type Result<T> = std::result::Result<T, PredictError>;
