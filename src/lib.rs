pub mod aggregate;
pub mod batch;
pub mod config;
pub mod dataset;
pub mod error;
pub mod lines;
pub mod markets;
pub mod partition;
pub mod predict;
pub mod score_matrix;
pub mod store;
pub mod strength;

pub use error::PredictError;
pub use markets::{MarketKind, market_probabilities};
pub use score_matrix::{ScoreMatrix, score_matrix};
pub use strength::{SamplerConfig, StrengthFit, fit_strengths};
