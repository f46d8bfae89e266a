//! Crate-wide error hierarchy for the review pipeline.

use thiserror::Error;

pub type CoreResult<T> = Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Remote(#[from] reviewbot_remote::Error),

    #[error(transparent)]
    Store(#[from] reviewbot_store::Error),

    #[error(transparent)]
    Plugin(#[from] reviewbot_plugins::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid exclusion regex: {0}")]
    Regex(#[from] regex::Error),
}
