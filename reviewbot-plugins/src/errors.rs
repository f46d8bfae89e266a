//! Plugin loading errors.

use thiserror::Error;

pub type PluginResult<T> = Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("reading plugin manifest directory {0}: {1}")]
    ReadDir(String, std::io::Error),

    #[error("reading plugin manifest {0}: {1}")]
    ReadManifest(String, std::io::Error),

    #[error("parsing plugin manifest {0}: {1}")]
    ParseManifest(String, toml::de::Error),

    #[error("unknown checker {0:?} named in manifest {1}")]
    UnknownChecker(String, String),

    #[error("invalid regex in checker config: {0}")]
    Regex(#[from] regex::Error),
}
