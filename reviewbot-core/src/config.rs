//! Process configuration, ported from `RbConfig` in
//! `examples/original_source/src/rbbot/reviewer/config.go`, plus the
//! top-level fields `main.go`'s `Config` struct adds around it.

use regex::Regex;
use serde::Deserialize;

use crate::errors::{CoreResult, Error};

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewBoardConfig {
    pub rb_api_url: String,
    pub rb_token: String,
    pub rb_username: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TopComments {
    #[serde(default)]
    pub new_review: Vec<String>,
    #[serde(default)]
    pub seen_before: Vec<String>,
    #[serde(default)]
    pub perfect_review: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BottomComments {
    #[serde(default)]
    pub new_review: String,
    #[serde(default)]
    pub seen_review: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentsConfig {
    #[serde(default)]
    pub top: TopComments,
    #[serde(default)]
    pub bottom: BottomComments,
    #[serde(default)]
    pub drop_previous_comments: bool,
    pub max_comments: i64,
    #[serde(default)]
    pub max_comment_comment: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExclusionRegexesConfig {
    #[serde(default)]
    pub file: Vec<String>,
    #[serde(default)]
    pub review_title: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatsConfig {
    #[serde(default)]
    pub logstats: bool,
    #[serde(default = "default_log_interval")]
    pub log_interval_sec: u64,
}

fn default_log_interval() -> u64 {
    60
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PluginsConfig {
    #[serde(default)]
    pub requester: serde_json::Value,
    #[serde(default)]
    pub reviewer: serde_json::Value,
}

/// Top-level configuration document.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub plugin_path: String,
    pub db_path: String,
    /// Shared secret the ingestion HTTP trigger checks incoming requests
    /// against (the config-driven analogue of the original's hardcoded
    /// plugin secret).
    pub trigger_secret: String,
    pub review_board: ReviewBoardConfig,
    pub comments: CommentsConfig,
    #[serde(default)]
    pub exclusion_regexes: ExclusionRegexesConfig,
    pub concurrent_file_downloads: usize,
    #[serde(default)]
    pub email_on_perfect: bool,
    #[serde(default)]
    pub stats: StatsConfig,
    #[serde(default)]
    pub plugins: PluginsConfig,
}

impl Config {
    pub fn from_json(raw: &str) -> CoreResult<Self> {
        serde_json::from_str(raw).map_err(|e| Error::Config(e.to_string()))
    }

    /// Compiles the review-pipeline-relevant regexes once, up front, so
    /// every review reuses the same compiled automaton instead of
    /// recompiling the patterns per request.
    pub fn compile(self) -> CoreResult<CompiledConfig> {
        let file_exclusion = compile_joined(&self.exclusion_regexes.file)?;
        let review_title_exclusion = compile_joined(&self.exclusion_regexes.review_title)?;
        Ok(CompiledConfig {
            config: self,
            file_exclusion,
            review_title_exclusion,
        })
    }
}

fn compile_joined(patterns: &[String]) -> CoreResult<Option<Regex>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    Ok(Some(Regex::new(&patterns.join("|"))?))
}

/// `Config` plus its pre-compiled exclusion regexes.
pub struct CompiledConfig {
    pub config: Config,
    pub file_exclusion: Option<Regex>,
    pub review_title_exclusion: Option<Regex>,
}

impl CompiledConfig {
    pub fn is_file_excluded(&self, filename: &str) -> bool {
        self.file_exclusion
            .as_ref()
            .is_some_and(|re| re.is_match(filename))
    }

    pub fn is_title_excluded(&self, summary: &str) -> bool {
        self.review_title_exclusion
            .as_ref()
            .is_some_and(|re| re.is_match(summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_document() {
        let raw = r#"{
            "plugin_path": "/plugins",
            "db_path": "/db.sqlite",
            "trigger_secret": "shh",
            "review_board": {"rb_api_url": "http://rb", "rb_token": "token abc", "rb_username": "bot"},
            "comments": {"max_comments": 25},
            "concurrent_file_downloads": 4
        }"#;
        let cfg = Config::from_json(raw).unwrap();
        assert_eq!(cfg.comments.max_comments, 25);
        assert_eq!(cfg.concurrent_file_downloads, 4);
        assert_eq!(cfg.stats.log_interval_sec, 60);
    }

    #[test]
    fn compiles_exclusion_regexes() {
        let raw = r#"{
            "plugin_path": "/plugins",
            "db_path": "/db.sqlite",
            "trigger_secret": "shh",
            "review_board": {"rb_api_url": "http://rb", "rb_token": "t", "rb_username": "bot"},
            "comments": {"max_comments": 25},
            "concurrent_file_downloads": 4,
            "exclusion_regexes": {"file": ["\\.lock$", "vendor/"], "review_title": ["^WIP:"]}
        }"#;
        let cfg = Config::from_json(raw).unwrap().compile().unwrap();
        assert!(cfg.is_file_excluded("Cargo.lock"));
        assert!(!cfg.is_file_excluded("src/main.rs"));
        assert!(cfg.is_title_excluded("WIP: still working"));
    }
}
