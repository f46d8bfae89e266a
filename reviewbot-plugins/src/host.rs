//! Loads the checker set for a run.
//!
//! The original loads compiled `.so` plugins at runtime in directory-
//! listing order. This workspace has no dynamically-loaded-module
//! equivalent, so checkers are compiled into the binary and a manifest
//! directory merely selects and configures which ones run, in the same
//! directory-listing order the original's `ioutil.ReadDir` already
//! produces (sorted by filename).

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::builtin::{line_length::LineLengthChecker, regex_checker::RegexChecker, todo::TodoChecker};
use crate::checker::Checker;
use crate::errors::{Error, PluginResult};

#[derive(Debug, Deserialize)]
struct Manifest {
    checker: String,
    #[serde(default)]
    config: serde_json::Value,
}

/// The loaded, configured set of checkers for one run.
pub struct PluginHost {
    checkers: Vec<Box<dyn Checker>>,
}

impl PluginHost {
    /// Reads every manifest in `dir`, in sorted filename order, abort on
    /// the first unreadable or unresolvable entry.
    pub fn load(dir: &Path) -> PluginResult<Self> {
        let mut entries: Vec<_> = std::fs::read_dir(dir)
            .map_err(|e| Error::ReadDir(dir.display().to_string(), e))?
            .filter_map(|e| e.ok())
            .collect();
        entries.sort_by_key(|e| e.file_name());

        let mut checkers = Vec::new();
        for entry in entries {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("toml") {
                continue;
            }

            let raw = std::fs::read_to_string(&path)
                .map_err(|e| Error::ReadManifest(path.display().to_string(), e))?;
            let manifest: Manifest = toml::from_str(&raw)
                .map_err(|e| Error::ParseManifest(path.display().to_string(), e))?;

            let mut checker = new_builtin(&manifest.checker)
                .ok_or_else(|| Error::UnknownChecker(manifest.checker.clone(), path.display().to_string()))?;
            checker.configure(&manifest.config);
            info!(checker = manifest.checker.as_str(), manifest = %path.display(), "loaded checker");
            checkers.push(checker);
        }

        Ok(Self { checkers })
    }

    /// An empty host running no checkers, for tests.
    pub fn empty() -> Self {
        Self { checkers: Vec::new() }
    }

    /// A host running exactly the given checkers, already configured.
    pub fn with_checkers(checkers: Vec<Box<dyn Checker>>) -> Self {
        Self { checkers }
    }

    pub fn checkers(&self) -> &[Box<dyn Checker>] {
        &self.checkers
    }
}

fn new_builtin(name: &str) -> Option<Box<dyn Checker>> {
    match name {
        "LineReviewer" => Some(Box::new(LineLengthChecker)),
        "TodoReviewer" => Some(Box::new(TodoChecker)),
        "RegexReviewer" => Some(Box::new(RegexChecker::default())),
        _ => None,
    }
}
