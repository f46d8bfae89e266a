//! Configurable per-file, per-line regex matcher. Ported from
//! `regexreviewer.go`: each configured check names a set of regexes
//! selecting files, a set selecting lines within those files, and the
//! comment text to post.

use regex::Regex;
use reviewbot_remote::types::{ChangeKind, FileDiff};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::warn;

use crate::builtin::scan_chunk_lines;
use crate::checker::Checker;
use crate::types::{Comment, Passback};

#[derive(Debug, Deserialize)]
struct FileMatch {
    #[serde(default)]
    #[serde(rename = "Match")]
    file_match: Vec<String>,
    #[serde(default)]
    #[serde(rename = "Exclude")]
    file_exclude: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct LineMatch {
    #[serde(default)]
    #[serde(rename = "Match")]
    line_match: Vec<String>,
    #[serde(default)]
    #[serde(rename = "Exclude")]
    line_exclude: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CommentSpec {
    #[serde(rename = "SingleLine")]
    single_line: String,
    #[serde(rename = "MultiLine")]
    multi_line: String,
    #[serde(rename = "RaiseIssue", default)]
    raise_issue: bool,
}

#[derive(Debug, Deserialize)]
struct ReviewRegexSpec {
    #[serde(rename = "File")]
    file: FileMatch,
    #[serde(rename = "Line")]
    line: LineMatch,
    #[serde(rename = "Comment")]
    comment: CommentSpec,
}

#[derive(Debug, Deserialize)]
struct RegexReviewerSpec {
    #[serde(rename = "Checks", default)]
    checks: Vec<ReviewRegexSpec>,
}

#[derive(Debug, Deserialize)]
struct ConfigRoot {
    #[serde(rename = "RegexReviewer")]
    regex_reviewer: RegexReviewerSpec,
}

struct CompiledCheck {
    file_match: Regex,
    file_exclude: Option<Regex>,
    line_match: Regex,
    line_exclude: Option<Regex>,
    single_line: String,
    multi_line: String,
    raise_issue: bool,
}

#[derive(Default)]
pub struct RegexChecker {
    checks: Vec<CompiledCheck>,
}

fn join_regex(patterns: &[String]) -> Option<Result<Regex, regex::Error>> {
    if patterns.is_empty() {
        return None;
    }
    Some(Regex::new(&patterns.join("|")))
}

impl Checker for RegexChecker {
    fn canonical_name(&self) -> &str {
        "RegexReviewer"
    }

    fn configure(&mut self, cfg: &serde_json::Value) {
        let parsed: ConfigRoot = match serde_json::from_value(cfg.clone()) {
            Ok(c) => c,
            Err(err) => {
                warn!(%err, "regex checker: invalid config, no checks loaded");
                return;
            }
        };

        for spec in parsed.regex_reviewer.checks {
            let file_match = match join_regex(&spec.file.file_match) {
                Some(Ok(r)) => r,
                _ => {
                    warn!("regex checker: skipping check with empty/invalid file match");
                    continue;
                }
            };
            let line_match = match join_regex(&spec.line.line_match) {
                Some(Ok(r)) => r,
                _ => {
                    warn!("regex checker: skipping check with empty/invalid line match");
                    continue;
                }
            };
            let file_exclude = match join_regex(&spec.file.file_exclude) {
                Some(Ok(r)) => Some(r),
                Some(Err(err)) => {
                    warn!(%err, "regex checker: invalid file exclude pattern, ignoring");
                    None
                }
                None => None,
            };
            let line_exclude = match join_regex(&spec.line.line_exclude) {
                Some(Ok(r)) => Some(r),
                Some(Err(err)) => {
                    warn!(%err, "regex checker: invalid line exclude pattern, ignoring");
                    None
                }
                None => None,
            };

            self.checks.push(CompiledCheck {
                file_match,
                file_exclude,
                line_match,
                line_exclude,
                single_line: spec.comment.single_line,
                multi_line: spec.comment.multi_line,
                raise_issue: spec.comment.raise_issue,
            });
        }
    }

    fn check<'a>(
        &'a self,
        file: &'a FileDiff,
        _passback: &'a Passback,
        tx: mpsc::Sender<Comment>,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            for check in &self.checks {
                if !check.file_match.is_match(&file.filename) {
                    continue;
                }
                if let Some(exclude) = &check.file_exclude {
                    if exclude.is_match(&file.filename) {
                        continue;
                    }
                }

                for chunk in &file.chunks {
                    if !matches!(chunk.change, ChangeKind::Insert | ChangeKind::Replace) {
                        continue;
                    }
                    let line_exclude = check.line_exclude.as_ref();
                    scan_chunk_lines(
                        chunk,
                        check.raise_issue,
                        &check.single_line,
                        &check.multi_line,
                        |text| {
                            check.line_match.is_match(text)
                                && !line_exclude.is_some_and(|re| re.is_match(text))
                        },
                        &tx,
                    )
                    .await;
                }
            }
        })
    }
}
