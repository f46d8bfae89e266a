//! Types shared between the core review pipeline and checkers.

use std::any::Any;

/// A single review-level fact checkers may need without depending on the
/// full in-flight review request owned by the core pipeline.
#[derive(Debug, Clone)]
pub struct ReviewView {
    pub review_id: String,
    pub summary: String,
    pub description: String,
}

/// A comment a checker wants posted at a given anchor line.
///
/// `span` of 0 is normalized to 1 by the aggregator, not here — checkers
/// may legitimately emit 0 for "single line, unspecified".
#[derive(Debug, Clone)]
pub struct Comment {
    pub line: u32,
    pub span: u32,
    pub text: String,
    pub raise_issue: bool,
}

/// Opaque value threaded from a checker's review-level check into every
/// one of that checker's file-level checks for the same review.
pub type Passback = Box<dyn Any + Send + Sync>;
