//! Review Board's normalized data model, as consumed by the review pipeline.
//!
//! These are the "normalized output" of the remote client: diff chunks and
//! lines are positionally decoded from Review Board's diff-data JSON, not
//! field-named, per the documented wire contract.

use serde::de::{self, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A unique reference to a review request on the Review Board server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ReviewId(pub String);

impl fmt::Display for ReviewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A Review Board `link` object: `{href, method}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    #[serde(default)]
    pub method: Option<String>,
}

/// Review Board's link container as attached to a review request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkContainer {
    #[serde(default)]
    pub diffs: Option<Link>,
    #[serde(default, rename = "latest_diff")]
    pub latest_diff: Option<Link>,
    #[serde(default, rename = "patched_file")]
    pub patched_file: Option<Link>,
    #[serde(default, rename = "self")]
    pub self_link: Option<Link>,
}

/// Envelope around a review request as returned by
/// `GET /review-requests/<id>/`.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewRequestEnvelope {
    pub review_request: ReviewRequestPayload,
}

/// The fields of a review request that Review Board provides.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewRequestPayload {
    pub id: u64,
    pub summary: String,
    #[serde(default)]
    pub links: LinkContainer,
}

/// One entry in the diffed-files index:
/// `GET <latest-diff-url>/files/` → `{files: [...] }`.
#[derive(Debug, Clone, Deserialize)]
pub struct DiffFileEntry {
    pub id: u64,
    pub links: LinkContainer,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiffFileIndex {
    pub files: Vec<DiffFileEntry>,
}

/// `GET <file.self>` default accept → `{file: {dest_file}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct FileMetaEnvelope {
    pub file: FileMeta,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileMeta {
    pub dest_file: String,
}

/// One changed/context line inside a diff chunk.
///
/// Decoded positionally from Review Board's row-oriented JSON array:
/// index 0 = internal review line, 4 = right-hand line, 5 = right-hand text
/// (HTML-unescaped), 7 = whitespace-only flag. Field-named decoding is
/// deliberately not attempted; the wire shape is a bare array, not an
/// object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// The server's internal coordinate used for comment anchoring.
    pub review_line: u32,
    /// The line number from the right-hand (new) file in the diff.
    pub rh_line: u32,
    /// The modified line text, HTML-unescaped.
    pub rh_text: String,
    /// Whether this line consists only of whitespace changes.
    pub whitespace_only: bool,
}

impl<'de> Deserialize<'de> for Line {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct LineVisitor;

        impl<'de> Visitor<'de> for LineVisitor {
            type Value = Line;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a Review Board diff-data line row")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Line, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut values: Vec<serde_json::Value> = Vec::new();
                while let Some(v) = seq.next_element::<serde_json::Value>()? {
                    values.push(v);
                }
                if values.len() < 8 {
                    return Err(de::Error::custom(format!(
                        "diff-data line row has {} elements, need at least 8",
                        values.len()
                    )));
                }

                let review_line = values[0].as_f64().unwrap_or(0.0) as u32;
                let rh_line = values[4].as_f64().unwrap_or(0.0) as u32;
                let raw_text = values[5].as_str().unwrap_or_default();
                let rh_text = html_escape::decode_html_entities(raw_text).into_owned();
                let whitespace_only = values[7].as_bool().unwrap_or(false);

                Ok(Line {
                    review_line,
                    rh_line,
                    rh_text,
                    whitespace_only,
                })
            }
        }

        deserializer.deserialize_seq(LineVisitor)
    }
}

/// A contiguous span of lines sharing one change kind.
#[derive(Debug, Clone, Deserialize)]
pub struct DiffChunk {
    pub change: ChangeKind,
    pub lines: Vec<Line>,
}

/// The kind of change a diff chunk represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Insert,
    Replace,
    Delete,
    Equal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiffData {
    pub chunks: Vec<DiffChunk>,
}

/// `GET <file.self>` with the diff-data accept header.
#[derive(Debug, Clone, Deserialize)]
pub struct DiffDataEnvelope {
    pub diff_data: DiffData,
}

/// The diff of an entire file, assembled from three requests by
/// [`crate::client::RbClient::get_file_diff`].
#[derive(Debug, Clone)]
pub struct FileDiff {
    pub id: u64,
    pub filename: String,
    pub chunks: Vec<DiffChunk>,
    pub entire_file: Vec<u8>,
}

/// Response envelope from creating an empty reply.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplyEnvelope {
    pub review: ReplyPayload,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplyPayload {
    pub id: u64,
}

/// One diff comment as returned by the retraction engine's listing call.
#[derive(Debug, Clone, Deserialize)]
pub struct DiffCommentEntry {
    pub issue_opened: bool,
    pub issue_status: String,
    pub links: DiffCommentLinks,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiffCommentLinks {
    #[serde(rename = "self")]
    pub self_link: Link,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiffCommentIndex {
    pub diff_comments: Vec<DiffCommentEntry>,
}

/// One reply on a review, as returned by the fallback reply listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplyEntry {
    pub id: u64,
    pub links: ReplyLinks,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplyLinks {
    pub user: ReplyUser,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplyUser {
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplyIndex {
    pub reviews: Vec<ReplyEntry>,
}
