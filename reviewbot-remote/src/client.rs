//! Typed HTTP client for the Review Board API.
//!
//! Every request carries the configured bearer token as `Authorization`.
//! Reads decode JSON (field-named, except diff-data lines which decode
//! positionally — see [`crate::types::Line`]); writes are
//! `multipart/form-data`, one form field per key/value pair in iteration
//! order. No retry, no custom timeout policy beyond the `reqwest` client's
//! defaults.

use reqwest::multipart::Form;
use reqwest::{Client, Method};
use tracing::debug;

use crate::errors::{Error, RbResult};
use crate::types::*;

/// Runtime configuration for the Review Board client.
#[derive(Debug, Clone)]
pub struct RbConfig {
    /// Base API URL, e.g. `"https://reviews.example.com/api"`.
    pub rb_api_url: String,
    /// Bearer token value sent verbatim as `Authorization` (including any
    /// scheme prefix configured, e.g. `"token abc123"`).
    pub rb_token: String,
}

/// Concrete Review Board HTTP client.
#[derive(Debug, Clone)]
pub struct RbClient {
    http: Client,
    cfg: RbConfig,
}

impl RbClient {
    /// Constructs a client with a fresh `reqwest::Client`.
    pub fn new(cfg: RbConfig) -> RbResult<Self> {
        let http = Client::builder().user_agent("reviewbot/0.1").build()?;
        Ok(Self { http, cfg })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.cfg.rb_api_url.trim_end_matches('/'), path)
    }

    /// `GET url`, decoding JSON into `T`. Extra headers (e.g. the
    /// diff-data `Accept` override) are layered on top of the standard
    /// `Authorization` header.
    pub async fn get_entity<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        extra_headers: &[(&str, &str)],
    ) -> RbResult<T> {
        let mut req = self
            .http
            .get(url)
            .header("Authorization", &self.cfg.rb_token);
        for (k, v) in extra_headers {
            req = req.header(*k, *v);
        }
        let resp = req.send().await?.error_for_status()?;
        let entity = resp.json::<T>().await?;
        Ok(entity)
    }

    /// `GET url`, returning the raw response bytes unparsed.
    pub async fn get_raw(&self, url: &str) -> RbResult<Vec<u8>> {
        let resp = self
            .http
            .get(url)
            .header("Authorization", &self.cfg.rb_token)
            .send()
            .await?
            .error_for_status()?;
        let bytes = resp.bytes().await?;
        Ok(bytes.to_vec())
    }

    /// Sends a `multipart/form-data` request, one field per pair in
    /// iteration order. If `decode` is `Some`, the response body is
    /// decoded into that type; otherwise the response is discarded.
    pub async fn send_form<T: serde::de::DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        pairs: &[(&str, &str)],
        decode: bool,
    ) -> RbResult<Option<T>> {
        let mut form = Form::new();
        for (k, v) in pairs {
            form = form.text((*k).to_string(), (*v).to_string());
        }

        let resp = self
            .http
            .request(method, url)
            .header("Authorization", &self.cfg.rb_token)
            .multipart(form)
            .send()
            .await?
            .error_for_status()?;

        if decode {
            let entity = resp.json::<T>().await?;
            Ok(Some(entity))
        } else {
            Ok(None)
        }
    }

    /// Fetches a review request by its string id.
    pub async fn get_review_request(&self, review_id: &str) -> RbResult<ReviewRequestPayload> {
        let url = self.url(&format!("/review-requests/{review_id}/"));
        let env: ReviewRequestEnvelope = self.get_entity(&url, &[]).await?;
        Ok(env.review_request)
    }

    /// Lists diffed files for a review from its latest-diff URL.
    pub async fn get_diffed_files(&self, latest_diff_url: &str) -> RbResult<DiffFileIndex> {
        let url = format!("{}/files/", latest_diff_url.trim_end_matches('/'));
        self.get_entity(&url, &[]).await
    }

    /// Assembles a single file's `FileDiff` from three requests: diff-data
    /// chunks, destination filename, and raw patched-file bytes.
    pub async fn get_file_diff(&self, entry: &DiffFileEntry) -> RbResult<FileDiff> {
        let self_href = entry
            .links
            .self_link
            .as_ref()
            .ok_or_else(|| Error::InvalidResponse("file entry missing self link".into()))?
            .href
            .clone();
        let patched_href = entry
            .links
            .patched_file
            .as_ref()
            .ok_or_else(|| Error::InvalidResponse("file entry missing patched_file link".into()))?
            .href
            .clone();

        debug!(file_id = entry.id, "fetching file diff");

        let diff_env: DiffDataEnvelope = self
            .get_entity(
                &self_href,
                &[("Accept", "application/vnd.reviewboard.org.diff.data+json")],
            )
            .await?;

        let meta_env: FileMetaEnvelope = self.get_entity(&self_href, &[]).await?;

        let entire_file = self.get_raw(&patched_href).await?;

        Ok(FileDiff {
            id: entry.id,
            filename: meta_env.file.dest_file,
            chunks: diff_env.diff_data.chunks,
            entire_file,
        })
    }

    /// Creates an empty review reply, returning its id.
    pub async fn create_reply(&self, review_id: &str) -> RbResult<u64> {
        let url = self.url(&format!("/review-requests/{review_id}/reviews/"));
        let env: Option<ReplyEnvelope> = self
            .send_form(Method::POST, &url, &[("body_top", "")], true)
            .await?;
        let env = env.ok_or_else(|| Error::InvalidResponse("no reply envelope".into()))?;
        Ok(env.review.id)
    }

    /// Posts a single diff comment.
    pub async fn post_comment(
        &self,
        review_id: &str,
        reply_id: u64,
        filediff_id: u64,
        first_line: u32,
        num_lines: u32,
        text: &str,
        raise_issue: bool,
    ) -> RbResult<()> {
        let url = self.url(&format!(
            "/review-requests/{review_id}/reviews/{reply_id}/diff-comments/"
        ));
        let filediff_id = filediff_id.to_string();
        let first_line = first_line.to_string();
        let num_lines = num_lines.to_string();
        let issue_opened = raise_issue.to_string();
        let pairs = [
            ("filediff_id", filediff_id.as_str()),
            ("first_line", first_line.as_str()),
            ("num_lines", num_lines.as_str()),
            ("text", text),
            ("issue_opened", issue_opened.as_str()),
        ];
        self.send_form::<serde_json::Value>(Method::POST, &url, &pairs, false)
            .await?;
        Ok(())
    }

    /// Lists the diff comments on a reply, for retraction.
    pub async fn list_reply_comments(
        &self,
        review_id: &str,
        reply_id: &str,
    ) -> RbResult<Vec<DiffCommentEntry>> {
        let url = self.url(&format!(
            "/review-requests/{review_id}/reviews/{reply_id}/diff-comments/"
        ));
        let idx: DiffCommentIndex = self.get_entity(&url, &[]).await?;
        Ok(idx.diff_comments)
    }

    /// Lists all replies on a review, for fallback retraction.
    pub async fn list_replies(&self, review_id: &str) -> RbResult<Vec<ReplyEntry>> {
        let url = self.url(&format!("/review-requests/{review_id}/reviews/"));
        let idx: ReplyIndex = self.get_entity(&url, &[]).await?;
        Ok(idx.reviews)
    }

    /// Drops (retracts) a single open-issue comment.
    pub async fn drop_comment(&self, comment_self_href: &str) -> RbResult<()> {
        self.send_form::<serde_json::Value>(
            Method::PUT,
            comment_self_href,
            &[("issue_status", "dropped")],
            false,
        )
        .await?;
        Ok(())
    }

    /// Publishes a review reply.
    #[allow(clippy::too_many_arguments)]
    pub async fn publish(
        &self,
        review_id: &str,
        reply_id: u64,
        body_top: &str,
        trivial: bool,
        body_bottom: Option<&str>,
    ) -> RbResult<()> {
        let url = self.url(&format!("/review-requests/{review_id}/reviews/{reply_id}/"));
        let mut pairs: Vec<(&str, &str)> = vec![
            ("public", "1"),
            ("body_top", body_top),
            ("body_top_text_type", "markdown"),
        ];
        if trivial {
            pairs.push(("trivial", "true"));
        }
        if let Some(bottom) = body_bottom {
            pairs.push(("body_bottom", bottom));
            pairs.push(("body_bottom_text_type", "markdown"));
        }
        self.send_form::<serde_json::Value>(Method::PUT, &url, &pairs, false)
            .await?;
        Ok(())
    }
}
