//! The seam `reviewbot-core` depends on generically.
//!
//! Review Board is the only backend in scope for this workspace, so a
//! single trait — implemented once for real traffic
//! ([`crate::client::RbClient`]) and once per test by an in-memory fake —
//! is enough; no enum dispatch or `Box<dyn Trait>` is needed.

use crate::errors::RbResult;
use crate::types::{DiffCommentEntry, DiffFileEntry, DiffFileIndex, FileDiff, ReplyEntry, ReviewRequestPayload};

/// Everything the review pipeline needs from a Review Board server.
pub trait ReviewBoardApi: Send + Sync {
    fn get_review_request(
        &self,
        review_id: &str,
    ) -> impl std::future::Future<Output = RbResult<ReviewRequestPayload>> + Send;

    fn get_diffed_files(
        &self,
        latest_diff_url: &str,
    ) -> impl std::future::Future<Output = RbResult<DiffFileIndex>> + Send;

    fn get_file_diff(
        &self,
        entry: &DiffFileEntry,
    ) -> impl std::future::Future<Output = RbResult<FileDiff>> + Send;

    fn create_reply(
        &self,
        review_id: &str,
    ) -> impl std::future::Future<Output = RbResult<u64>> + Send;

    #[allow(clippy::too_many_arguments)]
    fn post_comment(
        &self,
        review_id: &str,
        reply_id: u64,
        filediff_id: u64,
        first_line: u32,
        num_lines: u32,
        text: &str,
        raise_issue: bool,
    ) -> impl std::future::Future<Output = RbResult<()>> + Send;

    fn list_reply_comments(
        &self,
        review_id: &str,
        reply_id: &str,
    ) -> impl std::future::Future<Output = RbResult<Vec<DiffCommentEntry>>> + Send;

    fn list_replies(
        &self,
        review_id: &str,
    ) -> impl std::future::Future<Output = RbResult<Vec<ReplyEntry>>> + Send;

    fn drop_comment(
        &self,
        comment_self_href: &str,
    ) -> impl std::future::Future<Output = RbResult<()>> + Send;

    fn publish(
        &self,
        review_id: &str,
        reply_id: u64,
        body_top: &str,
        trivial: bool,
        body_bottom: Option<&str>,
    ) -> impl std::future::Future<Output = RbResult<()>> + Send;
}

impl ReviewBoardApi for crate::client::RbClient {
    async fn get_review_request(&self, review_id: &str) -> RbResult<ReviewRequestPayload> {
        crate::client::RbClient::get_review_request(self, review_id).await
    }

    async fn get_diffed_files(&self, latest_diff_url: &str) -> RbResult<DiffFileIndex> {
        crate::client::RbClient::get_diffed_files(self, latest_diff_url).await
    }

    async fn get_file_diff(&self, entry: &DiffFileEntry) -> RbResult<FileDiff> {
        crate::client::RbClient::get_file_diff(self, entry).await
    }

    async fn create_reply(&self, review_id: &str) -> RbResult<u64> {
        crate::client::RbClient::create_reply(self, review_id).await
    }

    async fn post_comment(
        &self,
        review_id: &str,
        reply_id: u64,
        filediff_id: u64,
        first_line: u32,
        num_lines: u32,
        text: &str,
        raise_issue: bool,
    ) -> RbResult<()> {
        crate::client::RbClient::post_comment(
            self,
            review_id,
            reply_id,
            filediff_id,
            first_line,
            num_lines,
            text,
            raise_issue,
        )
        .await
    }

    async fn list_reply_comments(
        &self,
        review_id: &str,
        reply_id: &str,
    ) -> RbResult<Vec<DiffCommentEntry>> {
        crate::client::RbClient::list_reply_comments(self, review_id, reply_id).await
    }

    async fn list_replies(&self, review_id: &str) -> RbResult<Vec<ReplyEntry>> {
        crate::client::RbClient::list_replies(self, review_id).await
    }

    async fn drop_comment(&self, comment_self_href: &str) -> RbResult<()> {
        crate::client::RbClient::drop_comment(self, comment_self_href).await
    }

    async fn publish(
        &self,
        review_id: &str,
        reply_id: u64,
        body_top: &str,
        trivial: bool,
        body_bottom: Option<&str>,
    ) -> RbResult<()> {
        crate::client::RbClient::publish(self, review_id, reply_id, body_top, trivial, body_bottom)
            .await
    }
}
