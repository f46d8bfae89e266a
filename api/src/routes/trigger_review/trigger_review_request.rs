use serde::Deserialize;

/// Request body for triggering a review.
///
/// Sent by whatever watches the review server for new/updated review
/// requests; the direct port of the original's HTTP trigger payload
/// (`secret`, `review_id`, `force`).
#[derive(Debug, Deserialize)]
pub struct TriggerReviewRequest {
    /// Shared secret used to protect the endpoint from unauthorized calls.
    pub secret: String,
    /// Review Board review request id, as a string (matches the id embedded
    /// in review-board webhook URLs).
    pub review_id: String,
    /// Forces a re-review even if this diff was already reviewed.
    #[serde(default)]
    pub force: bool,
}
