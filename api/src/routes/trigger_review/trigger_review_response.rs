use serde::Serialize;

/// Response body returned after a review request has been accepted.
#[derive(Debug, Serialize)]
pub struct TriggerReviewResponse {
    pub review_id: String,
    pub message: String,
}
