use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::Response,
};
use reviewbot_core::ReviewRequest;
use tokio::sync::oneshot;
use tracing::{info, instrument, warn};

use crate::{
    core::{
        app_state::AppState,
        http::response_envelope::{ApiErrorDetail, ApiResponse},
    },
    routes::trigger_review::{
        trigger_review_request::TriggerReviewRequest, trigger_review_response::TriggerReviewResponse,
    },
};

/// `POST /trigger`: accepts `{secret, review_id, force}`, validates the
/// shared secret, and enqueues a [`ReviewRequest`] for the dispatcher.
///
/// The review itself runs asynchronously; this route does not wait for it
/// to finish, matching the original trigger endpoint which never reads
/// back from its own result channel.
#[instrument(name = "trigger_review_route", skip(state, body))]
pub async fn trigger_review_route(
    State(state): State<Arc<AppState>>,
    Json(body): Json<TriggerReviewRequest>,
) -> Response {
    let expected_secret = state.trigger_secret.trim();
    let provided_secret = body.secret.trim();

    if expected_secret.is_empty() {
        let details = vec![ApiErrorDetail {
            path: Some("secret".into()),
            hint: Some("Trigger secret is not configured on the server side.".into()),
        }];
        return ApiResponse::<()>::error(
            "SERVER_CONFIG_ERROR",
            "Trigger secret is not configured.",
            details,
        )
        .into_response_with_status(StatusCode::INTERNAL_SERVER_ERROR);
    }

    if provided_secret.is_empty() || provided_secret != expected_secret {
        let details = vec![ApiErrorDetail {
            path: Some("secret".into()),
            hint: Some("Secret does not match the configured trigger secret.".into()),
        }];
        return ApiResponse::<()>::error("UNAUTHORIZED", "Invalid trigger secret.", details)
            .into_response_with_status(StatusCode::UNAUTHORIZED);
    }

    if body.review_id.trim().is_empty() {
        let details = vec![ApiErrorDetail {
            path: Some("review_id".into()),
            hint: Some("review_id must be a non-empty string.".into()),
        }];
        return ApiResponse::<()>::error("BAD_REQUEST", "Missing review_id.", details)
            .into_response_with_status(StatusCode::BAD_REQUEST);
    }

    let (result_tx, _result_rx) = oneshot::channel();
    let request = ReviewRequest::unenriched(body.review_id.clone(), body.force, result_tx);

    info!(review_id = %body.review_id, force = body.force, "enqueueing review request");

    if state.dispatch_tx.send(request).await.is_err() {
        warn!(review_id = %body.review_id, "dispatcher channel closed, review not enqueued");
        return ApiResponse::<()>::error(
            "DISPATCHER_UNAVAILABLE",
            "The review dispatcher is not accepting requests.",
            Vec::new(),
        )
        .into_response_with_status(StatusCode::SERVICE_UNAVAILABLE);
    }

    ApiResponse::success(TriggerReviewResponse {
        review_id: body.review_id,
        message: "review request accepted".to_string(),
    })
    .into_response_with_status(StatusCode::ACCEPTED)
}
