use crate::error::ApiError;
use crate::store::MarksheetStore;
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct SubscriptionQuery {
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatus {
    success: bool,
    has_subscription: bool,
    subscription_count: usize,
}

/// `POST /api/subscription-check` reports a user's active push subscriptions
pub async fn check<S: MarksheetStore>(
    State(state): State<AppState<S>>,
    body: Result<Json<SubscriptionQuery>, JsonRejection>,
) -> Result<Json<SubscriptionStatus>, ApiError> {
    let Json(query) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let email = query
        .email
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Email is required".to_string()))?;

    let user = state
        .service
        .store()
        .find_user(email.trim())
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let count = user.active_subscriptions();
    Ok(Json(SubscriptionStatus {
        success: true,
        has_subscription: count > 0,
        subscription_count: count,
    }))
}
