//! User request handlers.

use axum::Json;

use crate::error::AppResult;
use crate::middleware::auth::CurrentUser;
use crate::models::CurrentUserResponse;

/// `GET /user/current` — the identity resolved by the session
/// validator for this request.
pub async fn current_user_handler(
    axum::Extension(user): axum::Extension<CurrentUser>,
) -> AppResult<Json<CurrentUserResponse>> {
    Ok(Json(CurrentUserResponse {
        user: user.0.into(),
    }))
}
