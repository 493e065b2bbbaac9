use axum::{response::IntoResponse, Json};

use crate::middleware::AuthUser;

/// Example role-gated route; the admin guard runs before this handler.
pub async fn admin_only(AuthUser(claims): AuthUser) -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "This is an admin-only route",
        "subject": claims.sub,
    }))
}
