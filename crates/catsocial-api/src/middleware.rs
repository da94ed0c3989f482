use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use catsocial_db::DbError;
use tracing::warn;

use crate::{ApiError, AppState, auth, state::run_blocking};

/// Validate the bearer token, confirm its user still exists, and attach the
/// `Claims` to the request.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::Unauthorized("missing bearer token".into()))?;

    let claims = auth::decode_token(&state.jwt_secret, token).map_err(|e| {
        warn!("Rejected token: {}", e);
        ApiError::Unauthorized("invalid or expired token".into())
    })?;

    let user_id = claims.sub;
    let exists = run_blocking(&state, move |s| match s.db.get_user_by_id(user_id) {
        Ok(_) => Ok(true),
        Err(DbError::NotFound) => Ok(false),
        Err(e) => Err(e.into()),
    })
    .await?;
    if !exists {
        warn!("Rejected token for unknown user {}", user_id);
        return Err(ApiError::Unauthorized("user no longer exists".into()));
    }

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
