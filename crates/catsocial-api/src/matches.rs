use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use catsocial_db::models::MatchDetailRow;
use catsocial_types::api::{
    Claims, CreateMatchRequest, Envelope, IdParam, IdResponse, MatchActionRequest,
    MatchApprovedResponse, MatchCreatedResponse, MatchIssuer, MatchResponse,
};
use tracing::info;

use crate::{
    ApiError, AppState,
    cats::to_response as cat_response,
    extract::{ApiJson, ApiPath},
    state::run_blocking,
    validation::{FieldErrors, char_len_between},
};

fn parse_id(errors: &mut FieldErrors, field: &str, id: &IdParam) -> i64 {
    id.as_i64().unwrap_or_else(|| {
        errors.add(field, "must be a numeric id");
        0
    })
}

fn match_response(row: MatchDetailRow) -> MatchResponse {
    MatchResponse {
        id: row.record.id.to_string(),
        issued_by: MatchIssuer {
            name: row.issuer_name,
            email: row.issuer_email,
            created_at: row.issuer_created_at,
        },
        match_cat_detail: cat_response(row.match_cat),
        user_cat_detail: cat_response(row.user_cat),
        message: row.record.message,
        status: row.record.status,
        created_at: row.record.created_at,
    }
}

pub async fn create_match(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<CreateMatchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut errors = FieldErrors::default();
    let match_cat_id = parse_id(&mut errors, "matchCatId", &req.match_cat_id);
    let user_cat_id = parse_id(&mut errors, "userCatId", &req.user_cat_id);
    errors.check("message", char_len_between(&req.message, 5, 120), "must be 5-120 characters");
    errors.finish()?;

    let issuer_id = claims.sub;
    let message = req.message;
    let record = run_blocking(&state, move |s| {
        s.db.create_match(issuer_id, user_cat_id, match_cat_id, &message)
            .map_err(|e| ApiError::or_not_found(e, "cat not found"))
    })
    .await?;

    info!(
        "User {} proposed cat {} to cat {} (match {})",
        issuer_id, user_cat_id, match_cat_id, record.id
    );
    Ok((
        StatusCode::CREATED,
        Json(Envelope::success(MatchCreatedResponse {
            id: record.id.to_string(),
            created_at: record.created_at,
        })),
    ))
}

pub async fn list_matches(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = claims.sub;
    let rows = run_blocking(&state, move |s| Ok(s.db.list_related_matches(user_id)?)).await?;

    let data: Vec<MatchResponse> = rows.into_iter().map(match_response).collect();
    Ok(Json(Envelope::success(data)))
}

fn action_id(req: &MatchActionRequest) -> Result<i64, ApiError> {
    let mut errors = FieldErrors::default();
    let id = parse_id(&mut errors, "matchId", &req.match_id);
    errors.finish()?;
    Ok(id)
}

pub async fn approve_match(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<MatchActionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = action_id(&req)?;
    let caller_id = claims.sub;
    let approved = run_blocking(&state, move |s| {
        s.db.approve_match(id, caller_id)
            .map_err(|e| ApiError::or_not_found(e, "match not found"))
    })
    .await?;

    Ok(Json(Envelope::success(MatchApprovedResponse {
        id: approved.match_id.to_string(),
        removed_matches: approved.removed,
    })))
}

pub async fn reject_match(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<MatchActionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = action_id(&req)?;
    let caller_id = claims.sub;
    run_blocking(&state, move |s| {
        s.db.reject_match(id, caller_id)
            .map_err(|e| ApiError::or_not_found(e, "match not found"))
    })
    .await?;

    Ok(Json(Envelope::success(IdResponse { id: id.to_string() })))
}

pub async fn delete_match(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let caller_id = claims.sub;
    run_blocking(&state, move |s| {
        s.db.delete_match(id, caller_id)
            .map_err(|e| ApiError::or_not_found(e, "match not found"))
    })
    .await?;

    info!("User {} deleted match {}", caller_id, id);
    Ok(Json(Envelope::success(IdResponse { id: id.to_string() })))
}
