use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use catsocial_db::DbError;
use catsocial_types::api::{AuthResponse, Envelope, LoginRequest, RegisterRequest};
use tracing::info;

use crate::{
    ApiError, AppState, auth,
    extract::ApiJson,
    state::run_blocking,
    validation::{FieldErrors, char_len_between, is_email},
};

fn check_credentials(errors: &mut FieldErrors, email: &str, password: &str) {
    errors.check(
        "email",
        email.chars().count() >= 5 && is_email(email),
        "must be a valid email address",
    );
    errors.check("password", char_len_between(password, 5, 15), "must be 5-15 characters");
}

fn issue(state: &AppState, user_id: i64, email: &str, name: &str) -> Result<AuthResponse, ApiError> {
    let access_token = auth::create_token(&state.jwt_secret, user_id, email, state.token_ttl)
        .map_err(|e| ApiError::internal("Token signing failed", e))?;
    Ok(AuthResponse {
        email: email.to_string(),
        name: name.to_string(),
        access_token,
    })
}

pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut errors = FieldErrors::default();
    check_credentials(&mut errors, &req.email, &req.password);
    errors.check("name", char_len_between(&req.name, 1, 50), "must be 1-50 characters");
    errors.finish()?;

    let RegisterRequest { email, name, password } = req;
    let user = run_blocking(&state, move |s| {
        // Skip the hashing cost for an address that is already taken.
        match s.db.get_user_by_email(&email) {
            Ok(_) => return Err(DbError::DuplicateEmail.into()),
            Err(DbError::NotFound) => {}
            Err(e) => return Err(e.into()),
        }
        let hash = auth::hash_password(&password, s.hash_cost)
            .map_err(|e| ApiError::internal("Password hashing failed", e))?;
        Ok(s.db.create_user(&email, &name, &hash)?)
    })
    .await?;

    info!("Registered user {} <{}>", user.id, user.email);
    let data = issue(&state, user.id, &user.email, &user.name)?;
    Ok((
        StatusCode::CREATED,
        Json(Envelope::new("User registered successfully", data)),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut errors = FieldErrors::default();
    check_credentials(&mut errors, &req.email, &req.password);
    errors.finish()?;

    let LoginRequest { email, password } = req;
    let user = run_blocking(&state, move |s| {
        let user = s
            .db
            .get_user_by_email(&email)
            .map_err(|e| ApiError::or_not_found(e, "user not found"))?;
        let valid = auth::verify_password(&password, &user.password)
            .map_err(|e| ApiError::internal("Password verification failed", e))?;
        if !valid {
            return Err(ApiError::BadRequest("invalid password".into()));
        }
        Ok(user)
    })
    .await?;

    info!("User {} logged in", user.id);
    let data = issue(&state, user.id, &user.email, &user.name)?;
    Ok(Json(Envelope::new("User logged successfully", data)))
}
