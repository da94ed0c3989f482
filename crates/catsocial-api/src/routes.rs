use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};

use crate::{AppState, cats, matches, middleware::require_auth, users};

async fn ping() -> &'static str {
    "pong"
}

/// Build the full application router. Everything under `/v1/cat` requires a
/// bearer token.
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/ping", get(ping))
        .route("/v1/user/register", post(users::register))
        .route("/v1/user/login", post(users::login));

    let protected = Router::new()
        .route("/v1/cat", get(cats::list_cats).post(cats::create_cat))
        .route("/v1/cat/{id}", put(cats::update_cat).delete(cats::delete_cat))
        .route(
            "/v1/cat/match",
            get(matches::list_matches).post(matches::create_match),
        )
        .route("/v1/cat/match/approve", post(matches::approve_match))
        .route("/v1/cat/match/reject", post(matches::reject_match))
        .route("/v1/cat/match/{id}", delete(matches::delete_match))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new().merge(public).merge(protected).with_state(state)
}
