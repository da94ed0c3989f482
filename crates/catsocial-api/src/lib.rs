pub mod auth;
pub mod cats;
pub mod error;
pub mod extract;
pub mod matches;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod users;
mod validation;

pub use error::ApiError;
pub use routes::router;
pub use state::{AppState, AppStateInner};
