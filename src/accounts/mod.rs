use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod services;
pub mod tokens;

#[cfg(test)]
pub(crate) mod mocks;

pub use services::AccountService;

pub fn router() -> Router<AppState> {
    handlers::account_routes()
}
