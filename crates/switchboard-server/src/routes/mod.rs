pub mod chat;
pub mod crews;
pub mod research;

use crate::state::AppState;
use axum::Router;

pub fn configure(state: AppState) -> Router {
    Router::new()
        .merge(chat::routes(state.clone()))
        .merge(research::routes(state.clone()))
        .merge(crews::routes(state))
}
