use axum::Router;

use crate::state::AppState;

mod jobs;
mod plans;
mod templates;

pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(templates::routes())
        .merge(plans::routes())
        .merge(jobs::routes())
}
