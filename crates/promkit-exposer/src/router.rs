//! Axum router wiring.
//!
//! Every request goes through the scrape fallback, which resolves the path
//! against the endpoints mounted at that moment.

use axum::Router;

use crate::{app_state::ExposerState, ops};

pub fn build_router(state: ExposerState) -> Router {
    Router::new().fallback(ops::scrape).with_state(state)
}
