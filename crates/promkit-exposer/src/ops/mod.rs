//! Scrape handler.
//!
//! Mounted as the router fallback so endpoints can be added while serving:
//! - known path, `GET`/`HEAD` : 200 with the text exposition
//! - known path, other method : 405
//! - unknown path             : 404
//! - collect or encode failure: 500 with a short plain-text reason, no partial body

use std::time::Instant;

use axum::{
    extract::State,
    http::{header, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};

use promkit_core::text;

use crate::app_state::ExposerState;

pub async fn scrape(State(state): State<ExposerState>, method: Method, uri: Uri) -> Response {
    let path = uri.path();
    let Some(endpoint) = state.endpoint(path) else {
        return (StatusCode::NOT_FOUND, "not found").into_response();
    };
    if method != Method::GET && method != Method::HEAD {
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            [(header::ALLOW, "GET, HEAD")],
            "method not allowed",
        )
            .into_response();
    }

    let started = Instant::now();
    let body = match endpoint.collect().and_then(|families| text::encode(&families)) {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(
                path,
                class = e.class().as_str(),
                error = %e,
                "scrape failed"
            );
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                format!("{}: {e}", e.class().as_str()),
            )
                .into_response();
        }
    };

    let elapsed = started.elapsed();
    endpoint.metrics().record(body.len(), elapsed);
    tracing::debug!(path, bytes = body.len(), elapsed_us = elapsed.as_micros() as u64, "scrape served");

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, text::CONTENT_TYPE)],
        body,
    )
        .into_response()
}
