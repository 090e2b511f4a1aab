pub mod content_directory;
pub mod description;
pub mod media;
pub mod state;

use axum::http::{header, HeaderName, HeaderValue};
use axum::routing::{get, post};
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::device::{RES_PATH, ROOT_DESC_PATH, SERVER_FIELD, SERVICES};
use crate::http::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let cds = SERVICES[0];
    Router::new()
        .route(ROOT_DESC_PATH, get(description::serve_root_desc))
        .route(cds.scpd_url, get(description::serve_cds_scpd))
        .route(cds.control_url, post(content_directory::control))
        .route(RES_PATH, get(media::serve_resource))
        // Every response carries the UPnP server token and an empty Ext.
        .layer(SetResponseHeaderLayer::overriding(
            header::SERVER,
            HeaderValue::from_static(SERVER_FIELD),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("ext"),
            HeaderValue::from_static(""),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
