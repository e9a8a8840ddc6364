//! Upload API 模块

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/upload", upload_routes())
}

fn upload_routes() -> Router<ServerState> {
    Router::new()
        .route("/image", post(handler::upload_image))
        .route("/images", post(handler::upload_images))
}
