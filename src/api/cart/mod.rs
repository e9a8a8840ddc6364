//! Cart API 模块

mod handler;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/cart", cart_routes())
}

fn cart_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::get_cart))
        .route("/add", post(handler::add_item))
        .route("/update/{item_id}", put(handler::update_item))
        .route("/remove/{item_id}", delete(handler::remove_item))
        .route("/clear", delete(handler::clear_cart))
        .route("/checkout", post(handler::checkout))
}
