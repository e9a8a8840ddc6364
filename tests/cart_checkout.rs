//! End-to-end tests for cart mutation and the cart→order transition.

mod common;

use axum::http::StatusCode;
use common::{authenticate, list_product, shipping_address, spawn_app};
use serde_json::json;

#[tokio::test]
async fn empty_cart_read_creates_no_row() {
    let app = spawn_app().await;
    let (token, user_id) = authenticate(&app, "bob", "bob@x.com", "pw123456").await;

    let (status, body) = app.request("GET", "/api/cart", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_items"], 0);
    assert_eq!(body["total_price"], 0.0);
    assert_eq!(body["items"].as_array().unwrap().len(), 0);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cart WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn scenario_20_dollar_listing_times_three() {
    let app = spawn_app().await;
    let (seller_token, _) = authenticate(&app, "sam", "sam@x.com", "pw123456").await;
    let (buyer_token, _) = authenticate(&app, "bob", "bob@x.com", "pw123456").await;

    // Seller lists a $20 product saving 2 kg CO₂; buyer adds quantity 3.
    let product_id = list_product(&app, &seller_token, "Desk Lamp", 20.0, 2.0).await;

    let (status, body) = app
        .request(
            "POST",
            "/api/cart/add",
            Some(&buyer_token),
            Some(json!({ "product_id": product_id, "quantity": 3 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_items"], 3);
    assert_eq!(body["total_price"], 60.0);
    assert_eq!(body["total_co2_saved"], 6.0);

    // Checkout → order totals match the cart, cart is now empty.
    let (status, body) = app
        .request(
            "POST",
            "/api/cart/checkout",
            Some(&buyer_token),
            Some(json!({ "shipping_address": shipping_address() })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let order = &body["order"];
    assert_eq!(order["total_amount"], 60.0);
    assert_eq!(order["total_co2_saved"], 6.0);
    assert_eq!(order["status"], "pending");
    assert_eq!(order["items"].as_array().unwrap().len(), 1);
    assert_eq!(order["items"][0]["quantity"], 3);
    assert_eq!(order["items"][0]["price"], 20.0);
    assert!(order["order_number"].as_str().unwrap().starts_with("ECO-"));

    let (_, cart) = app.request("GET", "/api/cart", Some(&buyer_token), None).await;
    assert_eq!(cart["total_items"], 0);
    assert_eq!(cart["items"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn adding_own_product_is_rejected() {
    let app = spawn_app().await;
    let (seller_token, _) = authenticate(&app, "sam", "sam@x.com", "pw123456").await;
    let product_id = list_product(&app, &seller_token, "Desk Lamp", 20.0, 2.0).await;

    let (status, body) = app
        .request(
            "POST",
            "/api/cart/add",
            Some(&seller_token),
            Some(json!({ "product_id": product_id })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Cannot add your own product to cart");
}

#[tokio::test]
async fn missing_or_delisted_product_is_not_addable() {
    let app = spawn_app().await;
    let (seller_token, _) = authenticate(&app, "sam", "sam@x.com", "pw123456").await;
    let (buyer_token, _) = authenticate(&app, "bob", "bob@x.com", "pw123456").await;
    let product_id = list_product(&app, &seller_token, "Desk Lamp", 20.0, 2.0).await;

    let (status, _) = app
        .request(
            "POST",
            "/api/cart/add",
            Some(&buyer_token),
            Some(json!({ "product_id": 999_999_999 })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Delist, then try to add.
    let (status, _) = app
        .request(
            "DELETE",
            &format!("/api/products/{product_id}"),
            Some(&seller_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .request(
            "POST",
            "/api/cart/add",
            Some(&buyer_token),
            Some(json!({ "product_id": product_id })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn repeated_adds_merge_and_mutations_recompute_totals() {
    let app = spawn_app().await;
    let (seller_token, _) = authenticate(&app, "sam", "sam@x.com", "pw123456").await;
    let (buyer_token, _) = authenticate(&app, "bob", "bob@x.com", "pw123456").await;
    let lamp = list_product(&app, &seller_token, "Desk Lamp", 20.0, 2.0).await;
    let chair = list_product(&app, &seller_token, "Chair", 35.0, 5.0).await;

    app.request(
        "POST",
        "/api/cart/add",
        Some(&buyer_token),
        Some(json!({ "product_id": lamp, "quantity": 1 })),
    )
    .await;
    app.request(
        "POST",
        "/api/cart/add",
        Some(&buyer_token),
        Some(json!({ "product_id": lamp, "quantity": 2 })),
    )
    .await;
    let (_, body) = app
        .request(
            "POST",
            "/api/cart/add",
            Some(&buyer_token),
            Some(json!({ "product_id": chair })),
        )
        .await;

    // One merged line for the lamp (qty 3) plus the chair.
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(body["total_items"], 4);
    assert_eq!(body["total_price"], 95.0);

    // Update lamp quantity to 1.
    let lamp_item_id = items
        .iter()
        .find(|i| i["product_id"].as_i64() == Some(lamp))
        .unwrap()["id"]
        .as_i64()
        .unwrap();
    let (status, body) = app
        .request(
            "PUT",
            &format!("/api/cart/update/{lamp_item_id}"),
            Some(&buyer_token),
            Some(json!({ "quantity": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_price"], 55.0);

    // Remove the chair.
    let chair_item_id = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|i| i["product_id"].as_i64() == Some(chair))
        .unwrap()["id"]
        .as_i64()
        .unwrap();
    let (status, body) = app
        .request(
            "DELETE",
            &format!("/api/cart/remove/{chair_item_id}"),
            Some(&buyer_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_items"], 1);
    assert_eq!(body["total_price"], 20.0);

    // Quantity below 1 is invalid.
    let (status, _) = app
        .request(
            "PUT",
            &format!("/api/cart/update/{lamp_item_id}"),
            Some(&buyer_token),
            Some(json!({ "quantity": 0 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Clear.
    let (status, _) = app
        .request("DELETE", "/api/cart/clear", Some(&buyer_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = app.request("GET", "/api/cart", Some(&buyer_token), None).await;
    assert_eq!(body["total_items"], 0);
}

#[tokio::test]
async fn delisted_product_is_hidden_from_view_but_blocks_checkout() {
    let app = spawn_app().await;
    let (seller_token, _) = authenticate(&app, "sam", "sam@x.com", "pw123456").await;
    let (buyer_token, _) = authenticate(&app, "bob", "bob@x.com", "pw123456").await;
    let lamp = list_product(&app, &seller_token, "Desk Lamp", 20.0, 2.0).await;
    let chair = list_product(&app, &seller_token, "Chair", 35.0, 5.0).await;

    app.request(
        "POST",
        "/api/cart/add",
        Some(&buyer_token),
        Some(json!({ "product_id": lamp, "quantity": 1 })),
    )
    .await;
    app.request(
        "POST",
        "/api/cart/add",
        Some(&buyer_token),
        Some(json!({ "product_id": chair, "quantity": 1 })),
    )
    .await;

    // Seller delists the lamp after it entered the cart.
    app.request(
        "DELETE",
        &format!("/api/products/{lamp}"),
        Some(&seller_token),
        None,
    )
    .await;

    // View hides the delisted line and its totals.
    let (_, body) = app.request("GET", "/api/cart", Some(&buyer_token), None).await;
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["total_price"], 35.0);

    // Checkout refuses, naming the unavailable title, and the cart rows
    // are untouched.
    let (status, body) = app
        .request(
            "POST",
            "/api/cart/checkout",
            Some(&buyer_token),
            Some(json!({ "shipping_address": shipping_address() })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("no longer available"));
    assert!(message.contains("Desk Lamp"));

    let rows: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM cart_item ci JOIN cart c ON c.id = ci.cart_id \
         JOIN user u ON u.id = c.user_id WHERE u.username = 'bob'",
    )
    .fetch_one(&app.pool)
    .await
    .unwrap();
    assert_eq!(rows, 2);

    // No order was created either.
    let orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(orders, 0);
}

#[tokio::test]
async fn checkout_requires_items_and_address() {
    let app = spawn_app().await;
    let (buyer_token, _) = authenticate(&app, "bob", "bob@x.com", "pw123456").await;

    // Empty cart.
    let (status, body) = app
        .request(
            "POST",
            "/api/cart/checkout",
            Some(&buyer_token),
            Some(json!({ "shipping_address": shipping_address() })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Cart is empty");

    // Address with a blank street.
    let (status, _) = app
        .request(
            "POST",
            "/api/cart/checkout",
            Some(&buyer_token),
            Some(json!({ "shipping_address": {
                "street": " ", "city": "Springfield", "state": "IL", "zip_code": "62701"
            }})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn checkout_freezes_prices_against_later_edits() {
    let app = spawn_app().await;
    let (seller_token, _) = authenticate(&app, "sam", "sam@x.com", "pw123456").await;
    let (buyer_token, _) = authenticate(&app, "bob", "bob@x.com", "pw123456").await;
    let lamp = list_product(&app, &seller_token, "Desk Lamp", 20.0, 2.0).await;

    app.request(
        "POST",
        "/api/cart/add",
        Some(&buyer_token),
        Some(json!({ "product_id": lamp, "quantity": 1 })),
    )
    .await;
    let (_, body) = app
        .request(
            "POST",
            "/api/cart/checkout",
            Some(&buyer_token),
            Some(json!({ "shipping_address": shipping_address(), "payment_method": "paypal" })),
        )
        .await;
    let order_id = body["order"]["id"].as_i64().unwrap();
    assert_eq!(body["order"]["payment_method"], "paypal");

    // Seller re-prices after the sale.
    app.request(
        "PUT",
        &format!("/api/products/{lamp}"),
        Some(&seller_token),
        Some(json!({ "price": 500.0 })),
    )
    .await;

    let (_, order) = app
        .request(
            "GET",
            &format!("/api/orders/{order_id}"),
            Some(&buyer_token),
            None,
        )
        .await;
    assert_eq!(order["total_amount"], 20.0);
    assert_eq!(order["items"][0]["price"], 20.0);
}
