use regex::Regex;
use serde_json::Value;
use uuid::Uuid;

use school_payment_gateway::repository::Repository;

use crate::helpers::{spawn_app, webhook_payload, SCHOOL_ID};

#[actix_web::test]
async fn create_payment_stores_pending_order() {
    let app = spawn_app().await;
    app.mount_gateway_success().await;
    let token = app
        .register_and_get_token("parent@example.com", "secret123")
        .await;

    let body = app.create_payment(&token, 500.0).await;

    let custom_order_id = body["data"]["customOrderId"].as_str().unwrap();
    let pattern = Regex::new(r"^ORD-\d+-[0-9a-f]{8}$").unwrap();
    assert!(pattern.is_match(custom_order_id));
    assert_eq!(
        body["data"]["redirectUrl"],
        "https://pg.example.com/collect/6808bc4888e4e3c149e757f1"
    );

    let response = app
        .get_with_token(&format!("/api/payments/status/{}", custom_order_id), &token)
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let status: Value = response.json().await.unwrap();
    assert_eq!(status["data"]["status"], "pending");
    assert_eq!(status["data"]["orderAmount"], 500.0);
    assert_eq!(status["data"]["transactionAmount"], 500.0);
    assert_eq!(status["data"]["schoolId"], SCHOOL_ID);

    let requests = app.gateway.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let sent: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(sent["amount"], "500");
    assert_eq!(
        sent["callback_url"],
        format!(
            "http://localhost:3000/payment/callback?order_id={}",
            custom_order_id
        )
    );
}

#[actix_web::test]
async fn gateway_failure_returns_500_and_keeps_order() {
    let app = spawn_app().await;
    app.mount_gateway_failure().await;
    let token = app
        .register_and_get_token("parent@example.com", "secret123")
        .await;

    let response = app
        .post_json_with_token(
            "/api/payments/create",
            &token,
            &serde_json::json!({
                "studentName": "Ravi Kumar",
                "studentId": "STU-42",
                "studentEmail": "ravi@example.com",
                "amount": 500
            }),
        )
        .await;

    assert_eq!(response.status().as_u16(), 500);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Failed to create payment request");

    let response = app.get_with_token("/api/payments/transactions", &token).await;
    let listing: Value = response.json().await.unwrap();
    assert_eq!(listing["data"]["pagination"]["total"], 1);
    assert_eq!(listing["data"]["transactions"][0]["status"], "pending");
    assert!(listing["data"]["transactions"][0]["collectRequestId"].is_null());
}

#[actix_web::test]
async fn duplicate_webhook_is_logged_and_emailed_twice() {
    let app = spawn_app().await;
    app.mount_gateway_success().await;
    let token = app
        .register_and_get_token("parent@example.com", "secret123")
        .await;
    let body = app.create_payment(&token, 500.0).await;
    let order_id = body["data"]["orderId"].as_str().unwrap();
    let payload = webhook_payload(order_id, "SUCCESS", 500.0);

    for _ in 0..2 {
        let response = app.post_webhook(&payload).await;
        assert_eq!(response.status().as_u16(), 200);
        let ack: Value = response.json().await.unwrap();
        assert_eq!(ack["success"], true);
    }

    assert_eq!(app.repository.webhook_logs().len(), 2);
    assert_eq!(app.emails_to("ravi@example.com").len(), 2);
    let status = app
        .repository
        .find_order_status(Uuid::parse_str(order_id).unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(status.status, "success");
    assert_eq!(status.version, 2);
}

#[actix_web::test]
async fn invalid_webhook_still_returns_200() {
    let app = spawn_app().await;

    let response = app
        .post_webhook(&serde_json::json!({"order_info": {"order_id": "x"}}))
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let ack: Value = response.json().await.unwrap();
    assert_eq!(ack["success"], false);
    assert_eq!(app.repository.webhook_logs().len(), 1);
}

#[actix_web::test]
async fn transactions_are_paginated() {
    let app = spawn_app().await;
    app.mount_gateway_success().await;
    let token = app
        .register_and_get_token("parent@example.com", "secret123")
        .await;
    for i in 0..25 {
        app.create_payment(&token, 100.0 + i as f64).await;
    }

    let response = app
        .get_with_token("/api/transactions?page=2&limit=10", &token)
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["transactions"].as_array().unwrap().len(), 10);
    assert_eq!(body["data"]["pagination"]["total"], 25);
    assert_eq!(body["data"]["pagination"]["page"], 2);
    assert_eq!(body["data"]["pagination"]["pages"], 3);

    let response = app
        .get_with_token("/api/transactions?page=3&limit=10", &token)
        .await;
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["transactions"].as_array().unwrap().len(), 5);
}

#[actix_web::test]
async fn unknown_transaction_is_not_found() {
    let app = spawn_app().await;
    let token = app
        .register_and_get_token("parent@example.com", "secret123")
        .await;

    let response = app
        .get_with_token("/api/transactions/ORD-1714032000000-deadbeef", &token)
        .await;

    assert_eq!(response.status().as_u16(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Transaction not found");
}

#[actix_web::test]
async fn malformed_query_is_a_bad_request() {
    let app = spawn_app().await;
    let token = app
        .register_and_get_token("parent@example.com", "secret123")
        .await;

    let response = app
        .get_with_token("/api/payments/transactions?page=abc", &token)
        .await;

    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
}
