use serde_json::{json, Value};

use crate::helpers::spawn_app;

#[actix_web::test]
async fn register_rejects_duplicate_email() {
    let app = spawn_app().await;
    app.register_and_get_token("parent@example.com", "secret123")
        .await;

    let response = app
        .post_json(
            "/api/auth/register",
            &json!({"name": "Someone Else", "email": "parent@example.com", "password": "another1"}),
        )
        .await;

    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "User already exists");
}

#[actix_web::test]
async fn login_with_wrong_password_is_unauthorized() {
    let app = spawn_app().await;
    app.register_and_get_token("parent@example.com", "secret123")
        .await;

    let response = app
        .post_json(
            "/api/auth/login",
            &json!({"email": "parent@example.com", "password": "not-the-password"}),
        )
        .await;

    assert_eq!(response.status().as_u16(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Invalid credentials");
}

#[actix_web::test]
async fn profile_without_token_is_unauthorized() {
    let app = spawn_app().await;

    let response = app
        .api_client
        .get(format!("{}/api/auth/profile", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status().as_u16(), 401);
}

#[actix_web::test]
async fn profile_returns_registered_user() {
    let app = spawn_app().await;
    let token = app
        .register_and_get_token("Parent@Example.com", "secret123")
        .await;

    let response = app.get_with_token("/api/auth/profile", &token).await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["email"], "parent@example.com");
    assert_eq!(body["data"]["name"], "Meera Nair");
}

#[actix_web::test]
async fn forgot_password_answers_the_same_for_unknown_email() {
    let app = spawn_app().await;
    app.register_and_get_token("parent@example.com", "secret123")
        .await;

    let known = app
        .post_json(
            "/api/auth/forgot-password",
            &json!({"email": "parent@example.com"}),
        )
        .await;
    let unknown = app
        .post_json(
            "/api/auth/forgot-password",
            &json!({"email": "stranger@example.com"}),
        )
        .await;

    assert_eq!(known.status().as_u16(), 200);
    assert_eq!(unknown.status().as_u16(), 200);
    let known: Value = known.json().await.unwrap();
    let unknown: Value = unknown.json().await.unwrap();
    assert_eq!(known["message"], unknown["message"]);
    assert_eq!(app.repository.password_resets().len(), 1);
    assert!(app.emails_to("stranger@example.com").is_empty());
}
