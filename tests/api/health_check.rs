use serde_json::Value;

use crate::helpers::spawn_app;

#[actix_web::test]
async fn health_check_works() {
    let app = spawn_app().await;

    let response = app
        .api_client
        .get(format!("{}/health", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert!(response.status().is_success());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["environment"], "test");
}

#[actix_web::test]
async fn openapi_document_is_served() {
    let app = spawn_app().await;

    let response = app
        .api_client
        .get(format!("{}/api-docs/openapi.json", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert!(response.status().is_success());
    let body: Value = response.json().await.unwrap();
    assert!(body["paths"]["/api/payments/create"].is_object());
}
