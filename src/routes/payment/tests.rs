#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{test, web, App};
    use secrecy::ExposeSecret;
    use serde_json::{json, Value};
    use uuid::Uuid;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::constants::WEBHOOK_MAX_BODY_BYTES;
    use crate::payment_client::PaymentClient;
    use crate::repository::Repository;
    use crate::routes::payment::schemas::WebhookLogStatus;
    use crate::routes::{payment_route, transaction_route};
    use crate::tests::tests::{
        get_dummy_user_account, get_test_application_settings, get_test_gateway_settings,
        get_test_jwt_settings, TestServices,
    };
    use crate::utils::generate_jwt_token_for_user;

    macro_rules! payment_app {
        ($services:expr, $gateway_uri:expr) => {{
            let gateway_settings = get_test_gateway_settings($gateway_uri);
            let payment_client = PaymentClient::new(&gateway_settings).unwrap();
            test::init_service(
                App::new()
                    .app_data($services.repository_data())
                    .app_data($services.email_data())
                    .app_data(web::Data::new(payment_client))
                    .app_data(web::Data::new(gateway_settings))
                    .app_data(web::Data::new(get_test_jwt_settings()))
                    .app_data(web::Data::new(get_test_application_settings()))
                    .service(web::scope("/api/payments").configure(payment_route))
                    .service(web::scope("/api/transactions").configure(transaction_route)),
            )
            .await
        }};
    }

    async fn mock_gateway() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/create-collect-request"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "collect_request_id": "6808bc4888e4e3c149e757f1",
                "Collect_request_url": "https://pg.example.com/collect/6808bc4888e4e3c149e757f1",
                "sign": "signature"
            })))
            .mount(&server)
            .await;
        server
    }

    async fn bearer_token(services: &TestServices) -> String {
        let user = get_dummy_user_account("parent@example.com");
        services.repository.create_user(&user).await.unwrap();
        let jwt = get_test_jwt_settings();
        let token = generate_jwt_token_for_user(user.id, jwt.expiry, &jwt.secret).unwrap();
        format!("Bearer {}", token.expose_secret())
    }

    fn create_body(amount: f64) -> Value {
        json!({
            "studentName": "Ravi Kumar",
            "studentId": "STU-42",
            "studentEmail": "ravi@example.com",
            "amount": amount
        })
    }

    fn webhook_body(order_id: &str, status: &str) -> Value {
        json!({
            "status": 200,
            "order_info": {
                "order_id": order_id,
                "order_amount": 500,
                "transaction_amount": "510",
                "gateway": "PhonePe",
                "bank_reference": "YESBNK222",
                "status": status,
                "payment_mode": "upi",
                "payemnt_details": "success@ybl",
                "Payment_message": "payment success",
                "payment_time": "2025-04-23T08:14:21.945+00:00",
                "error_message": "NA"
            }
        })
    }

    #[actix_web::test]
    async fn test_webhook_reconciles_order_and_sends_receipt() {
        let gateway = mock_gateway().await;
        let services = TestServices::new();
        let app = payment_app!(services, gateway.uri());
        let token = bearer_token(&services).await;

        let req = test::TestRequest::post()
            .uri("/api/payments/create")
            .insert_header(("Authorization", token.clone()))
            .set_json(create_body(500.0))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let order_id = body["data"]["orderId"].as_str().unwrap().to_string();
        let custom_order_id = body["data"]["customOrderId"].as_str().unwrap().to_string();
        assert_eq!(
            body["data"]["redirectUrl"],
            "https://pg.example.com/collect/6808bc4888e4e3c149e757f1"
        );

        let req = test::TestRequest::post()
            .uri("/api/payments/webhook")
            .set_json(webhook_body(&order_id, "SUCCESS"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let ack: Value = test::read_body_json(resp).await;
        assert_eq!(ack["success"], true);

        let status = services
            .repository
            .find_order_status(Uuid::parse_str(&order_id).unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(status.status, "success");
        assert_eq!(status.transaction_amount, 510.0);
        assert_eq!(status.payment_details, "success@ybl");
        assert_eq!(status.error_message, None);
        assert_eq!(status.version, 1);

        let receipts = services.email_client.sent();
        assert_eq!(receipts.len(), 1);
        assert_eq!(receipts[0].to, "ravi@example.com");
        assert!(receipts[0].subject.contains(&custom_order_id));

        let req = test::TestRequest::get()
            .uri(&format!("/api/transactions/{}", custom_order_id))
            .insert_header(("Authorization", token))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["status"], "success");
        assert_eq!(body["data"]["bankReference"], "YESBNK222");
        assert_eq!(body["data"]["collectRequestId"], "6808bc4888e4e3c149e757f1");
    }

    #[actix_web::test]
    async fn test_failed_payment_does_not_send_receipt() {
        let gateway = mock_gateway().await;
        let services = TestServices::new();
        let app = payment_app!(services, gateway.uri());
        let token = bearer_token(&services).await;

        let req = test::TestRequest::post()
            .uri("/api/transactions")
            .insert_header(("Authorization", token))
            .set_json(create_body(750.5))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let order_id = body["data"]["orderId"].as_str().unwrap().to_string();

        let req = test::TestRequest::post()
            .uri("/api/transactions/webhook")
            .set_json(webhook_body(&order_id, "failed"))
            .to_request();
        let ack: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(ack["success"], true);
        assert!(services.email_client.sent().is_empty());
    }

    #[actix_web::test]
    async fn test_webhook_for_unknown_order_is_logged_and_acknowledged() {
        let gateway = mock_gateway().await;
        let services = TestServices::new();
        let app = payment_app!(services, gateway.uri());

        for order_id in [Uuid::new_v4().to_string(), "not-a-uuid".to_string()] {
            let req = test::TestRequest::post()
                .uri("/api/payments/webhook")
                .set_json(webhook_body(&order_id, "success"))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
            let ack: Value = test::read_body_json(resp).await;
            assert_eq!(ack["success"], false);
            assert_eq!(ack["message"], "Order not found");
        }
        let logs = services.repository.webhook_logs();
        assert_eq!(logs.len(), 2);
        assert!(logs.iter().all(|l| l.status == WebhookLogStatus::Received));
    }

    #[actix_web::test]
    async fn test_malformed_webhook_is_logged_as_rejected() {
        let gateway = mock_gateway().await;
        let services = TestServices::new();
        let app = payment_app!(services, gateway.uri());

        let req = test::TestRequest::post()
            .uri("/api/payments/webhook")
            .insert_header(("Content-Type", "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let ack: Value = test::read_body_json(resp).await;
        assert_eq!(ack["success"], false);
        assert_eq!(ack["message"], "Invalid webhook payload");

        let logs = services.repository.webhook_logs();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].status, WebhookLogStatus::Rejected);
        assert_eq!(logs[0].payload.0, Value::String("{not json".to_string()));
    }

    #[actix_web::test]
    async fn test_large_webhooks_are_acknowledged() {
        let gateway = mock_gateway().await;
        let services = TestServices::new();
        let app = payment_app!(services, gateway.uri());

        // Above actix's 256 KiB default but within the webhook limit.
        let mut body = webhook_body(&Uuid::new_v4().to_string(), "success");
        body["padding"] = Value::String("x".repeat(300 * 1024));
        let req = test::TestRequest::post()
            .uri("/api/payments/webhook")
            .set_json(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let ack: Value = test::read_body_json(resp).await;
        assert_eq!(ack["message"], "Order not found");

        let req = test::TestRequest::post()
            .uri("/api/transactions/webhook")
            .insert_header(("Content-Type", "application/json"))
            .set_payload(vec![b' '; WEBHOOK_MAX_BODY_BYTES + 1])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let ack: Value = test::read_body_json(resp).await;
        assert_eq!(ack["success"], false);
        assert_eq!(ack["message"], "Invalid webhook payload");

        let logs = services.repository.webhook_logs();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].status, WebhookLogStatus::Received);
        assert_eq!(logs[1].status, WebhookLogStatus::Rejected);
        assert!(logs[1].payload.0["error"]
            .as_str()
            .unwrap()
            .contains("exceeds"));
    }

    #[actix_web::test]
    async fn test_create_payment_validates_before_persisting() {
        let gateway = mock_gateway().await;
        let services = TestServices::new();
        let app = payment_app!(services, gateway.uri());
        let token = bearer_token(&services).await;

        let req = test::TestRequest::post()
            .uri("/api/payments/create")
            .insert_header(("Authorization", token.clone()))
            .set_json(json!({
                "studentName": "",
                "studentId": "STU-42",
                "studentEmail": "not-an-email",
                "amount": 0
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["data"]["amount"].is_array());
        assert_eq!(body["data"]["studentEmail"][0], "Invalid student email");
        assert_eq!(body["data"]["studentName"][0], "Student name is required");
        assert!(body["data"].get("student_email").is_none());

        let req = test::TestRequest::get()
            .uri("/api/payments/transactions")
            .insert_header(("Authorization", token))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["pagination"]["total"], 0);
        assert!(gateway.received_requests().await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn test_transactions_filter_by_school_and_status() {
        let gateway = mock_gateway().await;
        let services = TestServices::new();
        let app = payment_app!(services, gateway.uri());
        let token = bearer_token(&services).await;

        let mut order_ids = vec![];
        for amount in [100.0, 200.0, 300.0] {
            let req = test::TestRequest::post()
                .uri("/api/payments/create")
                .insert_header(("Authorization", token.clone()))
                .set_json(create_body(amount))
                .to_request();
            let body: Value = test::call_and_read_body_json(&app, req).await;
            order_ids.push(body["data"]["orderId"].as_str().unwrap().to_string());
        }
        let req = test::TestRequest::post()
            .uri("/api/payments/webhook")
            .set_json(webhook_body(&order_ids[0], "success"))
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::get()
            .uri("/api/payments/transactions?status=SUCCESS")
            .insert_header(("Authorization", token.clone()))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["pagination"]["total"], 1);
        assert_eq!(body["data"]["transactions"][0]["collectId"], order_ids[0]);

        let req = test::TestRequest::get()
            .uri("/api/payments/transactions/school/65b0e6293e9f76a9694d84b4?status=pending")
            .insert_header(("Authorization", token.clone()))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["pagination"]["total"], 2);
        // Newest first.
        assert_eq!(body["data"]["transactions"][0]["collectId"], order_ids[2]);

        let req = test::TestRequest::get()
            .uri("/api/transactions/school/another-school")
            .insert_header(("Authorization", token))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["pagination"]["total"], 0);
        assert_eq!(body["data"]["pagination"]["pages"], 0);
    }

    #[actix_web::test]
    async fn test_transactions_page_past_the_end_is_empty() {
        let gateway = mock_gateway().await;
        let services = TestServices::new();
        let app = payment_app!(services, gateway.uri());
        let token = bearer_token(&services).await;

        let req = test::TestRequest::post()
            .uri("/api/payments/create")
            .insert_header(("Authorization", token.clone()))
            .set_json(create_body(100.0))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        for uri in [
            "/api/payments/transactions?page=9223372036854775807&limit=10",
            "/api/transactions/school/65b0e6293e9f76a9694d84b4?page=9223372036854775807&limit=100",
        ] {
            let req = test::TestRequest::get()
                .uri(uri)
                .insert_header(("Authorization", token.clone()))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK, "{}", uri);
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["data"]["transactions"], json!([]));
            assert_eq!(body["data"]["pagination"]["total"], 1);
            assert_eq!(body["data"]["pagination"]["page"], i64::MAX);
        }
    }

    #[actix_web::test]
    async fn test_transaction_endpoints_require_token() {
        let gateway = mock_gateway().await;
        let services = TestServices::new();
        let app = payment_app!(services, gateway.uri());

        for uri in [
            "/api/payments/transactions",
            "/api/payments/status/ORD-1-abcdef01",
            "/api/transactions",
            "/api/transactions/ORD-1-abcdef01",
        ] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{}", uri);
        }
    }
}
