use serde_json::json;

use crate::common::{PASSWORD, TestApp, routes};

mod registration {
    use super::*;

    #[tokio::test]
    async fn new_user_gets_token_and_default_quota() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({"email": "Alice@Example.com", "password": PASSWORD}),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert!(res.body["token"].is_string());
        assert_eq!(res.body["user"]["email"], "alice@example.com");
        assert_eq!(res.body["user"]["role"], "user");
        assert_eq!(res.body["user"]["storage_quota"], 1024_i64 * 1024 * 1024);
        assert_eq!(res.body["user"]["storage_used"], 0);
        assert!(res.body["user"].get("password_hash").is_none());
    }

    #[tokio::test]
    async fn duplicate_email_is_conflict() {
        let app = TestApp::spawn().await;
        let body = json!({"email": "alice@example.com", "password": PASSWORD});

        assert_eq!(app.post_without_token(routes::REGISTER, &body).await.status, 201);
        let res = app.post_without_token(routes::REGISTER, &body).await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "EMAIL_TAKEN");
    }

    #[tokio::test]
    async fn short_password_and_bad_email_rejected() {
        let app = TestApp::spawn().await;

        let short = app
            .post_without_token(
                routes::REGISTER,
                &json!({"email": "alice@example.com", "password": "12345"}),
            )
            .await;
        assert_eq!(short.status, 400);

        let bad = app
            .post_without_token(
                routes::REGISTER,
                &json!({"email": "not-an-email", "password": PASSWORD}),
            )
            .await;
        assert_eq!(bad.status, 400);
        assert_eq!(bad.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn malformed_json_is_validation_error() {
        let app = TestApp::spawn().await;
        let res = app
            .post_without_token(routes::REGISTER, &json!({"email": 42}))
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod login {
    use super::*;

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let app = TestApp::spawn().await;
        app.create_authenticated_user("alice@example.com").await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "alice@example.com", "password": "wrong-password"}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn unknown_email_is_unauthorized() {
        let app = TestApp::spawn().await;
        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "nobody@example.com", "password": PASSWORD}),
            )
            .await;
        assert_eq!(res.status, 401);
    }

    #[tokio::test]
    async fn me_reports_usage() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice@example.com").await;
        app.upload(&token, "a.txt", vec![7u8; 123], false).await;

        let res = app.get_with_token(routes::ME, &token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["email"], "alice@example.com");
        assert_eq!(res.body["storage_used"], 123);
    }

    #[tokio::test]
    async fn missing_and_invalid_tokens() {
        let app = TestApp::spawn().await;

        let missing = app.get_without_token(routes::ME).await;
        assert_eq!(missing.status, 401);
        assert_eq!(missing.body["code"], "TOKEN_MISSING");

        let invalid = app.get_with_token(routes::ME, "garbage").await;
        assert_eq!(invalid.status, 401);
        assert_eq!(invalid.body["code"], "TOKEN_INVALID");
    }
}
