//! Accounts, tokens and email verification over HTTP.

use axum::http::StatusCode;
use integration_tests::{random_email, TestApp, PASSWORD};
use serde_json::json;

#[tokio::test]
async fn signup_login_and_me() {
    let app = TestApp::spawn().await;
    let email = random_email();
    let user = app.signup(&email, "neo").await;
    assert_eq!(user["email"], email.to_lowercase());
    assert_eq!(user["emailVerified"], false);
    assert!(user.get("passwordHash").is_none());

    let session = app.login(&email).await;
    let (status, me) = app.get("/api/v1/users/me", Some(&session.access_token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["nickname"], "neo");
    assert!(me["lastLoginAt"].is_string());
}

#[tokio::test]
async fn wrong_password_and_unknown_email_look_the_same() {
    let app = TestApp::spawn().await;
    let email = random_email();
    app.signup(&email, "trinity").await;

    let (status, wrong) = app
        .post("/api/v1/auth/login", None, json!({ "email": email, "password": "not-the-password" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, unknown) = app
        .post("/api/v1/auth/login", None, json!({ "email": random_email(), "password": PASSWORD }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong, unknown);
    assert_eq!(wrong["code"], "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn signup_validates_input() {
    let app = TestApp::spawn().await;
    let cases = [
        json!({ "email": "not-an-email", "password": PASSWORD, "nickname": "neo" }),
        json!({ "email": random_email(), "password": "short", "nickname": "neo" }),
        json!({ "email": random_email(), "password": PASSWORD, "nickname": "n" }),
        json!({ "email": random_email(), "password": PASSWORD }),
    ];
    for body in cases {
        let (status, error) = app.post("/api/v1/users", None, body.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(error["code"], "INVALID_INPUT_VALUE");
    }
}

#[tokio::test]
async fn nickname_update_rules() {
    let app = TestApp::spawn().await;
    let session = app.user("morpheus").await;
    let token = session.access_token.as_str();

    let (status, me) = app.patch("/api/v1/users/me", token, json!({ "nickname": "새로운닉네임" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["nickname"], "새로운닉네임");

    for bad in [
        json!({ "nickname": "a" }),
        json!({ "nickname": "abcdefghijk" }),
        json!({ "nickname": "   " }),
        json!({ "nickname": null }),
    ] {
        let (status, error) = app.patch("/api/v1/users/me", token, bad.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{bad}");
        assert_eq!(error["code"], "INVALID_INPUT_VALUE");
    }

    let (_, me) = app.get("/api/v1/users/me", Some(token)).await;
    assert_eq!(me["nickname"], "새로운닉네임");
}

#[tokio::test]
async fn logged_out_tokens_are_rejected() {
    let app = TestApp::spawn().await;
    let session = app.user("cypher").await;

    let (status, _) = app
        .post(
            "/api/v1/auth/logout",
            Some(&session.access_token),
            json!({ "refreshToken": session.refresh_token }),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, error) = app.get("/api/v1/users/me", Some(&session.access_token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error["code"], "UNAUTHORIZED");

    let (status, _) = app
        .post("/api/v1/auth/refresh", None, json!({ "refreshToken": session.refresh_token }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_without_body_revokes_the_access_token() {
    let app = TestApp::spawn().await;
    let session = app.user("tank").await;

    let (status, _) = app
        .request("POST", "/api/v1/auth/logout", Some(&session.access_token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get("/api/v1/users/me", Some(&session.access_token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // The refresh token was not presented, so it still works.
    let (status, _) = app
        .post("/api/v1/auth/refresh", None, json!({ "refreshToken": session.refresh_token }))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn refresh_rotates_the_refresh_token() {
    let app = TestApp::spawn().await;
    let session = app.user("dozer").await;

    let (status, pair) = app
        .post("/api/v1/auth/refresh", None, json!({ "refreshToken": session.refresh_token }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pair["tokenType"], "Bearer");
    assert_eq!(pair["expiresIn"], 1800);

    let (status, _) = app
        .get("/api/v1/users/me", Some(pair["accessToken"].as_str().unwrap()))
        .await;
    assert_eq!(status, StatusCode::OK);

    // The old refresh token is spent.
    let (status, _) = app
        .post("/api/v1/auth/refresh", None, json!({ "refreshToken": session.refresh_token }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn simultaneous_refreshes_issue_one_pair() {
    let app = TestApp::spawn().await;
    let session = app.user("dozer").await;
    let body = json!({ "refreshToken": session.refresh_token });

    let ((first, _), (second, _)) = tokio::join!(
        app.post("/api/v1/auth/refresh", None, body.clone()),
        app.post("/api/v1/auth/refresh", None, body.clone()),
    );
    let mut statuses = [first, second];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::OK, StatusCode::UNAUTHORIZED]);
}

#[tokio::test]
async fn access_token_cannot_refresh() {
    let app = TestApp::spawn().await;
    let session = app.user("switch").await;
    let (status, _) = app
        .post("/api/v1/auth/refresh", None, json!({ "refreshToken": session.access_token }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn verified_email_carries_into_signup() {
    let app = TestApp::spawn().await;
    let email = random_email();

    let (status, _) = app
        .post("/api/v1/auth/verification-email", None, json!({ "email": email }))
        .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let code = app.mailer.last_code_for(&email.to_lowercase()).unwrap();

    let (status, error) = app
        .post("/api/v1/auth/verify-email", None, json!({ "email": email, "code": "wrong" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "INVALID_INPUT_VALUE");

    let (status, _) = app
        .post("/api/v1/auth/verify-email", None, json!({ "email": email, "code": code }))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let user = app.signup(&email, "apoc").await;
    assert_eq!(user["emailVerified"], true);
}

#[tokio::test]
async fn verification_for_a_registered_email_conflicts() {
    let app = TestApp::spawn().await;
    let email = random_email();
    app.signup(&email, "mouse").await;

    let (status, error) = app
        .post("/api/v1/auth/verification-email", None, json!({ "email": email }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["code"], "DUPLICATE_EMAIL");
}

#[tokio::test]
async fn statistics_start_at_zero() {
    let app = TestApp::spawn().await;
    let session = app.user("niobe").await;
    let (status, stats) = app.get("/api/v1/users/me/statistics", Some(&session.access_token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats, json!({ "cloneCount": 0, "postCount": 0, "replyCount": 0 }));
}
