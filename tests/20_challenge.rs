mod common;

use axum::http::StatusCode;
use common::{body_json, location, session_cookie, TestApp};

#[tokio::test]
async fn challenge_describes_the_form() {
    let app = TestApp::new().await;
    let response = app.get("/protected-page?protected_page=7&destination=%2Fsecret", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["protected_page"], 7);
    assert_eq!(body["data"]["destination"], "/secret");
    assert_eq!(body["data"]["action"], "/protected-page");
}

#[tokio::test]
async fn challenge_rejects_unknown_or_missing_pid() {
    let app = TestApp::new().await;
    assert_eq!(app.get("/protected-page?protected_page=99", None).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.get("/protected-page", None).await.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn correct_password_redirects_to_destination() {
    let app = TestApp::new().await;
    let response = app
        .post_form("/protected-page", "protected_page=7&password=opensesame&destination=%2Fsecret%3Ftab%3D2", None)
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/secret?tab=2"));
    let cookie = session_cookie(&response).unwrap();
    assert!(cookie.starts_with("protected_pages_session="));
}

#[tokio::test]
async fn wrong_password_is_rejected_without_session() {
    let app = TestApp::new().await;
    let response = app
        .post_form("/protected-page", "protected_page=7&password=guess&destination=%2Fsecret", None)
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(session_cookie(&response).is_none());
    let body = body_json(response).await;
    assert_eq!(body["message"], "Incorrect password!");
}

#[tokio::test]
async fn wrong_password_keeps_existing_unlocks() {
    let app = TestApp::new().await;
    let cookie = app.unlock().await;

    let response = app
        .post_form("/protected-page", "protected_page=7&password=guess", Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(app.get("/secret", Some(&cookie)).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn missing_password_is_a_validation_error() {
    let app = TestApp::new().await;
    let response = app.post_form("/protected-page", "protected_page=7&password=", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["field_errors"]["password"].is_string());
}

#[tokio::test]
async fn offsite_destination_falls_back_to_home() {
    let app = TestApp::new().await;
    let response = app
        .post_form("/protected-page", "protected_page=7&password=opensesame&destination=https%3A%2F%2Fevil.example", None)
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/"));
}

#[tokio::test]
async fn ending_the_session_locks_pages_again() {
    let app = TestApp::new().await;
    let cookie = app.unlock().await;
    assert_eq!(app.get("/secret", Some(&cookie)).await.status(), StatusCode::OK);

    let request = axum::http::Request::builder()
        .method("DELETE")
        .uri("/protected-page")
        .header(axum::http::header::COOKIE, cookie.as_str())
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let cleared = response.headers().get(axum::http::header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cleared.contains("Max-Age=0"));

    assert_eq!(app.get("/secret", Some(&cookie)).await.status(), StatusCode::SEE_OTHER);
}
