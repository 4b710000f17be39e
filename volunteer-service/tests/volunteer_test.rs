//! Volunteer attach/list/delete and phone lookup.

mod common;

use axum::http::StatusCode;
use common::{body_json, TestApp};
use serde_json::json;
use volunteer_service::services::AuthStore;

#[tokio::test]
async fn attach_list_and_delete_a_volunteer() {
    let app = TestApp::spawn().await;
    app.register_and_verify("asha", "+15550001111").await;
    let (access, _) = app.login("asha").await;

    let response = app
        .post_json_authed(
            "/volunteers",
            json!({
                "location": "Ward 4",
                "availability": true,
                "task": "supply runs",
            }),
            &access,
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let volunteer = body_json(response).await;
    assert_eq!(volunteer["name"], "Asha Rao");
    assert_eq!(volunteer["phone_number"], "+15550001111");

    let response = app.get("/volunteers").await;
    assert_eq!(response.status(), StatusCode::OK);
    let listed = body_json(response).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let volunteer_id = volunteer["volunteer_id"].as_str().unwrap().to_string();
    let response = app.delete(&format!("/volunteers/{}", volunteer_id)).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.delete(&format!("/volunteers/{}", volunteer_id)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn attach_requires_authentication() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json(
            "/volunteers",
            json!({ "location": "Ward 4", "availability": true, "task": null }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn attach_binds_to_the_caller_not_the_body() {
    let app = TestApp::spawn().await;
    app.register_and_verify("asha", "+15550001111").await;
    app.register_and_verify("ravi", "+15550002222").await;
    let (ravi_access, _) = app.login("ravi").await;

    let asha_account_id = app
        .store
        .find_account_by_phone("+15550001111")
        .await
        .unwrap()
        .unwrap()
        .account_id;

    // A stray account_id in the body is ignored; the record belongs to
    // the token's subject.
    let response = app
        .post_json_authed(
            "/volunteers",
            json!({
                "account_id": asha_account_id,
                "location": "Ward 4",
                "availability": true,
                "task": null,
            }),
            &ravi_access,
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let volunteer = body_json(response).await;
    assert_eq!(volunteer["phone_number"], "+15550002222");

    assert!(app
        .store
        .find_volunteer_by_account(asha_account_id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn attaching_twice_is_rejected() {
    let app = TestApp::spawn().await;
    app.register_and_verify("asha", "+15550001111").await;
    let (access, _) = app.login("asha").await;

    let body = json!({
        "location": "Ward 4",
        "availability": true,
        "task": null,
    });

    let response = app.post_json_authed("/volunteers", body.clone(), &access).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app.post_json_authed("/volunteers", body, &access).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"],
        "Already registered as a volunteer"
    );
}

#[tokio::test]
async fn list_and_check_user_are_public() {
    let app = TestApp::spawn().await;
    app.register_and_verify("asha", "+15550001111").await;
    let (access, _) = app.login("asha").await;

    let response = app
        .post_json("/check_user", json!({ "phone_number": "+15550001111" }))
        .await;
    assert_eq!(body_json(response).await["exists"], false);

    app.post_json_authed(
        "/volunteers",
        json!({
            "location": "Ward 4",
            "availability": false,
            "task": null,
        }),
        &access,
    )
    .await;

    // No token on either read.
    let response = app.get("/volunteers").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 1);

    let response = app
        .post_json("/check_user", json!({ "phone_number": "+15550001111" }))
        .await;
    assert_eq!(body_json(response).await["exists"], true);
}
