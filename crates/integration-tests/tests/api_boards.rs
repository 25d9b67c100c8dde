//! Boards, clones and subscriptions over HTTP.

use axum::http::StatusCode;
use integration_tests::TestApp;
use serde_json::json;

#[tokio::test]
async fn board_lifecycle() {
    let app = TestApp::spawn().await;
    let owner = app.user("owner").await;
    let board_id = app.create_board(&owner, "philosophy").await;

    let (status, board) = app.get(&format!("/api/v1/boards/{board_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(board["name"], "philosophy");
    assert_eq!(board["createdByNickname"], "owner");
    assert_eq!(board["cloneCount"], 0);

    let (status, board) = app
        .patch(
            &format!("/api/v1/boards/{board_id}"),
            &owner.access_token,
            json!({ "name": "  ethics  ", "description": "" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(board["name"], "ethics");
    assert!(board["description"].is_null());

    let (status, _) = app
        .delete(&format!("/api/v1/boards/{board_id}"), &owner.access_token, None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, error) = app.get(&format!("/api/v1/boards/{board_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["code"], "BOARD_NOT_FOUND");

    let (_, boards) = app.get("/api/v1/boards", None).await;
    assert_eq!(boards, json!([]));
}

#[tokio::test]
async fn boards_list_newest_first() {
    let app = TestApp::spawn().await;
    let owner = app.user("owner").await;
    app.create_board(&owner, "first").await;
    app.create_board(&owner, "second").await;

    let (status, boards) = app.get("/api/v1/boards", None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = boards
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["second", "first"]);
}

#[tokio::test]
async fn only_the_creator_may_change_a_board() {
    let app = TestApp::spawn().await;
    let owner = app.user("owner").await;
    let other = app.user("other").await;
    let board_id = app.create_board(&owner, "philosophy").await;

    let (status, error) = app
        .patch(
            &format!("/api/v1/boards/{board_id}"),
            &other.access_token,
            json!({ "name": "hijacked" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error["code"], "ACCESS_DENIED");

    let (status, _) = app
        .delete(&format!("/api/v1/boards/{board_id}"), &other.access_token, None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn board_creation_needs_a_token_and_a_name() {
    let app = TestApp::spawn().await;
    let (status, _) = app.post("/api/v1/boards", None, json!({ "name": "x" })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let owner = app.user("owner").await;
    let (status, error) = app
        .post("/api/v1/boards", Some(&owner.access_token), json!({ "name": "   " }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "INVALID_INPUT_VALUE");
}

#[tokio::test]
async fn clone_lifecycle() {
    let app = TestApp::spawn().await;
    let owner = app.user("owner").await;
    let board_id = app.create_board(&owner, "philosophy").await;
    let clone_id = app
        .create_clone(&owner, "Socrates", &[board_id.as_str(), board_id.as_str()])
        .await;

    let (status, clone) = app.get(&format!("/api/v1/clones/{clone_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(clone["name"], "Socrates");
    assert_eq!(clone["userNickname"], "owner");
    assert_eq!(clone["isActive"], true);

    let (_, boards) = app.get(&format!("/api/v1/clones/{clone_id}/boards"), None).await;
    assert_eq!(boards.as_array().unwrap().len(), 1);

    let (_, mine) = app.get("/api/v1/users/me/clones", Some(&owner.access_token)).await;
    assert_eq!(mine[0]["cloneId"], clone_id.as_str());

    let (_, my_boards) = app.get("/api/v1/users/me/boards", Some(&owner.access_token)).await;
    assert_eq!(my_boards[0]["boardId"], board_id.as_str());

    let (status, clone) = app
        .patch(
            &format!("/api/v1/clones/{clone_id}"),
            &owner.access_token,
            json!({ "description": "asks too many questions", "isActive": false }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(clone["description"], "asks too many questions");
    assert_eq!(clone["isActive"], false);

    let (status, stats) = app.get(&format!("/api/v1/clones/{clone_id}/statistics"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats, json!({ "boardCount": 1, "postCount": 0, "replyCount": 0 }));

    let (status, _) = app
        .delete(&format!("/api/v1/clones/{clone_id}"), &owner.access_token, None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, error) = app.get(&format!("/api/v1/clones/{clone_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["code"], "CLONE_NOT_FOUND");

    let (_, board) = app.get(&format!("/api/v1/boards/{board_id}"), None).await;
    assert_eq!(board["cloneCount"], 0);
}

#[tokio::test]
async fn clone_with_unknown_board_is_not_created() {
    let app = TestApp::spawn().await;
    let owner = app.user("owner").await;
    let missing = uuid::Uuid::now_v7().to_string();

    let (status, error) = app
        .post(
            "/api/v1/clones",
            Some(&owner.access_token),
            json!({ "name": "Ghost", "boardIds": [missing] }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["code"], "BOARD_NOT_FOUND");

    let (_, mine) = app.get("/api/v1/users/me/clones", Some(&owner.access_token)).await;
    assert_eq!(mine, json!([]));
}

#[tokio::test]
async fn clones_belong_to_their_owner() {
    let app = TestApp::spawn().await;
    let owner = app.user("owner").await;
    let other = app.user("other").await;
    let clone_id = app.create_clone(&owner, "Socrates", &[]).await;

    let (status, _) = app
        .patch(
            &format!("/api/v1/clones/{clone_id}"),
            &other.access_token,
            json!({ "name": "Mine" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .delete(&format!("/api/v1/clones/{clone_id}"), &other.access_token, None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn subscription_lifecycle_reuses_the_row() {
    let app = TestApp::spawn().await;
    let owner = app.user("owner").await;
    let board_id = app.create_board(&owner, "philosophy").await;
    let clone_id = app.create_clone(&owner, "Socrates", &[]).await;
    let path = format!("/api/v1/boards/{board_id}/subscriptions");
    let body = json!({ "cloneId": clone_id });

    let (status, _) = app.post(&path, Some(&owner.access_token), body.clone()).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, error) = app.post(&path, Some(&owner.access_token), body.clone()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["code"], "ALREADY_SUBSCRIBED");

    let (status, _) = app.delete(&path, &owner.access_token, Some(body.clone())).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, error) = app.delete(&path, &owner.access_token, Some(body.clone())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["code"], "SUBSCRIPTION_NOT_FOUND");

    let (_, board) = app.get(&format!("/api/v1/boards/{board_id}"), None).await;
    assert_eq!(board["cloneCount"], 0);

    let (status, _) = app.post(&path, Some(&owner.access_token), body).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, board) = app.get(&format!("/api/v1/boards/{board_id}"), None).await;
    assert_eq!(board["cloneCount"], 1);
}

#[tokio::test]
async fn simultaneous_resubscribes_conflict_once() {
    let app = TestApp::spawn().await;
    let owner = app.user("owner").await;
    let board_id = app.create_board(&owner, "philosophy").await;
    let clone_id = app.create_clone(&owner, "Socrates", &[board_id.as_str()]).await;
    let path = format!("/api/v1/boards/{board_id}/subscriptions");
    let body = json!({ "cloneId": clone_id });
    let (status, _) = app.delete(&path, &owner.access_token, Some(body.clone())).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let ((first, _), (second, _)) = tokio::join!(
        app.post(&path, Some(&owner.access_token), body.clone()),
        app.post(&path, Some(&owner.access_token), body.clone()),
    );
    let mut statuses = [first, second];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::NO_CONTENT, StatusCode::CONFLICT]);

    let (_, board) = app.get(&format!("/api/v1/boards/{board_id}"), None).await;
    assert_eq!(board["cloneCount"], 1);
}

#[tokio::test]
async fn subscribing_someone_elses_clone_is_forbidden() {
    let app = TestApp::spawn().await;
    let owner = app.user("owner").await;
    let other = app.user("other").await;
    let board_id = app.create_board(&owner, "philosophy").await;
    let clone_id = app.create_clone(&owner, "Socrates", &[]).await;

    let (status, _) = app
        .post(
            &format!("/api/v1/boards/{board_id}/subscriptions"),
            Some(&other.access_token),
            json!({ "cloneId": clone_id }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn board_clones_mark_the_viewers_own() {
    let app = TestApp::spawn().await;
    let owner = app.user("owner").await;
    let other = app.user("other").await;
    let board_id = app.create_board(&owner, "philosophy").await;
    let mine = app.create_clone(&owner, "Socrates", &[board_id.as_str()]).await;
    let theirs = app.create_clone(&other, "Diogenes", &[board_id.as_str()]).await;
    let path = format!("/api/v1/boards/{board_id}/clones");

    let (status, clones) = app.get(&path, Some(&owner.access_token)).await;
    assert_eq!(status, StatusCode::OK);
    let clones = clones.as_array().unwrap().clone();
    assert_eq!(clones.len(), 2);
    for clone in &clones {
        let expected = clone["cloneId"] == mine.as_str();
        assert_eq!(clone["isMine"], expected, "{clone}");
    }
    assert!(clones.iter().any(|c| c["cloneId"] == theirs.as_str()));

    let (_, anonymous) = app.get(&path, None).await;
    assert!(anonymous.as_array().unwrap().iter().all(|c| c["isMine"] == false));

    let (status, _) = app.get(&path, Some("not-a-token")).await;
    assert_eq!(status, StatusCode::OK);
}
