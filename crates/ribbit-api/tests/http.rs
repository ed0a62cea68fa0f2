use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use ribbit_api::auth::{AppState, AppStateInner, JwtSettings, hash_password};
use ribbit_api::routes::router;
use ribbit_db::Database;
use ribbit_db::models::{ADMIN_ROLE_ID, NewUser, USER_ROLE_ID};
use ribbit_types::models::User;

const PASSWORD: &str = "correct horse";

fn setup() -> (Router, AppState) {
    let db = Database::open_in_memory().unwrap();
    let state = AppStateInner::new(
        db,
        JwtSettings {
            secret: "test-secret".into(),
            ttl_minutes: 10,
        },
    );
    (router(state.clone()), state)
}

fn create_user(state: &AppState, username: &str, role_id: i64) -> User {
    state
        .db
        .create_user(&NewUser {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password: hash_password(PASSWORD).unwrap(),
            role_id,
            first_name: Some("Jo".to_string()),
            last_name: Some("Smith".to_string()),
            referral_code: Some(format!("REF-{username}")),
            country_code: None,
            mobile: None,
        })
        .unwrap()
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let res = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn login(app: &Router, username: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/login",
        None,
        Some(json!({"username": username, "password": PASSWORD})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn login_rejects_bad_password() {
    let (app, state) = setup();
    create_user(&state, "alice", USER_ROLE_ID);

    let (status, body) = send(
        &app,
        "POST",
        "/login",
        None,
        Some(json!({"username": "alice", "password": "nope"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn protected_routes_need_a_token() {
    let (app, _state) = setup();

    let (status, _) = send(&app, "GET", "/users", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/users", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_token_issues_new_access_token() {
    let (app, state) = setup();
    create_user(&state, "alice", USER_ROLE_ID);

    let (_, body) = send(
        &app,
        "POST",
        "/login",
        None,
        Some(json!({"username": "alice", "password": PASSWORD})),
    )
    .await;
    let refresh = body["refresh_token"].as_str().unwrap();

    let (status, body) = send(&app, "GET", &format!("/refresh/{refresh}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap();

    let (status, _) = send(&app, "GET", "/users", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "GET", "/refresh/unknown", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn referral_lookup_is_public() {
    let (app, state) = setup();
    create_user(&state, "alice", USER_ROLE_ID);

    let (status, body) = send(&app, "GET", "/referral/REF-alice", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");
    assert_eq!(body["first_name"], "Jo");
    assert!(body.get("email").is_none());

    let (status, _) = send(&app, "GET", "/referral/missing", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn profile_patch_then_self_delete() {
    let (app, state) = setup();
    let user = create_user(&state, "alice", USER_ROLE_ID);
    create_user(&state, "root", ADMIN_ROLE_ID);
    let token = login(&app, "alice").await;
    let admin = login(&app, "root").await;
    let uri = format!("/users/{}", user.id);

    let (status, body) = send(
        &app,
        "PATCH",
        &uri,
        Some(&token),
        Some(json!({"first_name": "Jane"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["first_name"], "Jane");
    assert_eq!(body["last_name"], "Smith");
    assert_eq!(body["username"], "alice");
    assert_eq!(body["email"], "alice@example.com");
    assert!(body.get("password").is_none());

    let (status, body) = send(&app, "DELETE", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));

    let (status, _) = send(&app, "GET", &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The deleted account can no longer authenticate.
    let (status, _) = send(&app, "GET", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn users_cannot_touch_each_other() {
    let (app, state) = setup();
    let alice = create_user(&state, "alice", USER_ROLE_ID);
    let bob = create_user(&state, "bob", USER_ROLE_ID);
    let token = login(&app, "alice").await;

    let uri = format!("/users/{}", bob.id);
    let (status, _) = send(&app, "GET", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        "PATCH",
        &uri,
        Some(&token),
        Some(json!({"first_name": "Mallory"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, "DELETE", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Plain users only list themselves.
    let (status, body) = send(&app, "GET", "/users", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], alice.id);
    assert_eq!(body["page"], 0);
}

#[tokio::test]
async fn admin_deletes_lower_role() {
    let (app, state) = setup();
    let bob = create_user(&state, "bob", USER_ROLE_ID);
    create_user(&state, "root", ADMIN_ROLE_ID);
    let admin = login(&app, "root").await;

    let (status, body) = send(&app, "GET", "/users", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 2);

    let uri = format!("/users/{}", bob.id);
    let (status, _) = send(&app, "DELETE", &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "GET", &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn search_falls_back_to_email() {
    let (app, state) = setup();
    create_user(&state, "alice", USER_ROLE_ID);
    let token = login(&app, "alice").await;

    let (status, body) = send(&app, "GET", "/users/search?s=alice", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");

    let (status, body) = send(
        &app,
        "GET",
        "/users/search?s=alice@example.com",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");

    let (status, _) = send(&app, "GET", "/users/search?s=nobody", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn comments_are_listed_and_counted() {
    let (app, state) = setup();
    create_user(&state, "alice", USER_ROLE_ID);
    let token = login(&app, "alice").await;

    let (status, p1) = send(
        &app,
        "POST",
        "/users/post",
        Some(&token),
        Some(json!({"title": "First post", "description": "Hello there"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(p1["type"], "post");
    let p1_id = p1["id"].as_i64().unwrap();

    let (status, c1) = send(
        &app,
        "POST",
        "/users/comment",
        Some(&token),
        Some(json!({"parent_id": p1_id, "description": "Nice post"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(c1["type"], "comment");
    assert_eq!(c1["parent_id"], p1_id);

    let (status, body) = send(
        &app,
        "GET",
        &format!("/users/comment/{p1_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let comments = body["items"].as_array().unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0]["id"], c1["id"]);

    let (status, body) = send(&app, "GET", "/users/post", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let posts = body["items"].as_array().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["id"], p1_id);
    assert_eq!(posts[0]["comment_count"], 1);

    // Deleting the comment drops the count.
    let c1_id = c1["id"].as_i64().unwrap();
    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/users/comment/{c1_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, "GET", "/users/post", Some(&token), None).await;
    assert_eq!(body["items"][0]["comment_count"], 0);
}

#[tokio::test]
async fn duplicate_post_id_rejected() {
    let (app, state) = setup();
    create_user(&state, "alice", USER_ROLE_ID);
    let token = login(&app, "alice").await;
    let body = json!({"id": 42, "title": "Pinned", "description": "Same id twice"});

    let (status, _) = send(&app, "POST", "/users/post", Some(&token), Some(body.clone())).await;
    assert_eq!(status, StatusCode::OK);

    let (status, err) = send(&app, "POST", "/users/post", Some(&token), Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["message"], "Post already exists.");

    let (_, list) = send(&app, "GET", "/users/post", Some(&token), None).await;
    assert_eq!(list["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn private_posts_stay_out_of_feed() {
    let (app, state) = setup();
    create_user(&state, "alice", USER_ROLE_ID);
    create_user(&state, "bob", USER_ROLE_ID);
    let alice = login(&app, "alice").await;
    let bob = login(&app, "bob").await;

    send(
        &app,
        "POST",
        "/users/post",
        Some(&alice),
        Some(json!({"title": "Public", "description": "Everyone"})),
    )
    .await;
    let (_, secret) = send(
        &app,
        "POST",
        "/users/post",
        Some(&alice),
        Some(json!({"title": "Diary", "description": "Only me", "is_private": true})),
    )
    .await;

    let (_, feed) = send(&app, "GET", "/users/post", Some(&bob), None).await;
    let feed = feed["items"].as_array().unwrap();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0]["title"], "Public");

    let (_, mine) = send(&app, "GET", "/users/post/private", Some(&alice), None).await;
    let mine = mine["items"].as_array().unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["id"], secret["id"]);

    let (_, theirs) = send(&app, "GET", "/users/post/private", Some(&bob), None).await;
    assert!(theirs["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn post_edits_need_ownership() {
    let (app, state) = setup();
    create_user(&state, "alice", USER_ROLE_ID);
    create_user(&state, "bob", USER_ROLE_ID);
    let alice = login(&app, "alice").await;
    let bob = login(&app, "bob").await;

    let (_, post) = send(
        &app,
        "POST",
        "/users/post",
        Some(&alice),
        Some(json!({"title": "Mine", "description": "Original"})),
    )
    .await;
    let id = post["id"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/users/post/{id}"),
        Some(&bob),
        Some(json!({"description": "Hijacked"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/users/post-delete/{id}"),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/users/post/{id}"),
        Some(&alice),
        Some(json!({"description": "Edited"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["description"], "Edited");
    assert_eq!(body["title"], "Mine");

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/users/post-delete/{id}"),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/users/post/{id}"),
        Some(&alice),
        Some(json!({"description": "Too late"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_input_is_bad_request() {
    let (app, state) = setup();
    let user = create_user(&state, "alice", USER_ROLE_ID);
    let token = login(&app, "alice").await;

    let (status, body) = send(
        &app,
        "POST",
        "/users/post",
        Some(&token),
        Some(json!({"title": "Ok title", "description": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("description"));

    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/users/{}", user.id),
        Some(&token),
        Some(json!({"deleted_at": "2020-01-01T00:00:00Z"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "GET", "/users/0", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "GET", "/users/abc", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/users/comment",
        Some(&token),
        Some(json!({"description": "orphan"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn oversized_client_id_rejected() {
    let (app, state) = setup();
    create_user(&state, "alice", USER_ROLE_ID);
    let token = login(&app, "alice").await;

    let (status, _) = send(
        &app,
        "POST",
        "/users/post",
        Some(&token),
        Some(json!({"id": i64::MAX, "title": "Greedy", "description": "Last rowid"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/users/post",
        Some(&token),
        Some(json!({"title": "Normal", "description": "Server picks the id"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn post_routes_do_not_reach_comments() {
    let (app, state) = setup();
    create_user(&state, "alice", USER_ROLE_ID);
    let token = login(&app, "alice").await;

    let (_, post) = send(
        &app,
        "POST",
        "/users/post",
        Some(&token),
        Some(json!({"title": "Parent", "description": "Has a reply"})),
    )
    .await;
    let post_id = post["id"].as_i64().unwrap();
    let (_, comment) = send(
        &app,
        "POST",
        "/users/comment",
        Some(&token),
        Some(json!({"parent_id": post_id, "description": "Reply"})),
    )
    .await;
    let comment_id = comment["id"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/users/post/{comment_id}"),
        Some(&token),
        Some(json!({"is_private": true})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/users/post-delete/{comment_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, comments) = send(
        &app,
        "GET",
        &format!("/users/comment/{post_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(comments["items"].as_array().unwrap().len(), 1);

    let (_, feed) = send(&app, "GET", "/users/post", Some(&token), None).await;
    assert_eq!(feed["items"][0]["comment_count"], 1);
}

#[tokio::test]
async fn deactivated_account_loses_access() {
    let (app, state) = setup();
    let user = create_user(&state, "alice", USER_ROLE_ID);

    let (_, session) = send(
        &app,
        "POST",
        "/login",
        None,
        Some(json!({"username": "alice", "password": PASSWORD})),
    )
    .await;
    let token = session["token"].as_str().unwrap();
    let refresh = session["refresh_token"].as_str().unwrap();

    let mut stored = state.db.get_user_by_id(user.id).unwrap();
    stored.profile.active = false;
    state.db.update_user(stored).unwrap();

    let (status, _) = send(&app, "GET", "/users", Some(token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", &format!("/refresh/{refresh}"), None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        "POST",
        "/login",
        None,
        Some(json!({"username": "alice", "password": PASSWORD})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
