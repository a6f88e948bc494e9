//! Route table, extractors and error bodies through the actix app.
mod common;

use actix_web::{http::StatusCode, test, web, App};
use chrono::{Duration, Utc};
use common::{clients, RecordingClients, World};
use jsonwebtoken::{encode, EncodingKey, Header};
use post_service::middleware::{Claims, JwtValidator};
use post_service::{configure, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

const SECRET: &str = "integration-secret";

fn bearer(user_id: Uuid) -> (&'static str, String) {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (now + Duration::hours(1)).timestamp(),
        iat: now.timestamp(),
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();
    ("Authorization", format!("Bearer {}", token))
}

macro_rules! app {
    ($world:expr) => {{
        let recorder = Arc::new(RecordingClients::default());
        let state = AppState::new(&$world.store.stores(), &clients(&recorder), 1024 * 1024);
        test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .app_data(web::Data::new(JwtValidator::new(SECRET)))
                .configure(configure),
        )
        .await
    }};
}

#[actix_web::test]
async fn ping_and_health_respond() {
    let world = World::new();
    let app = app!(world);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/posts/ping").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(test::read_body(resp).await, "pong");

    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn feed_requires_a_token() {
    let world = World::new();
    let app = app!(world);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/posts").to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn feed_returns_author_projection_only() {
    let world = World::new();
    let viewer = world.account("viewer");
    let author = world.account("author");
    world.follow(&viewer, &author);
    world.post(&author, 1);
    let app = app!(world);

    let req = test::TestRequest::get()
        .uri("/api/posts")
        .insert_header(bearer(viewer.id))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    let posts = body.as_array().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["user"], json!({ "id": author.id, "username": "author" }));
    assert!(posts[0]["user"].get("birthDate").is_none());
    assert_eq!(posts[0]["userId"], json!(author.id));
}

#[actix_web::test]
async fn missing_post_uses_the_error_envelope() {
    let world = World::new();
    let app = app!(world);

    let req = test::TestRequest::get()
        .uri(&format!("/api/posts/{}", Uuid::new_v4()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body,
        json!({
            "status": 404,
            "errors": [{ "property": "post", "message": "Post not found!" }]
        })
    );
}

#[actix_web::test]
async fn hidden_post_body_matches_missing_post_body() {
    let world = World::new();
    let author = world.account("author");
    let hidden = world.post_with(&author, 1, |p| p.hidden = true);
    let app = app!(world);

    let mut bodies = Vec::new();
    for id in [Uuid::new_v4(), hidden.id] {
        let req = test::TestRequest::get()
            .uri(&format!("/api/posts/{}", id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        bodies.push(test::read_body(resp).await);
    }
    assert_eq!(bodies[0], bodies[1]);
}

#[actix_web::test]
async fn non_numeric_relation_type_is_bad_request() {
    let world = World::new();
    let viewer = world.account("viewer");
    let app = app!(world);

    let req = test::TestRequest::get()
        .uri("/api/posts/byPostRelation/like")
        .insert_header(bearer(viewer.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn like_then_dislike_through_routes() {
    let world = World::new();
    let author = world.account("author");
    let user = world.account("user");
    let post = world.post(&author, 1);
    let app = app!(world);

    for reaction in ["like", "dislike"] {
        let req = test::TestRequest::post()
            .uri(&format!("/api/posts/{}/{}", reaction, post.id))
            .insert_header(bearer(user.id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let rows = world.store.post_relations();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].kind, post_service::domain::PostRelationType::Dislike);

    let req = test::TestRequest::post()
        .uri(&format!("/api/posts/dislike/{}/delete", post.id))
        .insert_header(bearer(user.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(world.store.post_relations().is_empty());
}

#[actix_web::test]
async fn account_and_relation_mirroring() {
    let world = World::new();
    let app = app!(world);
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    for (id, name) in [(alice, "alice"), (bob, "bob")] {
        let req = test::TestRequest::post()
            .uri("/api/posts/user")
            .set_json(json!({
                "id": id,
                "username": name,
                "birthDate": "1995-03-01T00:00:00Z",
                "private": true
            }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
    }

    let follow = json!({ "subject": alice, "object": bob, "type": 1, "pending": true });
    let req = test::TestRequest::post()
        .uri("/api/posts/relation")
        .set_json(&follow)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let accept = json!({ "subject": alice, "object": bob, "type": 1, "pending": false });
    let req = test::TestRequest::put()
        .uri("/api/posts/relation")
        .set_json(&accept)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

    let unknown = json!({ "subject": alice, "object": Uuid::new_v4(), "type": 3 });
    let req = test::TestRequest::post()
        .uri("/api/posts/relation")
        .set_json(&unknown)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let missing_user = json!({
        "id": Uuid::new_v4(),
        "username": "ghost",
        "birthDate": "1995-03-01T00:00:00Z"
    });
    let req = test::TestRequest::put()
        .uri("/api/posts/user")
        .set_json(&missing_user)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn promote_reports_missing_posts() {
    let world = World::new();
    let author = world.account("author");
    let post = world.post(&author, 1);
    let missing = Uuid::new_v4();
    let app = app!(world);

    let req = test::TestRequest::post()
        .uri("/api/posts/promote")
        .set_json(json!({
            "promotions": [
                { "post_id": post.id, "date": "2021-07-01T00:00:00Z" },
                { "post_id": missing, "date": "2021-07-01T00:00:00Z" }
            ]
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!({ "activated": [post.id], "missing": [missing] }));
    assert!(world.store.post(post.id).unwrap().campaign);
}
