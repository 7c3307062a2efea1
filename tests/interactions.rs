//! Interaction API Tests
//!
//! Covers toggling, listing, deleting, counters, validation, and identity.

mod common;

use axum::http::StatusCode;
use common::{app, Caller, TestApp};
use serde_json::json;
use uuid::Uuid;

// ===========================================================================
// Toggle
// ===========================================================================

#[tokio::test]
async fn toggle_like_adds_then_removes() {
    let app = app().await;
    let article = app.create_article("toggle_like");
    let user = Uuid::new_v4();

    let resp = app
        .post_json(
            "/api/interactions/test",
            json!({ "article_id": article.id, "type": "like", "action": "toggle" }),
            Caller::Header(user),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["like"], true);
    assert_eq!(body["action"], "added");
    assert_eq!(body["message"], "like added");
    assert_eq!(body["counters"]["likes"], 1);

    let resp = app
        .post_json(
            "/api/interactions/test",
            json!({ "articleId": article.id, "type": "like", "action": "toggle" }),
            Caller::Header(user),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["like"], false);
    assert_eq!(body["action"], "removed");
    assert_eq!(body["counters"]["likes"], 0);
}

#[tokio::test]
async fn counter_delta_follows_toggle_parity() {
    let app = app().await;
    let article = app.create_article("toggle_parity");
    let users: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();

    // Another reader's save keeps the baseline away from zero.
    app.toggle(users[0], article.id, "save").await;

    for n in 1..=5 {
        let resp = app.toggle(users[1], article.id, "save").await;
        assert_eq!(resp.status, StatusCode::OK);
        assert_eq!(resp.json()["counters"]["saves"], 1 + n % 2);
    }

    let resp = app
        .get(&format!("/api/articles/{}/counters", article.id), Caller::Anonymous)
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["counters"]["saves"], 2);
    assert_eq!(resp.json()["counters"]["likes"], 0);
}

#[tokio::test]
async fn explicit_add_and_remove_are_idempotent() {
    let app = app().await;
    let article = app.create_article("add_remove");
    let user = Uuid::new_v4();

    for expected in ["added", "unchanged"] {
        let resp = app
            .post_json(
                "/api/interactions",
                json!({ "article_id": article.id, "type": "share", "action": "add" }),
                Caller::Header(user),
            )
            .await;
        assert_eq!(resp.status, StatusCode::OK);
        assert_eq!(resp.json()["action"], expected);
        assert_eq!(resp.json()["share"], true);
        assert_eq!(resp.json()["counters"]["shares"], 1);
    }

    for expected in ["removed", "unchanged"] {
        let resp = app
            .post_json(
                "/api/interactions",
                json!({ "article_id": article.id, "type": "share", "action": "remove" }),
                Caller::Header(user),
            )
            .await;
        assert_eq!(resp.json()["action"], expected);
        assert_eq!(resp.json()["share"], false);
        assert_eq!(resp.json()["counters"]["shares"], 0);
    }
}

#[tokio::test]
async fn missing_action_defaults_to_toggle() {
    let app = app().await;
    let article = app.create_article("default_action");

    let resp = app
        .post_json(
            "/api/interactions",
            json!({ "article_id": article.id, "type": "save" }),
            Caller::Header(Uuid::new_v4()),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["save"], true);
}

#[tokio::test]
async fn toggle_unknown_article_is_not_found() {
    let app = app().await;

    let resp = app.toggle(Uuid::new_v4(), Uuid::new_v4(), "like").await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.json()["success"], false);
    assert_eq!(resp.error_message(), "article not found");
}

// ===========================================================================
// Validation
// ===========================================================================

#[tokio::test]
async fn invalid_type_is_rejected() {
    let app = app().await;
    let article = app.create_article("bad_type");

    let resp = app.toggle(Uuid::new_v4(), article.id, "follow").await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    let body = resp.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "invalid interaction type: follow");
    assert_eq!(body["details"], "type must be one of: like, save, share");
}

#[tokio::test]
async fn missing_fields_are_rejected() {
    let app = app().await;
    let article = app.create_article("missing_fields");
    let user = Caller::Header(Uuid::new_v4());

    let resp = app
        .post_json("/api/interactions", json!({ "type": "like" }), user)
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "article_id is required");

    let resp = app
        .post_json("/api/interactions", json!({ "article_id": article.id }), user)
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "type is required");

    let resp = app
        .post_json(
            "/api/interactions",
            json!({ "article_id": "a1", "type": "like" }),
            user,
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "invalid article_id");

    let resp = app
        .post_json(
            "/api/interactions",
            json!({ "article_id": article.id, "type": "like", "action": "flip" }),
            user,
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "invalid action: flip");
}

#[tokio::test]
async fn malformed_body_is_rejected() {
    let app = app().await;
    let user = Caller::Header(Uuid::new_v4());

    let resp = app.post_raw("/api/interactions", "{not json", user).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "invalid request body");
    assert!(resp.json()["details"].is_string());

    let resp = app.post_raw("/api/interactions", "", user).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "request body is required");
}

// ===========================================================================
// Identity
// ===========================================================================

#[tokio::test]
async fn unauthenticated_requests_are_rejected_regardless_of_body() {
    let app = app().await;
    let article = app.create_article("anon");

    let bodies = [
        json!({ "article_id": article.id, "type": "like" }),
        json!({ "article_id": article.id, "type": "follow" }),
        json!({}),
    ];
    for body in bodies {
        let resp = app
            .post_json("/api/interactions/test", body, Caller::Anonymous)
            .await;
        assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
        assert_eq!(resp.json()["success"], false);
    }

    let resp = app.post_raw("/api/interactions", "{not json", Caller::Anonymous).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

    let resp = app.get("/api/interactions", Caller::Anonymous).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

    let resp = app.delete("/api/interactions", Caller::Anonymous).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

    let counters = app.store_counters(article.id).await;
    assert_eq!(counters, 0);
}

#[tokio::test]
async fn bearer_token_identifies_user() {
    let app = app().await;
    let article = app.create_article("bearer");
    let user = Uuid::new_v4();
    let token = app.token_for(user);

    let resp = app
        .post_json(
            "/api/interactions",
            json!({ "article_id": article.id, "type": "like" }),
            Caller::Bearer(&token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);

    // The same user seen through the header sees the interaction.
    let resp = app
        .get(
            &format!("/api/interactions?articleIds={}", article.id),
            Caller::Header(user),
        )
        .await;
    assert_eq!(resp.json()["count"], 1);
}

#[tokio::test]
async fn bearer_scheme_is_case_insensitive() {
    let app = app().await;
    let user = Uuid::new_v4();
    let token = app.token_for(user);

    let resp = app
        .request(
            axum::http::Method::GET,
            "/api/interactions",
            None,
            &[("Authorization", format!("bearer {}", token))],
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["count"], 0);
}

#[tokio::test]
async fn invalid_bearer_or_header_is_unauthorized() {
    let app = app().await;

    let resp = app
        .get("/api/interactions", Caller::Bearer("v4.local.garbage"))
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.error_message(), "invalid token");

    let resp = app
        .request(
            axum::http::Method::GET,
            "/api/interactions",
            None,
            &[("user-id", "u1".to_string())],
        )
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.error_message(), "invalid user-id header");
}

#[tokio::test]
async fn user_id_header_ignored_when_untrusted() {
    let app = TestApp::setup(false);
    let article = app.create_article("untrusted");
    let user = Uuid::new_v4();

    let resp = app.toggle(user, article.id, "like").await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.error_message(), "authentication required");

    let token = app.token_for(user);
    let resp = app
        .post_json(
            "/api/interactions",
            json!({ "article_id": article.id, "type": "like" }),
            Caller::Bearer(&token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
}

// ===========================================================================
// Listing and deletion
// ===========================================================================

#[tokio::test]
async fn list_after_add_contains_exactly_one_row() {
    let app = app().await;
    let article = app.create_article("list_one");
    let other = app.create_article("list_other");
    let user = Uuid::new_v4();

    app.toggle(user, article.id, "like").await;
    app.toggle(user, other.id, "save").await;

    let resp = app
        .get(
            &format!("/api/interactions/test?articleIds={}", article.id),
            Caller::Header(user),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 1);
    let row = &body["interactions"][0];
    assert_eq!(row["article_id"], article.id.to_string());
    assert_eq!(row["user_id"], user.to_string());
    assert_eq!(row["type"], "like");

    let resp = app.get("/api/interactions", Caller::Header(user)).await;
    assert_eq!(resp.json()["count"], 2);
}

#[tokio::test]
async fn list_rejects_malformed_ids() {
    let app = app().await;

    let resp = app
        .get("/api/interactions?articleIds=a1,a2", Caller::Header(Uuid::new_v4()))
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "invalid articleIds");
}

#[tokio::test]
async fn rejected_query_strings_use_error_envelope() {
    let app = app().await;
    let user = Uuid::new_v4();
    let id = Uuid::new_v4();

    let resp = app
        .get(
            &format!("/api/interactions?articleIds={}&articleIds={}", id, id),
            Caller::Header(user),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.json()["success"], false);
    assert_eq!(resp.error_message(), "invalid query string");
    assert!(resp.json()["details"].is_string());

    let resp = app
        .delete(
            &format!("/api/interactions?articleId={}&articleId={}", id, id),
            Caller::Header(user),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "invalid query string");
}

#[tokio::test]
async fn delete_scoped_to_article_decrements_counters() {
    let app = app().await;
    let first = app.create_article("delete_first");
    let second = app.create_article("delete_second");
    let user = Uuid::new_v4();

    app.toggle(user, first.id, "like").await;
    app.toggle(user, first.id, "save").await;
    app.toggle(user, second.id, "like").await;

    let resp = app
        .delete(
            &format!("/api/interactions?articleId={}", first.id),
            Caller::Header(user),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["deleted"], 2);
    assert_eq!(app.store_counters(first.id).await, 0);
    assert_eq!(app.store_counters(second.id).await, 1);

    let resp = app.delete("/api/interactions/test", Caller::Header(user)).await;
    assert_eq!(resp.json()["deleted"], 1);
    assert_eq!(resp.json()["message"], "deleted 1 interactions");
    assert_eq!(app.store_counters(second.id).await, 0);
}

// ===========================================================================
// Counters and health
// ===========================================================================

#[tokio::test]
async fn counters_for_unknown_or_malformed_article() {
    let app = app().await;

    let resp = app
        .get(&format!("/api/articles/{}/counters", Uuid::new_v4()), Caller::Anonymous)
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);

    let resp = app
        .get("/api/articles/not-a-uuid/counters", Caller::Anonymous)
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "invalid article id");

    let resp = app.get("/api/articles/%FF/counters", Caller::Anonymous).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.json()["success"], false);
    assert_eq!(resp.error_message(), "invalid article id");
    assert!(resp.json()["details"].is_string());
}

#[tokio::test]
async fn health_reports_ok() {
    let app = app().await;

    let resp = app.get("/health", Caller::Anonymous).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["status"], "ok");
}
