use axum::http::StatusCode;
use integration_tests::TestApp;
use serde_json::json;

#[tokio::test]
async fn post_lifecycle() {
    let app = TestApp::new();
    let alice = app.login_as("alice").await;
    let topic_id = app.create_topic(&alice, "rust").await;
    let post_id = app.create_post(&alice, topic_id, "ownership").await;

    let found = app
        .get(&format!("/api/posts/{topic_id}/{post_id}"), &alice)
        .await;
    assert_eq!(found.status, StatusCode::OK);
    assert_eq!(found.data()["username"], "alice");
    assert_eq!(found.data()["likes"], 0);
    assert!(found.data()["user_vote"].is_null());

    let updated = app
        .put(
            &format!("/api/posts/{post_id}"),
            &alice,
            json!({ "title": "borrowing", "description": "edited" }),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.message(), "Successfully updated post");
    assert_eq!(updated.data()["title"], "borrowing");

    let deleted = app.delete(&format!("/api/posts/{post_id}"), &alice).await;
    assert_eq!(deleted.status, StatusCode::OK);

    let gone = app
        .get(&format!("/api/posts/{topic_id}/{post_id}"), &alice)
        .await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
    assert_eq!(gone.message(), "post not found");
}

#[tokio::test]
async fn listing_a_missing_topic_is_not_found() {
    let app = TestApp::new();
    let alice = app.login_as("alice").await;

    let reply = app.get("/api/posts/all/999", &alice).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.message(), "topic not found");
}

#[tokio::test]
async fn creating_in_a_missing_topic_is_not_found() {
    let app = TestApp::new();
    let alice = app.login_as("alice").await;

    let reply = app
        .post(
            "/api/posts",
            &alice,
            json!({ "topicId": 999, "title": "t", "description": "d" }),
        )
        .await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.message(), "topic not found");
}

#[tokio::test]
async fn zero_topic_id_in_body_is_rejected() {
    let app = TestApp::new();
    let alice = app.login_as("alice").await;

    let reply = app
        .post(
            "/api/posts",
            &alice,
            json!({ "topicId": 0, "title": "t", "description": "d" }),
        )
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.message(), "Required fields missing");
}

#[tokio::test]
async fn posts_from_another_topic_are_not_found() {
    let app = TestApp::new();
    let alice = app.login_as("alice").await;
    let rust = app.create_topic(&alice, "rust").await;
    let go = app.create_topic(&alice, "go").await;
    let post_id = app.create_post(&alice, rust, "traits").await;

    let reply = app.get(&format!("/api/posts/{go}/{post_id}"), &alice).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn only_the_author_may_change_a_post() {
    let app = TestApp::new();
    let alice = app.login_as("alice").await;
    let bob = app.login_as("bob").await;
    let topic_id = app.create_topic(&alice, "rust").await;
    let post_id = app.create_post(&alice, topic_id, "lifetimes").await;

    let edit = app
        .put(
            &format!("/api/posts/{post_id}"),
            &bob,
            json!({ "title": "mine", "description": "mine" }),
        )
        .await;
    assert_eq!(edit.status, StatusCode::NOT_FOUND);

    let delete = app.delete(&format!("/api/posts/{post_id}"), &bob).await;
    assert_eq!(delete.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn votes_move_counters_and_report_the_callers_vote() {
    let app = TestApp::new();
    let alice = app.login_as("alice").await;
    let bob = app.login_as("bob").await;
    let topic_id = app.create_topic(&alice, "rust").await;
    let post_id = app.create_post(&alice, topic_id, "macros").await;
    let view_uri = format!("/api/posts/{topic_id}/{post_id}");

    let liked = app
        .post(&format!("/api/posts/{post_id}/likes"), &bob, json!({}))
        .await;
    assert_eq!(liked.status, StatusCode::OK);
    assert_eq!(liked.message(), "Successfully liked post");
    assert_eq!(liked.data()["vote"], "like");

    let as_bob = app.get(&view_uri, &bob).await;
    assert_eq!(as_bob.data()["likes"], 1);
    assert_eq!(as_bob.data()["user_vote"], "like");

    let as_alice = app.get(&view_uri, &alice).await;
    assert_eq!(as_alice.data()["likes"], 1);
    assert!(as_alice.data()["user_vote"].is_null());

    app.post(&format!("/api/posts/{post_id}/dislikes"), &bob, json!({}))
        .await;
    let flipped = app.get(&view_uri, &bob).await;
    assert_eq!(flipped.data()["likes"], 0);
    assert_eq!(flipped.data()["dislikes"], 1);
    assert_eq!(flipped.data()["user_vote"], "dislike");

    let removed = app
        .delete(&format!("/api/posts/{post_id}/remove"), &bob)
        .await;
    assert_eq!(removed.status, StatusCode::OK);
    assert_eq!(removed.message(), "Successfully removed vote");

    let cleared = app.get(&view_uri, &bob).await;
    assert_eq!(cleared.data()["dislikes"], 0);
    assert!(cleared.data()["user_vote"].is_null());

    let again = app
        .delete(&format!("/api/posts/{post_id}/remove"), &bob)
        .await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
    assert_eq!(again.message(), "vote not found");
}

#[tokio::test]
async fn voting_on_a_missing_post_is_not_found() {
    let app = TestApp::new();
    let alice = app.login_as("alice").await;

    let reply = app.post("/api/posts/999/likes", &alice, json!({})).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.message(), "post not found");
}

#[tokio::test]
async fn search_is_scoped_to_the_topic() {
    let app = TestApp::new();
    let alice = app.login_as("alice").await;
    let rust = app.create_topic(&alice, "rust").await;
    let go = app.create_topic(&alice, "go").await;
    app.create_post(&alice, rust, "async runtimes").await;
    app.create_post(&alice, go, "async goroutines").await;

    let hits = app
        .get(&format!("/api/posts/{rust}/search?q=ASYNC"), &alice)
        .await;
    assert_eq!(hits.status, StatusCode::OK);
    assert_eq!(hits.message(), "Successfully searched post");
    let hits = hits.data().as_array().unwrap().clone();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["title"], "async runtimes");
}

#[tokio::test]
async fn deleting_a_topic_removes_its_posts() {
    let app = TestApp::new();
    let alice = app.login_as("alice").await;
    let topic_id = app.create_topic(&alice, "rust").await;
    let post_id = app.create_post(&alice, topic_id, "closures").await;

    app.delete(&format!("/api/topics/{topic_id}"), &alice).await;

    let reply = app.post(&format!("/api/posts/{post_id}/likes"), &alice, json!({})).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}
