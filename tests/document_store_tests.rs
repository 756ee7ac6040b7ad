// Document backend tests against a mocked Appwrite-compatible API

use chrono::Utc;
use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;

use stackswipe::config::{CollectionSettings, DocumentSettings};
use stackswipe::models::{Comment, VoteTarget, VoteType};
use stackswipe::services::document_store::composite_id;
use stackswipe::services::{DocumentClient, DocumentStore, StoreError};

fn create_store(server: &ServerGuard, page_size: u32) -> DocumentStore {
    let settings = DocumentSettings {
        endpoint: server.url(),
        api_key: "doc-key".to_string(),
        project_id: "project".to_string(),
        database_id: "db".to_string(),
        collections: CollectionSettings::default(),
        page_size,
    };
    DocumentStore::new(DocumentClient::new(&settings).unwrap())
}

fn post_body(upvotes: i32, comment_count: i32) -> String {
    json!({
        "$id": "p1",
        "userId": "alice",
        "title": "Title",
        "content": "Body",
        "category": "general",
        "upvotes": upvotes,
        "commentCount": comment_count,
        "createdAt": "2025-05-01T10:00:00.000+00:00",
        "updatedAt": "2025-05-01T10:00:00.000+00:00"
    })
    .to_string()
}

#[tokio::test]
async fn test_first_upvote_inserts_vote_and_bumps_score() {
    let mut server = Server::new_async().await;
    let vote_id = composite_id("vote:bob:post:p1");

    server
        .mock("GET", "/databases/db/collections/posts/documents/p1")
        .match_header("x-appwrite-key", "doc-key")
        .match_header("x-appwrite-project", "project")
        .with_status(200)
        .with_body(post_body(4, 0))
        .create_async()
        .await;
    server
        .mock("GET", format!("/databases/db/collections/votes/documents/{}", vote_id).as_str())
        .with_status(404)
        .with_body(r#"{"message":"Document not found"}"#)
        .create_async()
        .await;
    let insert = server
        .mock("POST", "/databases/db/collections/votes/documents")
        .match_body(Matcher::PartialJson(json!({
            "documentId": vote_id,
            "data": { "userId": "bob", "postId": "p1", "voteType": "up" }
        })))
        .with_status(201)
        .with_body("{}")
        .create_async()
        .await;
    let score = server
        .mock("PATCH", "/databases/db/collections/posts/documents/p1")
        .match_body(Matcher::Json(json!({ "data": { "upvotes": 5 } })))
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let store = create_store(&server, 100);
    let tally = store
        .cast_vote("bob", &VoteTarget::Post("p1".to_string()), VoteType::Up)
        .await
        .unwrap();

    assert_eq!(tally.upvotes, 5);
    assert_eq!(tally.user_vote, Some(VoteType::Up));
    insert.assert_async().await;
    score.assert_async().await;
}

#[tokio::test]
async fn test_repeated_vote_withdraws_it() {
    let mut server = Server::new_async().await;
    let vote_path = format!(
        "/databases/db/collections/votes/documents/{}",
        composite_id("vote:bob:comment:c1")
    );

    server
        .mock("GET", "/databases/db/collections/comments/documents/c1")
        .with_status(200)
        .with_body(
            json!({
                "$id": "c1",
                "postId": "p1",
                "userId": "alice",
                "content": "Nice",
                "upvotes": -1,
                "createdAt": "2025-05-01T10:00:00.000+00:00",
                "updatedAt": "2025-05-01T10:00:00.000+00:00"
            })
            .to_string(),
        )
        .create_async()
        .await;
    server
        .mock("GET", vote_path.as_str())
        .with_status(200)
        .with_body(
            json!({
                "userId": "bob",
                "commentId": "c1",
                "voteType": "down",
                "createdAt": "2025-05-01T10:00:00.000+00:00"
            })
            .to_string(),
        )
        .create_async()
        .await;
    let delete = server
        .mock("DELETE", vote_path.as_str())
        .with_status(204)
        .create_async()
        .await;
    server
        .mock("PATCH", "/databases/db/collections/comments/documents/c1")
        .match_body(Matcher::Json(json!({ "data": { "upvotes": 0 } })))
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let store = create_store(&server, 100);
    let tally = store
        .cast_vote("bob", &VoteTarget::Comment("c1".to_string()), VoteType::Down)
        .await
        .unwrap();

    assert_eq!(tally.upvotes, 0);
    assert_eq!(tally.user_vote, None);
    delete.assert_async().await;
}

#[tokio::test]
async fn test_vote_on_missing_target() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/databases/db/collections/posts/documents/nope")
        .with_status(404)
        .with_body("{}")
        .create_async()
        .await;

    let store = create_store(&server, 100);
    let err = store
        .cast_vote("bob", &VoteTarget::Post("nope".to_string()), VoteType::Up)
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::NotFound(_)));
}

#[tokio::test]
async fn test_comment_bumps_post_counter() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/databases/db/collections/comments/documents")
        .match_body(Matcher::PartialJson(json!({
            "documentId": "c9",
            "data": { "postId": "p1", "parentCommentId": "c1" }
        })))
        .with_status(201)
        .with_body("{}")
        .create_async()
        .await;
    server
        .mock("GET", "/databases/db/collections/posts/documents/p1")
        .with_status(200)
        .with_body(post_body(0, 2))
        .create_async()
        .await;
    let counter = server
        .mock("PATCH", "/databases/db/collections/posts/documents/p1")
        .match_body(Matcher::Json(json!({ "data": { "commentCount": 3 } })))
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let now = Utc::now();
    let comment = Comment {
        id: "c9".to_string(),
        post_id: "p1".to_string(),
        user_id: "bob".to_string(),
        content: "Agreed".to_string(),
        parent_comment_id: Some("c1".to_string()),
        upvotes: 0,
        created_at: now,
        updated_at: now,
    };

    let stored = create_store(&server, 100).create_comment(&comment).await.unwrap();

    assert_eq!(stored, comment);
    counter.assert_async().await;
}

#[tokio::test]
async fn test_swiped_ids_page_through_results() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", Matcher::Regex("^/databases/db/collections/swipes/documents".into()))
        .match_query(Matcher::Regex("offset%22%2C%22values%22%3A%5B0%5D|\"offset\",\"values\":\\[0\\]".into()))
        .with_status(200)
        .with_body(
            json!({
                "total": 3,
                "documents": [
                    { "swiperId": "me", "swipedId": "a", "action": "like", "createdAt": "2025-05-01T10:00:00.000+00:00" },
                    { "swiperId": "me", "swipedId": "b", "action": "dislike", "createdAt": "2025-05-01T10:01:00.000+00:00" }
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;
    server
        .mock("GET", Matcher::Regex("^/databases/db/collections/swipes/documents".into()))
        .match_query(Matcher::Regex("offset%22%2C%22values%22%3A%5B2%5D|\"offset\",\"values\":\\[2\\]".into()))
        .with_status(200)
        .with_body(
            json!({
                "total": 3,
                "documents": [
                    { "swiperId": "me", "swipedId": "c", "action": "like", "createdAt": "2025-05-01T10:02:00.000+00:00" }
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let ids = create_store(&server, 2).swiped_ids("me").await.unwrap();
    assert_eq!(ids, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_unauthorized_key_surfaces_as_store_error() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", Matcher::Regex("^/databases/db/collections/users/documents".into()))
        .with_status(401)
        .with_body(r#"{"message":"Invalid API key"}"#)
        .create_async()
        .await;

    let err = create_store(&server, 100).list_profiles().await.unwrap_err();
    assert!(matches!(err, StoreError::Document(_)));
}
