use actix_web::{web, HttpResponse};
use futures_util::stream::{self, StreamExt};
use std::collections::HashMap;
use std::convert::Infallible;
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;
use validator::Validate;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::models::{Match, MatchView, Message, SendMessageRequest};
use crate::routes::AppState;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/matches", web::get().to(list_matches))
        .route("/matches/{id}/messages", web::get().to(list_messages))
        .route("/matches/{id}/messages", web::post().to(send_message))
        .route("/matches/{id}/messages/stream", web::get().to(stream_messages));
}

/// The match, provided `user` is one of its participants
async fn participant_match(state: &AppState, match_id: &str, user: &AuthUser) -> Result<Match, ApiError> {
    let record = state
        .store
        .get_match(match_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Match {} not found", match_id)))?;

    if !record.includes(&user.id) {
        tracing::info!("User {} denied access to match {}", user.id, match_id);
        return Err(ApiError::Forbidden("You are not part of this match".to_string()));
    }

    Ok(record)
}

/// GET /api/v1/matches
async fn list_matches(state: web::Data<AppState>, user: AuthUser) -> Result<HttpResponse, ApiError> {
    let matches = state.store.matches_for(&user.id).await?;

    let mut ids: Vec<String> = matches.iter().flat_map(|m| m.user_ids.iter().cloned()).collect();
    ids.sort();
    ids.dedup();

    let profiles: HashMap<String, _> = state
        .store
        .profiles_by_ids(&ids)
        .await?
        .into_iter()
        .map(|profile| (profile.id.clone(), profile))
        .collect();

    let views: Vec<MatchView> = matches
        .into_iter()
        .map(|record| MatchView {
            users: record
                .user_ids
                .iter()
                .filter_map(|id| profiles.get(id).cloned())
                .collect(),
            record,
        })
        .collect();

    Ok(HttpResponse::Ok().json(views))
}

/// GET /api/v1/matches/{id}/messages
async fn list_messages(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let record = participant_match(&state, &path, &user).await?;
    let messages = state.store.list_messages(&record.id).await?;
    Ok(HttpResponse::Ok().json(messages))
}

/// POST /api/v1/matches/{id}/messages
///
/// The stored message echoes `clientId` so the sender can replace its
/// optimistic entry.
async fn send_message(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<String>,
    req: web::Json<SendMessageRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    let record = participant_match(&state, &path, &user).await?;
    let req = req.into_inner();

    let message = Message {
        id: Uuid::new_v4().to_string(),
        match_id: record.id,
        sender_id: user.id,
        text: req.text.trim().to_string(),
        created_at: chrono::Utc::now(),
        client_id: req.client_id,
    };

    let stored = state.store.insert_message(&message).await?;
    state.hub.publish(&stored).await;

    Ok(HttpResponse::Created().json(stored))
}

fn sse_event(message: &Message) -> Option<web::Bytes> {
    match serde_json::to_string(message) {
        Ok(json) => Some(web::Bytes::from(format!("event: message\ndata: {}\n\n", json))),
        Err(e) => {
            tracing::warn!("Could not encode message {}: {}", message.id, e);
            None
        }
    }
}

/// GET /api/v1/matches/{id}/messages/stream
///
/// Server-sent events carrying each message stored for the match from now on.
async fn stream_messages(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let record = participant_match(&state, &path, &user).await?;
    let match_id = record.id;
    let receiver = state.hub.subscribe();

    tracing::debug!("User {} subscribed to match {}", user.id, match_id);

    let updates = stream::unfold(receiver, move |mut receiver| {
        let match_id = match_id.clone();
        async move {
            loop {
                match receiver.recv().await {
                    Ok(message) if message.match_id == match_id => {
                        if let Some(event) = sse_event(&message) {
                            return Some((Ok::<_, Infallible>(event), receiver));
                        }
                    }
                    Ok(_) => continue,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("Subscriber on {} lagged, skipped {} messages", match_id, skipped);
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        }
    });

    let opening = stream::once(async { Ok::<_, Infallible>(web::Bytes::from_static(b": connected\n\n")) });

    Ok(HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .streaming(opening.chain(updates)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sse_event_framing() {
        let message = Message {
            id: "m1".to_string(),
            match_id: "a_b".to_string(),
            sender_id: "a".to_string(),
            text: "hi".to_string(),
            created_at: chrono::Utc::now(),
            client_id: Some("tmp-1".to_string()),
        };

        let event = sse_event(&message).unwrap();
        let text = std::str::from_utf8(&event).unwrap();
        assert!(text.starts_with("event: message\ndata: {"));
        assert!(text.ends_with("}\n\n"));
        assert!(text.contains("\"clientId\":\"tmp-1\""));
    }
}
