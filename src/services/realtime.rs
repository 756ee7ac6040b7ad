use futures_util::StreamExt;
use redis::aio::ConnectionManager;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::config::RealtimeSettings;
use crate::models::Message;

/// Errors that can occur while publishing messages
#[derive(Debug, Error)]
pub enum RealtimeError {
    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

#[derive(Clone)]
struct RedisRelay {
    connection: ConnectionManager,
    channel: String,
}

/// Fan-out of stored chat messages to live subscribers
///
/// Without Redis, delivery is local to this process. With Redis, every
/// publish goes through the channel and each instance relays what it
/// receives into its own broadcast, so subscribers on any instance see
/// every message exactly once.
#[derive(Clone)]
pub struct MessageHub {
    sender: broadcast::Sender<Message>,
    relay: Option<RedisRelay>,
}

impl MessageHub {
    /// Hub that delivers within this process only
    pub fn local(buffer: usize) -> Self {
        let (sender, _) = broadcast::channel(buffer.max(1));
        Self { sender, relay: None }
    }

    /// Build from settings, starting the Redis relay when a URL is set
    pub async fn from_settings(settings: &RealtimeSettings) -> Result<Self, RealtimeError> {
        let Some(url) = settings.redis_url.as_deref().filter(|u| !u.is_empty()) else {
            tracing::info!("Realtime delivery is local to this instance");
            return Ok(Self::local(settings.buffer));
        };

        let client = redis::Client::open(url)?;
        let connection = ConnectionManager::new(client.clone()).await?;

        let mut pubsub = client.get_async_pubsub().await?;
        pubsub.subscribe(&settings.channel).await?;

        let hub = Self::local(settings.buffer);
        let sender = hub.sender.clone();
        let channel = settings.channel.clone();

        tokio::spawn(async move {
            let mut messages = pubsub.on_message();
            while let Some(msg) = messages.next().await {
                let payload: String = match msg.get_payload() {
                    Ok(payload) => payload,
                    Err(e) => {
                        tracing::warn!("Unreadable payload on {}: {}", channel, e);
                        continue;
                    }
                };
                match serde_json::from_str::<Message>(&payload) {
                    // No receivers is fine
                    Ok(message) => {
                        let _ = sender.send(message);
                    }
                    Err(e) => tracing::warn!("Dropping malformed message on {}: {}", channel, e),
                }
            }
            tracing::error!("Redis relay for {} ended", channel);
        });

        tracing::info!("Realtime delivery relayed through Redis channel {}", settings.channel);

        Ok(Self {
            relay: Some(RedisRelay {
                connection,
                channel: settings.channel.clone(),
            }),
            ..hub
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Message> {
        self.sender.subscribe()
    }

    /// Deliver a stored message to every subscriber
    ///
    /// Failure to reach Redis degrades to local delivery.
    pub async fn publish(&self, message: &Message) {
        if let Some(relay) = &self.relay {
            match relay.publish(message).await {
                Ok(()) => return,
                Err(e) => tracing::warn!("Redis publish failed, delivering locally: {}", e),
            }
        }

        let delivered = self.sender.send(message.clone()).unwrap_or(0);
        tracing::debug!("Message {} delivered to {} local subscribers", message.id, delivered);
    }
}

impl RedisRelay {
    async fn publish(&self, message: &Message) -> Result<(), RealtimeError> {
        let payload = serde_json::to_string(message)?;
        let mut connection = self.connection.clone();

        let _receivers: i64 = redis::cmd("PUBLISH")
            .arg(&self.channel)
            .arg(payload)
            .query_async(&mut connection)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn message(id: &str, match_id: &str) -> Message {
        Message {
            id: id.to_string(),
            match_id: match_id.to_string(),
            sender_id: "a".to_string(),
            text: "hi".to_string(),
            created_at: Utc::now(),
            client_id: None,
        }
    }

    #[tokio::test]
    async fn test_local_hub_delivers_to_all_subscribers() {
        let hub = MessageHub::local(8);
        let mut first = hub.subscribe();
        let mut second = hub.subscribe();

        hub.publish(&message("m1", "a_b")).await;

        assert_eq!(first.recv().await.unwrap().id, "m1");
        assert_eq!(second.recv().await.unwrap().match_id, "a_b");
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_quiet() {
        let hub = MessageHub::local(8);
        hub.publish(&message("m1", "a_b")).await;

        let mut late = hub.subscribe();
        assert!(late.try_recv().is_err());
    }
}
