use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::core::{pair_id, resolve_vote, score_delta, sorted_pair, VoteChange};
use crate::models::{
    Category, Comment, Match, Message, Post, ProfileLinks, Swipe, SwipeAction, UserProfile,
    VoteTally, VoteTarget, VoteType,
};
use crate::services::documents::{decode, DocumentClient, DocumentError, Query};
use crate::services::store::StoreError;

// Document records. Attribute names are camelCase and flat; the domain
// records are translated at this boundary and nowhere else.

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileDoc {
    #[serde(rename = "$id", skip_serializing, default)]
    id: String,
    name: String,
    #[serde(default)]
    headline: String,
    #[serde(default)]
    bio: String,
    #[serde(default)]
    current_work: String,
    #[serde(default)]
    location: String,
    age: u8,
    #[serde(default)]
    gender: String,
    #[serde(default)]
    experience_level: String,
    #[serde(default)]
    company: String,
    #[serde(default)]
    college: String,
    #[serde(rename = "photoURL", default)]
    photo_url: Option<String>,
    #[serde(default)]
    tech_stack: Vec<String>,
    #[serde(default)]
    interests: Vec<String>,
    #[serde(default)]
    networking_tags: Vec<String>,
    #[serde(default)]
    github: String,
    #[serde(default)]
    linkedin: String,
}

impl From<&UserProfile> for ProfileDoc {
    fn from(p: &UserProfile) -> Self {
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            headline: p.headline.clone(),
            bio: p.bio.clone(),
            current_work: p.current_work.clone(),
            location: p.location.clone(),
            age: p.age,
            gender: p.gender.clone(),
            experience_level: p.experience_level.as_str().to_string(),
            company: p.company.clone(),
            college: p.college.clone(),
            photo_url: p.photo_url.clone(),
            tech_stack: p.tech_stack.clone(),
            interests: p.interests.clone(),
            networking_tags: p.networking_tags.clone(),
            github: p.links.github.clone(),
            linkedin: p.links.linkedin.clone(),
        }
    }
}

impl From<ProfileDoc> for UserProfile {
    fn from(d: ProfileDoc) -> Self {
        Self {
            experience_level: d.experience_level.parse().unwrap_or_default(),
            id: d.id,
            name: d.name,
            headline: d.headline,
            bio: d.bio,
            current_work: d.current_work,
            location: d.location,
            age: d.age,
            gender: d.gender,
            company: d.company,
            college: d.college,
            photo_url: d.photo_url,
            tech_stack: d.tech_stack,
            interests: d.interests,
            networking_tags: d.networking_tags,
            links: ProfileLinks {
                github: d.github,
                linkedin: d.linkedin,
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SwipeDoc {
    swiper_id: String,
    swiped_id: String,
    action: SwipeAction,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MatchDoc {
    pair_id: String,
    user_ids: Vec<String>,
    matched_at: DateTime<Utc>,
}

impl From<MatchDoc> for Match {
    fn from(d: MatchDoc) -> Self {
        Self {
            id: d.pair_id,
            user_ids: d.user_ids,
            matched_at: d.matched_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageDoc {
    #[serde(rename = "$id", skip_serializing, default)]
    id: String,
    conversation_id: String,
    sender_id: String,
    text: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    client_id: Option<String>,
}

impl From<&Message> for MessageDoc {
    fn from(m: &Message) -> Self {
        Self {
            id: m.id.clone(),
            conversation_id: m.match_id.clone(),
            sender_id: m.sender_id.clone(),
            text: m.text.clone(),
            created_at: m.created_at,
            client_id: m.client_id.clone(),
        }
    }
}

impl From<MessageDoc> for Message {
    fn from(d: MessageDoc) -> Self {
        Self {
            id: d.id,
            match_id: d.conversation_id,
            sender_id: d.sender_id,
            text: d.text,
            created_at: d.created_at,
            client_id: d.client_id,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CategoryDoc {
    #[serde(rename = "$id", skip_serializing, default)]
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    icon: String,
    #[serde(default)]
    color: String,
    created_at: DateTime<Utc>,
}

impl From<CategoryDoc> for Category {
    fn from(d: CategoryDoc) -> Self {
        Self {
            id: d.id,
            name: d.name,
            description: d.description,
            icon: d.icon,
            color: d.color,
            created_at: d.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostDoc {
    #[serde(rename = "$id", skip_serializing, default)]
    id: String,
    user_id: String,
    title: String,
    content: String,
    category: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    upvotes: i32,
    #[serde(default)]
    comment_count: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<&Post> for PostDoc {
    fn from(p: &Post) -> Self {
        Self {
            id: p.id.clone(),
            user_id: p.user_id.clone(),
            title: p.title.clone(),
            content: p.content.clone(),
            category: p.category.clone(),
            tags: p.tags.clone(),
            upvotes: p.upvotes,
            comment_count: p.comment_count,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

impl From<PostDoc> for Post {
    fn from(d: PostDoc) -> Self {
        Self {
            id: d.id,
            user_id: d.user_id,
            title: d.title,
            content: d.content,
            category: d.category,
            tags: d.tags,
            upvotes: d.upvotes,
            comment_count: d.comment_count,
            created_at: d.created_at,
            updated_at: d.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentDoc {
    #[serde(rename = "$id", skip_serializing, default)]
    id: String,
    post_id: String,
    user_id: String,
    content: String,
    #[serde(default)]
    parent_comment_id: Option<String>,
    #[serde(default)]
    upvotes: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<&Comment> for CommentDoc {
    fn from(c: &Comment) -> Self {
        Self {
            id: c.id.clone(),
            post_id: c.post_id.clone(),
            user_id: c.user_id.clone(),
            content: c.content.clone(),
            parent_comment_id: c.parent_comment_id.clone(),
            upvotes: c.upvotes,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

impl From<CommentDoc> for Comment {
    fn from(d: CommentDoc) -> Self {
        Self {
            id: d.id,
            post_id: d.post_id,
            user_id: d.user_id,
            content: d.content,
            parent_comment_id: d.parent_comment_id,
            upvotes: d.upvotes,
            created_at: d.created_at,
            updated_at: d.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VoteDoc {
    user_id: String,
    #[serde(default)]
    post_id: Option<String>,
    #[serde(default)]
    comment_id: Option<String>,
    vote_type: VoteType,
    created_at: DateTime<Utc>,
}

/// Score counter shared by posts and comments
#[derive(Debug, Deserialize)]
struct Upvotes {
    #[serde(default)]
    upvotes: i32,
}

/// Deterministic document id for a composite key
///
/// Document ids are capped at 36 characters, so pairs of user ids cannot be
/// used directly. A repeated create with the same key hits 409.
pub fn composite_id(key: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes()).to_string()
}

fn decode_all<D, T>(docs: Vec<Value>) -> Result<Vec<T>, StoreError>
where
    D: serde::de::DeserializeOwned,
    T: From<D>,
{
    docs.into_iter()
        .map(|doc| decode::<D>(doc).map(T::from).map_err(StoreError::from))
        .collect()
}

/// Data store backed by the document database
pub struct DocumentStore {
    client: DocumentClient,
}

impl DocumentStore {
    pub fn new(client: DocumentClient) -> Self {
        Self { client }
    }

    pub async fn health_check(&self) -> Result<bool, StoreError> {
        self.client
            .count(&self.client.collections.categories, Vec::new())
            .await
            .map(|_| true)
            .map_err(Into::into)
    }

    // Profiles

    pub async fn get_profile(&self, id: &str) -> Result<Option<UserProfile>, StoreError> {
        let doc = self.client.get(&self.client.collections.profiles, id).await?;
        doc.map(|d| decode::<ProfileDoc>(d).map(UserProfile::from))
            .transpose()
            .map_err(Into::into)
    }

    pub async fn upsert_profile(&self, profile: &UserProfile) -> Result<UserProfile, StoreError> {
        let doc = ProfileDoc::from(profile);
        self.client
            .upsert(&self.client.collections.profiles, &profile.id, &doc)
            .await?;
        Ok(profile.clone())
    }

    pub async fn list_profiles(&self) -> Result<Vec<UserProfile>, StoreError> {
        let docs = self
            .client
            .list_all(&self.client.collections.profiles, Vec::new())
            .await?;
        decode_all::<ProfileDoc, UserProfile>(docs)
    }

    pub async fn profiles_by_ids(&self, ids: &[String]) -> Result<Vec<UserProfile>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let docs = self
            .client
            .list_all(
                &self.client.collections.profiles,
                vec![Query::equal_any("$id", ids.iter().cloned())],
            )
            .await?;
        decode_all::<ProfileDoc, UserProfile>(docs)
    }

    // Swipes and matches

    pub async fn swiped_ids(&self, swiper_id: &str) -> Result<Vec<String>, StoreError> {
        let docs = self
            .client
            .list_all(
                &self.client.collections.swipes,
                vec![Query::equal("swiperId", swiper_id)],
            )
            .await?;

        docs.into_iter()
            .map(|doc| decode::<SwipeDoc>(doc).map(|s| s.swiped_id).map_err(Into::into))
            .collect()
    }

    pub async fn count_swipes_since(&self, swiper_id: &str, since: DateTime<Utc>) -> Result<u64, StoreError> {
        self.client
            .count(
                &self.client.collections.swipes,
                vec![
                    Query::equal("swiperId", swiper_id),
                    Query::GreaterThanEqual("createdAt", json!(since.to_rfc3339())),
                ],
            )
            .await
            .map_err(Into::into)
    }

    /// Store the swipe, then materialise a match if the mirror like exists
    ///
    /// Both writes use deterministic ids, so replays and concurrent mutual
    /// likes converge on one swipe document per pair and one match.
    pub async fn record_swipe(&self, swipe: &Swipe) -> Result<Option<Match>, StoreError> {
        let collections = &self.client.collections;
        let swipe_id = composite_id(&format!("swipe:{}:{}", swipe.swiper_id, swipe.swiped_id));
        let doc = SwipeDoc {
            swiper_id: swipe.swiper_id.clone(),
            swiped_id: swipe.swiped_id.clone(),
            action: swipe.action,
            created_at: swipe.created_at,
        };
        self.client.upsert(&collections.swipes, &swipe_id, &doc).await?;

        if swipe.action != SwipeAction::Like {
            return Ok(None);
        }

        let mirrored = self
            .client
            .count(
                &collections.swipes,
                vec![
                    Query::equal("swiperId", swipe.swiped_id.as_str()),
                    Query::equal("swipedId", swipe.swiper_id.as_str()),
                    Query::equal("action", "like"),
                ],
            )
            .await?;

        if mirrored == 0 {
            return Ok(None);
        }

        let id = pair_id(&swipe.swiper_id, &swipe.swiped_id);
        let doc = MatchDoc {
            pair_id: id.clone(),
            user_ids: sorted_pair(&swipe.swiper_id, &swipe.swiped_id).to_vec(),
            matched_at: swipe.created_at,
        };

        match self.client.create(&collections.matches, &composite_id(&id), &doc).await {
            Ok(_) => {
                tracing::info!("New match {}", id);
                Ok(Some(doc.into()))
            }
            Err(DocumentError::Conflict(_)) => {
                tracing::debug!("Match {} already exists", id);
                self.get_match(&id).await
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn matches_for(&self, user_id: &str) -> Result<Vec<Match>, StoreError> {
        let docs = self
            .client
            .list_all(
                &self.client.collections.matches,
                vec![
                    Query::Contains("userIds", json!(user_id)),
                    Query::OrderDesc("matchedAt"),
                ],
            )
            .await?;
        decode_all::<MatchDoc, Match>(docs)
    }

    pub async fn get_match(&self, id: &str) -> Result<Option<Match>, StoreError> {
        let doc = self
            .client
            .get(&self.client.collections.matches, &composite_id(id))
            .await?;
        doc.map(|d| decode::<MatchDoc>(d).map(Match::from))
            .transpose()
            .map_err(Into::into)
    }

    // Messages

    pub async fn list_messages(&self, match_id: &str) -> Result<Vec<Message>, StoreError> {
        let docs = self
            .client
            .list_all(
                &self.client.collections.messages,
                vec![
                    Query::equal("conversationId", match_id),
                    Query::OrderAsc("createdAt"),
                ],
            )
            .await?;
        decode_all::<MessageDoc, Message>(docs)
    }

    pub async fn insert_message(&self, message: &Message) -> Result<Message, StoreError> {
        self.client
            .create(&self.client.collections.messages, &message.id, &MessageDoc::from(message))
            .await?;
        Ok(message.clone())
    }

    // Community

    pub async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        let docs = self
            .client
            .list_all(&self.client.collections.categories, vec![Query::OrderAsc("name")])
            .await?;
        decode_all::<CategoryDoc, Category>(docs)
    }

    pub async fn list_posts(&self, category: Option<&str>, limit: u32, offset: u32) -> Result<Vec<Post>, StoreError> {
        let mut queries = Vec::new();
        if let Some(category) = category {
            queries.push(Query::equal("category", category));
        }
        queries.push(Query::OrderDesc("createdAt"));
        queries.push(Query::Limit(limit));
        queries.push(Query::Offset(offset));

        let page = self.client.list(&self.client.collections.posts, &queries).await?;
        decode_all::<PostDoc, Post>(page.documents)
    }

    pub async fn get_post(&self, id: &str) -> Result<Option<Post>, StoreError> {
        let doc = self.client.get(&self.client.collections.posts, id).await?;
        doc.map(|d| decode::<PostDoc>(d).map(Post::from))
            .transpose()
            .map_err(Into::into)
    }

    pub async fn create_post(&self, post: &Post) -> Result<Post, StoreError> {
        self.client
            .create(&self.client.collections.posts, &post.id, &PostDoc::from(post))
            .await?;
        Ok(post.clone())
    }

    pub async fn list_comments(&self, post_id: &str) -> Result<Vec<Comment>, StoreError> {
        let docs = self
            .client
            .list_all(
                &self.client.collections.comments,
                vec![Query::equal("postId", post_id), Query::OrderAsc("createdAt")],
            )
            .await?;
        decode_all::<CommentDoc, Comment>(docs)
    }

    pub async fn get_comment(&self, id: &str) -> Result<Option<Comment>, StoreError> {
        let doc = self.client.get(&self.client.collections.comments, id).await?;
        doc.map(|d| decode::<CommentDoc>(d).map(Comment::from))
            .transpose()
            .map_err(Into::into)
    }

    /// Store the comment, then bump the post's counter
    ///
    /// The document API has no transactions; a failed counter update is
    /// logged and the comment is kept.
    pub async fn create_comment(&self, comment: &Comment) -> Result<Comment, StoreError> {
        let collections = &self.client.collections;
        self.client
            .create(&collections.comments, &comment.id, &CommentDoc::from(comment))
            .await?;

        let bumped = match self.get_post(&comment.post_id).await {
            Ok(Some(post)) => self
                .client
                .update(
                    &collections.posts,
                    &post.id,
                    &json!({ "commentCount": post.comment_count + 1 }),
                )
                .await
                .map(|_| ())
                .map_err(StoreError::from),
            Ok(None) => Err(StoreError::NotFound(format!("post {}", comment.post_id))),
            Err(e) => Err(e),
        };
        if let Err(e) = bumped {
            tracing::warn!("Comment {} stored but post counter not updated: {}", comment.id, e);
        }

        Ok(comment.clone())
    }

    fn vote_id(user_id: &str, target: &VoteTarget) -> String {
        composite_id(&format!("vote:{}:{}:{}", user_id, target.kind(), target.id()))
    }

    fn target_collection(&self, target: &VoteTarget) -> &str {
        match target {
            VoteTarget::Post(_) => &self.client.collections.posts,
            VoteTarget::Comment(_) => &self.client.collections.comments,
        }
    }

    pub async fn user_vote(&self, user_id: &str, target: &VoteTarget) -> Result<Option<VoteType>, StoreError> {
        let doc = self
            .client
            .get(&self.client.collections.votes, &Self::vote_id(user_id, target))
            .await?;
        doc.map(|d| decode::<VoteDoc>(d).map(|v| v.vote_type))
            .transpose()
            .map_err(Into::into)
    }

    pub async fn cast_vote(
        &self,
        user_id: &str,
        target: &VoteTarget,
        vote_type: VoteType,
    ) -> Result<VoteTally, StoreError> {
        let collection = self.target_collection(target).to_string();
        let current = self
            .client
            .get(&collection, target.id())
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("{} {}", target.kind(), target.id())))?;
        let current: Upvotes = decode(current)?;

        let votes = &self.client.collections.votes;
        let vote_id = Self::vote_id(user_id, target);
        let existing = self.user_vote(user_id, target).await?;
        let change = resolve_vote(existing, vote_type);

        match change {
            VoteChange::Insert(vote) | VoteChange::Update(vote) => {
                let (post_id, comment_id) = match target {
                    VoteTarget::Post(id) => (Some(id.clone()), None),
                    VoteTarget::Comment(id) => (None, Some(id.clone())),
                };
                let doc = VoteDoc {
                    user_id: user_id.to_string(),
                    post_id,
                    comment_id,
                    vote_type: vote,
                    created_at: Utc::now(),
                };
                self.client.upsert(votes, &vote_id, &doc).await?;
            }
            VoteChange::Remove => self.client.delete(votes, &vote_id).await?,
        }

        let upvotes = current.upvotes + score_delta(existing, change);
        self.client
            .update(&collection, target.id(), &json!({ "upvotes": upvotes }))
            .await?;

        Ok(VoteTally {
            upvotes,
            user_vote: change.resulting_vote(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composite_id_is_stable_and_short() {
        let key = "swipe:8a6e0804-2bd0-4672-b79d-d97027f9071a:f47ac10b-58cc-4372-a567-0e02b2c3d479";
        assert_eq!(composite_id(key), composite_id(key));
        assert_eq!(composite_id(key).len(), 36);
        assert_ne!(composite_id("a"), composite_id("b"));
    }

    #[test]
    fn test_message_translation() {
        let doc: MessageDoc = serde_json::from_value(json!({
            "$id": "m1",
            "conversationId": "a_b",
            "senderId": "a",
            "text": "hello",
            "createdAt": "2025-01-01T10:00:00.000+00:00"
        }))
        .unwrap();

        let message = Message::from(doc);
        assert_eq!(message.match_id, "a_b");
        assert_eq!(message.id, "m1");

        let back = serde_json::to_value(MessageDoc::from(&message)).unwrap();
        assert!(back.get("$id").is_none());
        assert_eq!(back["conversationId"], "a_b");
    }

    #[test]
    fn test_profile_links_are_flattened() {
        let profile: UserProfile = serde_json::from_value(json!({
            "id": "u1", "name": "Ada", "age": 36,
            "experienceLevel": "Lead",
            "links": { "github": "https://github.com/ada", "linkedin": "" }
        }))
        .unwrap();

        let doc = serde_json::to_value(ProfileDoc::from(&profile)).unwrap();
        assert_eq!(doc["github"], "https://github.com/ada");
        assert_eq!(doc["experienceLevel"], "Lead");
        assert!(doc.get("links").is_none());
    }
}
