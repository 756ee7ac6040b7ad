use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};
use std::time::Duration;

use crate::config::DatabaseSettings;
use crate::core::{pair_id, resolve_vote, score_delta, sorted_pair, VoteChange};
use crate::models::{
    Category, Comment, Match, Message, Post, ProfileLinks, Swipe, SwipeAction, UserProfile,
    VoteTally, VoteTarget, VoteType,
};
use crate::services::store::StoreError;

const PROFILE_COLUMNS: &str = "id, name, headline, bio, current_work, location, age, gender, \
    experience_level, company, college, photo_url, tech_stack, interests, networking_tags, github, linkedin";

const POST_COLUMNS: &str =
    "id, user_id, title, content, category, tags, upvotes, comment_count, created_at, updated_at";

const COMMENT_COLUMNS: &str =
    "id, post_id, user_id, content, parent_comment_id, upvotes, created_at, updated_at";

/// Data store backed by PostgreSQL
///
/// Multi-row writes (swipe plus match, comment plus counter, vote plus
/// score) run inside one transaction each.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect and run pending migrations
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    pub async fn from_settings(settings: &DatabaseSettings) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            &settings.url,
            settings.max_connections.unwrap_or(10),
            settings.min_connections.unwrap_or(1),
            Duration::from_secs(settings.acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(settings.idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    pub async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }

    // Profiles

    pub async fn get_profile(&self, id: &str) -> Result<Option<UserProfile>, StoreError> {
        let query = format!("SELECT {} FROM users WHERE id = $1", PROFILE_COLUMNS);
        let row = sqlx::query(&query).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(profile_from_row).transpose()
    }

    pub async fn upsert_profile(&self, profile: &UserProfile) -> Result<UserProfile, StoreError> {
        let query = r#"
            INSERT INTO users (
                id, name, headline, bio, current_work, location, age, gender, experience_level,
                company, college, photo_url, tech_stack, interests, networking_tags, github, linkedin
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                headline = EXCLUDED.headline,
                bio = EXCLUDED.bio,
                current_work = EXCLUDED.current_work,
                location = EXCLUDED.location,
                age = EXCLUDED.age,
                gender = EXCLUDED.gender,
                experience_level = EXCLUDED.experience_level,
                company = EXCLUDED.company,
                college = EXCLUDED.college,
                photo_url = EXCLUDED.photo_url,
                tech_stack = EXCLUDED.tech_stack,
                interests = EXCLUDED.interests,
                networking_tags = EXCLUDED.networking_tags,
                github = EXCLUDED.github,
                linkedin = EXCLUDED.linkedin,
                updated_at = NOW()
        "#;

        sqlx::query(query)
            .bind(&profile.id)
            .bind(&profile.name)
            .bind(&profile.headline)
            .bind(&profile.bio)
            .bind(&profile.current_work)
            .bind(&profile.location)
            .bind(i16::from(profile.age))
            .bind(&profile.gender)
            .bind(profile.experience_level.as_str())
            .bind(&profile.company)
            .bind(&profile.college)
            .bind(&profile.photo_url)
            .bind(&profile.tech_stack)
            .bind(&profile.interests)
            .bind(&profile.networking_tags)
            .bind(&profile.links.github)
            .bind(&profile.links.linkedin)
            .execute(&self.pool)
            .await?;

        tracing::debug!("Upserted profile {}", profile.id);
        Ok(profile.clone())
    }

    pub async fn list_profiles(&self) -> Result<Vec<UserProfile>, StoreError> {
        let query = format!("SELECT {} FROM users ORDER BY created_at", PROFILE_COLUMNS);
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        rows.iter().map(profile_from_row).collect()
    }

    pub async fn profiles_by_ids(&self, ids: &[String]) -> Result<Vec<UserProfile>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!("SELECT {} FROM users WHERE id = ANY($1)", PROFILE_COLUMNS);
        let rows = sqlx::query(&query).bind(ids).fetch_all(&self.pool).await?;
        rows.iter().map(profile_from_row).collect()
    }

    // Swipes and matches

    pub async fn swiped_ids(&self, swiper_id: &str) -> Result<Vec<String>, StoreError> {
        let rows = sqlx::query("SELECT swiped_id FROM swipes WHERE swiper_id = $1")
            .bind(swiper_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(|row| row.get("swiped_id")).collect())
    }

    pub async fn count_swipes_since(&self, swiper_id: &str, since: DateTime<Utc>) -> Result<u64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM swipes WHERE swiper_id = $1 AND created_at >= $2")
            .bind(swiper_id)
            .bind(since)
            .fetch_one(&self.pool)
            .await?;

        let total: i64 = row.get("total");
        Ok(total.max(0) as u64)
    }

    /// Store the swipe and, on a mutual like, the match, in one transaction
    ///
    /// An advisory lock on the pair serialises the two sides of a mutual
    /// like so exactly one of them observes the other and creates the match.
    pub async fn record_swipe(&self, swipe: &Swipe) -> Result<Option<Match>, StoreError> {
        let id = pair_id(&swipe.swiper_id, &swipe.swiped_id);
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(&id)
            .execute(&mut *tx)
            .await?;

        let query = r#"
            INSERT INTO swipes (swiper_id, swiped_id, action, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (swiper_id, swiped_id)
            DO UPDATE SET
                action = EXCLUDED.action,
                created_at = EXCLUDED.created_at
        "#;
        sqlx::query(query)
            .bind(&swipe.swiper_id)
            .bind(&swipe.swiped_id)
            .bind(swipe.action)
            .bind(swipe.created_at)
            .execute(&mut *tx)
            .await?;

        if swipe.action != SwipeAction::Like {
            tx.commit().await?;
            return Ok(None);
        }

        let mirrored: bool = sqlx::query(
            "SELECT EXISTS (SELECT 1 FROM swipes WHERE swiper_id = $1 AND swiped_id = $2 AND action = 'like')",
        )
        .bind(&swipe.swiped_id)
        .bind(&swipe.swiper_id)
        .fetch_one(&mut *tx)
        .await?
        .get(0);

        if !mirrored {
            tx.commit().await?;
            return Ok(None);
        }

        let [user_a, user_b] = sorted_pair(&swipe.swiper_id, &swipe.swiped_id);
        let query = r#"
            INSERT INTO matches (id, user_a, user_b, matched_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO NOTHING
        "#;
        let inserted = sqlx::query(query)
            .bind(&id)
            .bind(&user_a)
            .bind(&user_b)
            .bind(swipe.created_at)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let row = sqlx::query("SELECT id, user_a, user_b, matched_at FROM matches WHERE id = $1")
            .bind(&id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        if inserted > 0 {
            tracing::info!("New match {}", id);
        }
        Ok(Some(match_from_row(&row)))
    }

    pub async fn matches_for(&self, user_id: &str) -> Result<Vec<Match>, StoreError> {
        let query = r#"
            SELECT id, user_a, user_b, matched_at
            FROM matches
            WHERE user_a = $1 OR user_b = $1
            ORDER BY matched_at DESC
        "#;

        let rows = sqlx::query(query).bind(user_id).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(match_from_row).collect())
    }

    pub async fn get_match(&self, id: &str) -> Result<Option<Match>, StoreError> {
        let row = sqlx::query("SELECT id, user_a, user_b, matched_at FROM matches WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(match_from_row))
    }

    // Messages

    pub async fn list_messages(&self, match_id: &str) -> Result<Vec<Message>, StoreError> {
        let query = r#"
            SELECT id, match_id, sender_id, text, client_id, created_at
            FROM messages
            WHERE match_id = $1
            ORDER BY created_at ASC
        "#;

        let rows = sqlx::query(query).bind(match_id).fetch_all(&self.pool).await?;

        Ok(rows
            .iter()
            .map(|row| Message {
                id: row.get("id"),
                match_id: row.get("match_id"),
                sender_id: row.get("sender_id"),
                text: row.get("text"),
                client_id: row.get("client_id"),
                created_at: row.get("created_at"),
            })
            .collect())
    }

    pub async fn insert_message(&self, message: &Message) -> Result<Message, StoreError> {
        let query = r#"
            INSERT INTO messages (id, match_id, sender_id, text, client_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
        "#;

        sqlx::query(query)
            .bind(&message.id)
            .bind(&message.match_id)
            .bind(&message.sender_id)
            .bind(&message.text)
            .bind(&message.client_id)
            .bind(message.created_at)
            .execute(&self.pool)
            .await?;

        Ok(message.clone())
    }

    // Community

    pub async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        let rows = sqlx::query("SELECT id, name, description, icon, color, created_at FROM categories ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|row| Category {
                id: row.get("id"),
                name: row.get("name"),
                description: row.get("description"),
                icon: row.get("icon"),
                color: row.get("color"),
                created_at: row.get("created_at"),
            })
            .collect())
    }

    pub async fn list_posts(&self, category: Option<&str>, limit: u32, offset: u32) -> Result<Vec<Post>, StoreError> {
        let query = format!(
            "SELECT {} FROM posts WHERE ($1::text IS NULL OR category = $1) \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3",
            POST_COLUMNS
        );

        let rows = sqlx::query(&query)
            .bind(category)
            .bind(i64::from(limit))
            .bind(i64::from(offset))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(post_from_row).collect())
    }

    pub async fn get_post(&self, id: &str) -> Result<Option<Post>, StoreError> {
        let query = format!("SELECT {} FROM posts WHERE id = $1", POST_COLUMNS);
        let row = sqlx::query(&query).bind(id).fetch_optional(&self.pool).await?;
        Ok(row.as_ref().map(post_from_row))
    }

    pub async fn create_post(&self, post: &Post) -> Result<Post, StoreError> {
        let query = format!(
            "INSERT INTO posts ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
            POST_COLUMNS
        );

        sqlx::query(&query)
            .bind(&post.id)
            .bind(&post.user_id)
            .bind(&post.title)
            .bind(&post.content)
            .bind(&post.category)
            .bind(&post.tags)
            .bind(post.upvotes)
            .bind(post.comment_count)
            .bind(post.created_at)
            .bind(post.updated_at)
            .execute(&self.pool)
            .await?;

        Ok(post.clone())
    }

    pub async fn list_comments(&self, post_id: &str) -> Result<Vec<Comment>, StoreError> {
        let query = format!(
            "SELECT {} FROM comments WHERE post_id = $1 ORDER BY created_at ASC",
            COMMENT_COLUMNS
        );
        let rows = sqlx::query(&query).bind(post_id).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(comment_from_row).collect())
    }

    pub async fn get_comment(&self, id: &str) -> Result<Option<Comment>, StoreError> {
        let query = format!("SELECT {} FROM comments WHERE id = $1", COMMENT_COLUMNS);
        let row = sqlx::query(&query).bind(id).fetch_optional(&self.pool).await?;
        Ok(row.as_ref().map(comment_from_row))
    }

    pub async fn create_comment(&self, comment: &Comment) -> Result<Comment, StoreError> {
        let mut tx = self.pool.begin().await?;

        let query = format!(
            "INSERT INTO comments ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            COMMENT_COLUMNS
        );
        sqlx::query(&query)
            .bind(&comment.id)
            .bind(&comment.post_id)
            .bind(&comment.user_id)
            .bind(&comment.content)
            .bind(&comment.parent_comment_id)
            .bind(comment.upvotes)
            .bind(comment.created_at)
            .bind(comment.updated_at)
            .execute(&mut *tx)
            .await?;

        let updated = sqlx::query("UPDATE posts SET comment_count = comment_count + 1 WHERE id = $1")
            .bind(&comment.post_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if updated == 0 {
            return Err(StoreError::NotFound(format!("post {}", comment.post_id)));
        }

        tx.commit().await?;
        Ok(comment.clone())
    }

    pub async fn user_vote(&self, user_id: &str, target: &VoteTarget) -> Result<Option<VoteType>, StoreError> {
        let query = format!(
            "SELECT vote_type FROM votes WHERE user_id = $1 AND {} = $2",
            target_column(target)
        );
        let row = sqlx::query(&query)
            .bind(user_id)
            .bind(target.id())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| row.get("vote_type")))
    }

    pub async fn cast_vote(
        &self,
        user_id: &str,
        target: &VoteTarget,
        vote_type: VoteType,
    ) -> Result<VoteTally, StoreError> {
        let table = target_table(target);
        let column = target_column(target);
        let mut tx = self.pool.begin().await?;

        // Row lock on the target serialises concurrent votes on it
        let locked = sqlx::query(&format!("SELECT upvotes FROM {} WHERE id = $1 FOR UPDATE", table))
            .bind(target.id())
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Err(StoreError::NotFound(format!("{} {}", target.kind(), target.id())));
        }

        let existing: Option<VoteType> = sqlx::query(&format!(
            "SELECT vote_type FROM votes WHERE user_id = $1 AND {} = $2",
            column
        ))
        .bind(user_id)
        .bind(target.id())
        .fetch_optional(&mut *tx)
        .await?
        .map(|row| row.get("vote_type"));

        let change = resolve_vote(existing, vote_type);
        apply_vote_change(&mut tx, user_id, target, change).await?;

        let upvotes: i32 = sqlx::query(&format!(
            "UPDATE {} SET upvotes = upvotes + $2 WHERE id = $1 RETURNING upvotes",
            table
        ))
        .bind(target.id())
        .bind(score_delta(existing, change))
        .fetch_one(&mut *tx)
        .await?
        .get("upvotes");

        tx.commit().await?;

        tracing::debug!("Vote by {} on {} {}: {:?}", user_id, target.kind(), target.id(), change);

        Ok(VoteTally {
            upvotes,
            user_vote: change.resulting_vote(),
        })
    }
}

async fn apply_vote_change(
    tx: &mut Transaction<'_, Postgres>,
    user_id: &str,
    target: &VoteTarget,
    change: VoteChange,
) -> Result<(), StoreError> {
    let column = target_column(target);

    let query = match change {
        VoteChange::Insert(_) => format!("INSERT INTO votes (user_id, {}, vote_type) VALUES ($1, $2, $3)", column),
        VoteChange::Update(_) => format!("UPDATE votes SET vote_type = $3 WHERE user_id = $1 AND {} = $2", column),
        VoteChange::Remove => format!("DELETE FROM votes WHERE user_id = $1 AND {} = $2", column),
    };

    let mut statement = sqlx::query(&query).bind(user_id).bind(target.id());
    if let Some(vote) = change.resulting_vote() {
        statement = statement.bind(vote);
    }
    statement.execute(&mut **tx).await?;

    Ok(())
}

fn target_table(target: &VoteTarget) -> &'static str {
    match target {
        VoteTarget::Post(_) => "posts",
        VoteTarget::Comment(_) => "comments",
    }
}

fn target_column(target: &VoteTarget) -> &'static str {
    match target {
        VoteTarget::Post(_) => "post_id",
        VoteTarget::Comment(_) => "comment_id",
    }
}

fn profile_from_row(row: &PgRow) -> Result<UserProfile, StoreError> {
    let id: String = row.get("id");
    let age: i16 = row.get("age");
    let age = u8::try_from(age)
        .map_err(|_| StoreError::InvalidRecord(format!("profile {} has age {}", id, age)))?;
    let level: String = row.get("experience_level");

    Ok(UserProfile {
        name: row.get("name"),
        headline: row.get("headline"),
        bio: row.get("bio"),
        current_work: row.get("current_work"),
        location: row.get("location"),
        age,
        gender: row.get("gender"),
        experience_level: level.parse().unwrap_or_default(),
        company: row.get("company"),
        college: row.get("college"),
        photo_url: row.get("photo_url"),
        tech_stack: row.get("tech_stack"),
        interests: row.get("interests"),
        networking_tags: row.get("networking_tags"),
        links: ProfileLinks {
            github: row.get("github"),
            linkedin: row.get("linkedin"),
        },
        id,
    })
}

fn match_from_row(row: &PgRow) -> Match {
    Match {
        id: row.get("id"),
        user_ids: vec![row.get("user_a"), row.get("user_b")],
        matched_at: row.get("matched_at"),
    }
}

fn post_from_row(row: &PgRow) -> Post {
    Post {
        id: row.get("id"),
        user_id: row.get("user_id"),
        title: row.get("title"),
        content: row.get("content"),
        category: row.get("category"),
        tags: row.get("tags"),
        upvotes: row.get("upvotes"),
        comment_count: row.get("comment_count"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn comment_from_row(row: &PgRow) -> Comment {
    Comment {
        id: row.get("id"),
        post_id: row.get("post_id"),
        user_id: row.get("user_id"),
        content: row.get("content"),
        parent_comment_id: row.get("parent_comment_id"),
        upvotes: row.get("upvotes"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vote_targets_map_to_columns() {
        let post = VoteTarget::Post("p1".to_string());
        let comment = VoteTarget::Comment("c1".to_string());

        assert_eq!((target_table(&post), target_column(&post)), ("posts", "post_id"));
        assert_eq!((target_table(&comment), target_column(&comment)), ("comments", "comment_id"));
    }

    #[test]
    fn test_column_lists_match_insert_arity() {
        assert_eq!(POST_COLUMNS.split(',').count(), 10);
        assert_eq!(COMMENT_COLUMNS.split(',').count(), 8);
        assert_eq!(PROFILE_COLUMNS.split(',').count(), 17);
    }
}
