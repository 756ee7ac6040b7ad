use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Networking goals a profile can advertise
pub const NETWORKING_GOALS: &[&str] = &[
    "hackathon-teammate",
    "mentor-mentee",
    "collaborator-partner",
    "hire-get-hired",
    "friends-peers",
    "learn-teach",
    "project-startup",
];

/// Self-reported professional profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub headline: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub current_work: String,
    #[serde(default)]
    pub location: String,
    pub age: u8,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub experience_level: ExperienceLevel,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub college: String,
    #[serde(rename = "photoURL", default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub networking_tags: Vec<String>,
    #[serde(default)]
    pub links: ProfileLinks,
}

impl UserProfile {
    pub fn author_summary(&self) -> AuthorSummary {
        AuthorSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            photo_url: self.photo_url.clone(),
            headline: self.headline.clone(),
            company: self.company.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileLinks {
    #[serde(default)]
    pub github: String,
    #[serde(default)]
    pub linkedin: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExperienceLevel {
    Intern,
    Junior,
    #[serde(rename = "Mid-level")]
    MidLevel,
    Senior,
    Lead,
    Manager,
    #[default]
    #[serde(rename = "")]
    Unspecified,
}

impl ExperienceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExperienceLevel::Intern => "Intern",
            ExperienceLevel::Junior => "Junior",
            ExperienceLevel::MidLevel => "Mid-level",
            ExperienceLevel::Senior => "Senior",
            ExperienceLevel::Lead => "Lead",
            ExperienceLevel::Manager => "Manager",
            ExperienceLevel::Unspecified => "",
        }
    }
}

impl fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExperienceLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Intern" => Ok(ExperienceLevel::Intern),
            "Junior" => Ok(ExperienceLevel::Junior),
            "Mid-level" => Ok(ExperienceLevel::MidLevel),
            "Senior" => Ok(ExperienceLevel::Senior),
            "Lead" => Ok(ExperienceLevel::Lead),
            "Manager" => Ok(ExperienceLevel::Manager),
            "" => Ok(ExperienceLevel::Unspecified),
            other => Err(format!("unknown experience level: {}", other)),
        }
    }
}

/// Like or dislike on another profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "swipe_action", rename_all = "lowercase")]
pub enum SwipeAction {
    Like,
    Dislike,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Swipe {
    pub swiper_id: String,
    pub swiped_id: String,
    pub action: SwipeAction,
    pub created_at: DateTime<Utc>,
}

/// A pair of mutual likes. `id` doubles as the conversation id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: String,
    pub user_ids: Vec<String>,
    pub matched_at: DateTime<Utc>,
}

impl Match {
    pub fn includes(&self, user_id: &str) -> bool {
        self.user_ids.iter().any(|id| id == user_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub match_id: String,
    pub sender_id: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

/// Discussion board category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub content: String,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub upvotes: i32,
    pub comment_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    pub user_id: String,
    pub content: String,
    pub parent_comment_id: Option<String>,
    pub upvotes: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Author fields joined onto posts and comments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorSummary {
    pub id: String,
    pub name: String,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
    pub headline: String,
    pub company: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "vote_type", rename_all = "lowercase")]
pub enum VoteType {
    Up,
    Down,
}

impl VoteType {
    pub fn value(&self) -> i32 {
        match self {
            VoteType::Up => 1,
            VoteType::Down => -1,
        }
    }
}

/// What a vote is cast on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteTarget {
    Post(String),
    Comment(String),
}

impl VoteTarget {
    pub fn id(&self) -> &str {
        match self {
            VoteTarget::Post(id) | VoteTarget::Comment(id) => id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            VoteTarget::Post(_) => "post",
            VoteTarget::Comment(_) => "comment",
        }
    }
}

/// Score of a target after a vote, plus the caller's standing vote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteTally {
    pub upvotes: i32,
    pub user_vote: Option<VoteType>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_experience_level_wire_names() {
        assert_eq!(serde_json::to_string(&ExperienceLevel::MidLevel).unwrap(), "\"Mid-level\"");
        let parsed: ExperienceLevel = serde_json::from_str("\"\"").unwrap();
        assert_eq!(parsed, ExperienceLevel::Unspecified);
        assert_eq!("Senior".parse::<ExperienceLevel>().unwrap(), ExperienceLevel::Senior);
        assert!("Wizard".parse::<ExperienceLevel>().is_err());
    }

    #[test]
    fn test_match_includes() {
        let m = Match {
            id: "a_b".to_string(),
            user_ids: vec!["a".to_string(), "b".to_string()],
            matched_at: Utc::now(),
        };
        assert!(m.includes("b"));
        assert!(!m.includes("c"));
    }
}
