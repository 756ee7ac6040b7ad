use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::domain::{
    ExperienceLevel, ProfileLinks, SwipeAction, UserProfile, VoteType, NETWORKING_GOALS,
};

/// Onboarding / profile edit form
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpsertProfileRequest {
    #[validate(length(min = 2, message = "Name must be at least 2 characters."))]
    pub name: String,
    #[validate(length(min = 5, message = "Headline must be at least 5 characters."))]
    pub headline: String,
    #[validate(length(min = 10, message = "Bio must be at least 10 characters."))]
    pub bio: String,
    #[validate(length(min = 2, message = "Location must be at least 2 characters."))]
    pub location: String,
    #[validate(range(min = 18, max = 99, message = "You must be at least 18."))]
    pub age: u8,
    #[validate(length(min = 1, message = "Please select a gender."))]
    pub gender: String,
    #[validate(length(min = 5, message = "Current work must be at least 5 characters."))]
    pub current_work: String,
    #[validate(custom(function = "validate_experience_level"))]
    pub experience_level: ExperienceLevel,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub college: String,
    #[serde(rename = "photoURL", default)]
    pub photo_url: Option<String>,
    #[validate(length(min = 1, message = "Please add at least one skill."))]
    pub tech_stack: Vec<String>,
    #[validate(length(min = 1, message = "Please add at least one interest."))]
    pub interests: Vec<String>,
    #[validate(custom(function = "validate_networking_tags"))]
    pub networking_tags: Vec<String>,
    #[serde(default)]
    #[validate(custom(function = "validate_optional_url"))]
    pub github: String,
    #[serde(default)]
    #[validate(custom(function = "validate_optional_url"))]
    pub linkedin: String,
}

impl UpsertProfileRequest {
    /// Build the stored profile for `user_id`, trimming list entries
    pub fn into_profile(self, user_id: &str) -> UserProfile {
        UserProfile {
            id: user_id.to_string(),
            name: self.name.trim().to_string(),
            headline: self.headline.trim().to_string(),
            bio: self.bio.trim().to_string(),
            current_work: self.current_work.trim().to_string(),
            location: self.location.trim().to_string(),
            age: self.age,
            gender: self.gender,
            experience_level: self.experience_level,
            company: self.company.trim().to_string(),
            college: self.college.trim().to_string(),
            photo_url: self.photo_url.filter(|url| !url.trim().is_empty()),
            tech_stack: clean_list(self.tech_stack),
            interests: clean_list(self.interests),
            networking_tags: clean_list(self.networking_tags),
            links: ProfileLinks {
                github: self.github,
                linkedin: self.linkedin,
            },
        }
    }
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

fn validate_networking_tags(tags: &[String]) -> Result<(), ValidationError> {
    if !tags.iter().any(|tag| !tag.trim().is_empty()) {
        return Err(ValidationError::new("networking_tags")
            .with_message("You have to select at least one item.".into()));
    }
    if let Some(unknown) = tags
        .iter()
        .find(|tag| !NETWORKING_GOALS.contains(&tag.trim()))
    {
        let mut err = ValidationError::new("networking_tags")
            .with_message("Unknown networking goal.".into());
        err.add_param("value".into(), unknown);
        return Err(err);
    }
    Ok(())
}

fn validate_experience_level(level: &ExperienceLevel) -> Result<(), ValidationError> {
    match level {
        ExperienceLevel::Unspecified => Err(ValidationError::new("experience_level")
            .with_message("Please select your experience level.".into())),
        _ => Ok(()),
    }
}

fn validate_optional_url(value: &str) -> Result<(), ValidationError> {
    let looks_like_url = (value.starts_with("https://") || value.starts_with("http://"))
        && !value.contains(char::is_whitespace);
    if value.is_empty() || looks_like_url {
        Ok(())
    } else {
        Err(ValidationError::new("url").with_message("Please enter a valid URL.".into()))
    }
}

/// Discovery filters, all optional
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoverQuery {
    #[serde(default)]
    pub location: Option<String>,
    /// Comma-separated skills
    #[serde(default)]
    pub tech_stack: Option<String>,
    #[serde(default)]
    pub experience_level: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub college: Option<String>,
    /// Comma-separated networking goal ids
    #[serde(default)]
    pub networking_goals: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SwipeRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "swiped_id")]
    pub swiped_id: String,
    pub action: SwipeAction,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    #[validate(custom(function = "validate_not_blank"), length(max = 2000))]
    pub text: String,
    #[serde(default)]
    pub client_id: Option<String>,
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new("blank").with_message("must not be blank".into()))
    } else {
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostListQuery {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub offset: Option<u32>,
}

impl PostListQuery {
    /// `None` when listing every category
    pub fn category_filter(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty() && *c != "all")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreatePostRequest {
    #[validate(custom(function = "validate_not_blank"), length(max = 300))]
    pub title: String,
    #[validate(custom(function = "validate_not_blank"))]
    pub content: String,
    #[validate(custom(function = "validate_not_blank"))]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(custom(function = "validate_not_blank"), length(max = 5000))]
    pub content: String,
    #[serde(default)]
    pub parent_comment_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteRequest {
    pub vote_type: VoteType,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationType {
    #[default]
    FirstMessage,
    FollowUp,
    IceBreaker,
}

impl ConversationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationType::FirstMessage => "first_message",
            ConversationType::FollowUp => "follow_up",
            ConversationType::IceBreaker => "ice_breaker",
        }
    }
}

/// Profile fields a client sends as prompt context
///
/// Nothing is required and the experience level is free text; the AI helpers
/// only need something to describe.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PromptProfile {
    pub name: String,
    pub headline: String,
    pub bio: String,
    pub company: String,
    pub college: String,
    pub experience_level: String,
    pub tech_stack: Vec<String>,
    pub interests: Vec<String>,
    pub networking_tags: Vec<String>,
}

impl PromptProfile {
    /// "Role at Company", degrading gracefully when either is missing
    pub fn role(&self) -> String {
        match (self.headline.is_empty(), self.company.is_empty()) {
            (false, false) => format!("{} at {}", self.headline, self.company),
            (false, true) => self.headline.clone(),
            (true, false) => self.company.clone(),
            (true, true) => "Not specified".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationStartersRequest {
    #[serde(default)]
    pub current_user: Option<PromptProfile>,
    #[serde(default)]
    pub other_user: Option<PromptProfile>,
    #[serde(default)]
    pub conversation_type: Option<ConversationType>,
}

/// One line of chat history as the client renders it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub text: String,
    pub is_from_current_user: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplySuggestionsRequest {
    #[serde(default)]
    pub current_user: Option<PromptProfile>,
    #[serde(default)]
    pub other_user: Option<PromptProfile>,
    #[serde(default)]
    pub message_history: Option<Vec<HistoryEntry>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostSuggestionRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRequest {
    #[validate(length(min = 1))]
    pub networking_goals: String,
    #[serde(default)]
    pub profile_details: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CredentialsRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_profile_request() -> UpsertProfileRequest {
        serde_json::from_value(serde_json::json!({
            "name": "Grace",
            "headline": "Compiler engineer",
            "bio": "I build toolchains for fun.",
            "location": "Arlington",
            "age": 29,
            "gender": "female",
            "currentWork": "COBOL modernisation",
            "experienceLevel": "Senior",
            "techStack": ["Rust", " Go "],
            "interests": ["compilers"],
            "networkingTags": ["mentor-mentee"],
            "github": "https://github.com/grace"
        }))
        .unwrap()
    }

    #[test]
    fn test_valid_profile_passes() {
        let req = valid_profile_request();
        assert!(req.validate().is_ok());

        let profile = req.into_profile("uid-1");
        assert_eq!(profile.id, "uid-1");
        assert_eq!(profile.tech_stack, vec!["Rust", "Go"]);
        assert_eq!(profile.links.linkedin, "");
    }

    #[test]
    fn test_profile_rules() {
        let mut req = valid_profile_request();
        req.age = 17;
        assert!(req.validate().is_err());

        let mut req = valid_profile_request();
        req.networking_tags = vec!["world-domination".to_string()];
        assert!(req.validate().is_err());

        let mut req = valid_profile_request();
        req.linkedin = "not a url".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_onboarding_requires_experience_level() {
        let mut req = valid_profile_request();
        req.experience_level = ExperienceLevel::Unspecified;

        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("experience_level"));
    }

    #[test]
    fn test_prompt_profile_accepts_partial_payloads() {
        let partial: PromptProfile = serde_json::from_value(serde_json::json!({
            "name": "Ben",
            "experienceLevel": "Staff",
            "techStack": ["Rust"]
        }))
        .unwrap();
        assert_eq!(partial.experience_level, "Staff");
        assert_eq!(partial.role(), "Not specified");

        let req: ConversationStartersRequest = serde_json::from_value(serde_json::json!({
            "currentUser": { "name": "Asha", "headline": "Platform engineer", "company": "Acme" },
            "otherUser": {}
        }))
        .unwrap();
        assert_eq!(req.current_user.map(|p| p.role()).as_deref(), Some("Platform engineer at Acme"));
        assert!(req.other_user.is_some());
        assert_eq!(req.conversation_type, None);
    }

    #[test]
    fn test_blank_message_rejected() {
        let req = SendMessageRequest { text: "   ".to_string(), client_id: None };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_post_list_category_filter() {
        let all = PostListQuery { category: Some("all".to_string()), ..Default::default() };
        assert_eq!(all.category_filter(), None);

        let backend = PostListQuery { category: Some("backend".to_string()), ..Default::default() };
        assert_eq!(backend.category_filter(), Some("backend"));
    }
}
