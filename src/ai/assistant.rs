use serde::Deserialize;

use crate::ai::{fallbacks, prompts};
use crate::config::{LlmSettings, ModelSettings};
use crate::models::{ConversationType, PromptProfile, UserProfile};
use crate::services::llm::{CompletionRequest, LlmClient, LlmError};

const MAX_SUGGESTIONS: usize = 3;

/// Generated-content features over the LLM client
///
/// Every method returns usable text: when the completion fails or comes
/// back empty the static fallback is returned instead.
pub struct Assistant {
    llm: LlmClient,
    models: ModelSettings,
    temperature: f32,
}

impl Assistant {
    pub fn new(llm: LlmClient, settings: &LlmSettings) -> Self {
        Self {
            llm,
            models: settings.models.clone(),
            temperature: settings.temperature,
        }
    }

    async fn complete(&self, model: &str, prompt: &str, max_tokens: u32) -> Result<String, LlmError> {
        self.llm
            .complete(CompletionRequest {
                model,
                prompt,
                temperature: self.temperature,
                max_tokens,
            })
            .await
    }

    pub async fn conversation_starters(
        &self,
        current: &PromptProfile,
        other: &PromptProfile,
        conversation_type: ConversationType,
    ) -> Vec<String> {
        let prompt = prompts::conversation_starters(current, other, conversation_type);

        match self.complete(&self.models.conversation_starters, &prompt, 300).await {
            Ok(text) => {
                let suggestions = parse_suggestions(&text);
                if suggestions.is_empty() {
                    tracing::warn!("Conversation starters completion had no usable lines");
                    fallbacks::conversation_starters(other)
                } else {
                    suggestions
                }
            }
            Err(e) => {
                tracing::warn!("Falling back to static conversation starters: {}", e);
                fallbacks::conversation_starters(other)
            }
        }
    }

    pub async fn reply_suggestions(
        &self,
        history: &[String],
        current: &PromptProfile,
        other: &PromptProfile,
    ) -> Vec<String> {
        let prompt = prompts::reply_suggestions(history, current, other);

        match self.complete(&self.models.reply_suggestions, &prompt, 200).await {
            Ok(text) => {
                let suggestions = parse_suggestions(&text);
                if suggestions.is_empty() {
                    fallbacks::reply_suggestions()
                } else {
                    suggestions
                }
            }
            Err(e) => {
                tracing::warn!("Falling back to static reply suggestions: {}", e);
                fallbacks::reply_suggestions()
            }
        }
    }

    pub async fn post_suggestion(&self, title: &str, category: &str) -> String {
        let prompt = prompts::post_suggestion(title, category);

        match self.complete(&self.models.post_suggestions, &prompt, 400).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Falling back to static post content for '{}': {}", category, e);
                fallbacks::post_content(category).to_string()
            }
        }
    }

    /// Recommend from `candidates` only; names the model invents are dropped
    pub async fn recommendations(
        &self,
        goals: &str,
        details: &str,
        requester: Option<&UserProfile>,
        candidates: &[UserProfile],
    ) -> Vec<String> {
        if candidates.is_empty() {
            return Vec::new();
        }

        let prompt = prompts::recommendations(goals, details, candidates);
        let result = self
            .complete(&self.models.recommendations, &prompt, 600)
            .await
            .map(|text| parse_recommendations(&text, candidates));

        match result {
            Ok(picks) if !picks.is_empty() => picks,
            Ok(_) => {
                tracing::warn!("Recommendation completion named no known profiles");
                fallbacks::recommendations(requester, candidates)
            }
            Err(e) => {
                tracing::warn!("Falling back to local recommendations: {}", e);
                fallbacks::recommendations(requester, candidates)
            }
        }
    }
}

/// Split a completion into at most three suggestions
///
/// Blank lines are skipped and list markers or wrapping quotes the model
/// added despite instructions are stripped.
pub fn parse_suggestions(text: &str) -> Vec<String> {
    text.lines()
        .map(clean_line)
        .filter(|line| !line.is_empty())
        .take(MAX_SUGGESTIONS)
        .map(str::to_string)
        .collect()
}

fn clean_line(line: &str) -> &str {
    let mut line = line.trim();

    if let Some(rest) = line.strip_prefix(['-', '*', '•']) {
        line = rest.trim_start();
    } else {
        let digits = line.chars().take_while(char::is_ascii_digit).count();
        if digits > 0 {
            if let Some(rest) = line[digits..].strip_prefix(['.', ')']) {
                line = rest.trim_start();
            }
        }
    }

    if line.len() >= 2 && line.starts_with('"') && line.ends_with('"') {
        line = &line[1..line.len() - 1];
    }

    line.trim()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecommendationPayload {
    recommended_profiles: Vec<String>,
}

/// Read `{"recommendedProfiles": [...]}`, tolerating prose around the object
fn parse_recommendations(text: &str, candidates: &[UserProfile]) -> Vec<String> {
    let json = match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => return Vec::new(),
    };

    let payload: RecommendationPayload = match serde_json::from_str(json) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::debug!("Unparseable recommendation payload: {}", e);
            return Vec::new();
        }
    };

    payload
        .recommended_profiles
        .into_iter()
        .map(|summary| summary.trim().to_string())
        .filter(|summary| {
            candidates
                .iter()
                .any(|candidate| !candidate.name.is_empty() && summary.starts_with(&candidate.name))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strips_markers_and_blanks() {
        let text = "1. Hi there!\n\n- \"Second one\"\n* third\nfourth";
        assert_eq!(parse_suggestions(text), vec!["Hi there!", "Second one", "third"]);
    }

    #[test]
    fn test_parse_keeps_leading_numbers_that_are_content() {
        assert_eq!(parse_suggestions("10x engineers exist?"), vec!["10x engineers exist?"]);
    }

    #[test]
    fn test_parse_recommendations_filters_unknown_names() {
        let candidates: Vec<UserProfile> = vec![serde_json::from_value(serde_json::json!({
            "id": "a", "name": "Ada", "age": 36
        }))
        .unwrap()];

        let text = "Sure! {\"recommendedProfiles\": [\"Ada - fellow Rustacean\", \"Zed - invented\"]}";
        assert_eq!(parse_recommendations(text, &candidates), vec!["Ada - fellow Rustacean"]);
        assert!(parse_recommendations("no json here", &candidates).is_empty());
    }
}
