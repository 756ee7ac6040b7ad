use std::fmt::Write;

use crate::core::{join_or, CommonGround};
use crate::models::{ConversationType, PromptProfile, UserProfile};

/// How many trailing history lines a reply prompt includes
pub const REPLY_HISTORY_WINDOW: usize = 8;

fn profile_block(out: &mut String, heading: &str, profile: &PromptProfile, extended: bool) {
    let _ = writeln!(out, "{}:", heading);
    let _ = writeln!(out, "- Name: {}", profile.name);
    let _ = writeln!(out, "- Role: {}", profile.role());
    let _ = writeln!(out, "- Experience: {}", or_unspecified(&profile.experience_level));
    let _ = writeln!(out, "- Tech Stack: {}", profile.tech_stack.join(", "));
    let _ = writeln!(out, "- Interests: {}", profile.interests.join(", "));
    let _ = writeln!(out, "- Networking Goals: {}", profile.networking_tags.join(", "));
    if extended {
        let _ = writeln!(out, "- College: {}", or_unspecified(&profile.college));
        let _ = writeln!(out, "- Bio: {}", profile.bio);
    }
    out.push('\n');
}

fn or_unspecified(value: &str) -> &str {
    if value.trim().is_empty() {
        "Not specified"
    } else {
        value
    }
}

pub fn conversation_starters(
    current: &PromptProfile,
    other: &PromptProfile,
    conversation_type: ConversationType,
) -> String {
    let common = CommonGround::between(current, other);
    let mut prompt = String::from(
        "You are an AI assistant for StackSwipe, a professional networking app for tech \
         professionals. Generate 3 personalized conversation starters for a professional \
         networking context.\n\n",
    );

    profile_block(&mut prompt, "CURRENT USER PROFILE", current, true);
    profile_block(&mut prompt, "OTHER USER PROFILE", other, true);

    let _ = writeln!(prompt, "CONVERSATION CONTEXT:");
    let _ = writeln!(prompt, "- Type: {}", conversation_type.as_str());
    let _ = writeln!(prompt, "- Common Tech Stack: {}", join_or(&common.tech_stack, "None"));
    let _ = writeln!(prompt, "- Common Interests: {}", join_or(&common.interests, "None"));
    let _ = writeln!(
        prompt,
        "- Common Networking Goals: {}\n",
        join_or(&common.networking_goals, "None")
    );

    prompt.push_str(
        "REQUIREMENTS:\n\
         1. Generate exactly 3 conversation starters\n\
         2. Keep messages professional but friendly\n\
         3. Personalize based on profiles and common ground\n\
         4. Make them 1-2 sentences long\n\
         5. Focus on networking, collaboration, or knowledge sharing\n\
         6. Avoid generic messages like \"How are you?\"\n\
         7. Use specific details from their profiles\n\n\
         Return only the 3 conversation starters, one per line, without numbering or bullets.",
    );

    prompt
}

/// Render history entries as `Name: text` lines
pub fn history_lines<'a, I>(entries: I, current: &PromptProfile, other: &PromptProfile) -> Vec<String>
where
    I: IntoIterator<Item = (&'a str, bool)>,
{
    entries
        .into_iter()
        .map(|(text, from_current)| {
            let speaker = if from_current { &current.name } else { &other.name };
            format!("{}: {}", speaker, text)
        })
        .collect()
}

pub fn reply_suggestions(history: &[String], current: &PromptProfile, other: &PromptProfile) -> String {
    let recent = &history[history.len().saturating_sub(REPLY_HISTORY_WINDOW)..];

    let mut prompt = String::from(
        "You are an AI assistant helping with professional networking conversations. \
         Generate 3 smart reply suggestions for this ongoing conversation.\n\n\
         CONVERSATION CONTEXT:\n",
    );
    prompt.push_str(&recent.join("\n"));
    prompt.push_str("\n\n");

    profile_block(&mut prompt, "CURRENT USER PROFILE", current, false);
    profile_block(&mut prompt, "OTHER USER PROFILE", other, false);

    prompt.push_str(
        "REQUIREMENTS:\n\
         1. Generate exactly 3 reply suggestions\n\
         2. Make them contextually relevant to the conversation\n\
         3. Keep them professional but friendly\n\
         4. Vary the tone: 1 casual/short, 1 detailed/informative, 1 question-based\n\
         5. Consider both users' backgrounds for relevant responses\n\
         6. Make replies 1-2 sentences each\n\
         7. Focus on building professional relationships\n\n\
         Return only the 3 reply suggestions, one per line, without numbering or bullets.",
    );

    prompt
}

pub fn post_suggestion(title: &str, category: &str) -> String {
    format!(
        "You are an AI assistant helping tech professionals write engaging community posts. \
         Generate a well-structured post content based on the given title and category.\n\n\
         Title: \"{title}\"\n\
         Category: {category}\n\n\
         Requirements:\n\
         1. Write 2-3 paragraphs of engaging content\n\
         2. Make it conversational and professional\n\
         3. Include relevant technical context if applicable\n\
         4. End with a question to encourage discussion\n\
         5. Focus on value for the tech community\n\
         6. Keep it concise but informative\n\n\
         Write the post content only, without any title or meta information."
    )
}

pub fn recommendations(goals: &str, details: &str, candidates: &[UserProfile]) -> String {
    let mut prompt = String::from(
        "You are an AI assistant designed to provide profile recommendations based on user \
         networking goals and their profile details.\n\n\
         You will be given a list of all available user profiles. Recommend a few relevant \
         profile summaries from this list that best match the user's goals.\n\n\
         Do not invent profiles. Only use the data from the \"All Available Profiles\" list.\n\n",
    );
    let _ = writeln!(prompt, "Networking Goals: {}", goals);
    let _ = writeln!(prompt, "My Profile Details: {}\n", details);
    prompt.push_str("All Available Profiles:\n---\n");

    for profile in candidates {
        let _ = writeln!(prompt, "- Name: {}", profile.name);
        let _ = writeln!(prompt, "  Headline: {}", profile.headline);
        let _ = writeln!(prompt, "  Bio: {}", profile.bio);
        let _ = writeln!(prompt, "  Tech Stack: {}", profile.tech_stack.join(", "));
        let _ = writeln!(prompt, "  Interests: {}", profile.interests.join(", "));
        let _ = writeln!(prompt, "  Networking Goals: {}", profile.networking_tags.join(", "));
    }

    prompt.push_str(
        "---\n\nRespond with a JSON object of the form \
         {\"recommendedProfiles\": [\"<Name> - <why they fit>\", ...]} and nothing else.",
    );

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> PromptProfile {
        PromptProfile {
            name: name.to_string(),
            tech_stack: vec!["Rust".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_starters_prompt_mentions_common_ground() {
        let prompt = conversation_starters(&named("Ada"), &named("Grace"), ConversationType::IceBreaker);
        assert!(prompt.contains("- Type: ice_breaker"));
        assert!(prompt.contains("- Common Tech Stack: Rust"));
        assert!(prompt.contains("- Common Interests: None"));
        assert!(prompt.contains("- College: Not specified"));
        assert!(prompt.contains("- Experience: Not specified"));
    }

    #[test]
    fn test_free_text_experience_level_is_kept() {
        let mut other = named("Grace");
        other.experience_level = "Staff".to_string();
        let prompt = conversation_starters(&named("Ada"), &other, ConversationType::FirstMessage);
        assert!(prompt.contains("- Experience: Staff"));
    }

    #[test]
    fn test_reply_prompt_keeps_last_eight_lines() {
        let history: Vec<String> = (0..12).map(|i| format!("line {}", i)).collect();
        let prompt = reply_suggestions(&history, &named("Ada"), &named("Grace"));
        assert!(!prompt.contains("line 3\n"));
        assert!(prompt.contains("line 4\n"));
        assert!(prompt.contains("line 11"));
    }

    #[test]
    fn test_history_lines_use_speaker_names() {
        let lines = history_lines(
            vec![("hi", true), ("hello", false)],
            &named("Ada"),
            &named("Grace"),
        );
        assert_eq!(lines, vec!["Ada: hi", "Grace: hello"]);
    }
}
