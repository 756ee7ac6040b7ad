use crate::core::CommonGround;
use crate::models::{PromptProfile, UserProfile};

const MAX_SUGGESTIONS: usize = 3;
const MAX_RECOMMENDATIONS: usize = 5;

pub const REPLY_FALLBACKS: [&str; 3] = [
    "Thanks for sharing that!",
    "That sounds really interesting. Tell me more!",
    "I'd love to learn more about your experience with that.",
];

/// Starters built from the other profile's details
pub fn conversation_starters(other: &PromptProfile) -> Vec<String> {
    let name = &other.name;
    let mut suggestions = Vec::new();

    if let Some(tech) = other.tech_stack.first() {
        suggestions.push(format!(
            "Hi {}! I noticed you work with {}. I'd love to hear about your experience with it!",
            name, tech
        ));
    }

    if !other.company.is_empty() && !other.headline.is_empty() {
        suggestions.push(format!(
            "Hey {}! {} at {} sounds interesting. What's the most exciting project you're working on?",
            name, other.headline, other.company
        ));
    }

    if let Some(interest) = other.interests.first() {
        suggestions.push(format!(
            "Hi {}! Fellow {} enthusiast here! Have you been to any good events recently?",
            name, interest
        ));
    }

    if let Some(goal) = other.networking_tags.first() {
        suggestions.push(format!(
            "Hi {}! I see you're {}. I'd love to connect and see how we might help each other!",
            name,
            goal.to_lowercase()
        ));
    }

    if suggestions.is_empty() {
        suggestions.push(format!(
            "Hi {}! Your profile looks great. I'd love to connect and learn more about your work in tech!",
            name
        ));
    }

    suggestions.truncate(MAX_SUGGESTIONS);
    suggestions
}

pub fn reply_suggestions() -> Vec<String> {
    REPLY_FALLBACKS.iter().map(|s| s.to_string()).collect()
}

/// Category-specific post draft; unknown categories get the general text
pub fn post_content(category: &str) -> &'static str {
    match category {
        "ai-ml" => "I've been exploring this topic and would love to hear the community's thoughts. What has been your experience with similar challenges?\n\n\
                    From my perspective, this is an area where the industry is rapidly evolving, and I'm curious about best practices others have discovered.\n\n\
                    What approaches have worked well for you? Any pitfalls to avoid?",
        "career" => "This is something I've been thinking about a lot lately in my career journey. I'd love to get some perspective from others who might have faced similar situations.\n\n\
                     I think this is a common challenge many of us face, and sharing experiences could really help the community.\n\n\
                     What advice would you give? How did you handle similar situations?",
        "frontend" => "I've been working with this technology recently and wanted to share my experience with the community. There are some interesting aspects that I think would benefit from broader discussion.\n\n\
                       From my development work, I've noticed some patterns that might be useful for others facing similar challenges.\n\n\
                       What has been your experience? Are there better approaches I should consider?",
        "backend" => "This is an area I've been diving deep into lately, and I'm curious about how others in the community approach these challenges.\n\n\
                      In my recent projects, I've encountered some interesting technical decisions that made me think about best practices and industry standards.\n\n\
                      What's your take on this? How do you handle similar situations in your backend work?",
        _ => "I wanted to start a discussion about this topic because I think it's something many of us in the tech community encounter.\n\n\
              I'm interested in hearing different perspectives and experiences from the community on this.\n\n\
              What are your thoughts? Have you dealt with something similar?",
    }
}

/// Rank candidates by shared ground with `requester` and summarise the best
///
/// Without a requester profile the candidates keep their store order.
pub fn recommendations(requester: Option<&UserProfile>, candidates: &[UserProfile]) -> Vec<String> {
    let mut ranked: Vec<(usize, &UserProfile)> = candidates
        .iter()
        .map(|candidate| {
            let score = requester
                .map(|me| CommonGround::between(me, candidate).size())
                .unwrap_or(0);
            (score, candidate)
        })
        .collect();

    // Stable sort keeps store order among ties
    ranked.sort_by(|a, b| b.0.cmp(&a.0));

    ranked
        .into_iter()
        .take(MAX_RECOMMENDATIONS)
        .map(|(_, profile)| {
            if profile.headline.is_empty() {
                profile.name.clone()
            } else {
                format!("{} - {}", profile.name, profile.headline)
            }
        })
        .collect()
}
