use crate::models::{PromptProfile, UserProfile};

/// The lists common ground is computed over
pub trait ProfileTags {
    fn tech_stack(&self) -> &[String];
    fn interests(&self) -> &[String];
    fn networking_tags(&self) -> &[String];
}

impl ProfileTags for UserProfile {
    fn tech_stack(&self) -> &[String] {
        &self.tech_stack
    }

    fn interests(&self) -> &[String] {
        &self.interests
    }

    fn networking_tags(&self) -> &[String] {
        &self.networking_tags
    }
}

impl ProfileTags for PromptProfile {
    fn tech_stack(&self) -> &[String] {
        &self.tech_stack
    }

    fn interests(&self) -> &[String] {
        &self.interests
    }

    fn networking_tags(&self) -> &[String] {
        &self.networking_tags
    }
}

/// What two profiles share, fed into prompts and fallbacks
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommonGround {
    pub tech_stack: Vec<String>,
    pub interests: Vec<String>,
    pub networking_goals: Vec<String>,
}

impl CommonGround {
    pub fn between<A, B>(current: &A, other: &B) -> Self
    where
        A: ProfileTags,
        B: ProfileTags,
    {
        Self {
            tech_stack: overlapping(current.tech_stack(), other.tech_stack()),
            interests: overlapping(current.interests(), other.interests()),
            networking_goals: current
                .networking_tags()
                .iter()
                .filter(|goal| other.networking_tags().contains(goal))
                .cloned()
                .collect(),
        }
    }

    pub fn size(&self) -> usize {
        self.tech_stack.len() + self.interests.len() + self.networking_goals.len()
    }
}

/// Items from `mine` related to any of `theirs`: either lowercase value
/// contains the other ("React" relates to "React Native")
fn overlapping(mine: &[String], theirs: &[String]) -> Vec<String> {
    let theirs: Vec<String> = theirs.iter().map(|t| t.to_lowercase()).collect();

    mine.iter()
        .filter(|item| {
            let item = item.to_lowercase();
            theirs
                .iter()
                .any(|other| other.contains(&item) || item.contains(other.as_str()))
        })
        .cloned()
        .collect()
}

/// Join a list for prompt text, `fallback` when empty
pub fn join_or(items: &[String], fallback: &str) -> String {
    if items.is_empty() {
        fallback.to_string()
    } else {
        items.join(", ")
    }
}
