use std::collections::HashSet;

use crate::models::{DiscoverQuery, UserProfile};

/// Parsed discovery filters
///
/// Empty fields match everything. Text filters are lowercased once here so
/// the per-profile checks stay allocation-light. The experience level is kept
/// verbatim and compared exactly, so a level no profile can hold matches none.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoveryFilter {
    pub location: Option<String>,
    pub company: Option<String>,
    pub college: Option<String>,
    pub experience_level: Option<String>,
    pub tech_stack: Vec<String>,
    pub networking_goals: Vec<String>,
}

impl DiscoveryFilter {
    pub fn from_query(query: &DiscoverQuery) -> Self {
        Self {
            location: lowered(query.location.as_deref()),
            company: lowered(query.company.as_deref()),
            college: lowered(query.college.as_deref()),
            experience_level: query
                .experience_level
                .as_deref()
                .map(str::trim)
                .filter(|level| !level.is_empty() && *level != "any")
                .map(str::to_string),
            tech_stack: split_list(query.tech_stack.as_deref())
                .into_iter()
                .map(|skill| skill.to_lowercase())
                .collect(),
            networking_goals: split_list(query.networking_goals.as_deref()),
        }
    }

    #[inline]
    pub fn matches(&self, profile: &UserProfile) -> bool {
        if !contains_ci(&profile.location, self.location.as_deref()) {
            return false;
        }
        if !contains_ci(&profile.company, self.company.as_deref()) {
            return false;
        }
        if !contains_ci(&profile.college, self.college.as_deref()) {
            return false;
        }

        if let Some(level) = self.experience_level.as_deref() {
            if profile.experience_level.as_str() != level {
                return false;
            }
        }

        if !self.tech_stack.is_empty()
            && !profile
                .tech_stack
                .iter()
                .any(|skill| self.tech_stack.contains(&skill.to_lowercase()))
        {
            return false;
        }

        if !self.networking_goals.is_empty()
            && !profile
                .networking_tags
                .iter()
                .any(|tag| self.networking_goals.contains(tag))
        {
            return false;
        }

        true
    }
}

/// Profiles the viewer can still swipe on
///
/// # Pipeline Stages
/// 1. Drop the viewer's own profile
/// 2. Drop profiles already swiped on
/// 3. Apply the discovery filters
pub fn discover(
    viewer_id: &str,
    swiped_ids: &[String],
    profiles: Vec<UserProfile>,
    filter: &DiscoveryFilter,
) -> Vec<UserProfile> {
    let swiped: HashSet<&str> = swiped_ids.iter().map(String::as_str).collect();

    profiles
        .into_iter()
        .filter(|profile| profile.id != viewer_id)
        .filter(|profile| !swiped.contains(profile.id.as_str()))
        .filter(|profile| filter.matches(profile))
        .collect()
}

fn lowered(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_lowercase)
}

fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[inline]
fn contains_ci(haystack: &str, needle: Option<&str>) -> bool {
    match needle {
        Some(needle) => haystack.to_lowercase().contains(needle),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExperienceLevel, ProfileLinks};

    fn profile(id: &str, location: &str, level: ExperienceLevel, stack: &[&str]) -> UserProfile {
        UserProfile {
            id: id.to_string(),
            name: format!("User {}", id),
            headline: "Engineer".to_string(),
            bio: String::new(),
            current_work: String::new(),
            location: location.to_string(),
            age: 28,
            gender: String::new(),
            experience_level: level,
            company: "Initech".to_string(),
            college: "State University".to_string(),
            photo_url: None,
            tech_stack: stack.iter().map(|s| s.to_string()).collect(),
            interests: vec![],
            networking_tags: vec!["mentor-mentee".to_string()],
            links: ProfileLinks::default(),
        }
    }

    #[test]
    fn test_empty_query_matches_everything() {
        let filter = DiscoveryFilter::from_query(&DiscoverQuery::default());
        assert_eq!(filter, DiscoveryFilter::default());
        assert!(filter.matches(&profile("1", "Berlin", ExperienceLevel::Junior, &[])));
    }

    #[test]
    fn test_any_experience_level_is_ignored() {
        let filter = DiscoveryFilter::from_query(&DiscoverQuery {
            experience_level: Some("any".to_string()),
            ..Default::default()
        });
        assert_eq!(filter.experience_level, None);
    }

    #[test]
    fn test_experience_level_is_exact() {
        let senior = DiscoveryFilter::from_query(&DiscoverQuery {
            experience_level: Some("Senior".to_string()),
            ..Default::default()
        });
        assert!(senior.matches(&profile("1", "Berlin", ExperienceLevel::Senior, &[])));
        assert!(!senior.matches(&profile("2", "Berlin", ExperienceLevel::Junior, &[])));

        let unknown = DiscoveryFilter::from_query(&DiscoverQuery {
            experience_level: Some("Principal".to_string()),
            ..Default::default()
        });
        assert_eq!(unknown.experience_level.as_deref(), Some("Principal"));
        for level in [ExperienceLevel::Junior, ExperienceLevel::Senior, ExperienceLevel::Unspecified] {
            assert!(!unknown.matches(&profile("3", "Berlin", level, &[])));
        }
    }

    #[test]
    fn test_tech_stack_is_any_of_case_insensitive() {
        let filter = DiscoveryFilter::from_query(&DiscoverQuery {
            tech_stack: Some("rust, Go".to_string()),
            ..Default::default()
        });

        assert!(filter.matches(&profile("1", "Berlin", ExperienceLevel::Junior, &["Go", "Python"])));
        assert!(!filter.matches(&profile("2", "Berlin", ExperienceLevel::Junior, &["Java"])));
    }

    #[test]
    fn test_location_substring() {
        let filter = DiscoveryFilter::from_query(&DiscoverQuery {
            location: Some("  berl ".to_string()),
            ..Default::default()
        });

        assert!(filter.matches(&profile("1", "Berlin, DE", ExperienceLevel::Senior, &[])));
        assert!(!filter.matches(&profile("2", "Munich", ExperienceLevel::Senior, &[])));
    }

    #[test]
    fn test_discover_excludes_self_and_swiped() {
        let profiles = vec![
            profile("me", "Berlin", ExperienceLevel::Lead, &[]),
            profile("a", "Berlin", ExperienceLevel::Lead, &[]),
            profile("b", "Berlin", ExperienceLevel::Lead, &[]),
        ];

        let result = discover("me", &["a".to_string()], profiles, &DiscoveryFilter::default());

        let ids: Vec<&str> = result.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["b"]);
    }
}
