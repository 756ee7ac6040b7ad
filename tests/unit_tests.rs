// Unit tests for StackSwipe core logic

use chrono::{Duration, TimeZone, Utc};
use std::collections::HashMap;

use stackswipe::ai::{fallbacks, parse_suggestions, prompts};
use stackswipe::core::{
    build_threads, day_start, discover, pair_id, resolve_vote, score_delta, CommonGround,
    DiscoveryFilter, SwipeQuota, VoteChange,
};
use stackswipe::models::{
    AuthorSummary, Comment, DiscoverQuery, ExperienceLevel, PromptProfile, UserProfile, VoteType,
};

fn create_profile(id: &str, name: &str) -> UserProfile {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "name": name,
        "age": 28,
        "headline": format!("{} the engineer", name),
        "location": "Bengaluru, India",
        "company": "Acme Labs",
        "experienceLevel": "Mid-level",
        "techStack": ["Rust", "PostgreSQL"],
        "interests": ["open source"],
        "networkingTags": ["collaborator-partner"]
    }))
    .unwrap()
}

fn create_prompt_profile(name: &str) -> PromptProfile {
    serde_json::from_value(serde_json::json!({
        "name": name,
        "headline": format!("{} the engineer", name),
        "experienceLevel": "Mid-level",
        "techStack": ["Rust", "PostgreSQL"]
    }))
    .unwrap()
}

fn create_comment(id: &str, user: &str, parent: Option<&str>, minute: i64) -> Comment {
    let at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap() + Duration::minutes(minute);
    Comment {
        id: id.to_string(),
        post_id: "post-1".to_string(),
        user_id: user.to_string(),
        content: format!("comment {}", id),
        parent_comment_id: parent.map(str::to_string),
        upvotes: 0,
        created_at: at,
        updated_at: at,
    }
}

#[test]
fn test_discover_excludes_self_and_swiped() {
    let profiles = vec![
        create_profile("me", "Me"),
        create_profile("a", "Asha"),
        create_profile("b", "Ben"),
        create_profile("c", "Chen"),
    ];

    let result = discover("me", &["b".to_string()], profiles, &DiscoveryFilter::default());
    let ids: Vec<&str> = result.iter().map(|p| p.id.as_str()).collect();

    assert_eq!(ids, vec!["a", "c"]);
}

#[test]
fn test_discover_filters_combine() {
    let mut senior = create_profile("s", "Sana");
    senior.experience_level = ExperienceLevel::Senior;
    senior.tech_stack = vec!["Go".to_string()];

    let mut remote = create_profile("r", "Ravi");
    remote.location = "Berlin".to_string();

    let query = DiscoverQuery {
        location: Some("bengaluru".to_string()),
        tech_stack: Some("rust, go".to_string()),
        experience_level: Some("Mid-level".to_string()),
        ..Default::default()
    };
    let filter = DiscoveryFilter::from_query(&query);

    let result = discover(
        "me",
        &[],
        vec![create_profile("m", "Maya"), senior, remote],
        &filter,
    );

    assert_eq!(result.len(), 1);
    assert_eq!(result[0].id, "m");
}

#[test]
fn test_discover_unknown_level_matches_nobody() {
    let query = DiscoverQuery {
        experience_level: Some("Principal".to_string()),
        ..Default::default()
    };
    let filter = DiscoveryFilter::from_query(&query);

    let result = discover("me", &[], vec![create_profile("a", "Asha"), create_profile("b", "Ben")], &filter);
    assert!(result.is_empty());
}

#[test]
fn test_discover_any_level_and_blank_filters_are_ignored() {
    let query = DiscoverQuery {
        experience_level: Some("any".to_string()),
        company: Some("  ".to_string()),
        ..Default::default()
    };

    assert_eq!(DiscoveryFilter::from_query(&query), DiscoveryFilter::default());
}

#[test]
fn test_networking_goal_filter() {
    let query = DiscoverQuery {
        networking_goals: Some("mentor-mentee,hackathon-teammate".to_string()),
        ..Default::default()
    };
    let filter = DiscoveryFilter::from_query(&query);

    let mut mentor = create_profile("m", "Mo");
    mentor.networking_tags = vec!["mentor-mentee".to_string()];

    assert!(filter.matches(&mentor));
    assert!(!filter.matches(&create_profile("x", "Xi")));
}

#[test]
fn test_quota_window_resets_at_utc_midnight() {
    let late = Utc.with_ymd_and_hms(2025, 6, 1, 23, 59, 59).unwrap();
    let early = Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 1).unwrap();

    assert_eq!(day_start(late), Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap());
    assert_eq!(day_start(early), Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap());
}

#[test]
fn test_quota_counts_down_to_zero() {
    let mut quota = SwipeQuota::new(10, 0);
    for expected in (0..10).rev() {
        assert!(!quota.exhausted());
        quota = quota.after_swipe();
        assert_eq!(quota.remaining(), expected);
    }
    assert!(quota.exhausted());
}

#[test]
fn test_pair_id_matches_either_side() {
    assert_eq!(pair_id("u2", "u1"), pair_id("u1", "u2"));
    assert_eq!(pair_id("u2", "u1"), "u1_u2");
}

#[test]
fn test_thread_assembly_with_authors() {
    let mut authors = HashMap::new();
    authors.insert(
        "u1".to_string(),
        AuthorSummary {
            id: "u1".to_string(),
            name: "Asha".to_string(),
            photo_url: None,
            headline: "Backend dev".to_string(),
            company: "Acme".to_string(),
        },
    );

    let threads = build_threads(
        vec![
            create_comment("c2", "u2", None, 2),
            create_comment("c1", "u1", None, 1),
            create_comment("r1", "u2", Some("c1"), 3),
        ],
        &authors,
    );

    assert_eq!(threads.len(), 2);
    assert_eq!(threads[0].comment.id, "c1");
    assert_eq!(threads[0].user.as_ref().map(|u| u.name.as_str()), Some("Asha"));
    assert_eq!(threads[0].replies.len(), 1);
    assert!(threads[1].user.is_none());
}

#[test]
fn test_thread_json_shape() {
    let threads = build_threads(
        vec![
            create_comment("c1", "u1", None, 1),
            create_comment("r1", "u2", Some("c1"), 2),
        ],
        &HashMap::new(),
    );

    let json = serde_json::to_value(&threads).unwrap();
    assert_eq!(json[0]["id"], "c1");
    assert_eq!(json[0]["post_id"], "post-1");
    assert_eq!(json[0]["replies"][0]["parent_comment_id"], "c1");
    assert_eq!(json[0]["replies"][0]["replies"], serde_json::json!([]));
}

#[test]
fn test_vote_sequence_scores() {
    // up, up again (withdraw), down, up (switch)
    let mut score = 0;
    let mut current: Option<VoteType> = None;

    for requested in [VoteType::Up, VoteType::Up, VoteType::Down, VoteType::Up] {
        let change = resolve_vote(current, requested);
        score += score_delta(current, change);
        current = change.resulting_vote();
    }

    assert_eq!(score, 1);
    assert_eq!(current, Some(VoteType::Up));
    assert_eq!(resolve_vote(Some(VoteType::Down), VoteType::Down), VoteChange::Remove);
}

#[test]
fn test_common_ground_is_case_insensitive() {
    let mut me = create_profile("me", "Me");
    me.tech_stack = vec!["react".to_string()];
    let mut other = create_profile("o", "Ola");
    other.tech_stack = vec!["React Native".to_string()];

    let ground = CommonGround::between(&me, &other);
    assert_eq!(ground.tech_stack, vec!["react"]);
    assert_eq!(ground.networking_goals, vec!["collaborator-partner"]);
}

#[test]
fn test_starter_prompt_mentions_both_people() {
    let prompt = prompts::conversation_starters(
        &create_prompt_profile("Asha"),
        &create_prompt_profile("Ben"),
        Default::default(),
    );

    assert!(prompt.contains("Asha"));
    assert!(prompt.contains("Ben"));
}

#[test]
fn test_reply_prompt_keeps_recent_history() {
    let me = create_prompt_profile("Asha");
    let other = create_prompt_profile("Ben");
    let entries: Vec<(String, bool)> = (0..12).map(|i| (format!("line {}", i), i % 2 == 0)).collect();

    let lines = prompts::history_lines(entries.iter().map(|(t, mine)| (t.as_str(), *mine)), &me, &other);
    assert_eq!(lines[0], "Asha: line 0");
    assert_eq!(lines[1], "Ben: line 1");

    let prompt = prompts::reply_suggestions(&lines, &me, &other);
    assert!(prompt.contains("line 11"));
    assert!(!prompt.contains("line 3\n"));
}

#[test]
fn test_parse_suggestions_caps_at_three() {
    let parsed = parse_suggestions("one\ntwo\nthree\nfour\n");
    assert_eq!(parsed, vec!["one", "two", "three"]);
    assert!(parse_suggestions("\n \n").is_empty());
}

#[test]
fn test_fallback_reply_suggestions() {
    assert_eq!(fallbacks::reply_suggestions().len(), 3);
    assert_eq!(fallbacks::reply_suggestions()[0], "Thanks for sharing that!");
}
