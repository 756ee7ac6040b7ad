// Criterion benchmarks for StackSwipe

use chrono::{Duration, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::collections::HashMap;

use stackswipe::core::{build_threads, discover, CommonGround, DiscoveryFilter};
use stackswipe::models::{Comment, DiscoverQuery, ExperienceLevel, ProfileLinks, UserProfile};

const STACKS: [&str; 6] = ["Rust", "Go", "TypeScript", "Python", "Kotlin", "PostgreSQL"];
const LEVELS: [ExperienceLevel; 4] = [
    ExperienceLevel::Junior,
    ExperienceLevel::MidLevel,
    ExperienceLevel::Senior,
    ExperienceLevel::Lead,
];

fn create_candidate(id: usize) -> UserProfile {
    UserProfile {
        id: format!("user-{}", id),
        name: format!("User {}", id),
        headline: "Software engineer".to_string(),
        bio: "Building things on the internet.".to_string(),
        current_work: "Payments platform".to_string(),
        location: if id % 3 == 0 { "Berlin" } else { "Bengaluru" }.to_string(),
        age: 22 + (id % 20) as u8,
        gender: "unspecified".to_string(),
        experience_level: LEVELS[id % LEVELS.len()],
        company: format!("Company {}", id % 25),
        college: String::new(),
        photo_url: None,
        tech_stack: vec![
            STACKS[id % STACKS.len()].to_string(),
            STACKS[(id + 2) % STACKS.len()].to_string(),
        ],
        interests: vec!["open source".to_string()],
        networking_tags: vec!["collaborator-partner".to_string()],
        links: ProfileLinks::default(),
    }
}

fn create_comments(count: usize) -> Vec<Comment> {
    let start = Utc::now();
    (0..count)
        .map(|i| {
            let at = start + Duration::seconds(i as i64);
            Comment {
                id: format!("c{}", i),
                post_id: "p1".to_string(),
                user_id: format!("user-{}", i % 10),
                content: "Interesting point".to_string(),
                // Every fourth comment starts a thread; the rest reply to an earlier one
                parent_comment_id: (i % 4 != 0).then(|| format!("c{}", i / 2)),
                upvotes: 0,
                created_at: at,
                updated_at: at,
            }
        })
        .collect()
}

fn bench_discover(c: &mut Criterion) {
    let filter = DiscoveryFilter::from_query(&DiscoverQuery {
        location: Some("bengaluru".to_string()),
        tech_stack: Some("rust,go".to_string()),
        experience_level: Some("Senior".to_string()),
        ..Default::default()
    });

    let mut group = c.benchmark_group("discover");

    for candidate_count in [100, 1000, 5000].iter() {
        let candidates: Vec<UserProfile> = (0..*candidate_count).map(create_candidate).collect();
        let swiped: Vec<String> = (0..*candidate_count / 10).map(|i| format!("user-{}", i * 7)).collect();

        group.bench_with_input(
            BenchmarkId::new("filtered", candidate_count),
            candidate_count,
            |b, _| {
                b.iter(|| {
                    discover(
                        black_box("user-0"),
                        black_box(&swiped),
                        black_box(candidates.clone()),
                        black_box(&filter),
                    )
                });
            },
        );
    }

    group.finish();
}

fn bench_build_threads(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_threads");

    for comment_count in [50, 500].iter() {
        let comments = create_comments(*comment_count);
        let authors = HashMap::new();

        group.bench_with_input(
            BenchmarkId::from_parameter(comment_count),
            comment_count,
            |b, _| b.iter(|| build_threads(black_box(comments.clone()), black_box(&authors))),
        );
    }

    group.finish();
}

fn bench_common_ground(c: &mut Criterion) {
    let me = create_candidate(1);
    let candidates: Vec<UserProfile> = (0..200).map(create_candidate).collect();

    c.bench_function("common_ground_200_candidates", |b| {
        b.iter(|| {
            let sizes: Vec<usize> = candidates
                .iter()
                .map(|other| CommonGround::between(black_box(&me), other).size())
                .collect();
            black_box(sizes)
        });
    });
}

criterion_group!(benches, bench_discover, bench_build_threads, bench_common_ground);

criterion_main!(benches);
