use chrono::{DateTime, NaiveTime, Utc};

use crate::models::VoteType;

/// Order-independent id for the pair `(a, b)`
///
/// Used both as the match id and as the id of the pair's conversation, so
/// either participant derives the same value.
pub fn pair_id(a: &str, b: &str) -> String {
    if a <= b {
        format!("{}_{}", a, b)
    } else {
        format!("{}_{}", b, a)
    }
}

/// Both participants, sorted the same way as [`pair_id`]
pub fn sorted_pair(a: &str, b: &str) -> [String; 2] {
    if a <= b {
        [a.to_string(), b.to_string()]
    } else {
        [b.to_string(), a.to_string()]
    }
}

/// Daily swipe allowance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwipeQuota {
    pub limit: u32,
    pub used: u32,
}

impl SwipeQuota {
    pub fn new(limit: u32, used: u64) -> Self {
        Self {
            limit,
            used: u32::try_from(used).unwrap_or(u32::MAX),
        }
    }

    pub fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.used)
    }

    pub fn exhausted(&self) -> bool {
        self.used >= self.limit
    }

    /// Allowance left after one more swipe is recorded
    pub fn after_swipe(&self) -> Self {
        Self {
            limit: self.limit,
            used: self.used.saturating_add(1),
        }
    }
}

/// Start of the UTC day containing `now`; the swipe window resets here
pub fn day_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// Storage change implied by a vote request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteChange {
    Insert(VoteType),
    Update(VoteType),
    Remove,
}

impl VoteChange {
    /// The caller's vote once the change is applied
    pub fn resulting_vote(&self) -> Option<VoteType> {
        match self {
            VoteChange::Insert(vote) | VoteChange::Update(vote) => Some(*vote),
            VoteChange::Remove => None,
        }
    }
}

/// Repeating a vote withdraws it; the opposite vote replaces it
pub fn resolve_vote(existing: Option<VoteType>, requested: VoteType) -> VoteChange {
    match existing {
        None => VoteChange::Insert(requested),
        Some(current) if current == requested => VoteChange::Remove,
        Some(_) => VoteChange::Update(requested),
    }
}

/// Change to a target's score when `existing` becomes the result of `change`
pub fn score_delta(existing: Option<VoteType>, change: VoteChange) -> i32 {
    let before = existing.map_or(0, |vote| vote.value());
    let after = change.resulting_vote().map_or(0, |vote| vote.value());
    after - before
}
