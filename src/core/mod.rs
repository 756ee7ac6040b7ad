// Core logic exports
pub mod common_ground;
pub mod filters;
pub mod matching;
pub mod threads;

pub use common_ground::{join_or, CommonGround, ProfileTags};
pub use filters::{discover, DiscoveryFilter};
pub use matching::{
    day_start, pair_id, resolve_vote, score_delta, sorted_pair, SwipeQuota, VoteChange,
};
pub use threads::build_threads;
