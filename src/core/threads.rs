use std::collections::HashMap;

use crate::models::{AuthorSummary, Comment, CommentView};

/// Assemble flat comments into threads
///
/// Top-level comments and every reply list are ordered by `created_at`
/// ascending. Replies whose parent is not in `comments` are dropped.
pub fn build_threads(
    comments: Vec<Comment>,
    authors: &HashMap<String, AuthorSummary>,
) -> Vec<CommentView> {
    let mut children: HashMap<Option<String>, Vec<Comment>> = HashMap::new();
    for comment in comments {
        children
            .entry(comment.parent_comment_id.clone())
            .or_default()
            .push(comment);
    }

    let threads = attach(None, &mut children, authors);

    if !children.is_empty() {
        let orphaned: usize = children.values().map(Vec::len).sum();
        tracing::debug!("Dropped {} replies with missing parents", orphaned);
    }

    threads
}

fn attach(
    parent: Option<String>,
    children: &mut HashMap<Option<String>, Vec<Comment>>,
    authors: &HashMap<String, AuthorSummary>,
) -> Vec<CommentView> {
    let Some(mut level) = children.remove(&parent) else {
        return Vec::new();
    };
    level.sort_by(|a, b| a.created_at.cmp(&b.created_at));

    level
        .into_iter()
        .map(|comment| {
            let replies = attach(Some(comment.id.clone()), children, authors);
            CommentView {
                user: authors.get(&comment.user_id).cloned(),
                comment,
                replies,
            }
        })
        .collect()
}
