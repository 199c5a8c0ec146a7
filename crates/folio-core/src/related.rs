use std::collections::HashSet;

use crate::post::Post;

/// Number of related posts shown under a post.
pub const RELATED_LIMIT: usize = 3;

/// Slots reserved for posts of the same type.
pub const SAME_TYPE_LIMIT: usize = 2;

/// Combine the three candidate tiers into the final related list.
///
/// Tiers are consumed in order: same-type posts sharing stacks (capped at
/// [`SAME_TYPE_LIMIT`]), other-type posts sharing stacks, then the latest
/// posts. Each tier is expected to be pre-sorted by relevance.
pub fn merge(
    current_id: i64,
    same_type: Vec<Post>,
    other_type: Vec<Post>,
    latest: Vec<Post>,
) -> Vec<Post> {
    let mut seen = HashSet::from([current_id]);
    let mut picked = Vec::with_capacity(RELATED_LIMIT);

    let mut take = |posts: Vec<Post>, cap: usize, picked: &mut Vec<Post>| {
        for post in posts {
            if picked.len() >= cap {
                break;
            }
            if seen.insert(post.id) {
                picked.push(post);
            }
        }
    };

    take(same_type, SAME_TYPE_LIMIT, &mut picked);
    take(other_type, RELATED_LIMIT, &mut picked);
    take(latest, RELATED_LIMIT, &mut picked);
    picked
}
