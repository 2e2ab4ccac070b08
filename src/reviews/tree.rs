// Pure traversal over a review forest
//
// Nothing here touches the network; everything works on a snapshot.

use chrono::{DateTime, Utc};

use crate::reviews::{Reply, Review, ReviewForest};

/// A node of the forest as seen by a renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRef<'a> {
    Review(&'a Review),
    Reply(&'a Reply),
}

impl<'a> NodeRef<'a> {
    pub fn id(&self) -> i64 {
        match self {
            NodeRef::Review(r) => r.id,
            NodeRef::Reply(r) => r.id,
        }
    }

    pub fn user_id(&self) -> i64 {
        match self {
            NodeRef::Review(r) => r.user_id,
            NodeRef::Reply(r) => r.user_id,
        }
    }

    pub fn content(&self) -> &'a str {
        match self {
            NodeRef::Review(r) => &r.content,
            NodeRef::Reply(r) => &r.content,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            NodeRef::Review(r) => r.created_at,
            NodeRef::Reply(r) => r.created_at,
        }
    }

    /// Display name of the author, falling back to `user #<id>`
    pub fn author_label(&self) -> String {
        let author = match self {
            NodeRef::Review(r) => r.author(),
            NodeRef::Reply(r) => r.author(),
        };
        author
            .and_then(|a| a.name.as_deref())
            .filter(|n| !n.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("user #{}", self.user_id()))
    }
}

/// Node plus its nesting depth (reviews are depth 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadNode<'a> {
    pub depth: usize,
    pub node: NodeRef<'a>,
}

/// Depth-first pre-order walk, preserving server order at every level
pub fn walk(forest: &ReviewForest) -> Vec<ThreadNode<'_>> {
    let mut out = Vec::new();
    for review in forest.reviews() {
        out.push(ThreadNode {
            depth: 0,
            node: NodeRef::Review(review),
        });
        walk_replies(&review.replies, 1, &mut out);
    }
    out
}

fn walk_replies<'a>(replies: &'a [Reply], depth: usize, out: &mut Vec<ThreadNode<'a>>) {
    for reply in replies {
        out.push(ThreadNode {
            depth,
            node: NodeRef::Reply(reply),
        });
        walk_replies(&reply.children, depth + 1, out);
    }
}

/// Total number of reviews and replies
pub fn node_count(forest: &ReviewForest) -> usize {
    walk(forest).len()
}

/// The review written by `user_id`, if the snapshot holds one
pub fn find_review_by_author(forest: &ReviewForest, user_id: i64) -> Option<&Review> {
    forest.reviews().iter().find(|r| r.user_id == user_id)
}

pub fn contains_review(forest: &ReviewForest, review_id: i64) -> bool {
    forest.reviews().iter().any(|r| r.id == review_id)
}

/// Indented text lines, one per node
pub fn render_lines(forest: &ReviewForest) -> Vec<String> {
    walk(forest)
        .into_iter()
        .map(|t| {
            let indent = "  ".repeat(t.depth);
            let date = t.node.created_at().format("%Y-%m-%d");
            match t.node {
                NodeRef::Review(r) => format!(
                    "{}[{}/5] {} ({}): {}",
                    indent,
                    r.rating,
                    t.node.author_label(),
                    date,
                    r.content
                ),
                NodeRef::Reply(_) => format!(
                    "{}↳ {} ({}): {}",
                    indent,
                    t.node.author_label(),
                    date,
                    t.node.content()
                ),
            }
        })
        .collect()
}
