//! Reply forest of a single post, rebuilt from the flat comment list.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ids::extend_fingerprint;
use crate::models::Comment;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub comment: Comment,
    /// Fingerprint of the parent chain ending at this comment.
    pub fingerprint: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replies: Vec<Node>,
}

/// Deepest nesting level a reply is placed at. Replies further down the
/// chain hang off their ancestor at this level, in thread order.
pub const MAX_DEPTH: usize = 32;

/// Build the forest from comments in creation order.
///
/// Replies keep the order they were given in. A comment whose parent is not
/// part of the input becomes a root. The forest is never nested deeper than
/// [`MAX_DEPTH`], but fingerprints always follow the full parent chain.
pub fn build(comments: Vec<Comment>) -> Vec<Node> {
    let known: HashMap<String, usize> = comments
        .iter()
        .enumerate()
        .map(|(i, c)| (c.id.clone(), i))
        .collect();

    let mut children: HashMap<usize, Vec<usize>> = HashMap::new();
    let mut roots = Vec::new();
    for (i, comment) in comments.iter().enumerate() {
        match known.get(&comment.parent_id) {
            Some(&parent) if !comment.parent_id.is_empty() && parent != i => {
                children.entry(parent).or_default().push(i)
            }
            _ => roots.push(i),
        }
    }

    // Flatten in pre-order, so every node lands after the node it attaches to.
    let mut slots: Vec<Option<Comment>> = comments.into_iter().map(Some).collect();
    let mut flat: Vec<Option<Node>> = Vec::with_capacity(slots.len());
    let mut attach: Vec<Option<usize>> = Vec::with_capacity(slots.len());
    let mut path: Vec<usize> = Vec::new();
    let mut pending: Vec<(usize, usize)> = roots.into_iter().rev().map(|i| (i, 0)).collect();

    while let Some((index, depth)) = pending.pop() {
        // Taking the slot guards against parent cycles in malformed input.
        let Some(comment) = slots[index].take() else {
            continue;
        };
        path.truncate(depth);
        let parent_fingerprint = path
            .last()
            .and_then(|&pos| flat[pos].as_ref())
            .map(|node| node.fingerprint.as_str());
        let fingerprint = extend_fingerprint(parent_fingerprint, &comment.id);

        attach.push(match depth {
            0 => None,
            d => Some(path[d.min(MAX_DEPTH) - 1]),
        });
        path.push(flat.len());
        flat.push(Some(Node {
            comment,
            fingerprint,
            replies: Vec::new(),
        }));

        if let Some(kids) = children.get(&index) {
            pending.extend(kids.iter().rev().map(|&kid| (kid, depth + 1)));
        }
    }

    // Fold back bottom-up; descendants always sit at higher positions.
    let mut forest = Vec::new();
    for pos in (0..flat.len()).rev() {
        let Some(mut node) = flat[pos].take() else {
            continue;
        };
        node.replies.reverse();
        match attach[pos].and_then(|parent| flat[parent].as_mut()) {
            Some(parent) => parent.replies.push(node),
            None => forest.push(node),
        }
    }
    forest.reverse();
    forest
}

impl Node {
    /// Number of comments in this subtree, this one included.
    pub fn size(&self) -> usize {
        1 + self.replies.iter().map(Node::size).sum::<usize>()
    }

    /// Nesting levels below this node; a leaf has depth 0.
    pub fn depth(&self) -> usize {
        self.replies
            .iter()
            .map(|reply| reply.depth() + 1)
            .max()
            .unwrap_or(0)
    }
}
