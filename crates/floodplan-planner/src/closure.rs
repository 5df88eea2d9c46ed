//! Transitive acceptor closure
//!
//! The closure of a set of acceptors is the union of their root-ward paths,
//! acceptors and root included.

use std::collections::HashSet;

use floodplan_common::{ChannelId, ChannelTree};

/// Union of the paths from each acceptor to the root, inclusive
///
/// Each walk stops at the first node already in the set, so every node is
/// visited at most once per call.
pub fn closure_of(tree: &ChannelTree, acceptors: &[ChannelId]) -> HashSet<ChannelId> {
    let mut closure = HashSet::with_capacity(acceptors.len() * 2);
    for &acceptor in acceptors {
        if !tree.contains(acceptor) {
            continue;
        }
        let mut current = Some(acceptor);
        while let Some(id) = current {
            if !closure.insert(id) {
                break;
            }
            current = tree.parent(id);
        }
    }
    closure
}

/// Strict ancestors of a channel, excluding the channel itself and the root
pub fn ancestors_of(tree: &ChannelTree, id: ChannelId) -> Vec<ChannelId> {
    let root = tree.root();
    tree.ancestors(id).filter(|&a| Some(a) != root).collect()
}
