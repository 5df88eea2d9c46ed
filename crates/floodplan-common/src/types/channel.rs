//! Channel Tree - reach network topology
//!
//! A channel (reach) is a polyline of lattice points with exactly one parent,
//! except the root. An empty network has no root and no channels. The tree
//! is validated once at construction and is never mutated afterwards;
//! topology edits require building a new tree.
//!
//! Key characteristics:
//! - Channels are keyed by [`ChannelId`], never by reference identity
//! - Parent lookup is derived once in a single traversal
//! - Storage is kept in top-down (pre-order) order, which is the canonical
//!   visiting order for ranking ties and report output
//! - All traversals use explicit stacks, so deep trees cannot overflow

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::TopologyError;

/// Stable channel identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub i64);

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ChannelId {
    fn from(id: i64) -> Self {
        ChannelId(id)
    }
}

impl From<i32> for ChannelId {
    fn from(id: i32) -> Self {
        ChannelId(i64::from(id))
    }
}

/// Lattice point on a channel centerline
///
/// Coordinates are signed so that malformed input can be represented and
/// rejected by grid lookups instead of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelPoint {
    pub x: i32,
    pub y: i32,
}

impl ChannelPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for ChannelPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A single reach of the hydraulic network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    /// Unique, stable identifier
    pub id: ChannelId,
    /// Centerline points in physical order along the reach
    pub points: Vec<ChannelPoint>,
    /// Ordered child reaches
    pub children: Vec<ChannelId>,
}

impl Channel {
    /// Create an empty channel
    pub fn new(id: impl Into<ChannelId>) -> Self {
        Self {
            id: id.into(),
            points: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Set centerline points
    pub fn with_points(mut self, points: impl IntoIterator<Item = (i32, i32)>) -> Self {
        self.points = points
            .into_iter()
            .map(|(x, y)| ChannelPoint::new(x, y))
            .collect();
        self
    }

    /// Append a child reach
    pub fn with_child(mut self, child: impl Into<ChannelId>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Number of centerline points
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the channel has no points
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Validated channel tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TreeRecord", into = "TreeRecord")]
pub struct ChannelTree {
    /// Root channel id, `None` only for an empty tree
    root: Option<ChannelId>,
    /// Channels in top-down (pre-order) order
    channels: Vec<Channel>,
    /// Position of each channel in `channels`
    index: HashMap<ChannelId, usize>,
    /// Parent of every non-root channel
    parents: HashMap<ChannelId, ChannelId>,
}

impl ChannelTree {
    /// Build a tree from an unordered set of channels
    ///
    /// The root is the only channel that no other channel lists as a child.
    pub fn new(channels: Vec<Channel>) -> Result<Self, TopologyError> {
        if channels.is_empty() {
            return Ok(Self::empty());
        }

        let mut by_id: HashMap<ChannelId, Channel> = HashMap::with_capacity(channels.len());
        let mut input_order = Vec::with_capacity(channels.len());
        for channel in channels {
            let id = channel.id;
            if by_id.insert(id, channel).is_some() {
                return Err(TopologyError::DuplicateChannel(id));
            }
            input_order.push(id);
        }

        let mut parents: HashMap<ChannelId, ChannelId> = HashMap::with_capacity(by_id.len());
        for id in &input_order {
            for child in &by_id[id].children {
                if !by_id.contains_key(child) {
                    return Err(TopologyError::UnknownChild {
                        parent: *id,
                        child: *child,
                    });
                }
                if let Some(first) = parents.insert(*child, *id) {
                    return Err(TopologyError::MultipleParents {
                        child: *child,
                        first,
                        second: *id,
                    });
                }
            }
        }

        let mut roots: Vec<ChannelId> = input_order
            .iter()
            .filter(|id| !parents.contains_key(id))
            .copied()
            .collect();
        let root = match roots.len() {
            0 => return Err(TopologyError::NoRoot),
            1 => roots[0],
            _ => {
                roots.sort();
                return Err(TopologyError::MultipleRoots(roots));
            }
        };

        // Pre-order walk with an explicit stack; children pushed in reverse
        // so the first child is visited first.
        let mut ordered = Vec::with_capacity(by_id.len());
        let mut visited: HashSet<ChannelId> = HashSet::with_capacity(by_id.len());
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            if let Some(channel) = by_id.remove(&id) {
                stack.extend(channel.children.iter().rev().copied());
                ordered.push(channel);
            }
        }

        if let Some(unreachable) = input_order.iter().find(|id| !visited.contains(id)) {
            return Err(TopologyError::Unreachable(*unreachable));
        }

        let index = ordered
            .iter()
            .enumerate()
            .map(|(i, channel)| (channel.id, i))
            .collect();

        Ok(Self {
            root: Some(root),
            channels: ordered,
            index,
            parents,
        })
    }

    /// Network without channels
    pub fn empty() -> Self {
        Self {
            root: None,
            channels: Vec::new(),
            index: HashMap::new(),
            parents: HashMap::new(),
        }
    }

    /// Root channel id
    pub fn root(&self) -> Option<ChannelId> {
        self.root
    }

    /// Number of channels
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Whether the tree has no channels
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Look up a channel
    pub fn get(&self, id: ChannelId) -> Option<&Channel> {
        self.index.get(&id).map(|&i| &self.channels[i])
    }

    /// Whether the tree contains a channel
    pub fn contains(&self, id: ChannelId) -> bool {
        self.index.contains_key(&id)
    }

    /// Parent of a channel (`None` for the root and unknown ids)
    pub fn parent(&self, id: ChannelId) -> Option<ChannelId> {
        self.parents.get(&id).copied()
    }

    /// Children of a channel in their stored order
    pub fn children(&self, id: ChannelId) -> &[ChannelId] {
        self.get(id).map(|c| c.children.as_slice()).unwrap_or(&[])
    }

    /// All channels in top-down (pre-order) order
    pub fn channels(&self) -> impl Iterator<Item = &Channel> + '_ {
        self.channels.iter()
    }

    /// All channel ids in top-down order
    pub fn ids(&self) -> impl Iterator<Item = ChannelId> + '_ {
        self.channels.iter().map(|c| c.id)
    }

    /// Visit every channel top-down, parents before children
    pub fn visit_top_down(&self, mut visitor: impl FnMut(&Channel)) {
        for channel in &self.channels {
            visitor(channel);
        }
    }

    /// Visit every channel bottom-up, children before parents (post-order)
    pub fn visit_bottom_up(&self, mut visitor: impl FnMut(&Channel)) {
        // (id, children already expanded)
        let mut stack: Vec<(ChannelId, bool)> =
            self.root.map(|root| (root, false)).into_iter().collect();
        while let Some((id, expanded)) = stack.pop() {
            let Some(channel) = self.get(id) else {
                continue;
            };
            if expanded {
                visitor(channel);
            } else {
                stack.push((id, true));
                stack.extend(channel.children.iter().rev().map(|&child| (child, false)));
            }
        }
    }

    /// Strict ancestors of a channel, nearest first, ending at the root
    pub fn ancestors(&self, id: ChannelId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            current: self.parent(id),
        }
    }

    /// Depth of a channel (root is 0)
    pub fn depth(&self, id: ChannelId) -> usize {
        self.ancestors(id).count()
    }
}

/// Iterator over the root-ward path of a channel
pub struct Ancestors<'a> {
    tree: &'a ChannelTree,
    current: Option<ChannelId>,
}

impl Iterator for Ancestors<'_> {
    type Item = ChannelId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        self.current = self.tree.parent(id);
        Some(id)
    }
}

/// Flat, serializable form of a channel tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeRecord {
    /// Channels with their points, in top-down order
    pub channels: Vec<ChannelRecord>,
    /// (parent, child) edges in child order
    pub edges: Vec<(ChannelId, ChannelId)>,
}

/// Serialized channel without topology
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelRecord {
    pub id: ChannelId,
    pub points: Vec<ChannelPoint>,
}

impl From<ChannelTree> for TreeRecord {
    fn from(tree: ChannelTree) -> Self {
        let mut edges = Vec::with_capacity(tree.len().saturating_sub(1));
        let channels = tree
            .channels
            .into_iter()
            .map(|channel| {
                edges.extend(channel.children.iter().map(|&child| (channel.id, child)));
                ChannelRecord {
                    id: channel.id,
                    points: channel.points,
                }
            })
            .collect();
        Self { channels, edges }
    }
}

impl TryFrom<TreeRecord> for ChannelTree {
    type Error = TopologyError;

    fn try_from(record: TreeRecord) -> Result<Self, Self::Error> {
        let mut channels: Vec<Channel> = Vec::with_capacity(record.channels.len());
        let mut position: HashMap<ChannelId, usize> = HashMap::with_capacity(record.channels.len());
        for entry in record.channels {
            if position.insert(entry.id, channels.len()).is_some() {
                return Err(TopologyError::DuplicateChannel(entry.id));
            }
            channels.push(Channel {
                id: entry.id,
                points: entry.points,
                children: Vec::new(),
            });
        }
        for (parent, child) in record.edges {
            if !position.contains_key(&child) {
                return Err(TopologyError::UnknownChild { parent, child });
            }
            let &i = position
                .get(&parent)
                .ok_or(TopologyError::UnknownChannel(parent))?;
            channels[i].children.push(child);
        }
        ChannelTree::new(channels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// R(1) -> A(2), B(3); A -> C(4), D(5)
    fn sample_tree() -> ChannelTree {
        ChannelTree::new(vec![
            Channel::new(4).with_points([(5, 5)]),
            Channel::new(1).with_points([(0, 0), (1, 0)]).with_child(2).with_child(3),
            Channel::new(2).with_points([(2, 0)]).with_child(4).with_child(5),
            Channel::new(3).with_points([(0, 2)]),
            Channel::new(5),
        ])
        .unwrap()
    }

    #[test]
    fn test_root_detection_and_order() {
        let tree = sample_tree();
        assert_eq!(tree.root(), Some(ChannelId(1)));
        let order: Vec<i64> = tree.ids().map(|id| id.0).collect();
        assert_eq!(order, vec![1, 2, 4, 5, 3]);
    }

    #[test]
    fn test_parent_lookup() {
        let tree = sample_tree();
        assert_eq!(tree.parent(ChannelId(1)), None);
        assert_eq!(tree.parent(ChannelId(4)), Some(ChannelId(2)));
        assert_eq!(tree.parent(ChannelId(3)), Some(ChannelId(1)));
        assert_eq!(tree.children(ChannelId(2)), &[ChannelId(4), ChannelId(5)]);
    }

    #[test]
    fn test_bottom_up_visits_children_first() {
        let tree = sample_tree();
        let mut order = Vec::new();
        tree.visit_bottom_up(|c| order.push(c.id.0));
        assert_eq!(order, vec![4, 5, 2, 3, 1]);
    }

    #[test]
    fn test_ancestors_and_depth() {
        let tree = sample_tree();
        let path: Vec<i64> = tree.ancestors(ChannelId(5)).map(|id| id.0).collect();
        assert_eq!(path, vec![2, 1]);
        assert_eq!(tree.depth(ChannelId(1)), 0);
        assert_eq!(tree.depth(ChannelId(4)), 2);
    }

    #[test]
    fn test_rejects_multiple_parents() {
        let err = ChannelTree::new(vec![
            Channel::new(1).with_child(2).with_child(3),
            Channel::new(2).with_child(3),
            Channel::new(3),
        ])
        .unwrap_err();
        assert!(matches!(err, TopologyError::MultipleParents { child, .. } if child == ChannelId(3)));
    }

    #[test]
    fn test_rejects_cycle_as_unreachable() {
        let err = ChannelTree::new(vec![
            Channel::new(1),
            Channel::new(2).with_child(3),
            Channel::new(3).with_child(2),
        ])
        .unwrap_err();
        assert_eq!(err, TopologyError::Unreachable(ChannelId(2)));
    }

    #[test]
    fn test_empty_network_is_valid() {
        let tree = ChannelTree::new(Vec::new()).unwrap();
        assert!(tree.is_empty());
        assert_eq!(tree.root(), None);
        let mut visited = 0;
        tree.visit_bottom_up(|_| visited += 1);
        assert_eq!(visited, 0);

        let json = serde_json::to_string(&tree).unwrap();
        let restored: ChannelTree = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, tree);
    }

    #[test]
    fn test_rejects_missing_root() {
        let err = ChannelTree::new(vec![
            Channel::new(1).with_child(2),
            Channel::new(2).with_child(1),
        ])
        .unwrap_err();
        assert_eq!(err, TopologyError::NoRoot);
    }

    #[test]
    fn test_rejects_forest() {
        let err = ChannelTree::new(vec![Channel::new(1), Channel::new(2)]).unwrap_err();
        assert_eq!(
            err,
            TopologyError::MultipleRoots(vec![ChannelId(1), ChannelId(2)])
        );
    }

    #[test]
    fn test_rejects_unknown_child() {
        let err = ChannelTree::new(vec![Channel::new(1).with_child(9)]).unwrap_err();
        assert!(matches!(err, TopologyError::UnknownChild { .. }));
    }

    #[test]
    fn test_json_round_trip() {
        let tree = sample_tree();
        let json = serde_json::to_string(&tree).unwrap();
        let restored: ChannelTree = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, tree);
    }

    #[test]
    fn test_deep_tree_does_not_recurse() {
        let depth = 50_000;
        let channels: Vec<Channel> = (0..depth)
            .map(|i| {
                let channel = Channel::new(i).with_points([(0, 0)]);
                if i + 1 < depth {
                    channel.with_child(i + 1)
                } else {
                    channel
                }
            })
            .collect();
        let tree = ChannelTree::new(channels).unwrap();
        assert_eq!(tree.depth(ChannelId(depth - 1)), (depth - 1) as usize);
        let mut count = 0;
        tree.visit_bottom_up(|_| count += 1);
        assert_eq!(count, depth as usize);
    }
}
