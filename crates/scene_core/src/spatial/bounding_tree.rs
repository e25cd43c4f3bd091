//! Bounding volume tree
//!
//! Binary AABB tree built in one shot from a snapshot of `(bounds, payload)`
//! leaves. Each split picks the axis with the greatest extent and divides
//! payloads at the centre of the node's bounds. The tree is immutable once
//! built; rebuilds produce a new tree that replaces the old one wholesale,
//! typically behind a [`SharedBoundingTree`].
//!
//! Nodes live in a flat arena (root at index 0) and the builder works from an
//! explicit stack, so neither construction nor queries recurse.

use std::sync::Arc;

use log::{debug, warn};

use super::aabb::{SplitAxis, AABB};
use super::frustum::Frustum;
use crate::config::BoundingTreeConfig;
use crate::foundation::math::Vec3;

/// Reference-counted tree handle for copy-on-write swaps
///
/// Readers keep querying the tree they cloned while a rebuild installs a new one.
pub type SharedBoundingTree<P> = Arc<BoundingVolumeTree<P>>;

/// Single node in the bounding volume tree
#[derive(Debug, Clone, PartialEq)]
pub struct AABBNode {
    /// Bounds enclosing every payload below this node
    pub bounds: AABB,

    /// Indices into the tree's leaf entries (non-empty only at leaves)
    pub payloads: Vec<usize>,

    /// Axis this node was split along (meaningful only for internal nodes)
    pub split_axis: SplitAxis,

    /// Depth in the tree (0 = root)
    pub depth: u32,

    /// Arena indices of child A and child B, None if this is a leaf
    pub children: Option<[usize; 2]>,
}

impl AABBNode {
    fn leaf(bounds: AABB, payloads: Vec<usize>, depth: u32) -> Self {
        Self {
            bounds,
            payloads,
            split_axis: SplitAxis::default(),
            depth,
            children: None,
        }
    }

    /// Check if this node is a leaf (has no children)
    pub const fn is_leaf(&self) -> bool {
        self.children.is_none()
    }
}

/// Immutable binary AABB tree over opaque payloads
#[derive(Debug, Clone)]
pub struct BoundingVolumeTree<P> {
    entries: Vec<(AABB, P)>,
    nodes: Vec<AABBNode>,
    max_depth: u32,
}

impl<P> Default for BoundingVolumeTree<P> {
    fn default() -> Self {
        Self::empty(BoundingTreeConfig::default().max_depth)
    }
}

impl<P> BoundingVolumeTree<P> {
    /// Tree with no payloads: a single empty-bounds leaf
    pub fn empty(max_depth: u32) -> Self {
        Self {
            entries: Vec::new(),
            nodes: vec![AABBNode::leaf(AABB::EMPTY, Vec::new(), 0)],
            max_depth,
        }
    }

    /// Build a tree using the configured maximum depth
    pub fn build(
        leaves: impl IntoIterator<Item = (AABB, P)>,
        config: &BoundingTreeConfig,
    ) -> Self {
        Self::build_with_max_depth(leaves, config.max_depth)
    }

    /// Build a tree whose leaves are at most `max_depth` below the root
    ///
    /// A node stops splitting once it reaches `max_depth` or holds at most
    /// one payload. When every payload lands on the same side of a split the
    /// tree is left unbalanced; depth still bounds it.
    pub fn build_with_max_depth(
        leaves: impl IntoIterator<Item = (AABB, P)>,
        max_depth: u32,
    ) -> Self {
        let entries: Vec<(AABB, P)> = leaves.into_iter().collect();
        if entries.is_empty() {
            warn!("EmptyBoundsWarning: bounding volume tree built from zero leaves");
            return Self::empty(max_depth);
        }

        let root_bounds: AABB = entries.iter().map(|(bounds, _)| *bounds).collect();
        let mut nodes = vec![AABBNode::leaf(root_bounds, (0..entries.len()).collect(), 0)];
        let mut work = vec![0_usize];

        while let Some(index) = work.pop() {
            let (bounds, depth, count) = {
                let node = &nodes[index];
                (node.bounds, node.depth, node.payloads.len())
            };
            if depth >= max_depth || count <= 1 {
                continue;
            }

            let axis = bounds.longest_axis();
            let split_pos = bounds.axis_centre(axis);
            let payloads = std::mem::take(&mut nodes[index].payloads);
            let (below, above): (Vec<usize>, Vec<usize>) = payloads
                .into_iter()
                .partition(|&entry| entries[entry].0.axis_centre(axis) < split_pos);

            let child_bounds =
                |set: &[usize]| -> AABB { set.iter().map(|&entry| entries[entry].0).collect() };
            let child_a = nodes.len();
            nodes.push(AABBNode::leaf(child_bounds(&below), below, depth + 1));
            let child_b = nodes.len();
            nodes.push(AABBNode::leaf(child_bounds(&above), above, depth + 1));

            let node = &mut nodes[index];
            node.split_axis = axis;
            node.children = Some([child_a, child_b]);

            work.push(child_b);
            work.push(child_a);
        }

        let tree = Self {
            entries,
            nodes,
            max_depth,
        };
        debug!(
            "Built bounding volume tree: {} payloads, {} nodes, depth {}/{}",
            tree.len(),
            tree.nodes.len(),
            tree.depth(),
            max_depth
        );
        tree
    }

    /// Number of payloads
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the tree holds no payloads
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Configured maximum depth
    pub const fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Root node
    pub fn root(&self) -> &AABBNode {
        &self.nodes[0]
    }

    /// Bounds of the whole tree
    pub fn bounds(&self) -> AABB {
        self.root().bounds
    }

    /// All nodes, root first
    pub fn nodes(&self) -> &[AABBNode] {
        &self.nodes
    }

    /// Leaf nodes (for visualization)
    pub fn leaves(&self) -> impl Iterator<Item = &AABBNode> + '_ {
        self.nodes.iter().filter(|node| node.is_leaf())
    }

    /// Deepest leaf depth
    pub fn depth(&self) -> u32 {
        self.leaves().map(|node| node.depth).max().unwrap_or(0)
    }

    /// The `(bounds, payload)` snapshot the tree was built from, in input order
    pub fn entries(&self) -> &[(AABB, P)] {
        &self.entries
    }

    /// Payloads stored directly in `node`
    pub fn payloads_of<'a>(&'a self, node: &'a AABBNode) -> impl Iterator<Item = &'a P> + 'a {
        node.payloads.iter().map(move |&entry| &self.entries[entry].1)
    }

    /// Lazily yield every payload whose bounds intersect `region`
    pub fn query(&self, region: &AABB) -> Query<'_, P, impl Fn(&AABB) -> bool> {
        let region = *region;
        Query::new(self, move |bounds: &AABB| bounds.intersects(&region))
    }

    /// Lazily yield every payload whose bounds intersect `frustum`
    pub fn query_frustum(&self, frustum: &Frustum) -> Query<'_, P, impl Fn(&AABB) -> bool> {
        let frustum = *frustum;
        Query::new(self, move |bounds: &AABB| frustum.intersects_aabb(bounds))
    }

    /// Payloads hit by a ray, nearest entry distance first
    pub fn query_ray(&self, ray_origin: Vec3, ray_dir: Vec3) -> Vec<(f32, &P)> {
        let mut hits: Vec<(f32, &P)> = Query::new(self, |bounds: &AABB| {
            bounds.intersect_ray(ray_origin, ray_dir).is_some()
        })
        .with_bounds()
        .filter_map(|(bounds, payload)| {
            bounds
                .intersect_ray(ray_origin, ray_dir)
                .map(|distance| (distance, payload))
        })
        .collect();
        hits.sort_by(|a, b| a.0.total_cmp(&b.0));
        hits
    }
}

/// Lazy pruning traversal over a [`BoundingVolumeTree`]
///
/// Subtrees whose bounds fail the test are skipped; payloads in visited
/// leaves are tested individually, so results are exact for `test`.
pub struct Query<'a, P, F> {
    tree: &'a BoundingVolumeTree<P>,
    stack: Vec<usize>,
    pending: std::slice::Iter<'a, usize>,
    test: F,
}

impl<'a, P, F: Fn(&AABB) -> bool> Query<'a, P, F> {
    fn new(tree: &'a BoundingVolumeTree<P>, test: F) -> Self {
        let none: &'a [usize] = &[];
        Self {
            tree,
            stack: vec![0],
            pending: none.iter(),
            test,
        }
    }

    /// Yield `(bounds, payload)` pairs instead of bare payloads
    pub fn with_bounds(self) -> WithBounds<'a, P, F> {
        WithBounds { inner: self }
    }

    fn next_entry(&mut self) -> Option<&'a (AABB, P)> {
        let tree = self.tree;
        loop {
            if let Some(&entry) = self.pending.next() {
                let candidate = &tree.entries[entry];
                if (self.test)(&candidate.0) {
                    return Some(candidate);
                }
                continue;
            }

            let index = self.stack.pop()?;
            let node = &tree.nodes[index];
            if !(self.test)(&node.bounds) {
                continue;
            }
            match node.children {
                Some([child_a, child_b]) => {
                    self.stack.push(child_b);
                    self.stack.push(child_a);
                }
                None => self.pending = node.payloads.iter(),
            }
        }
    }
}

impl<'a, P, F: Fn(&AABB) -> bool> Iterator for Query<'a, P, F> {
    type Item = &'a P;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_entry().map(|(_, payload)| payload)
    }
}

/// [`Query`] adapter yielding payload bounds alongside payloads
pub struct WithBounds<'a, P, F> {
    inner: Query<'a, P, F>,
}

impl<'a, P, F: Fn(&AABB) -> bool> Iterator for WithBounds<'a, P, F> {
    type Item = (&'a AABB, &'a P);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next_entry()
            .map(|(bounds, payload)| (bounds, payload))
    }
}
