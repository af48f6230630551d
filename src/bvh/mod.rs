mod dispatch;
mod leaf;
mod node_intersection;
mod ray_packet;

pub use dispatch::{
    AlignedFast, AlignedOrientedFast, AlignedRobust, MotionFast, MotionOrientedFast, MotionRobust,
    MotionWindowFast, MotionWindowOrientedFast, MotionWindowRobust, NodeIntersector,
};
pub use leaf::{LeafIntersector, LeafPrimitive, leaf_items};
pub use node_intersection::{
    ChildHit, intersect_aligned, intersect_aligned_robust, intersect_motion,
    intersect_motion_robust, intersect_motion_window, intersect_motion_window_robust,
    intersect_oriented, intersect_oriented_motion, time_window_mask,
};
pub use ray_packet::{PACKET_LANES, RayPacket8};

use assert2::debug_assert;
use index_vec::IndexVec;

use crate::geometry::{AffineFrame, FloatType, WorldBox, WorldPoint};

/// Children per inner node. Bounds of aligned kinds are stored as
/// structure-of-arrays columns of this width so one child's plane broadcasts
/// across a ray packet with a single splat.
pub const NODE_CHILDREN: usize = 8;

/// Inner node with static axis-aligned child bounds.
///
/// Unused slots keep inverted bounds and a null child link; traversal skips
/// null links before testing, so the slab test result for such slots is
/// unspecified.
#[derive(Clone, Debug)]
pub struct AlignedNode {
    pub lower_x: [FloatType; NODE_CHILDREN],
    pub lower_y: [FloatType; NODE_CHILDREN],
    pub lower_z: [FloatType; NODE_CHILDREN],
    pub upper_x: [FloatType; NODE_CHILDREN],
    pub upper_y: [FloatType; NODE_CHILDREN],
    pub upper_z: [FloatType; NODE_CHILDREN],
    pub children: [NodeRef; NODE_CHILDREN],
}

impl Default for AlignedNode {
    fn default() -> Self {
        AlignedNode {
            lower_x: [FloatType::INFINITY; NODE_CHILDREN],
            lower_y: [FloatType::INFINITY; NODE_CHILDREN],
            lower_z: [FloatType::INFINITY; NODE_CHILDREN],
            upper_x: [FloatType::NEG_INFINITY; NODE_CHILDREN],
            upper_y: [FloatType::NEG_INFINITY; NODE_CHILDREN],
            upper_z: [FloatType::NEG_INFINITY; NODE_CHILDREN],
            children: [NodeRef::NULL; NODE_CHILDREN],
        }
    }
}

impl AlignedNode {
    pub fn set_child(&mut self, i: usize, bounds: &WorldBox, child: NodeRef) {
        self.lower_x[i] = bounds.min.x;
        self.lower_y[i] = bounds.min.y;
        self.lower_z[i] = bounds.min.z;
        self.upper_x[i] = bounds.max.x;
        self.upper_y[i] = bounds.max.y;
        self.upper_z[i] = bounds.max.z;
        self.children[i] = child;
    }

    pub fn child_bounds(&self, i: usize) -> WorldBox {
        WorldBox::new(
            WorldPoint::new(self.lower_x[i], self.lower_y[i], self.lower_z[i]),
            WorldPoint::new(self.upper_x[i], self.upper_y[i], self.upper_z[i]),
        )
    }
}

/// Inner node whose child bounds move linearly over the shutter interval.
/// The bound at time t is `bound + t * delta`, with t=0 and t=1 bracketing
/// the motion.
#[derive(Clone, Debug)]
pub struct MotionNode {
    pub lower_x: [FloatType; NODE_CHILDREN],
    pub lower_y: [FloatType; NODE_CHILDREN],
    pub lower_z: [FloatType; NODE_CHILDREN],
    pub upper_x: [FloatType; NODE_CHILDREN],
    pub upper_y: [FloatType; NODE_CHILDREN],
    pub upper_z: [FloatType; NODE_CHILDREN],
    pub lower_dx: [FloatType; NODE_CHILDREN],
    pub lower_dy: [FloatType; NODE_CHILDREN],
    pub lower_dz: [FloatType; NODE_CHILDREN],
    pub upper_dx: [FloatType; NODE_CHILDREN],
    pub upper_dy: [FloatType; NODE_CHILDREN],
    pub upper_dz: [FloatType; NODE_CHILDREN],
    pub children: [NodeRef; NODE_CHILDREN],
}

impl Default for MotionNode {
    fn default() -> Self {
        MotionNode {
            lower_x: [FloatType::INFINITY; NODE_CHILDREN],
            lower_y: [FloatType::INFINITY; NODE_CHILDREN],
            lower_z: [FloatType::INFINITY; NODE_CHILDREN],
            upper_x: [FloatType::NEG_INFINITY; NODE_CHILDREN],
            upper_y: [FloatType::NEG_INFINITY; NODE_CHILDREN],
            upper_z: [FloatType::NEG_INFINITY; NODE_CHILDREN],
            lower_dx: [0.0; NODE_CHILDREN],
            lower_dy: [0.0; NODE_CHILDREN],
            lower_dz: [0.0; NODE_CHILDREN],
            upper_dx: [0.0; NODE_CHILDREN],
            upper_dy: [0.0; NODE_CHILDREN],
            upper_dz: [0.0; NODE_CHILDREN],
            children: [NodeRef::NULL; NODE_CHILDREN],
        }
    }
}

impl MotionNode {
    /// Sets a child from its bounds at shutter start and end; the deltas are
    /// stored so that `bounds_end = bounds_start + delta`.
    pub fn set_child(
        &mut self,
        i: usize,
        bounds_start: &WorldBox,
        bounds_end: &WorldBox,
        child: NodeRef,
    ) {
        self.lower_x[i] = bounds_start.min.x;
        self.lower_y[i] = bounds_start.min.y;
        self.lower_z[i] = bounds_start.min.z;
        self.upper_x[i] = bounds_start.max.x;
        self.upper_y[i] = bounds_start.max.y;
        self.upper_z[i] = bounds_start.max.z;
        self.lower_dx[i] = bounds_end.min.x - bounds_start.min.x;
        self.lower_dy[i] = bounds_end.min.y - bounds_start.min.y;
        self.lower_dz[i] = bounds_end.min.z - bounds_start.min.z;
        self.upper_dx[i] = bounds_end.max.x - bounds_start.max.x;
        self.upper_dy[i] = bounds_end.max.y - bounds_start.max.y;
        self.upper_dz[i] = bounds_end.max.z - bounds_start.max.z;
        self.children[i] = child;
    }

    /// Scalar evaluation of one child's bounds at a given time.
    pub fn child_bounds_at(&self, i: usize, time: FloatType) -> WorldBox {
        WorldBox::new(
            WorldPoint::new(
                time.mul_add(self.lower_dx[i], self.lower_x[i]),
                time.mul_add(self.lower_dy[i], self.lower_y[i]),
                time.mul_add(self.lower_dz[i], self.lower_z[i]),
            ),
            WorldPoint::new(
                time.mul_add(self.upper_dx[i], self.upper_x[i]),
                time.mul_add(self.upper_dy[i], self.upper_y[i]),
                time.mul_add(self.upper_dz[i], self.upper_z[i]),
            ),
        )
    }
}

/// Motion node whose children are additionally valid only inside a half-open
/// time window, for trees that split along the time axis as well as space.
#[derive(Clone, Debug)]
pub struct TimedMotionNode {
    pub spatial: MotionNode,
    pub lower_t: [FloatType; NODE_CHILDREN],
    pub upper_t: [FloatType; NODE_CHILDREN],
}

impl Default for TimedMotionNode {
    fn default() -> Self {
        TimedMotionNode {
            spatial: MotionNode::default(),
            lower_t: [FloatType::INFINITY; NODE_CHILDREN],
            upper_t: [FloatType::NEG_INFINITY; NODE_CHILDREN],
        }
    }
}

impl TimedMotionNode {
    pub fn set_child(
        &mut self,
        i: usize,
        bounds_start: &WorldBox,
        bounds_end: &WorldBox,
        window: std::ops::Range<FloatType>,
        child: NodeRef,
    ) {
        self.spatial.set_child(i, bounds_start, bounds_end, child);
        self.lower_t[i] = window.start;
        self.upper_t[i] = window.end;
    }
}

/// Inner node whose child regions are unit cubes of per-child local frames,
/// fitting elongated or skewed geometry much tighter than an aligned box.
#[derive(Clone, Debug)]
pub struct OrientedNode {
    pub frames: [AffineFrame; NODE_CHILDREN],
    pub children: [NodeRef; NODE_CHILDREN],
}

impl Default for OrientedNode {
    fn default() -> Self {
        OrientedNode {
            frames: [AffineFrame::identity(); NODE_CHILDREN],
            children: [NodeRef::NULL; NODE_CHILDREN],
        }
    }
}

impl OrientedNode {
    pub fn set_child(&mut self, i: usize, frame: AffineFrame, child: NodeRef) {
        self.frames[i] = frame;
        self.children[i] = child;
    }
}

/// Oriented node under motion blur: the local box slides from the unit cube
/// at shutter start to `end_bounds` at shutter end.
#[derive(Clone, Debug)]
pub struct OrientedMotionNode {
    pub frames: [AffineFrame; NODE_CHILDREN],
    pub end_bounds: [WorldBox; NODE_CHILDREN],
    pub children: [NodeRef; NODE_CHILDREN],
}

impl Default for OrientedMotionNode {
    fn default() -> Self {
        OrientedMotionNode {
            frames: [AffineFrame::identity(); NODE_CHILDREN],
            end_bounds: std::array::from_fn(|_| {
                WorldBox::new(WorldPoint::origin(), WorldPoint::new(1.0, 1.0, 1.0))
            }),
            children: [NodeRef::NULL; NODE_CHILDREN],
        }
    }
}

impl OrientedMotionNode {
    pub fn set_child(
        &mut self,
        i: usize,
        frame: AffineFrame,
        end_bounds: &WorldBox,
        child: NodeRef,
    ) {
        self.frames[i] = frame;
        self.end_bounds[i] = end_bounds.clone();
        self.children[i] = child;
    }
}

/// Packed reference to a node: a 3-bit kind tag in the low bits plus an
/// index into the owning pool's arena for that kind. One pointer-sized value
/// carries both where the node lives and how to interpret it.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct NodeRef(u32);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeLink {
    Null,
    Leaf { index: LeafIdx },
    Aligned { index: AlignedNodeIdx },
    Motion { index: MotionNodeIdx },
    TimedMotion { index: TimedMotionNodeIdx },
    Oriented { index: OrientedNodeIdx },
    OrientedMotion { index: OrientedMotionNodeIdx },
}

impl NodeRef {
    const KIND_BITS: u32 = 3;
    const KIND_MASK: u32 = (1 << Self::KIND_BITS) - 1;

    const KIND_NULL: u32 = 0;
    const KIND_LEAF: u32 = 1;
    const KIND_ALIGNED: u32 = 2;
    const KIND_MOTION: u32 = 3;
    const KIND_TIMED_MOTION: u32 = 4;
    const KIND_ORIENTED: u32 = 5;
    const KIND_ORIENTED_MOTION: u32 = 6;

    pub const MAX_INDEX: u32 = (u32::MAX >> Self::KIND_BITS) - 1;

    pub const NULL: Self = Self(Self::KIND_NULL);

    fn new(kind: u32, index: u32) -> Self {
        assert!(index <= Self::MAX_INDEX);
        Self(index << Self::KIND_BITS | kind)
    }

    pub fn new_leaf(index: LeafIdx) -> Self {
        Self::new(Self::KIND_LEAF, index.raw())
    }

    pub fn new_aligned(index: AlignedNodeIdx) -> Self {
        Self::new(Self::KIND_ALIGNED, index.raw())
    }

    pub fn new_motion(index: MotionNodeIdx) -> Self {
        Self::new(Self::KIND_MOTION, index.raw())
    }

    pub fn new_timed_motion(index: TimedMotionNodeIdx) -> Self {
        Self::new(Self::KIND_TIMED_MOTION, index.raw())
    }

    pub fn new_oriented(index: OrientedNodeIdx) -> Self {
        Self::new(Self::KIND_ORIENTED, index.raw())
    }

    pub fn new_oriented_motion(index: OrientedMotionNodeIdx) -> Self {
        Self::new(Self::KIND_ORIENTED_MOTION, index.raw())
    }

    #[inline(always)]
    fn kind(&self) -> u32 {
        self.0 & Self::KIND_MASK
    }

    #[inline(always)]
    fn index(&self) -> u32 {
        self.0 >> Self::KIND_BITS
    }

    pub fn decode(&self) -> NodeLink {
        let index = self.index();
        match self.kind() {
            Self::KIND_NULL => NodeLink::Null,
            Self::KIND_LEAF => NodeLink::Leaf {
                index: LeafIdx::from_raw_unchecked(index),
            },
            Self::KIND_ALIGNED => NodeLink::Aligned {
                index: AlignedNodeIdx::from_raw_unchecked(index),
            },
            Self::KIND_MOTION => NodeLink::Motion {
                index: MotionNodeIdx::from_raw_unchecked(index),
            },
            Self::KIND_TIMED_MOTION => NodeLink::TimedMotion {
                index: TimedMotionNodeIdx::from_raw_unchecked(index),
            },
            Self::KIND_ORIENTED => NodeLink::Oriented {
                index: OrientedNodeIdx::from_raw_unchecked(index),
            },
            Self::KIND_ORIENTED_MOTION => NodeLink::OrientedMotion {
                index: OrientedMotionNodeIdx::from_raw_unchecked(index),
            },
            _ => unreachable!("corrupt node reference"),
        }
    }

    #[inline(always)]
    pub fn is_null(&self) -> bool {
        self.kind() == Self::KIND_NULL
    }

    #[inline(always)]
    pub fn is_leaf(&self) -> bool {
        self.kind() == Self::KIND_LEAF
    }

    #[inline(always)]
    pub fn is_aligned(&self) -> bool {
        self.kind() == Self::KIND_ALIGNED
    }

    #[inline(always)]
    pub fn is_motion(&self) -> bool {
        self.kind() == Self::KIND_MOTION
    }

    #[inline(always)]
    pub fn is_timed_motion(&self) -> bool {
        self.kind() == Self::KIND_TIMED_MOTION
    }

    /// Linear motion with or without a time window.
    #[inline(always)]
    pub fn is_motion_kind(&self) -> bool {
        matches!(self.kind(), Self::KIND_MOTION | Self::KIND_TIMED_MOTION)
    }

    #[inline(always)]
    pub fn is_oriented(&self) -> bool {
        self.kind() == Self::KIND_ORIENTED
    }

    #[inline(always)]
    pub fn is_oriented_motion(&self) -> bool {
        self.kind() == Self::KIND_ORIENTED_MOTION
    }
}

impl Default for NodeRef {
    fn default() -> Self {
        Self::NULL
    }
}

impl std::fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRef")
            .field("0", &self.0)
            .field("<decoded>", &self.decode())
            .finish()
    }
}

index_vec::define_index_type! {
    pub struct AlignedNodeIdx = u32;
    MAX_INDEX = NodeRef::MAX_INDEX as usize;
    IMPL_RAW_CONVERSIONS = true;
}

index_vec::define_index_type! {
    pub struct MotionNodeIdx = u32;
    MAX_INDEX = NodeRef::MAX_INDEX as usize;
    IMPL_RAW_CONVERSIONS = true;
}

index_vec::define_index_type! {
    pub struct TimedMotionNodeIdx = u32;
    MAX_INDEX = NodeRef::MAX_INDEX as usize;
    IMPL_RAW_CONVERSIONS = true;
}

index_vec::define_index_type! {
    pub struct OrientedNodeIdx = u32;
    MAX_INDEX = NodeRef::MAX_INDEX as usize;
    IMPL_RAW_CONVERSIONS = true;
}

index_vec::define_index_type! {
    pub struct OrientedMotionNodeIdx = u32;
    MAX_INDEX = NodeRef::MAX_INDEX as usize;
    IMPL_RAW_CONVERSIONS = true;
}

index_vec::define_index_type! {
    pub struct LeafIdx = u32;
    MAX_INDEX = NodeRef::MAX_INDEX as usize;
    IMPL_RAW_CONVERSIONS = true;
}

/// Arena owning every node of a tree, one store per node kind. Filled by the
/// build stage, immutable during traversal; the intersection primitives only
/// ever read from it.
#[derive(Clone, Debug, Default)]
pub struct NodePool {
    aligned: IndexVec<AlignedNodeIdx, AlignedNode>,
    motion: IndexVec<MotionNodeIdx, MotionNode>,
    timed_motion: IndexVec<TimedMotionNodeIdx, TimedMotionNode>,
    oriented: IndexVec<OrientedNodeIdx, OrientedNode>,
    oriented_motion: IndexVec<OrientedMotionNodeIdx, OrientedMotionNode>,
}

impl NodePool {
    pub fn push_aligned(&mut self, node: AlignedNode) -> NodeRef {
        NodeRef::new_aligned(self.aligned.push(node))
    }

    pub fn push_motion(&mut self, node: MotionNode) -> NodeRef {
        NodeRef::new_motion(self.motion.push(node))
    }

    pub fn push_timed_motion(&mut self, node: TimedMotionNode) -> NodeRef {
        NodeRef::new_timed_motion(self.timed_motion.push(node))
    }

    pub fn push_oriented(&mut self, node: OrientedNode) -> NodeRef {
        NodeRef::new_oriented(self.oriented.push(node))
    }

    pub fn push_oriented_motion(&mut self, node: OrientedMotionNode) -> NodeRef {
        NodeRef::new_oriented_motion(self.oriented_motion.push(node))
    }

    /// Resolves a reference known to hold an aligned node.
    #[inline(always)]
    pub fn aligned_node(&self, r: NodeRef) -> &AlignedNode {
        debug_assert!(r.is_aligned(), "{r:?}");
        &self.aligned[AlignedNodeIdx::from_raw(r.index())]
    }

    #[inline(always)]
    pub fn motion_node(&self, r: NodeRef) -> &MotionNode {
        debug_assert!(r.is_motion(), "{r:?}");
        &self.motion[MotionNodeIdx::from_raw(r.index())]
    }

    #[inline(always)]
    pub fn timed_motion_node(&self, r: NodeRef) -> &TimedMotionNode {
        debug_assert!(r.is_timed_motion(), "{r:?}");
        &self.timed_motion[TimedMotionNodeIdx::from_raw(r.index())]
    }

    #[inline(always)]
    pub fn oriented_node(&self, r: NodeRef) -> &OrientedNode {
        debug_assert!(r.is_oriented(), "{r:?}");
        &self.oriented[OrientedNodeIdx::from_raw(r.index())]
    }

    #[inline(always)]
    pub fn oriented_motion_node(&self, r: NodeRef) -> &OrientedMotionNode {
        debug_assert!(r.is_oriented_motion(), "{r:?}");
        &self.oriented_motion[OrientedMotionNodeIdx::from_raw(r.index())]
    }
}
