use super::{ChildHit, NodePool, NodeRef, RayPacket8, node_intersection};
use crate::geometry::{SimdFloatType, SimdMaskType};

/// Per-tree-level strategy selecting the slab test for one child slot.
///
/// Each implementor is a zero-sized type; picking one per traversal
/// monomorphizes the hot call site, so the only runtime branch left is the
/// single node-tag check inside the mixed-kind strategies.
///
/// `parent_mask` is the hit mask the caller already holds for the node
/// itself. Strategies over time-windowed levels AND their spatial result
/// with it, because a motion-blurred child can be invalid for lanes whose
/// parent bound passed (lanes carry different times). All other strategies
/// ignore the parameter and return a freshly computed mask.
pub trait NodeIntersector {
    fn intersect(
        pool: &NodePool,
        node: NodeRef,
        child: usize,
        ray: &RayPacket8,
        tnear: SimdFloatType,
        tfar: SimdFloatType,
        parent_mask: SimdMaskType,
    ) -> ChildHit;
}

/// Levels holding only static aligned nodes, fast arithmetic.
pub struct AlignedFast;

impl NodeIntersector for AlignedFast {
    #[inline(always)]
    fn intersect(
        pool: &NodePool,
        node: NodeRef,
        child: usize,
        ray: &RayPacket8,
        tnear: SimdFloatType,
        tfar: SimdFloatType,
        _parent_mask: SimdMaskType,
    ) -> ChildHit {
        node_intersection::intersect_aligned(pool.aligned_node(node), child, ray, tnear, tfar)
    }
}

/// Levels holding only static aligned nodes, robust arithmetic.
pub struct AlignedRobust;

impl NodeIntersector for AlignedRobust {
    #[inline(always)]
    fn intersect(
        pool: &NodePool,
        node: NodeRef,
        child: usize,
        ray: &RayPacket8,
        tnear: SimdFloatType,
        tfar: SimdFloatType,
        _parent_mask: SimdMaskType,
    ) -> ChildHit {
        node_intersection::intersect_aligned_robust(
            pool.aligned_node(node),
            child,
            ray,
            tnear,
            tfar,
        )
    }
}

/// Levels holding only linear motion nodes, fast arithmetic.
pub struct MotionFast;

impl NodeIntersector for MotionFast {
    #[inline(always)]
    fn intersect(
        pool: &NodePool,
        node: NodeRef,
        child: usize,
        ray: &RayPacket8,
        tnear: SimdFloatType,
        tfar: SimdFloatType,
        _parent_mask: SimdMaskType,
    ) -> ChildHit {
        node_intersection::intersect_motion(pool.motion_node(node), child, ray, tnear, tfar)
    }
}

/// Levels holding only linear motion nodes, robust arithmetic.
pub struct MotionRobust;

impl NodeIntersector for MotionRobust {
    #[inline(always)]
    fn intersect(
        pool: &NodePool,
        node: NodeRef,
        child: usize,
        ray: &RayPacket8,
        tnear: SimdFloatType,
        tfar: SimdFloatType,
        _parent_mask: SimdMaskType,
    ) -> ChildHit {
        node_intersection::intersect_motion_robust(pool.motion_node(node), child, ray, tnear, tfar)
    }
}

/// Levels mixing static aligned and oriented nodes; aligned nodes dominate
/// such trees, oriented ones are the exception.
pub struct AlignedOrientedFast;

impl NodeIntersector for AlignedOrientedFast {
    #[inline(always)]
    fn intersect(
        pool: &NodePool,
        node: NodeRef,
        child: usize,
        ray: &RayPacket8,
        tnear: SimdFloatType,
        tfar: SimdFloatType,
        _parent_mask: SimdMaskType,
    ) -> ChildHit {
        if node.is_aligned() {
            node_intersection::intersect_aligned(pool.aligned_node(node), child, ray, tnear, tfar)
        } else {
            node_intersection::intersect_oriented(pool.oriented_node(node), child, ray, tnear, tfar)
        }
    }
}

/// Levels mixing linear motion and oriented motion nodes.
pub struct MotionOrientedFast;

impl NodeIntersector for MotionOrientedFast {
    #[inline(always)]
    fn intersect(
        pool: &NodePool,
        node: NodeRef,
        child: usize,
        ray: &RayPacket8,
        tnear: SimdFloatType,
        tfar: SimdFloatType,
        _parent_mask: SimdMaskType,
    ) -> ChildHit {
        if node.is_motion() {
            node_intersection::intersect_motion(pool.motion_node(node), child, ray, tnear, tfar)
        } else {
            node_intersection::intersect_oriented_motion(
                pool.oriented_motion_node(node),
                child,
                ray,
                tnear,
                tfar,
            )
        }
    }
}

/// Levels mixing plain and time-windowed motion nodes, fast arithmetic.
pub struct MotionWindowFast;

impl NodeIntersector for MotionWindowFast {
    #[inline(always)]
    fn intersect(
        pool: &NodePool,
        node: NodeRef,
        child: usize,
        ray: &RayPacket8,
        tnear: SimdFloatType,
        tfar: SimdFloatType,
        parent_mask: SimdMaskType,
    ) -> ChildHit {
        let hit = node_intersection::intersect_motion_window(pool, node, child, ray, tnear, tfar);
        ChildHit {
            mask: parent_mask & hit.mask,
            entry: hit.entry,
        }
    }
}

/// Levels mixing plain and time-windowed motion nodes, robust arithmetic.
pub struct MotionWindowRobust;

impl NodeIntersector for MotionWindowRobust {
    #[inline(always)]
    fn intersect(
        pool: &NodePool,
        node: NodeRef,
        child: usize,
        ray: &RayPacket8,
        tnear: SimdFloatType,
        tfar: SimdFloatType,
        parent_mask: SimdMaskType,
    ) -> ChildHit {
        let hit =
            node_intersection::intersect_motion_window_robust(pool, node, child, ray, tnear, tfar);
        ChildHit {
            mask: parent_mask & hit.mask,
            entry: hit.entry,
        }
    }
}

/// Levels mixing motion, time-windowed motion and oriented motion nodes.
pub struct MotionWindowOrientedFast;

impl NodeIntersector for MotionWindowOrientedFast {
    #[inline(always)]
    fn intersect(
        pool: &NodePool,
        node: NodeRef,
        child: usize,
        ray: &RayPacket8,
        tnear: SimdFloatType,
        tfar: SimdFloatType,
        parent_mask: SimdMaskType,
    ) -> ChildHit {
        let hit = if node.is_motion_kind() {
            node_intersection::intersect_motion_window(pool, node, child, ray, tnear, tfar)
        } else {
            node_intersection::intersect_oriented_motion(
                pool.oriented_motion_node(node),
                child,
                ray,
                tnear,
                tfar,
            )
        };
        ChildHit {
            mask: parent_mask & hit.mask,
            entry: hit.entry,
        }
    }
}
