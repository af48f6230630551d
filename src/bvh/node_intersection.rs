use simba::simd::{SimdPartialOrd as _, SimdValue, WideF32x8};
use wide::{CmpLt as _, f32x8};

use super::{
    AlignedNode, MotionNode, NodePool, NodeRef, OrientedMotionNode, OrientedNode, RayPacket8,
    TimedMotionNode,
};
use crate::{
    geometry::{
        FloatType, MIN_RCP_INPUT, SimdFloatType, SimdMaskType, WorldBox8, WorldPoint8,
        WorldVector8,
    },
    util::simba::{SimbaWorkarounds as _, fast_max, fast_min, mul_add, mul_sub},
};

/// Result of testing one child slot against a ray packet, produced fresh on
/// every call.
#[derive(Clone, Debug)]
pub struct ChildHit {
    pub mask: SimdMaskType,
    /// Entry distance along each ray; only meaningful on lanes where the
    /// mask is set.
    pub entry: SimdFloatType,
}

#[inline(always)]
fn splat(v: FloatType) -> SimdFloatType {
    SimdFloatType::splat(v)
}

/// Clip NaNs can only appear when extreme coordinates overflow the clip
/// product. Blending them outward makes the axis never disqualify the lane
/// instead of poisoning the whole mask with misses.
#[inline(always)]
fn widen_nan(clip_low: WorldVector8, clip_high: WorldVector8) -> (WorldVector8, WorldVector8) {
    (
        clip_low.map(|x| SimdFloatType::neg_infinity().select(x.is_nan(), x)),
        clip_high.map(|x| SimdFloatType::infinity().select(x.is_nan(), x)),
    )
}

/// Slab distances ordered per axis and reduced over the three axes.
#[inline(always)]
fn near_far(clip_low: &WorldVector8, clip_high: &WorldVector8) -> (SimdFloatType, SimdFloatType) {
    let near = clip_low.zip_map(clip_high, fast_min);
    let far = clip_low.zip_map(clip_high, fast_max);
    (
        fast_max(near.x, fast_max(near.y, near.z)),
        fast_min(far.x, fast_min(far.y, far.z)),
    )
}

/// Fast slab test of one static aligned child against the packet.
///
/// Derives the clip distances as `bound * rdir - org * rdir` with a fused
/// multiply-subtract on the packet's precomputed product, trading one
/// subtraction per plane for rounding that assumes well-conditioned rays.
#[inline(always)]
pub fn intersect_aligned(
    node: &AlignedNode,
    i: usize,
    ray: &RayPacket8,
    tnear: SimdFloatType,
    tfar: SimdFloatType,
) -> ChildHit {
    let rdir = &ray.inv_direction;
    let org_rdir = &ray.origin_inv_direction;

    let clip_low = WorldVector8::new(
        mul_sub(splat(node.lower_x[i]), rdir.x, org_rdir.x),
        mul_sub(splat(node.lower_y[i]), rdir.y, org_rdir.y),
        mul_sub(splat(node.lower_z[i]), rdir.z, org_rdir.z),
    );
    let clip_high = WorldVector8::new(
        mul_sub(splat(node.upper_x[i]), rdir.x, org_rdir.x),
        mul_sub(splat(node.upper_y[i]), rdir.y, org_rdir.y),
        mul_sub(splat(node.upper_z[i]), rdir.z, org_rdir.z),
    );

    let (clip_low, clip_high) = widen_nan(clip_low, clip_high);
    let (near, far) = near_far(&clip_low, &clip_high);
    ChildHit {
        mask: fast_max(near, tnear).simd_le(fast_min(far, tfar)),
        entry: near,
    }
}

/// Robust slab test of one static aligned child.
///
/// Derives the clip distances un-fused as `(bound - org) * rdir` and widens
/// the final comparison by two units in the last place on both sides, so
/// accumulated rounding can never turn a real hit into a miss. The extra
/// false positives are discharged by the exact leaf test.
#[inline(always)]
pub fn intersect_aligned_robust(
    node: &AlignedNode,
    i: usize,
    ray: &RayPacket8,
    tnear: SimdFloatType,
    tfar: SimdFloatType,
) -> ChildHit {
    let org = &ray.origin.coords;
    let rdir = &ray.inv_direction;

    let lower = WorldVector8::new(
        splat(node.lower_x[i]),
        splat(node.lower_y[i]),
        splat(node.lower_z[i]),
    );
    let upper = WorldVector8::new(
        splat(node.upper_x[i]),
        splat(node.upper_y[i]),
        splat(node.upper_z[i]),
    );
    let clip_low = (lower - org).component_mul(rdir);
    let clip_high = (upper - org).component_mul(rdir);

    let (clip_low, clip_high) = widen_nan(clip_low, clip_high);
    let (near, far) = near_far(&clip_low, &clip_high);
    let round_down = splat(1.0 - 2.0 * FloatType::EPSILON);
    let round_up = splat(1.0 + 2.0 * FloatType::EPSILON);
    ChildHit {
        mask: (round_down * fast_max(near, tnear)).simd_le(round_up * fast_min(far, tfar)),
        entry: near,
    }
}

/// One child's bounds evaluated at each lane's own shutter time.
#[inline(always)]
fn motion_bounds(node: &MotionNode, i: usize, time: SimdFloatType) -> WorldBox8 {
    WorldBox8::new(
        WorldPoint8::new(
            mul_add(time, splat(node.lower_dx[i]), splat(node.lower_x[i])),
            mul_add(time, splat(node.lower_dy[i]), splat(node.lower_y[i])),
            mul_add(time, splat(node.lower_dz[i]), splat(node.lower_z[i])),
        ),
        WorldPoint8::new(
            mul_add(time, splat(node.upper_dx[i]), splat(node.upper_x[i])),
            mul_add(time, splat(node.upper_dy[i]), splat(node.upper_y[i])),
            mul_add(time, splat(node.upper_dz[i]), splat(node.upper_z[i])),
        ),
    )
}

/// Fast slab test of one linearly motion-blurred child.
#[inline(always)]
pub fn intersect_motion(
    node: &MotionNode,
    i: usize,
    ray: &RayPacket8,
    tnear: SimdFloatType,
    tfar: SimdFloatType,
) -> ChildHit {
    let bounds = motion_bounds(node, i, ray.time);
    let rdir = &ray.inv_direction;
    let org_rdir = &ray.origin_inv_direction;

    let clip_low = WorldVector8::new(
        mul_sub(bounds.min.x, rdir.x, org_rdir.x),
        mul_sub(bounds.min.y, rdir.y, org_rdir.y),
        mul_sub(bounds.min.z, rdir.z, org_rdir.z),
    );
    let clip_high = WorldVector8::new(
        mul_sub(bounds.max.x, rdir.x, org_rdir.x),
        mul_sub(bounds.max.y, rdir.y, org_rdir.y),
        mul_sub(bounds.max.z, rdir.z, org_rdir.z),
    );

    let (clip_low, clip_high) = widen_nan(clip_low, clip_high);
    let (near, far) = near_far(&clip_low, &clip_high);
    ChildHit {
        mask: fast_max(near, tnear).simd_le(fast_min(far, tfar)),
        entry: near,
    }
}

/// Robust slab test of one linearly motion-blurred child.
#[inline(always)]
pub fn intersect_motion_robust(
    node: &MotionNode,
    i: usize,
    ray: &RayPacket8,
    tnear: SimdFloatType,
    tfar: SimdFloatType,
) -> ChildHit {
    let bounds = motion_bounds(node, i, ray.time);
    let rdir = &ray.inv_direction;

    let clip_low = (bounds.min - &ray.origin).component_mul(rdir);
    let clip_high = (bounds.max - &ray.origin).component_mul(rdir);

    let (clip_low, clip_high) = widen_nan(clip_low, clip_high);
    let (near, far) = near_far(&clip_low, &clip_high);
    let round_down = splat(1.0 - 2.0 * FloatType::EPSILON);
    let round_up = splat(1.0 + 2.0 * FloatType::EPSILON);
    ChildHit {
        mask: (round_down * fast_max(near, tnear)).simd_le(round_up * fast_min(far, tfar)),
        entry: near,
    }
}

/// Validity mask of one child of a time-windowed node. The window is
/// half-open so that a lane exactly on the boundary between two time-split
/// children belongs to exactly one of them.
#[inline(always)]
pub fn time_window_mask(node: &TimedMotionNode, i: usize, time: SimdFloatType) -> SimdMaskType {
    splat(node.lower_t[i]).simd_le(time) & time.simd_lt(splat(node.upper_t[i]))
}

/// Fast test for levels mixing plain and time-windowed motion nodes. The
/// reference's tag is inspected once per node; windowed nodes are the rare
/// case.
#[inline(always)]
pub fn intersect_motion_window(
    pool: &NodePool,
    node: NodeRef,
    i: usize,
    ray: &RayPacket8,
    tnear: SimdFloatType,
    tfar: SimdFloatType,
) -> ChildHit {
    if node.is_motion() {
        intersect_motion(pool.motion_node(node), i, ray, tnear, tfar)
    } else {
        let timed = pool.timed_motion_node(node);
        let mut hit = intersect_motion(&timed.spatial, i, ray, tnear, tfar);
        hit.mask = hit.mask & time_window_mask(timed, i, ray.time);
        hit
    }
}

/// Robust counterpart of [`intersect_motion_window`].
#[inline(always)]
pub fn intersect_motion_window_robust(
    pool: &NodePool,
    node: NodeRef,
    i: usize,
    ray: &RayPacket8,
    tnear: SimdFloatType,
    tfar: SimdFloatType,
) -> ChildHit {
    if node.is_motion() {
        intersect_motion_robust(pool.motion_node(node), i, ray, tnear, tfar)
    } else {
        let timed = pool.timed_motion_node(node);
        let mut hit = intersect_motion_robust(&timed.spatial, i, ray, tnear, tfar);
        hit.mask = hit.mask & time_window_mask(timed, i, ray.time);
        hit
    }
}

/// Componentwise reciprocal with the same sign-preserving clamp as the
/// packet setup, for directions produced inside a local frame.
#[inline(always)]
fn safe_reciprocal8(v: &WorldVector8) -> WorldVector8 {
    v.map(|x| {
        let tiny = x.0.abs().cmp_lt(f32x8::splat(MIN_RCP_INPUT));
        let sign = x.0 & f32x8::splat(-0.0);
        let clamped = tiny.blend(f32x8::splat(MIN_RCP_INPUT) | sign, x.0);
        WideF32x8(f32x8::ONE / clamped)
    })
}

/// Fast slab test of one oriented child.
///
/// The ray is taken into the child's local frame and clipped against the
/// unit cube there: `clip_low = org * -rdir` covers the corner at the local
/// origin, and the far corner's clip is one reciprocal away. Entry distances
/// stay in global ray units because the frame does not rescale the
/// parameter.
#[inline(always)]
pub fn intersect_oriented(
    node: &OrientedNode,
    i: usize,
    ray: &RayPacket8,
    tnear: SimdFloatType,
    tfar: SimdFloatType,
) -> ChildHit {
    let frame = &node.frames[i];
    let dir = frame.transform_vector8(&ray.direction);
    let neg_rdir = -safe_reciprocal8(&dir);
    let org = frame.transform_point8(&ray.origin);

    let clip_low = org.coords.component_mul(&neg_rdir);
    let clip_high = clip_low - neg_rdir;

    let (clip_low, clip_high) = widen_nan(clip_low, clip_high);
    let (near, far) = near_far(&clip_low, &clip_high);
    ChildHit {
        mask: fast_max(near, tnear).simd_le(fast_min(far, tfar)),
        entry: near,
    }
}

/// Fast slab test of one motion-blurred oriented child. The local box slides
/// from the unit cube at shutter start to the stored end box, interpolated
/// at each lane's time before the clip derivation.
#[inline(always)]
pub fn intersect_oriented_motion(
    node: &OrientedMotionNode,
    i: usize,
    ray: &RayPacket8,
    tnear: SimdFloatType,
    tfar: SimdFloatType,
) -> ChildHit {
    let frame = &node.frames[i];
    let end = WorldBox8::splat(node.end_bounds[i].clone());
    let time = ray.time;
    let one_minus_time = splat(1.0) - time;

    // lerp(a, b, t) = (1 - t) * a + t * b, exact at both shutter endpoints;
    // the start box is the unit cube.
    let lower = WorldVector8::new(
        time * end.min.x,
        time * end.min.y,
        time * end.min.z,
    );
    let upper = WorldVector8::new(
        mul_add(time, end.max.x, one_minus_time),
        mul_add(time, end.max.y, one_minus_time),
        mul_add(time, end.max.z, one_minus_time),
    );

    let dir = frame.transform_vector8(&ray.direction);
    let rdir = safe_reciprocal8(&dir);
    let org = frame.transform_point8(&ray.origin);

    let clip_low = (lower - org.coords).component_mul(&rdir);
    let clip_high = (upper - org.coords).component_mul(&rdir);

    let (clip_low, clip_high) = widen_nan(clip_low, clip_high);
    let (near, far) = near_far(&clip_low, &clip_high);
    ChildHit {
        mask: fast_max(near, tnear).simd_le(fast_min(far, tfar)),
        entry: near,
    }
}
