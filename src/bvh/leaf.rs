use crate::geometry::Ray;

/// One element of a leaf's primitive list.
///
/// Lists are laid out as a run of elements terminated by a per-element flag,
/// not by a stored count; consumers walk the run until the flag.
pub trait LeafPrimitive {
    fn is_last(&self) -> bool;
}

/// Iterates a leaf's primitives up to and including the flagged last one.
/// The slice may extend past the run; anything after the flag is not
/// yielded.
pub fn leaf_items<P: LeafPrimitive>(prims: &[P]) -> impl Iterator<Item = &P> {
    let mut done = false;
    prims.iter().take_while(move |p| {
        if done {
            return false;
        }
        done = p.is_last();
        true
    })
}

/// Contract between traversal and a primitive intersector. Once traversal
/// reaches a leaf it hands the ray over; this core only gates whether that
/// happens at all.
pub trait LeafIntersector {
    type Primitive: LeafPrimitive;
    /// Per-ray state computed once before traversal starts.
    type Precalc;
    /// Geometry lookup data threaded through unchanged.
    type Context;

    /// Tests one primitive, lowering `ray.tfar` on a closer hit.
    fn intersect_one(
        pre: &Self::Precalc,
        ray: &mut Ray,
        prim: &Self::Primitive,
        context: &Self::Context,
    );

    /// True when the primitive blocks the ray anywhere inside its span.
    fn occluded_one(
        pre: &Self::Precalc,
        ray: &Ray,
        prim: &Self::Primitive,
        context: &Self::Context,
    ) -> bool;

    /// Intersects the whole leaf run.
    fn intersect(
        pre: &Self::Precalc,
        ray: &mut Ray,
        prims: &[Self::Primitive],
        context: &Self::Context,
    ) {
        for prim in leaf_items(prims) {
            Self::intersect_one(pre, ray, prim, context);
        }
    }

    /// Returns at the first occluding primitive of the leaf run.
    fn occluded(
        pre: &Self::Precalc,
        ray: &Ray,
        prims: &[Self::Primitive],
        context: &Self::Context,
    ) -> bool {
        for prim in leaf_items(prims) {
            if Self::occluded_one(pre, ray, prim, context) {
                return true;
            }
        }
        false
    }
}
