use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use simba::simd::SimdBool as _;
use simba::simd::SimdValue;
use slabcast::bvh::{
    AlignedFast, AlignedNode, AlignedRobust, MotionFast, MotionNode, MotionWindowFast,
    NODE_CHILDREN, NodeIntersector, NodePool, NodeRef, OrientedNode, RayPacket8, TimedMotionNode,
};
use slabcast::geometry::{
    AffineFrame, FloatType, Ray, SimdFloatType, SimdMaskType, WorldBox, WorldPoint, WorldVector,
};

fn child_box(i: usize) -> WorldBox {
    let offset = i as FloatType * 3.0;
    WorldBox::new(
        WorldPoint::new(offset, 0.0, 5.0),
        WorldPoint::new(offset + 2.0, 2.0, 7.0),
    )
}

fn packet() -> RayPacket8 {
    let rays: [Ray; NODE_CHILDREN] = std::array::from_fn(|lane| {
        let lane = lane as FloatType;
        Ray::new(
            WorldPoint::new(lane * 3.0 + 1.0, 1.0, 0.0),
            WorldVector::new(0.1 * lane - 0.3, 0.05, 1.0),
        )
        .with_time(lane / 8.0)
    });
    RayPacket8::new(&rays)
}

fn pool() -> (NodePool, NodeRef, NodeRef, NodeRef, NodeRef) {
    let mut pool = NodePool::default();

    let mut aligned = AlignedNode::default();
    let mut motion = MotionNode::default();
    let mut timed = TimedMotionNode::default();
    let mut oriented = OrientedNode::default();
    for i in 0..NODE_CHILDREN {
        let b = child_box(i);
        let moved = b.map(|p| p + WorldVector::new(0.5, 0.0, 0.0));
        aligned.set_child(i, &b, NodeRef::NULL);
        motion.set_child(i, &b, &moved, NodeRef::NULL);
        timed.set_child(
            i,
            &b,
            &moved,
            (i as FloatType / 8.0)..((i + 4) as FloatType / 8.0),
            NodeRef::NULL,
        );
        oriented.set_child(i, AffineFrame::from_box(&b), NodeRef::NULL);
    }

    let aligned = pool.push_aligned(aligned);
    let motion = pool.push_motion(motion);
    let timed = pool.push_timed_motion(timed);
    let oriented = pool.push_oriented(oriented);
    (pool, aligned, motion, timed, oriented)
}

fn bench_strategy<S: NodeIntersector>(
    c: &mut Criterion,
    name: &str,
    pool: &NodePool,
    node: NodeRef,
    ray: &RayPacket8,
) {
    let tnear = SimdFloatType::splat(0.0);
    let tfar = SimdFloatType::splat(FloatType::INFINITY);
    let parent = SimdMaskType::splat(true);

    c.bench_function(name, |b| {
        b.iter(|| {
            let mut mask_bits = 0u64;
            for i in 0..NODE_CHILDREN {
                let hit = S::intersect(
                    black_box(pool),
                    black_box(node),
                    i,
                    black_box(ray),
                    tnear,
                    tfar,
                    parent,
                );
                mask_bits ^= hit.mask.bitmask();
            }
            mask_bits
        })
    });
}

fn criterion_benchmark(c: &mut Criterion) {
    let (pool, aligned, motion, timed, oriented) = pool();
    let ray = packet();

    bench_strategy::<AlignedFast>(c, "aligned_fast", &pool, aligned, &ray);
    bench_strategy::<AlignedRobust>(c, "aligned_robust", &pool, aligned, &ray);
    bench_strategy::<MotionFast>(c, "motion_fast", &pool, motion, &ray);
    bench_strategy::<MotionWindowFast>(c, "motion_window_fast", &pool, timed, &ray);

    // the oriented test through the mixed-kind strategy, tag check included
    bench_strategy::<slabcast::bvh::AlignedOrientedFast>(
        c,
        "oriented_fast",
        &pool,
        oriented,
        &ray,
    );
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
