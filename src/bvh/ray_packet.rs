use crate::geometry::{FloatType, Ray, SimdFloatType, WorldPoint8, WorldVector8};

/// Rays processed together by one packet slab test.
pub const PACKET_LANES: usize = 8;

/// Structure-of-arrays gather of [`PACKET_LANES`] rays.
///
/// `inv_direction` lanes are finite with the sign of the direction component
/// (zero components invert to a huge finite value), so the precomputed
/// `origin * inv_direction` product is finite for any finite origin. The
/// fast slab tests consume that product as the subtrahend of a fused
/// multiply-subtract.
#[derive(Clone, Debug)]
pub struct RayPacket8 {
    pub origin: WorldPoint8,
    pub direction: WorldVector8,
    pub inv_direction: WorldVector8,
    pub origin_inv_direction: WorldVector8,
    pub tnear: SimdFloatType,
    pub tfar: SimdFloatType,
    /// Per-lane shutter time; lanes of one packet may carry different times.
    pub time: SimdFloatType,
}

impl RayPacket8 {
    pub fn new(rays: &[Ray; PACKET_LANES]) -> RayPacket8 {
        let gather = |f: fn(&Ray) -> FloatType| -> SimdFloatType {
            std::array::from_fn(|lane| f(&rays[lane])).into()
        };

        let origin = WorldPoint8::from(nalgebra::Vector3::new(
            gather(|r| r.origin.x),
            gather(|r| r.origin.y),
            gather(|r| r.origin.z),
        ));
        let inv_direction = WorldVector8::new(
            gather(|r| r.inv_direction.x),
            gather(|r| r.inv_direction.y),
            gather(|r| r.inv_direction.z),
        );

        RayPacket8 {
            origin_inv_direction: origin.coords.component_mul(&inv_direction),
            origin,
            direction: WorldVector8::new(
                gather(|r| r.direction.x),
                gather(|r| r.direction.y),
                gather(|r| r.direction.z),
            ),
            inv_direction,
            tnear: gather(|r| r.tnear),
            tfar: gather(|r| r.tfar),
            time: gather(|r| r.time),
        }
    }

    pub fn splat(ray: &Ray) -> RayPacket8 {
        RayPacket8::new(&[*ray; PACKET_LANES])
    }
}
