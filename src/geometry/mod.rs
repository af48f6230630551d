mod aabb;
mod affine;

pub use aabb::AABB;
pub use affine::AffineFrame;

use simba::simd::{WideBoolF32x8, WideF32x8};

pub type FloatType = f32;
pub type SimdFloatType = WideF32x8;
pub type SimdMaskType = WideBoolF32x8;

pub type WorldPoint = nalgebra::Point3<FloatType>;
pub type WorldVector = nalgebra::Vector3<FloatType>;
pub type WorldBox = AABB<WorldPoint>;
pub type WorldPoint8 = nalgebra::Point3<SimdFloatType>;
pub type WorldVector8 = nalgebra::Vector3<SimdFloatType>;
pub type WorldBox8 = AABB<WorldPoint8>;

/// Smallest direction component magnitude that is inverted as-is.
/// Anything closer to zero is clamped to this before the division, keeping
/// the sign of the input, so reciprocal direction lanes stay finite.
pub const MIN_RCP_INPUT: FloatType = 1e-18;

/// Componentwise-safe reciprocal for ray directions.
/// A zero (or denormal-tiny) component yields a huge value carrying the
/// component's sign instead of an infinity, so downstream products with the
/// ray origin cannot become NaN.
#[inline(always)]
pub fn safe_reciprocal(x: FloatType) -> FloatType {
    if x.abs() < MIN_RCP_INPUT {
        1.0 / MIN_RCP_INPUT.copysign(x)
    } else {
        1.0 / x
    }
}

#[derive(Copy, Clone, Debug)]
pub struct Ray {
    pub origin: WorldPoint,
    /// Normalized direction of the ray
    pub direction: WorldVector,
    /// Componentwise safe reciprocal of the ray direction
    pub inv_direction: WorldVector,

    pub tnear: FloatType,
    pub tfar: FloatType,
    /// Shutter time in [0, 1], read only by motion-blurred node kinds
    pub time: FloatType,
}

impl Ray {
    pub fn new(origin: WorldPoint, direction: WorldVector) -> Ray {
        let direction = direction.normalize();
        let inv_direction = direction.map(safe_reciprocal);

        Ray {
            origin,
            direction,
            inv_direction,
            tnear: 0.0,
            tfar: FloatType::INFINITY,
            time: 0.0,
        }
    }

    pub fn with_span(self, tnear: FloatType, tfar: FloatType) -> Ray {
        Ray { tnear, tfar, ..self }
    }

    pub fn with_time(self, time: FloatType) -> Ray {
        Ray { time, ..self }
    }

    pub fn point_at(&self, distance: FloatType) -> WorldPoint {
        self.origin + self.direction * distance
    }
}
