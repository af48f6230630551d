use assert2::debug_assert;
use nalgebra::Matrix3;
use simba::simd::SimdValue;

use super::{FloatType, SimdFloatType, WorldBox, WorldPoint8, WorldVector, WorldVector8};

/// Affine map taking world space into a node child's local frame.
/// The child's bounding region is the unit cube of that frame, so an
/// elongated or skewed region costs one 3x3 transform per test instead of a
/// loose axis-aligned box.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AffineFrame {
    pub linear: Matrix3<FloatType>,
    pub translation: WorldVector,
}

impl AffineFrame {
    pub fn identity() -> AffineFrame {
        AffineFrame {
            linear: Matrix3::identity(),
            translation: WorldVector::zeros(),
        }
    }

    /// Frame mapping `b` onto the unit cube: `local = (world - min) / size`.
    /// The box must have positive extent on every axis.
    pub fn from_box(b: &WorldBox) -> AffineFrame {
        let size = b.size();
        debug_assert!(size.x > 0.0 && size.y > 0.0 && size.z > 0.0, "{b:?}");
        let scale = size.map(|x| 1.0 / x);
        AffineFrame {
            linear: Matrix3::from_diagonal(&scale),
            translation: -b.min.coords.component_mul(&scale),
        }
    }

    /// Applies the full map to a packet of points.
    #[inline(always)]
    pub fn transform_point8(&self, p: &WorldPoint8) -> WorldPoint8 {
        let linear = self.linear.map(SimdFloatType::splat);
        let translation = self.translation.map(SimdFloatType::splat);
        WorldPoint8::from(linear * p.coords + translation)
    }

    /// Applies the linear part to a packet of vectors.
    #[inline(always)]
    pub fn transform_vector8(&self, v: &WorldVector8) -> WorldVector8 {
        self.linear.map(SimdFloatType::splat) * v
    }
}

impl Default for AffineFrame {
    fn default() -> Self {
        Self::identity()
    }
}
