use simba::simd::{SimdValue, WideBoolF32x8, WideF32x8};

use crate::geometry::SimdFloatType;

pub trait SimbaWorkarounds: SimdValue {
    fn is_nan(self) -> Self::SimdBool;

    fn infinity() -> Self;
    fn neg_infinity() -> Self;
}

impl SimbaWorkarounds for WideF32x8 {
    #[inline(always)]
    fn is_nan(self) -> Self::SimdBool {
        WideBoolF32x8(self.0.is_nan())
    }

    #[inline(always)]
    fn infinity() -> Self {
        Self::splat(f32::INFINITY)
    }

    #[inline(always)]
    fn neg_infinity() -> Self {
        Self::splat(f32::NEG_INFINITY)
    }
}

/// Lane minimum with the platform's single-instruction NaN semantics.
/// Callers must not rely on either operand winning when a lane is NaN.
#[inline(always)]
pub fn fast_min(a: SimdFloatType, b: SimdFloatType) -> SimdFloatType {
    WideF32x8(a.0.fast_min(b.0))
}

#[inline(always)]
pub fn fast_max(a: SimdFloatType, b: SimdFloatType) -> SimdFloatType {
    WideF32x8(a.0.fast_max(b.0))
}

/// `a * b + c`, fused on targets with an FMA unit.
#[inline(always)]
pub fn mul_add(a: SimdFloatType, b: SimdFloatType, c: SimdFloatType) -> SimdFloatType {
    WideF32x8(a.0.mul_add(b.0, c.0))
}

/// `a * b - c`, fused on targets with an FMA unit.
#[inline(always)]
pub fn mul_sub(a: SimdFloatType, b: SimdFloatType, c: SimdFloatType) -> SimdFloatType {
    WideF32x8(a.0.mul_add(b.0, (-c).0))
}
