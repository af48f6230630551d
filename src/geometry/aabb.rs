use std::ops::Sub;

use nalgebra::{DefaultAllocator, DimName, OPoint, Point, Scalar, allocator::Allocator};
use num_traits::One;
use simba::simd::SimdValue;

/// Axis-aligned box spanned by two corner points.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AABB<Point> {
    pub min: Point,
    pub max: Point,
}

impl<Point> AABB<Point> {
    pub fn new(min: Point, max: Point) -> AABB<Point> {
        AABB { min, max }
    }

    pub fn map<Point2, F: FnMut(&Point) -> Point2>(&self, mut f: F) -> AABB<Point2> {
        AABB {
            min: f(&self.min),
            max: f(&self.max),
        }
    }

    pub fn zip_map<Point2, Point3, F: FnMut(&Point, &Point2) -> Point3>(
        &self,
        rhs: &AABB<Point2>,
        mut f: F,
    ) -> AABB<Point3> {
        AABB {
            min: f(&self.min, &rhs.min),
            max: f(&self.max, &rhs.max),
        }
    }

    pub fn zip_apply<Point2, F: FnMut(&mut Point, &Point2)>(&mut self, rhs: &AABB<Point2>, mut f: F) {
        f(&mut self.min, &rhs.min);
        f(&mut self.max, &rhs.max);
    }
}

impl<T: Scalar, D: DimName> AABB<OPoint<T, D>>
where
    DefaultAllocator: Allocator<D>,
{
    pub fn map_coords<T2: Scalar, F: FnMut(T) -> T2>(&self, mut f: F) -> AABB<OPoint<T2, D>> {
        self.map(|p| p.map(&mut f))
    }

    pub fn zip_map_coords<T2: Scalar, T3: Scalar, F: FnMut(T, T2) -> T3>(
        &self,
        rhs: &AABB<OPoint<T2, D>>,
        mut f: F,
    ) -> AABB<OPoint<T3, D>> {
        self.zip_map(rhs, |p, q| OPoint {
            coords: p.coords.zip_map(&q.coords, &mut f),
        })
    }

    pub fn zip_apply_coords<T2: Scalar, F: FnMut(&mut T, T2)>(
        &mut self,
        rhs: &AABB<OPoint<T2, D>>,
        mut f: F,
    ) {
        self.zip_apply(rhs, |p, q| p.coords.zip_apply(&q.coords, &mut f))
    }
}

impl<Point: Sub + Copy> AABB<Point> {
    pub fn size(&self) -> Point::Output {
        self.max - self.min
    }
}

impl<T, const D: usize> AABB<Point<T, D>>
where
    T: Scalar + nalgebra::ClosedAddAssign + nalgebra::ClosedDivAssign + One,
{
    pub fn center(&self) -> Point<T, D> {
        let two = T::one() + T::one();
        Point::from((&self.min.coords + &self.max.coords) / two)
    }
}

impl<T: SimdValue + Scalar, D: DimName> SimdValue for AABB<OPoint<T, D>>
where
    T::Element: SimdValue + Scalar,
    DefaultAllocator: Allocator<D>,
{
    const LANES: usize = T::LANES;

    type Element = AABB<OPoint<T::Element, D>>;

    type SimdBool = T::SimdBool;

    fn splat(val: Self::Element) -> Self {
        val.map_coords(|x| T::splat(x))
    }

    fn extract(&self, i: usize) -> Self::Element {
        self.map_coords(|x| x.extract(i))
    }

    unsafe fn extract_unchecked(&self, i: usize) -> Self::Element {
        unsafe { self.map_coords(|x| x.extract_unchecked(i)) }
    }

    fn replace(&mut self, i: usize, val: Self::Element) {
        self.zip_apply_coords(&val, |x, y| x.replace(i, y.clone()));
    }

    unsafe fn replace_unchecked(&mut self, i: usize, val: Self::Element) {
        unsafe {
            self.zip_apply_coords(&val, |x, y| x.replace_unchecked(i, y.clone()));
        }
    }

    fn select(self, cond: Self::SimdBool, other: Self) -> Self {
        self.zip_map_coords(&other, |x, y| x.select(cond, y.clone()))
    }
}

#[cfg(test)]
mod test {
    use assert2::assert;
    use simba::simd::SimdValue;
    use test_strategy::proptest;

    use crate::geometry::{WorldBox, WorldBox8, WorldPoint, WorldVector, test::world_box};

    #[proptest]
    fn size_and_center_are_consistent(#[strategy(world_box())] b: WorldBox) {
        let size = b.size();
        let center = b.center();
        let rebuilt_min = center - size / 2.0;
        let rebuilt_max = center + size / 2.0;
        for axis in 0..3 {
            assert!((rebuilt_min[axis] - b.min[axis]).abs() <= b.size()[axis] * 1e-5 + 1e-3);
            assert!((rebuilt_max[axis] - b.max[axis]).abs() <= b.size()[axis] * 1e-5 + 1e-3);
        }
    }

    #[test]
    fn map_coords_applies_to_both_corners() {
        let b = WorldBox::new(WorldPoint::new(1.0, 2.0, 3.0), WorldPoint::new(4.0, 5.0, 6.0));
        let shifted = b.map(|p| p + WorldVector::new(1.0, 1.0, 1.0));
        assert!(shifted.min == WorldPoint::new(2.0, 3.0, 4.0));
        assert!(shifted.max == WorldPoint::new(5.0, 6.0, 7.0));
    }

    #[proptest]
    fn simd_splat_round_trips_through_every_lane(#[strategy(world_box())] b: WorldBox) {
        let wide = WorldBox8::splat(b.clone());
        for lane in 0..WorldBox8::LANES {
            assert!(wide.extract(lane) == b);
        }
    }

    #[test]
    fn simd_replace_changes_a_single_lane() {
        let a = WorldBox::new(WorldPoint::origin(), WorldPoint::new(1.0, 1.0, 1.0));
        let b = WorldBox::new(WorldPoint::new(2.0, 2.0, 2.0), WorldPoint::new(3.0, 3.0, 3.0));

        let mut wide = WorldBox8::splat(a.clone());
        wide.replace(5, b.clone());

        assert!(wide.extract(4) == a);
        assert!(wide.extract(5) == b);
    }
}
