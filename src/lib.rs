pub mod bvh;
pub mod geometry;
pub mod util;

pub use bvh::{NodePool, NodeRef, RayPacket8};
pub use geometry::Ray;
