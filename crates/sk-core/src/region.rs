use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Identifier of one world (dimension) in the host.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorldId(pub String);

impl WorldId {
    /// Create a world id from a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The world name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WorldId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for WorldId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Integer block coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    /// East-west axis.
    pub x: i32,
    /// Vertical axis.
    pub y: i32,
    /// North-south axis.
    pub z: i32,
}

impl BlockPos {
    /// Create a block position.
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// A precise point inside a world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// World the point belongs to.
    pub world: WorldId,
    /// East-west coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
    /// North-south coordinate.
    pub z: f64,
}

impl Location {
    /// Create a location.
    pub fn new(world: impl Into<WorldId>, x: f64, y: f64, z: f64) -> Self {
        Self {
            world: world.into(),
            x,
            y,
            z,
        }
    }

    /// The block this point lies in.
    pub fn block(&self) -> BlockPos {
        BlockPos::new(
            self.x.floor() as i32,
            self.y.floor() as i32,
            self.z.floor() as i32,
        )
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({:.1}, {:.1}, {:.1})",
            self.world, self.x, self.y, self.z
        )
    }
}

/// Axis-aligned block volume inside a single world.
///
/// Stored as the two corners it was built from; min/max per axis are
/// derived on demand. A region is never mutated, only replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    world: WorldId,
    corner_a: BlockPos,
    corner_b: BlockPos,
}

impl Region {
    /// Create a region between two block corners in one world.
    pub fn new(world: impl Into<WorldId>, corner_a: BlockPos, corner_b: BlockPos) -> Self {
        Self {
            world: world.into(),
            corner_a,
            corner_b,
        }
    }

    /// Create a region from two located corners.
    ///
    /// Fails with [`CoreError::InvalidRegion`] when the corners are in
    /// different worlds.
    pub fn from_corners(a: &Location, b: &Location) -> CoreResult<Self> {
        if a.world != b.world {
            return Err(CoreError::InvalidRegion {
                first: a.world.clone(),
                second: b.world.clone(),
            });
        }
        Ok(Self::new(a.world.clone(), a.block(), b.block()))
    }

    /// World this region belongs to.
    pub fn world(&self) -> &WorldId {
        &self.world
    }

    /// First corner, as given.
    pub fn corner_a(&self) -> BlockPos {
        self.corner_a
    }

    /// Second corner, as given.
    pub fn corner_b(&self) -> BlockPos {
        self.corner_b
    }

    /// Lowest block on every axis.
    pub fn min(&self) -> BlockPos {
        BlockPos::new(
            self.corner_a.x.min(self.corner_b.x),
            self.corner_a.y.min(self.corner_b.y),
            self.corner_a.z.min(self.corner_b.z),
        )
    }

    /// Highest block on every axis.
    pub fn max(&self) -> BlockPos {
        BlockPos::new(
            self.corner_a.x.max(self.corner_b.x),
            self.corner_a.y.max(self.corner_b.y),
            self.corner_a.z.max(self.corner_b.z),
        )
    }

    /// Whether a point lies inside the region (bounds inclusive).
    pub fn contains(&self, location: &Location) -> bool {
        location.world == self.world && self.contains_block(location.block())
    }

    /// Whether a block of this region's world lies inside it (bounds inclusive).
    pub fn contains_block(&self, pos: BlockPos) -> bool {
        let (min, max) = (self.min(), self.max());
        (min.x..=max.x).contains(&pos.x)
            && (min.y..=max.y).contains(&pos.y)
            && (min.z..=max.z).contains(&pos.z)
    }

    /// Whether a vertical block coordinate is within the region's Y bounds.
    pub fn contains_y(&self, y: i32) -> bool {
        (self.min().y..=self.max().y).contains(&y)
    }

    /// Uniformly sample one `(x, z)` column of the footprint.
    ///
    /// The vertical coordinate is left to the caller; it is not constrained
    /// to the region's Y bounds.
    pub fn random_column<R: Rng>(&self, rng: &mut R) -> (i32, i32) {
        let (min, max) = (self.min(), self.max());
        (
            rng.random_range(min.x..=max.x),
            rng.random_range(min.z..=max.z),
        )
    }

    /// Inclusive extent along each axis.
    pub fn extents(&self) -> (u64, u64, u64) {
        let (min, max) = (self.min(), self.max());
        (
            (i64::from(max.x) - i64::from(min.x) + 1) as u64,
            (i64::from(max.y) - i64::from(min.y) + 1) as u64,
            (i64::from(max.z) - i64::from(min.z) + 1) as u64,
        )
    }

    /// Number of blocks in the region, saturating at `u64::MAX`.
    pub fn volume(&self) -> u64 {
        let (dx, dy, dz) = self.extents();
        dx.saturating_mul(dy).saturating_mul(dz)
    }

    /// Number of columns in the horizontal footprint, saturating at `u64::MAX`.
    pub fn base_area(&self) -> u64 {
        let (dx, _, dz) = self.extents();
        dx.saturating_mul(dz)
    }

    /// Geometric center of the region.
    pub fn center(&self) -> Location {
        let (min, max) = (self.min(), self.max());
        let mid = |lo: i32, hi: i32| (f64::from(lo) + f64::from(hi) + 1.0) / 2.0;
        Location::new(
            self.world.clone(),
            mid(min.x, max.x),
            mid(min.y, max.y),
            mid(min.z, max.z),
        )
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} -> {}", self.world, self.min(), self.max())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn farm() -> Region {
        Region::new("w", BlockPos::new(10, 64, 10), BlockPos::new(0, 64, 0))
    }

    #[test]
    fn corners_normalize_per_axis() {
        let region = farm();
        assert_eq!(region.min(), BlockPos::new(0, 64, 0));
        assert_eq!(region.max(), BlockPos::new(10, 64, 10));
    }

    #[test]
    fn contains_is_inclusive() {
        let region = farm();
        assert!(region.contains(&Location::new("w", 0.0, 64.0, 0.0)));
        assert!(region.contains(&Location::new("w", 10.9, 64.5, 10.9)));
        assert!(!region.contains(&Location::new("w", 11.0, 64.0, 5.0)));
        assert!(!region.contains(&Location::new("w", 5.0, 65.0, 5.0)));
        assert!(!region.contains(&Location::new("w", -0.1, 64.0, 5.0)));
    }

    #[test]
    fn contains_rejects_other_worlds() {
        let region = farm();
        assert!(!region.contains(&Location::new("nether", 5.0, 64.0, 5.0)));
    }

    #[test]
    fn from_corners_in_different_worlds_fails() {
        let a = Location::new("w", 0.0, 0.0, 0.0);
        let b = Location::new("nether", 5.0, 5.0, 5.0);
        let err = Region::from_corners(&a, &b).unwrap_err();
        assert!(matches!(err, CoreError::InvalidRegion { .. }));
    }

    #[test]
    fn from_corners_floors_to_blocks() {
        let a = Location::new("w", 0.7, 63.2, -0.5);
        let b = Location::new("w", 4.1, 70.9, 3.0);
        let region = Region::from_corners(&a, &b).unwrap();
        assert_eq!(region.min(), BlockPos::new(0, 63, -1));
        assert_eq!(region.max(), BlockPos::new(4, 70, 3));
    }

    #[test]
    fn volume_and_base_area() {
        let region = Region::new("w", BlockPos::new(0, 0, 0), BlockPos::new(9, 4, 1));
        assert_eq!(region.volume(), 10 * 5 * 2);
        assert_eq!(region.base_area(), 20);
        assert_eq!(farm().volume(), 121);
    }

    #[test]
    fn full_range_region_saturates() {
        let region = Region::new(
            "w",
            BlockPos::new(i32::MIN, i32::MIN, i32::MIN),
            BlockPos::new(i32::MAX, i32::MAX, i32::MAX),
        );
        assert_eq!(region.extents(), (1 << 32, 1 << 32, 1 << 32));
        assert_eq!(region.volume(), u64::MAX);
        assert_eq!(region.base_area(), u64::MAX);
    }

    #[test]
    fn single_block_region() {
        let pos = BlockPos::new(3, 3, 3);
        let region = Region::new("w", pos, pos);
        assert_eq!(region.volume(), 1);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(region.random_column(&mut rng), (3, 3));
    }

    #[test]
    fn center_is_middle_of_blocks() {
        let region = Region::new("w", BlockPos::new(0, 0, 0), BlockPos::new(1, 1, 1));
        let c = region.center();
        assert!((c.x - 1.0).abs() < f64::EPSILON);
        assert!((c.y - 1.0).abs() < f64::EPSILON);
        assert!((c.z - 1.0).abs() < f64::EPSILON);
    }

    proptest! {
        #[test]
        fn random_column_stays_in_footprint(
            ax in -100i32..100, az in -100i32..100,
            bx in -100i32..100, bz in -100i32..100,
            seed in any::<u64>(),
        ) {
            let region = Region::new("w", BlockPos::new(ax, 0, az), BlockPos::new(bx, 10, bz));
            let mut rng = StdRng::seed_from_u64(seed);
            for _ in 0..16 {
                let (x, z) = region.random_column(&mut rng);
                prop_assert!(region.contains_block(BlockPos::new(x, 5, z)));
            }
        }

        #[test]
        fn corner_order_does_not_matter(
            ax in -50i32..50, ay in -50i32..50, az in -50i32..50,
            bx in -50i32..50, by in -50i32..50, bz in -50i32..50,
        ) {
            let a = BlockPos::new(ax, ay, az);
            let b = BlockPos::new(bx, by, bz);
            let forward = Region::new("w", a, b);
            let backward = Region::new("w", b, a);
            prop_assert_eq!(forward.min(), backward.min());
            prop_assert_eq!(forward.max(), backward.max());
            prop_assert_eq!(forward.volume(), backward.volume());
            prop_assert!(forward.contains_block(a));
            prop_assert!(forward.contains_block(b));
        }
    }
}
