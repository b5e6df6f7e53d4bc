//! Rectangular brick occupying a footprint of unit cells on one level

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Brick footprint in studs, normalized so that `width <= length`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BrickSize {
    pub width: i32,
    pub length: i32,
}

impl BrickSize {
    /// 1x1 footprint
    pub const UNIT: BrickSize = BrickSize { width: 1, length: 1 };

    /// Create a normalized footprint from two side lengths in any order
    pub fn new(a: i32, b: i32) -> Self {
        if a <= b {
            Self { width: a, length: b }
        } else {
            Self { width: b, length: a }
        }
    }

    /// Number of studs covered by this footprint
    pub fn area(&self) -> i32 {
        self.width * self.length
    }
}

impl fmt::Display for BrickSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.length)
    }
}

impl FromStr for BrickSize {
    type Err = String;

    /// Parse `"WxL"` (e.g. `"2x4"`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (a, b) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("expected WxL, got '{}'", s))?;
        let a: i32 = a.trim().parse().map_err(|_| format!("bad width in '{}'", s))?;
        let b: i32 = b.trim().parse().map_err(|_| format!("bad length in '{}'", s))?;
        if a < 1 || b < 1 {
            return Err(format!("footprint sides must be positive, got '{}'", s));
        }
        Ok(BrickSize::new(a, b))
    }
}

/// A brick: level, grid position and footprint, plus colour and surface flag.
///
/// Shape is fixed at construction. Equality and hashing only look at the
/// shape, colour and outer flag are metadata.
#[derive(Clone, Copy, Debug)]
pub struct Brick {
    level: i32,
    pos_x: i32,
    pos_y: i32,
    size_x: i32,
    size_y: i32,
    color_id: usize,
    is_outer: bool,
}

impl Brick {
    pub fn new(level: i32, pos_x: i32, pos_y: i32, size_x: i32, size_y: i32) -> Self {
        debug_assert!(level >= 0, "brick level must be non-negative");
        debug_assert!(size_x > 0 && size_y > 0, "brick footprint must be non-empty");
        Self {
            level,
            pos_x,
            pos_y,
            size_x,
            size_y,
            color_id: 0,
            is_outer: false,
        }
    }

    /// 1x1 brick at the given cell
    pub fn unit(level: i32, pos_x: i32, pos_y: i32) -> Self {
        Self::new(level, pos_x, pos_y, 1, 1)
    }

    pub fn level(&self) -> i32 {
        self.level
    }

    pub fn pos_x(&self) -> i32 {
        self.pos_x
    }

    pub fn pos_y(&self) -> i32 {
        self.pos_y
    }

    pub fn size_x(&self) -> i32 {
        self.size_x
    }

    pub fn size_y(&self) -> i32 {
        self.size_y
    }

    /// Normalized footprint (catalog key)
    pub fn size(&self) -> BrickSize {
        BrickSize::new(self.size_x, self.size_y)
    }

    /// Number of studs on top of the brick
    pub fn stud_count(&self) -> i32 {
        self.size_x * self.size_y
    }

    pub fn is_unit(&self) -> bool {
        self.stud_count() == 1
    }

    pub fn color_id(&self) -> usize {
        self.color_id
    }

    pub fn set_color_id(&mut self, color_id: usize) {
        self.color_id = color_id;
    }

    pub fn is_outer(&self) -> bool {
        self.is_outer
    }

    pub fn set_outer(&mut self, is_outer: bool) {
        self.is_outer = is_outer;
    }

    /// Builder-style colour assignment
    pub fn with_color(mut self, color_id: usize) -> Self {
        self.color_id = color_id;
        self
    }

    /// True if the cell `(x, y)` lies inside the footprint
    pub fn contains_cell(&self, x: i32, y: i32) -> bool {
        x >= self.pos_x
            && x < self.pos_x + self.size_x
            && y >= self.pos_y
            && y < self.pos_y + self.size_y
    }

    /// All `(x, y)` cells covered by the footprint
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        (self.pos_x..self.pos_x + self.size_x)
            .flat_map(move |x| (self.pos_y..self.pos_y + self.size_y).map(move |y| (x, y)))
    }

    fn overlaps_x(&self, other: &Brick) -> bool {
        self.pos_x < other.pos_x + other.size_x && other.pos_x < self.pos_x + self.size_x
    }

    fn overlaps_y(&self, other: &Brick) -> bool {
        self.pos_y < other.pos_y + other.size_y && other.pos_y < self.pos_y + self.size_y
    }

    /// True if the footprints share at least one cell, ignoring levels
    pub fn footprints_overlap(&self, other: &Brick) -> bool {
        self.overlaps_x(other) && self.overlaps_y(other)
    }

    /// Lateral adjacency: same level and at least one pair of cells sharing a grid edge.
    pub fn is_lateral_neighbour(&self, other: &Brick) -> bool {
        if self.level != other.level || self == other {
            return false;
        }
        let touch_x = self.pos_x + self.size_x == other.pos_x || other.pos_x + other.size_x == self.pos_x;
        let touch_y = self.pos_y + self.size_y == other.pos_y || other.pos_y + other.size_y == self.pos_y;
        (touch_x && self.overlaps_y(other)) || (touch_y && self.overlaps_x(other))
    }

    /// Vertical stud connection: adjacent levels and overlapping footprints.
    pub fn is_connected_to(&self, other: &Brick) -> bool {
        (self.level - other.level).abs() == 1 && self.footprints_overlap(other)
    }

    /// Smallest rectangle covering both bricks, as `(pos_x, pos_y, size_x, size_y)`.
    pub fn bounding_rect(&self, other: &Brick) -> (i32, i32, i32, i32) {
        let min_x = self.pos_x.min(other.pos_x);
        let min_y = self.pos_y.min(other.pos_y);
        let max_x = (self.pos_x + self.size_x).max(other.pos_x + other.size_x);
        let max_y = (self.pos_y + self.size_y).max(other.pos_y + other.size_y);
        (min_x, min_y, max_x - min_x, max_y - min_y)
    }

    /// True if the two bricks tile their bounding rectangle exactly
    pub fn tiles_with(&self, other: &Brick) -> bool {
        if self.level != other.level || self.footprints_overlap(other) {
            return false;
        }
        let (_, _, sx, sy) = self.bounding_rect(other);
        sx * sy == self.stud_count() + other.stud_count()
    }
}

impl PartialEq for Brick {
    fn eq(&self, other: &Self) -> bool {
        self.level == other.level
            && self.pos_x == other.pos_x
            && self.pos_y == other.pos_y
            && self.size_x == other.size_x
            && self.size_y == other.size_y
    }
}

impl Eq for Brick {}

impl Hash for Brick {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.level.hash(state);
        self.pos_x.hash(state);
        self.pos_y.hash(state);
        self.size_x.hash(state);
        self.size_y.hash(state);
    }
}

impl fmt::Display for Brick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Brick(level {}, at {},{}, {}x{}, {})",
            self.level,
            self.pos_x,
            self.pos_y,
            self.size_x,
            self.size_y,
            if self.is_outer { "outer" } else { "inner" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_is_normalized() {
        assert_eq!(BrickSize::new(4, 2), BrickSize { width: 2, length: 4 });
        assert_eq!(Brick::new(0, 0, 0, 3, 1).size(), BrickSize::new(1, 3));
        assert_eq!(BrickSize::new(2, 8).area(), 16);
    }

    #[test]
    fn test_size_parse() {
        assert_eq!("2x4".parse::<BrickSize>(), Ok(BrickSize::new(2, 4)));
        assert_eq!("4X1".parse::<BrickSize>(), Ok(BrickSize::new(1, 4)));
        assert!("2by4".parse::<BrickSize>().is_err());
        assert!("0x4".parse::<BrickSize>().is_err());
    }

    #[test]
    fn test_equality_ignores_metadata() {
        let mut a = Brick::new(1, 2, 3, 1, 2);
        let b = Brick::new(1, 2, 3, 1, 2).with_color(5);
        a.set_outer(true);
        assert_eq!(a, b);
        assert_ne!(a, Brick::new(1, 2, 3, 2, 1));
    }

    #[test]
    fn test_cells() {
        let brick = Brick::new(0, 1, 2, 2, 3);
        let cells: Vec<_> = brick.cells().collect();
        assert_eq!(cells.len(), 6);
        assert!(cells.contains(&(1, 2)));
        assert!(cells.contains(&(2, 4)));
        assert!(brick.contains_cell(2, 4));
        assert!(!brick.contains_cell(3, 4));
    }

    #[test]
    fn test_lateral_neighbours() {
        let a = Brick::new(0, 0, 0, 2, 1);
        assert!(a.is_lateral_neighbour(&Brick::unit(0, 2, 0)));
        assert!(a.is_lateral_neighbour(&Brick::unit(0, 1, 1)));
        assert!(a.is_lateral_neighbour(&Brick::unit(0, 0, -1)));
        // Diagonal contact only
        assert!(!a.is_lateral_neighbour(&Brick::unit(0, 2, 1)));
        // Different level
        assert!(!a.is_lateral_neighbour(&Brick::unit(1, 2, 0)));
        // Itself
        assert!(!a.is_lateral_neighbour(&a));
    }

    #[test]
    fn test_vertical_connection() {
        let a = Brick::new(1, 0, 0, 2, 2);
        assert!(a.is_connected_to(&Brick::unit(0, 1, 1)));
        assert!(a.is_connected_to(&Brick::unit(2, 0, 0)));
        assert!(!a.is_connected_to(&Brick::unit(3, 0, 0)));
        assert!(!a.is_connected_to(&Brick::unit(1, 0, 0)));
        assert!(!a.is_connected_to(&Brick::unit(2, 2, 0)));
    }

    #[test]
    fn test_tiling() {
        let a = Brick::new(0, 0, 0, 1, 2);
        assert!(a.tiles_with(&Brick::new(0, 1, 0, 1, 2)));
        assert_eq!(a.bounding_rect(&Brick::new(0, 1, 0, 1, 2)), (0, 0, 2, 2));
        // L-shape leaves a gap
        assert!(!a.tiles_with(&Brick::unit(0, 1, 0)));
        // Overlap is never a tiling
        assert!(!a.tiles_with(&Brick::unit(0, 0, 1)));
    }
}
