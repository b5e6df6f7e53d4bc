//! Legal brick footprints and the colour palette

use std::collections::BTreeSet;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::brick::BrickSize;

/// Side lengths available for both 1-wide and 2-wide bricks
const CLASSIC_LENGTHS: [i32; 6] = [1, 2, 3, 4, 6, 8];

/// Set of footprints a merge or cut is allowed to produce.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrickCatalog {
    footprints: BTreeSet<BrickSize>,
}

impl BrickCatalog {
    /// Build a catalog from arbitrary footprints (normalized on insert)
    pub fn new(footprints: impl IntoIterator<Item = BrickSize>) -> Self {
        Self {
            footprints: footprints
                .into_iter()
                .map(|s| BrickSize::new(s.width, s.length))
                .collect(),
        }
    }

    /// 1x{1,2,3,4,6,8} and 2x{2,3,4,6,8}
    pub fn classic() -> Self {
        let mut footprints = BTreeSet::new();
        for length in CLASSIC_LENGTHS {
            footprints.insert(BrickSize::new(1, length));
            if length > 1 {
                footprints.insert(BrickSize::new(2, length));
            }
        }
        Self { footprints }
    }

    pub fn contains(&self, size: BrickSize) -> bool {
        self.footprints.contains(&size)
    }

    /// Convenience for un-normalized side lengths
    pub fn allows(&self, size_x: i32, size_y: i32) -> bool {
        self.contains(BrickSize::new(size_x, size_y))
    }

    pub fn iter(&self) -> impl Iterator<Item = BrickSize> + '_ {
        self.footprints.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.footprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.footprints.is_empty()
    }
}

impl Default for BrickCatalog {
    fn default() -> Self {
        Self::classic()
    }
}

/// Named palette entry, RGB in 0..1
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaletteColor {
    pub name: String,
    pub rgb: Vec3,
}

impl PaletteColor {
    pub fn new(name: impl Into<String>, r: f32, g: f32, b: f32) -> Self {
        Self {
            name: name.into(),
            rgb: Vec3::new(r, g, b),
        }
    }
}

/// Ordered list of brick colours; bricks refer to entries by index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    colors: Vec<PaletteColor>,
}

impl Palette {
    pub fn new(colors: Vec<PaletteColor>) -> Self {
        Self { colors }
    }

    /// The nine classic brick colours
    pub fn classic() -> Self {
        Self::new(vec![
            PaletteColor::new("white", 0.95, 0.95, 0.95),
            PaletteColor::new("black", 0.15, 0.15, 0.15),
            PaletteColor::new("bright red", 1.0, 0.0, 0.0),
            PaletteColor::new("bright blue", 0.0, 0.0, 1.0),
            PaletteColor::new("dark green", 14.0 / 255.0, 132.0 / 255.0, 36.0 / 255.0),
            PaletteColor::new("lime", 180.0 / 255.0, 1.0, 0.0),
            PaletteColor::new("bright yellow", 1.0, 1.0, 0.0),
            PaletteColor::new("bright orange", 1.0, 110.0 / 255.0, 0.0),
            PaletteColor::new("reddish brown", 118.0 / 255.0, 45.0 / 255.0, 28.0 / 255.0),
        ])
    }

    pub fn get(&self, id: usize) -> Option<&PaletteColor> {
        self.colors.get(id)
    }

    /// Index of the palette entry closest to `rgb` (squared distance)
    pub fn closest(&self, rgb: Vec3) -> Option<usize> {
        self.colors
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                a.rgb
                    .distance_squared(rgb)
                    .total_cmp(&b.rgb.distance_squared(rgb))
            })
            .map(|(id, _)| id)
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PaletteColor> {
        self.colors.iter()
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::classic()
    }
}
