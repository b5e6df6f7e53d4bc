//! Model statistics for reports and the command line driver

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::brick::BrickSize;
use crate::brick::dimensions;

use super::model::BrickModel;

/// Brick counts of one colour
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ColorStats {
    pub name: String,
    pub total: usize,
    pub types: BTreeMap<String, usize>,
}

/// Snapshot of a model's size and structural health
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ModelStats {
    pub brick_count: usize,
    pub level_count: i32,
    /// Live bricks per footprint, keyed `"WxL"`
    pub types: BTreeMap<String, usize>,
    /// Per-colour breakdown, empty when the model has a single colour
    pub colors: Vec<ColorStats>,
    pub component_count: usize,
    pub bad_articulation_count: usize,
    pub height_cm: f32,
}

impl BrickModel {
    /// Collect statistics, refreshing connectivity if needed
    pub fn stats(&mut self) -> ModelStats {
        self.ensure_connectivity();

        let mut per_color: BTreeMap<usize, BTreeMap<BrickSize, usize>> = BTreeMap::new();
        for (_, brick) in self.graph.bricks() {
            *per_color
                .entry(brick.color_id())
                .or_default()
                .entry(brick.size())
                .or_insert(0) += 1;
        }

        let colors = if per_color.len() > 1 {
            per_color
                .iter()
                .map(|(&color, types)| ColorStats {
                    name: self
                        .config
                        .palette
                        .get(color)
                        .map(|c| c.name.clone())
                        .unwrap_or_else(|| format!("color {}", color)),
                    total: types.values().sum(),
                    types: types.iter().map(|(size, n)| (size.to_string(), *n)).collect(),
                })
                .collect()
        } else {
            Vec::new()
        };

        ModelStats {
            brick_count: self.graph.len(),
            level_count: self.graph.level_count(),
            types: self
                .graph
                .type_counts()
                .iter()
                .map(|(size, n)| (size.to_string(), *n))
                .collect(),
            colors,
            component_count: self.graph.component_count(),
            bad_articulation_count: self.graph.bad_articulation_count(),
            height_cm: dimensions::stack_height_cm(self.graph.level_count()),
        }
    }
}

impl ModelStats {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for ModelStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Bricks:      {}", self.brick_count)?;
        writeln!(f, "Levels:      {} ({:.2} cm)", self.level_count, self.height_cm)?;
        writeln!(f, "Components:  {}", self.component_count)?;
        writeln!(f, "Weak points: {}", self.bad_articulation_count)?;
        writeln!(f, "Brick types:")?;
        for (size, count) in &self.types {
            writeln!(f, "  {:>5}  {}", size, count)?;
        }
        for color in &self.colors {
            writeln!(f, "{} ({}):", color.name, color.total)?;
            for (size, count) in &color.types {
                writeln!(f, "  {:>5}  {}", size, count)?;
            }
        }
        Ok(())
    }
}
