//! Hollowing - remove interior bricks without weakening the structure

use std::time::{Duration, Instant};

use crate::brick::BrickId;
use crate::core::{Error, Result};
use crate::graph::{RING_DEPTH, ScratchGraph};

use super::model::BrickModel;

/// Outcome of a hollowing pass
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HollowReport {
    pub removed: usize,
    pub remaining: usize,
    pub elapsed: Duration,
    /// No voxel could hold the full shell cube, nothing was removable
    pub shell_too_thick: bool,
}

impl BrickModel {
    /// Remove every voxel whose surrounding cube of half-side `shell` is
    /// completely filled, leaving a shell `shell` voxels thick.
    ///
    /// Works on the voxel grid, so it must run before the first merge. The
    /// grid is released afterwards.
    pub fn pre_hollow(&mut self, shell: i32) -> Result<HollowReport> {
        if shell < 1 {
            return Err(Error::InvalidShellThickness(shell));
        }
        let start = Instant::now();
        let grid = self.grid()?;

        let span = 2 * shell + 1;
        let shell_too_thick = span > grid.height().min(grid.width()).min(grid.depth());
        let interior: Vec<BrickId> = self
            .graph
            .bricks()
            .filter(|(_, b)| grid.is_cube_filled(b.level(), b.pos_x(), b.pos_y(), shell))
            .map(|(id, _)| id)
            .collect();

        for &id in &interior {
            self.graph.remove_brick(id);
        }
        self.release_grid();
        self.graph.refresh_connectivity();

        let report = HollowReport {
            removed: interior.len(),
            remaining: self.graph.len(),
            elapsed: start.elapsed(),
            shell_too_thick,
        };
        if shell_too_thick {
            log::warn!("Shell thickness {} is too large for the model, nothing hollowed", shell);
        } else {
            log::info!(
                "Pre-hollow: removed {} voxels, {} remain ({:.1?})",
                report.removed,
                report.remaining,
                report.elapsed
            );
        }
        Ok(report)
    }

    /// Remove random inner bricks whose removal keeps the local connectivity.
    ///
    /// Stops after as many consecutive refusals as there are inner bricks.
    pub fn post_hollow(&mut self) -> HollowReport {
        let start = Instant::now();
        let mut removed = 0;
        let mut failures = 0;

        while failures < self.graph.inner_pool().len() {
            let Some(id) = self.graph.inner_pool().choose(&mut self.rng) else {
                break;
            };
            if self.can_remove_brick(id) {
                self.graph.remove_brick(id);
                removed += 1;
                failures = 0;
            } else {
                failures += 1;
            }
        }

        self.graph.refresh_connectivity();
        let report = HollowReport {
            removed,
            remaining: self.graph.len(),
            elapsed: start.elapsed(),
            shell_too_thick: false,
        };
        log::info!(
            "Post-hollow: removed {} bricks, {} remain ({:.1?})",
            report.removed,
            report.remaining,
            report.elapsed
        );
        report
    }

    /// True if removing the brick increases neither the connected nor the
    /// biconnected component count of its neighbourhood
    pub fn can_remove_brick(&self, id: BrickId) -> bool {
        if !self.graph.contains(id) {
            return false;
        }
        let mut scratch = ScratchGraph::around(&self.graph, id, RING_DEPTH);
        let before = scratch.counts();
        if let Some(center) = scratch.local_of(id) {
            scratch.remove_vertex(center);
        }
        scratch.counts().is_no_worse_than(&before)
    }
}
