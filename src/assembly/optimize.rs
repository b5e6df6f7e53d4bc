//! Auto-optimize - bounded merge/repair loop towards one stable component

use std::time::{Duration, Instant};

use super::merge::{MergeOptions, StrategyKind};
use super::model::BrickModel;

/// Outcome of [`BrickModel::auto_optimize`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OptimizeReport {
    pub elapsed: Duration,
    /// Strategy of the opening merge
    pub initial_strategy: StrategyKind,
    /// Rounds spent reducing the component count
    pub con_comp_iterations: usize,
    /// Rounds spent removing bad articulation points
    pub art_point_iterations: usize,
    pub component_count: usize,
    pub bad_articulation_count: usize,
    pub brick_count: usize,
}

impl OptimizeReport {
    /// One component and no weak point left
    pub fn is_ideal(&self) -> bool {
        self.component_count <= 1 && self.bad_articulation_count == 0
    }
}

impl BrickModel {
    /// Merge, then alternate splits and merges until the model is one
    /// component without bad articulation points or the iteration caps are
    /// spent. Falling short is reported, not an error.
    ///
    /// The opening merge uses max-connectivity only if the model has never
    /// been merged before.
    pub fn auto_optimize(&mut self) -> OptimizeReport {
        let start = Instant::now();
        let art_cap = self.config.max_optimize_steps;
        let con_cap = art_cap * 2;
        let first = self.next_merge_options();
        let refine = MergeOptions::refine().with_quota(self.quota_enforced);

        self.merge(first);

        let mut components = self.component_count();
        let mut min_components = components;
        let mut con_iterations = 0;
        while con_iterations < con_cap && (components > 1 || components > min_components) {
            self.split_con_comp();
            self.merge(refine);
            components = self.component_count();
            min_components = min_components.min(components);
            con_iterations += 1;
        }
        let mut total_con_iterations = con_iterations;

        let mut bad = self.bad_articulation_count();
        let mut art_iterations = 0;
        while bad > 0 && art_iterations < art_cap {
            self.split_bicon_comp();
            self.merge(refine);
            components = self.component_count();
            bad = self.bad_articulation_count();
            min_components = min_components.min(components);

            con_iterations = 0;
            while components > min_components && con_iterations < con_cap {
                self.split_con_comp();
                self.merge(refine);
                components = self.component_count();
                bad = self.bad_articulation_count();
                min_components = min_components.min(components);
                con_iterations += 1;
            }
            total_con_iterations += con_iterations;
            art_iterations += 1;
        }

        let report = OptimizeReport {
            elapsed: start.elapsed(),
            initial_strategy: first.strategy,
            con_comp_iterations: total_con_iterations,
            art_point_iterations: art_iterations,
            component_count: components,
            bad_articulation_count: bad,
            brick_count: self.graph.len(),
        };
        if report.is_ideal() {
            log::info!(
                "Optimized to {} bricks in {:.1?} ({} component rounds, {} articulation rounds)",
                report.brick_count,
                report.elapsed,
                report.con_comp_iterations,
                report.art_point_iterations
            );
        } else {
            log::warn!(
                "Optimization stopped with {} components and {} bad articulation points",
                report.component_count,
                report.bad_articulation_count
            );
        }
        report
    }
}
