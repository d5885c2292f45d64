use beamdesign_core::models::StrategyKind;

use super::problem::{Attempt, Bounds, Budget, Problem};

/// One way of searching for the minimum-volume passing section
pub trait OptimizationStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Search box for this strategy
    fn bounds(&self, problem: &Problem<'_>) -> Bounds;

    /// Run within `budget`; never panics on awkward inputs
    fn attempt(&self, problem: &Problem<'_>, bounds: &Bounds, budget: &Budget) -> Attempt;
}
