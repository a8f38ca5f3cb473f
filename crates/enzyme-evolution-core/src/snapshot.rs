use crate::arbiter::CellStatus;
use crate::grid::GridDims;
use crate::metabolism::{Enzyme, Nutrient};
use crate::metrics::IntervalEfficiency;
use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock};

/// Read-only view of the arbiter's grid and statistics, for renderers.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ArbiterSnapshot {
    /// Increases by one with every publication.
    pub version: u64,
    pub clock: f64,
    pub dims: GridDims,
    /// Row-major.
    pub cells: Vec<CellStatus>,
    pub efficiencies: Vec<IntervalEfficiency>,
    pub target_nutrient: Nutrient,
    pub best_enzyme: Option<Enzyme>,
    pub best_efficiency: f64,
}

/// Shared slot holding the latest published snapshot. Cloning the handle shares the slot.
#[derive(Clone, Debug, Default)]
pub struct SnapshotHandle {
    latest: Arc<RwLock<Option<Arc<ArbiterSnapshot>>>>,
}

impl SnapshotHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, snapshot: ArbiterSnapshot) {
        let mut slot = self.latest.write().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(Arc::new(snapshot));
    }

    pub fn latest(&self) -> Option<Arc<ArbiterSnapshot>> {
        self.latest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
