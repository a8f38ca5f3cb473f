use crate::component::{Component, PASSIVE};
use crate::grid::{CellAddress, Direction, GridDims};
use crate::message::{CellMessage, FeedStatus, QueryResponse, RestStatus};
use crate::metabolism::Nutrient;
use crate::snapshot::{ArbiterSnapshot, SnapshotHandle};
use crate::stats::EfficiencyStats;
use rand::Rng;
use rand_chacha::ChaCha12Rng;
use serde::Serialize;
use std::collections::VecDeque;
use tracing::{debug, trace};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArbiterPhase {
    Passive,
    Processing,
    SendResponse,
}

/// The arbiter's view of one slot.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CellStatus {
    /// True while a bacterium lives there or a child is on its way.
    pub occupied: bool,
    pub nutrient: Nutrient,
    /// Remaining lifespan fraction reported by the last rest status.
    pub lifespan_ratio: f64,
}

impl CellStatus {
    pub fn new(nutrient: Nutrient, occupied: bool) -> Self {
        Self {
            occupied,
            nutrient,
            lifespan_ratio: if occupied { 1.0 } else { 0.0 },
        }
    }
}

/// Serializes occupancy decisions and keeps efficiency statistics.
///
/// Messages are handled strictly in arrival order, one per zero-length processing step, so two
/// cells asking for the same free neighbor are answered one after the other and the second sees
/// the first one's reservation.
#[derive(Debug)]
pub struct Arbiter {
    dims: GridDims,
    cells: Vec<CellStatus>,
    queue: VecDeque<CellMessage>,
    phase: ArbiterPhase,
    sigma: f64,
    clock: f64,
    pending_response: Option<QueryResponse>,
    stats: EfficiencyStats,
    rng: ChaCha12Rng,
    publisher: Option<SnapshotHandle>,
    version: u64,
}

impl Arbiter {
    /// `cells` is the initial occupancy in row-major order.
    pub fn new(
        dims: GridDims,
        cells: Vec<CellStatus>,
        stats: EfficiencyStats,
        rng: ChaCha12Rng,
    ) -> Self {
        assert_eq!(cells.len(), dims.len(), "one status per grid slot");
        Self {
            dims,
            cells,
            queue: VecDeque::new(),
            phase: ArbiterPhase::Passive,
            sigma: PASSIVE,
            clock: 0.0,
            pending_response: None,
            stats,
            rng,
            publisher: None,
            version: 0,
        }
    }

    /// Publish a snapshot to `handle` whenever a feed report is recorded.
    pub fn with_publisher(mut self, handle: SnapshotHandle) -> Self {
        self.publisher = Some(handle);
        self
    }

    pub fn phase(&self) -> ArbiterPhase {
        self.phase
    }

    pub fn clock(&self) -> f64 {
        self.clock
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn dims(&self) -> GridDims {
        self.dims
    }

    pub fn cell_status(&self, address: CellAddress) -> &CellStatus {
        &self.cells[self.dims.index(address)]
    }

    pub fn cells(&self) -> &[CellStatus] {
        &self.cells
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|c| c.occupied).count()
    }

    pub fn stats(&self) -> &EfficiencyStats {
        &self.stats
    }

    pub fn snapshot(&self) -> ArbiterSnapshot {
        ArbiterSnapshot {
            version: self.version,
            clock: self.clock,
            dims: self.dims,
            cells: self.cells.clone(),
            efficiencies: self.stats.window().iter().copied().collect(),
            target_nutrient: self.stats.target(),
            best_enzyme: self.stats.best_enzyme(),
            best_efficiency: self.stats.best_efficiency(),
        }
    }

    fn hold_in(&mut self, phase: ArbiterPhase, sigma: f64) {
        self.phase = phase;
        self.sigma = sigma;
    }

    fn drain_or_rest(&mut self) {
        if self.queue.is_empty() {
            self.hold_in(ArbiterPhase::Passive, PASSIVE);
        } else {
            self.hold_in(ArbiterPhase::Processing, 0.0);
        }
    }

    fn process_next(&mut self) {
        let Some(message) = self.queue.pop_front() else {
            panic!(
                "arbiter entered processing at t={} with no queued message",
                self.clock
            );
        };
        match message {
            CellMessage::Query(query) => {
                let response = self.grant(query.address);
                self.pending_response = Some(response);
                self.hold_in(ArbiterPhase::SendResponse, 0.0);
            }
            CellMessage::RestStatus(status) => {
                self.record_rest(&status);
                self.drain_or_rest();
            }
            CellMessage::FeedStatus(status) => {
                self.record_feed(&status);
                self.drain_or_rest();
            }
        }
    }

    /// Pick a free neighbor of `address` at random and reserve it.
    fn grant(&mut self, address: CellAddress) -> QueryResponse {
        let free: Vec<(Direction, CellAddress)> = self
            .dims
            .neighbors(address)
            .into_iter()
            .filter(|&(_, n)| !self.cells[self.dims.index(n)].occupied)
            .collect();
        if free.is_empty() {
            trace!(cell = %address, "no free neighbor");
            return QueryResponse {
                address,
                direction: None,
            };
        }
        let (direction, target) = free[self.rng.random_range(0..free.len())];
        let index = self.dims.index(target);
        self.cells[index].occupied = true;
        debug!(cell = %address, %direction, slot = %target, "reserved slot for child");
        QueryResponse {
            address,
            direction: Some(direction),
        }
    }

    fn record_rest(&mut self, status: &RestStatus) {
        let index = self.dims.index(status.address);
        let cell = &mut self.cells[index];
        if status.reports_death() {
            cell.occupied = false;
            cell.lifespan_ratio = 0.0;
        } else {
            cell.lifespan_ratio = status.lifespan_ratio();
        }
    }

    fn record_feed(&mut self, status: &FeedStatus) {
        if self.stats.record(self.clock, status) {
            if let Some(handle) = &self.publisher {
                self.version += 1;
                handle.publish(self.snapshot());
            }
        }
    }
}

impl Component for Arbiter {
    type Input = CellMessage;
    type Output = QueryResponse;

    fn time_advance(&self) -> f64 {
        self.sigma
    }

    fn output(&self) -> Vec<QueryResponse> {
        match (self.phase, self.pending_response) {
            (ArbiterPhase::SendResponse, Some(response)) => vec![response],
            _ => Vec::new(),
        }
    }

    fn internal_transition(&mut self) {
        self.clock += self.sigma;
        match self.phase {
            ArbiterPhase::Processing => self.process_next(),
            ArbiterPhase::SendResponse => {
                self.pending_response = None;
                self.drain_or_rest();
            }
            ArbiterPhase::Passive => {}
        }
    }

    fn external_transition(&mut self, elapsed: f64, inputs: Vec<CellMessage>) {
        self.clock += elapsed;
        self.sigma -= elapsed;
        if inputs.is_empty() {
            return;
        }
        self.queue.extend(inputs);
        if self.phase == ArbiterPhase::Passive {
            self.hold_in(ArbiterPhase::Processing, 0.0);
        }
    }
}
