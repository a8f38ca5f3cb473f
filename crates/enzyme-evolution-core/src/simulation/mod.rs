mod scheduler;

pub use scheduler::Scheduler;

use crate::arbiter::{Arbiter, CellStatus};
use crate::bacterium::{Bacterium, BacteriumError};
use crate::cell::{Cell, CellInput, CellOutput};
use crate::component::{Component, Event};
use crate::config::{SimConfig, SimConfigError};
use crate::grid::{CellAddress, GridDims};
use crate::message::CellMessage;
use crate::metrics::{PopulationSample, PopulationStats, RunSummary};
use crate::rng::{create_rng, derive_arbiter_rng, derive_cell_rng};
use crate::snapshot::SnapshotHandle;
use crate::stats::EfficiencyStats;
use rand::Rng;
use std::collections::BTreeMap;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimulationInitError {
    #[error(transparent)]
    Config(#[from] SimConfigError),
    #[error("seed bacterium could not be built: {0}")]
    Bacterium(#[from] BacteriumError),
    #[error("placement at {address} lies outside the {rows}x{columns} grid")]
    AddressOutsideGrid {
        address: CellAddress,
        rows: usize,
        columns: usize,
    },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExperimentError {
    #[error("sample_every must be positive and finite")]
    InvalidSampleEvery,
    #[error("until must be non-negative and finite")]
    InvalidUntil,
    #[error("sample count ({actual}) exceeds supported maximum ({max})")]
    TooManySamples { max: usize, actual: usize },
    #[error("until ({actual}) exceeds supported maximum ({max})")]
    TooLong { max: f64, actual: f64 },
}

/// The whole model: one [`Cell`] per grid slot, the [`Arbiter`], and the event loop routing
/// messages between them.
#[derive(Debug)]
pub struct Simulation {
    config: SimConfig,
    dims: GridDims,
    cells: Vec<Cell>,
    arbiter: Arbiter,
    scheduler: Scheduler,
    snapshots: SnapshotHandle,
    time: f64,
    started: bool,
    total_births: u64,
    total_deaths: u64,
}

impl Simulation {
    pub const MAX_EXPERIMENT_SAMPLES: usize = 100_000;
    pub const MAX_EXPERIMENT_TIME: f64 = 1_000_000.0;

    /// Build the grid and seed it: cells of the seed band are visited in row-major order and
    /// each receives a seed bacterium with `seed_placement_probability` until
    /// `seed_population` bacteria are placed.
    pub fn new(config: SimConfig) -> Result<Self, SimulationInitError> {
        config.validate()?;
        let seed_agent = config.seed_agent.build()?;
        let dims = config.dims();
        let mut rng = create_rng(config.seed);
        let mut remaining = config.seed_population;
        let mut placements = Vec::new();
        for address in dims.addresses() {
            if remaining == 0 {
                break;
            }
            if config.nutrient_band(address.column) != config.seed_nutrient_index {
                continue;
            }
            if rng.random_bool(config.seed_placement_probability) {
                placements.push((address, seed_agent.clone()));
                remaining -= 1;
            }
        }
        Self::build(config, placements)
    }

    /// Build the grid with bacteria at explicit addresses instead of random seeding.
    pub fn with_population(
        config: SimConfig,
        placements: impl IntoIterator<Item = (CellAddress, Bacterium)>,
    ) -> Result<Self, SimulationInitError> {
        config.validate()?;
        let dims = config.dims();
        let mut checked = Vec::new();
        for (address, bacterium) in placements {
            if !dims.contains(address) {
                return Err(SimulationInitError::AddressOutsideGrid {
                    address,
                    rows: dims.rows(),
                    columns: dims.columns(),
                });
            }
            checked.push((address, bacterium));
        }
        Self::build(config, checked)
    }

    fn build(
        config: SimConfig,
        placements: Vec<(CellAddress, Bacterium)>,
    ) -> Result<Self, SimulationInitError> {
        let dims = config.dims();
        let mut residents: Vec<Option<Bacterium>> = vec![None; dims.len()];
        for (address, bacterium) in placements {
            residents[dims.index(address)] = Some(bacterium);
        }

        let settings = config.cell_settings();
        let mut statuses = Vec::with_capacity(dims.len());
        let mut cells = Vec::with_capacity(dims.len());
        for (index, resident) in residents.into_iter().enumerate() {
            let address = dims.address(index);
            let nutrient = config.nutrient_at(address.column);
            statuses.push(CellStatus::new(nutrient, resident.is_some()));
            cells.push(Cell::new(
                address,
                dims,
                nutrient,
                resident,
                settings,
                derive_cell_rng(config.seed, index),
            ));
        }

        let snapshots = SnapshotHandle::new();
        let stats = EfficiencyStats::new(
            config.target_nutrient,
            config.max_samples,
            config.sampling_interval,
        );
        let arbiter = Arbiter::new(dims, statuses, stats, derive_arbiter_rng(config.seed))
            .with_publisher(snapshots.clone());

        Ok(Self {
            scheduler: Scheduler::new(dims.len() + 1),
            config,
            dims,
            cells,
            arbiter,
            snapshots,
            time: 0.0,
            started: false,
            total_births: 0,
            total_deaths: 0,
        })
    }

    fn arbiter_slot(&self) -> usize {
        self.cells.len()
    }

    /// Deliver the start signal to every cell at the current time. Only the first call has an
    /// effect.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        info!(
            rows = self.dims.rows(),
            columns = self.dims.columns(),
            seeded = self.alive_count(),
            seed = self.config.seed,
            "simulation started"
        );
        for index in 0..self.cells.len() {
            self.deliver_to_cell(index, vec![CellInput::Start]);
        }
    }

    /// Deliver `input` to the cell at `address` as an external event at the current time.
    pub fn inject(&mut self, address: CellAddress, input: CellInput) {
        let index = self.dims.index(address);
        self.deliver_to_cell(index, vec![input]);
    }

    fn deliver_to_cell(&mut self, index: usize, inputs: Vec<CellInput>) {
        let elapsed = self.scheduler.elapsed(index, self.time);
        let cell = &mut self.cells[index];
        cell.apply(Event::External { elapsed, inputs });
        self.scheduler.schedule(index, self.time, cell.time_advance());
    }

    /// Time of the next pending event.
    pub fn next_event_time(&mut self) -> Option<f64> {
        self.scheduler.next_time()
    }

    /// Process every event due at the earliest pending time. Returns that time, or `None` when
    /// every component is passive.
    pub fn step(&mut self) -> Option<f64> {
        let now = self.scheduler.next_time()?;
        self.time = now;
        let arbiter_slot = self.arbiter_slot();
        let imminent = self.scheduler.take_imminent(now);

        // Outputs first, from the pre-transition states.
        let mut cell_inputs: BTreeMap<usize, Vec<CellInput>> = BTreeMap::new();
        let mut arbiter_inputs: Vec<CellMessage> = Vec::new();
        for &slot in &imminent {
            if slot == arbiter_slot {
                for response in self.arbiter.output() {
                    let target = self.dims.index(response.address);
                    cell_inputs
                        .entry(target)
                        .or_default()
                        .push(CellInput::Response(response));
                }
                continue;
            }
            for output in self.cells[slot].output() {
                match output {
                    CellOutput::Status(message) => {
                        if let CellMessage::RestStatus(status) = &message {
                            if status.reports_death() {
                                self.total_deaths += 1;
                            }
                        }
                        arbiter_inputs.push(message);
                    }
                    CellOutput::Child { direction, message } => {
                        debug!(
                            from = %self.cells[slot].address(),
                            %direction,
                            to = %message.destination,
                            "child sent"
                        );
                        self.total_births += 1;
                        let target = self.dims.index(message.destination);
                        cell_inputs
                            .entry(target)
                            .or_default()
                            .push(CellInput::Child(message));
                    }
                }
            }
        }

        // Then transitions: internal or confluent for imminents, external for the rest.
        let mut arbiter_inputs = Some(arbiter_inputs).filter(|m| !m.is_empty());
        for &slot in &imminent {
            if slot == arbiter_slot {
                let event = match arbiter_inputs.take() {
                    Some(inputs) => Event::Confluent { inputs },
                    None => Event::Internal,
                };
                self.arbiter.apply(event);
                self.scheduler
                    .schedule(slot, now, self.arbiter.time_advance());
            } else {
                let event = match cell_inputs.remove(&slot) {
                    Some(inputs) => Event::Confluent { inputs },
                    None => Event::Internal,
                };
                let cell = &mut self.cells[slot];
                cell.apply(event);
                self.scheduler.schedule(slot, now, cell.time_advance());
            }
        }
        for (slot, inputs) in cell_inputs {
            self.deliver_to_cell(slot, inputs);
        }
        if let Some(inputs) = arbiter_inputs {
            let elapsed = self.scheduler.elapsed(arbiter_slot, now);
            self.arbiter.apply(Event::External { elapsed, inputs });
            self.scheduler
                .schedule(arbiter_slot, now, self.arbiter.time_advance());
        }
        Some(now)
    }

    /// Process every event up to and including `until`, then advance the clock to `until`.
    /// Returns the number of distinct event times processed.
    pub fn run_until(&mut self, until: f64) -> usize {
        let mut instants = 0;
        while self
            .scheduler
            .next_time()
            .is_some_and(|next| next <= until)
        {
            self.step();
            instants += 1;
        }
        if until > self.time {
            self.time = until;
        }
        instants
    }

    /// Start (if needed) and run to `until`, sampling the population every `sample_every`
    /// time units and once more at the end.
    pub fn run_experiment(
        &mut self,
        until: f64,
        sample_every: f64,
    ) -> Result<RunSummary, ExperimentError> {
        if !(sample_every.is_finite() && sample_every > 0.0) {
            return Err(ExperimentError::InvalidSampleEvery);
        }
        if !(until.is_finite() && until >= 0.0) {
            return Err(ExperimentError::InvalidUntil);
        }
        // The ratio may be infinite for extreme inputs; the cast below saturates.
        let estimated = (until / sample_every).ceil() + 1.0;
        if estimated > Self::MAX_EXPERIMENT_SAMPLES as f64 {
            return Err(ExperimentError::TooManySamples {
                max: Self::MAX_EXPERIMENT_SAMPLES,
                actual: estimated as usize,
            });
        }
        if until > Self::MAX_EXPERIMENT_TIME {
            return Err(ExperimentError::TooLong {
                max: Self::MAX_EXPERIMENT_TIME,
                actual: until,
            });
        }
        let estimated_samples = estimated as usize;

        self.start();
        let mut samples = Vec::with_capacity(estimated_samples);
        let mut k = 1u64;
        loop {
            let checkpoint = (k as f64 * sample_every).min(until);
            self.run_until(checkpoint);
            samples.push(self.sample());
            if checkpoint >= until {
                break;
            }
            k += 1;
        }

        let stats = self.arbiter.stats();
        let summary = RunSummary {
            schema_version: 1,
            seed: self.config.seed,
            end_time: self.time,
            sample_every,
            final_alive_count: self.alive_count(),
            samples,
            total_births: self.total_births,
            total_deaths: self.total_deaths,
            efficiency_window: stats.window().iter().copied().collect(),
            best_enzyme: stats.best_enzyme(),
            best_efficiency: stats.best_efficiency(),
            first_functional_time: stats.first_functional().map(|f| f.time),
            peak_average_efficiency: stats.peak_average(),
            peak_interval: stats.peak_interval(),
        };
        info!(
            end_time = summary.end_time,
            alive = summary.final_alive_count,
            births = summary.total_births,
            deaths = summary.total_deaths,
            best_efficiency = summary.best_efficiency,
            "simulation finished"
        );
        Ok(summary)
    }

    fn sample(&self) -> PopulationSample {
        let stats = self.arbiter.stats();
        PopulationSample {
            time: self.time,
            alive_count: self.alive_count(),
            births: self.total_births,
            deaths: self.total_deaths,
            occupied_slots: self.arbiter.occupied_count(),
            latest_average_efficiency: stats.latest_average(),
            best_efficiency: stats.best_efficiency(),
        }
    }

    pub fn alive_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_occupied()).count()
    }

    pub fn population_stats(&self) -> PopulationStats {
        PopulationStats {
            population_size: self.cells.len(),
            alive_count: self.alive_count(),
            total_births: self.total_births,
            total_deaths: self.total_deaths,
        }
    }

    /// Handle to the arbiter's published snapshots; stays valid for the simulation's lifetime.
    pub fn snapshots(&self) -> SnapshotHandle {
        self.snapshots.clone()
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn dims(&self) -> GridDims {
        self.dims
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn cell(&self, address: CellAddress) -> &Cell {
        &self.cells[self.dims.index(address)]
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn arbiter(&self) -> &Arbiter {
        &self.arbiter
    }
}
