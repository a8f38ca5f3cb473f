use crate::bacterium::Bacterium;
use crate::component::{Component, PASSIVE};
use crate::genome::{Genome, MutationRates};
use crate::grid::{CellAddress, Direction, GridDims};
use crate::message::{
    CellMessage, ChildMessage, FeedStatus, QueryMessage, QueryResponse, RestStatus,
};
use crate::metabolism::{MetabolysisResult, Nutrient};
use rand_chacha::ChaCha12Rng;
use serde::Serialize;
use tracing::{debug, trace};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CellPhase {
    Feed,
    SendFeedStatus,
    Rest,
    SendRestStatus,
    Query,
    WaitResponse,
    Reproduce,
    SendChild,
    Dead,
}

#[derive(Clone, Debug, PartialEq)]
pub enum CellInput {
    /// Kick off the lifecycle of a seeded bacterium.
    Start,
    Child(ChildMessage),
    Response(QueryResponse),
}

#[derive(Clone, Debug, PartialEq)]
pub enum CellOutput {
    /// Goes to the arbiter.
    Status(CellMessage),
    /// Goes to the neighbor in `direction`.
    Child {
        direction: Direction,
        message: ChildMessage,
    },
}

/// Timing and mutation parameters shared by every cell. Built by
/// [`SimConfig::cell_settings`](crate::config::SimConfig::cell_settings) after validation, or
/// taken from `Default`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellSettings {
    /// Hold time of the feed, rest and reproduce phases; positive.
    pub(crate) phase_delay: f64,
    pub(crate) mutation_rates: MutationRates,
}

impl Default for CellSettings {
    fn default() -> Self {
        Self {
            phase_delay: 1.0,
            mutation_rates: MutationRates::default(),
        }
    }
}

/// One grid slot and the lifecycle of the bacterium living in it.
///
/// ```text
/// Dead --start--> Rest --> SendRestStatus --> Feed --> SendFeedStatus --> Rest ...
///                              |
///                              +--> Query --> WaitResponse --> Reproduce --> SendChild --> Rest
///                              +--> Dead
/// ```
#[derive(Clone, Debug)]
pub struct Cell {
    address: CellAddress,
    dims: GridDims,
    nutrient: Nutrient,
    parent_nutrient: Nutrient,
    bacterium: Option<Bacterium>,
    phase: CellPhase,
    sigma: f64,
    child_genome: Option<Genome>,
    metabolysis: Option<MetabolysisResult>,
    response: Option<QueryResponse>,
    settings: CellSettings,
    rng: ChaCha12Rng,
}

impl Cell {
    /// A new cell is `Dead` and passive even when it holds a bacterium; it waits for
    /// [`CellInput::Start`].
    pub fn new(
        address: CellAddress,
        dims: GridDims,
        nutrient: Nutrient,
        bacterium: Option<Bacterium>,
        settings: CellSettings,
        rng: ChaCha12Rng,
    ) -> Self {
        Self {
            address,
            dims,
            nutrient,
            parent_nutrient: nutrient,
            bacterium,
            phase: CellPhase::Dead,
            sigma: PASSIVE,
            child_genome: None,
            metabolysis: None,
            response: None,
            settings,
            rng,
        }
    }

    pub fn address(&self) -> CellAddress {
        self.address
    }

    pub fn nutrient(&self) -> Nutrient {
        self.nutrient
    }

    pub fn parent_nutrient(&self) -> Nutrient {
        self.parent_nutrient
    }

    pub fn bacterium(&self) -> Option<&Bacterium> {
        self.bacterium.as_ref()
    }

    pub fn is_occupied(&self) -> bool {
        self.bacterium.is_some()
    }

    pub fn phase(&self) -> CellPhase {
        self.phase
    }

    fn hold_in(&mut self, phase: CellPhase, sigma: f64) {
        self.phase = phase;
        self.sigma = sigma;
    }

    fn die(&mut self) {
        self.bacterium = None;
        self.child_genome = None;
        self.response = None;
        self.hold_in(CellPhase::Dead, PASSIVE);
    }

    fn adopt(&mut self, child: ChildMessage) {
        if child.destination != self.address {
            trace!(cell = %self.address, to = %child.destination, "ignoring misaddressed child");
            return;
        }
        debug!(cell = %self.address, genome = %child.genome, "child settled");
        self.bacterium = Some(Bacterium::from_genome(child.genome));
        self.parent_nutrient = child.origin_nutrient;
        self.hold_in(CellPhase::Rest, 0.0);
    }

    fn answer(&mut self, response: QueryResponse) {
        if response.address != self.address {
            trace!(cell = %self.address, to = %response.address, "ignoring misaddressed response");
            return;
        }
        let delay = self.settings.phase_delay;
        if response.granted().is_some() {
            self.response = Some(response);
            self.hold_in(CellPhase::Reproduce, delay);
        } else {
            self.response = None;
            self.hold_in(CellPhase::Rest, delay);
        }
    }
}

impl Component for Cell {
    type Input = CellInput;
    type Output = CellOutput;

    fn time_advance(&self) -> f64 {
        self.sigma
    }

    fn output(&self) -> Vec<CellOutput> {
        let status = |message| vec![CellOutput::Status(message)];
        match self.phase {
            CellPhase::SendRestStatus => match &self.bacterium {
                Some(b) => status(CellMessage::RestStatus(RestStatus::of(self.address, b))),
                None => Vec::new(),
            },
            CellPhase::SendFeedStatus => status(CellMessage::FeedStatus(FeedStatus {
                address: self.address,
                result: self.metabolysis,
                parent_nutrient: self.parent_nutrient,
            })),
            CellPhase::Query => status(CellMessage::Query(QueryMessage {
                address: self.address,
            })),
            CellPhase::SendChild => {
                let direction = self.response.and_then(|r| r.granted());
                match (direction, &self.child_genome) {
                    (Some(direction), Some(genome)) => vec![CellOutput::Child {
                        direction,
                        message: ChildMessage {
                            destination: self.dims.neighbor(self.address, direction),
                            genome: genome.clone(),
                            origin_nutrient: self.nutrient,
                        },
                    }],
                    _ => Vec::new(),
                }
            }
            CellPhase::Feed
            | CellPhase::Rest
            | CellPhase::WaitResponse
            | CellPhase::Reproduce
            | CellPhase::Dead => Vec::new(),
        }
    }

    fn internal_transition(&mut self) {
        let delay = self.settings.phase_delay;
        let phase = self.phase;
        if phase == CellPhase::Dead {
            return;
        }
        let Some(bacterium) = self.bacterium.as_mut() else {
            // Every phase other than Dead implies a resident bacterium.
            self.die();
            return;
        };
        match phase {
            CellPhase::Rest => {
                bacterium.rest();
                self.hold_in(CellPhase::SendRestStatus, 0.0);
            }
            CellPhase::SendRestStatus => {
                if bacterium.is_dead() {
                    debug!(cell = %self.address, "bacterium died");
                    self.die();
                } else if bacterium.can_reproduce() {
                    self.hold_in(CellPhase::Query, 0.0);
                } else {
                    self.hold_in(CellPhase::Feed, delay);
                }
            }
            CellPhase::Feed => {
                self.metabolysis = bacterium.feed(self.nutrient);
                self.hold_in(CellPhase::SendFeedStatus, 0.0);
            }
            CellPhase::SendFeedStatus => self.hold_in(CellPhase::Rest, delay),
            CellPhase::Query => self.hold_in(CellPhase::WaitResponse, PASSIVE),
            CellPhase::Reproduce => {
                let rates = self.settings.mutation_rates;
                self.child_genome = Some(bacterium.reproduce(&mut self.rng, &rates));
                self.hold_in(CellPhase::SendChild, 0.0);
            }
            CellPhase::SendChild => {
                self.child_genome = None;
                self.response = None;
                self.hold_in(CellPhase::Rest, delay);
            }
            CellPhase::WaitResponse | CellPhase::Dead => {}
        }
    }

    fn external_transition(&mut self, elapsed: f64, inputs: Vec<CellInput>) {
        self.sigma -= elapsed;
        for input in inputs {
            match (self.phase, input) {
                (CellPhase::Dead, CellInput::Start) => {
                    if self.bacterium.is_some() {
                        self.hold_in(CellPhase::Rest, self.settings.phase_delay);
                    }
                }
                (CellPhase::Dead, CellInput::Child(child)) => self.adopt(child),
                (CellPhase::WaitResponse, CellInput::Response(response)) => self.answer(response),
                (phase, input) => {
                    trace!(cell = %self.address, ?phase, ?input, "input ignored in this phase");
                }
            }
        }
    }
}
