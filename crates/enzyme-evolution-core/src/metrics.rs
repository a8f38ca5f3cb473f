use crate::metabolism::Enzyme;
use serde::{Deserialize, Serialize};

/// Running mean of the target-nutrient efficiency within one sampling interval.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntervalEfficiency {
    pub interval: i64,
    pub mean: f64,
    pub samples: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct PopulationSample {
    pub time: f64,
    pub alive_count: usize,
    pub births: u64,
    pub deaths: u64,
    /// Slots the arbiter considers taken, reservations included.
    pub occupied_slots: usize,
    pub latest_average_efficiency: Option<f64>,
    pub best_efficiency: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct PopulationStats {
    pub population_size: usize,
    pub alive_count: usize,
    pub total_births: u64,
    pub total_deaths: u64,
}

fn default_schema_version() -> u32 {
    1
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub seed: u64,
    pub end_time: f64,
    pub sample_every: f64,
    pub final_alive_count: usize,
    pub samples: Vec<PopulationSample>,
    #[serde(default)]
    pub total_births: u64,
    #[serde(default)]
    pub total_deaths: u64,
    #[serde(default)]
    pub efficiency_window: Vec<IntervalEfficiency>,
    #[serde(default)]
    pub best_enzyme: Option<Enzyme>,
    #[serde(default)]
    pub best_efficiency: f64,
    #[serde(default)]
    pub first_functional_time: Option<f64>,
    #[serde(default)]
    pub peak_average_efficiency: f64,
    #[serde(default)]
    pub peak_interval: Option<i64>,
}
