use crate::bacterium::{Bacterium, BacteriumError};
use crate::cell::CellSettings;
use crate::constants::MAX_GRID_EXTENT;
use crate::genome::{MutationRates, MutationRatesError};
use crate::grid::GridDims;
use crate::metabolism::{Enzyme, Nutrient};
use serde::{Deserialize, Serialize};

const DEFAULT_BAND_NUTRIENTS: [&str; 2] = ["1100011011000111", "0011100100111000"];
const DEFAULT_SEED_ENZYME: &str = "0011100100111000";

fn nutrient(text: &str) -> Nutrient {
    Nutrient::parse(text).unwrap_or_else(|e| panic!("built-in nutrient {text:?} is invalid: {e}"))
}

/// Traits of every bacterium placed at startup.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SeedAgentConfig {
    /// Rest cycles before death (1..=255).
    pub lifespan: u32,
    /// Starting energy (1..=65535).
    pub free_energy: u32,
    /// Energy at which the bacterium tries to reproduce (1..=65535).
    pub reproduction_threshold: u32,
    /// Energy paid per enzyme per rest cycle (1..=255).
    pub metabolic_cost: u32,
    /// Ordered enzyme set; each at most 16 bits.
    pub enzymes: Vec<Enzyme>,
}

impl Default for SeedAgentConfig {
    fn default() -> Self {
        Self {
            lifespan: 20,
            free_energy: 20000,
            reproduction_threshold: 50000,
            metabolic_cost: 255,
            enzymes: vec![Enzyme::parse(DEFAULT_SEED_ENZYME)
                .unwrap_or_else(|e| panic!("built-in seed enzyme is invalid: {e}"))],
        }
    }
}

impl SeedAgentConfig {
    pub fn build(&self) -> Result<Bacterium, BacteriumError> {
        Bacterium::new(
            self.lifespan,
            self.free_energy,
            self.reproduction_threshold,
            self.metabolic_cost,
            self.enzymes.clone(),
        )
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimConfig {
    /// Deterministic seed for reproducible simulation runs.
    pub seed: u64,
    /// Grid height. The grid wraps in both directions.
    pub rows: usize,
    /// Grid width.
    pub columns: usize,
    /// Nutrient of each vertical band, left to right. Bands split the columns evenly; the last
    /// band absorbs any remainder.
    pub nutrients: Vec<Nutrient>,
    /// Nutrient whose metabolism efficiency is tracked.
    pub target_nutrient: Nutrient,
    /// Upper bound on bacteria placed at startup.
    pub seed_population: usize,
    /// Band (index into `nutrients`) that seeds are placed in.
    pub seed_nutrient_index: usize,
    /// Chance that a free slot in the seed band receives a bacterium during the row-major
    /// placement scan.
    pub seed_placement_probability: f64,
    /// Traits of the seeded bacteria.
    pub seed_agent: SeedAgentConfig,
    /// Capacity of the efficiency sliding window, in sampling intervals.
    pub max_samples: usize,
    /// Simulated time covered by one sampling interval.
    pub sampling_interval: f64,
    /// Hold time of the feed, rest and reproduce phases.
    pub phase_delay: f64,
    /// Per-bit probability of starting a mutation burst in the enzyme region.
    pub mutation_rate: f64,
    /// Relative weights of mutation burst lengths 1 through 4.
    pub mutation_burst_weights: [u32; 4],
}

impl Default for SimConfig {
    fn default() -> Self {
        let rates = MutationRates::default();
        Self {
            seed: 42,
            rows: 30,
            columns: 30,
            nutrients: DEFAULT_BAND_NUTRIENTS.iter().map(|n| nutrient(n)).collect(),
            target_nutrient: nutrient(DEFAULT_BAND_NUTRIENTS[1]),
            seed_population: 50,
            seed_nutrient_index: 0,
            seed_placement_probability: 0.25,
            seed_agent: SeedAgentConfig::default(),
            max_samples: 50,
            sampling_interval: 10.0,
            phase_delay: 1.0,
            mutation_rate: rates.per_bit_rate,
            mutation_burst_weights: rates.burst_weights,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimConfigError {
    #[error("rows and columns must be in 1..={max}, got {rows}x{columns}")]
    InvalidGridExtent {
        rows: usize,
        columns: usize,
        max: usize,
    },
    #[error("nutrients must name at least one band")]
    NoNutrients,
    #[error("{bands} nutrient bands do not fit in {columns} columns")]
    TooManyNutrientBands { bands: usize, columns: usize },
    #[error("seed_nutrient_index ({index}) must be below the number of bands ({bands})")]
    SeedNutrientIndexOutOfRange { index: usize, bands: usize },
    #[error("seed_placement_probability must be finite and within (0,1]")]
    InvalidSeedPlacementProbability,
    #[error("seed_agent is invalid: {0}")]
    InvalidSeedAgent(#[from] BacteriumError),
    #[error("max_samples must be positive")]
    InvalidMaxSamples,
    #[error("sampling_interval must be positive and finite")]
    InvalidSamplingInterval,
    #[error("phase_delay must be positive and finite")]
    InvalidPhaseDelay,
    #[error("mutation_rate must be finite and within [0,1]")]
    InvalidMutationRate,
    #[error("mutation_burst_weights must not all be zero")]
    InvalidMutationBurstWeights,
}

impl SimConfig {
    pub const MAX_GRID_EXTENT: usize = MAX_GRID_EXTENT;

    pub fn validate(&self) -> Result<(), SimConfigError> {
        self.validate_grid()?;
        self.validate_seeding()?;
        self.validate_sampling()?;
        self.validate_timing()?;
        self.validate_mutation()?;
        Ok(())
    }

    fn validate_grid(&self) -> Result<(), SimConfigError> {
        let extent = 1..=Self::MAX_GRID_EXTENT;
        if !(extent.contains(&self.rows) && extent.contains(&self.columns)) {
            return Err(SimConfigError::InvalidGridExtent {
                rows: self.rows,
                columns: self.columns,
                max: Self::MAX_GRID_EXTENT,
            });
        }
        if self.nutrients.is_empty() {
            return Err(SimConfigError::NoNutrients);
        }
        if self.nutrients.len() > self.columns {
            return Err(SimConfigError::TooManyNutrientBands {
                bands: self.nutrients.len(),
                columns: self.columns,
            });
        }
        Ok(())
    }

    fn validate_seeding(&self) -> Result<(), SimConfigError> {
        if self.seed_nutrient_index >= self.nutrients.len() {
            return Err(SimConfigError::SeedNutrientIndexOutOfRange {
                index: self.seed_nutrient_index,
                bands: self.nutrients.len(),
            });
        }
        if !(self.seed_placement_probability.is_finite()
            && self.seed_placement_probability > 0.0
            && self.seed_placement_probability <= 1.0)
        {
            return Err(SimConfigError::InvalidSeedPlacementProbability);
        }
        self.seed_agent.build()?;
        Ok(())
    }

    fn validate_sampling(&self) -> Result<(), SimConfigError> {
        if self.max_samples == 0 {
            return Err(SimConfigError::InvalidMaxSamples);
        }
        if !(self.sampling_interval.is_finite() && self.sampling_interval > 0.0) {
            return Err(SimConfigError::InvalidSamplingInterval);
        }
        Ok(())
    }

    fn validate_timing(&self) -> Result<(), SimConfigError> {
        // A zero delay would let a lifecycle loop forever without advancing the clock.
        if !(self.phase_delay.is_finite() && self.phase_delay > 0.0) {
            return Err(SimConfigError::InvalidPhaseDelay);
        }
        Ok(())
    }

    fn validate_mutation(&self) -> Result<(), SimConfigError> {
        MutationRates::new(self.mutation_rate, self.mutation_burst_weights)
            .map(|_| ())
            .map_err(|e| match e {
                MutationRatesError::InvalidRate => SimConfigError::InvalidMutationRate,
                MutationRatesError::ZeroWeights => SimConfigError::InvalidMutationBurstWeights,
            })
    }

    /// Grid extent. Call after [`validate`](Self::validate).
    pub fn dims(&self) -> GridDims {
        GridDims::new(self.rows, self.columns)
    }

    /// Band index of `column`.
    pub fn nutrient_band(&self, column: usize) -> usize {
        let bands = self.nutrients.len();
        let width = (self.columns / bands).max(1);
        (column / width).min(bands - 1)
    }

    pub fn nutrient_at(&self, column: usize) -> Nutrient {
        self.nutrients[self.nutrient_band(column)]
    }

    pub fn mutation_rates(&self) -> MutationRates {
        MutationRates {
            per_bit_rate: self.mutation_rate,
            burst_weights: self.mutation_burst_weights,
        }
    }

    pub fn cell_settings(&self) -> CellSettings {
        CellSettings {
            phase_delay: self.phase_delay,
            mutation_rates: self.mutation_rates(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_accepts_default() {
        let config = SimConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn defaults_reproduce_reference_experiment() {
        let config = SimConfig::default();
        assert_eq!((config.rows, config.columns), (30, 30));
        assert_eq!(config.nutrients[0].to_string(), "1100011011000111");
        assert_eq!(config.target_nutrient.to_string(), "0011100100111000");
        assert_eq!(config.seed_agent.lifespan, 20);
        assert_eq!(config.seed_agent.metabolic_cost, 255);
        assert_eq!(config.mutation_rates(), MutationRates::default());
    }

    #[test]
    fn validate_rejects_invalid_grid() {
        let config = SimConfig {
            rows: 0,
            ..SimConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SimConfigError::InvalidGridExtent { rows: 0, .. })
        ));

        let config = SimConfig {
            columns: SimConfig::MAX_GRID_EXTENT + 1,
            ..SimConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SimConfigError::InvalidGridExtent { .. })
        ));
    }

    #[test]
    fn validate_rejects_band_layout_problems() {
        let config = SimConfig {
            nutrients: Vec::new(),
            ..SimConfig::default()
        };
        assert_eq!(config.validate(), Err(SimConfigError::NoNutrients));

        let config = SimConfig {
            columns: 1,
            ..SimConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(SimConfigError::TooManyNutrientBands {
                bands: 2,
                columns: 1
            })
        );

        let config = SimConfig {
            seed_nutrient_index: 2,
            ..SimConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(SimConfigError::SeedNutrientIndexOutOfRange { index: 2, bands: 2 })
        );
    }

    #[test]
    fn validate_rejects_out_of_range_seed_agent() {
        let config = SimConfig {
            seed_agent: SeedAgentConfig {
                lifespan: 300,
                ..SeedAgentConfig::default()
            },
            ..SimConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SimConfigError::InvalidSeedAgent(BacteriumError::Lifespan { value: 300, .. }))
        ));
    }

    #[test]
    fn validate_rejects_bad_rates_and_timing() {
        let cases = [
            (
                SimConfig {
                    mutation_rate: 1.5,
                    ..SimConfig::default()
                },
                SimConfigError::InvalidMutationRate,
            ),
            (
                SimConfig {
                    mutation_burst_weights: [0; 4],
                    ..SimConfig::default()
                },
                SimConfigError::InvalidMutationBurstWeights,
            ),
            (
                SimConfig {
                    phase_delay: 0.0,
                    ..SimConfig::default()
                },
                SimConfigError::InvalidPhaseDelay,
            ),
            (
                SimConfig {
                    sampling_interval: f64::NAN,
                    ..SimConfig::default()
                },
                SimConfigError::InvalidSamplingInterval,
            ),
            (
                SimConfig {
                    max_samples: 0,
                    ..SimConfig::default()
                },
                SimConfigError::InvalidMaxSamples,
            ),
            (
                SimConfig {
                    seed_placement_probability: 0.0,
                    ..SimConfig::default()
                },
                SimConfigError::InvalidSeedPlacementProbability,
            ),
        ];
        for (config, expected) in cases {
            assert_eq!(config.validate(), Err(expected));
        }
    }

    #[test]
    fn nutrient_bands_split_columns_with_remainder_in_last_band() {
        let config = SimConfig {
            columns: 7,
            ..SimConfig::default()
        };
        let bands: Vec<usize> = (0..7).map(|c| config.nutrient_band(c)).collect();
        assert_eq!(bands, [0, 0, 0, 1, 1, 1, 1]);
        assert_eq!(config.nutrient_at(6), config.nutrients[1]);
    }

    #[test]
    fn partial_config_json_deserializes_with_defaults() {
        let json = r#"{
            "seed": 7,
            "rows": 12,
            "columns": 10,
            "seed_agent": { "lifespan": 9 }
        }"#;
        let cfg: SimConfig = serde_json::from_str(json).expect("partial config should parse");
        assert_eq!(cfg.seed, 7);
        assert_eq!(cfg.rows, 12);
        assert_eq!(cfg.seed_agent.lifespan, 9);
        assert_eq!(cfg.seed_agent.free_energy, 20000);
        assert_eq!(cfg.nutrients.len(), 2);
        assert_eq!(cfg.max_samples, 50);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn deserialize_rejects_wide_enzyme_and_bad_digits() {
        let wide = r#"{ "seed_agent": { "enzymes": ["10101010101010101"] } }"#;
        assert!(serde_json::from_str::<SimConfig>(wide).is_err());
        let bad = r#"{ "target_nutrient": "01x0" }"#;
        assert!(serde_json::from_str::<SimConfig>(bad).is_err());
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = SimConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: SimConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn error_display_messages_are_preserved() {
        let cases = [
            (
                SimConfigError::InvalidGridExtent {
                    rows: 0,
                    columns: 4,
                    max: 1024,
                },
                "rows and columns must be in 1..=1024, got 0x4",
            ),
            (
                SimConfigError::TooManyNutrientBands {
                    bands: 3,
                    columns: 2,
                },
                "3 nutrient bands do not fit in 2 columns",
            ),
            (
                SimConfigError::InvalidPhaseDelay,
                "phase_delay must be positive and finite",
            ),
            (
                SimConfigError::InvalidSeedAgent(BacteriumError::MetabolicCost {
                    value: 0,
                    max: 255,
                }),
                "seed_agent is invalid: metabolic cost must be in 1..=255, got 0",
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.to_string(), expected);
        }
    }
}
