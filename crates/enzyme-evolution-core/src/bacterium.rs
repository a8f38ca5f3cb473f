use crate::genome::{Genome, GenomeHeader, MutationRates};
use crate::metabolism::{select_enzyme, Enzyme, MetabolysisResult, Nutrient};
use rand::Rng;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BacteriumError {
    #[error("lifespan must be in 1..={max}, got {value}")]
    Lifespan { value: u32, max: u32 },
    #[error("free energy must be in 1..={max}, got {value}")]
    FreeEnergy { value: u32, max: u32 },
    #[error("reproduction threshold must be in 1..={max}, got {value}")]
    ReproductionThreshold { value: u32, max: u32 },
    #[error("metabolic cost must be in 1..={max}, got {value}")]
    MetabolicCost { value: u32, max: u32 },
}

/// Agent living in a grid cell.
///
/// Energy is tracked as `f64` and may go negative; the bacterium is dead once either its
/// lifespan or its free energy drops to zero or below.
#[derive(Clone, Debug)]
pub struct Bacterium {
    // Fields are private; the genome and the decoded traits must stay in sync.
    genome: Genome,
    lifespan: i32,
    maximum_lifespan: i32,
    free_energy: f64,
    maximum_free_energy: f64,
    reproduction_threshold: f64,
    metabolic_cost: f64,
    enzymes: Vec<Enzyme>,
}

fn check_range(
    value: u32,
    max: u32,
    err: fn(u32, u32) -> BacteriumError,
) -> Result<(), BacteriumError> {
    if (1..=max).contains(&value) {
        Ok(())
    } else {
        Err(err(value, max))
    }
}

impl Bacterium {
    /// Build a genesis bacterium from explicit traits. Each trait must be non-zero and fit its
    /// genome field.
    pub fn new(
        lifespan: u32,
        free_energy: u32,
        reproduction_threshold: u32,
        metabolic_cost: u32,
        enzymes: Vec<Enzyme>,
    ) -> Result<Self, BacteriumError> {
        let byte = u32::from(u8::MAX);
        let word = u32::from(u16::MAX);
        check_range(lifespan, byte, |value, max| BacteriumError::Lifespan { value, max })?;
        check_range(free_energy, word, |value, max| BacteriumError::FreeEnergy { value, max })?;
        check_range(reproduction_threshold, word, |value, max| {
            BacteriumError::ReproductionThreshold { value, max }
        })?;
        check_range(metabolic_cost, byte, |value, max| BacteriumError::MetabolicCost {
            value,
            max,
        })?;

        let header = GenomeHeader {
            lifespan: lifespan as u8,
            free_energy: free_energy as u16,
            reproduction_threshold: reproduction_threshold as u16,
            metabolic_cost: metabolic_cost as u8,
        };
        let genome = Genome::encode(&header, &enzymes);
        Ok(Self::assemble(genome, header, enzymes))
    }

    /// Decode a child. Header fields are taken as-is, zero included.
    pub fn from_genome(genome: Genome) -> Self {
        let decoded = genome.decode();
        Self::assemble(genome, decoded.header, decoded.enzymes)
    }

    fn assemble(genome: Genome, header: GenomeHeader, enzymes: Vec<Enzyme>) -> Self {
        Self {
            genome,
            lifespan: i32::from(header.lifespan),
            maximum_lifespan: i32::from(header.lifespan),
            free_energy: f64::from(header.free_energy),
            maximum_free_energy: f64::from(header.free_energy),
            reproduction_threshold: f64::from(header.reproduction_threshold),
            metabolic_cost: f64::from(header.metabolic_cost),
            enzymes,
        }
    }

    /// Metabolize `nutrient` with the best enzyme and bank the energy.
    ///
    /// Without enzymes nothing is extracted and `None` is returned.
    pub fn feed(&mut self, nutrient: Nutrient) -> Option<MetabolysisResult> {
        let (result, energy) = select_enzyme(&self.enzymes, nutrient)?;
        self.free_energy += energy;
        Some(result)
    }

    /// One rest cycle: pay the metabolic cost per enzyme (at least once) and age by one.
    pub fn rest(&mut self) {
        let charges = self.enzymes.len().max(1) as f64;
        self.free_energy -= charges * self.metabolic_cost;
        self.lifespan -= 1;
    }

    /// Produce a mutated copy of the genome and pay half the reproduction threshold for it.
    pub fn reproduce<R: Rng + ?Sized>(&mut self, rng: &mut R, rates: &MutationRates) -> Genome {
        let child = self.genome.mutate(rng, rates);
        self.free_energy -= self.reproduction_threshold / 2.0;
        child
    }

    pub fn is_dead(&self) -> bool {
        self.lifespan <= 0 || self.free_energy <= 0.0
    }

    pub fn can_reproduce(&self) -> bool {
        self.free_energy >= self.reproduction_threshold
    }

    /// Remaining fraction of the lifespan, 0 when the maximum is 0.
    pub fn lifespan_ratio(&self) -> f64 {
        if self.maximum_lifespan == 0 {
            0.0
        } else {
            f64::from(self.lifespan) / f64::from(self.maximum_lifespan)
        }
    }

    pub fn genome(&self) -> &Genome {
        &self.genome
    }

    pub fn lifespan(&self) -> i32 {
        self.lifespan
    }

    pub fn maximum_lifespan(&self) -> i32 {
        self.maximum_lifespan
    }

    pub fn free_energy(&self) -> f64 {
        self.free_energy
    }

    pub fn maximum_free_energy(&self) -> f64 {
        self.maximum_free_energy
    }

    pub fn reproduction_threshold(&self) -> f64 {
        self.reproduction_threshold
    }

    pub fn metabolic_cost(&self) -> f64 {
        self.metabolic_cost
    }

    pub fn enzymes(&self) -> &[Enzyme] {
        &self.enzymes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metabolism::efficiency;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;

    fn enzyme(text: &str) -> Enzyme {
        Enzyme::parse(text).unwrap()
    }

    fn seed_like() -> Bacterium {
        Bacterium::new(20, 20000, 50000, 255, vec![enzyme("0011100100111000")]).unwrap()
    }

    #[test]
    fn genesis_rejects_out_of_range_traits() {
        assert_eq!(
            Bacterium::new(0, 1, 1, 1, vec![]).unwrap_err(),
            BacteriumError::Lifespan { value: 0, max: 255 }
        );
        assert_eq!(
            Bacterium::new(1, 70000, 1, 1, vec![]).unwrap_err(),
            BacteriumError::FreeEnergy {
                value: 70000,
                max: 65535
            }
        );
        assert!(matches!(
            Bacterium::new(1, 1, 0, 1, vec![]),
            Err(BacteriumError::ReproductionThreshold { .. })
        ));
        assert!(matches!(
            Bacterium::new(1, 1, 1, 256, vec![]),
            Err(BacteriumError::MetabolicCost { .. })
        ));
    }

    #[test]
    fn genesis_genome_round_trips_traits() {
        let b = seed_like();
        let reborn = Bacterium::from_genome(b.genome().clone());
        assert_eq!(reborn.lifespan(), 20);
        assert_eq!(reborn.free_energy(), 20000.0);
        assert_eq!(reborn.reproduction_threshold(), 50000.0);
        assert_eq!(reborn.metabolic_cost(), 255.0);
        assert_eq!(reborn.enzymes(), b.enzymes());
    }

    #[test]
    fn feed_adds_energy_of_best_enzyme() {
        let nutrient = Nutrient::parse("1100011011000111").unwrap();
        let mut b = Bacterium::new(
            5,
            100,
            60000,
            1,
            vec![enzyme("1100011011000111"), enzyme("0011100100111000")],
        )
        .unwrap();
        let result = b.feed(nutrient).unwrap();
        assert_eq!(result.enzyme, enzyme("0011100100111000"));
        assert_eq!(result.efficiency, 1.0);
        assert_eq!(b.free_energy(), 100.0 + nutrient.energy_content() as f64);
        for &other in b.enzymes() {
            assert!(efficiency(other, nutrient) <= result.efficiency);
        }
    }

    #[test]
    fn feed_without_enzymes_changes_nothing() {
        let mut b = Bacterium::new(5, 100, 200, 3, vec![]).unwrap();
        assert!(b.feed(Nutrient::parse("1111").unwrap()).is_none());
        assert_eq!(b.free_energy(), 100.0);
    }

    #[test]
    fn rest_charges_per_enzyme_with_minimum_of_one() {
        let mut none = Bacterium::new(3, 100, 200, 7, vec![]).unwrap();
        none.rest();
        assert_eq!(none.free_energy(), 93.0);
        assert_eq!(none.lifespan(), 2);

        let mut two = Bacterium::new(3, 100, 200, 7, vec![enzyme("01"), enzyme("10")]).unwrap();
        two.rest();
        assert_eq!(two.free_energy(), 86.0);
    }

    #[test]
    fn rest_does_not_clamp_energy() {
        let mut b = Bacterium::new(3, 10, 200, 255, vec![]).unwrap();
        b.rest();
        assert_eq!(b.free_energy(), -245.0);
        assert!(b.is_dead());
    }

    #[test]
    fn last_rest_kills_single_cycle_bacterium() {
        let mut b = Bacterium::new(1, 1000, 2000, 1, vec![]).unwrap();
        assert!(!b.is_dead());
        b.rest();
        assert_eq!(b.lifespan(), 0);
        assert!(b.is_dead());
        assert_eq!(b.lifespan_ratio(), 0.0);
    }

    #[test]
    fn reproduce_keeps_header_and_pays_half_threshold() {
        let mut b = Bacterium::new(20, 60000, 50000, 1, vec![enzyme("0011100100111000")]).unwrap();
        assert!(b.can_reproduce());
        let mut rng = ChaCha12Rng::seed_from_u64(9);
        let child = b.reproduce(&mut rng, &MutationRates::default());
        assert_eq!(child.header_bits(), b.genome().header_bits());
        assert_eq!(b.free_energy(), 35000.0);
    }

    #[test]
    fn child_with_zero_lifespan_reports_zero_ratio() {
        let child = Bacterium::from_genome(Genome::parse("0000").unwrap());
        assert_eq!(child.maximum_lifespan(), 0);
        assert_eq!(child.lifespan_ratio(), 0.0);
        assert!(child.is_dead());
    }
}
