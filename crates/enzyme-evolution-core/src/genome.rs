use crate::bits::BitPattern;
use crate::constants::CANONICAL_PATTERN_BITS;
use crate::metabolism::Enzyme;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Heritable bit string of a bacterium.
///
/// Layout, most significant bit first:
///
/// | bits    | field                  |
/// |---------|------------------------|
/// | 0..8    | lifespan               |
/// | 8..24   | free energy            |
/// | 24..40  | reproduction threshold |
/// | 40..48  | metabolic cost         |
/// | 48..    | enzymes, 16 bits each  |
///
/// A trailing enzyme chunk shorter than 16 bits is kept as a short enzyme.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Genome {
    bits: Vec<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenomeParseError {
    #[error("invalid genome character {found:?} at bit {position}; expected '0' or '1'")]
    InvalidDigit { found: char, position: usize },
}

/// Fixed-width fields at the front of every genome.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenomeHeader {
    pub lifespan: u8,
    pub free_energy: u16,
    pub reproduction_threshold: u16,
    pub metabolic_cost: u8,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedGenome {
    pub header: GenomeHeader,
    pub enzymes: Vec<Enzyme>,
}

impl Genome {
    pub const LIFESPAN_BITS: usize = 8;
    pub const FREE_ENERGY_BITS: usize = 16;
    pub const REPRODUCTION_THRESHOLD_BITS: usize = 16;
    pub const METABOLIC_COST_BITS: usize = 8;
    pub const HEADER_BITS: usize = Self::LIFESPAN_BITS
        + Self::FREE_ENERGY_BITS
        + Self::REPRODUCTION_THRESHOLD_BITS
        + Self::METABOLIC_COST_BITS;
    pub const ENZYME_BITS: usize = CANONICAL_PATTERN_BITS;

    const FIELD_WIDTHS: [usize; 4] = [
        Self::LIFESPAN_BITS,
        Self::FREE_ENERGY_BITS,
        Self::REPRODUCTION_THRESHOLD_BITS,
        Self::METABOLIC_COST_BITS,
    ];

    pub fn from_bits(bits: Vec<bool>) -> Self {
        Self { bits }
    }

    pub fn parse(text: &str) -> Result<Self, GenomeParseError> {
        let mut bits = Vec::with_capacity(text.len());
        for (position, found) in text.chars().filter(|c| !c.is_whitespace()).enumerate() {
            match found {
                '0' => bits.push(false),
                '1' => bits.push(true),
                _ => return Err(GenomeParseError::InvalidDigit { found, position }),
            }
        }
        Ok(Self { bits })
    }

    /// Concatenate the zero-padded header fields followed by each enzyme's bits.
    pub fn encode(header: &GenomeHeader, enzymes: &[Enzyme]) -> Self {
        let values = [
            u64::from(header.lifespan),
            u64::from(header.free_energy),
            u64::from(header.reproduction_threshold),
            u64::from(header.metabolic_cost),
        ];
        let enzyme_len: usize = enzymes.iter().map(|e| e.pattern().width()).sum();
        let mut bits = Vec::with_capacity(Self::HEADER_BITS + enzyme_len);
        for (value, width) in values.into_iter().zip(Self::FIELD_WIDTHS) {
            bits.extend(BitPattern::from_value(value, width).bits());
        }
        for enzyme in enzymes {
            bits.extend(enzyme.pattern().bits());
        }
        Self { bits }
    }

    /// Decode header and enzymes. Never fails: a field cut short by the end of the genome is read
    /// from whatever bits remain, and a field with no bits left decodes as 0.
    pub fn decode(&self) -> DecodedGenome {
        let mut offset = 0;
        let mut fields = [0u64; 4];
        for (field, width) in fields.iter_mut().zip(Self::FIELD_WIDTHS) {
            *field = self.field(offset, width);
            offset += width;
        }
        let header = GenomeHeader {
            lifespan: fields[0] as u8,
            free_energy: fields[1] as u16,
            reproduction_threshold: fields[2] as u16,
            metabolic_cost: fields[3] as u8,
        };
        let enzymes = self
            .enzyme_bits()
            .chunks(Self::ENZYME_BITS)
            .map(|chunk| Enzyme::from_decoded(BitPattern::from_bits(chunk)))
            .collect();
        DecodedGenome { header, enzymes }
    }

    fn field(&self, offset: usize, width: usize) -> u64 {
        let start = offset.min(self.bits.len());
        let end = (offset + width).min(self.bits.len());
        BitPattern::from_bits(&self.bits[start..end]).value()
    }

    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    pub fn header_bits(&self) -> &[bool] {
        &self.bits[..Self::HEADER_BITS.min(self.bits.len())]
    }

    pub fn enzyme_bits(&self) -> &[bool] {
        &self.bits[Self::HEADER_BITS.min(self.bits.len())..]
    }

    /// Produce a mutated copy. The header is copied verbatim; only the enzyme region is
    /// subject to burst mutations.
    ///
    /// `rates` must hold a per-bit rate within [0, 1]; [`MutationRates::new`] enforces it.
    pub fn mutate<R: Rng + ?Sized>(&self, rng: &mut R, rates: &MutationRates) -> Genome {
        let enzymes = self.enzyme_bits();
        let mut out = Vec::with_capacity(self.bits.len() + 8);
        out.extend_from_slice(self.header_bits());

        let mut i = 0;
        while i < enzymes.len() {
            if !rng.random_bool(rates.per_bit_rate) {
                out.push(enzymes[i]);
                i += 1;
                continue;
            }
            let length = rates.sample_burst_length(rng);
            let op = MutationOp::sample(rng);
            i += apply_burst(op, length, &enzymes[i..], &mut out, || rng.random::<bool>());
        }
        Genome { bits: out }
    }
}

/// Emit one burst of `op` starting at `source[0]` and return how many source bits it consumed.
///
/// DELETE and INVERT consume up to `length` bits, stopping at the end of `source`. REPEAT and
/// INSERT consume only the current bit. `source` must not be empty.
fn apply_burst(
    op: MutationOp,
    length: usize,
    source: &[bool],
    out: &mut Vec<bool>,
    mut random_bit: impl FnMut() -> bool,
) -> usize {
    let reach = length.min(source.len());
    match op {
        MutationOp::Delete => reach,
        MutationOp::Invert => {
            out.extend(source[..reach].iter().map(|&bit| !bit));
            reach
        }
        MutationOp::Repeat => {
            out.extend(std::iter::repeat_n(source[0], length));
            1
        }
        MutationOp::Insert => {
            out.extend((0..length).map(|_| random_bit()));
            out.push(source[0]);
            1
        }
    }
}

impl fmt::Display for Genome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &bit in &self.bits {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl FromStr for Genome {
    type Err = GenomeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Genome {
    type Error = GenomeParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Genome> for String {
    fn from(genome: Genome) -> Self {
        genome.to_string()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MutationOp {
    Delete,
    Repeat,
    Invert,
    Insert,
}

impl MutationOp {
    const ALL: [MutationOp; 4] = [Self::Delete, Self::Repeat, Self::Invert, Self::Insert];

    fn sample<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MutationRatesError {
    #[error("per-bit mutation rate must be finite and within [0,1]")]
    InvalidRate,
    #[error("burst weights must not all be zero")]
    ZeroWeights,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MutationRates {
    /// Probability that a given enzyme bit starts a burst.
    pub(crate) per_bit_rate: f64,
    /// Relative weights of burst lengths 1 through 4.
    pub(crate) burst_weights: [u32; 4],
}

impl MutationRates {
    pub fn new(per_bit_rate: f64, burst_weights: [u32; 4]) -> Result<Self, MutationRatesError> {
        if !(per_bit_rate.is_finite() && (0.0..=1.0).contains(&per_bit_rate)) {
            return Err(MutationRatesError::InvalidRate);
        }
        if burst_weights.iter().all(|&w| w == 0) {
            return Err(MutationRatesError::ZeroWeights);
        }
        Ok(Self {
            per_bit_rate,
            burst_weights,
        })
    }

    fn sample_burst_length<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let total: u32 = self.burst_weights.iter().sum();
        if total == 0 {
            return 1;
        }
        let mut roll = rng.random_range(0..total);
        for (i, &weight) in self.burst_weights.iter().enumerate() {
            if roll < weight {
                return i + 1;
            }
            roll -= weight;
        }
        self.burst_weights.len()
    }
}

impl Default for MutationRates {
    fn default() -> Self {
        Self {
            per_bit_rate: 0.01,
            burst_weights: [55, 30, 10, 5],
        }
    }
}
