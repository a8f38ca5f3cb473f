use crate::bits::{BitPattern, BitPatternError};
use crate::constants::CANONICAL_PATTERN_BITS;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetabolismError {
    #[error(transparent)]
    Pattern(#[from] BitPatternError),
    #[error("enzyme must be at most {max} bits wide, got {width}")]
    EnzymeTooWide { width: usize, max: usize },
}

/// Bit pattern that extracts energy from a nutrient. At most 16 bits; mutation can leave a
/// trailing enzyme shorter than that.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "BitPattern", into = "BitPattern")]
pub struct Enzyme(BitPattern);

impl Enzyme {
    pub fn new(pattern: BitPattern) -> Result<Self, MetabolismError> {
        if pattern.width() > CANONICAL_PATTERN_BITS {
            return Err(MetabolismError::EnzymeTooWide {
                width: pattern.width(),
                max: CANONICAL_PATTERN_BITS,
            });
        }
        Ok(Self(pattern))
    }

    pub fn parse(text: &str) -> Result<Self, MetabolismError> {
        Self::new(BitPattern::parse(text)?)
    }

    /// Genome decoding only ever produces chunks of at most 16 bits.
    pub(crate) fn from_decoded(pattern: BitPattern) -> Self {
        debug_assert!(pattern.width() <= CANONICAL_PATTERN_BITS);
        Self(pattern)
    }

    pub fn pattern(self) -> BitPattern {
        self.0
    }
}

impl TryFrom<BitPattern> for Enzyme {
    type Error = MetabolismError;

    fn try_from(pattern: BitPattern) -> Result<Self, Self::Error> {
        Self::new(pattern)
    }
}

impl From<Enzyme> for BitPattern {
    fn from(enzyme: Enzyme) -> Self {
        enzyme.0
    }
}

impl fmt::Display for Enzyme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Food source of a grid region. Its integer value is the energy content; its pattern also
/// identifies the region.
///
/// Unlike [`Enzyme`], an over-wide nutrient is accepted with a warning and kept as-is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "BitPattern", into = "BitPattern")]
pub struct Nutrient(BitPattern);

impl Nutrient {
    pub fn new(pattern: BitPattern) -> Self {
        if pattern.width() > CANONICAL_PATTERN_BITS {
            warn!(
                nutrient = %pattern,
                width = pattern.width(),
                "nutrient should be a {CANONICAL_PATTERN_BITS}-bit pattern; keeping it as given"
            );
        }
        Self(pattern)
    }

    pub fn parse(text: &str) -> Result<Self, BitPatternError> {
        Ok(Self::new(BitPattern::parse(text)?))
    }

    pub fn pattern(self) -> BitPattern {
        self.0
    }

    pub fn energy_content(self) -> u64 {
        self.0.value()
    }
}

impl From<BitPattern> for Nutrient {
    fn from(pattern: BitPattern) -> Self {
        Self::new(pattern)
    }
}

impl From<Nutrient> for BitPattern {
    fn from(nutrient: Nutrient) -> Self {
        nutrient.0
    }
}

impl fmt::Display for Nutrient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Outcome of one feeding: which enzyme won and how efficient it was.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetabolysisResult {
    pub nutrient: Nutrient,
    pub enzyme: Enzyme,
    /// Fraction in [0, 1].
    pub efficiency: f64,
}

/// Efficiency of `enzyme` against `nutrient`: the number of differing bits over 16, after
/// truncating the nutrient to the enzyme's width (least-significant bits kept).
pub fn efficiency(enzyme: Enzyme, nutrient: Nutrient) -> f64 {
    let pattern = enzyme.pattern();
    let truncated = nutrient.pattern().low_bits(pattern.width());
    let differing = (pattern.value() ^ truncated.value()).count_ones();
    f64::from(differing) / CANONICAL_PATTERN_BITS as f64
}

/// Pick the enzyme extracting the most energy from `nutrient`.
///
/// Returns the result together with the extracted energy. Ties go to the earliest enzyme in
/// `enzymes`; an empty slice yields `None`.
pub fn select_enzyme(enzymes: &[Enzyme], nutrient: Nutrient) -> Option<(MetabolysisResult, f64)> {
    let content = nutrient.energy_content() as f64;
    let mut best: Option<(MetabolysisResult, f64)> = None;
    for &enzyme in enzymes {
        let efficiency = efficiency(enzyme, nutrient);
        let energy = efficiency * content;
        if best
            .as_ref()
            .map_or(true, |(_, best_energy)| energy > *best_energy)
        {
            best = Some((
                MetabolysisResult {
                    nutrient,
                    enzyme,
                    efficiency,
                },
                energy,
            ));
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enzyme(text: &str) -> Enzyme {
        Enzyme::parse(text).unwrap()
    }

    fn nutrient(text: &str) -> Nutrient {
        Nutrient::parse(text).unwrap()
    }

    #[test]
    fn enzyme_wider_than_sixteen_bits_is_rejected() {
        assert_eq!(
            Enzyme::parse("1".repeat(17).as_str()),
            Err(MetabolismError::EnzymeTooWide { width: 17, max: 16 })
        );
        assert!(Enzyme::parse("0000 1111 0000 1111").is_ok());
    }

    #[test]
    fn nutrient_wider_than_sixteen_bits_is_kept() {
        let n = nutrient("1 0000 0000 0000 0001");
        assert_eq!(n.pattern().width(), 17);
        assert_eq!(n.energy_content(), 0x10001);
    }

    #[test]
    fn complementary_enzyme_is_fully_efficient() {
        let e = enzyme("0011100100111000");
        assert_eq!(efficiency(e, nutrient("1100011011000111")), 1.0);
        assert_eq!(efficiency(e, nutrient("0011100100111000")), 0.0);
    }

    #[test]
    fn short_enzyme_is_compared_against_low_nutrient_bits() {
        // low four bits of the nutrient are 0111; 1000 differs in all four.
        let e = enzyme("1000");
        assert_eq!(efficiency(e, nutrient("1100011011000111")), 4.0 / 16.0);
    }

    #[test]
    fn select_enzyme_prefers_most_energy_and_first_on_ties() {
        let n = nutrient("0000000000001111");
        let weak = enzyme("0000000000001110");
        let strong_a = enzyme("0000000000000000");
        let strong_b = enzyme("0000000011111111");
        let (result, energy) = select_enzyme(&[weak, strong_a, strong_b], n).unwrap();
        assert_eq!(result.enzyme, strong_a);
        assert_eq!(result.efficiency, 4.0 / 16.0);
        assert_eq!(energy, 0.25 * 15.0);
    }

    #[test]
    fn select_enzyme_without_enzymes_yields_nothing() {
        assert!(select_enzyme(&[], nutrient("0101")).is_none());
    }

    #[test]
    fn zero_energy_nutrient_still_reports_first_enzyme() {
        let n = nutrient("0000000000000000");
        let a = enzyme("1111000000000000");
        let b = enzyme("1111111111111111");
        let (result, energy) = select_enzyme(&[a, b], n).unwrap();
        assert_eq!(result.enzyme, a);
        assert_eq!(energy, 0.0);
    }
}
