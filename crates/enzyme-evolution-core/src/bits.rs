use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed-width unsigned bit string, most significant bit first.
///
/// Used for enzymes and nutrients. The text form is a run of `0`/`1` characters; whitespace is
/// ignored so patterns can be grouped for readability (`"0011 1001 0011 1000"`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BitPattern {
    value: u64,
    width: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BitPatternError {
    #[error("bit pattern is empty")]
    Empty,
    #[error("invalid character {found:?} at bit {position}; expected '0' or '1'")]
    InvalidDigit { found: char, position: usize },
    #[error("bit pattern has {width} bits; at most {max} are supported")]
    TooWide { width: usize, max: usize },
}

impl BitPattern {
    /// Largest width the packed representation can hold.
    pub const MAX_WIDTH: usize = 64;

    pub fn parse(text: &str) -> Result<Self, BitPatternError> {
        let digits: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
        if digits.is_empty() {
            return Err(BitPatternError::Empty);
        }
        if digits.len() > Self::MAX_WIDTH {
            return Err(BitPatternError::TooWide {
                width: digits.len(),
                max: Self::MAX_WIDTH,
            });
        }
        let mut value = 0u64;
        for (position, &found) in digits.iter().enumerate() {
            let bit = match found {
                '0' => 0,
                '1' => 1,
                _ => return Err(BitPatternError::InvalidDigit { found, position }),
            };
            value = (value << 1) | bit;
        }
        Ok(Self {
            value,
            width: digits.len() as u8,
        })
    }

    /// Build a pattern of exactly `width` bits holding `value`, zero-padded on the left.
    /// Bits of `value` above `width` are discarded.
    pub fn from_value(value: u64, width: usize) -> Self {
        assert!(width <= Self::MAX_WIDTH, "bit pattern width out of range");
        Self {
            value: value & Self::mask(width),
            width: width as u8,
        }
    }

    /// Pack an MSB-first bit slice. Callers guarantee the slice fits in 64 bits.
    pub(crate) fn from_bits(bits: &[bool]) -> Self {
        assert!(bits.len() <= Self::MAX_WIDTH, "bit slice too wide to pack");
        let value = bits.iter().fold(0u64, |acc, &b| (acc << 1) | u64::from(b));
        Self {
            value,
            width: bits.len() as u8,
        }
    }

    pub fn value(self) -> u64 {
        self.value
    }

    pub fn width(self) -> usize {
        self.width as usize
    }

    pub fn count_ones(self) -> u32 {
        self.value.count_ones()
    }

    /// Keep only the `width` least-significant bits. Narrower patterns are returned unchanged.
    pub fn low_bits(self, width: usize) -> Self {
        if width >= self.width() {
            self
        } else {
            Self::from_value(self.value, width)
        }
    }

    /// Iterate bits MSB first.
    pub fn bits(self) -> impl Iterator<Item = bool> {
        (0..self.width()).rev().map(move |i| (self.value >> i) & 1 == 1)
    }

    fn mask(width: usize) -> u64 {
        if width >= Self::MAX_WIDTH {
            u64::MAX
        } else {
            (1u64 << width) - 1
        }
    }
}

impl fmt::Display for BitPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in self.bits() {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl FromStr for BitPattern {
    type Err = BitPatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for BitPattern {
    type Error = BitPatternError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<BitPattern> for String {
    fn from(pattern: BitPattern) -> Self {
        pattern.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ignores_whitespace_and_keeps_leading_zeroes() {
        let p = BitPattern::parse("0011 1001 0011 1000").unwrap();
        assert_eq!(p.width(), 16);
        assert_eq!(p.value(), 0b0011_1001_0011_1000);
        assert_eq!(p.to_string(), "0011100100111000");
    }

    #[test]
    fn parse_rejects_non_binary_digits() {
        assert_eq!(
            BitPattern::parse("0102"),
            Err(BitPatternError::InvalidDigit {
                found: '2',
                position: 3
            })
        );
        assert_eq!(BitPattern::parse("   "), Err(BitPatternError::Empty));
    }

    #[test]
    fn parse_rejects_patterns_beyond_packed_width() {
        let text = "1".repeat(65);
        assert!(matches!(
            BitPattern::parse(&text),
            Err(BitPatternError::TooWide { width: 65, .. })
        ));
        assert!(BitPattern::parse(&"1".repeat(64)).is_ok());
    }

    #[test]
    fn low_bits_truncates_from_the_most_significant_end() {
        let p = BitPattern::parse("1100011011000111").unwrap();
        assert_eq!(p.low_bits(4).to_string(), "0111");
        assert_eq!(p.low_bits(20), p);
    }

    #[test]
    fn from_value_zero_pads_to_width() {
        assert_eq!(BitPattern::from_value(7, 8).to_string(), "00000111");
        assert_eq!(BitPattern::from_value(0x1ff, 8).to_string(), "11111111");
    }

    #[test]
    fn serializes_as_text() {
        let p = BitPattern::parse("0101").unwrap();
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, "\"0101\"");
        let back: BitPattern = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }
}
