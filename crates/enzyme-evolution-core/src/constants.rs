/// Largest supported grid extent (rows or columns).
pub const MAX_GRID_EXTENT: usize = 1024;

/// Canonical enzyme/nutrient width in bits. Also the denominator of enzymatic efficiency,
/// so a short enzyme can never reach an efficiency of 1.0.
pub const CANONICAL_PATTERN_BITS: usize = 16;

/// Prime multiplier used to derive per-cell RNG streams from a base seed.
/// Chosen so streams for neighbouring cell indices have minimal overlap.
pub const RNG_DERIVATION_PRIME: u64 = 7919;
