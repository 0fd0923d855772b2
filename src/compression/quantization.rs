
//! Quality dependent quantization tables and the lossy division of frequency coefficients.

use std::sync::OnceLock;
use crate::compression::{BLOCK_AREA, SampleBlock, QuantizedBlock, byte_to_coefficient};
use crate::error::{Error, Result, UnitResult};


/// The lowest accepted quality, producing the smallest and most distorted output.
pub const MIN_QUALITY: u8 = 1;

/// The highest accepted quality, producing the largest and least distorted output.
pub const MAX_QUALITY: u8 = 99;

/// Perceptual weights for quality 50, in row-major order.
/// Low frequencies (top left) are divided by smaller values than high frequencies.
const BASE_TABLE: [u16; BLOCK_AREA] = [
    16, 11, 10, 16, 24, 40, 51, 61,
    12, 12, 14, 19, 26, 58, 60, 55,
    14, 13, 16, 24, 40, 57, 69, 56,
    14, 17, 22, 29, 51, 87, 80, 62,
    18, 22, 37, 56, 68, 109, 103, 77,
    24, 35, 55, 64, 81, 104, 113, 92,
    49, 64, 78, 87, 103, 121, 120, 101,
    72, 92, 95, 98, 112, 100, 103, 99,
];


/// Returns `Error::Parameter` if the quality is not within `MIN_QUALITY ..= MAX_QUALITY`.
pub fn validate_quality(quality: u8) -> UnitResult {
    if (MIN_QUALITY ..= MAX_QUALITY).contains(&quality) { Ok(()) }
    else {
        Err(Error::parameter(format!(
            "quality must be in [{},{}] interval, but was {}",
            MIN_QUALITY, MAX_QUALITY, quality
        )))
    }
}


/// The 64 divisors for one quality value, in row-major block order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuantizationTable {
    divisors: [u16; BLOCK_AREA],
}

impl QuantizationTable {

    /// Scale the base table by the quality.
    /// Fails for qualities outside `MIN_QUALITY ..= MAX_QUALITY`.
    /// Prefer `QuantizationTables::get`, which computes each table only once.
    pub fn for_quality(quality: u8) -> Result<Self> {
        validate_quality(quality)?;

        let quality = u32::from(quality);
        let multiplier = if quality < 50 { 5000 / quality } else { 200 - 2 * quality };

        let mut divisors = [0_u16; BLOCK_AREA];
        for (divisor, &base) in divisors.iter_mut().zip(BASE_TABLE.iter()) {
            let scaled = (multiplier * u32::from(base) + 50) / 100;

            // qualities of 98 and above scale the smallest weights to zero
            *divisor = scaled.max(1) as u16;
        }

        Ok(QuantizationTable { divisors })
    }

    /// The divisor for each position of a block, in row-major order.
    #[inline]
    pub fn divisors(&self) -> &[u16; BLOCK_AREA] {
        &self.divisors
    }

    /// Divide each coefficient by its divisor, truncating toward zero.
    /// Results outside of the signed 8-bit range wrap around (two's complement),
    /// exactly like the bits that are stored in the compressed stream.
    pub fn quantize(&self, coefficients: &SampleBlock, quantized: &mut QuantizedBlock) {
        for ((target, &coefficient), &divisor) in quantized.iter_mut().zip(coefficients.iter()).zip(self.divisors.iter()) {
            let truncated = (coefficient / f64::from(divisor)) as i32;
            *target = byte_to_coefficient(truncated as u8);
        }
    }

    /// Multiply each signed coefficient by its divisor.
    pub fn dequantize(&self, quantized: &QuantizedBlock, coefficients: &mut SampleBlock) {
        for ((target, &value), &divisor) in coefficients.iter_mut().zip(quantized.iter()).zip(self.divisors.iter()) {
            *target = f64::from(value) * f64::from(divisor);
        }
    }
}


/// Computes each quantization table at most once and keeps it for the lifetime of this cache.
/// Can be shared between threads. Concurrent first use of the same quality
/// computes the table once, and readers never observe a partially written table.
pub struct QuantizationTables {
    tables: [OnceLock<QuantizationTable>; MAX_QUALITY as usize],
}

impl QuantizationTables {

    /// An empty cache. Tables are computed when first requested.
    pub fn new() -> Self {
        QuantizationTables { tables: std::array::from_fn(|_| OnceLock::new()) }
    }

    /// The table for this quality, computing it if this is the first request.
    /// Fails for qualities outside `MIN_QUALITY ..= MAX_QUALITY`.
    pub fn get(&self, quality: u8) -> Result<&QuantizationTable> {
        validate_quality(quality)?;

        let slot = &self.tables[usize::from(quality - MIN_QUALITY)];
        if let Some(table) = slot.get() {
            return Ok(table);
        }

        let table = QuantizationTable::for_quality(quality)?;
        tracing::trace!(quality, "computed quantization table");
        Ok(slot.get_or_init(|| table))
    }

    /// The number of qualities whose table has already been computed.
    pub fn cached_count(&self) -> usize {
        self.tables.iter().filter(|slot| slot.get().is_some()).count()
    }
}

impl Default for QuantizationTables {
    fn default() -> Self { Self::new() }
}

impl std::fmt::Debug for QuantizationTables {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.debug_struct("QuantizationTables")
            .field("cached_count", &self.cached_count())
            .finish()
    }
}
