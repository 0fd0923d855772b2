
//! Two-dimensional DCT-II (forward) and DCT-III (inverse) on 8x8 blocks.
//!
//! Uses the direct formula instead of a fast factorization,
//! so that the rounding behaviour is identical on all platforms:
//!
//! `C(u,v) = β · α(u) · α(v) · Σx Σy s(x,y) · cos((2x+1)uπ/16) · cos((2y+1)vπ/16)`
//!
//! with `α(0) = 1/√2`, `α(k) = 1` otherwise, and `β = 1/8 + 1/8`.
//! The first index of a sample (`x`, `u`) selects the row of the block.

use std::f64::consts::{FRAC_1_SQRT_2, PI};
use std::sync::OnceLock;
use crate::compression::{BLOCK_AREA, BLOCK_SIZE, SampleBlock};


/// Normalization combining the width and height terms.
const BETA: f64 = 1.0 / BLOCK_SIZE as f64 + 1.0 / BLOCK_SIZE as f64;

/// `cos((2x + 1) · u · π / 16)`, stored at `x * 8 + u`.
/// Computed once and shared read-only by all threads.
fn cosines() -> &'static [f64; BLOCK_AREA] {
    static COSINES: OnceLock<[f64; BLOCK_AREA]> = OnceLock::new();

    COSINES.get_or_init(|| {
        let mut cosines = [0.0; BLOCK_AREA];

        for x in 0 .. BLOCK_SIZE {
            for u in 0 .. BLOCK_SIZE {
                cosines[x * BLOCK_SIZE + u] = ((2.0 * x as f64 + 1.0) * u as f64 * PI / (2 * BLOCK_SIZE) as f64).cos();
            }
        }

        cosines
    })
}

#[inline]
fn alpha(frequency: usize) -> f64 {
    if frequency == 0 { FRAC_1_SQRT_2 } else { 1.0 }
}


/// Transform the samples of a block into frequency coefficients.
/// The coefficient at `(0,0)` is eight times the average sample value.
pub fn forward_8x8(samples: &SampleBlock, coefficients: &mut SampleBlock) {
    let cosines = cosines();

    for v in 0 .. BLOCK_SIZE {
        for u in 0 .. BLOCK_SIZE {
            let mut sum = 0.0;

            for y in 0 .. BLOCK_SIZE {
                for x in 0 .. BLOCK_SIZE {
                    sum += samples[x * BLOCK_SIZE + y]
                        * cosines[x * BLOCK_SIZE + u]
                        * cosines[y * BLOCK_SIZE + v];
                }
            }

            coefficients[u * BLOCK_SIZE + v] = sum * BETA * alpha(u) * alpha(v);
        }
    }
}

/// Reconstruct the samples of a block from its frequency coefficients.
pub fn inverse_8x8(coefficients: &SampleBlock, samples: &mut SampleBlock) {
    let cosines = cosines();

    for x in 0 .. BLOCK_SIZE {
        for y in 0 .. BLOCK_SIZE {
            let mut sum = 0.0;

            for v in 0 .. BLOCK_SIZE {
                for u in 0 .. BLOCK_SIZE {
                    sum += coefficients[u * BLOCK_SIZE + v]
                        * cosines[x * BLOCK_SIZE + u]
                        * cosines[y * BLOCK_SIZE + v]
                        * alpha(u) * alpha(v);
                }
            }

            samples[x * BLOCK_SIZE + y] = sum * BETA;
        }
    }
}


#[cfg(test)]
mod test {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand::rngs::StdRng;

    fn assert_close(actual: &SampleBlock, expected: &SampleBlock, tolerance: f64) {
        for (index, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
            assert!((a - e).abs() <= tolerance, "index {}: {} != {}", index, a, e);
        }
    }

    #[test]
    fn constant_block_only_has_dc() {
        let samples = [16.0; BLOCK_AREA];
        let mut coefficients = [0.0; BLOCK_AREA];
        forward_8x8(&samples, &mut coefficients);

        assert!((coefficients[0] - 8.0 * 16.0).abs() < 1e-9);
        assert!(coefficients[1 ..].iter().all(|coefficient| coefficient.abs() < 1e-9));
    }

    #[test]
    fn horizontal_ramp_has_only_first_row_frequencies() {
        let mut samples = [0.0; BLOCK_AREA];
        for (index, sample) in samples.iter_mut().enumerate() {
            *sample = (index % BLOCK_SIZE) as f64 * 10.0;
        }

        let mut coefficients = [0.0; BLOCK_AREA];
        forward_8x8(&samples, &mut coefficients);

        // the value only varies along y, which is the second index, so only row u = 0 is populated
        assert!(coefficients[1].abs() > 1.0);
        assert!(coefficients[BLOCK_SIZE ..].iter().all(|coefficient| coefficient.abs() < 1e-9));
    }

    #[test]
    fn inverse_of_dc_is_constant() {
        let mut coefficients = [0.0; BLOCK_AREA];
        coefficients[0] = -80.0;

        let mut samples = [0.0; BLOCK_AREA];
        inverse_8x8(&coefficients, &mut samples);
        assert_close(&samples, &[-10.0; BLOCK_AREA], 1e-9);
    }

    #[test]
    fn inverse_reconstructs_random_blocks() {
        let mut random = StdRng::seed_from_u64(8);

        for _ in 0 .. 32 {
            let mut samples = [0.0; BLOCK_AREA];
            for sample in samples.iter_mut() {
                *sample = random.random_range(-128.0 .. 128.0);
            }

            let mut coefficients = [0.0; BLOCK_AREA];
            forward_8x8(&samples, &mut coefficients);

            let mut reconstructed = [0.0; BLOCK_AREA];
            inverse_8x8(&coefficients, &mut reconstructed);

            assert_close(&reconstructed, &samples, 1e-9);
        }
    }

    #[test]
    fn cosine_table_is_shared() {
        assert!(std::ptr::eq(cosines(), cosines()));
        assert_eq!(cosines()[0], 1.0);
        assert!((cosines()[1] - (PI / 16.0).cos()).abs() < 1e-15);
    }
}
