
//! Partitioning of a raster into independent blocks, and the per-block work.
//!
//! The raster is cut into a grid of `BLOCK_SIZE` by `BLOCK_SIZE` pixel blocks.
//! Blocks are numbered row by row, and block `n` owns the coefficients
//! `n * BLOCK_STRIDE .. (n + 1) * BLOCK_STRIDE` of the flat coefficient buffer.
//! As no two blocks share pixels or coefficients, all blocks can be processed in parallel.

pub mod codec;
pub mod pool;
pub mod scheduler;

use std::ops::Range;
use crate::math::Vec2;
use crate::compression::{BLOCK_SIZE, BLOCK_AREA, BLOCK_STRIDE};


/// The blocks of a raster.
/// Trailing rows and columns that do not fill a complete block are not part of the grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct BlockGrid {

    /// Number of blocks horizontally and vertically.
    block_counts: Vec2<usize>,
}

impl BlockGrid {

    /// The grid of complete blocks inside a raster of this size.
    /// A raster smaller than one block in either dimension yields an empty grid.
    pub fn for_size(pixel_size: Vec2<usize>) -> Self {
        BlockGrid { block_counts: pixel_size.map(|length| length / BLOCK_SIZE) }
    }

    /// Number of blocks in each row of the grid.
    #[inline]
    pub fn blocks_per_row(&self) -> usize { self.block_counts.x() }

    /// Number of rows of blocks.
    #[inline]
    pub fn block_rows(&self) -> usize { self.block_counts.y() }

    /// Total number of blocks.
    #[inline]
    pub fn block_count(&self) -> usize { self.block_counts.area() }

    /// Whether the grid contains no blocks at all.
    #[inline]
    pub fn is_empty(&self) -> bool { self.block_count() == 0 }

    /// The size in pixels covered by the grid, a multiple of the block size.
    #[inline]
    pub fn pixel_size(&self) -> Vec2<usize> {
        self.block_counts.map(|count| count * BLOCK_SIZE)
    }

    /// Number of quantized coefficients of all blocks.
    #[inline]
    pub fn coefficient_count(&self) -> usize {
        self.block_count() * BLOCK_STRIDE
    }

    /// Number of pixels of all blocks.
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.block_count() * BLOCK_AREA
    }

    /// The pixel position of the top left corner of the block.
    #[inline]
    pub fn block_origin(&self, block_index: usize) -> Vec2<usize> {
        debug_assert!(block_index < self.block_count(), "block index out of grid");

        Vec2(
            (block_index % self.blocks_per_row()) * BLOCK_SIZE,
            (block_index / self.blocks_per_row()) * BLOCK_SIZE,
        )
    }

    /// The coefficients of the block, in the flat coefficient buffer.
    #[inline]
    pub fn coefficient_range(&self, block_index: usize) -> Range<usize> {
        let start = block_index * BLOCK_STRIDE;
        start .. start + BLOCK_STRIDE
    }
}
