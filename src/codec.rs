
//! Compress and decompress whole images.
//!
//! Compression runs in two stages. First, all blocks are transformed and quantized
//! in parallel, each block writing only its own region of a flat coefficient buffer.
//! Then the complete buffer is entropy coded, which needs the statistics of all blocks.
//! Decompression runs the same stages in reverse order.

use std::sync::Arc;
use std::time::Instant;

use crate::math::Vec2;
use crate::error::{Error, Result, UnitResult};
use crate::image::{PixelSurface, PixelSurfaceMut, Rgb, RgbImage};
use crate::compression::{BLOCK_AREA, BLOCK_SIZE, BLOCK_STRIDE, QuantizedCoefficient, coefficient_to_byte, byte_to_coefficient};
use crate::compression::quantization::{QuantizationTables, validate_quality};
use crate::compression::color::YCBCR_SELECTORS;
use crate::compression::huffman;
use crate::block::BlockGrid;
use crate::block::codec::{Compressor, Uncompressor};
use crate::block::pool::Pool;
use crate::block::scheduler::BlockScheduler;
use crate::container::Compressed;


/// Controls how the work is distributed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CodecOptions {

    /// Transform the blocks of an image on multiple threads.
    /// The output is identical to sequential processing.
    pub parallel: bool,

    /// The number of worker threads. `None` uses one thread per logical core.
    /// Also limits how many scratch buffers are kept for reuse.
    pub max_threads: Option<usize>,
}

impl Default for CodecOptions {
    fn default() -> Self {
        CodecOptions { parallel: true, max_threads: None }
    }
}

impl CodecOptions {

    /// Process all blocks on the calling thread.
    pub fn sequential() -> Self {
        CodecOptions { parallel: false, max_threads: None }
    }
}


/// Compresses and decompresses images.
///
/// Owns the worker threads and caches the quantization tables of all qualities used so far,
/// so reuse one codec for multiple images instead of creating a new codec for each image.
#[derive(Debug)]
pub struct Codec {
    options: CodecOptions,
    tables: Arc<QuantizationTables>,
    scheduler: BlockScheduler,
}

impl Default for Codec {
    fn default() -> Self {
        Self::new(CodecOptions::default())
    }
}

impl Codec {

    /// A codec with its own quantization table cache.
    pub fn new(options: CodecOptions) -> Self {
        Self::with_tables(options, Arc::new(QuantizationTables::new()))
    }

    /// A codec that shares the quantization table cache with other codecs.
    pub fn with_tables(options: CodecOptions, tables: Arc<QuantizationTables>) -> Self {
        Codec { options, scheduler: BlockScheduler::new(&options), tables }
    }

    /// The options this codec was created with.
    pub fn options(&self) -> CodecOptions { self.options }

    /// The quantization table cache of this codec.
    pub fn tables(&self) -> &Arc<QuantizationTables> { &self.tables }

    /// Compress all complete blocks of the surface.
    /// Trailing rows and columns that do not fill a complete block are dropped.
    /// Returns `Error::Parameter` if the quality is not within `1 ..= 99`.
    pub fn compress(&self, surface: &(impl PixelSurface + Sync + ?Sized), quality: u8) -> Result<Compressed> {
        validate_quality(quality)?;

        let start = Instant::now();
        let table = self.tables.get(quality)?;
        let grid = BlockGrid::for_size(surface.size());

        tracing::debug!(
            width = grid.pixel_size().width(), height = grid.pixel_size().height(),
            blocks = grid.block_count(), quality, "compressing image"
        );

        let mut coefficients: Vec<QuantizedCoefficient> = vec![0; grid.coefficient_count()];
        let compressors = Pool::new(self.scheduler.worker_count());

        self.scheduler.for_each_block_mut(&mut coefficients, BLOCK_STRIDE, |block_index, output| {
            let mut compressor = compressors.acquire_or_else(|| Compressor::new(table));
            compressor.compress(surface, grid.block_origin(block_index), output, &YCBCR_SELECTORS);
            Ok(())
        })?;

        let bytes: Vec<u8> = coefficients.into_iter().map(coefficient_to_byte).collect();
        let encoded = huffman::encode(&bytes)?;

        let compressed = Compressed::new(grid.pixel_size(), quality, encoded);

        tracing::debug!(
            bytes = compressed.byte_size(), codes = compressed.table.len(),
            ratio = compressed.compression_ratio(), elapsed = ?start.elapsed(),
            "compressed image"
        );

        Ok(compressed)
    }

    /// Reconstruct the image.
    /// Returns `Error::Invalid` if the container is corrupt.
    pub fn decompress(&self, compressed: &Compressed) -> Result<RgbImage> {
        let grid = BlockGrid::for_size(compressed.size);
        let staging = self.decompress_blocks(compressed, grid)?;

        let mut image = RgbImage::new(grid.pixel_size());
        let width = grid.pixel_size().width();
        let pixels = image.pixels_mut();

        for (block_index, block) in staging.chunks_exact(BLOCK_AREA).enumerate() {
            let origin = grid.block_origin(block_index);

            for (row_index, block_row) in block.chunks_exact(BLOCK_SIZE).enumerate() {
                let start = (origin.y() + row_index) * width + origin.x();
                pixels[start .. start + BLOCK_SIZE].copy_from_slice(block_row);
            }
        }

        Ok(image)
    }

    /// Reconstruct the image into an existing surface.
    /// Pixels outside of the surface are skipped, and pixels of the surface
    /// outside of the compressed image are left untouched.
    pub fn decompress_into(&self, compressed: &Compressed, surface: &mut (impl PixelSurfaceMut + ?Sized)) -> UnitResult {
        let grid = BlockGrid::for_size(compressed.size);
        let staging = self.decompress_blocks(compressed, grid)?;
        let bounds = surface.size();

        for (block_index, block) in staging.chunks_exact(BLOCK_AREA).enumerate() {
            let origin = grid.block_origin(block_index);

            for (index, &pixel) in block.iter().enumerate() {
                let position = origin + Vec2(index % BLOCK_SIZE, index / BLOCK_SIZE);

                if position.x() < bounds.width() && position.y() < bounds.height() {
                    surface.set_pixel(position.y(), position.x(), pixel);
                }
            }
        }

        Ok(())
    }

    /// Entropy decode all coefficients, then reconstruct the pixels of each block.
    /// The pixels of block `n` are stored at `n * 64`, in row-major order.
    fn decompress_blocks(&self, compressed: &Compressed, grid: BlockGrid) -> Result<Vec<Rgb>> {
        compressed.validate()?;

        let start = Instant::now();
        let table = self.tables.get(compressed.quality)?;

        tracing::debug!(
            width = compressed.width(), height = compressed.height(),
            blocks = grid.block_count(), quality = compressed.quality, "decompressing image"
        );

        let bytes = huffman::decode(&compressed.packed, &compressed.table, compressed.bit_count)?;
        if bytes.len() != compressed.coefficient_count() {
            return Err(Error::invalid(format!(
                "{} coefficients decoded, but image requires {}",
                bytes.len(), compressed.coefficient_count()
            )));
        }

        let coefficients: Vec<QuantizedCoefficient> = bytes.into_iter().map(byte_to_coefficient).collect();

        let mut staging = vec![Rgb::default(); grid.pixel_count()];
        let uncompressors = Pool::new(self.scheduler.worker_count());

        self.scheduler.for_each_block_mut(&mut staging, BLOCK_AREA, |block_index, pixels| {
            let mut uncompressor = uncompressors.acquire_or_else(|| Uncompressor::new(table));
            uncompressor.uncompress(&coefficients[grid.coefficient_range(block_index)]);
            uncompressor.pixels_into(pixels);
            Ok(())
        })?;

        tracing::debug!(elapsed = ?start.elapsed(), "decompressed image");
        Ok(staging)
    }
}
