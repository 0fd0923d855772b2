
//! Compression and decompression of a single block, for all three channels.

use crate::math::Vec2;
use crate::image::{PixelSurface, Rgb};
use crate::compression::{
    BLOCK_SIZE, BLOCK_AREA, BLOCK_STRIDE, CHANNEL_COUNT,
    SampleBlock, QuantizedBlock, QuantizedCoefficient,
};
use crate::compression::quantization::QuantizationTable;
use crate::compression::color::{self, ChannelSelector};
use crate::compression::{dct, zigzag};


/// Transforms blocks of a pixel surface into quantized coefficients.
/// Owns the scratch memory of exactly one block, so it can be reused for many blocks.
#[derive(Clone, Debug)]
pub struct Compressor<'t> {
    table: &'t QuantizationTable,
    samples: SampleBlock,
    coefficients: SampleBlock,
    quantized: QuantizedBlock,
    serial: QuantizedBlock,
}

impl<'t> Compressor<'t> {

    /// A compressor using the quantization table of one quality.
    pub fn new(table: &'t QuantizationTable) -> Self {
        Compressor {
            table,
            samples: [0.0; BLOCK_AREA],
            coefficients: [0.0; BLOCK_AREA],
            quantized: [0; BLOCK_AREA],
            serial: [0; BLOCK_AREA],
        }
    }

    /// Compress the block whose top left pixel is at `origin` (column, row).
    ///
    /// For each channel selector in turn, the 64 zigzag ordered coefficients
    /// are written to `output[channel_index * 64 ..]`.
    /// The output must be the `BLOCK_STRIDE` coefficients that belong to this block,
    /// and the whole block must be inside the surface.
    pub fn compress(
        &mut self, surface: &(impl PixelSurface + ?Sized), origin: Vec2<usize>,
        output: &mut [QuantizedCoefficient], selectors: &[ChannelSelector; CHANNEL_COUNT],
    ) {
        debug_assert_eq!(output.len(), BLOCK_STRIDE, "output must be the region of one block");

        for (channel_output, &selector) in output.chunks_exact_mut(BLOCK_AREA).zip(selectors.iter()) {
            for (index, sample) in self.samples.iter_mut().enumerate() {
                let pixel = surface.get_pixel(
                    origin.y() + index / BLOCK_SIZE,
                    origin.x() + index % BLOCK_SIZE,
                );

                *sample = selector(pixel);
            }

            dct::forward_8x8(&self.samples, &mut self.coefficients);
            self.table.quantize(&self.coefficients, &mut self.quantized);
            zigzag::scan(&self.quantized, &mut self.serial);

            channel_output.copy_from_slice(&self.serial);
        }
    }
}


/// Reconstructs the three channels of a block from quantized coefficients.
/// Owns the scratch memory of exactly one block, so it can be reused for many blocks.
#[derive(Clone, Debug)]
pub struct Uncompressor<'t> {
    table: &'t QuantizationTable,
    serial: QuantizedBlock,
    quantized: QuantizedBlock,
    coefficients: SampleBlock,

    /// Luma, blue chroma, and red chroma, shifted by `color::POST_SHIFT`.
    channels: [SampleBlock; CHANNEL_COUNT],
}

impl<'t> Uncompressor<'t> {

    /// An uncompressor using the quantization table of one quality.
    pub fn new(table: &'t QuantizationTable) -> Self {
        Uncompressor {
            table,
            serial: [0; BLOCK_AREA],
            quantized: [0; BLOCK_AREA],
            coefficients: [0.0; BLOCK_AREA],
            channels: [[0.0; BLOCK_AREA]; CHANNEL_COUNT],
        }
    }

    /// Reconstruct all channels from the `BLOCK_STRIDE` coefficients of one block.
    /// The result can be read with `channels` or `pixel` until the next call.
    pub fn uncompress(&mut self, input: &[QuantizedCoefficient]) {
        debug_assert_eq!(input.len(), BLOCK_STRIDE, "input must be the region of one block");

        for (channel_input, channel) in input.chunks_exact(BLOCK_AREA).zip(self.channels.iter_mut()) {
            self.serial.copy_from_slice(channel_input);

            zigzag::unscan(&self.serial, &mut self.quantized);
            self.table.dequantize(&self.quantized, &mut self.coefficients);
            dct::inverse_8x8(&self.coefficients, channel);
            color::shift(channel);
        }
    }

    /// The reconstructed luma, blue chroma, and red chroma samples, in row-major order.
    #[inline]
    pub fn channels(&self) -> &[SampleBlock; CHANNEL_COUNT] {
        &self.channels
    }

    /// The reconstructed pixel at the row-major index inside the block.
    #[inline]
    pub fn pixel(&self, index: usize) -> Rgb {
        let [y, cb, cr] = &self.channels;
        color::ycbcr_to_rgb(y[index], cb[index], cr[index])
    }

    /// Write all reconstructed pixels of the block in row-major order.
    pub fn pixels_into(&self, pixels: &mut [Rgb]) {
        debug_assert_eq!(pixels.len(), BLOCK_AREA);

        for (index, pixel) in pixels.iter_mut().enumerate() {
            *pixel = self.pixel(index);
        }
    }
}


#[cfg(test)]
mod test {
    use super::*;
    use crate::image::RgbImage;
    use crate::compression::color::YCBCR_SELECTORS;

    fn compress_block(surface: &RgbImage, origin: Vec2<usize>, table: &QuantizationTable) -> [QuantizedCoefficient; BLOCK_STRIDE] {
        let mut output = [0; BLOCK_STRIDE];
        Compressor::new(table).compress(surface, origin, &mut output, &YCBCR_SELECTORS);
        output
    }

    #[test]
    fn flat_gray_block_only_has_dc() {
        let table = QuantizationTable::for_quality(70).unwrap();
        let surface = RgbImage::filled((8, 8), Rgb::gray(128));
        let output = compress_block(&surface, Vec2(0, 0), &table);

        for channel in output.chunks_exact(BLOCK_AREA) {
            assert!(channel[1 ..].iter().all(|&coefficient| coefficient == 0), "{:?}", channel);
        }

        // luma of mid gray is about -2.57, times 8 is about -20.6, divided by 10 is -2
        assert_eq!(output[0], -2);
        assert_eq!(output[BLOCK_AREA], 0);
        assert_eq!(output[2 * BLOCK_AREA], 0);
    }

    #[test]
    fn origin_selects_the_block() {
        let table = QuantizationTable::for_quality(50).unwrap();
        let surface = RgbImage::from_fn((16, 8), |_, column| {
            if column < 8 { Rgb::gray(20) } else { Rgb::gray(235) }
        });

        let left = compress_block(&surface, Vec2(0, 0), &table);
        let right = compress_block(&surface, Vec2(8, 0), &table);

        assert_eq!(left[0], -47);
        assert_eq!(right[0], 44);
    }

    #[test]
    fn uncompressed_block_resembles_the_original() {
        let table = QuantizationTable::for_quality(90).unwrap();
        let surface = RgbImage::from_fn((8, 8), |row, column| {
            Rgb::new((row * 20) as u8, (column * 25) as u8, 100)
        });

        let output = compress_block(&surface, Vec2(0, 0), &table);

        let mut uncompressor = Uncompressor::new(&table);
        uncompressor.uncompress(&output);

        let mut pixels = [Rgb::default(); BLOCK_AREA];
        uncompressor.pixels_into(&mut pixels);

        let reconstructed = RgbImage::from_pixels((8, 8), pixels.to_vec()).unwrap();
        let mean = reconstructed.mean_difference(&surface).unwrap();
        assert!(mean < 8.0, "mean difference {}", mean);
    }

    #[test]
    fn zero_coefficients_reconstruct_the_shift() {
        let table = QuantizationTable::for_quality(50).unwrap();
        let mut uncompressor = Uncompressor::new(&table);
        uncompressor.uncompress(&[0; BLOCK_STRIDE]);

        for channel in uncompressor.channels() {
            assert!(channel.iter().all(|&sample| (sample - color::POST_SHIFT).abs() < 1e-9));
        }
    }

    #[test]
    fn scratch_is_reused_between_blocks() {
        let table = QuantizationTable::for_quality(60).unwrap();
        let dark = RgbImage::filled((8, 8), Rgb::gray(10));
        let bright = RgbImage::filled((8, 8), Rgb::gray(240));

        let mut compressor = Compressor::new(&table);
        let mut first = [0; BLOCK_STRIDE];
        let mut second = [0; BLOCK_STRIDE];

        compressor.compress(&dark, Vec2(0, 0), &mut first, &YCBCR_SELECTORS);
        compressor.compress(&bright, Vec2(0, 0), &mut second, &YCBCR_SELECTORS);

        assert_eq!(first, compress_block(&dark, Vec2(0, 0), &table));
        assert_eq!(second, compress_block(&bright, Vec2(0, 0), &table));
    }
}
