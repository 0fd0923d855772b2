
//! Conversion between rgb pixels and one luma and two chroma channels.
//!
//! The forward conversion only offsets the luma channel, centering it around zero,
//! while the chroma channels are already centered. The inverse conversion
//! expects all three channels to be shifted by `POST_SHIFT` after the inverse transform,
//! which re-adds the nominal `16` luma and `128` chroma offsets of the standard formula.

use crate::compression::{Sample, SampleBlock, CHANNEL_COUNT};
use crate::image::Rgb;


/// Extracts the value of one derived channel from a pixel.
pub type ChannelSelector = fn(Rgb) -> Sample;

/// The luma channel, followed by the blue and the red chroma channel.
pub const YCBCR_SELECTORS: [ChannelSelector; CHANNEL_COUNT] = [luma, blue_chroma, red_chroma];

/// Added to every reconstructed sample of every channel, before converting back to rgb.
pub const POST_SHIFT: Sample = 128.0;


/// Luma, shifted by `-112` so that mid gray is close to zero.
#[inline]
pub fn luma(pixel: Rgb) -> Sample {
    let (r, g, b) = channels(pixel);
    (65.738 * r + 129.057 * g + 24.064 * b) / 256.0 - 112.0
}

/// Blue difference chroma, zero for gray pixels.
#[inline]
pub fn blue_chroma(pixel: Rgb) -> Sample {
    let (r, g, b) = channels(pixel);
    (-37.945 * r - 74.494 * g + 112.439 * b) / 256.0
}

/// Red difference chroma, zero for gray pixels.
#[inline]
pub fn red_chroma(pixel: Rgb) -> Sample {
    let (r, g, b) = channels(pixel);
    (112.439 * r - 94.154 * g - 18.285 * b) / 256.0
}

#[inline]
fn channels(pixel: Rgb) -> (Sample, Sample, Sample) {
    (Sample::from(pixel.r), Sample::from(pixel.g), Sample::from(pixel.b))
}


/// Add `POST_SHIFT` to all samples of a reconstructed block.
#[inline]
pub fn shift(block: &mut SampleBlock) {
    for sample in block.iter_mut() {
        *sample += POST_SHIFT;
    }
}

/// Convert shifted luma and chroma samples back to a pixel.
/// Each channel is truncated toward zero and then clamped to `0 ..= 255`.
#[inline]
pub fn ycbcr_to_rgb(y: Sample, cb: Sample, cr: Sample) -> Rgb {
    let r = (298.082 * y + 408.583 * cr) / 256.0 - 222.921;
    let g = (298.082 * y - 100.291 * cb - 208.120 * cr) / 256.0 + 135.576;
    let b = (298.082 * y + 516.412 * cb) / 256.0 - 276.836;

    Rgb::new(to_byte(r), to_byte(g), to_byte(b))
}

#[inline]
fn to_byte(value: Sample) -> u8 {
    (value as i32).clamp(0, i32::from(u8::MAX)) as u8
}


#[cfg(test)]
mod test {
    use super::*;

    fn round_trip(pixel: Rgb) -> Rgb {
        ycbcr_to_rgb(
            luma(pixel) + POST_SHIFT,
            blue_chroma(pixel) + POST_SHIFT,
            red_chroma(pixel) + POST_SHIFT,
        )
    }

    #[test]
    fn gray_has_no_chroma() {
        for value in [0_u8, 1, 77, 128, 254, 255].iter().copied() {
            let gray = Rgb::gray(value);
            assert!(blue_chroma(gray).abs() < 1e-9);
            assert!(red_chroma(gray).abs() < 1e-9);
        }

        assert!((luma(Rgb::gray(0)) + 112.0).abs() < 1e-9);
    }

    #[test]
    fn conversion_is_almost_lossless() {
        let colors = [
            Rgb::gray(128), Rgb::new(255, 0, 0), Rgb::new(0, 255, 0), Rgb::new(0, 0, 255),
            Rgb::new(12, 200, 99), Rgb::new(250, 250, 5), Rgb::gray(20),
        ];

        for &color in colors.iter() {
            assert!(round_trip(color).max_channel_difference(color) <= 2, "{:?} became {:?}", color, round_trip(color));
        }
    }

    #[test]
    fn reconstruction_is_clamped() {
        assert_eq!(ycbcr_to_rgb(1000.0, 128.0, 128.0), Rgb::gray(255));
        assert_eq!(ycbcr_to_rgb(-1000.0, 128.0, 128.0), Rgb::gray(0));
        assert_eq!(to_byte(-0.9), 0);
        assert_eq!(to_byte(254.99), 254);
    }

    #[test]
    fn shift_adds_the_offset_to_every_sample() {
        let mut block = [-1.0; crate::compression::BLOCK_AREA];
        shift(&mut block);
        assert!(block.iter().all(|&sample| sample == 127.0));
    }
}
