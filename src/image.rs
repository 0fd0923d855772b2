
//! The pixel surface that is compressed and reconstructed.
//!
//! Loading a raster from an image file and storing it again is not part of this crate.
//! Any type that can report its size and get or set an rgb pixel by coordinate
//! can be compressed, by implementing `PixelSurface` (and `PixelSurfaceMut` for decompression).
//! `RgbImage` is a simple in-memory implementation.

use crate::math::Vec2;
use crate::compression::BLOCK_SIZE;


/// A pixel with 8-bit red, green and blue channels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgb {

    /// Red channel, `0` is dark.
    pub r: u8,

    /// Green channel, `0` is dark.
    pub g: u8,

    /// Blue channel, `0` is dark.
    pub b: u8,
}

impl Rgb {

    /// Create a pixel from its three channel values.
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self { Rgb { r, g, b } }

    /// A pixel with the same value in all three channels.
    #[inline]
    pub const fn gray(value: u8) -> Self { Rgb::new(value, value, value) }

    /// The largest absolute difference of any channel between the two pixels.
    pub fn max_channel_difference(self, other: Rgb) -> u8 {
        let difference = |a: u8, b: u8| if a > b { a - b } else { b - a };

        difference(self.r, other.r)
            .max(difference(self.g, other.g))
            .max(difference(self.b, other.b))
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self { Rgb { r, g, b } }
}

impl From<Rgb> for [u8; 3] {
    fn from(pixel: Rgb) -> Self { [pixel.r, pixel.g, pixel.b] }
}


/// A two-dimensional raster of rgb pixels that can be read by coordinate.
/// Coordinates are zero based, with the origin in the top left corner.
pub trait PixelSurface {

    /// Width and height of the raster in pixels.
    fn size(&self) -> Vec2<usize>;

    /// The pixel in the specified row and column.
    /// Will only be called with coordinates inside `size()`.
    fn get_pixel(&self, row: usize, column: usize) -> Rgb;

    /// The largest size that contains only complete blocks.
    /// Trailing rows and columns of a surface are dropped, not padded.
    fn block_aligned_size(&self) -> Vec2<usize> {
        block_aligned_size(self.size())
    }
}

/// A two-dimensional raster of rgb pixels that can be written by coordinate.
pub trait PixelSurfaceMut: PixelSurface {

    /// Replace the pixel in the specified row and column.
    /// Will only be called with coordinates inside `size()`.
    fn set_pixel(&mut self, row: usize, column: usize, pixel: Rgb);
}

/// The largest size not greater than `size` that contains only complete blocks.
#[inline]
pub fn block_aligned_size(size: Vec2<usize>) -> Vec2<usize> {
    size.map(|length| length - length % BLOCK_SIZE)
}


/// An in-memory raster storing its pixels in row-major order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgbImage {
    size: Vec2<usize>,
    pixels: Vec<Rgb>,
}

impl RgbImage {

    /// A raster filled with black pixels.
    pub fn new(size: impl Into<Vec2<usize>>) -> Self {
        Self::filled(size, Rgb::default())
    }

    /// A raster where each pixel has the specified value.
    pub fn filled(size: impl Into<Vec2<usize>>, pixel: Rgb) -> Self {
        let size = size.into();
        RgbImage { size, pixels: vec![pixel; size.area()] }
    }

    /// Compute each pixel from its row and column.
    pub fn from_fn(size: impl Into<Vec2<usize>>, mut pixel: impl FnMut(usize, usize) -> Rgb) -> Self {
        let size = size.into();
        let mut pixels = Vec::with_capacity(size.area());

        for row in 0 .. size.height() {
            for column in 0 .. size.width() {
                pixels.push(pixel(row, column));
            }
        }

        RgbImage { size, pixels }
    }

    /// Use an existing row-major pixel vector.
    /// Returns `None` if the number of pixels does not match the size.
    pub fn from_pixels(size: impl Into<Vec2<usize>>, pixels: Vec<Rgb>) -> Option<Self> {
        let size = size.into();
        if pixels.len() == size.area() { Some(RgbImage { size, pixels }) }
        else { None }
    }

    /// Width of the raster in pixels.
    #[inline]
    pub fn width(&self) -> usize { self.size.width() }

    /// Height of the raster in pixels.
    #[inline]
    pub fn height(&self) -> usize { self.size.height() }

    /// All pixels in row-major order.
    #[inline]
    pub fn pixels(&self) -> &[Rgb] { &self.pixels }

    /// All pixels in row-major order, mutable.
    #[inline]
    pub fn pixels_mut(&mut self) -> &mut [Rgb] { &mut self.pixels }

    /// Discard the size information.
    pub fn into_pixels(self) -> Vec<Rgb> { self.pixels }

    /// The largest difference of any channel of any pixel.
    /// Returns `None` if the sizes differ.
    pub fn max_difference(&self, other: &RgbImage) -> Option<u8> {
        if self.size != other.size { return None; }

        Some(self.pixels.iter().zip(&other.pixels)
            .map(|(&a, &b)| a.max_channel_difference(b))
            .max().unwrap_or(0))
    }

    /// The average absolute difference over all channels of all pixels.
    /// Returns `None` if the sizes differ.
    pub fn mean_difference(&self, other: &RgbImage) -> Option<f64> {
        if self.size != other.size { return None; }
        if self.pixels.is_empty() { return Some(0.0); }

        let sum: u64 = self.pixels.iter().zip(&other.pixels)
            .map(|(a, b)| {
                let difference = |a: u8, b: u8| (i32::from(a) - i32::from(b)).unsigned_abs() as u64;
                difference(a.r, b.r) + difference(a.g, b.g) + difference(a.b, b.b)
            })
            .sum();

        Some(sum as f64 / (3 * self.pixels.len()) as f64)
    }
}

impl PixelSurface for RgbImage {
    #[inline]
    fn size(&self) -> Vec2<usize> { self.size }

    #[inline]
    fn get_pixel(&self, row: usize, column: usize) -> Rgb {
        self.pixels[row * self.size.width() + column]
    }
}

impl PixelSurfaceMut for RgbImage {
    #[inline]
    fn set_pixel(&mut self, row: usize, column: usize, pixel: Rgb) {
        let width = self.size.width();
        self.pixels[row * width + column] = pixel;
    }
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn trailing_pixels_are_dropped() {
        assert_eq!(block_aligned_size(Vec2(17, 16)), Vec2(16, 16));
        assert_eq!(block_aligned_size(Vec2(7, 31)), Vec2(0, 24));
        assert_eq!(RgbImage::new((8, 8)).block_aligned_size(), Vec2(8, 8));
    }

    #[test]
    fn row_major_access() {
        let mut image = RgbImage::from_fn((3, 2), |row, column| Rgb::gray((row * 10 + column) as u8));
        assert_eq!(image.get_pixel(1, 2), Rgb::gray(12));
        assert_eq!(image.pixels()[5], Rgb::gray(12));

        image.set_pixel(0, 1, Rgb::new(1, 2, 3));
        assert_eq!(image.pixels()[1], Rgb::new(1, 2, 3));
    }

    #[test]
    fn differences() {
        let a = RgbImage::filled((2, 2), Rgb::new(10, 20, 30));
        let b = RgbImage::filled((2, 2), Rgb::new(13, 20, 29));

        assert_eq!(a.max_difference(&b), Some(3));
        assert_eq!(a.mean_difference(&b), Some(4.0 / 3.0));
        assert_eq!(a.max_difference(&RgbImage::new((1, 1))), None);
        assert!(RgbImage::from_pixels((2, 2), vec![Rgb::default(); 3]).is_none());
    }
}
