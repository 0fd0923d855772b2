
//! Lossy block-based compression of rgb images.
//!
//! Each 8x8 block of the image is converted to one luma and two chroma channels,
//! transformed with a discrete cosine transform, quantized according to a quality
//! between 1 and 99, and reordered in zigzag order. The quantized coefficients
//! of all blocks are then Huffman coded into a compact container.
//!
//! Blocks are transformed in parallel on a thread pool (see the `rayon` feature).
//!
//! ```no_run
//! use blockpress::prelude::*;
//!
//! let image = RgbImage::filled((64, 48), Rgb::new(200, 120, 40));
//! let compressed = blockpress::compress(&image, 70)?;
//! compressed.write_to_file("orange.bprs")?;
//!
//! let restored = blockpress::decompress(&Compressed::read_from_file("orange.bprs")?)?;
//! assert_eq!(restored.size(), Vec2(64, 48));
//! # Ok::<(), blockpress::error::Error>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]


pub mod io;
pub mod math;
pub mod error;
pub mod image;
pub mod compression;
pub mod block;
pub mod container;
pub mod codec;


pub mod prelude {
    //! Re-exports of all types commonly required to compress and decompress images.

    // main exports
    pub use crate::codec::{Codec, CodecOptions};
    pub use crate::container::Compressed;

    // core data types
    pub use crate::image::{Rgb, RgbImage, PixelSurface, PixelSurfaceMut};
    pub use crate::math::Vec2;
    pub use crate::compression::quantization::{QuantizationTables, MIN_QUALITY, MAX_QUALITY};

    // secondary data types
    pub use crate::error::{self, Error, Result, UnitResult};
}

use crate::prelude::*;


/// Compress the surface with a default codec.
/// Create a `Codec` instead to compress multiple images.
/// Returns `Error::Parameter` if the quality is not within `1 ..= 99`.
pub fn compress(surface: &(impl PixelSurface + Sync + ?Sized), quality: u8) -> Result<Compressed> {
    Codec::default().compress(surface, quality)
}

/// Decompress an image with a default codec.
/// Create a `Codec` instead to decompress multiple images.
pub fn decompress(compressed: &Compressed) -> Result<RgbImage> {
    Codec::default().decompress(compressed)
}
