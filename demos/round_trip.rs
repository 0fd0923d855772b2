
// Compresses an image file, stores the container next to it,
// then reloads the container and stores the decompressed image.
//
// cargo run --release --example round_trip -- path/to/image.png [quality]
// set RUST_LOG=debug to see the stages and their timings

extern crate blockpress;
extern crate image;

use blockpress::prelude::*;
use std::path::PathBuf;
use std::time::Instant;


/// Makes an image of the `image` crate compressible, without copying the pixels.
struct Raster(image::RgbImage);

impl PixelSurface for Raster {
    fn size(&self) -> Vec2<usize> {
        Vec2(self.0.width() as usize, self.0.height() as usize)
    }

    fn get_pixel(&self, row: usize, column: usize) -> Rgb {
        Rgb::from(self.0.get_pixel(column as u32, row as u32).0)
    }
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(EnvFilter::from_default_env())
            .init();
    }

    let mut arguments = std::env::args().skip(1);
    let input = PathBuf::from(arguments.next().ok_or("expected the path of an image file")?);
    let quality: u8 = match arguments.next() {
        Some(quality) => quality.parse()?,
        None => 70,
    };

    let start = Instant::now();
    let raster = Raster(image::open(&input)?.to_rgb8());
    println!("loaded {}x{} pixels from {}", raster.0.width(), raster.0.height(), input.display());

    let codec = Codec::default();
    let compressed = codec.compress(&raster, quality)?;

    let compressed_path = PathBuf::from(format!("{}.compressed.{}", input.display(), quality));
    compressed.write_to_file(&compressed_path)?;

    println!(
        "compressed to {} bytes ({:.1}:1) in {:?}, saved {}",
        compressed.byte_size(), compressed.compression_ratio(),
        start.elapsed(), compressed_path.display()
    );

    let start = Instant::now();
    let reloaded = Compressed::read_from_file(&compressed_path)?;
    let decompressed = codec.decompress(&reloaded)?;

    let output = image::RgbImage::from_fn(decompressed.width() as u32, decompressed.height() as u32, |x, y| {
        image::Rgb(<[u8; 3]>::from(decompressed.get_pixel(y as usize, x as usize)))
    });

    let output_path = PathBuf::from(format!("{}.uncompressed.{}.png", input.display(), quality));
    output.save(&output_path)?;

    println!("decompressed in {:?}, saved {}", start.elapsed(), output_path.display());
    Ok(())
}
