
//! The numeric kernels of the codec: color conversion, the discrete cosine transform,
//! quantization, zigzag reordering, and Huffman coding of the quantized bytes.
//! All of them work on blocks of `BLOCK_SIZE` by `BLOCK_SIZE` samples of a single channel.

pub mod quantization;
pub mod zigzag;
pub mod dct;
pub mod color;
pub mod huffman;


/// The width and height of a block. The transform and the zigzag tables are specific to this size.
pub const BLOCK_SIZE: usize = 8;

/// The number of samples in a block of a single channel.
pub const BLOCK_AREA: usize = BLOCK_SIZE * BLOCK_SIZE;

/// Each pixel is compressed as one luma and two chroma channels.
pub const CHANNEL_COUNT: usize = 3;

/// The number of quantized coefficients of one block, for all channels.
pub const BLOCK_STRIDE: usize = CHANNEL_COUNT * BLOCK_AREA;


/// One channel value of one pixel, or one frequency coefficient.
pub type Sample = f64;

/// The samples of one channel of one block, in row-major order.
pub type SampleBlock = [Sample; BLOCK_AREA];

/// A quantized frequency coefficient.
///
/// The quantized value is truncated toward zero and then wrapped into
/// the signed 8-bit range (two's complement), which is what the bit stream stores.
/// When handed to the entropy coder, the same bits are read as an unsigned byte,
/// see `coefficient_to_byte` and `byte_to_coefficient`.
pub type QuantizedCoefficient = i8;

/// The quantized coefficients of one channel of one block.
pub type QuantizedBlock = [QuantizedCoefficient; BLOCK_AREA];


/// Reinterpret the two's complement bits of a coefficient as a byte of the entropy coded stream.
#[inline]
pub fn coefficient_to_byte(coefficient: QuantizedCoefficient) -> u8 {
    coefficient as u8
}

/// Reinterpret a byte of the entropy coded stream as the signed coefficient it stores.
#[inline]
pub fn byte_to_coefficient(byte: u8) -> QuantizedCoefficient {
    byte as i8
}
