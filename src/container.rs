
//! The compressed representation of an image, and its binary layout.
//!
//! ```text
//! magic        4 bytes, "BPRS"
//! version      u8, currently 1
//! quality      u8, within 1 ..= 99
//! width        u32, multiple of 8
//! height       u32, multiple of 8
//! bit_count    u64
//! entry_count  u16, at most 256
//! entries      entry_count times { byte u8, code length u8, code u64 }
//! packed       ceil(bit_count / 8) bytes
//! ```
//!
//! All numbers are stored in little endian byte order.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::convert::TryFrom;

use crate::io::{Data, Read, Write, expect_bytes};
use crate::math::Vec2;
use crate::error::{Error, Result, UnitResult, usize_to_u64, u64_to_usize, u32_to_usize, usize_to_u32};
use crate::compression::{BLOCK_SIZE, CHANNEL_COUNT};
use crate::compression::quantization::validate_quality;
use crate::compression::huffman::{Code, CodeEntry, CodeTable, Encoded, MAX_CODE_LENGTH};


/// The first bytes of every container.
pub const MAGIC: [u8; 4] = *b"BPRS";

/// The layout version written by this crate.
pub const VERSION: u8 = 1;

/// The number of bytes before the code table entries.
const HEADER_BYTE_SIZE: usize = MAGIC.len() + 2 * u8::BYTE_SIZE + 2 * u32::BYTE_SIZE + u64::BYTE_SIZE + u16::BYTE_SIZE;

/// The number of bytes of one code table entry.
const ENTRY_BYTE_SIZE: usize = 2 * u8::BYTE_SIZE + u64::BYTE_SIZE;

/// Byte values that may have a code.
const MAX_ENTRY_COUNT: usize = 256;

/// Packed bytes are read in chunks of this size, so that a corrupt bit count fails
/// when the data ends, instead of allocating a huge buffer up front.
const PACKED_READ_CHUNK_SIZE: usize = 1024 * 1024;


/// A compressed image: its dimensions and quality,
/// and the entropy coded coefficients of all blocks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Compressed {

    /// Width and height in pixels, both multiples of the block size.
    pub size: Vec2<usize>,

    /// The quality the image was compressed with, within `1 ..= 99`.
    pub quality: u8,

    /// The prefix code of each byte in the coefficient stream.
    pub table: CodeTable,

    /// The number of meaningful bits in `packed`.
    pub bit_count: u64,

    /// The coded coefficients, most significant bit first.
    pub packed: Vec<u8>,
}

impl Compressed {

    /// Assemble a container from the entropy coded coefficients.
    pub fn new(size: Vec2<usize>, quality: u8, encoded: Encoded) -> Self {
        let Encoded { packed, table, bit_count } = encoded;
        Compressed { size, quality, table, bit_count, packed }
    }

    /// Width of the image in pixels.
    #[inline]
    pub fn width(&self) -> usize { self.size.width() }

    /// Height of the image in pixels.
    #[inline]
    pub fn height(&self) -> usize { self.size.height() }

    /// The number of coefficient bytes the packed bits decode to:
    /// one per channel of every pixel.
    pub fn coefficient_count(&self) -> usize {
        self.size.area() * CHANNEL_COUNT
    }

    /// The number of bytes written by `write`.
    pub fn byte_size(&self) -> usize {
        HEADER_BYTE_SIZE + self.table.len() * ENTRY_BYTE_SIZE + self.packed.len()
    }

    /// The size of the uncompressed 24-bit pixels divided by the size of this container.
    pub fn compression_ratio(&self) -> f64 {
        let uncompressed = self.size.area() * CHANNEL_COUNT;
        uncompressed as f64 / self.byte_size() as f64
    }

    /// Check the consistency of the container, without decoding the packed bits.
    /// Returns `Error::Invalid` for inconsistent containers.
    pub fn validate(&self) -> UnitResult {
        validate_quality(self.quality)
            .map_err(|_| Error::invalid(format!("quality {}", self.quality)))?;

        if self.size.width() % BLOCK_SIZE != 0 || self.size.height() % BLOCK_SIZE != 0 {
            return Err(Error::invalid(format!(
                "image size {}x{} is not a multiple of the block size",
                self.size.width(), self.size.height()
            )));
        }

        let too_large = self.size.width().checked_mul(self.size.height())
            .and_then(|pixels| pixels.checked_mul(CHANNEL_COUNT))
            .is_none();

        if too_large {
            return Err(Error::invalid("image size too large for this machine"));
        }

        if self.table.len() > MAX_ENTRY_COUNT {
            return Err(Error::invalid("code table entry count"));
        }

        if usize_to_u64(self.packed.len()) != packed_byte_count(self.bit_count) {
            return Err(Error::invalid(format!(
                "{} packed bytes do not contain {} bits",
                self.packed.len(), self.bit_count
            )));
        }

        Ok(())
    }

    /// Serialize the container.
    /// Returns `Error::Parameter` if the image is too large to be described,
    /// or `Error::Invalid` if the container is inconsistent.
    pub fn write(&self, write: &mut impl Write) -> UnitResult {
        self.validate()?;

        u8::write_slice(write, &MAGIC)?;
        VERSION.write(write)?;
        self.quality.write(write)?;

        usize_to_u32(self.size.width(), "image width too large")?.write(write)?;
        usize_to_u32(self.size.height(), "image height too large")?.write(write)?;
        self.bit_count.write(write)?;

        let entry_count = u16::try_from(self.table.len())
            .map_err(|_| Error::invalid("code table entry count"))?;

        entry_count.write(write)?;

        for entry in self.table.entries() {
            entry.byte.write(write)?;
            entry.code.length.write(write)?;
            entry.code.bits.write(write)?;
        }

        u8::write_slice(write, &self.packed)?;
        Ok(())
    }

    /// Deserialize a container and check its consistency.
    /// The code table is checked when decoding.
    pub fn read(read: &mut impl Read) -> Result<Self> {
        expect_bytes(read, &MAGIC, "file identifier missing")?;

        let version = u8::read(read)?;
        if version != VERSION {
            return Err(Error::unsupported(format!("container version {}", version)));
        }

        let quality = u8::read(read)?;
        let width = u32_to_usize(u32::read(read)?, "image width too large for this machine")?;
        let height = u32_to_usize(u32::read(read)?, "image height too large for this machine")?;
        let bit_count = u64::read(read)?;

        let entry_count = usize::from(u16::read(read)?);
        if entry_count > MAX_ENTRY_COUNT {
            return Err(Error::invalid(format!("code table with {} entries", entry_count)));
        }

        let mut entries = Vec::with_capacity(entry_count);
        for _ in 0 .. entry_count {
            let byte = u8::read(read)?;
            let length = u8::read(read)?;
            let bits = u64::read(read)?;

            if length == 0 || length > MAX_CODE_LENGTH {
                return Err(Error::invalid(format!("code length {}", length)));
            }

            entries.push(CodeEntry { byte, code: Code { bits, length } });
        }

        let byte_count = u64_to_usize(packed_byte_count(bit_count), "bit count too large for this machine")?;
        let packed = u8::read_vec(read, byte_count, PACKED_READ_CHUNK_SIZE)?;

        let compressed = Compressed {
            size: Vec2(width, height), quality,
            table: CodeTable::from_entries(entries),
            bit_count, packed,
        };

        compressed.validate()?;
        Ok(compressed)
    }

    /// Serialize the container into a new byte vector.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(self.byte_size());
        self.write(&mut bytes)?;
        Ok(bytes)
    }

    /// Deserialize a container from a byte slice that contains nothing else.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut remaining = bytes;
        let compressed = Self::read(&mut remaining)?;

        if !remaining.is_empty() {
            return Err(Error::invalid(format!("{} bytes after the packed data", remaining.len())));
        }

        Ok(compressed)
    }

    /// Write the container to a new file, replacing any existing file at that path.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> UnitResult {
        let mut file = BufWriter::new(File::create(path)?);
        self.write(&mut file)?;
        file.flush()?;
        Ok(())
    }

    /// Read a container from a file.
    pub fn read_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let mut file = BufReader::new(File::open(path)?);
        let compressed = Self::read(&mut file)?;

        let mut trailing = [0_u8; 1];
        if file.read(&mut trailing)? != 0 {
            return Err(Error::invalid("bytes after the packed data"));
        }

        Ok(compressed)
    }
}

/// The number of bytes that contain the bits, the last byte possibly incomplete.
#[inline]
fn packed_byte_count(bit_count: u64) -> u64 {
    bit_count / 8 + u64::from(bit_count % 8 != 0)
}
