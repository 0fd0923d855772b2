
//! Specialized binary input and output.
//! Uses the error handling for this crate.

pub use ::std::io::{Read, Write};
use lebe::prelude::*;
use crate::error::{Error, Result, UnitResult};


/// Generic trait that defines common binary operations such as reading and writing for this type.
/// All values are stored in little endian byte order.
pub trait Data: Sized + Default + Clone {

    /// Number of bytes this would consume in a container file.
    const BYTE_SIZE: usize = ::std::mem::size_of::<Self>();

    /// Read a value of type `Self`.
    fn read(read: &mut impl Read) -> Result<Self>;

    /// Read as many values of type `Self` as fit into the specified slice.
    /// If the slice cannot be filled completely, returns `Error::Invalid`.
    fn read_slice(read: &mut impl Read, slice: &mut [Self]) -> UnitResult;

    /// Write this value to the writer.
    fn write(self, write: &mut impl Write) -> UnitResult;

    /// Write all values of that slice to the writer.
    fn write_slice(write: &mut impl Write, slice: &[Self]) -> UnitResult;

    /// Read as many values of type `Self` as specified with `data_size`.
    ///
    /// This method will not allocate more memory than `soft_max` at once,
    /// so that a corrupt size field cannot trigger a huge allocation
    /// before the missing bytes are noticed.
    #[inline]
    fn read_vec(read: &mut impl Read, data_size: usize, soft_max: usize) -> Result<Vec<Self>> {
        let mut data = Vec::new();
        let soft_max = soft_max.max(1);

        // do not allocate more than $chunks memory at once
        // (most of the time, this loop will run only once)
        while data.len() < data_size {
            let chunk_start = data.len();
            let chunk_end = (chunk_start + soft_max).min(data_size);

            data.resize(chunk_end, Self::default());
            Self::read_slice(read, &mut data[chunk_start .. chunk_end])?;
        }

        Ok(data)
    }
}


macro_rules! implement_data_for_primitive {
    ($kind: ident) => {
        impl Data for $kind {
            #[inline]
            fn read(read: &mut impl Read) -> Result<Self> {
                Ok(read.read_from_little_endian()?)
            }

            #[inline]
            fn write(self, write: &mut impl Write) -> Result<()> {
                write.write_as_little_endian(&self)?;
                Ok(())
            }

            #[inline]
            fn read_slice(read: &mut impl Read, slice: &mut [Self]) -> Result<()> {
                read.read_from_little_endian_into(slice)?;
                Ok(())
            }

            #[inline]
            fn write_slice(write: &mut impl Write, slice: &[Self]) -> Result<()> {
                write.write_as_little_endian(slice)?;
                Ok(())
            }
        }
    };
}

implement_data_for_primitive!(u8);
implement_data_for_primitive!(u16);
implement_data_for_primitive!(u32);
implement_data_for_primitive!(u64);


/// Read exactly the specified bytes, returning `Error::Invalid` with the message if they differ.
pub fn expect_bytes(read: &mut impl Read, expected: &[u8], error_message: &'static str) -> UnitResult {
    let mut actual = vec![0_u8; expected.len()];
    u8::read_slice(read, &mut actual)?;

    if actual == expected { Ok(()) }
    else { Err(Error::invalid(error_message)) }
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn little_endian_layout() {
        let mut bytes = Vec::new();
        0x0102_u16.write(&mut bytes).unwrap();
        0x0304_0506_u32.write(&mut bytes).unwrap();
        assert_eq!(bytes, vec![0x02, 0x01, 0x06, 0x05, 0x04, 0x03]);

        let mut read = bytes.as_slice();
        assert_eq!(u16::read(&mut read).unwrap(), 0x0102);
        assert_eq!(u32::read(&mut read).unwrap(), 0x0304_0506);
        assert!(u8::read(&mut read).is_err());
    }

    #[test]
    fn read_vec_in_small_chunks() {
        let bytes: Vec<u8> = (0 .. 100).collect();
        let read = u8::read_vec(&mut bytes.as_slice(), 100, 7).unwrap();
        assert_eq!(read, bytes);

        let missing = u8::read_vec(&mut bytes.as_slice(), 101, 7);
        assert!(matches!(missing, Err(Error::Invalid(_))));
    }

    #[test]
    fn unexpected_magic_is_invalid() {
        assert!(expect_bytes(&mut b"BPRS".as_ref(), b"BPRS", "magic").is_ok());
        assert!(matches!(expect_bytes(&mut b"RIFF".as_ref(), b"BPRS", "magic"), Err(Error::Invalid(_))));
    }
}
