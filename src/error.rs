
//! Error type definitions.

use std::borrow::Cow;
use std::convert::TryFrom;
use std::error;
use std::fmt;
use std::io::ErrorKind;

pub use std::io::Error as IoError;
pub use std::io::Result as IoResult;


/// A result that may contain an error.
pub type Result<T> = std::result::Result<T, Error>;

/// A result that, if ok, contains nothing, and otherwise contains an error.
pub type UnitResult = Result<()>;


/// An error that may happen while compressing or decompressing an image.
/// Distinguishes between four types of errors:
/// rejected parameters, malformed data, unsupported content, and file system errors.
#[derive(Debug)]
pub enum Error {

    /// A parameter passed by the caller is outside its accepted range,
    /// for example a quality that is not within `1 ..= 99`.
    /// This is detected before any work begins.
    Parameter(Cow<'static, str>),

    /// The compressed data is malformed: the container header,
    /// the code table, or the packed bit stream is inconsistent.
    Invalid(Cow<'static, str>),

    /// The contents are valid, but this implementation cannot handle them,
    /// for example a container from a newer version.
    NotSupported(Cow<'static, str>),

    /// The underlying byte stream could not be read or written.
    Io(IoError),
}


impl Error {

    /// Create an error of the variant `Parameter`.
    pub(crate) fn parameter(message: impl Into<Cow<'static, str>>) -> Self {
        Error::Parameter(message.into())
    }

    /// Create an error of the variant `Invalid`.
    pub(crate) fn invalid(message: impl Into<Cow<'static, str>>) -> Self {
        Error::Invalid(message.into())
    }

    /// Create an error of the variant `NotSupported`.
    pub(crate) fn unsupported(message: impl Into<Cow<'static, str>>) -> Self {
        Error::NotSupported(message.into())
    }
}

/// Enable using the `?` operator on `std::io::Result`.
impl From<IoError> for Error {
    fn from(error: IoError) -> Self {
        // a truncated container reads as an unexpected end of file
        if error.kind() == ErrorKind::UnexpectedEof {
            Error::invalid("reference to missing bytes")
        }
        else {
            Error::Io(error)
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => err.fmt(formatter),
            Error::Parameter(message) => write!(formatter, "invalid parameter: {}", message),
            Error::NotSupported(message) => write!(formatter, "not supported: {}", message),
            Error::Invalid(message) => write!(formatter, "invalid compressed data: {}", message),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}


/// Panics on overflow, which is only possible on exotic targets.
#[inline]
pub(crate) fn usize_to_u64(value: usize) -> u64 {
    u64::try_from(value).expect("(usize as u64) overflowed")
}

/// Return error on overflow, as the value comes from untrusted data.
#[inline]
pub(crate) fn u64_to_usize(value: u64, error_message: &'static str) -> Result<usize> {
    usize::try_from(value).map_err(|_| Error::invalid(error_message))
}

/// Return error on overflow, as the value comes from untrusted data.
#[inline]
pub(crate) fn u32_to_usize(value: u32, error_message: &'static str) -> Result<usize> {
    usize::try_from(value).map_err(|_| Error::invalid(error_message))
}

/// Return error on overflow, as the image may be larger than the container can describe.
#[inline]
pub(crate) fn usize_to_u32(value: usize, error_message: &'static str) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::parameter(error_message))
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn truncated_streams_are_invalid_data() {
        let error: Error = IoError::new(ErrorKind::UnexpectedEof, "eof").into();
        assert!(matches!(error, Error::Invalid(_)));

        let error: Error = IoError::new(ErrorKind::PermissionDenied, "denied").into();
        assert!(matches!(error, Error::Io(_)));
    }

    #[test]
    fn display_names_the_kind() {
        assert_eq!(
            Error::parameter("quality 0").to_string(),
            "invalid parameter: quality 0"
        );

        assert!(Error::invalid("bit count").to_string().starts_with("invalid compressed data"));
    }
}
