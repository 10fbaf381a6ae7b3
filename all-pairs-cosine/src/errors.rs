//! Error definitions.
use std::error::Error;
use std::{fmt, io, result};

/// A specialized Result type for this library.
pub type Result<T, E = AllPairsError> = result::Result<T, E>;

/// Errors in this library.
#[derive(Debug)]
pub enum AllPairsError {
    /// Contains [`InputError`].
    Input(InputError),
    /// Contains [`DataError`].
    Data(DataError),
    /// Contains [`ResourceError`].
    ResourceExhausted(ResourceError),
    /// Failure while writing a similar pair to the caller's sink.
    Output(io::Error),
}

impl fmt::Display for AllPairsError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Input(e) => e.fmt(f),
            Self::Data(e) => e.fmt(f),
            Self::ResourceExhausted(e) => e.fmt(f),
            Self::Output(e) => write!(f, "OutputError: {e}"),
        }
    }
}

impl Error for AllPairsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Output(e) => Some(e),
            _ => None,
        }
    }
}

impl AllPairsError {
    pub(crate) fn input<S>(msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::Input(InputError { msg: msg.into() })
    }

    pub(crate) fn data<S>(msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::Data(DataError { msg: msg.into() })
    }

    pub(crate) fn resource<S>(msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::ResourceExhausted(ResourceError { msg: msg.into() })
    }
}

/// Error used when the input argument is invalid.
#[derive(Debug)]
pub struct InputError {
    msg: String,
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InputError: {}", self.msg)
    }
}

/// Error used when a data source fails or yields a malformed record.
#[derive(Debug)]
pub struct DataError {
    msg: String,
}

impl DataError {
    /// Gets the human-readable description reported by the data source.
    pub fn message(&self) -> &str {
        &self.msg
    }
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "DataError: {}", self.msg)
    }
}

/// Error used when the RAM budget cannot admit even a single record.
#[derive(Debug)]
pub struct ResourceError {
    msg: String,
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ResourceError: {}", self.msg)
    }
}
