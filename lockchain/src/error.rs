use std::collections::TryReserveError;
use std::fmt;

/// Errors raised while building or resizing a table.
///
/// Looking up, inserting or erasing a key never fails; a missing key is
/// reported as `None` or `false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A table needs at least one bucket.
    ZeroBuckets,
    /// The bucket array could not be allocated.
    Alloc(TryReserveError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ZeroBuckets => write!(f, "a table cannot have zero buckets"),
            Error::Alloc(err) => write!(f, "failed to allocate bucket array: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ZeroBuckets => None,
            Error::Alloc(err) => Some(err),
        }
    }
}

impl From<TryReserveError> for Error {
    fn from(err: TryReserveError) -> Self {
        Error::Alloc(err)
    }
}
