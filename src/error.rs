use thiserror::Error;

/// Builds an [`Error::Malformed`] from a message or a format string.
macro_rules! malformed {
    ($msg:expr) => {
        $crate::error::Error::Malformed {
            message: $msg.to_string(),
        }
    };

    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::Error::Malformed {
            message: format!($fmt, $($arg)*),
        }
    };
}

pub(crate) use malformed;

/// Errors surfaced by the class-file walker.
///
/// There is a single category: the buffer does not have the shape the walker
/// needs to get past a structure (too short, a declared length or count that
/// points past the end, a constant-pool reference that is not usable). A query
/// either answers definitively or fails with this error; there is no partial
/// result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("malformed class file: {message}")]
    Malformed { message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
