use std::error;
use std::fmt;

use tokio_postgres::error::SqlState;

/// Result type of every fallible pipeline operation.
pub type EltResult<T> = Result<T, EltError>;

/// Error raised by the pipeline.
///
/// Every error carries an [`ErrorKind`] used to decide how callers react, a static description
/// and optionally a dynamic detail such as the offending path or the driver message.
#[derive(Debug, Clone)]
pub struct EltError {
    repr: ErrorRepr,
}

#[derive(Debug, Clone)]
enum ErrorRepr {
    WithDescription(ErrorKind, &'static str),
    WithDescriptionAndDetail(ErrorKind, &'static str, String),
}

/// Categories of failures. All of them are fatal to the stage they happen in.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    // Input errors
    MissingInput,

    // Store errors
    ConnectionFailed,
    ReadFailed,
    WriteFailed,

    // Data errors
    ParseError,
    ConversionError,

    // Transform errors
    TransformFailed,

    // Configuration errors
    ConfigError,

    // IO errors
    IoError,

    // Security errors
    EncryptionError,
}

impl EltError {
    pub fn kind(&self) -> ErrorKind {
        match self.repr {
            ErrorRepr::WithDescription(kind, _)
            | ErrorRepr::WithDescriptionAndDetail(kind, _, _) => kind,
        }
    }

    pub fn description(&self) -> &'static str {
        match self.repr {
            ErrorRepr::WithDescription(_, desc)
            | ErrorRepr::WithDescriptionAndDetail(_, desc, _) => desc,
        }
    }

    pub fn detail(&self) -> Option<&str> {
        match self.repr {
            ErrorRepr::WithDescriptionAndDetail(_, _, ref detail) => Some(detail.as_str()),
            ErrorRepr::WithDescription(_, _) => None,
        }
    }

    /// Classifies a Postgres error raised while doing work of `kind`.
    ///
    /// Failures to reach or authenticate against the store become
    /// [`ErrorKind::ConnectionFailed`] whatever the operation was.
    pub fn from_postgres(
        err: tokio_postgres::Error,
        kind: ErrorKind,
        description: &'static str,
    ) -> EltError {
        if is_connection_error(&err) {
            return EltError::from((
                ErrorKind::ConnectionFailed,
                "Postgres connection failed",
                err.to_string(),
            ));
        }

        EltError::from((kind, description, err.to_string()))
    }
}

/// Returns `true` if `err` means the store could not be reached or refused the session.
fn is_connection_error(err: &tokio_postgres::Error) -> bool {
    if err.is_closed() {
        return true;
    }

    match err.code() {
        Some(sqlstate) => {
            let code = sqlstate.code();
            // 08: connection exception, 28: invalid authorization, 57P0x: shutdown/recovery.
            code.starts_with("08")
                || code.starts_with("28")
                || code.starts_with("57P0")
                || *sqlstate == SqlState::INVALID_CATALOG_NAME
                || *sqlstate == SqlState::TOO_MANY_CONNECTIONS
        }
        // Errors without a SQL state come from the transport or the protocol.
        None => true,
    }
}

impl PartialEq for EltError {
    fn eq(&self, other: &EltError) -> bool {
        self.kind() == other.kind()
    }
}

impl fmt::Display for EltError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self.repr {
            ErrorRepr::WithDescription(kind, desc) => {
                fmt::Debug::fmt(&kind, f)?;
                f.write_str(": ")?;
                desc.fmt(f)
            }
            ErrorRepr::WithDescriptionAndDetail(kind, desc, ref detail) => {
                fmt::Debug::fmt(&kind, f)?;
                f.write_str(": ")?;
                desc.fmt(f)?;
                f.write_str(" -> ")?;
                detail.fmt(f)
            }
        }
    }
}

impl error::Error for EltError {}

impl From<(ErrorKind, &'static str)> for EltError {
    fn from((kind, desc): (ErrorKind, &'static str)) -> EltError {
        EltError {
            repr: ErrorRepr::WithDescription(kind, desc),
        }
    }
}

impl From<(ErrorKind, &'static str, String)> for EltError {
    fn from((kind, desc, detail): (ErrorKind, &'static str, String)) -> EltError {
        EltError {
            repr: ErrorRepr::WithDescriptionAndDetail(kind, desc, detail),
        }
    }
}

impl From<std::io::Error> for EltError {
    fn from(err: std::io::Error) -> EltError {
        EltError::from((ErrorKind::IoError, "I/O error occurred", err.to_string()))
    }
}

impl From<csv::Error> for EltError {
    fn from(err: csv::Error) -> EltError {
        let description = match err.kind() {
            csv::ErrorKind::Io(_) => "Csv file could not be read",
            csv::ErrorKind::Utf8 { .. } => "Csv file is not valid UTF-8",
            csv::ErrorKind::UnequalLengths { .. } => "Csv record has an unexpected field count",
            _ => "Csv file could not be parsed",
        };

        EltError::from((ErrorKind::ParseError, description, err.to_string()))
    }
}

impl From<std::num::ParseIntError> for EltError {
    fn from(err: std::num::ParseIntError) -> EltError {
        EltError::from((
            ErrorKind::ConversionError,
            "Integer parsing failed",
            err.to_string(),
        ))
    }
}

impl From<std::num::ParseFloatError> for EltError {
    fn from(err: std::num::ParseFloatError) -> EltError {
        EltError::from((
            ErrorKind::ConversionError,
            "Float parsing failed",
            err.to_string(),
        ))
    }
}

impl From<bigdecimal::ParseBigDecimalError> for EltError {
    fn from(err: bigdecimal::ParseBigDecimalError) -> EltError {
        EltError::from((
            ErrorKind::ConversionError,
            "Numeric parsing failed",
            err.to_string(),
        ))
    }
}

impl From<chrono::ParseError> for EltError {
    fn from(err: chrono::ParseError) -> EltError {
        EltError::from((
            ErrorKind::ConversionError,
            "Chrono parse failed",
            err.to_string(),
        ))
    }
}

impl From<uuid::Error> for EltError {
    fn from(err: uuid::Error) -> EltError {
        EltError::from((
            ErrorKind::ConversionError,
            "UUID parsing failed",
            err.to_string(),
        ))
    }
}

impl From<rustls::Error> for EltError {
    fn from(err: rustls::Error) -> EltError {
        EltError::from((
            ErrorKind::EncryptionError,
            "TLS configuration failed",
            err.to_string(),
        ))
    }
}

impl From<elt_config::shared::ValidationError> for EltError {
    fn from(err: elt_config::shared::ValidationError) -> EltError {
        EltError::from((
            ErrorKind::ConfigError,
            "Configuration is invalid",
            err.to_string(),
        ))
    }
}
