use std::error;
use std::fmt;

/// Convenient result type for pipeline operations using [`IngestError`] as the error type.
pub type IngestResult<T> = Result<T, IngestError>;

/// Main error type for pipeline operations.
///
/// [`IngestError`] can represent a single error, an error with additional
/// detail, or multiple aggregated errors, behind one unified interface.
#[derive(Debug, Clone)]
pub struct IngestError {
    repr: ErrorRepr,
}

/// Internal representation of error data.
///
/// Users should not interact with this type directly but use [`IngestError`]
/// methods instead.
#[derive(Debug, Clone)]
enum ErrorRepr {
    /// Error with kind and static description
    WithDescription(ErrorKind, &'static str),
    /// Error with kind, static description, and dynamic detail
    WithDescriptionAndDetail(ErrorKind, &'static str, String),
    /// Multiple aggregated errors
    Many(Vec<IngestError>),
}

/// Specific categories of errors that can occur during pipeline operations.
///
/// Error kinds are organized by functional area and failure mode to enable
/// appropriate handling strategies.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    // Configuration errors, fatal at construction time and never retried.
    ConfigError,
    UnknownPluginType,
    ValidationError,

    // Plugin execution errors.
    SourceError,
    SourceIoError,
    TransformError,
    FilterError,
    StorageError,

    // Transport & persistence errors.
    QueueError,
    CheckpointError,
    RecordNotFound,

    // Data errors.
    ConversionError,
    InvalidData,
    SerializationError,
    DeserializationError,

    // IO errors.
    IoError,

    // State & workflow errors.
    InvalidState,
    WorkerPanic,

    // Unknown / uncategorized.
    Unknown,
}

impl IngestError {
    /// Creates an [`IngestError`] containing multiple aggregated errors.
    ///
    /// Useful when multiple operations fail and all failures should be
    /// reported rather than just the first one.
    pub fn many(errors: Vec<IngestError>) -> IngestError {
        IngestError {
            repr: ErrorRepr::Many(errors),
        }
    }

    /// Returns the [`ErrorKind`] of this error.
    ///
    /// For multiple errors, returns the kind of the first error or
    /// [`ErrorKind::Unknown`] if the error list is empty.
    pub fn kind(&self) -> ErrorKind {
        match self.repr {
            ErrorRepr::WithDescription(kind, _)
            | ErrorRepr::WithDescriptionAndDetail(kind, _, _) => kind,
            ErrorRepr::Many(ref errors) => errors
                .first()
                .map(|err| err.kind())
                .unwrap_or(ErrorKind::Unknown),
        }
    }

    /// Returns all [`ErrorKind`]s present in this error.
    pub fn kinds(&self) -> Vec<ErrorKind> {
        match self.repr {
            ErrorRepr::WithDescription(kind, _)
            | ErrorRepr::WithDescriptionAndDetail(kind, _, _) => vec![kind],
            ErrorRepr::Many(ref errors) => errors
                .iter()
                .flat_map(|err| err.kinds())
                .collect::<Vec<_>>(),
        }
    }

    /// Returns the detailed error information if available.
    ///
    /// For multiple errors, returns the detail of the first error that has
    /// one.
    pub fn detail(&self) -> Option<&str> {
        match self.repr {
            ErrorRepr::WithDescriptionAndDetail(_, _, ref detail) => Some(detail.as_str()),
            ErrorRepr::Many(ref errors) => errors.iter().find_map(|e| e.detail()),
            _ => None,
        }
    }
}

impl PartialEq for IngestError {
    fn eq(&self, other: &IngestError) -> bool {
        match (&self.repr, &other.repr) {
            (ErrorRepr::WithDescription(kind_a, _), ErrorRepr::WithDescription(kind_b, _)) => {
                kind_a == kind_b
            }
            (
                ErrorRepr::WithDescriptionAndDetail(kind_a, _, _),
                ErrorRepr::WithDescriptionAndDetail(kind_b, _, _),
            ) => kind_a == kind_b,
            (ErrorRepr::Many(errors_a), ErrorRepr::Many(errors_b)) => {
                errors_a.len() == errors_b.len()
                    && errors_a.iter().zip(errors_b.iter()).all(|(a, b)| a == b)
            }
            _ => false,
        }
    }
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self.repr {
            ErrorRepr::WithDescription(kind, desc) => {
                fmt::Debug::fmt(&kind, f)?;
                f.write_str(": ")?;
                desc.fmt(f)?;

                Ok(())
            }
            ErrorRepr::WithDescriptionAndDetail(kind, desc, ref detail) => {
                fmt::Debug::fmt(&kind, f)?;
                f.write_str(": ")?;
                desc.fmt(f)?;
                f.write_str(" -> ")?;
                detail.fmt(f)?;

                Ok(())
            }
            ErrorRepr::Many(ref errors) => {
                if errors.is_empty() {
                    write!(f, "Multiple errors occurred (empty)")?;
                } else if errors.len() == 1 {
                    errors[0].fmt(f)?;
                } else {
                    write!(f, "Multiple errors occurred ({} total):", errors.len())?;
                    for (i, error) in errors.iter().enumerate() {
                        write!(f, "\n  {}: {}", i + 1, error)?;
                    }
                }
                Ok(())
            }
        }
    }
}

impl error::Error for IngestError {}

/// Creates an [`IngestError`] from an error kind and static description.
impl From<(ErrorKind, &'static str)> for IngestError {
    fn from((kind, desc): (ErrorKind, &'static str)) -> IngestError {
        IngestError {
            repr: ErrorRepr::WithDescription(kind, desc),
        }
    }
}

/// Creates an [`IngestError`] from an error kind, static description, and dynamic detail.
impl From<(ErrorKind, &'static str, String)> for IngestError {
    fn from((kind, desc, detail): (ErrorKind, &'static str, String)) -> IngestError {
        IngestError {
            repr: ErrorRepr::WithDescriptionAndDetail(kind, desc, detail),
        }
    }
}

/// Creates an [`IngestError`] from a vector of errors for aggregation.
impl<E> From<Vec<E>> for IngestError
where
    E: Into<IngestError>,
{
    fn from(errors: Vec<E>) -> IngestError {
        IngestError {
            repr: ErrorRepr::Many(errors.into_iter().map(Into::into).collect()),
        }
    }
}

/// Converts [`std::io::Error`] to [`IngestError`] with [`ErrorKind::IoError`].
impl From<std::io::Error> for IngestError {
    fn from(err: std::io::Error) -> IngestError {
        IngestError {
            repr: ErrorRepr::WithDescriptionAndDetail(
                ErrorKind::IoError,
                "I/O error occurred",
                err.to_string(),
            ),
        }
    }
}

/// Converts [`serde_json::Error`] to [`IngestError`] with appropriate error kind.
///
/// Maps to [`ErrorKind::SerializationError`] or
/// [`ErrorKind::DeserializationError`] based on error classification.
impl From<serde_json::Error> for IngestError {
    fn from(err: serde_json::Error) -> IngestError {
        let (kind, description) = match err.classify() {
            serde_json::error::Category::Io => (ErrorKind::IoError, "JSON I/O operation failed"),
            serde_json::error::Category::Syntax
            | serde_json::error::Category::Data
            | serde_json::error::Category::Eof => (
                ErrorKind::DeserializationError,
                "JSON deserialization failed",
            ),
        };

        IngestError {
            repr: ErrorRepr::WithDescriptionAndDetail(kind, description, err.to_string()),
        }
    }
}

/// Converts [`reqwest::Error`] to [`IngestError`] with [`ErrorKind::SourceIoError`].
impl From<reqwest::Error> for IngestError {
    fn from(err: reqwest::Error) -> IngestError {
        IngestError {
            repr: ErrorRepr::WithDescriptionAndDetail(
                ErrorKind::SourceIoError,
                "HTTP request failed",
                err.to_string(),
            ),
        }
    }
}

/// Converts [`quick_xml::DeError`] to [`IngestError`] with [`ErrorKind::DeserializationError`].
impl From<quick_xml::DeError> for IngestError {
    fn from(err: quick_xml::DeError) -> IngestError {
        IngestError {
            repr: ErrorRepr::WithDescriptionAndDetail(
                ErrorKind::DeserializationError,
                "XML deserialization failed",
                err.to_string(),
            ),
        }
    }
}

/// Converts [`chrono::ParseError`] to [`IngestError`] with [`ErrorKind::ConversionError`].
impl From<chrono::ParseError> for IngestError {
    fn from(err: chrono::ParseError) -> IngestError {
        IngestError {
            repr: ErrorRepr::WithDescriptionAndDetail(
                ErrorKind::ConversionError,
                "Timestamp parsing failed",
                err.to_string(),
            ),
        }
    }
}

/// Converts [`ingest_config::shared::ValidationError`] to [`IngestError`] with
/// [`ErrorKind::ConfigError`].
impl From<ingest_config::shared::ValidationError> for IngestError {
    fn from(err: ingest_config::shared::ValidationError) -> IngestError {
        IngestError {
            repr: ErrorRepr::WithDescriptionAndDetail(
                ErrorKind::ConfigError,
                "Pipeline configuration is invalid",
                err.to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{bail, ingest_error};

    #[test]
    fn test_simple_error_creation() {
        let err = IngestError::from((ErrorKind::QueueError, "Queue send failed"));
        assert_eq!(err.kind(), ErrorKind::QueueError);
        assert_eq!(err.detail(), None);
        assert_eq!(err.kinds(), vec![ErrorKind::QueueError]);
    }

    #[test]
    fn test_error_with_detail() {
        let err = IngestError::from((
            ErrorKind::UnknownPluginType,
            "Unknown transformer type",
            "no transformer named `custom.Missing` is registered".to_string(),
        ));
        assert_eq!(err.kind(), ErrorKind::UnknownPluginType);
        assert!(err.detail().unwrap().contains("custom.Missing"));
    }

    #[test]
    fn test_multiple_errors() {
        let errors = vec![
            IngestError::from((ErrorKind::ValidationError, "Invalid config")),
            IngestError::from((ErrorKind::ConversionError, "Type mismatch")),
            IngestError::from((ErrorKind::IoError, "Connection timeout")),
        ];
        let multi_err = IngestError::many(errors);

        assert_eq!(multi_err.kind(), ErrorKind::ValidationError);
        assert_eq!(
            multi_err.kinds(),
            vec![
                ErrorKind::ValidationError,
                ErrorKind::ConversionError,
                ErrorKind::IoError
            ]
        );
        assert_eq!(multi_err.detail(), None);
    }

    #[test]
    fn test_empty_multiple_errors() {
        let multi_err = IngestError::many(vec![]);
        assert_eq!(multi_err.kind(), ErrorKind::Unknown);
        assert_eq!(multi_err.kinds(), vec![]);
    }

    #[test]
    fn test_error_display_with_detail() {
        let err = IngestError::from((
            ErrorKind::StorageError,
            "Record write failed",
            "table `articles` rejected the put".to_string(),
        ));
        let display_str = format!("{err}");
        assert!(display_str.contains("StorageError"));
        assert!(display_str.contains("Record write failed"));
        assert!(display_str.contains("articles"));
    }

    #[test]
    fn test_macro_usage() {
        let err = ingest_error!(ErrorKind::ValidationError, "Invalid data format");
        assert_eq!(err.kind(), ErrorKind::ValidationError);
        assert_eq!(err.detail(), None);

        let err_with_detail = ingest_error!(
            ErrorKind::ConversionError,
            "Type conversion failed",
            "cannot convert string to integer: 'abc'"
        );
        assert_eq!(err_with_detail.kind(), ErrorKind::ConversionError);
        assert!(err_with_detail.detail().unwrap().contains("cannot convert"));
    }

    #[test]
    fn test_bail_macro() {
        fn test_function() -> IngestResult<i32> {
            bail!(ErrorKind::ValidationError, "Test error");
        }

        let err = test_function().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);
    }

    #[test]
    fn test_json_error_classification() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err = IngestError::from(json_err);
        assert_eq!(err.kind(), ErrorKind::DeserializationError);
    }
}
