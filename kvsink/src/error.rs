//! Error type of the sink.
//!
//! A [`SinkError`] is either one failure, classified by an [`ErrorKind`] and carrying the call
//! site and a backtrace, or the aggregation of the failures of several destination batches
//! within one invocation.

use std::backtrace::Backtrace;
use std::error;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

/// Result type of sink operations.
pub type SinkResult<T> = Result<T, SinkError>;

/// Classification of sink failures.
///
/// Startup kinds prevent the task from running. Execution kinds fail a single invocation and
/// are left to the host to retry.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    // Startup
    ConfigError,
    StoreConnectionFailed,
    DestinationCreationFailed,

    // Answers of the store while resolving a destination
    DestinationAlreadyExists,
    DestinationMissing,

    // Execution
    DestinationWriteFailed,
    DestinationError,

    /// Kind of an aggregation without any failure.
    Unknown,

    #[cfg(feature = "failpoints")]
    InjectedFault,
}

#[derive(Debug, Clone)]
struct Failure {
    kind: ErrorKind,
    description: &'static str,
    detail: Option<String>,
    source: Option<Arc<dyn error::Error + Send + Sync>>,
    location: &'static Location<'static>,
    backtrace: Arc<Backtrace>,
}

#[derive(Debug, Clone)]
enum ErrorRepr {
    Single(Box<Failure>),
    /// Failures of several destination batches of the same invocation.
    Many(Vec<SinkError>),
}

/// Error returned by the sink and by store implementations.
#[derive(Debug, Clone)]
pub struct SinkError {
    repr: ErrorRepr,
}

impl SinkError {
    #[track_caller]
    fn single(kind: ErrorKind, description: &'static str, detail: Option<String>) -> Self {
        SinkError {
            repr: ErrorRepr::Single(Box::new(Failure {
                kind,
                description,
                detail,
                source: None,
                location: Location::caller(),
                backtrace: Arc::new(Backtrace::capture()),
            })),
        }
    }

    /// Returns the kind of this error, the kind of the first failure for an aggregation.
    pub fn kind(&self) -> ErrorKind {
        match &self.repr {
            ErrorRepr::Single(failure) => failure.kind,
            ErrorRepr::Many(errors) => errors
                .first()
                .map(SinkError::kind)
                .unwrap_or(ErrorKind::Unknown),
        }
    }

    /// Returns the kind of every failure contained in this error.
    pub fn kinds(&self) -> Vec<ErrorKind> {
        match &self.repr {
            ErrorRepr::Single(failure) => vec![failure.kind],
            ErrorRepr::Many(errors) => errors.iter().flat_map(SinkError::kinds).collect(),
        }
    }

    /// Returns the aggregated errors, if this error is an aggregation.
    pub fn errors(&self) -> Option<&[SinkError]> {
        match &self.repr {
            ErrorRepr::Single(_) => None,
            ErrorRepr::Many(errors) => Some(errors),
        }
    }

    /// Returns the backtrace captured when a single failure was created.
    pub fn backtrace(&self) -> Option<&Backtrace> {
        match &self.repr {
            ErrorRepr::Single(failure) => Some(&failure.backtrace),
            ErrorRepr::Many(_) => None,
        }
    }

    /// Attaches the error that caused this one. Ignored on aggregations.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        if let ErrorRepr::Single(failure) = &mut self.repr {
            failure.source = Some(Arc::new(source));
        }

        self
    }
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            ErrorRepr::Single(failure) => {
                write!(
                    f,
                    "[{:?}] {} @ {}:{}",
                    failure.kind,
                    failure.description,
                    failure.location.file(),
                    failure.location.line()
                )?;

                if let Some(detail) = &failure.detail {
                    for line in detail.lines() {
                        write!(f, "\n  {line}")?;
                    }
                }

                Ok(())
            }
            ErrorRepr::Many(errors) => {
                write!(f, "{} failures", errors.len())?;

                for (index, error) in errors.iter().enumerate() {
                    let rendered = error.to_string();
                    let mut lines = rendered.lines();
                    write!(f, "\n  {}. {}", index + 1, lines.next().unwrap_or_default())?;
                    for line in lines {
                        write!(f, "\n     {line}")?;
                    }
                }

                Ok(())
            }
        }
    }
}

impl error::Error for SinkError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match &self.repr {
            ErrorRepr::Single(failure) => failure
                .source
                .as_deref()
                .map(|source| source as &(dyn error::Error + 'static)),
            ErrorRepr::Many(errors) => errors
                .first()
                .map(|error| error as &(dyn error::Error + 'static)),
        }
    }
}

impl From<(ErrorKind, &'static str)> for SinkError {
    #[track_caller]
    fn from((kind, description): (ErrorKind, &'static str)) -> SinkError {
        SinkError::single(kind, description, None)
    }
}

impl From<(ErrorKind, &'static str, String)> for SinkError {
    #[track_caller]
    fn from((kind, description, detail): (ErrorKind, &'static str, String)) -> SinkError {
        SinkError::single(kind, description, Some(detail))
    }
}

/// Aggregates errors. A single error is returned as is.
impl<E> From<Vec<E>> for SinkError
where
    E: Into<SinkError>,
{
    fn from(errors: Vec<E>) -> SinkError {
        let mut errors: Vec<SinkError> = errors.into_iter().map(Into::into).collect();

        if errors.len() == 1
            && let Some(error) = errors.pop()
        {
            return error;
        }

        SinkError {
            repr: ErrorRepr::Many(errors),
        }
    }
}

impl From<kvsink_config::shared::ValidationError> for SinkError {
    #[track_caller]
    fn from(err: kvsink_config::shared::ValidationError) -> SinkError {
        SinkError::single(
            ErrorKind::ConfigError,
            "Sink configuration is invalid",
            Some(err.to_string()),
        )
        .with_source(err)
    }
}
