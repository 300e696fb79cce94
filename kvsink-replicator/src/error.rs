use kvsink::error::SinkError;
use std::backtrace::Backtrace;
use std::error::Error;
use std::fmt;

fn should_render_backtrace() -> bool {
    matches!(
        std::env::var("RUST_BACKTRACE").as_deref(),
        Ok("1") | Ok("full")
    )
}

/// Result type for replicator operations.
pub type ReplicatorResult<T> = Result<T, ReplicatorError>;

/// Backtrace captured when an error variant is built.
pub struct CapturedBacktrace(Backtrace);

impl CapturedBacktrace {
    fn capture() -> Self {
        Self(Backtrace::capture())
    }
}

impl fmt::Debug for CapturedBacktrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error type of the replicator binary.
#[derive(Debug)]
pub enum ReplicatorError {
    /// Error raised by the sink or its store.
    Sink(SinkError),
    /// Configuration could not be loaded, validated or applied.
    Config(Box<dyn Error + Send + Sync>, CapturedBacktrace),
    /// A line of the input is not a valid change record.
    Input {
        line: usize,
        source: serde_json::Error,
        backtrace: CapturedBacktrace,
    },
    /// Reading the input failed.
    Io(std::io::Error, CapturedBacktrace),
}

impl ReplicatorError {
    /// Returns a short category label for this error.
    pub fn category(&self) -> &'static str {
        match self {
            ReplicatorError::Sink(_) => "sink error",
            ReplicatorError::Config(_, _) => "configuration error",
            ReplicatorError::Input { .. } => "input error",
            ReplicatorError::Io(_, _) => "i/o error",
        }
    }

    /// Returns the backtrace for this error.
    pub fn backtrace(&self) -> Option<&Backtrace> {
        match self {
            ReplicatorError::Sink(err) => err.backtrace(),
            ReplicatorError::Config(_, cb) => Some(&cb.0),
            ReplicatorError::Input { backtrace, .. } => Some(&backtrace.0),
            ReplicatorError::Io(_, cb) => Some(&cb.0),
        }
    }

    /// Creates a configuration error from any error.
    pub fn config<E: Error + Send + Sync + 'static>(err: E) -> Self {
        ReplicatorError::Config(Box::new(err), CapturedBacktrace::capture())
    }

    /// Creates an input error for the 1-based `line`.
    pub fn input(line: usize, source: serde_json::Error) -> Self {
        ReplicatorError::Input {
            line,
            source,
            backtrace: CapturedBacktrace::capture(),
        }
    }

    /// Returns a report for terminal output, with causes and, if enabled, the backtrace.
    pub fn render_report(&self) -> String {
        let mut out = String::new();
        out.push_str("replicator failed\n");
        out.push_str(&format!("category: {}\n", self.category()));
        out.push_str(&format!("error: {self}\n"));

        // Aggregated sink errors already list every failure in their display output.
        if !matches!(self, ReplicatorError::Sink(err) if err.errors().is_some()) {
            let mut source = Error::source(self);
            let mut idx = 1usize;
            while let Some(err) = source {
                out.push_str(&format!("cause {idx}: {err}\n"));
                source = err.source();
                idx += 1;
            }
        }

        if should_render_backtrace()
            && let Some(backtrace) = self.backtrace()
        {
            out.push_str("backtrace:\n");
            out.push_str(&backtrace.to_string());
            if !out.ends_with('\n') {
                out.push('\n');
            }
        }

        out
    }
}

impl fmt::Display for ReplicatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplicatorError::Sink(err) => write!(f, "{err}"),
            ReplicatorError::Config(source, _) => write!(f, "configuration error: {source}"),
            ReplicatorError::Input { line, source, .. } => {
                write!(f, "invalid change record on line {line}: {source}")
            }
            ReplicatorError::Io(source, _) => write!(f, "i/o error: {source}"),
        }
    }
}

impl Error for ReplicatorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ReplicatorError::Sink(err) => err.source(),
            ReplicatorError::Config(source, _) => Some(source.as_ref()),
            ReplicatorError::Input { source, .. } => Some(source),
            ReplicatorError::Io(source, _) => Some(source),
        }
    }
}

impl From<std::io::Error> for ReplicatorError {
    fn from(err: std::io::Error) -> Self {
        ReplicatorError::Io(err, CapturedBacktrace::capture())
    }
}

impl From<SinkError> for ReplicatorError {
    fn from(err: SinkError) -> Self {
        ReplicatorError::Sink(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvsink::error::ErrorKind;

    #[test]
    fn test_report_lists_category_and_causes() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ReplicatorError::input(3, source);

        let report = err.render_report();

        assert!(report.starts_with("replicator failed\n"));
        assert!(report.contains("category: input error\n"));
        assert!(report.contains("invalid change record on line 3"));
        assert!(report.contains("cause 1: "));
    }

    #[test]
    fn test_sink_errors_keep_their_kind() {
        let err: ReplicatorError =
            SinkError::from((ErrorKind::DestinationWriteFailed, "Destination batch execution failed"))
                .into();

        assert_eq!(err.category(), "sink error");
        assert!(matches!(
            err,
            ReplicatorError::Sink(ref sink) if sink.kind() == ErrorKind::DestinationWriteFailed
        ));
    }
}
