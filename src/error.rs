use thiserror::Error;

#[derive(Debug, Clone, Error, Eq, PartialEq)]
/// Errors produced while parsing unit test input series.
pub enum SeriesError {
  #[error("Empty values expression.")]
  EmptyExpression,

  #[error("Malformed value \"{0}\": {1}.")]
  MalformedExpression(String, String),

  #[error("Unsupported operation in \"{0}\": stale doesn't support operations.")]
  UnsupportedOperation(String),

  #[error("Invalid series selector \"{0}\": {1}.")]
  InvalidSelector(String, String),

  #[error("Invalid interval: {0}.")]
  InvalidInterval(String),

  #[error("Unsupported series selector \"{0}\": `or` filters aren't supported.")]
  UnsupportedSelector(String),

  #[error("Failed to parse input series #{index} ({selector}): {source}")]
  InputSeries {
    index: usize,
    selector: String,
    #[source]
    source: Box<SeriesError>,
  },
}

impl SeriesError {
  pub(crate) fn malformed(token: &str, reason: &str) -> Self {
    SeriesError::MalformedExpression(token.to_string(), reason.to_string())
  }

  pub(crate) fn invalid_selector(selector: &str, reason: &str) -> Self {
    SeriesError::InvalidSelector(selector.to_string(), reason.to_string())
  }

  /// Returns the innermost error, skipping any batch context.
  pub fn root(&self) -> &SeriesError {
    match self {
      SeriesError::InputSeries { source, .. } => source.root(),
      other => other,
    }
  }
}

pub type SeriesResult<T> = Result<T, SeriesError>;
