use thiserror::Error;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq)]
/// One error entry as reported by a repository backend.
pub struct BackendErrorItem {
    /// Backend-specific error code.
    pub code: u64,
    /// Human-readable error message, if any.
    pub message: Option<String>,
}

impl BackendErrorItem {
    /// Creates an error item from a code and message.
    pub fn new(code: u64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: Some(message.into()),
        }
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
/// A structured failure returned by a [`crate::RepositoryBackend`].
///
/// `context` is typically the path or URL the query was issued for and
/// `chain` is the backend-provided error stack.
pub struct BackendError {
    /// High-level context for the failure (for example, the queried path).
    pub context: Option<String>,
    /// The backend-provided error chain.
    pub chain: Vec<BackendErrorItem>,
}

impl BackendError {
    /// Creates a single-item error chain.
    pub fn new(code: u64, message: impl Into<String>) -> Self {
        Self {
            context: None,
            chain: vec![BackendErrorItem::new(code, message)],
        }
    }

    /// Attaches additional context to this error.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Returns a single-line, human-readable message.
    pub fn message_summary(&self) -> String {
        let mut messages = Vec::new();
        for err in &self.chain {
            if let Some(message) = err.message.as_deref()
                && !message.is_empty()
            {
                messages.push(message);
            }
        }
        if messages.is_empty() {
            "unknown error".to_string()
        } else {
            messages.join("; ")
        }
    }
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ctx) = self.context.as_deref()
            && !ctx.is_empty()
        {
            write!(f, "{ctx}: ")?;
        }
        write!(f, "{}", self.message_summary())
    }
}

#[derive(Debug, Error)]
#[non_exhaustive]
/// Errors returned by this crate.
pub enum ReconcileError {
    /// An `svn:externals` definition could not be parsed.
    #[error("malformed external ({reason}): {line}")]
    MalformedExternal {
        /// The offending definition line.
        line: String,
        /// What was wrong with it.
        reason: String,
    },
    /// The provided URL is syntactically invalid or cannot be resolved.
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    /// A revision string is neither a keyword, a number nor a date.
    #[error("invalid revision: {0}")]
    InvalidRevision(String),
    /// The provided repository path is invalid or unsafe.
    #[error("invalid path: {0}")]
    InvalidPath(String),
    /// A pattern handed to the [`crate::PatternCache`] failed to compile.
    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        /// The pattern source text.
        pattern: String,
        /// The compilation error.
        source: regex::Error,
    },
    /// A merge-aware log stream ended while merge groups were still open.
    #[error("log stream ended inside merge group(s) opened by r{open_revisions:?}")]
    TruncatedMergeGroup {
        /// Revisions of the still-open merge parents, outermost first.
        open_revisions: Vec<u64>,
    },
    /// The repository backend returned a failure.
    #[error("backend error: {0}")]
    Backend(BackendError),
}

impl From<BackendError> for ReconcileError {
    fn from(err: BackendError) -> Self {
        Self::Backend(err)
    }
}
