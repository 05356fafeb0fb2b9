use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lru::LruCache;
use regex::Regex;
use tracing::trace;

use crate::ReconcileError;

/// Default number of compiled patterns kept by a [`PatternCache`].
pub const DEFAULT_PATTERN_CAPACITY: usize = 100;

/// A bounded, shareable cache of compiled regular expressions.
///
/// Lookups and inserts happen under a single lock, so two threads asking for
/// the same pattern never compile it twice. Once the cache holds more than
/// its capacity, the least recently used pattern is evicted.
///
/// Cloning the cache yields another handle to the same storage.
///
/// # Example
///
/// ```
/// # use svn_reconcile::PatternCache;
/// let cache = PatternCache::with_capacity(8);
/// let replaced = cache.replace_all("a::b//c", "[/:]+", ".")?;
/// assert_eq!(replaced, "a.b.c");
/// # Ok::<(), svn_reconcile::ReconcileError>(())
/// ```
#[derive(Clone)]
pub struct PatternCache {
    patterns: Arc<Mutex<LruCache<String, Arc<Regex>>>>,
}

impl std::fmt::Debug for PatternCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternCache")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .finish()
    }
}

impl Default for PatternCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_PATTERN_CAPACITY)
    }
}

impl PatternCache {
    /// Creates a cache holding [`DEFAULT_PATTERN_CAPACITY`] patterns.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cache holding at most `capacity` patterns (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            patterns: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    /// Returns the maximum number of cached patterns.
    pub fn capacity(&self) -> usize {
        self.lock().cap().get()
    }

    /// Returns the number of currently cached patterns.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the compiled form of `pattern`, compiling it on first use.
    pub fn regex(&self, pattern: &str) -> Result<Arc<Regex>, ReconcileError> {
        let mut patterns = self.lock();
        if let Some(regex) = patterns.get(pattern) {
            return Ok(regex.clone());
        }

        let regex = Arc::new(Regex::new(pattern).map_err(|source| {
            ReconcileError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            }
        })?);
        if let Some((evicted, _)) = patterns.push(pattern.to_string(), regex.clone()) {
            trace!(pattern = %evicted, "evicting cached pattern");
        }
        Ok(regex)
    }

    /// Whether `pattern` matches anywhere in `text`.
    pub fn is_match(&self, pattern: &str, text: &str) -> Result<bool, ReconcileError> {
        Ok(self.regex(pattern)?.is_match(text))
    }

    /// Splits `text` on every match of `pattern`.
    pub fn split(&self, pattern: &str, text: &str) -> Result<Vec<String>, ReconcileError> {
        Ok(self
            .regex(pattern)?
            .split(text)
            .map(str::to_string)
            .collect())
    }

    /// Replaces every match of `pattern` in `text` with `replacement`.
    pub fn replace_all(
        &self,
        text: &str,
        pattern: &str,
        replacement: &str,
    ) -> Result<String, ReconcileError> {
        Ok(self
            .regex(pattern)?
            .replace_all(text, replacement)
            .into_owned())
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, Arc<Regex>>> {
        self.patterns.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Turns a repository location into a name usable as a project name.
///
/// Runs of `/`, `\` and `:` collapse into a single `.`.
pub fn format_resource_name(cache: &PatternCache, name: &str) -> Result<String, ReconcileError> {
    cache.replace_all(name, r"[\\/:]+", ".")
}
