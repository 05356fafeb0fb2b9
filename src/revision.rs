//! Revision specifiers and revision ranges.

use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};

use crate::ReconcileError;

/// A revision specifier.
///
/// Only `Number`/`Number` and `Date`/`Date` pairs are ordered; symbolic
/// revisions compare equal to themselves and are otherwise unordered.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Revision {
    /// A concrete revision number.
    Number(u64),
    /// The youngest revision at a point in time.
    Date(DateTime<Utc>),
    /// The latest repository revision.
    Head,
    /// The working copy base revision.
    Base,
    /// The working copy working revision.
    Working,
    /// Last committed revision.
    Committed,
    /// The revision before the last committed one.
    Previous,
    /// First existing revision (unspecified).
    Start,
}

impl Revision {
    /// Parses a revision specifier.
    ///
    /// Accepts the keywords `START`, `BASE`, `WORKING`, `COMMITTED`, `HEAD`
    /// and `PREV` (case-insensitive), a non-negative number, or a date as
    /// `{YYYY-MM-DD}`, `YYYY-MM-DD` or RFC 3339.
    pub fn parse(input: &str) -> Result<Self, ReconcileError> {
        let raw = input.trim();
        let keyword = raw.to_ascii_uppercase();
        let parsed = match keyword.as_str() {
            "START" => Some(Self::Start),
            "BASE" => Some(Self::Base),
            "WORKING" => Some(Self::Working),
            "COMMITTED" => Some(Self::Committed),
            "HEAD" => Some(Self::Head),
            "PREV" => Some(Self::Previous),
            _ => None,
        };
        if let Some(rev) = parsed {
            return Ok(rev);
        }
        if let Ok(number) = raw.parse::<u64>() {
            return Ok(Self::Number(number));
        }
        let date = raw
            .strip_prefix('{')
            .and_then(|d| d.strip_suffix('}'))
            .unwrap_or(raw);
        if let Ok(parsed) = DateTime::parse_from_rfc3339(date) {
            return Ok(Self::Date(parsed.with_timezone(&Utc)));
        }
        if let Some(midnight) = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
        {
            return Ok(Self::Date(midnight.and_utc()));
        }
        Err(ReconcileError::InvalidRevision(raw.to_string()))
    }

    /// Returns the revision number for `Number` revisions.
    pub fn number(&self) -> Option<u64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Whether the revision refers to working-copy state (`BASE` or `WORKING`).
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Base | Self::Working)
    }
}

impl PartialOrd for Revision {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => Some(a.cmp(b)),
            (Self::Date(a), Self::Date(b)) => Some(a.cmp(b)),
            _ if self == other => Some(Ordering::Equal),
            _ => None,
        }
    }
}

impl Display for Revision {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Date(d) => write!(f, "{{{}}}", d.to_rfc3339()),
            Self::Head => f.write_str("HEAD"),
            Self::Base => f.write_str("BASE"),
            Self::Working => f.write_str("WORKING"),
            Self::Committed => f.write_str("COMMITTED"),
            Self::Previous => f.write_str("PREV"),
            Self::Start => f.write_str("START"),
        }
    }
}

impl FromStr for Revision {
    type Err = ReconcileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A revision range used by `log` and merge queries.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RevisionRange {
    /// Range start.
    pub from: Revision,
    /// Range end.
    pub to: Revision,
    /// Whether mergeinfo for this range is inherited by children.
    pub inheritable: bool,
}

impl RevisionRange {
    /// Creates an inheritable range.
    pub fn new(from: Revision, to: Revision) -> Self {
        Self {
            from,
            to,
            inheritable: true,
        }
    }

    /// Convenience constructor for a numeric range.
    pub fn between(from: u64, to: u64) -> Self {
        Self::new(Revision::Number(from), Revision::Number(to))
    }

    /// Marks the range as non-inheritable.
    #[must_use]
    pub fn non_inheritable(mut self) -> Self {
        self.inheritable = false;
        self
    }

    /// Whether the range runs from younger to older revisions.
    ///
    /// Returns `None` when the endpoints are not comparable.
    pub fn is_reverse(&self) -> Option<bool> {
        self.from
            .partial_cmp(&self.to)
            .map(|ord| ord == Ordering::Greater)
    }
}

impl Display for RevisionRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.from, self.to)?;
        if !self.inheritable {
            f.write_str("*")?;
        }
        Ok(())
    }
}
