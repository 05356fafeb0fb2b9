//! Parsing and serialization of `svn:externals` property values.
//!
//! Two syntaxes are understood:
//!
//! - legacy (pre-1.5): `local/path [-rREV] URL`
//! - current: `[-rREV] URL[@PEG] local/path`
//!
//! A definition is legacy when its last field is an absolute repository URL.

use std::fmt::{Display, Formatter};

use tracing::{debug, trace};

use crate::url::{decode_url, is_valid_url, resolve_external_url};
use crate::{ExternalsOptions, PatternCache, ReconcileError, Revision};

/// One parsed externals definition.
///
/// Revisions are kept as written; see [`ExternalsParser::resolve`] for the
/// interpreted form.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExternalReference {
    /// Directory the external is checked out into, relative to the holder.
    pub local_path: String,
    /// Source URL, possibly relative (`^/`, `//`, `/`, `../`).
    pub url: String,
    /// Peg revision text (current syntax only).
    pub peg_revision: Option<String>,
    /// Operative revision text from `-rREV` or `-r REV`.
    pub revision: Option<String>,
    /// Whether the definition uses the current (1.5+) syntax.
    pub is_new_format: bool,
}

impl Display for ExternalReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let local_path = if self.local_path.contains([' ', '\t']) {
            format!("\"{}\"", self.local_path)
        } else {
            self.local_path.clone()
        };
        if self.is_new_format {
            if let Some(rev) = self.revision.as_deref() {
                write!(f, "-r{rev}\t")?;
            }
            f.write_str(&self.url)?;
            if let Some(peg) = self.peg_revision.as_deref() {
                write!(f, "@{peg}")?;
            }
            write!(f, "\t{local_path}")
        } else {
            write!(f, "{local_path}\t")?;
            if let Some(rev) = self.revision.as_deref() {
                write!(f, "-r{rev}\t")?;
            }
            f.write_str(&self.url)
        }
    }
}

/// An externals definition with revisions interpreted and the URL made
/// absolute and decoded.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedExternal {
    /// Directory the external is checked out into, relative to the holder.
    pub local_path: String,
    /// Absolute, decoded source URL.
    pub url: String,
    /// Peg revision, if any.
    pub peg_revision: Option<Revision>,
    /// Operative revision, if any.
    pub revision: Option<Revision>,
}

/// Parses `svn:externals` values.
#[derive(Clone, Debug, Default)]
pub struct ExternalsParser {
    patterns: PatternCache,
    options: ExternalsOptions,
}

impl ExternalsParser {
    /// Creates a parser with default options and its own pattern cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a parser that shares `patterns` with other components.
    pub fn with_patterns(patterns: PatternCache) -> Self {
        Self {
            patterns,
            options: ExternalsOptions::default(),
        }
    }

    /// Replaces the parser options.
    #[must_use]
    pub fn with_options(mut self, options: ExternalsOptions) -> Self {
        self.options = options;
        self
    }

    /// Parses a property value into definitions, in order.
    ///
    /// Blank lines and lines starting with `#` are skipped. Any other line
    /// must have two to four fields.
    pub fn parse(&self, property: &str) -> Result<Vec<ExternalReference>, ReconcileError> {
        let mut refs = Vec::new();
        for line in self.patterns.split(r"[\r\n]+", property.trim())? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with('#') {
                trace!(line, "skipping commented external");
                continue;
            }
            refs.push(self.parse_line(line)?);
        }
        debug!(count = refs.len(), "parsed externals definitions");
        Ok(refs)
    }

    fn parse_line(&self, line: &str) -> Result<ExternalReference, ReconcileError> {
        let parts = if self.options.allow_spaces_in_local_path {
            split_quoted(line)
        } else {
            self.patterns.split(r"[\t ]+", line)?
        };
        if !(2..=4).contains(&parts.len()) {
            return Err(malformed(
                line,
                format!("expected 2 to 4 fields, found {}", parts.len()),
            ));
        }

        let last = parts.len() - 1;
        if is_valid_url(&self.patterns, &parts[last])? {
            trace!(line, "legacy externals syntax");
            let revision = match parts.len() {
                4 => Some(revision_value(line, &parts[1], Some(&parts[2]))?),
                3 => Some(revision_value(line, &parts[1], None)?),
                _ => None,
            };
            return Ok(ExternalReference {
                local_path: parts[0].clone(),
                url: parts[last].clone(),
                peg_revision: None,
                revision,
                is_new_format: false,
            });
        }

        let revision = match parts.len() {
            4 => Some(revision_value(line, &parts[0], Some(&parts[1]))?),
            3 => Some(revision_value(line, &parts[0], None)?),
            _ => None,
        };
        let (url, peg_revision) = split_peg(&parts[last - 1]);
        Ok(ExternalReference {
            local_path: parts[last].clone(),
            url,
            peg_revision,
            revision,
            is_new_format: true,
        })
    }

    /// Parses a property and interprets each definition.
    ///
    /// Relative URLs are resolved against `holder_url` (the URL of the node
    /// carrying the property) and `repository_root`, then decoded.
    pub fn resolve(
        &self,
        property: &str,
        holder_url: &str,
        repository_root: &str,
    ) -> Result<Vec<ResolvedExternal>, ReconcileError> {
        self.parse(property)?
            .into_iter()
            .map(|external| -> Result<ResolvedExternal, ReconcileError> {
                let line = external.to_string();
                let parse_rev = |text: Option<&str>| {
                    text.map(Revision::parse)
                        .transpose()
                        .map_err(|_| malformed(&line, "invalid revision".to_string()))
                };
                let revision = parse_rev(external.revision.as_deref())?;
                let peg_revision = parse_rev(external.peg_revision.as_deref())?;
                let url = resolve_external_url(
                    &self.patterns,
                    external.url.trim(),
                    holder_url,
                    repository_root,
                )?;
                Ok(ResolvedExternal {
                    local_path: external.local_path,
                    url: decode_url(&url),
                    peg_revision,
                    revision,
                })
            })
            .collect()
    }
}

/// Parses a property value with default options.
///
/// ```
/// # use svn_reconcile::parse_externals;
/// let refs = parse_externals("third-party/skins -r148 http://svn.example.com/skinproj")?;
/// assert_eq!(refs[0].local_path, "third-party/skins");
/// assert_eq!(refs[0].revision.as_deref(), Some("148"));
/// assert!(!refs[0].is_new_format);
/// # Ok::<(), svn_reconcile::ReconcileError>(())
/// ```
pub fn parse_externals(property: &str) -> Result<Vec<ExternalReference>, ReconcileError> {
    ExternalsParser::new().parse(property)
}

/// Parses and resolves a property value with default options.
pub fn resolve_externals(
    property: &str,
    holder_url: &str,
    repository_root: &str,
) -> Result<Vec<ResolvedExternal>, ReconcileError> {
    ExternalsParser::new().resolve(property, holder_url, repository_root)
}

/// Serializes definitions back into a property value, one line each.
pub fn serialize_externals(refs: &[ExternalReference]) -> String {
    let mut out = String::new();
    for external in refs {
        out.push_str(&external.to_string());
        out.push('\n');
    }
    out
}

fn malformed(line: &str, reason: String) -> ReconcileError {
    ReconcileError::MalformedExternal {
        line: line.to_string(),
        reason,
    }
}

/// Extracts the revision from `-rREV` or from `-r` followed by `REV`.
fn revision_value(line: &str, flag: &str, value: Option<&str>) -> Result<String, ReconcileError> {
    let rev = match value {
        Some(value) if flag == "-r" => value,
        None => flag.strip_prefix("-r").unwrap_or_default(),
        Some(_) => "",
    };
    if rev.is_empty() {
        return Err(malformed(line, format!("expected revision flag, found {flag:?}")));
    }
    Ok(rev.to_string())
}

/// Splits `URL@PEG`; an `@` inside the authority or path is not a peg.
fn split_peg(url: &str) -> (String, Option<String>) {
    match url.rsplit_once('@') {
        Some((head, peg)) if !peg.contains('/') => (head.to_string(), Some(peg.to_string())),
        _ => (url.to_string(), None),
    }
}

/// Splits a definition on spaces and tabs, honoring quotes and `\ `.
fn split_quoted(line: &str) -> Vec<String> {
    let chars: Vec<char> = line.trim().chars().collect();
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut i = 0;
    while i < chars.len() {
        let ch = chars[i];
        match ch {
            '\'' | '"' => quoted = !quoted,
            ' ' | '\t' if quoted => current.push(ch),
            ' ' | '\t' => {
                if !current.is_empty() {
                    parts.push(std::mem::take(&mut current));
                }
            }
            '\\' if i + 1 < chars.len() && chars[i + 1] == ' ' => {
                current.push(' ');
                i += 1;
            }
            _ => current.push(ch),
        }
        i += 1;
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn parses_new_format_with_revision_and_peg() {
        let refs =
            parse_externals("-r12\thttp://svn.example.com/skin-maker@21\tthird-party/skins/toolkit")
                .unwrap();
        assert_eq!(
            refs,
            vec![ExternalReference {
                local_path: "third-party/skins/toolkit".to_string(),
                url: "http://svn.example.com/skin-maker".to_string(),
                peg_revision: Some("21".to_string()),
                revision: Some("12".to_string()),
                is_new_format: true,
            }]
        );
    }

    #[test]
    fn parses_all_field_counts_of_both_formats() {
        let property = "\
third-party/sounds             http://svn.example.com/repos/sounds
third-party/skins -r148        http://svn.example.com/skinproj
third-party/skins/toolkit -r 21 http://svn.example.com/skin-maker
http://svn.example.com/repos/sounds third-party/sounds2
-r148 http://svn.example.com/skinproj third-party/skins2
-r 21 http://svn.example.com/skin-maker@30 third-party/toolkit2
";
        let refs = parse_externals(property).unwrap();
        assert_eq!(refs.len(), 6);

        assert!(!refs[0].is_new_format);
        assert_eq!(refs[0].revision, None);
        assert_eq!(refs[1].revision.as_deref(), Some("148"));
        assert_eq!(refs[2].revision.as_deref(), Some("21"));
        assert_eq!(refs[2].url, "http://svn.example.com/skin-maker");

        assert!(refs[3].is_new_format);
        assert_eq!(refs[3].local_path, "third-party/sounds2");
        assert_eq!(refs[4].revision.as_deref(), Some("148"));
        assert_eq!(refs[5].revision.as_deref(), Some("21"));
        assert_eq!(refs[5].peg_revision.as_deref(), Some("30"));
        assert_eq!(refs[5].local_path, "third-party/toolkit2");
    }

    #[test]
    fn skips_comments_and_blank_lines() {
        let property = "# disabled http://host/x y\r\n\r\n  ^/lib lib\n";
        let refs = parse_externals(property).unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].url, "^/lib");
        assert_eq!(refs[0].local_path, "lib");
        assert!(parse_externals("").unwrap().is_empty());
    }

    #[test]
    fn local_path_may_contain_quoted_or_escaped_spaces() {
        let refs = parse_externals("^/lib \"my libs/core\"\n^/doc my\\ docs").unwrap();
        assert_eq!(refs[0].local_path, "my libs/core");
        assert_eq!(refs[1].local_path, "my docs");
    }

    #[test]
    fn whitespace_only_mode_does_not_honor_quotes() {
        let parser = ExternalsParser::new().with_options(ExternalsOptions::default().whitespace_only());
        let refs = parser.parse("^/lib  \t libs").unwrap();
        assert_eq!(refs[0].local_path, "libs");
        assert!(matches!(
            parser.parse("^/lib \"my libs\""),
            Err(ReconcileError::MalformedExternal { .. })
        ));
    }

    #[test]
    fn rejects_wrong_field_counts() {
        for bad in ["lonely", "-r 1 2 http://host/x local"] {
            let err = parse_externals(bad).unwrap_err();
            match err {
                ReconcileError::MalformedExternal { line, .. } => assert_eq!(line, bad),
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[test]
    fn rejects_missing_revision_flag() {
        assert!(matches!(
            parse_externals("local 148 http://host/x"),
            Err(ReconcileError::MalformedExternal { .. })
        ));
        assert!(matches!(
            parse_externals("-x 5 ^/lib lib"),
            Err(ReconcileError::MalformedExternal { .. })
        ));
    }

    #[test]
    fn at_sign_in_authority_is_not_a_peg_revision() {
        let refs = parse_externals("svn://alice@host/repo/lib lib").unwrap();
        assert_eq!(refs[0].url, "svn://alice@host/repo/lib");
        assert_eq!(refs[0].peg_revision, None);
    }

    #[test]
    fn serialize_then_parse_preserves_definitions() {
        let property = "\
third-party/skins -r148 http://svn.example.com/skinproj
-r12 http://svn.example.com/skin-maker@21 third-party/skins/toolkit
^/lib \"with space\"
";
        let parsed = parse_externals(property).unwrap();
        let serialized = serialize_externals(&parsed);
        assert_eq!(
            serialized,
            "third-party/skins\t-r148\thttp://svn.example.com/skinproj\n\
             -r12\thttp://svn.example.com/skin-maker@21\tthird-party/skins/toolkit\n\
             ^/lib\t\"with space\"\n"
        );
        assert_eq!(parse_externals(&serialized).unwrap(), parsed);
    }

    #[test]
    fn local_path_with_tab_is_quoted_on_serialize() {
        let parsed = parse_externals("^/lib \"a\tb\"").unwrap();
        assert_eq!(parsed[0].local_path, "a\tb");

        let serialized = serialize_externals(&parsed);
        assert_eq!(serialized, "^/lib\t\"a\tb\"\n");
        assert_eq!(parse_externals(&serialized).unwrap(), parsed);
    }

    #[test]
    fn resolve_interprets_revisions_and_urls() {
        let parser = ExternalsParser::new();
        let property = "\
-r12 ^/vendor/skin%20maker@21 toolkit
sounds -rHEAD http://svn.example.com/repos/sounds
";
        let resolved = parser
            .resolve(
                property,
                "http://svn.example.com/repos/proj/trunk",
                "http://svn.example.com/repos/proj",
            )
            .unwrap();
        assert_eq!(
            resolved[0],
            ResolvedExternal {
                local_path: "toolkit".to_string(),
                url: "http://svn.example.com/repos/proj/vendor/skin maker".to_string(),
                peg_revision: Some(Revision::Number(21)),
                revision: Some(Revision::Number(12)),
            }
        );
        assert_eq!(resolved[1].revision, Some(Revision::Head));
        assert_eq!(resolved[1].peg_revision, None);
    }

    #[test]
    fn resolve_rejects_bad_revisions_and_urls() {
        let parser = ExternalsParser::new();
        let root = "http://host/repo";
        assert!(matches!(
            parser.resolve("-rXYZ ^/lib lib", root, root),
            Err(ReconcileError::MalformedExternal { .. })
        ));
        assert!(matches!(
            parser.resolve("-r5 lib/x local", root, root),
            Err(ReconcileError::InvalidUrl(_))
        ));
    }
}
