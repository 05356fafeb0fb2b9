//! Repository URL normalization, percent-encoding and relative resolution.

use crate::{PatternCache, ReconcileError, Revision};

/// Prefixes kept verbatim by [`normalize_url`], tried in this order.
const KNOWN_PREFIXES: [&str; 10] = [
    "http://",
    "https://",
    "svn://",
    "svn+ssh://",
    "file:///",
    "file://",
    "^/",
    "../",
    "//",
    "/",
];

const SCHEMES: [&str; 5] = ["http", "https", "svn", "svn+ssh", "file"];

const HOST_PATTERN: &str = r"^[a-zA-Z0-9_\-]+(?:\.[a-zA-Z0-9_\-]+)*$";

/// Bytes that are never percent-encoded.
const URI_SAFE: &[u8] = b"!$&'()*+,-./0123456789:=@ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz~";

const URI_CHAR_VALIDITY: [bool; 256] = {
    let mut table = [false; 256];
    let mut i = 0;
    while i < URI_SAFE.len() {
        table[URI_SAFE[i] as usize] = true;
        i += 1;
    }
    table
};

/// Normalizes separators in a repository URL.
///
/// Leading whitespace is trimmed, backslashes become slashes and empty
/// segments are dropped. A recognized scheme or relative prefix (`^/`, `../`,
/// `//`, `/`) is preserved as-is.
///
/// ```
/// # use svn_reconcile::normalize_url;
/// assert_eq!(normalize_url("  svn://host//repo\\trunk/"), "svn://host/repo/trunk");
/// assert_eq!(normalize_url("^/branches//b1"), "^/branches/b1");
/// ```
pub fn normalize_url(url: &str) -> String {
    let url = url.trim_start_matches(|c: char| c <= ' ');

    let (prefix, rest) = KNOWN_PREFIXES
        .iter()
        .find_map(|prefix| url.strip_prefix(prefix).map(|rest| (*prefix, rest)))
        .unwrap_or(("", url));

    let mut out = String::with_capacity(url.len());
    out.push_str(prefix);
    let mut first = true;
    for segment in rest.split(['/', '\\']).filter(|s| !s.is_empty()) {
        if !first {
            out.push('/');
        }
        out.push_str(segment);
        first = false;
    }
    out
}

/// Byte offset where the encodable part of a normalized URL starts.
///
/// Everything before it (scheme, user name, host) is left untouched.
fn encodable_start(url: &str) -> Option<usize> {
    let from = if url.starts_with("file:///") {
        "file:///".len()
    } else if url.starts_with("file://") {
        url["file://".len()..]
            .find('/')
            .map_or(0, |i| "file://".len() + i + 1)
    } else {
        url.find("://").map_or(2, |i| i + 3)
    };
    url.get(from..)?.find('/').map(|i| from + i)
}

/// Percent-encodes the path and query of a repository URL.
///
/// The URL is normalized first. Every byte outside the URI-safe set is
/// replaced by `%XX` with uppercase hex digits; the authority (including a
/// user name before `@`) is never encoded.
pub fn encode_url(url: &str) -> String {
    let url = normalize_url(url);
    let Some(start) = encodable_start(&url) else {
        return url;
    };
    let (head, tail) = url.split_at(start);
    let mut out = String::with_capacity(url.len() + 8);
    out.push_str(head);
    for &byte in tail.as_bytes() {
        if URI_CHAR_VALIDITY[byte as usize] {
            out.push(byte as char);
        } else {
            out.push('%');
            out.push(hex_digit(byte >> 4));
            out.push(hex_digit(byte & 0x0f));
        }
    }
    out
}

/// Reverses [`encode_url`].
///
/// Malformed `%` sequences are kept verbatim. Once a `?` has been seen, `+`
/// decodes to a space (query-string convention). Invalid UTF-8 produced by
/// decoding is replaced lossily.
pub fn decode_url(url: &str) -> String {
    let url = normalize_url(url);
    let Some(start) = encodable_start(&url) else {
        return url;
    };
    let (head, tail) = url.split_at(start);
    let bytes = tail.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut changed = false;
    let mut query = false;
    let mut i = 0;
    while i < bytes.len() {
        let byte = bytes[i];
        match byte {
            b'?' => {
                query = true;
                decoded.push(byte);
            }
            b'+' if query => {
                decoded.push(b' ');
                changed = true;
            }
            b'%' if i + 2 < bytes.len() => {
                match (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                    (Some(hi), Some(lo)) => {
                        decoded.push((hi << 4) | lo);
                        changed = true;
                        i += 2;
                    }
                    _ => decoded.push(byte),
                }
            }
            _ => decoded.push(byte),
        }
        i += 1;
    }
    if !changed {
        return url;
    }
    let mut out = String::with_capacity(url.len());
    out.push_str(head);
    out.push_str(&String::from_utf8_lossy(&decoded));
    out
}

fn hex_digit(nibble: u8) -> char {
    char::from(b"0123456789ABCDEF"[nibble as usize])
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
/// An absolute repository URL split into its parts.
///
/// Supported schemes: `http`, `https`, `svn`, `svn+ssh` and `file`. Only
/// `file` URLs may have an empty host.
pub struct RepositoryUrl {
    /// Lowercase scheme without `://`.
    pub scheme: String,
    /// User name embedded in the authority, if any.
    pub username: Option<String>,
    /// Hostname (or IP) portion of the URL, without IPv6 brackets.
    pub host: String,
    /// Explicit port, if any.
    pub port: Option<u16>,
    /// Path starting with `/` (defaults to `/`).
    pub path: String,
}

impl RepositoryUrl {
    /// Parses an absolute repository URL.
    ///
    /// # Examples
    ///
    /// ```
    /// # use svn_reconcile::RepositoryUrl;
    /// let url = RepositoryUrl::parse("svn+ssh://alice@example.com:2222/repo").unwrap();
    /// assert_eq!(url.username.as_deref(), Some("alice"));
    /// assert_eq!(url.port, Some(2222));
    /// assert_eq!(url.path, "/repo");
    /// ```
    pub fn parse(input: &str) -> Result<Self, ReconcileError> {
        let input = input.trim();
        let Some((scheme, rest)) = input.split_once("://") else {
            return Err(ReconcileError::InvalidUrl(input.to_string()));
        };
        let scheme = scheme.to_ascii_lowercase();
        if !SCHEMES.contains(&scheme.as_str()) {
            return Err(ReconcileError::InvalidUrl(format!(
                "unsupported scheme in url: {input}"
            )));
        }

        let (authority, path) = match rest.find('/') {
            Some(idx) => (&rest[..idx], &rest[idx..]),
            None => (rest, "/"),
        };

        let (username, hostport) = match authority.rsplit_once('@') {
            Some((user, _)) if user.trim().is_empty() => {
                return Err(ReconcileError::InvalidUrl(format!(
                    "invalid url (empty username): {input}"
                )));
            }
            Some((user, hostport)) => (Some(user.to_string()), hostport),
            None => (None, authority),
        };

        let (host, port) = if let Some(hostport) = hostport.strip_prefix('[') {
            let Some(end) = hostport.find(']') else {
                return Err(ReconcileError::InvalidUrl(format!("invalid url: {input}")));
            };
            let host = &hostport[..end];
            let after = &hostport[end + 1..];
            if after.is_empty() {
                (host.to_string(), None)
            } else if let Some(port_str) = after.strip_prefix(':') {
                (host.to_string(), Some(parse_port(port_str, input)?))
            } else {
                return Err(ReconcileError::InvalidUrl(format!("invalid url: {input}")));
            }
        } else {
            match hostport.matches(':').count() {
                0 => (hostport.to_string(), None),
                1 => {
                    let (h, port_str) = hostport
                        .rsplit_once(':')
                        .ok_or_else(|| ReconcileError::InvalidUrl(format!("invalid url: {input}")))?;
                    (h.to_string(), Some(parse_port(port_str, input)?))
                }
                _ => {
                    return Err(ReconcileError::InvalidUrl(format!(
                        "IPv6 addresses must be enclosed in brackets: {input}"
                    )));
                }
            }
        };

        if host.trim().is_empty() && scheme != "file" {
            return Err(ReconcileError::InvalidUrl(format!(
                "missing host in url: {input}"
            )));
        }

        Ok(Self {
            scheme,
            username,
            host,
            port,
            path: path.to_string(),
        })
    }
}

fn parse_port(port: &str, input: &str) -> Result<u16, ReconcileError> {
    port.parse::<u16>()
        .map_err(|_| ReconcileError::InvalidUrl(format!("invalid port in url: {input}")))
}

impl std::fmt::Display for RepositoryUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}://", self.scheme)?;
        if let Some(user) = self.username.as_deref() {
            write!(f, "{user}@")?;
        }
        if self.host.contains(':') {
            write!(f, "[{}]", self.host)?;
        } else {
            f.write_str(&self.host)?;
        }
        if let Some(port) = self.port {
            write!(f, ":{port}")?;
        }
        f.write_str(&self.path)
    }
}

impl std::str::FromStr for RepositoryUrl {
    type Err = ReconcileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Whether `url` is an absolute repository URL with a well-formed host.
///
/// Hosts must be dot-separated runs of letters, digits, `_` and `-`; an
/// empty host is only accepted for `file` URLs.
pub fn is_valid_url(patterns: &PatternCache, url: &str) -> Result<bool, ReconcileError> {
    let Ok(parsed) = RepositoryUrl::parse(url) else {
        return Ok(false);
    };
    if parsed.host.is_empty() {
        return Ok(parsed.scheme == "file");
    }
    patterns.is_match(HOST_PATTERN, &parsed.host)
}

/// Returns the URL with its last path segment removed.
///
/// Returns `None` for a URL that has no path below its authority.
pub fn url_parent(url: &str) -> Option<String> {
    let url = url.trim_end_matches('/');
    let after_scheme = url.find("://").map_or(0, |i| i + 3);
    let path_start = after_scheme + url[after_scheme..].find('/')?;
    let last = url.rfind('/')?;
    if last < path_start {
        return None;
    }
    Some(url[..last].to_string())
}

/// Splits a trailing `@REV` peg revision off a URL.
///
/// When the text after the last `@` is not a revision (for example a host
/// after a user name), the URL is returned unchanged.
pub fn split_peg_revision(url: &str) -> (String, Option<Revision>) {
    if let Some((head, tail)) = url.rsplit_once('@')
        && let Ok(peg) = Revision::parse(tail)
    {
        return (head.to_string(), Some(peg));
    }
    (url.to_string(), None)
}

/// Expands a relative externals URL against the property holder.
///
/// - `^/path` is relative to `repository_root`.
/// - `//host/path` reuses the holder's scheme.
/// - `/path` is relative to the holder's server root.
/// - `../path` walks up from the holder, one level per `../`.
///
/// Absolute URLs are returned unchanged; anything else is
/// [`ReconcileError::InvalidUrl`].
pub fn resolve_external_url(
    patterns: &PatternCache,
    url: &str,
    holder_url: &str,
    repository_root: &str,
) -> Result<String, ReconcileError> {
    if is_valid_url(patterns, url)? {
        return Ok(url.to_string());
    }

    if let Some(rest) = url.strip_prefix("^/") {
        return Ok(format!("{}/{rest}", repository_root.trim_end_matches('/')));
    }
    if url.starts_with("//") {
        let scheme = RepositoryUrl::parse(holder_url)?.scheme;
        return Ok(if holder_url.contains(":///") {
            format!("{scheme}:/{url}")
        } else {
            format!("{scheme}:{url}")
        });
    }
    if url.starts_with('/') {
        let after_scheme = holder_url.rfind("//").map_or(0, |i| i + 2);
        let server_root = match holder_url[after_scheme..].find('/') {
            Some(i) => &holder_url[..after_scheme + i],
            None => holder_url,
        };
        return Ok(format!("{server_root}{url}"));
    }
    if url.starts_with("../") {
        let mut rest = url;
        let mut prefix = holder_url.trim_end_matches('/').to_string();
        while let Some(tail) = rest.strip_prefix("../") {
            rest = tail;
            prefix = url_parent(&prefix)
                .ok_or_else(|| ReconcileError::InvalidUrl(url.to_string()))?;
        }
        return Ok(format!("{prefix}/{rest}"));
    }
    Err(ReconcileError::InvalidUrl(url.to_string()))
}
