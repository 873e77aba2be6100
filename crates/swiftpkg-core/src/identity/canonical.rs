//! Canonical package identity
//!
//! Transforms any supported source location (HTTP/SSH/file URLs, scp-style
//! addresses, POSIX and Windows paths) into one canonical textual form, so
//! that every spelling of the same location yields the same identity.

use unicode_normalization::UnicodeNormalization;

use super::strings;
use super::IdentityError;

/// Compute the canonical form of a source location.
///
/// The result is a lower-case, NFC-precomposed string of the shape
/// `[/]host/path...`: no scheme, userinfo, port, query, or fragment;
/// `/`-joined non-empty segments; percent-escapes resolved; a trailing
/// `.git` stripped from the final segment. The leading `/` is present
/// exactly when the location denoted a file path.
pub(crate) fn canonicalize(location: &str) -> Result<String, IdentityError> {
    let mut buf: String = location.nfc().collect::<String>().to_lowercase();

    let starts_with_separator = buf.chars().next().is_some_and(strings::is_separator);
    let windows_path = strings::normalize_windows_path_prefix(&mut buf);
    let scheme = strings::drop_scheme(&mut buf);

    if let Some(userinfo) = strings::drop_userinfo(&mut buf) {
        // `/~/` is the SSH home-relative marker; expand it to the user's
        // home directory now that the user name is known
        if !userinfo.user.is_empty() {
            let home = format!("/~{}/", userinfo.user);
            strings::replace_first(&mut buf, "/~/", &home, None);
        }
    }

    strings::remove_port(&mut buf);
    strings::remove_fragment(&mut buf);
    strings::remove_query(&mut buf);

    // scp-style addresses (`host:path`) separate host from path with a
    // colon; without a scheme, or under ssh, rewrite it to a separator
    let scheme = scheme.as_deref();
    if scheme.is_none() || scheme == Some("ssh") {
        let sep = buf.find(strings::is_separator).unwrap_or(buf.len());
        strings::replace_first(&mut buf, ":", "/", Some(sep));
    }

    let mut segments: Vec<String> = buf
        .split(strings::is_separator)
        .filter(|segment| !segment.is_empty())
        .map(resolve_percent_escapes)
        .collect();
    if let Some(last) = segments.last_mut() {
        strings::remove_suffix(last, ".git");
    }
    // A segment that was exactly `.git` is now empty and gets dropped
    if segments.last().is_some_and(|last| last.is_empty()) {
        segments.pop();
    }

    let mut description = segments.join("/");
    if windows_path || scheme == Some("file") || starts_with_separator {
        description.insert(0, '/');
    }

    let host = description.split('/').next().unwrap_or("");
    if !host
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.'))
    {
        return Err(IdentityError::UnsupportedHost {
            host: host.to_string(),
            location: location.to_string(),
        });
    }

    Ok(description)
}

/// Decode the percent-escapes in one path segment.
///
/// Malformed escapes pass through verbatim; if the decoded bytes are not
/// valid UTF-8 the segment is left unchanged.
fn resolve_percent_escapes(segment: &str) -> String {
    match percent_encoding::percent_decode_str(segment).decode_utf8() {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => segment.to_string(),
    }
}
