//! In-place string rewrites used by identity canonicalization
//!
//! Every operation here mutates an owned buffer that has already been
//! NFC-precomposed and lower-cased, so all delimiters it looks for are
//! single-byte ASCII.

/// Path separator accepted in source locations (`/`, or `\` from Windows paths)
pub(crate) fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

/// Characters allowed in a URL scheme after the initial letter
fn is_scheme_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')
}

/// Userinfo removed from a location by [`drop_userinfo`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Userinfo {
    pub user: String,
    pub password: Option<String>,
}

/// Remove `prefix` if the buffer starts with it, reporting whether it did
pub(crate) fn remove_prefix(buf: &mut String, prefix: &str) -> bool {
    if buf.starts_with(prefix) {
        buf.replace_range(..prefix.len(), "");
        true
    } else {
        false
    }
}

/// Remove `suffix` if the buffer ends with it, reporting whether it did
pub(crate) fn remove_suffix(buf: &mut String, suffix: &str) -> bool {
    if buf.ends_with(suffix) {
        buf.truncate(buf.len() - suffix.len());
        true
    } else {
        false
    }
}

/// Remove a leading `scheme://` and return the scheme, if one is present
///
/// A scheme is an ASCII letter followed by letters, digits, `+`, `-`, or
/// `.`, terminated by `://`.
pub(crate) fn drop_scheme(buf: &mut String) -> Option<String> {
    let end = buf.find("://")?;
    let scheme = &buf[..end];
    let mut chars = scheme.chars();
    if !chars.next()?.is_ascii_alphabetic() || !chars.all(is_scheme_char) {
        return None;
    }
    let scheme = scheme.to_string();
    buf.replace_range(..end + 3, "");
    Some(scheme)
}

/// Remove `user[:password]@` before the first path separator and return it
///
/// The last `@` before the first separator delimits the userinfo, so a
/// password containing `@` is tolerated. The prefix is split on its first
/// `:` into user and password.
pub(crate) fn drop_userinfo(buf: &mut String) -> Option<Userinfo> {
    let sep = buf.find(is_separator).unwrap_or(buf.len());
    let at = buf[..sep].rfind('@')?;
    let userinfo = match buf[..at].split_once(':') {
        Some((user, password)) => Userinfo {
            user: user.to_string(),
            password: Some(password.to_string()),
        },
        None => Userinfo {
            user: buf[..at].to_string(),
            password: None,
        },
    };
    buf.replace_range(..=at, "");
    Some(userinfo)
}

/// Remove a `:digits` port between the host and the first path separator
pub(crate) fn remove_port(buf: &mut String) {
    let sep = buf.find(is_separator).unwrap_or(buf.len());
    if let Some(colon) = buf[..sep].find(':') {
        if buf[colon + 1..sep].bytes().all(|b| b.is_ascii_digit()) {
            buf.replace_range(colon..sep, "");
        }
    }
}

/// Truncate the buffer at the first `#`
pub(crate) fn remove_fragment(buf: &mut String) {
    if let Some(hash) = buf.find('#') {
        buf.truncate(hash);
    }
}

/// Truncate the buffer at the first `?`
pub(crate) fn remove_query(buf: &mut String) {
    if let Some(question) = buf.find('?') {
        buf.truncate(question);
    }
}

/// Replace the first occurrence of `needle`, optionally only when it starts
/// strictly before byte index `before`; reports whether a replacement happened
pub(crate) fn replace_first(
    buf: &mut String,
    needle: &str,
    replacement: &str,
    before: Option<usize>,
) -> bool {
    match buf.find(needle) {
        Some(start) if before.map_or(true, |bound| start < bound) => {
            buf.replace_range(start..start + needle.len(), replacement);
            true
        }
        _ => false,
    }
}

/// Strip Windows path prefixes (`\\?\`, `\\??\`, then a `X:` drive letter)
/// and report whether a Windows path was recognized
pub(crate) fn normalize_windows_path_prefix(buf: &mut String) -> bool {
    let mut windows = false;
    if remove_prefix(buf, r"\\?\") || remove_prefix(buf, r"\\??\") {
        windows = true;
    }
    let bytes = buf.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        buf.replace_range(..2, "");
        windows = true;
    }
    windows
}
