//! Legacy package identity
//!
//! Derives an identity from the last path component of a location only.
//! Deliberately lossy (`a.com/x` and `b.org/x` collide); kept for
//! compatibility with identities minted before canonicalization existed.

/// Path separator for legacy identities: `/`, plus `\` on Windows hosts
fn is_separator(c: char) -> bool {
    c == '/' || (cfg!(windows) && c == '\\')
}

/// Compute the legacy identity of a source location.
///
/// Trims exactly one trailing separator, takes the last path component,
/// lower-cases it, and strips a trailing `.git`.
pub(crate) fn compute(location: &str) -> String {
    let trimmed = match location.chars().next_back() {
        Some(last) if is_separator(last) => &location[..location.len() - last.len_utf8()],
        _ => location,
    };
    let component = trimmed.rsplit(is_separator).next().unwrap_or(trimmed);
    let mut identity = component.to_lowercase();
    if identity.ends_with(".git") {
        identity.truncate(identity.len() - ".git".len());
    }
    identity
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_component() {
        assert_eq!(compute("https://example.com/mona/LinkedList"), "linkedlist");
        assert_eq!(compute("mona/LinkedList"), "linkedlist");
        assert_eq!(compute("LinkedList"), "linkedlist");
    }

    #[test]
    fn test_trailing_git_is_stripped() {
        assert_eq!(compute("git@example.com:mona/LinkedList.git"), "linkedlist");
        assert_eq!(compute("LinkedList.GIT"), "linkedlist");
    }

    #[test]
    fn test_single_trailing_separator_is_trimmed() {
        assert_eq!(compute("example.com/mona/LinkedList/"), "linkedlist");
        // Only one separator is trimmed; the rest leaves an empty component
        assert_eq!(compute("example.com/mona/LinkedList//"), "");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(compute(""), "");
    }
}
