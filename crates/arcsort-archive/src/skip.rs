//! Platform junk that never leaves the container.

const JUNK_PATTERNS: [&str; 3] = ["osx", "OSX", ".DS_STORE"];

/// `true` if `name` contains a junk pattern anywhere or its base name is one.
pub fn should_skip(name: &str) -> bool {
    let base = name
        .trim_end_matches(['/', '\\'])
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(name);
    JUNK_PATTERNS
        .iter()
        .any(|pattern| name.contains(pattern) || base == *pattern)
}
