//! Colon-delimited path lists, as found in `$PATH` or `$XDG_DATA_DIRS`.

use std::path::Path;

/// Separator between entries of a path list.
pub const SEPARATOR: char = ':';

/// Keep only the absolute entries of the path list `paths`.
///
/// Entries keep their relative order. If no entry is absolute, the result is an empty string.
///
/// # Examples
///
/// ```rust
/// use toolboks::fs::filter_abs_path;
///
/// assert_eq!(filter_abs_path(".local/bin:/usr/bin:bin:/bin"), "/usr/bin:/bin");
/// assert_eq!(filter_abs_path("relative"), "");
/// ```
pub fn filter_abs_path(paths: &str) -> String {
    paths
        .split(SEPARATOR)
        .filter(|entry| Path::new(entry).is_absolute())
        .collect::<Vec<_>>()
        .join(&SEPARATOR.to_string())
}

/// Split the path list `paths` into its entries.
///
/// An empty list yields no entries.
pub fn split_paths(paths: &str) -> Vec<String> {
    if paths.is_empty() {
        return Vec::new();
    }
    paths.split(SEPARATOR).map(str::to_string).collect()
}
