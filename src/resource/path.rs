//! Logical path handling
//!
//! Logical paths are `/`-separated and compared case-insensitively. Every
//! cache in the registry is keyed by the output of these functions; feeding
//! an un-normalized path into a cache would silently fragment it.

use super::tier::PriorityTier;

/// Normalize a logical path.
///
/// Backslashes become slashes, empty and `.` segments are dropped, `..`
/// pops a segment (never above the root), and no leading or trailing slash
/// remains.
pub fn normalize_path(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let mut segments: Vec<&str> = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

/// Normalize a directory path: like [`normalize_path`] but with a trailing
/// slash, except for the root which is the empty string.
pub fn normalize_dir(path: &str) -> String {
    let mut dir = normalize_path(path);
    if !dir.is_empty() {
        dir.push('/');
    }
    dir
}

/// Case-folded cache key for a normalized path
pub fn cache_key(normalized: &str) -> String {
    normalized.to_lowercase()
}

/// Split a normalized full path into `(directory, name)`.
///
/// The directory keeps its trailing slash; a bare name lives in the root.
pub fn split_path(normalized: &str) -> (&str, &str) {
    match normalized.rfind('/') {
        Some(idx) => (&normalized[..=idx], &normalized[idx + 1..]),
        None => ("", normalized),
    }
}

/// Join a directory (with or without trailing slash) and a name
pub fn join(dir: &str, name: &str) -> String {
    normalize_path(&format!("{}/{}", dir, name))
}

/// The tier a path forces through a reserved first segment (`Core/`,
/// `Game/`), if any.
pub fn forced_tier(path: &str) -> Option<PriorityTier> {
    let normalized = normalize_path(path);
    let first = normalized.split('/').next().unwrap_or("");
    if first.eq_ignore_ascii_case("core") && normalized.len() > first.len() {
        Some(PriorityTier::Core)
    } else if first.eq_ignore_ascii_case("game") && normalized.len() > first.len() {
        Some(PriorityTier::Game)
    } else {
        None
    }
}

/// Resolve a redirect target relative to the marker's logical directory.
///
/// A leading `/` makes the target absolute.
pub fn resolve_redirect_target(marker_dir: &str, target: &str) -> String {
    let target = target.trim();
    if target.starts_with('/') || target.starts_with('\\') {
        normalize_path(target)
    } else {
        join(marker_dir, target)
    }
}
