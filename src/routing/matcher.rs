//! Route matching logic.
//!
//! # Responsibilities
//! - Strip the wildcard marker to get the match prefix
//! - Match a path against a wildcard or mounted prefix
//! - Build the upstream URL for a matched route
//!
//! # Design Decisions
//! - Wildcard routes compare raw prefixes and forward the full path
//! - Mounted routes normalize both sides to a trailing `/` and strip the prefix
//! - Path matching is case-sensitive

use super::route::Route;

const WILDCARD: char = '*';

/// The prefix used for matching: `path_prefix` without a trailing `*`.
pub fn match_prefix(path_prefix: &str) -> &str {
    path_prefix.strip_suffix(WILDCARD).unwrap_or(path_prefix)
}

pub fn is_wildcard(path_prefix: &str) -> bool {
    path_prefix.ends_with(WILDCARD)
}

/// Returns true if `path` falls under the route's prefix.
pub fn matches(route: &Route, path: &str) -> bool {
    let prefix = route.match_prefix();

    if route.is_wildcard() {
        return path.starts_with(prefix);
    }

    let mut normalized_prefix = prefix.to_string();
    if !normalized_prefix.ends_with('/') {
        normalized_prefix.push('/');
    }
    let mut normalized_path = path.to_string();
    if !normalized_path.ends_with('/') {
        normalized_path.push('/');
    }

    normalized_path.starts_with(&normalized_prefix) || path == prefix
}

/// Build the upstream URL (without query string) for a matched route.
pub fn build_target_url(route: &Route, original_path: &str) -> String {
    let base = route
        .target_base_url
        .strip_suffix('/')
        .unwrap_or(&route.target_base_url);

    if route.is_wildcard() {
        return format!("{}{}", base, original_path);
    }

    // The raw prefix is removed, not the match prefix.
    let remainder = original_path.get(route.path_prefix.len()..).unwrap_or("");
    if remainder.starts_with('/') {
        format!("{}{}", base, remainder)
    } else {
        format!("{}/{}", base, remainder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(prefix: &str, target: &str) -> Route {
        Route::new("r", prefix, target).unwrap()
    }

    #[test]
    fn test_wildcard_matches_subtree() {
        let r = route("/api/*", "http://backend");
        assert!(matches(&r, "/api/"));
        assert!(matches(&r, "/api/x"));
        assert!(matches(&r, "/api/x/y"));
        assert!(!matches(&r, "/api"));
        assert!(!matches(&r, "/other"));
    }

    #[test]
    fn test_wildcard_forwards_full_path() {
        let r = route("/api/*", "http://backend/");
        assert_eq!(build_target_url(&r, "/api/x/y"), "http://backend/api/x/y");
    }

    #[test]
    fn test_mounted_prefix_matches_root_and_children() {
        let r = route("/api", "http://backend");
        assert!(matches(&r, "/api"));
        assert!(matches(&r, "/api/"));
        assert!(matches(&r, "/api/anything"));
        assert!(!matches(&r, "/apix"));
        assert!(!matches(&r, "/ap"));
    }

    #[test]
    fn test_mounted_prefix_is_stripped() {
        let r = route("/api", "http://backend");
        assert_eq!(build_target_url(&r, "/api/anything"), "http://backend/anything");
        assert_eq!(build_target_url(&r, "/api"), "http://backend/");
    }

    #[test]
    fn test_mounted_prefix_with_trailing_slash() {
        let r = route("/api/", "http://backend/");
        assert!(matches(&r, "/api"));
        assert!(matches(&r, "/api/v1"));
        assert_eq!(build_target_url(&r, "/api/v1"), "http://backend/v1");
        assert_eq!(build_target_url(&r, "/api"), "http://backend/");
    }

    #[test]
    fn test_root_prefix_matches_everything() {
        let r = route("/", "http://backend");
        assert!(matches(&r, "/"));
        assert!(matches(&r, "/a/b"));
        assert_eq!(build_target_url(&r, "/a/b"), "http://backend/a/b");
    }

    #[test]
    fn test_path_matching_is_case_sensitive() {
        let r = route("/API", "http://backend");
        assert!(!matches(&r, "/api/x"));
    }
}
