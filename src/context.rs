//! Context identifier resolution.
//!
//! The company/client key sent to the `/ask` endpoint is chosen with a fixed
//! precedence:
//!
//! 1. an explicit id (route parameter or form field),
//! 2. the path segment that follows `/client/` in the current URL,
//! 3. the configured default.
//!
//! Blank candidates fall through to the next rule.

/// Path marker that precedes a client id.
pub const CLIENT_MARKER: &str = "/client/";

/// Resolve the context identifier.
///
/// # Example
///
/// ```rust
/// use relationship_memory_web::context::resolve_context_id;
///
/// assert_eq!(resolve_context_id(None, "/client/acme/chatbot", "techparts"), "acme");
/// assert_eq!(resolve_context_id(Some("tacto"), "/client/acme", "techparts"), "tacto");
/// assert_eq!(resolve_context_id(None, "/chatbot", "techparts"), "techparts");
/// ```
#[must_use]
pub fn resolve_context_id(explicit: Option<&str>, path: &str, default: &str) -> String {
    explicit
        .filter(|id| !id.trim().is_empty())
        .or_else(|| client_segment(path))
        .unwrap_or(default)
        .to_string()
}

/// Extract the segment after the first `/client/` marker.
///
/// Accepts either a bare path or a full URL; query and fragment are ignored.
#[must_use]
pub fn client_segment(path: &str) -> Option<&str> {
    let (_, rest) = path.split_once(CLIENT_MARKER)?;
    let segment = rest
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    (!segment.is_empty()).then_some(segment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_wins() {
        assert_eq!(
            resolve_context_id(Some("google"), "/client/acme/reels", "techparts"),
            "google"
        );
    }

    #[test]
    fn test_path_segment() {
        assert_eq!(resolve_context_id(None, "/client/acme/chatbot", "techparts"), "acme");
        assert_eq!(resolve_context_id(None, "/client/acme", "techparts"), "acme");
        assert_eq!(
            resolve_context_id(None, "http://localhost:3000/client/meta?tab=1", "techparts"),
            "meta"
        );
    }

    #[test]
    fn test_blank_explicit_falls_through() {
        assert_eq!(resolve_context_id(Some(""), "/client/x/avatar", "techparts"), "x");
        assert_eq!(resolve_context_id(Some("   "), "/", "techparts"), "techparts");
    }

    #[test]
    fn test_default() {
        assert_eq!(resolve_context_id(None, "/chatbot", "techparts"), "techparts");
        assert_eq!(resolve_context_id(None, "/client/", "techparts"), "techparts");
        assert_eq!(resolve_context_id(None, "", "tacto"), "tacto");
    }
}
