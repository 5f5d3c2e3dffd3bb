//! URL resolution for consistent cache keys.

/// Error type for URL resolution failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Resolve a URL string against the shell origin.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Absolute URLs (containing `://`) are parsed as-is; anything else is
///    joined onto `origin`
/// 3. Remove fragment (#...)
/// 4. Keep query string intact (do not reorder)
///
/// Host lowercasing and default-port elision come from the URL parser.
pub fn resolve(origin: &url::Url, input: &str) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut parsed = if trimmed.contains("://") {
        url::Url::parse(trimmed)
    } else {
        origin.join(trimmed)
    }
    .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    parsed.set_fragment(None);

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> url::Url {
        url::Url::parse("https://app.example.com").unwrap()
    }

    #[test]
    fn test_resolve_absolute() {
        let url = resolve(&origin(), "https://cdn.example.net/lib.js").unwrap();
        assert_eq!(url.as_str(), "https://cdn.example.net/lib.js");
    }

    #[test]
    fn test_resolve_path_against_origin() {
        let url = resolve(&origin(), "/dashboard.html").unwrap();
        assert_eq!(url.as_str(), "https://app.example.com/dashboard.html");
    }

    #[test]
    fn test_resolve_bare_relative_path() {
        let url = resolve(&origin(), "css/style.css").unwrap();
        assert_eq!(url.as_str(), "https://app.example.com/css/style.css");
    }

    #[test]
    fn test_resolve_lowercase_host() {
        let url = resolve(&origin(), "https://EXAMPLE.COM/a").unwrap();
        assert_eq!(url.host_str(), Some("example.com"));
    }

    #[test]
    fn test_resolve_remove_fragment() {
        let url = resolve(&origin(), "/settings.html#security").unwrap();
        assert_eq!(url.fragment(), None);
        assert_eq!(url.path(), "/settings.html");
    }

    #[test]
    fn test_resolve_preserve_query() {
        let url = resolve(&origin(), "/api/rates?b=2&a=1").unwrap();
        assert_eq!(url.query(), Some("b=2&a=1"));
    }

    #[test]
    fn test_resolve_trim_whitespace() {
        let url = resolve(&origin(), "  /  ").unwrap();
        assert_eq!(url.as_str(), "https://app.example.com/");
    }

    #[test]
    fn test_resolve_empty() {
        assert!(matches!(resolve(&origin(), ""), Err(UrlError::Empty)));
        assert!(matches!(resolve(&origin(), "   "), Err(UrlError::Empty)));
    }

    #[test]
    fn test_resolve_invalid() {
        assert!(matches!(resolve(&origin(), "http://exa mple.com/"), Err(UrlError::InvalidUrl(_))));
    }
}
