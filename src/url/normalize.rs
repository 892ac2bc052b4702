use crate::PagescopeError;
use url::Url;

/// Normalizes a user-supplied target URL before a job is created
///
/// # Normalization Steps
///
/// 1. Trim surrounding whitespace; reject empty input
/// 2. Prepend `https://` when the input carries neither `http://` nor `https://`
/// 3. Parse the URL; reject if malformed
/// 4. Reject URLs without a host
///
/// No other rewriting happens: host case, `www.` prefixes, trailing slashes and
/// query strings are kept as given, since the stored URL is also the key used for
/// orphan detection.
///
/// # Examples
///
/// ```
/// use pagescope::url::normalize_target;
///
/// let url = normalize_target("example.com/pricing").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/pricing");
/// ```
pub fn normalize_target(input: &str) -> Result<Url, PagescopeError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(PagescopeError::InvalidUrl("URL cannot be empty".to_string()));
    }

    let candidate = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let url = Url::parse(&candidate)
        .map_err(|e| PagescopeError::InvalidUrl(format!("'{}': {}", trimmed, e)))?;

    if url.host_str().map_or(true, str::is_empty) {
        return Err(PagescopeError::InvalidUrl(format!(
            "'{}' has no host",
            trimmed
        )));
    }

    Ok(url)
}
